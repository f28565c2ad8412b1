//! Quadra database layer
//!
//! sqlx/Postgres repositories, one per aggregate, plus an analytics
//! repository for the aggregate count/ratio queries. The document-store
//! "populate" pattern of the original presentation layer becomes explicit
//! join queries here returning typed aggregates, so the scoring and
//! reporting logic never touches storage traversal.

pub mod db;

pub use db::analytics::{
    AnalyticsRepository, DepartmentCounts, GlobalCounts, OrgCounts, SurveyCounts, TrendPoint,
};
pub use db::assignment::{AssignmentRepository, AssignmentWithContext};
pub use db::department::{DepartmentEmployeeCounts, DepartmentRepository};
pub use db::employee::{EmployeeRepository, EmployeeWithDepartment};
pub use db::invite::{InviteRepository, InviteWithContext};
pub use db::organization::OrganizationRepository;
pub use db::otp::OtpRepository;
pub use db::response::{ResponseRepository, ResponseWithContext};
pub use db::survey::SurveyRepository;
pub use db::ticket::{TicketFilter, TicketListItem, TicketRepository, TicketStats};
