use quadra_core::models::{
    format_ticket_number, Role, SupportTicket, TicketCategory, TicketMessage, TicketPriority,
    TicketStatus, TicketWithMessages,
};
use quadra_core::AppError;
use serde::Serialize;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const TICKET_COLUMNS: &str = "id, ticket_number, subject, category, priority, status, created_by, \
     created_by_role, org_id, assigned_to, created_at, updated_at, resolved_at";

const MESSAGE_COLUMNS: &str = "id, ticket_id, sender, sender_role, message, created_at";

/// Ticket joined with creator, assignee, and organization names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TicketListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub created_by_name: Option<String>,
    pub created_by_email: Option<String>,
    pub assigned_to_name: Option<String>,
    pub org_name: Option<String>,
}

/// Optional list filters (admin view).
#[derive(Debug, Default, Clone)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: TicketCategory,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriorityCount {
    pub priority: TicketPriority,
    pub count: i64,
}

/// Ticket tallies for the admin overview.
#[derive(Debug, Clone, Serialize)]
pub struct TicketStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub urgent: i64,
    pub by_category: Vec<CategoryCount>,
    pub by_priority: Vec<PriorityCount>,
}

/// Repository for support tickets and their message threads.
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a ticket with its first message. The display number comes from
    /// a dedicated sequence inside the same transaction, so concurrent
    /// creations never collide.
    #[tracing::instrument(skip(self, message), fields(db.table = "support_tickets", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        subject: &str,
        category: TicketCategory,
        priority: TicketPriority,
        created_by: Uuid,
        created_by_role: Role,
        org_id: Option<Uuid>,
        message: &str,
    ) -> Result<TicketWithMessages, AppError> {
        let mut tx = self.pool.begin().await?;

        let seq: i64 = sqlx::query_scalar("SELECT nextval('ticket_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let ticket_number = format_ticket_number(seq);

        let ticket = sqlx::query_as::<Postgres, SupportTicket>(&format!(
            r#"
            INSERT INTO support_tickets
                (ticket_number, subject, category, priority, created_by, created_by_role, org_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TICKET_COLUMNS
        ))
        .bind(&ticket_number)
        .bind(subject)
        .bind(category)
        .bind(priority)
        .bind(created_by)
        .bind(created_by_role)
        .bind(org_id)
        .fetch_one(&mut *tx)
        .await?;

        let first_message = sqlx::query_as::<Postgres, TicketMessage>(&format!(
            r#"
            INSERT INTO ticket_messages (ticket_id, sender, sender_role, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(ticket.id)
        .bind(created_by)
        .bind(created_by_role)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(TicketWithMessages {
            ticket,
            messages: vec![first_message],
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "support_tickets", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<SupportTicket>, AppError> {
        let ticket = sqlx::query_as::<Postgres, SupportTicket>(&format!(
            "SELECT {} FROM support_tickets WHERE id = $1",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    #[tracing::instrument(skip(self), fields(db.table = "support_tickets", db.operation = "select", db.record_id = %id))]
    pub async fn get_with_messages(&self, id: Uuid) -> Result<Option<TicketWithMessages>, AppError> {
        let Some(ticket) = self.get(id).await? else {
            return Ok(None);
        };

        let messages = sqlx::query_as::<Postgres, TicketMessage>(&format!(
            "SELECT {} FROM ticket_messages WHERE ticket_id = $1 ORDER BY created_at",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TicketWithMessages { ticket, messages }))
    }

    /// Tickets created by one employee, most recently updated first.
    #[tracing::instrument(skip(self), fields(db.table = "support_tickets", db.operation = "select"))]
    pub async fn list_for_creator(&self, created_by: Uuid) -> Result<Vec<TicketListItem>, AppError> {
        let tickets = sqlx::query_as::<Postgres, TicketListItem>(&list_select(
            "WHERE t.created_by = $1",
        ))
        .bind(created_by)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }

    /// All tickets with optional status/priority filters (admin view).
    #[tracing::instrument(skip(self), fields(db.table = "support_tickets", db.operation = "select"))]
    pub async fn list_all(&self, filter: &TicketFilter) -> Result<Vec<TicketListItem>, AppError> {
        let mut conditions = Vec::new();
        let mut bind_index = 1;
        if filter.status.is_some() {
            conditions.push(format!("t.status = ${}", bind_index));
            bind_index += 1;
        }
        if filter.priority.is_some() {
            conditions.push(format!("t.priority = ${}", bind_index));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_sql = list_select(&where_clause);
        let mut query = sqlx::query_as::<Postgres, TicketListItem>(&select_sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority);
        }

        let tickets = query.fetch_all(&self.pool).await?;
        Ok(tickets)
    }

    /// Append a message. An admin reply on an open ticket auto-transitions
    /// it to in-progress. One transaction.
    #[tracing::instrument(skip(self, message), fields(db.table = "ticket_messages", db.operation = "insert"))]
    pub async fn add_message(
        &self,
        ticket_id: Uuid,
        sender: Uuid,
        sender_role: Role,
        message: &str,
    ) -> Result<TicketMessage, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<Postgres, TicketMessage>(&format!(
            r#"
            INSERT INTO ticket_messages (ticket_id, sender, sender_role, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(ticket_id)
        .bind(sender)
        .bind(sender_role)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;

        if sender_role == Role::Admin {
            sqlx::query(
                "UPDATE support_tickets SET status = 'in-progress' WHERE id = $1 AND status = 'open'",
            )
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE support_tickets SET updated_at = NOW() WHERE id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Admin workflow update. `assigned_to` distinguishes "leave unchanged"
    /// (None) from "clear" (Some(None)). Resolved/closed stamps resolved_at.
    #[tracing::instrument(skip(self), fields(db.table = "support_tickets", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
        assigned_to: Option<Option<Uuid>>,
    ) -> Result<Option<SupportTicket>, AppError> {
        let mut query = String::from("UPDATE support_tickets SET updated_at = NOW()");
        let mut bind_index = 1;

        if status.is_some() {
            query.push_str(&format!(", status = ${}", bind_index));
            bind_index += 1;
        }
        if priority.is_some() {
            query.push_str(&format!(", priority = ${}", bind_index));
            bind_index += 1;
        }
        if assigned_to.is_some() {
            query.push_str(&format!(", assigned_to = ${}", bind_index));
            bind_index += 1;
        }
        if matches!(
            status,
            Some(TicketStatus::Resolved) | Some(TicketStatus::Closed)
        ) {
            query.push_str(", resolved_at = NOW()");
        }
        query.push_str(&format!(
            " WHERE id = ${} RETURNING {}",
            bind_index, TICKET_COLUMNS
        ));

        let mut query_builder = sqlx::query_as::<Postgres, SupportTicket>(&query);
        if let Some(status) = status {
            query_builder = query_builder.bind(status);
        }
        if let Some(priority) = priority {
            query_builder = query_builder.bind(priority);
        }
        if let Some(assignee) = assigned_to {
            query_builder = query_builder.bind(assignee);
        }
        query_builder = query_builder.bind(id);

        let ticket = query_builder.fetch_optional(&self.pool).await?;
        Ok(ticket)
    }

    #[tracing::instrument(skip(self), fields(db.table = "support_tickets", db.operation = "select"))]
    pub async fn stats(&self) -> Result<TicketStats, AppError> {
        let (total, open, in_progress, resolved, closed, urgent): (i64, i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'open'),
                       COUNT(*) FILTER (WHERE status = 'in-progress'),
                       COUNT(*) FILTER (WHERE status = 'resolved'),
                       COUNT(*) FILTER (WHERE status = 'closed'),
                       COUNT(*) FILTER (WHERE priority = 'urgent' AND status IN ('open', 'in-progress'))
                FROM support_tickets
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let by_category = sqlx::query_as::<Postgres, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM support_tickets GROUP BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_priority = sqlx::query_as::<Postgres, PriorityCount>(
            "SELECT priority, COUNT(*) AS count FROM support_tickets GROUP BY priority",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(TicketStats {
            total,
            open,
            in_progress,
            resolved,
            closed,
            urgent,
            by_category,
            by_priority,
        })
    }
}

fn list_select(where_clause: &str) -> String {
    format!(
        r#"
        SELECT t.id, t.ticket_number, t.subject, t.category, t.priority, t.status,
               t.created_by, t.created_by_role, t.org_id, t.assigned_to,
               t.created_at, t.updated_at, t.resolved_at,
               c.name AS created_by_name,
               c.email AS created_by_email,
               a.name AS assigned_to_name,
               o.name AS org_name
        FROM support_tickets t
        LEFT JOIN employees c ON c.id = t.created_by
        LEFT JOIN employees a ON a.id = t.assigned_to
        LEFT JOIN organizations o ON o.id = t.org_id
        {}
        ORDER BY t.updated_at DESC
        "#,
        where_clause
    )
}
