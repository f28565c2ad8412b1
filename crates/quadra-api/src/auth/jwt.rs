//! HS256 bearer tokens carrying employee id, role, and org id.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use quadra_core::models::{Employee, Role};
use quadra_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // employee id
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<Uuid>,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Issues and validates the opaque signed bearer tokens used by every
/// authenticated route.
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Sign a token for the employee with the configured expiry.
    pub fn issue(&self, employee: &Employee) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: employee.id,
            role: employee.role,
            org_id: employee.org_id,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.expiry_hours)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate a bearer token and return its claims.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, AppError> {
        decode::<JwtClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quadra_core::models::InviteStatus;

    fn employee(role: Role, org_id: Option<Uuid>) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Test Employee".to_string(),
            email: "test@example.com".to_string(),
            password_hash: None,
            google_id: None,
            role,
            org_id,
            department_id: None,
            invite_token: None,
            invite_status: InviteStatus::Accepted,
            accepted_at: None,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let service = JwtService::new("0123456789abcdef0123456789abcdef", 24);
        let org_id = Uuid::new_v4();
        let employee = employee(Role::Ceo, Some(org_id));

        let token = service.issue(&employee).expect("issue");
        let claims = service.verify(&token).expect("verify");

        assert_eq!(claims.sub, employee.id);
        assert_eq!(claims.role, Role::Ceo);
        assert_eq!(claims.org_id, Some(org_id));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative expiry puts exp well past the default validation leeway.
        let service = JwtService::new("0123456789abcdef0123456789abcdef", -2);
        let token = service.issue(&employee(Role::User, None)).expect("issue");
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("0123456789abcdef0123456789abcdef", 24);
        let verifier = JwtService::new("another-secret-another-secret-32", 24);
        let token = issuer.issue(&employee(Role::Admin, None)).expect("issue");
        assert!(verifier.verify(&token).is_err());
    }
}
