use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Reset token record. Tokens are stored as SHA-256 hashes; the plaintext
/// leaves the server exactly once (email link or verification response).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// What a stored reset token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenPurpose {
    /// Token mailed out by `request-password-reset`; presented back on
    /// `security-questions-reset` when the caller follows the link.
    EmailLink,
    /// Single-use authorization issued when the security-question
    /// verification passes; required by `reset-password`.
    RecoveryAuthorization,
}

impl ResetTokenPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            ResetTokenPurpose::EmailLink => "email_link",
            ResetTokenPurpose::RecoveryAuthorization => "recovery_authorization",
        }
    }
}

impl PasswordReset {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_used()
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RequestPasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(equal = 32, message = "Invalid reset token"))]
    pub reset_token: String,
    #[validate(length(min = 12, message = "Password must be at least 12 characters long"))]
    #[validate(custom(function = crate::models::user::validate_password_strength))]
    pub new_password: String,
}

/// Always-success response for reset requests (anti-enumeration).
#[derive(Debug, Serialize, JsonSchema)]
pub struct RequestPasswordResetResponse {
    pub success: bool,
    pub message: String,
}
