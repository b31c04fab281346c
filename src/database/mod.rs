pub mod attempt;
pub mod password_reset;
pub mod postgres_repository;
pub mod security_question;
pub mod user;

use crate::error::app_error::AppError;
use crate::models::attempt::{AttemptFlow, AttemptStatus};
use crate::models::password_reset::{PasswordReset, ResetTokenPurpose};
use crate::models::security_question::SecurityQuestionSet;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use postgres_repository::PostgresRepository;
use uuid::Uuid;

/// The storage operations the recovery verification flow depends on,
/// split out as a trait so the orchestration is unit-testable against a
/// mock store.
#[async_trait::async_trait]
pub trait RecoveryRepository {
    async fn recent_recovery_failures(&self, subject: &str, window_start: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, AppError>;

    #[allow(clippy::too_many_arguments)]
    async fn record_attempt(
        &self,
        user_id: Option<&Uuid>,
        subject: &str,
        flow: AttemptFlow,
        status: AttemptStatus,
        reason: Option<&str>,
        counts_against_lockout: bool,
    ) -> Result<(), AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_security_questions(&self, user_id: &Uuid) -> Result<Option<SecurityQuestionSet>, AppError>;

    async fn create_password_reset(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        purpose: ResetTokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError>;
}

#[async_trait::async_trait]
impl RecoveryRepository for PostgresRepository {
    async fn recent_recovery_failures(&self, subject: &str, window_start: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, AppError> {
        PostgresRepository::recent_recovery_failures(self, subject, window_start).await
    }

    async fn record_attempt(
        &self,
        user_id: Option<&Uuid>,
        subject: &str,
        flow: AttemptFlow,
        status: AttemptStatus,
        reason: Option<&str>,
        counts_against_lockout: bool,
    ) -> Result<(), AppError> {
        PostgresRepository::record_attempt(self, user_id, subject, flow, status, reason, counts_against_lockout).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        PostgresRepository::get_user_by_email(self, email).await
    }

    async fn get_security_questions(&self, user_id: &Uuid) -> Result<Option<SecurityQuestionSet>, AppError> {
        PostgresRepository::get_security_questions(self, user_id).await
    }

    async fn create_password_reset(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        purpose: ResetTokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError> {
        PostgresRepository::create_password_reset(self, user_id, token_hash, purpose, expires_at).await
    }
}
