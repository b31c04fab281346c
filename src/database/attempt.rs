use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::attempt::{AttemptFlow, AttemptStatus, LoginStats};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl PostgresRepository {
    /// Append a row to the attempt ledger and emit the matching structured
    /// audit event. The ledger is the source of truth for lockout state and
    /// login statistics; nothing ever mutates existing rows.
    pub async fn record_attempt(
        &self,
        user_id: Option<&Uuid>,
        subject: &str,
        flow: AttemptFlow,
        status: AttemptStatus,
        reason: Option<&str>,
        counts_against_lockout: bool,
    ) -> Result<(), AppError> {
        let uid_str = user_id.map(|u| u.to_string());
        if status == AttemptStatus::Success {
            tracing::info!(
                category = "audit",
                flow = flow.as_str(),
                status = status.as_str(),
                user_id = uid_str.as_deref().unwrap_or("-"),
                subject = subject,
                "authentication attempt"
            );
        } else {
            tracing::warn!(
                category = "audit",
                flow = flow.as_str(),
                status = status.as_str(),
                reason = reason.unwrap_or("-"),
                user_id = uid_str.as_deref().unwrap_or("-"),
                subject = subject,
                "authentication attempt (failure)"
            );
        }

        sqlx::query(
            r#"
            INSERT INTO auth_attempts (user_id, subject, flow, status, reason, counts_against_lockout)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(flow.as_str())
        .bind(status.as_str())
        .bind(reason)
        .bind(counts_against_lockout)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Timestamps of counted recovery failures for a subject since
    /// `window_start`, newest first. Failures older than the most recent
    /// recovery success are excluded, which is how a successful
    /// verification restores the full attempt allowance without touching
    /// history.
    pub async fn recent_recovery_failures(&self, subject: &str, window_start: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, AppError> {
        let timestamps = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT occurred_at
            FROM auth_attempts
            WHERE subject = $1
              AND flow = 'recovery'
              AND status = 'failed'
              AND counts_against_lockout
              AND occurred_at > $2
              AND occurred_at > COALESCE(
                    (SELECT MAX(occurred_at)
                     FROM auth_attempts
                     WHERE subject = $1 AND flow = 'recovery' AND status = 'success'),
                    'epoch'::timestamptz)
            ORDER BY occurred_at DESC
            "#,
        )
        .bind(subject)
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;

        Ok(timestamps)
    }

    /// Count of failed login attempts for a subject since `since`.
    /// Server-side telemetry only; never exposed to callers.
    pub async fn count_failed_logins_since(&self, subject: &str, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM auth_attempts
            WHERE subject = $1 AND flow = 'login' AND status = 'failed' AND occurred_at > $2
            "#,
        )
        .bind(subject)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Total successful logins and the most recent one for an account.
    pub async fn login_stats(&self, user_id: &Uuid) -> Result<LoginStats, AppError> {
        let row = sqlx::query_as::<_, (i64, Option<DateTime<Utc>>)>(
            r#"
            SELECT COUNT(*), MAX(occurred_at)
            FROM auth_attempts
            WHERE user_id = $1 AND flow = 'login' AND status = 'success'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(LoginStats {
            login_count: row.0,
            last_login: row.1,
        })
    }

    /// Prune ledger rows older than the retention horizon. Cron-only.
    pub async fn prune_attempts_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let deleted = sqlx::query("DELETE FROM auth_attempts WHERE occurred_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected())
    }
}
