use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::password_reset::{PasswordReset, ResetTokenPurpose};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

impl PostgresRepository {
    /// Generate a fresh reset token, returning (plaintext, stored hash).
    pub fn generate_reset_token() -> (String, String) {
        use rand::distr::{Alphanumeric, SampleString};

        let token = Alphanumeric.sample_string(&mut rand::rng(), 32);
        let hash = Self::hash_reset_token(&token);

        (token, hash)
    }

    pub fn hash_reset_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token);
        hex::encode(hasher.finalize())
    }

    pub async fn create_password_reset(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        purpose: ResetTokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_resets (user_id, token_hash, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, purpose, expires_at, used_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(purpose.as_str())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(reset)
    }

    pub async fn get_password_reset_by_token(&self, token_hash: &str, purpose: ResetTokenPurpose) -> Result<Option<PasswordReset>, AppError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, purpose, expires_at, used_at
            FROM password_resets
            WHERE token_hash = $1 AND purpose = $2
            "#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(reset)
    }

    /// Consume a token. The conditional update makes the single-use
    /// guarantee hold under concurrent requests: exactly one caller sees
    /// `true`.
    pub async fn consume_password_reset(&self, id: &Uuid) -> Result<bool, AppError> {
        let updated = sqlx::query("UPDATE password_resets SET used_at = now() WHERE id = $1 AND used_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(updated.rows_affected() == 1)
    }

    /// Drop every outstanding token for an account, e.g. after a completed
    /// reset.
    pub async fn delete_password_resets_for_user(&self, user_id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Purge expired tokens. Cron-only.
    pub async fn purge_expired_password_resets(&self) -> Result<u64, AppError> {
        let deleted = sqlx::query("DELETE FROM password_resets WHERE expires_at < now()")
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_matches_its_hash() {
        let (token, hash) = PostgresRepository::generate_reset_token();
        assert_eq!(token.len(), 32);
        assert_eq!(PostgresRepository::hash_reset_token(&token), hash);
        // SHA-256 hex
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn distinct_tokens_generated() {
        let (a, _) = PostgresRepository::generate_reset_token();
        let (b, _) = PostgresRepository::generate_reset_token();
        assert_ne!(a, b);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn consume_is_single_use() {
        use crate::test_utils::test_pool;
        use chrono::{Duration, NaiveDate};

        let repo = PostgresRepository { pool: test_pool().await };

        let tag = Uuid::new_v4().simple().to_string();
        let user = repo
            .create_user(
                &format!("reset{}", &tag[..12]),
                &format!("{tag}@reset-test.example"),
                "correct-Horse-battery-7!",
                "Jane",
                "Doe",
                NaiveDate::from_ymd_opt(1990, 4, 12).expect("valid date"),
            )
            .await
            .expect("user created");

        let (_, token_hash) = PostgresRepository::generate_reset_token();
        let reset = repo
            .create_password_reset(&user.id, &token_hash, ResetTokenPurpose::RecoveryAuthorization, Utc::now() + Duration::minutes(15))
            .await
            .expect("reset created");

        assert!(repo.consume_password_reset(&reset.id).await.expect("first consume runs"));
        // A replay of the same token fails.
        assert!(!repo.consume_password_reset(&reset.id).await.expect("second consume runs"));
    }
}
