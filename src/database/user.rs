use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::User;
use argon2::Argon2;
use chrono::NaiveDate;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

/// A real Argon2 hash generated once at startup, used as a timing decoy so
/// that requests for non-existent accounts take the same time as requests
/// for existing ones.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", Salt::from(&salt))
        .expect("failed to generate dummy hash")
        .to_string()
});

impl PostgresRepository {
    #[allow(clippy::too_many_arguments)]
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        birthday: NaiveDate,
    ) -> Result<User, AppError> {
        let hash = password_hash(password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, birthday)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password_hash, first_name, last_name, birthday, email_verified, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(&hash)
        .bind(first_name)
        .bind(last_name)
        .bind(birthday)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, birthday, email_verified, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, birthday, email_verified, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, birthday, email_verified, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check a submitted password against the stored PHC-format hash.
    pub fn verify_password(&self, user: &User, password: &str) -> Result<(), AppError> {
        let password_hash = PasswordHash::new(&user.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(())
    }

    /// Perform a throwaway Argon2 verification to equalize response timing
    /// regardless of whether the target account exists.
    pub fn dummy_verify(password: &str) {
        let hash = PasswordHash::new(&DUMMY_HASH).expect("invalid dummy hash");
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }

    /// Overwrite the credential hash. The caller is responsible for having
    /// consumed a valid reset authorization first.
    pub async fn update_user_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), AppError> {
        let hash = password_hash(new_password)?;

        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mark the account email-verified. Returns a conflict if the account is
    /// already verified; each onboarding step is a one-way transition.
    pub async fn mark_email_verified(&self, user_id: &Uuid) -> Result<(), AppError> {
        let updated = sqlx::query("UPDATE users SET email_verified = true WHERE id = $1 AND email_verified = false")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            match self.get_user_by_id(user_id).await? {
                Some(_) => return Err(AppError::Conflict("Email is already verified".to_string())),
                None => return Err(AppError::NotFound("Unknown user".to_string())),
            }
        }

        Ok(())
    }
}

pub(crate) fn password_hash(password: &str) -> Result<String, AppError> {
    let salt_string = SaltString::generate(&mut OsRng);
    let salt = Salt::from(&salt_string);
    let hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), salt)?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = password_hash("hunter2-but-Longer-9!").expect("hash generated");
        let parsed = PasswordHash::new(&hash).expect("parseable hash");
        assert!(
            Argon2::default()
                .verify_password(b"hunter2-but-Longer-9!", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong-password", &parsed).is_err());
    }

    #[test]
    fn dummy_verify_never_panics() {
        PostgresRepository::dummy_verify("anything");
        PostgresRepository::dummy_verify("");
    }
}
