use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::security_question::SecurityQuestionSet;
use crate::service::verification::normalize_answer;
use uuid::Uuid;

impl PostgresRepository {
    /// Store the three question/answer pairs for an account. Answers are
    /// normalized on the way in so recovery can compare by plain equality.
    /// A second submission for the same account is a conflict; the vault is
    /// write-once.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_security_questions(
        &self,
        user_id: &Uuid,
        question1_id: i32,
        answer1: &str,
        question2_id: i32,
        answer2: &str,
        question3_id: i32,
        answer3: &str,
    ) -> Result<(), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO security_questions (user_id, question1_id, answer1, question2_id, answer2, question3_id, answer3)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(question1_id)
        .bind(normalize_answer(answer1))
        .bind(question2_id)
        .bind(normalize_answer(answer2))
        .bind(question3_id)
        .bind(normalize_answer(answer3))
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(AppError::Conflict("Security questions are already set for this account".to_string()));
        }

        Ok(())
    }

    pub async fn get_security_questions(&self, user_id: &Uuid) -> Result<Option<SecurityQuestionSet>, AppError> {
        let set = sqlx::query_as::<_, SecurityQuestionSet>(
            r#"
            SELECT user_id, question1_id, answer1, question2_id, answer2, question3_id, answer3, created_at
            FROM security_questions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_pool;
    use chrono::NaiveDate;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn second_submission_for_same_user_conflicts() {
        let repo = PostgresRepository { pool: test_pool().await };

        let tag = Uuid::new_v4().simple().to_string();
        let user = repo
            .create_user(
                &format!("vault{}", &tag[..12]),
                &format!("{tag}@vault-test.example"),
                "correct-Horse-battery-7!",
                "Jane",
                "Doe",
                NaiveDate::from_ymd_opt(1990, 4, 12).expect("valid date"),
            )
            .await
            .expect("user created");

        repo.create_security_questions(&user.id, 1, "blue", 4, "spot", 7, "london")
            .await
            .expect("first submission stored");

        let second = repo.create_security_questions(&user.id, 2, "red", 5, "rex", 8, "paris").await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        // The original vault content is untouched.
        let stored = repo.get_security_questions(&user.id).await.expect("fetch runs").expect("vault present");
        assert_eq!(stored.pairs(), [(1, "blue"), (4, "spot"), (7, "london")]);
    }
}
