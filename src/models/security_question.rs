use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// The security-question vault row: exactly one per account, three
/// (question id, answer) pairs. Answers are stored normalized (trimmed,
/// lowercased) so comparison is a plain equality check.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SecurityQuestionSet {
    pub user_id: Uuid,
    pub question1_id: i32,
    pub answer1: String,
    pub question2_id: i32,
    pub answer2: String,
    pub question3_id: i32,
    pub answer3: String,
    pub created_at: DateTime<Utc>,
}

impl SecurityQuestionSet {
    /// The three stored pairs, for matching against submitted answers.
    pub fn pairs(&self) -> [(i32, &str); 3] {
        [
            (self.question1_id, self.answer1.as_str()),
            (self.question2_id, self.answer2.as_str()),
            (self.question3_id, self.answer3.as_str()),
        ]
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_distinct_questions))]
pub struct SecurityQuestionsSignupRequest {
    pub user_id: Uuid,
    pub question1: i32,
    #[validate(length(min = 1, message = "Answer 1 must not be empty"))]
    pub answer1: String,
    pub question2: i32,
    #[validate(length(min = 1, message = "Answer 2 must not be empty"))]
    pub answer2: String,
    pub question3: i32,
    #[validate(length(min = 1, message = "Answer 3 must not be empty"))]
    pub answer3: String,
}

fn validate_distinct_questions(request: &SecurityQuestionsSignupRequest) -> Result<(), ValidationError> {
    let mut ids = [request.question1, request.question2, request.question3];
    ids.sort_unstable();
    if ids[0] == ids[1] || ids[1] == ids[2] {
        return Err(ValidationError::new("distinct_questions").with_message("Three distinct security questions are required".into()));
    }
    Ok(())
}

/// A single (question id, answer) pair submitted during recovery.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: i32,
    pub answer: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAnswersRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 3, message = "Between one and three answers expected"))]
    pub security_answers: Vec<SubmittedAnswer>,
    /// Token from the emailed reset link. Optional so the flow also works
    /// when entered directly; when present it must be valid for the account.
    #[serde(default)]
    #[validate(length(equal = 32, message = "Invalid reset token"))]
    pub reset_token: Option<String>,
}

/// Outcome of a security-question verification. The locked case is carried
/// by `AppError::Lockout` instead, so this response is only ever
/// success-or-attempts-left.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAnswersResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CheckLockoutRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckLockoutResponse {
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions_request() -> SecurityQuestionsSignupRequest {
        SecurityQuestionsSignupRequest {
            user_id: Uuid::new_v4(),
            question1: 1,
            answer1: "blue".to_string(),
            question2: 4,
            answer2: "spot".to_string(),
            question3: 7,
            answer3: "london".to_string(),
        }
    }

    #[test]
    fn three_distinct_questions_pass() {
        assert!(questions_request().validate().is_ok());
    }

    #[test]
    fn duplicate_question_ids_rejected() {
        let mut request = questions_request();
        request.question3 = request.question1;
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_answer_rejected() {
        let mut request = questions_request();
        request.answer2 = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn verify_request_works_without_a_link_token() {
        let request: VerifyAnswersRequest = serde_json::from_value(serde_json::json!({
            "email": "jane@example.com",
            "securityAnswers": [{ "questionId": 1, "answer": "blue" }]
        }))
        .expect("deserializes");

        assert!(request.reset_token.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn malformed_link_token_rejected() {
        let request: VerifyAnswersRequest = serde_json::from_value(serde_json::json!({
            "email": "jane@example.com",
            "securityAnswers": [{ "questionId": 1, "answer": "blue" }],
            "resetToken": "too-short"
        }))
        .expect("deserializes");

        assert!(request.validate().is_err());
    }
}
