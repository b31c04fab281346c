use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFlow {
    Login,
    Recovery,
}

impl AttemptFlow {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptFlow::Login => "login",
            AttemptFlow::Recovery => "recovery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Success,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
        }
    }
}

/// Failure reasons recorded in the ledger. Internal only; responses never
/// surface these.
pub mod attempt_reasons {
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const INVALID_PASSWORD: &str = "invalid_password";
    pub const INCORRECT_SECURITY_ANSWERS: &str = "incorrect_security_answers";
    pub const MISSING_SECURITY_QUESTIONS: &str = "missing_security_questions";
    pub const LOCKED: &str = "locked";
}

/// Aggregated login statistics sourced from the ledger.
#[derive(Debug, Clone, Copy)]
pub struct LoginStats {
    pub login_count: i64,
    pub last_login: Option<DateTime<Utc>>,
}
