use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{3,20}$").expect("valid username regex"));
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z\s-]{2,30}$").expect("valid name regex"));
static BIRTHDAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid birthday regex"));

/// Account row as stored in the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub birthday: NaiveDate,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(regex(path = *USERNAME_RE, message = "Username must be 3-20 alphanumeric characters"))]
    #[schemars(regex(path = "USERNAME_RE"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 12, message = "Password must be at least 12 characters long"))]
    #[validate(custom(function = validate_password_strength))]
    pub password: String,
    #[validate(must_match(other = password, message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(regex(path = *NAME_RE, message = "Names can only contain letters, spaces, and hyphens (2-30 characters)"))]
    #[schemars(regex(path = "NAME_RE"))]
    pub first_name: String,
    #[validate(regex(path = *NAME_RE, message = "Names can only contain letters, spaces, and hyphens (2-30 characters)"))]
    #[schemars(regex(path = "NAME_RE"))]
    pub last_name: String,
    #[validate(custom(function = validate_birthday))]
    pub birthday: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile summary returned on successful login. Only first/last name and
/// login statistics are exposed; everything else stays server-side.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub first_name: String,
    pub last_name: String,
    pub login_count: i64,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoginResponse {
    pub user: ProfileSummary,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub user_id: Uuid,
}

/// Password policy: character-class rules plus a zxcvbn strength floor so
/// that long-but-guessable passwords ("Password1234!...") are still rejected.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(ValidationError::new("password_strength")
            .with_message("Password must contain uppercase, lowercase, digit, and special character".into()));
    }

    let estimate = zxcvbn::zxcvbn(password, &[]);
    if u8::from(estimate.score()) < 3 {
        return Err(ValidationError::new("password_strength").with_message("Password is too easy to guess".into()));
    }

    Ok(())
}

/// Birthday must be `MM/DD/YYYY`, not in the future, year 1900 or later.
pub fn validate_birthday(birthday: &str) -> Result<(), ValidationError> {
    if !BIRTHDAY_RE.is_match(birthday) {
        return Err(ValidationError::new("birthday").with_message("Invalid birthday format (MM/DD/YYYY)".into()));
    }

    let parsed = NaiveDate::parse_from_str(birthday, "%m/%d/%Y")
        .map_err(|_| ValidationError::new("birthday").with_message("Invalid birthday".into()))?;

    if parsed > Utc::now().date_naive() {
        return Err(ValidationError::new("birthday").with_message("Birthday must be in the past".into()));
    }

    if parsed.year() < 1900 {
        return Err(ValidationError::new("birthday").with_message("Birthday year must be 1900 or later".into()));
    }

    Ok(())
}

/// Parse an already-validated birthday string into a date.
pub fn parse_birthday(birthday: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(birthday, "%m/%d/%Y").ok()
}
