pub mod attempt;
pub mod health;
pub mod password_reset;
pub mod security_question;
pub mod session;
pub mod user;

use schemars::JsonSchema;
use serde::Serialize;

/// Generic success/message response shared by the onboarding and recovery
/// endpoints.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
