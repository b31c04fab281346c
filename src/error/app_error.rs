use rocket::http::{ContentType, Header, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use std::io::Cursor;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    /// Generic credential failure. Never reveals which factor failed.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Username {0} is already taken")]
    UsernameTaken(String),
    #[error("Email {0} is already taken")]
    EmailTaken(String),
    /// Account temporarily locked after repeated recovery failures.
    /// Responds 429 with a JSON body carrying the remaining cool-down.
    #[error("Account temporarily locked")]
    Lockout { remaining_seconds: i64 },
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("Internal server error")]
    TokenSigning { message: String },
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }

    pub fn token_signing(message: impl Into<String>, source: jsonwebtoken::errors::Error) -> Self {
        Self::TokenSigning {
            message: format!("{}: {}", message.into(), source),
        }
    }
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        AppError::password_hash("Password hashing failed", e)
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::InvalidCredentials => Status::Unauthorized,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::UsernameTaken(_) | AppError::EmailTaken(_) => Status::Conflict,
            AppError::Lockout { .. } => Status::TooManyRequests,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::Conflict(_) => Status::Conflict,
            AppError::NotFound(_) => Status::NotFound,
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::Db { .. }
            | AppError::PasswordHash { .. }
            | AppError::TokenSigning { .. }
            | AppError::ConfigurationError { .. } => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        error!(
            error = ?self,
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "request failed"
        );

        let status = Status::from(&self);

        // The lockout response carries its remaining cool-down as JSON so
        // clients can render a countdown.
        if let AppError::Lockout { remaining_seconds } = self {
            let body = serde_json::json!({
                "locked": true,
                "remainingTime": remaining_seconds,
            })
            .to_string();

            return Response::build()
                .status(status)
                .header(ContentType::JSON)
                .header(Header::new("Retry-After", remaining_seconds.max(1).to_string()))
                .sized_body(body.len(), Cursor::new(body))
                .ok();
        }

        let body = serde_json::json!({ "error": self.to_string() }).to_string();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Bad Request"),
            ("401", "Unauthorized"),
            ("409", "Conflict"),
            ("429", "Too Many Requests - account temporarily locked"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_map_to_generic_401() {
        let status = Status::from(&AppError::InvalidCredentials);
        assert_eq!(status, Status::Unauthorized);
        // The message must not reveal which factor failed.
        assert_eq!(AppError::InvalidCredentials.to_string(), "Invalid username or password");
    }

    #[test]
    fn lockout_maps_to_429() {
        let status = Status::from(&AppError::Lockout { remaining_seconds: 42 });
        assert_eq!(status, Status::TooManyRequests);
    }

    #[test]
    fn internal_errors_are_opaque() {
        let err = AppError::PasswordHash {
            message: "argon2 params rejected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(Status::from(&err), Status::InternalServerError);
    }
}
