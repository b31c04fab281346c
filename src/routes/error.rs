use crate::middleware::rate_limit::RateLimitRetryAfter;
use rocket::http::{ContentType, Header, Status};
use rocket::response::Responder;
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{Request, Response, catch};
use std::io::Cursor;

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Error {
    pub message: String,
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Not found".to_string(),
    })
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Conflict".to_string(),
    })
}

pub struct TooManyRequests {
    retry_after: Option<u64>,
}

impl<'r> Responder<'r, 'static> for TooManyRequests {
    fn respond_to(self, _request: &'r Request<'_>) -> rocket::response::Result<'static> {
        let body = serde_json::json!({ "message": "Too many requests" }).to_string();
        let mut response = Response::build();
        response
            .status(Status::TooManyRequests)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body));
        if let Some(seconds) = self.retry_after {
            response.header(Header::new("Retry-After", seconds.to_string()));
        }
        response.ok()
    }
}

/// Guard-level rate-limit rejections land here; the guard stashes the
/// Retry-After value in the request's local cache.
#[catch(429)]
pub fn too_many_requests(request: &Request) -> TooManyRequests {
    let retry_after = request.local_cache(|| None::<RateLimitRetryAfter>).as_ref().map(|r| r.0);
    TooManyRequests { retry_after }
}
