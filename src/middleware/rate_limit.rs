use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tokio::sync::Mutex;
use tracing::warn;

/// Transport-level request throttling, per client IP. This is a coarse
/// abuse shield in front of the whole API; the account lockout in
/// `service::lockout` is a separate mechanism with its own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RateLimitBucket {
    /// Credential-bearing endpoints (login, signup, recovery).
    Auth,
    /// Everything else.
    General,
}

#[derive(Debug, Clone)]
struct Counter {
    window_start: Instant,
    count: u32,
}

#[derive(Debug)]
pub(crate) struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    cleanup_interval: Duration,
    counters: Mutex<HashMap<(String, RateLimitBucket), Counter>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_seconds.max(1));
        let cleanup_interval = Duration::from_secs(config.cleanup_interval_seconds.max(1));

        Self {
            config,
            window,
            cleanup_interval,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let cleanup_interval = self.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let window = self.window;
                let mut counters = self.counters.lock().await;
                counters.retain(|_, counter| now.duration_since(counter.window_start) < window);
            }
        });
    }

    // NOTE: fixed-window counter; bursts can exceed the limit near window
    // boundaries.
    async fn check(&self, ip: &str, bucket: RateLimitBucket) -> RateLimitDecision {
        let limit = match bucket {
            RateLimitBucket::Auth => self.config.auth_limit,
            RateLimitBucket::General => self.config.general_limit,
        };

        let now = Instant::now();
        let mut counters = self.counters.lock().await;
        let counter = counters
            .entry((ip.to_string(), bucket))
            .or_insert_with(|| Counter { window_start: now, count: 0 });

        if now.duration_since(counter.window_start) >= self.window {
            counter.window_start = now;
            counter.count = 0;
        }

        if counter.count >= limit {
            let elapsed = now.duration_since(counter.window_start);
            return RateLimitDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        counter.count += 1;
        RateLimitDecision::Allow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RateLimitDecision {
    Allow,
    Limited { retry_after: Duration },
}

/// Guard for the general bucket.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimit;

/// Guard for the tighter auth bucket.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AuthRateLimit;

/// Retry-After seconds stashed for the 429 catcher.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimitRetryAfter(pub u64);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RateLimit {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match rate_limit_request(request, RateLimitBucket::General).await {
            Outcome::Success(_) => Outcome::Success(RateLimit),
            Outcome::Error(error) => Outcome::Error(error),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthRateLimit {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match rate_limit_request(request, RateLimitBucket::Auth).await {
            Outcome::Success(_) => Outcome::Success(AuthRateLimit),
            Outcome::Error(error) => Outcome::Error(error),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

async fn rate_limit_request(request: &Request<'_>, bucket: RateLimitBucket) -> Outcome<(), ()> {
    let limiter = match request.rocket().state::<Arc<RateLimiter>>() {
        Some(limiter) => limiter,
        None => return Outcome::Success(()),
    };

    let ip = match request.client_ip().map(|addr| addr.to_string()) {
        Some(ip) => ip,
        None if limiter.config.require_client_ip => {
            warn!(method = %request.method(), uri = %request.uri(), "client ip unavailable for rate limiting");
            return Outcome::Error((Status::BadRequest, ()));
        }
        None => "missing-ip".to_string(),
    };

    match limiter.check(&ip, bucket).await {
        RateLimitDecision::Allow => Outcome::Success(()),
        RateLimitDecision::Limited { retry_after } => {
            let retry_after_secs = retry_after.as_secs().max(1);
            request.local_cache(|| Some(RateLimitRetryAfter(retry_after_secs)));
            warn!(
                method = %request.method(),
                uri = %request.uri(),
                retry_after_secs = %retry_after_secs,
                "rate limit exceeded"
            );
            Outcome::Error((Status::TooManyRequests, ()))
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for RateLimit {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        too_many_requests_response()
    }
}

impl<'a> OpenApiFromRequest<'a> for AuthRateLimit {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        too_many_requests_response()
    }
}

fn too_many_requests_response() -> rocket_okapi::Result<Responses> {
    let mut responses = Responses::default();
    responses.responses.insert(
        "429".to_string(),
        RefOr::Object(OpenApiResponse {
            description: "Too Many Requests".to_string(),
            ..Default::default()
        }),
    );
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(auth_limit: u32, general_limit: u32, window_seconds: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            auth_limit,
            general_limit,
            window_seconds,
            cleanup_interval_seconds: 60,
            require_client_ip: false,
        })
    }

    #[rocket::async_test]
    async fn auth_bucket_blocks_after_limit() {
        let limiter = limiter(2, 100, 60);

        assert!(matches!(limiter.check("127.0.0.1", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
        assert!(matches!(limiter.check("127.0.0.1", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
        assert!(matches!(
            limiter.check("127.0.0.1", RateLimitBucket::Auth).await,
            RateLimitDecision::Limited { .. }
        ));
    }

    #[rocket::async_test]
    async fn buckets_are_independent() {
        let limiter = limiter(1, 100, 60);

        assert!(matches!(limiter.check("127.0.0.1", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
        assert!(matches!(
            limiter.check("127.0.0.1", RateLimitBucket::Auth).await,
            RateLimitDecision::Limited { .. }
        ));
        // The general bucket for the same IP is unaffected.
        assert!(matches!(limiter.check("127.0.0.1", RateLimitBucket::General).await, RateLimitDecision::Allow));
    }

    #[rocket::async_test]
    async fn window_resets_the_counter() {
        let limiter = limiter(1, 1, 1);

        assert!(matches!(limiter.check("127.0.0.1", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
        assert!(matches!(
            limiter.check("127.0.0.1", RateLimitBucket::Auth).await,
            RateLimitDecision::Limited { .. }
        ));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(matches!(limiter.check("127.0.0.1", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
    }

    #[rocket::async_test]
    async fn distinct_ips_have_distinct_counters() {
        let limiter = limiter(1, 1, 60);

        assert!(matches!(limiter.check("10.0.0.1", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
        assert!(matches!(limiter.check("10.0.0.2", RateLimitBucket::Auth).await, RateLimitDecision::Allow));
    }
}
