use crate::config::LockoutConfig;
use chrono::{DateTime, Duration, Utc};

/// Derived lockout state for one account at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Recovery attempts are allowed; `attempts_left` of the allowance
    /// remain before the account locks.
    Open { attempts_left: i64 },
    /// Recovery attempts are rejected for another `remaining_seconds`.
    Locked { remaining_seconds: i64 },
}

/// Evaluate lockout state from the ledger's counted failure timestamps.
///
/// This is the windowed design: an account is locked when `max_attempts`
/// or more counted failures fall inside the trailing window, and stays
/// locked until the window measured from the most recent failure elapses.
/// There is no stored counter and no unlock timer; state is recomputed
/// from history on every call, so unlock happens implicitly and a stale
/// timer can never clobber a newer lock cycle.
///
/// `failures` may contain timestamps older than the window; they are
/// ignored here so callers can pass ledger rows without pre-filtering.
pub fn evaluate(policy: &LockoutConfig, failures: &[DateTime<Utc>], now: DateTime<Utc>) -> LockoutStatus {
    let window = Duration::seconds(policy.window_seconds);
    let window_start = now - window;

    let in_window: Vec<DateTime<Utc>> = failures.iter().copied().filter(|t| *t > window_start && *t <= now).collect();

    if (in_window.len() as i64) >= policy.max_attempts {
        let latest = in_window.iter().max().copied().unwrap_or(now);
        let remaining = (latest + window - now).num_seconds();
        return LockoutStatus::Locked {
            remaining_seconds: remaining.clamp(1, policy.window_seconds),
        };
    }

    LockoutStatus::Open {
        attempts_left: policy.max_attempts - in_window.len() as i64,
    }
}
