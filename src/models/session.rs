use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the signed session credential. Kept minimal: identity
/// plus standard expiry bookkeeping, nothing profile-shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    pub username: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Token id, for audit correlation.
    pub jti: Uuid,
}
