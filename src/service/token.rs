use crate::config::SessionConfig;
use crate::error::app_error::AppError;
use crate::models::session::Claims;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

/// Issues and verifies the signed session credential returned on login.
/// Tokens are self-contained HS256 JWTs; nothing is stored server-side.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

impl TokenIssuer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_minutes: config.expiry_minutes,
        }
    }

    /// Sign a session credential for an authenticated account.
    pub fn issue(&self, user_id: &Uuid, username: &str) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.expiry_minutes);

        let claims = Claims {
            sub: *user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::token_signing("Failed to sign session token", e))?;

        Ok((token, expires_at))
    }

    /// Verify a presented credential; expiry is enforced by the decoder.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|_| AppError::Unauthorized)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(expiry_minutes: i64) -> TokenIssuer {
        TokenIssuer::new(&SessionConfig {
            jwt_secret: "test-secret-not-for-production".to_string(),
            expiry_minutes,
        })
    }

    #[test]
    fn issued_token_round_trips() {
        let issuer = issuer(60);
        let user_id = Uuid::new_v4();

        let (token, expires_at) = issuer.issue(&user_id, "janedoe42").expect("token issued");
        let claims = issuer.decode(&token).expect("token decodes");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "janedoe42");
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer(-5);
        let (token, _) = issuer.issue(&Uuid::new_v4(), "janedoe42").expect("token issued");
        assert!(issuer.decode(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = issuer(60).issue(&Uuid::new_v4(), "janedoe42").expect("token issued");

        let other = TokenIssuer::new(&SessionConfig {
            jwt_secret: "a-different-secret-entirely".to_string(),
            expiry_minutes: 60,
        });
        assert!(other.decode(&token).is_err());
    }
}
