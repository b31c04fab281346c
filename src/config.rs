use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api/v1";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub lockout: LockoutConfig,
    pub password_reset: PasswordResetConfig,
    pub rate_limit: RateLimitConfig,
    pub email: EmailConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
}

/// Session-credential signing. The secret must be overridden outside of
/// debug profiles; see `ensure_session_secret` in lib.rs.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub expiry_minutes: i64,
}

/// Recovery lockout policy: `max_attempts` failed security-question
/// submissions within `window_seconds` lock the account for the remainder
/// of the window. `answers_required` is the partial-credit pass threshold.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LockoutConfig {
    pub max_attempts: i64,
    pub window_seconds: i64,
    pub answers_required: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PasswordResetConfig {
    /// Lifetime of the emailed reset-flow token.
    pub email_token_ttl_seconds: i64,
    /// Lifetime of the single-use authorization issued when the
    /// security-question verification passes.
    pub authorization_ttl_seconds: i64,
    pub frontend_reset_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    pub auth_limit: u32,
    pub general_limit: u32,
    pub window_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub require_client_ip: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MaintenanceConfig {
    /// Ledger rows older than this are pruned by the cron binary.
    pub ledger_retention_days: i64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/portcullis_db".to_string(),
            max_connections: 16,
            min_connections: 4,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "insecure-dev-secret-change-me".to_string(),
            expiry_minutes: 60,
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window_seconds: 180,
            answers_required: 2,
        }
    }
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            email_token_ttl_seconds: 3600,
            authorization_ttl_seconds: 900,
            frontend_reset_url: "http://localhost:5173/reset-password".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth_limit: 30,
            general_limit: 300,
            window_seconds: 60,
            cleanup_interval_seconds: 300,
            require_client_ip: false,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "no-reply@portcullis.local".to_string(),
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { ledger_retention_days: 90 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            lockout: LockoutConfig::default(),
            password_reset: PasswordResetConfig::default(),
            rate_limit: RateLimitConfig::default(),
            email: EmailConfig::default(),
            maintenance: MaintenanceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Portcullis.toml (base configuration file)
    /// 2. Environment variables (prefixed with PORTCULLIS_)
    /// 3. DATABASE_URL environment variable (for backwards compatibility)
    pub fn load() -> Result<Self, figment::Error> {
        let figment = Figment::new()
            // Start with defaults
            .merge(Toml::string(&toml::to_string(&Config::default()).unwrap()).nested())
            // Layer on Portcullis.toml if it exists
            .merge(Toml::file("Portcullis.toml").nested())
            // Layer on environment variables (e.g., PORTCULLIS_DATABASE_URL)
            .merge(Env::prefixed("PORTCULLIS_").split("_"))
            // Special case: DATABASE_URL for backwards compatibility
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()));

        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recovery_policy() {
        let config = Config::default();
        assert_eq!(config.lockout.max_attempts, 3);
        assert_eq!(config.lockout.window_seconds, 180);
        assert_eq!(config.lockout.answers_required, 2);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let serialized = toml::to_string(&Config::default()).expect("serializable defaults");
        let parsed: Config = toml::from_str(&serialized).expect("parseable defaults");
        assert_eq!(parsed.server.port, 8000);
        assert_eq!(parsed.password_reset.authorization_ttl_seconds, 900);
    }
}
