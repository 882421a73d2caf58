/*
 * Responsibility
 * - Environment-driven configuration (PORT, JWT_SECRET, path policies, CORS)
 * - Validation of required values (startup fails fast on bad config)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Default public patterns: the auth service issues tokens, so it cannot
/// itself require one.
pub const DEFAULT_PUBLIC_PATHS: &str = "/api/auth/**";

/// Default role policy. Ordered; first match wins.
pub const DEFAULT_ROLE_RULES: &str =
    "/api/admin/**=ADMIN,/api/kds/**=ADMIN|KITCHEN,/api/analytics/**=ADMIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    /// HMAC-SHA256 signing secret shared with the auth service.
    pub jwt_secret: String,

    /// Comma-delimited glob patterns exempt from credential verification.
    pub public_paths: String,

    /// Comma-delimited `pattern=ROLE|ROLE` authorization rules.
    pub role_rules: String,

    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        // HS256 requires a key at least as long as the hash output. A shorter
        // secret must fail at startup, not per-request.
        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let public_paths = std::env::var("GATEWAY_PUBLIC_PATHS")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_PATHS.to_string());

        let role_rules = std::env::var("GATEWAY_ROLE_RULES")
            .unwrap_or_else(|_| DEFAULT_ROLE_RULES.to_string());

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            public_paths,
            role_rules,
            cors_allowed_origins,
        })
    }
}
