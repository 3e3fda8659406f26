//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blogicum_core::DEFAULT_PAGE_SIZE;
use blogicum_infra::{DatabaseConfig, JwtConfig, RateLimitConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub page_size: u64,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    /// Staff account ensured at startup.
    pub admin: Option<AdminConfig>,
}

/// Credentials of the staff account created or promoted at startup.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AdminConfig {
    /// Read `ADMIN_USERNAME`, `ADMIN_EMAIL` and `ADMIN_PASSWORD`. All three
    /// must be set.
    pub fn from_env() -> Option<Self> {
        let vars = (
            env::var("ADMIN_USERNAME").ok(),
            env::var("ADMIN_EMAIL").ok(),
            env::var("ADMIN_PASSWORD").ok(),
        );
        match vars {
            (Some(username), Some(email), Some(password)) => Some(Self {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                tracing::warn!(
                    "ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must be set together. Skipping staff bootstrap."
                );
                None
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            page_size: DEFAULT_PAGE_SIZE,
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
            admin: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            database,
            page_size: parse_var::<u64>("PAGE_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            admin: AdminConfig::from_env(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
