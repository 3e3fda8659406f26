//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::domain::{NewAccount, User};
use blogicum_core::ports::{PasswordService, TokenService};
use blogicum_core::{BlogService, Repositories};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

use crate::config::{AdminConfig, AppConfig};
use crate::middleware::error::AppResult;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

impl AppState {
    /// Build the application state, connecting to PostgreSQL when configured.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        let state = Self::from_repositories(repos, config);

        if let Some(admin) = config.admin.as_ref() {
            if let Err(e) = state.bootstrap_admin(admin).await {
                tracing::error!(error = %e, username = %admin.username, "Staff bootstrap failed");
            }
        }

        tracing::info!("Application state initialized");
        state
    }

    /// Create or promote the configured staff account.
    pub async fn bootstrap_admin(&self, admin: &AdminConfig) -> AppResult<User> {
        let password_hash = self.passwords.hash(&admin.password)?;
        let user = self
            .blog
            .ensure_staff_account(
                NewAccount {
                    username: admin.username.clone(),
                    email: admin.email.clone(),
                    first_name: String::new(),
                    last_name: String::new(),
                },
                password_hash,
            )
            .await?;
        Ok(user)
    }

    /// Wire the state around an existing set of repositories.
    pub fn from_repositories(repos: Repositories, config: &AppConfig) -> Self {
        Self {
            blog: BlogService::new(repos).with_page_size(config.page_size),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::default()),
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        use blogicum_infra::database::{connect, repositories};

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return InMemoryStore::new().repositories();
        };

        match connect(db_config).await {
            Ok(db) => repositories(db),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                InMemoryStore::new().repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory store");
        InMemoryStore::new().repositories()
    }
}
