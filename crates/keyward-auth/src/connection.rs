//! Scoped connection acquisition.

use std::time::Duration;

use keyward_config::{AuthSettings, is_in_memory_sqlite};
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool};

use crate::dialect::DatabaseType;
use crate::error::AuthError;

/// Hands out one pooled connection per operation.
///
/// The pool connects lazily, so building a provider never touches the
/// store. A [`PoolConnection`] returns to the pool when dropped, which
/// releases it on every exit path of the operation holding it.
///
/// Must be created inside a Tokio runtime.
pub struct ConnectionProvider {
    pool: AnyPool,
    db_type: DatabaseType,
    redacted_url: String,
}

impl ConnectionProvider {
    /// Build a lazily-connecting pool for `settings.db_url`.
    pub fn new(settings: &AuthSettings) -> Result<Self, AuthError> {
        // Install database drivers for the "any" pool
        install_default_drivers();

        let db_type = database_type(settings)?;

        let pool_cfg = &settings.pool;
        let pool = AnyPoolOptions::new()
            .max_connections(pool_cfg.max_connections)
            .min_connections(pool_cfg.min_connections)
            .acquire_timeout(Duration::from_secs(pool_cfg.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(pool_cfg.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(pool_cfg.max_lifetime_secs))
            .connect_lazy(&settings.db_url)
            .map_err(|e| AuthError::Config(format!("invalid database URL: {e}")))?;

        Ok(Self {
            pool,
            db_type,
            redacted_url: settings.redacted_db_url(),
        })
    }

    /// Acquire a connection for the duration of one operation.
    pub async fn acquire(&self) -> Result<PoolConnection<Any>, AuthError> {
        Ok(self.pool.acquire().await?)
    }
}

/// Store dialect named by the settings' connection URL.
///
/// In-memory SQLite is refused: each pooled connection would see its own
/// empty database.
pub(crate) fn database_type(settings: &AuthSettings) -> Result<DatabaseType, AuthError> {
    if is_in_memory_sqlite(&settings.db_url) {
        return Err(AuthError::Config(format!(
            "in-memory SQLite is not supported: {}",
            settings.db_url
        )));
    }
    DatabaseType::from_url(&settings.db_url).ok_or_else(|| {
        AuthError::Config(format!(
            "unsupported database URL scheme: {}",
            settings.redacted_db_url()
        ))
    })
}

// Debug implementation (don't leak credentials)
impl std::fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("db_type", &self.db_type)
            .field("url", &self.redacted_url)
            .field("max_connections", &self.pool.options().get_max_connections())
            .finish_non_exhaustive()
    }
}
