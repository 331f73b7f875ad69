//! Configuration validation logic.

use crate::Config;
use crate::loader::ConfigError;

/// URL prefixes of the stores keyward can talk to.
pub const SUPPORTED_URL_PREFIXES: [&str; 5] = [
    "postgres://",
    "postgresql://",
    "mysql://",
    "mariadb://",
    "sqlite:",
];

/// Whether `url` names an in-memory SQLite database.
///
/// Every pooled connection to such a URL opens its own empty database, so
/// the schema created through one connection is invisible to the others.
pub fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let auth = &config.auth;
    if auth.db_url.trim().is_empty() {
        return Err(ConfigError::Validation("auth.db_url is empty".into()));
    }
    if !SUPPORTED_URL_PREFIXES
        .iter()
        .any(|prefix| auth.db_url.starts_with(prefix))
    {
        return Err(ConfigError::Validation(format!(
            "auth.db_url must start with one of: {:?}",
            SUPPORTED_URL_PREFIXES
        )));
    }
    if is_in_memory_sqlite(&auth.db_url) {
        return Err(ConfigError::Validation(
            "auth.db_url must name a database file, in-memory SQLite is not supported".into(),
        ));
    }
    if auth.pool.max_connections == 0 {
        return Err(ConfigError::Validation(
            "auth.pool.max_connections must be > 0".into(),
        ));
    }
    if auth.pool.min_connections > auth.pool.max_connections {
        return Err(ConfigError::Validation(
            "auth.pool.min_connections cannot be greater than max_connections".into(),
        ));
    }
    if auth.pool.acquire_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "auth.pool.acquire_timeout_secs must be > 0".into(),
        ));
    }
    if let Some(format) = config.logging.format.as_deref()
        && !["pretty", "compact", "json"].contains(&format)
    {
        return Err(ConfigError::Validation(
            "logging.format must be 'pretty', 'compact' or 'json'".into(),
        ));
    }
    if let Some(output) = config.logging.output.as_deref()
        && output != "stderr"
        && output != "stdout"
    {
        return Err(ConfigError::Validation(
            "logging.output must be 'stderr' or 'stdout'".into(),
        ));
    }
    Ok(())
}
