//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Credential Store Defaults
// ============================================================================

/// Apply pending schema changes on first use of a handler.
pub const DEFAULT_AUTO_UPDATE_DATABASE: bool = false;
/// Compare passwords as plain text (false = store-side hash verification).
pub const DEFAULT_PLAIN_TEXT_PASSWORD: bool = true;
/// Minimum delay before a failed lazy migration is attempted again (seconds).
pub const DEFAULT_MIGRATION_RETRY_SECS: u64 = 60;

// ============================================================================
// Connection Pool Defaults
// ============================================================================

/// Default maximum number of pooled connections.
pub const DEFAULT_POOL_MAX_CONNECTIONS: u32 = 10;
/// Default minimum number of idle connections kept open.
pub const DEFAULT_POOL_MIN_CONNECTIONS: u32 = 0;
/// Default time to wait for a connection before failing (seconds).
pub const DEFAULT_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 30;
/// Default idle connection timeout (10 minutes).
pub const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 600;
/// Default maximum connection lifetime (30 minutes).
pub const DEFAULT_POOL_MAX_LIFETIME_SECS: u64 = 1800;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default log format (pretty, compact, json).
pub const DEFAULT_LOG_FORMAT: &str = "pretty";
/// Default log output (stderr, stdout).
pub const DEFAULT_LOG_OUTPUT: &str = "stderr";
