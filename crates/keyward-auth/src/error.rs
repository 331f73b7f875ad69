//! Error types.

use std::io;

/// Errors raised while building handlers or running administrative operations.
///
/// Credential and role checks never return this type: they log it and
/// answer `false`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Backend error (connection, query, decoding).
    #[error("backend error: {0}")]
    Backend(String),

    /// The settings cannot be used to build a handler.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store does not support the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The targeted user or grant does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl AuthError {
    /// Create a backend error from any error type.
    #[inline]
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::backend(err)
    }
}

/// Errors surfaced by explicit schema upgrades.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// The migration engine could not apply the pending changes.
    #[error("upgrade failed: {0}")]
    Failed(String),

    /// The progress output could not be written.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl UpgradeError {
    /// Create an upgrade failure from any error type.
    #[inline]
    pub fn failed<E: std::fmt::Display>(err: E) -> Self {
        Self::Failed(err.to_string())
    }
}

impl From<sqlx::Error> for UpgradeError {
    fn from(err: sqlx::Error) -> Self {
        Self::failed(err)
    }
}

impl From<AuthError> for UpgradeError {
    fn from(err: AuthError) -> Self {
        Self::failed(err)
    }
}
