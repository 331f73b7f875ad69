//! Password comparison strategies.
//!
//! The strategy is picked once from the settings when a handler is built.
//! Both variants compare inside the store: in hashed mode the stored hash is
//! never read back by the application.

use keyward_config::AuthSettings;
use keyward_core::{COLUMN_USER_PASS, TABLE_USERS};

use crate::dialect::DatabaseType;
use crate::error::AuthError;

/// How a supplied password is matched against `USERS.USER_PASS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMode {
    /// Literal equality with the stored value.
    PlainText,
    /// Store-side one-way verification (`crypt(candidate, stored) = stored`).
    ///
    /// Requires PostgreSQL with the `pgcrypto` extension.
    Hashed,
}

impl PasswordMode {
    /// Pick the strategy configured in `settings`.
    pub fn from_settings(settings: &AuthSettings) -> Self {
        if settings.plain_text_password {
            Self::PlainText
        } else {
            Self::Hashed
        }
    }

    /// Fail if the store has no verification function for this mode.
    pub fn ensure_supported(self, db: DatabaseType) -> Result<(), AuthError> {
        match (self, db) {
            (Self::PlainText, _) | (Self::Hashed, DatabaseType::PostgreSQL) => Ok(()),
            (Self::Hashed, other) => Err(AuthError::Unsupported(format!(
                "hashed passwords need a store-side crypt() function, \
                 which {other} does not provide"
            ))),
        }
    }

    /// SQL condition matching the password bound at `param` against the stored value.
    pub(crate) fn condition(self, db: DatabaseType, param: &str) -> Result<String, AuthError> {
        self.ensure_supported(db)?;
        let stored = db.column(TABLE_USERS, COLUMN_USER_PASS);
        Ok(match self {
            Self::PlainText => format!("{stored} = {param}"),
            Self::Hashed => format!("{stored} = crypt({param}, {stored})"),
        })
    }

    /// SQL expression producing the value stored for the password bound at `param`.
    pub(crate) fn stored_value(self, db: DatabaseType, param: &str) -> Result<String, AuthError> {
        self.ensure_supported(db)?;
        Ok(match self {
            Self::PlainText => param.to_string(),
            Self::Hashed => format!("crypt({param}, gen_salt('bf'))"),
        })
    }
}
