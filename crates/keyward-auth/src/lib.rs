//! Database-backed credential verification and role checks.
//!
//! A [`DatabaseHandler`] answers three questions against a relational
//! credential store (`USERS` and `USER_ROLES` tables):
//!
//! - does this username/password pair exist, and which roles does it hold;
//! - does this user (optionally with this password) hold a given role;
//! - which schema changes are pending, and can they be applied.
//!
//! Passwords are compared inside the store, either literally or with
//! PostgreSQL's `crypt()`, as selected by
//! [`AuthSettings::plain_text_password`](keyward_config::AuthSettings).
//!
//! Handlers are shared per configuration through a [`HandlerRegistry`], and
//! can bring the schema up to date lazily on first use.
//!
//! # Example
//!
//! ```ignore
//! use keyward_auth::{HandlerRegistry, UserData};
//! use keyward_config::AuthSettings;
//!
//! let registry = HandlerRegistry::new();
//! let settings = AuthSettings::new("sqlite://auth.db?mode=rwc").auto_update_database(true);
//! let handler = registry.init(&settings)?;
//!
//! let mut user = UserData::new("alice", "wonderland");
//! if handler.is_valid_user(&mut user).await {
//!     println!("roles: {:?}", user.roles);
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `sql-postgres`: PostgreSQL support
//! - `sql-mysql`: MySQL/MariaDB support
//! - `sql-sqlite`: SQLite support

pub mod cli;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod handler;
pub mod migration;
pub mod password;
mod queries;
pub mod registry;
pub mod user;

pub use cli::{AuthArgs, AuthCommands};
pub use connection::ConnectionProvider;
pub use dialect::DatabaseType;
pub use error::{AuthError, UpgradeError};
pub use handler::{DatabaseHandler, UserSummary};
pub use migration::{
    ChangeSet, Changelog, ChangelogParams, MigrationEngine, MigrationGate, SqlMigrator,
};
pub use password::PasswordMode;
pub use registry::HandlerRegistry;
pub use user::UserData;
