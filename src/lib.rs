//! # keyward
//!
//! Username/password authentication and role-based authorization backed by
//! a relational credential store.
//!
//! ## Crates
//!
//! - [`keyward_core`] - Shared defaults and schema names
//! - [`keyward_config`] - Configuration loading and validation
//! - [`keyward_auth`] - Database handler, registry, migrations and CLI

pub use keyward_auth as auth;
pub use keyward_config as config;
pub use keyward_core as core;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use keyward_auth::{
        AuthError, ChangelogParams, DatabaseHandler, HandlerRegistry, UpgradeError, UserData,
    };
    pub use keyward_config::{AuthSettings, Config, load_config, validate_config};
}
