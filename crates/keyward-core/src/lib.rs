//! Core constants shared across keyward crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Store schema identifiers
//! - Common project metadata

pub mod defaults;
pub mod schema;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use schema::*;

/// Project name.
pub const PROJECT_NAME: &str = "keyward";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
