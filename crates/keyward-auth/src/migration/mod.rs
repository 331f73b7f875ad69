//! Schema migration: changelog, engine and the lazy gate.

mod changelog;
mod engine;
mod gate;

pub use changelog::{ChangeSet, Changelog, ChangelogParams, substitute};
pub use engine::{MigrationEngine, SqlMigrator};
pub use gate::MigrationGate;
