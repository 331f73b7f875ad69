//! Identifiers of the credential store schema.
//!
//! These must match exactly what the built-in changelog creates.

/// Table holding one row per user.
pub const TABLE_USERS: &str = "USERS";
/// Table holding one row per (user, role) grant.
pub const TABLE_USER_ROLES: &str = "USER_ROLES";
/// Table recording applied change sets.
pub const TABLE_CHANGELOG: &str = "KEYWARD_CHANGELOG";

/// User name column (both tables).
pub const COLUMN_USER_NAME: &str = "USER_NAME";
/// Password or password hash column.
pub const COLUMN_USER_PASS: &str = "USER_PASS";
/// Role name column.
pub const COLUMN_ROLE_NAME: &str = "ROLE_NAME";

/// Change set id column of the changelog table.
pub const COLUMN_CHANGE_ID: &str = "ID";
/// Change set description column of the changelog table.
pub const COLUMN_CHANGE_DESCRIPTION: &str = "DESCRIPTION";
/// Store-local `TIMESTAMP` at which a change set was applied, filled by
/// the column's `CURRENT_TIMESTAMP` default.
pub const COLUMN_CHANGE_APPLIED_AT: &str = "APPLIED_AT";
