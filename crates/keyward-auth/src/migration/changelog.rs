//! Ordered change sets describing the credential schema.

use std::collections::BTreeMap;

use keyward_core::{
    COLUMN_CHANGE_APPLIED_AT, COLUMN_CHANGE_DESCRIPTION, COLUMN_CHANGE_ID, COLUMN_ROLE_NAME,
    COLUMN_USER_NAME, COLUMN_USER_PASS, PROJECT_NAME, TABLE_CHANGELOG, TABLE_USER_ROLES,
    TABLE_USERS,
};

use crate::dialect::DatabaseType;

/// Values substituted for `${name}` tokens in change set statements.
pub type ChangelogParams = BTreeMap<String, String>;

/// One unit of schema change, applied in one transaction and recorded by id.
///
/// On MySQL, DDL statements commit implicitly, so a change set that fails
/// partway leaves its earlier statements applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub id: String,
    pub description: String,
    pub statements: Vec<String>,
}

impl ChangeSet {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            statements: Vec::new(),
        }
    }

    /// Builder: append a statement.
    pub fn statement(mut self, sql: impl Into<String>) -> Self {
        self.statements.push(sql.into());
        self
    }

    /// Statements with parameters substituted.
    pub fn render(&self, params: &ChangelogParams) -> Vec<String> {
        self.statements
            .iter()
            .map(|sql| substitute(sql, params))
            .collect()
    }
}

/// A named, ordered list of change sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    pub name: String,
    pub change_sets: Vec<ChangeSet>,
}

impl Changelog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            change_sets: Vec::new(),
        }
    }

    /// Builder: append a change set.
    pub fn change_set(mut self, change_set: ChangeSet) -> Self {
        self.change_sets.push(change_set);
        self
    }

    /// The credential schema for `db`.
    pub fn builtin(db: DatabaseType) -> Self {
        let users = db.quote(TABLE_USERS);
        let roles = db.quote(TABLE_USER_ROLES);
        let user_name = db.quote(COLUMN_USER_NAME);
        let user_pass = db.quote(COLUMN_USER_PASS);
        let role_name = db.quote(COLUMN_ROLE_NAME);

        let mut changelog = Self::new(PROJECT_NAME).change_set(
            ChangeSet::new("keyward-0001", "create users table").statement(format!(
                "CREATE TABLE IF NOT EXISTS {users} (\
                 {user_name} VARCHAR(255) NOT NULL PRIMARY KEY, \
                 {user_pass} TEXT NOT NULL)"
            )),
        );
        changelog = changelog.change_set(
            ChangeSet::new("keyward-0002", "create user roles table").statement(format!(
                "CREATE TABLE IF NOT EXISTS {roles} (\
                 {user_name} VARCHAR(255) NOT NULL, \
                 {role_name} VARCHAR(255) NOT NULL, \
                 PRIMARY KEY ({user_name}, {role_name}), \
                 FOREIGN KEY ({user_name}) REFERENCES {users} ({user_name}) ON DELETE CASCADE)"
            )),
        );
        if db == DatabaseType::PostgreSQL {
            changelog = changelog.change_set(
                ChangeSet::new("keyward-0003", "enable pgcrypto for hashed passwords")
                    .statement("CREATE EXTENSION IF NOT EXISTS pgcrypto"),
            );
        }
        changelog
    }
}

/// DDL of the table recording applied change sets.
pub(crate) fn bookkeeping_table(db: DatabaseType) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR(255) NOT NULL PRIMARY KEY, \
         {} VARCHAR(255) NOT NULL, {} TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
        db.quote(TABLE_CHANGELOG),
        db.quote(COLUMN_CHANGE_ID),
        db.quote(COLUMN_CHANGE_DESCRIPTION),
        db.quote(COLUMN_CHANGE_APPLIED_AT),
    )
}

/// Replace every `${name}` with its value. Unknown names and unterminated
/// tokens are kept verbatim.
pub fn substitute(sql: &str, params: &ChangelogParams) -> String {
    if params.is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let token = &rest[start..];
        match token.find('}') {
            Some(end) => {
                let name = &token[2..end];
                match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&token[..=end]),
                }
                rest = &token[end + 1..];
            }
            None => {
                out.push_str(token);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
