//! Caller-supplied credentials.

use std::collections::BTreeSet;
use std::fmt;

/// A username/password pair plus the roles found for it.
///
/// [`DatabaseHandler::is_valid_user`](crate::DatabaseHandler::is_valid_user)
/// only ever adds to `roles`; roles already present are kept.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserData {
    pub user_name: String,
    /// Plain text password, or the value compared against the stored hash.
    pub user_pass: String,
    pub roles: BTreeSet<String>,
}

impl UserData {
    pub fn new(user_name: impl Into<String>, user_pass: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_pass: user_pass.into(),
            roles: BTreeSet::new(),
        }
    }

    /// Whether `role` has been granted.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserData")
            .field("user_name", &self.user_name)
            .field("user_pass", &"***")
            .field("roles", &self.roles)
            .finish()
    }
}
