//! SQL texts, rendered once per handler for its dialect and password mode.

use keyward_core::{
    COLUMN_ROLE_NAME, COLUMN_USER_NAME, COLUMN_USER_PASS, TABLE_USER_ROLES, TABLE_USERS,
};

use crate::dialect::DatabaseType;
use crate::error::AuthError;
use crate::password::PasswordMode;

/// Column alias of the role name in role-returning queries.
pub(crate) const ROLE_NAME_ALIAS: &str = "role_name";
/// Column alias of the user name in listing queries.
pub(crate) const USER_NAME_ALIAS: &str = "user_name";

/// Every statement a handler issues against the credential tables.
#[derive(Debug, Clone)]
pub(crate) struct Queries {
    /// Roles of a user whose password matches. Binds: user name, password.
    /// Yields one row per grant, or a single NULL-role row for a user without grants.
    pub user_roles: String,
    /// Existence of a grant for a user whose password matches.
    /// Binds: user name, password, role name.
    pub user_has_role_with_password: String,
    /// Existence of a grant. Binds: user name, role name.
    pub user_has_role: String,
    /// Binds: user name, password.
    pub insert_user: String,
    /// Binds: user name.
    pub delete_user: String,
    /// Binds: user name.
    pub delete_user_roles: String,
    /// Binds: user name, role name.
    pub insert_grant: String,
    /// Binds: user name, role name.
    pub delete_grant: String,
    /// All users with their grants, ordered by user then role.
    pub list_users: String,
}

impl Queries {
    pub fn new(db: DatabaseType, mode: PasswordMode) -> Result<Self, AuthError> {
        let users = db.quote(TABLE_USERS);
        let roles = db.quote(TABLE_USER_ROLES);
        let users_name = db.column(TABLE_USERS, COLUMN_USER_NAME);
        let roles_user = db.column(TABLE_USER_ROLES, COLUMN_USER_NAME);
        let roles_role = db.column(TABLE_USER_ROLES, COLUMN_ROLE_NAME);
        let user_name = db.quote(COLUMN_USER_NAME);
        let user_pass = db.quote(COLUMN_USER_PASS);
        let role_name = db.quote(COLUMN_ROLE_NAME);
        let p1 = db.placeholder(1);
        let p2 = db.placeholder(2);
        let p3 = db.placeholder(3);

        let joined = format!("{users} LEFT JOIN {roles} ON {users_name} = {roles_user}");
        let credentials = format!("{users_name} = {p1} AND {}", mode.condition(db, &p2)?);

        Ok(Self {
            user_roles: format!(
                "SELECT {roles_role} AS {ROLE_NAME_ALIAS} FROM {joined} WHERE {credentials}"
            ),
            user_has_role_with_password: format!(
                "SELECT 1 AS found FROM {joined} WHERE {credentials} \
                 AND {roles_role} = {p3} LIMIT 1"
            ),
            user_has_role: format!(
                "SELECT 1 AS found FROM {roles} WHERE {roles_user} = {p1} \
                 AND {roles_role} = {p2} LIMIT 1"
            ),
            insert_user: format!(
                "INSERT INTO {users} ({user_name}, {user_pass}) VALUES ({p1}, {})",
                mode.stored_value(db, &p2)?
            ),
            delete_user: format!("DELETE FROM {users} WHERE {user_name} = {p1}"),
            delete_user_roles: format!("DELETE FROM {roles} WHERE {user_name} = {p1}"),
            insert_grant: format!(
                "INSERT INTO {roles} ({user_name}, {role_name}) VALUES ({p1}, {p2})"
            ),
            delete_grant: format!(
                "DELETE FROM {roles} WHERE {user_name} = {p1} AND {role_name} = {p2}"
            ),
            list_users: format!(
                "SELECT {users_name} AS {USER_NAME_ALIAS}, {roles_role} AS {ROLE_NAME_ALIAS} \
                 FROM {joined} ORDER BY {users_name}, {roles_role}"
            ),
        })
    }
}
