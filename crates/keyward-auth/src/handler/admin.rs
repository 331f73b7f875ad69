//! User and grant administration.
//!
//! Unlike the credential checks these are operator actions, so errors
//! are returned to the caller instead of being folded into `false`.

use serde::Serialize;
use sqlx::{Connection, Row};
use tracing::info;

use super::DatabaseHandler;
use crate::error::AuthError;
use crate::queries::{ROLE_NAME_ALIAS, USER_NAME_ALIAS};

/// A stored user and the roles granted to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub user_name: String,
    pub roles: Vec<String>,
}

impl DatabaseHandler {
    /// Create a user. In hashed mode the store hashes `pass` itself.
    pub async fn add_user(&self, user: &str, pass: &str) -> Result<(), AuthError> {
        self.ensure_schema_current().await;
        let mut conn = self.connections.acquire().await?;
        sqlx::query(&self.queries.insert_user)
            .bind(user)
            .bind(pass)
            .execute(&mut *conn)
            .await?;
        info!(user, "user added");
        Ok(())
    }

    /// Delete a user together with all of their grants.
    pub async fn remove_user(&self, user: &str) -> Result<(), AuthError> {
        self.ensure_schema_current().await;
        let mut conn = self.connections.acquire().await?;
        let mut tx = conn.begin().await?;
        sqlx::query(&self.queries.delete_user_roles)
            .bind(user)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query(&self.queries.delete_user)
            .bind(user)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AuthError::NotFound(format!("user '{user}'")));
        }
        tx.commit().await?;
        info!(user, "user removed");
        Ok(())
    }

    /// Grant `role` to an existing user.
    pub async fn grant_role(&self, user: &str, role: &str) -> Result<(), AuthError> {
        self.ensure_schema_current().await;
        let mut conn = self.connections.acquire().await?;
        sqlx::query(&self.queries.insert_grant)
            .bind(user)
            .bind(role)
            .execute(&mut *conn)
            .await?;
        info!(user, role, "role granted");
        Ok(())
    }

    pub async fn revoke_role(&self, user: &str, role: &str) -> Result<(), AuthError> {
        self.ensure_schema_current().await;
        let mut conn = self.connections.acquire().await?;
        let revoked = sqlx::query(&self.queries.delete_grant)
            .bind(user)
            .bind(role)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if revoked == 0 {
            return Err(AuthError::NotFound(format!(
                "role '{role}' is not granted to '{user}'"
            )));
        }
        info!(user, role, "role revoked");
        Ok(())
    }

    /// All users ordered by name, each with their roles in order.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError> {
        self.ensure_schema_current().await;
        let mut conn = self.connections.acquire().await?;
        let rows = sqlx::query(&self.queries.list_users)
            .fetch_all(&mut *conn)
            .await?;

        let mut users: Vec<UserSummary> = Vec::new();
        for row in &rows {
            let user_name: String = row.try_get(USER_NAME_ALIAS)?;
            let role: Option<String> = row.try_get(ROLE_NAME_ALIAS)?;
            match users.last_mut() {
                Some(last) if last.user_name == user_name => last.roles.extend(role),
                _ => users.push(UserSummary {
                    user_name,
                    roles: role.into_iter().collect(),
                }),
            }
        }
        Ok(users)
    }
}
