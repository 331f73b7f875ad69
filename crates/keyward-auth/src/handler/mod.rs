//! Per-configuration database handler.
//!
//! A handler answers credential and role questions against one store.
//! Every check is fail-closed: infrastructure errors are logged and the
//! answer is `false`, so callers never have to tell "denied" from "broken".

mod admin;

use std::io;
use std::sync::Arc;

use keyward_config::AuthSettings;
use keyward_core::VERSION;
use sqlx::Row;
use tracing::{debug, error, info};

use crate::connection::{ConnectionProvider, database_type};
use crate::error::{AuthError, UpgradeError};
use crate::migration::{ChangelogParams, MigrationEngine, MigrationGate, SqlMigrator};
use crate::password::PasswordMode;
use crate::queries::{Queries, ROLE_NAME_ALIAS};
use crate::user::UserData;

pub use admin::UserSummary;

/// Header of the diagnostic produced when the store cannot be reached for an upgrade.
const INIT_FAILURE_PREFIX: &str = "Failed to initialise database:\n";

/// Credential verification, role resolution and upgrades for one store.
pub struct DatabaseHandler {
    settings: AuthSettings,
    mode: PasswordMode,
    connections: ConnectionProvider,
    queries: Queries,
    engine: Arc<dyn MigrationEngine>,
    gate: MigrationGate,
}

impl DatabaseHandler {
    /// Build a handler using the built-in credential schema.
    ///
    /// Does not connect. Must be called inside a Tokio runtime.
    pub fn new(settings: AuthSettings) -> Result<Self, AuthError> {
        let db = database_type(&settings)?;
        Self::with_engine(settings, Arc::new(SqlMigrator::builtin(db)))
    }

    /// Build a handler that migrates with `engine`.
    pub fn with_engine(
        settings: AuthSettings,
        engine: Arc<dyn MigrationEngine>,
    ) -> Result<Self, AuthError> {
        let db = database_type(&settings)?;
        let mode = PasswordMode::from_settings(&settings);
        let queries = Queries::new(db, mode)?;
        let connections = ConnectionProvider::new(&settings)?;
        let gate = MigrationGate::new(
            settings.auto_update_database,
            settings.migration_retry_interval(),
        );

        info!(
            version = VERSION,
            db = %db,
            url = %settings.redacted_db_url(),
            plain_text_password = settings.plain_text_password,
            auto_update_database = settings.auto_update_database,
            "database handler created"
        );

        Ok(Self {
            settings,
            mode,
            connections,
            queries,
            engine,
            gate,
        })
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn password_mode(&self) -> PasswordMode {
        self.mode
    }

    pub fn is_plain_text_password(&self) -> bool {
        self.mode == PasswordMode::PlainText
    }

    /// Whether the lazy migration has yet to succeed.
    pub fn migration_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Check `user`'s password and add every role granted to them.
    ///
    /// Returns `true` iff the user exists and the password matches, with or
    /// without roles. Roles are left untouched when it returns `false`.
    pub async fn is_valid_user(&self, user: &mut UserData) -> bool {
        self.ensure_schema_current().await;

        match self.try_user_roles(&user.user_name, &user.user_pass).await {
            Ok(Some(roles)) => {
                debug!(user = %user.user_name, roles = roles.len(), "credentials accepted");
                user.roles.extend(roles);
                true
            }
            Ok(None) => {
                debug!(user = %user.user_name, "credentials rejected");
                false
            }
            Err(e) => {
                error!(user = %user.user_name, error = %e, "credential lookup failed");
                false
            }
        }
    }

    /// Whether the password matches and `role` is granted to `user`.
    pub async fn user_has_role_with_password(&self, user: &str, pass: &str, role: &str) -> bool {
        self.ensure_schema_current().await;

        match self.try_has_role_with_password(user, pass, role).await {
            Ok(found) => found,
            Err(e) => {
                error!(user, role, error = %e, "role lookup failed");
                false
            }
        }
    }

    /// Whether `role` is granted to `user`, without checking a password.
    ///
    /// A missing user answers `false` without touching the store.
    pub async fn user_has_role(&self, user: Option<&str>, role: &str) -> bool {
        let Some(user) = user else {
            return false;
        };
        self.ensure_schema_current().await;

        match self.try_has_role(user, role).await {
            Ok(found) => found,
            Err(e) => {
                error!(user, role, error = %e, "role lookup failed");
                false
            }
        }
    }

    /// Report the schema changes an upgrade would apply.
    ///
    /// Never fails: an unreachable store yields a diagnostic instead.
    pub async fn check_for_upgrades(&self, params: &ChangelogParams) -> String {
        match self.try_check(params).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "database upgrade check failed");
                init_failure(&e)
            }
        }
    }

    /// [`check_for_upgrades`](Self::check_for_upgrades) without parameters.
    pub async fn check_for_upgrades_default(&self) -> String {
        self.check_for_upgrades(&ChangelogParams::new()).await
    }

    /// Apply pending schema changes, writing progress to `out`.
    ///
    /// An unreachable store writes a diagnostic to `out` and returns
    /// `Ok(false)`.
    pub async fn do_upgrades<W>(
        &self,
        out: &mut W,
        params: &ChangelogParams,
    ) -> Result<bool, UpgradeError>
    where
        W: io::Write + Send,
    {
        let mut conn = match self.connections.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "database upgrade failed to connect");
                out.write_all(init_failure(&e).as_bytes())?;
                out.flush()?;
                return Ok(false);
            }
        };

        let applied = self.engine.apply(&mut conn, params, out).await?;
        if applied {
            self.gate.mark_current();
        }
        Ok(applied)
    }

    /// [`do_upgrades`](Self::do_upgrades) without parameters.
    pub async fn do_upgrades_default<W>(&self, out: &mut W) -> Result<bool, UpgradeError>
    where
        W: io::Write + Send,
    {
        self.do_upgrades(out, &ChangelogParams::new()).await
    }

    async fn ensure_schema_current(&self) {
        self.gate.ensure(|| self.run_migration()).await;
    }

    async fn run_migration(&self) -> Result<bool, UpgradeError> {
        let mut conn = self.connections.acquire().await?;
        let mut progress = Vec::new();
        let applied = self
            .engine
            .apply(&mut conn, &ChangelogParams::new(), &mut progress)
            .await?;
        for line in String::from_utf8_lossy(&progress).lines() {
            info!("{line}");
        }
        Ok(applied)
    }

    async fn try_user_roles(
        &self,
        user: &str,
        pass: &str,
    ) -> Result<Option<Vec<String>>, AuthError> {
        let mut conn = self.connections.acquire().await?;
        let rows = sqlx::query(&self.queries.user_roles)
            .bind(user)
            .bind(pass)
            .fetch_all(&mut *conn)
            .await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut roles = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(role) = row.try_get::<Option<String>, _>(ROLE_NAME_ALIAS)? {
                roles.push(role);
            }
        }
        Ok(Some(roles))
    }

    async fn try_has_role_with_password(
        &self,
        user: &str,
        pass: &str,
        role: &str,
    ) -> Result<bool, AuthError> {
        let mut conn = self.connections.acquire().await?;
        let row = sqlx::query(&self.queries.user_has_role_with_password)
            .bind(user)
            .bind(pass)
            .bind(role)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn try_has_role(&self, user: &str, role: &str) -> Result<bool, AuthError> {
        let mut conn = self.connections.acquire().await?;
        let row = sqlx::query(&self.queries.user_has_role)
            .bind(user)
            .bind(role)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn try_check(&self, params: &ChangelogParams) -> Result<String, UpgradeError> {
        let mut conn = self.connections.acquire().await?;
        self.engine.check(&mut conn, params).await
    }
}

impl std::fmt::Debug for DatabaseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandler")
            .field("settings", &self.settings)
            .field("mode", &self.mode)
            .field("connections", &self.connections)
            .field("migration_pending", &self.gate.is_pending())
            .finish_non_exhaustive()
    }
}

fn init_failure(err: &dyn std::fmt::Display) -> String {
    format!("{INIT_FAILURE_PREFIX}{err}\n")
}
