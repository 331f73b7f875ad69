//! Migration engine seam and the changelog-driven SQL implementation.

use std::collections::HashSet;
use std::io;

use async_trait::async_trait;
use keyward_core::{COLUMN_CHANGE_DESCRIPTION, COLUMN_CHANGE_ID, TABLE_CHANGELOG};
use sqlx::{AnyConnection, Connection, Row};
use tracing::{debug, info};

use super::changelog::{ChangeSet, Changelog, ChangelogParams, bookkeeping_table};
use crate::dialect::DatabaseType;
use crate::error::UpgradeError;

/// Brings a store's schema up to date.
///
/// Implementations must be safe to run repeatedly and from several
/// processes at once: applying an already-applied change is a no-op.
#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Describe the changes that `apply` would make.
    async fn check(
        &self,
        conn: &mut AnyConnection,
        params: &ChangelogParams,
    ) -> Result<String, UpgradeError>;

    /// Apply every pending change, writing progress lines to `out`.
    ///
    /// Returns `true` when the schema is current afterwards.
    async fn apply(
        &self,
        conn: &mut AnyConnection,
        params: &ChangelogParams,
        out: &mut (dyn io::Write + Send),
    ) -> Result<bool, UpgradeError>;
}

/// Applies a [`Changelog`] and records each change set in a bookkeeping table.
#[derive(Debug, Clone)]
pub struct SqlMigrator {
    db: DatabaseType,
    changelog: Changelog,
}

impl SqlMigrator {
    pub fn new(db: DatabaseType, changelog: Changelog) -> Self {
        Self { db, changelog }
    }

    /// Migrator for the built-in credential schema.
    pub fn builtin(db: DatabaseType) -> Self {
        Self::new(db, Changelog::builtin(db))
    }

    pub fn changelog(&self) -> &Changelog {
        &self.changelog
    }

    /// Change sets not yet recorded, in changelog order.
    async fn pending(&self, conn: &mut AnyConnection) -> Result<Vec<&ChangeSet>, UpgradeError> {
        sqlx::query(&bookkeeping_table(self.db))
            .execute(&mut *conn)
            .await?;

        let select = format!(
            "SELECT {} AS id FROM {}",
            self.db.quote(COLUMN_CHANGE_ID),
            self.db.quote(TABLE_CHANGELOG)
        );
        let rows = sqlx::query(&select).fetch_all(&mut *conn).await?;
        let mut applied = HashSet::with_capacity(rows.len());
        for row in &rows {
            applied.insert(row.try_get::<String, _>("id")?);
        }

        Ok(self
            .changelog
            .change_sets
            .iter()
            .filter(|cs| !applied.contains(&cs.id))
            .collect())
    }

    /// Run one change set and its bookkeeping row in a single transaction.
    ///
    /// MySQL commits DDL implicitly, so there a change set failing partway
    /// keeps its earlier statements; it stays unrecorded and is rerun next time.
    async fn apply_one(
        &self,
        conn: &mut AnyConnection,
        change_set: &ChangeSet,
        params: &ChangelogParams,
    ) -> Result<(), UpgradeError> {
        let record = format!(
            "INSERT INTO {} ({}, {}) VALUES ({}, {})",
            self.db.quote(TABLE_CHANGELOG),
            self.db.quote(COLUMN_CHANGE_ID),
            self.db.quote(COLUMN_CHANGE_DESCRIPTION),
            self.db.placeholder(1),
            self.db.placeholder(2),
        );
        let failed = |e: sqlx::Error| {
            UpgradeError::Failed(format!("change set {}: {e}", change_set.id))
        };

        let mut tx = conn.begin().await?;
        for sql in change_set.render(params) {
            debug!(change_set = %change_set.id, sql = %sql, "executing");
            sqlx::query(&sql).execute(&mut *tx).await.map_err(failed)?;
        }
        sqlx::query(&record)
            .bind(change_set.id.as_str())
            .bind(change_set.description.as_str())
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;
        Ok(())
    }
}

#[async_trait]
impl MigrationEngine for SqlMigrator {
    /// Lists each pending change set followed by its statements, rendered
    /// with `params` exactly as `apply` would run them.
    async fn check(
        &self,
        conn: &mut AnyConnection,
        params: &ChangelogParams,
    ) -> Result<String, UpgradeError> {
        let pending = self.pending(conn).await?;
        if pending.is_empty() {
            return Ok(format!(
                "No change sets pending for changelog '{}'\n",
                self.changelog.name
            ));
        }

        let mut report = format!(
            "{} change set(s) pending for changelog '{}':\n",
            pending.len(),
            self.changelog.name
        );
        for cs in pending {
            report.push_str(&format!("  {}: {}\n", cs.id, cs.description));
            for sql in cs.render(params) {
                report.push_str(&format!("    {sql}\n"));
            }
        }
        Ok(report)
    }

    async fn apply(
        &self,
        conn: &mut AnyConnection,
        params: &ChangelogParams,
        out: &mut (dyn io::Write + Send),
    ) -> Result<bool, UpgradeError> {
        let pending = self.pending(conn).await?;
        if pending.is_empty() {
            writeln!(out, "Database is up to date")?;
            return Ok(true);
        }

        let total = pending.len();
        for cs in pending {
            writeln!(out, "Applying change set {}: {}", cs.id, cs.description)?;
            self.apply_one(conn, cs, params).await?;
            info!(change_set = %cs.id, db = %self.db, "change set applied");
        }
        writeln!(
            out,
            "Applied {total} change set(s) from changelog '{}'",
            self.changelog.name
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::any::install_default_drivers;
    use tempfile::TempDir;

    async fn connect(dir: &TempDir) -> AnyConnection {
        install_default_drivers();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("m.db").display());
        AnyConnection::connect(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_check_lists_pending_then_nothing() {
        let dir = TempDir::new().unwrap();
        let mut conn = connect(&dir).await;
        let migrator = SqlMigrator::builtin(DatabaseType::SQLite);
        let params = ChangelogParams::new();

        let report = migrator.check(&mut conn, &params).await.unwrap();
        assert!(report.starts_with("2 change set(s) pending"));
        assert!(report.contains("keyward-0001: create users table"));

        let mut out = Vec::new();
        assert!(migrator.apply(&mut conn, &params, &mut out).await.unwrap());
        let log = String::from_utf8(out).unwrap();
        assert!(log.contains("Applying change set keyward-0002"));

        let report = migrator.check(&mut conn, &params).await.unwrap();
        assert!(report.starts_with("No change sets pending"));
    }

    #[tokio::test]
    async fn test_apply_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let mut conn = connect(&dir).await;
        let migrator = SqlMigrator::builtin(DatabaseType::SQLite);
        let params = ChangelogParams::new();

        let mut out = Vec::new();
        assert!(migrator.apply(&mut conn, &params, &mut out).await.unwrap());
        let mut out = Vec::new();
        assert!(migrator.apply(&mut conn, &params, &mut out).await.unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Database is up to date\n");
    }

    #[tokio::test]
    async fn test_failed_change_set_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let mut conn = connect(&dir).await;
        let changelog = Changelog::new("broken")
            .change_set(ChangeSet::new("ok", "fine").statement("CREATE TABLE t1 (a INTEGER)"))
            .change_set(ChangeSet::new("bad", "syntax").statement("CREATE TABLE"));
        let migrator = SqlMigrator::new(DatabaseType::SQLite, changelog);
        let params = ChangelogParams::new();

        let mut out = Vec::new();
        let err = migrator.apply(&mut conn, &params, &mut out).await.unwrap_err();
        assert!(matches!(err, UpgradeError::Failed(ref m) if m.starts_with("change set bad")));

        let report = migrator.check(&mut conn, &params).await.unwrap();
        assert!(report.contains("bad: syntax"));
        assert!(!report.contains("ok: fine"));
    }

    #[tokio::test]
    async fn test_params_are_substituted() {
        let dir = TempDir::new().unwrap();
        let mut conn = connect(&dir).await;
        let changelog = Changelog::new("params").change_set(
            ChangeSet::new("t", "table").statement("CREATE TABLE ${table} (a INTEGER)"),
        );
        let migrator = SqlMigrator::new(DatabaseType::SQLite, changelog);
        let params: ChangelogParams = [("table".to_string(), "audit".to_string())].into();

        let report = migrator.check(&mut conn, &params).await.unwrap();
        assert!(report.contains("    CREATE TABLE audit (a INTEGER)\n"));
        let report = migrator.check(&mut conn, &ChangelogParams::new()).await.unwrap();
        assert!(report.contains("    CREATE TABLE ${table} (a INTEGER)\n"));

        let mut out = Vec::new();
        migrator.apply(&mut conn, &params, &mut out).await.unwrap();
        sqlx::query("SELECT a FROM audit")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    }
}
