//! Lazy, run-once schema migration in front of credential queries.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::UpgradeError;

/// Makes sure a migration succeeds once before the guarded operations run.
///
/// The pending flag is read without locking on every call. Only while it
/// is set do callers serialize on the async mutex, so two tasks never run
/// the migration at the same time. A failed run is retried on a later call
/// once `retry_interval` has passed.
#[derive(Debug)]
pub struct MigrationGate {
    pending: AtomicBool,
    last_failure: Mutex<Option<Instant>>,
    retry_interval: Duration,
}

impl MigrationGate {
    /// A gate that migrates on first use when `enabled`, and never otherwise.
    pub fn new(enabled: bool, retry_interval: Duration) -> Self {
        Self {
            pending: AtomicBool::new(enabled),
            last_failure: Mutex::new(None),
            retry_interval,
        }
    }

    /// Whether a successful migration is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Record that the schema was brought up to date by other means.
    pub fn mark_current(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Run `migrate` unless the schema is already known to be current.
    ///
    /// Failures are logged and swallowed: the caller proceeds either way.
    pub async fn ensure<F, Fut>(&self, migrate: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, UpgradeError>>,
    {
        if !self.is_pending() {
            return;
        }

        let mut last_failure = self.last_failure.lock().await;
        if !self.is_pending() {
            return;
        }
        if let Some(at) = *last_failure
            && at.elapsed() < self.retry_interval
        {
            debug!("skipping database update, last attempt failed recently");
            return;
        }

        match migrate().await {
            Ok(true) => {
                self.mark_current();
                *last_failure = None;
                info!("database schema is up to date");
            }
            Ok(false) => {
                *last_failure = Some(Instant::now());
                error!("automatic database update did not complete");
            }
            Err(e) => {
                *last_failure = Some(Instant::now());
                error!(error = %e, "automatic database update failed");
            }
        }
    }
}
