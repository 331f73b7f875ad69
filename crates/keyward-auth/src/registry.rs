//! One handler per configuration.

use std::collections::HashMap;
use std::sync::Arc;

use keyward_config::AuthSettings;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::AuthError;
use crate::handler::DatabaseHandler;

/// Maps settings, compared by value, to their shared handler.
///
/// Handlers are created lazily by [`init`](Self::init) and live as long as
/// the registry.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<AuthSettings, Arc<DatabaseHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handler for `settings`, creating it on first call.
    ///
    /// Concurrent callers with equal settings all receive the same handler.
    /// Must be called inside a Tokio runtime.
    pub fn init(&self, settings: &AuthSettings) -> Result<Arc<DatabaseHandler>, AuthError> {
        let mut handlers = self.handlers.lock();
        if let Some(handler) = handlers.get(settings) {
            return Ok(Arc::clone(handler));
        }

        let handler = Arc::new(DatabaseHandler::new(settings.clone())?);
        handlers.insert(settings.clone(), Arc::clone(&handler));
        debug!(url = %settings.redacted_db_url(), handlers = handlers.len(), "handler registered");
        Ok(handler)
    }

    /// Return the handler for `settings` if [`init`](Self::init) created one.
    pub fn get(&self, settings: &AuthSettings) -> Option<Arc<DatabaseHandler>> {
        let handler = self.handlers.lock().get(settings).cloned();
        if handler.is_none() {
            error!(
                url = %settings.redacted_db_url(),
                "database handler requested before it was initialised"
            );
        }
        handler
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}
