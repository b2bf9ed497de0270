use std::sync::Arc;
use std::time::Instant;

use actix_web::web;

use super::errors::TodoApiError;
use crate::errors::StoreError;
use crate::store::TodoStore;

/// Shared by every worker. Holds no per-request state.
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub started_at: Instant,
    /// Send internal error detail to clients (development only)
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>, expose_errors: bool) -> Self {
        Self {
            store,
            started_at: Instant::now(),
            expose_errors,
        }
    }

    /// Runs a blocking store call on actix's thread pool.
    pub async fn with_store<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&dyn TodoStore) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);

        web::block(move || f(store.as_ref()))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    pub fn api_error(&self, error: StoreError, context: &'static str) -> TodoApiError {
        TodoApiError::from_store(error, context, self.expose_errors)
    }
}
