//! Shared handler state

use std::sync::Arc;

use cadence_core::Storage;

use super::error::ApiError;

/// Shared application state for the HTTP API
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
}

impl AppState {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Run a blocking storage call off the async runtime
    pub async fn with_storage<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Storage) -> cadence_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        let result = tokio::task::spawn_blocking(move || f(&storage)).await?;
        Ok(result?)
    }
}
