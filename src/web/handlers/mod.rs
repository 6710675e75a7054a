//! API handlers for the file manager.

pub mod file;

pub use file::*;

use std::sync::Arc;

use crate::auth::CredentialCheck;
use crate::file::FileStorage;

/// Shared state for all handlers.
pub struct AppState {
    /// Storage rooted at the configured directory.
    pub storage: FileStorage,
    /// Check applied to the delete secret.
    pub credentials: Arc<dyn CredentialCheck>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(storage: FileStorage, credentials: Arc<dyn CredentialCheck>) -> Self {
        Self {
            storage,
            credentials,
        }
    }
}
