//! Shared application state.

use std::sync::Arc;

use locreg_core::RegistrationRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend selected at startup.
    pub repository: Arc<dyn RegistrationRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(repository: Arc<dyn RegistrationRepository>) -> Self {
        Self { repository }
    }
}
