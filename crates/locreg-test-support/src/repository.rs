//! Mock `RegistrationRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use locreg_core::{LocationsManager, Registration, RegistrationRepository, StoreError};

/// A repository holding the aggregate in memory, with the same id-assignment
/// and no-op-delete semantics as the real backends. Useful for HTTP-layer
/// tests that should not touch a filesystem or a database.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<LocationsManager>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing aggregate instead of a fresh one.
    #[must_use]
    pub fn with_state(state: LocationsManager) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryRepository {
    async fn read(&self) -> Result<LocationsManager, StoreError> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn create_registration(
        &self,
        location: &str,
        contact_details: &str,
    ) -> Result<Registration, StoreError> {
        let name = location.parse()?;
        Ok(self.state.lock().unwrap().register(name, contact_details))
    }

    async fn delete_registration(&self, location: &str, id: i64) -> Result<(), StoreError> {
        let name = location.parse()?;
        self.state.lock().unwrap().remove_registration(name, id);
        Ok(())
    }
}

/// A repository whose every method fails with `StorageUnavailable`. Useful
/// for testing 500 mapping at the HTTP boundary.
#[derive(Debug, Default)]
pub struct FailingRepository;

impl FailingRepository {
    fn unavailable() -> StoreError {
        StoreError::StorageUnavailable("connection refused".into())
    }
}

#[async_trait]
impl RegistrationRepository for FailingRepository {
    async fn read(&self) -> Result<LocationsManager, StoreError> {
        Err(Self::unavailable())
    }

    async fn create_registration(
        &self,
        _location: &str,
        _contact_details: &str,
    ) -> Result<Registration, StoreError> {
        Err(Self::unavailable())
    }

    async fn delete_registration(&self, _location: &str, _id: i64) -> Result<(), StoreError> {
        Err(Self::unavailable())
    }
}
