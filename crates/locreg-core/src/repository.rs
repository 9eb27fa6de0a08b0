//! Registration repository abstraction.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{LocationsManager, Registration};

/// Storage contract implemented by every backend.
///
/// All backends persist the same aggregate and produce an identical external
/// JSON shape, so data is portable between the file and object-store
/// backends. The location argument is a raw string: validating it against
/// the three fixed names is part of the contract, not the caller's job.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Returns the current aggregate. Absent persisted state yields a fresh
    /// aggregate and never an error.
    async fn read(&self) -> Result<LocationsManager, StoreError>;

    /// Assigns the next id, appends a registration under `location`, and
    /// persists the updated aggregate. Fails with
    /// [`StoreError::UnknownLocation`] for a name outside the fixed three.
    async fn create_registration(
        &self,
        location: &str,
        contact_details: &str,
    ) -> Result<Registration, StoreError>;

    /// Removes the registration with `id` from `location` and persists the
    /// updated aggregate. Removing an absent id is a no-op, not an error.
    async fn delete_registration(&self, location: &str, id: i64) -> Result<(), StoreError>;
}
