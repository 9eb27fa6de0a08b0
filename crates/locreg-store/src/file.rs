//! Local-file backend.
//!
//! Persists the whole aggregate as one JSON document at a configured path.
//! Every mutation is a read-modify-write of the entire file; a single
//! in-process mutex serializes those cycles so concurrent creates within one
//! process cannot assign duplicate ids. Cross-process writers still race
//! (last writer wins); callers needing that guarantee must hold a file lock
//! around each call.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use locreg_core::{LocationsManager, Registration, RegistrationRepository, StoreError};

/// JSON-file-backed repository.
///
/// Caches the parsed aggregate across calls for the process lifetime; the
/// cache is only replaced after a successful write, so a failed persist never
/// leaves the in-memory counter ahead of the file.
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
    state: Mutex<Option<LocationsManager>>,
}

impl FileRepository {
    /// Creates a repository persisting to `path`. The file is not touched
    /// until the first read or mutation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Loads the aggregate from disk. An absent file yields a fresh
    /// aggregate without writing it.
    async fn load(&self) -> Result<LocationsManager, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(LocationsManager::new());
            }
            Err(err) => return Err(StoreError::unavailable(err)),
        };
        let mut manager: LocationsManager = serde_json::from_str(&raw)
            .map_err(|err| StoreError::corrupt(format!("{}: {err}", self.path.display())))?;
        manager.normalize_counter();
        Ok(manager)
    }

    async fn persist(&self, manager: &LocationsManager) -> Result<(), StoreError> {
        let json = serde_json::to_string(manager).map_err(StoreError::unavailable)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(StoreError::unavailable)?;
        tracing::debug!(path = %self.path.display(), "persisted aggregate");
        Ok(())
    }

    /// Runs `mutate` against a working copy of the aggregate and commits the
    /// copy to both disk and cache only if the write succeeds.
    async fn read_modify_write<T>(
        &self,
        mutate: impl FnOnce(&mut LocationsManager) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let mut working = match state.as_ref() {
            Some(cached) => cached.clone(),
            None => self.load().await?,
        };
        let value = mutate(&mut working)?;
        self.persist(&working).await?;
        *state = Some(working);
        Ok(value)
    }
}

#[async_trait]
impl RegistrationRepository for FileRepository {
    async fn read(&self) -> Result<LocationsManager, StoreError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = Some(self.load().await?);
        }
        Ok(state.clone().unwrap_or_default())
    }

    async fn create_registration(
        &self,
        location: &str,
        contact_details: &str,
    ) -> Result<Registration, StoreError> {
        let name = location.parse()?;
        self.read_modify_write(|manager| Ok(manager.register(name, contact_details)))
            .await
    }

    async fn delete_registration(&self, location: &str, id: i64) -> Result<(), StoreError> {
        let name = location.parse()?;
        self.read_modify_write(|manager| {
            if !manager.remove_registration(name, id) {
                tracing::debug!(location = %name, id, "delete of absent registration, ignoring");
            }
            Ok(())
        })
        .await
    }
}
