//! Object-store backend.
//!
//! The same single-document layout as the file backend, stored at a key in
//! an S3-compatible bucket (MinIO in practice). Unlike the file backend
//! there is no cross-call cache: other processes may replace the object, so
//! every call fetches the current document. Get/put failures surface as
//! `StorageUnavailable` and are never retried here; retry policy belongs to
//! the caller.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use tokio::sync::Mutex;

use locreg_core::{LocationsManager, Registration, RegistrationRepository, StoreError};

/// S3-compatible object-store repository.
#[derive(Debug)]
pub struct ObjectStoreRepository {
    client: Client,
    bucket: String,
    key: String,
    timeout: Duration,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl ObjectStoreRepository {
    /// Creates a repository for the document at `key` inside `bucket`.
    #[must_use]
    pub fn new(client: Client, bucket: String, key: String, timeout: Duration) -> Self {
        Self {
            client,
            bucket,
            key,
            timeout,
            write_lock: Mutex::new(()),
        }
    }

    /// Applies the per-call deadline. An unreachable endpoint must not hang
    /// the request; expiry surfaces as `StorageUnavailable`.
    async fn deadline<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| {
                StoreError::StorageUnavailable(format!(
                    "{operation} of {}/{} timed out after {:?}",
                    self.bucket, self.key, self.timeout
                ))
            })?
    }

    /// Fetches and parses the aggregate document; a missing object yields a
    /// fresh aggregate without writing it.
    async fn load(&self) -> Result<LocationsManager, StoreError> {
        let exists = self
            .deadline("head", async {
                match self
                    .client
                    .head_object()
                    .bucket(&self.bucket)
                    .key(&self.key)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(err)
                        if err
                            .as_service_error()
                            .is_some_and(HeadObjectError::is_not_found) =>
                    {
                        Ok(false)
                    }
                    Err(err) => Err(StoreError::unavailable(err)),
                }
            })
            .await?;
        if !exists {
            return Ok(LocationsManager::new());
        }

        let bytes = self
            .deadline("get", async {
                let object = self
                    .client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(&self.key)
                    .send()
                    .await
                    .map_err(StoreError::unavailable)?;
                Ok(object
                    .body
                    .collect()
                    .await
                    .map_err(StoreError::unavailable)?
                    .into_bytes())
            })
            .await?;

        let mut manager: LocationsManager = serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::corrupt(format!("{}/{}: {err}", self.bucket, self.key)))?;
        manager.normalize_counter();
        Ok(manager)
    }

    async fn persist(&self, manager: &LocationsManager) -> Result<(), StoreError> {
        let json = serde_json::to_vec(manager).map_err(StoreError::unavailable)?;
        self.deadline("put", async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&self.key)
                .content_type("application/json")
                .body(ByteStream::from(json))
                .send()
                .await
                .map_err(StoreError::unavailable)?;
            Ok(())
        })
        .await?;
        tracing::debug!(bucket = %self.bucket, key = %self.key, "persisted aggregate");
        Ok(())
    }
}

#[async_trait]
impl RegistrationRepository for ObjectStoreRepository {
    async fn read(&self) -> Result<LocationsManager, StoreError> {
        self.load().await
    }

    async fn create_registration(
        &self,
        location: &str,
        contact_details: &str,
    ) -> Result<Registration, StoreError> {
        let name = location.parse()?;
        let _guard = self.write_lock.lock().await;
        let mut manager = self.load().await?;
        let registration = manager.register(name, contact_details);
        self.persist(&manager).await?;
        Ok(registration)
    }

    async fn delete_registration(&self, location: &str, id: i64) -> Result<(), StoreError> {
        let name = location.parse()?;
        let _guard = self.write_lock.lock().await;
        let mut manager = self.load().await?;
        if manager.remove_registration(name, id) {
            self.persist(&manager).await?;
        }
        Ok(())
    }
}
