//! `MongoDB` backend.
//!
//! One collection holds a singleton counter document plus one document per
//! location keyed by the location name, each carrying that location's
//! registrations array. Id assignment uses an atomic `$inc` on the counter
//! and registrations are appended/removed with `$push`/`$pull`, so each
//! write is a single server-side step and concurrent creates cannot hand out
//! the same id.

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::Database;
use mongodb::options::ReturnDocument;

use locreg_core::{LocationName, LocationsManager, Registration, RegistrationRepository, StoreError};

const COLLECTION: &str = "locations";
const COUNTER_ID: &str = "registrationCount";
const COUNTER_FIELD: &str = "registrationCount";

/// `MongoDB`-backed repository.
#[derive(Debug, Clone)]
pub struct MongoRegistrationRepository {
    collection: mongodb::Collection<Document>,
}

impl MongoRegistrationRepository {
    /// Creates a repository over the `locations` collection of `database`.
    #[must_use]
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }

    /// Fetches a document by `_id`, inserting and returning `default` when
    /// it does not exist yet.
    async fn fetch_or_init(&self, id: &str, default: Document) -> Result<Document, StoreError> {
        if let Some(found) = self
            .collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(StoreError::unavailable)?
        {
            return Ok(found);
        }
        self.collection
            .insert_one(&default)
            .await
            .map_err(StoreError::unavailable)?;
        Ok(default)
    }

    fn parse_registrations(document: &Document) -> Result<Vec<Registration>, StoreError> {
        let array = document
            .get_array("registrations")
            .map_err(StoreError::corrupt)?;
        array
            .iter()
            .map(|value| bson::from_bson(value.clone()).map_err(StoreError::corrupt))
            .collect()
    }
}

#[async_trait]
impl RegistrationRepository for MongoRegistrationRepository {
    async fn read(&self) -> Result<LocationsManager, StoreError> {
        let mut manager = LocationsManager::new();

        let counter = self
            .fetch_or_init(COUNTER_ID, doc! { "_id": COUNTER_ID, COUNTER_FIELD: 0_i64 })
            .await?;
        manager.registration_count = counter.get_i64(COUNTER_FIELD).map_err(StoreError::corrupt)?;

        for name in LocationName::ALL {
            let document = self
                .fetch_or_init(
                    name.as_str(),
                    doc! { "_id": name.as_str(), "registrations": [] },
                )
                .await?;
            manager.location_mut(name).registrations = Self::parse_registrations(&document)?;
        }

        manager.normalize_counter();
        Ok(manager)
    }

    async fn create_registration(
        &self,
        location: &str,
        contact_details: &str,
    ) -> Result<Registration, StoreError> {
        let name: LocationName = location.parse()?;

        // Atomically advance the counter; the upsert covers the very first
        // registration when no counter document exists yet.
        let counter = self
            .collection
            .find_one_and_update(
                doc! { "_id": COUNTER_ID },
                doc! { "$inc": { COUNTER_FIELD: 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(StoreError::unavailable)?
            .ok_or_else(|| StoreError::CorruptState("counter document missing after upsert".into()))?;
        let next = counter.get_i64(COUNTER_FIELD).map_err(StoreError::corrupt)?;
        let registration = Registration::new(name, contact_details, next - 1);

        let payload: Bson = bson::to_bson(&registration).map_err(StoreError::corrupt)?;
        self.collection
            .update_one(
                doc! { "_id": name.as_str() },
                doc! { "$push": { "registrations": payload } },
            )
            .upsert(true)
            .await
            .map_err(StoreError::unavailable)?;

        Ok(registration)
    }

    async fn delete_registration(&self, location: &str, id: i64) -> Result<(), StoreError> {
        let name: LocationName = location.parse()?;

        // Pulling an id that is not in the array matches nothing, which is
        // exactly the wanted no-op.
        let result = self
            .collection
            .update_one(
                doc! { "_id": name.as_str() },
                doc! { "$pull": { "registrations": { "id": id } } },
            )
            .await
            .map_err(StoreError::unavailable)?;
        if result.modified_count == 0 {
            tracing::debug!(location, id, "delete of absent registration, ignoring");
        }
        Ok(())
    }
}
