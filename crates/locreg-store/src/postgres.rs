//! `PostgreSQL` backend.
//!
//! The only backend with a normalized schema: a pre-seeded `locations` table
//! and a `registrations` table with a foreign key, instead of one aggregate
//! document. Id generation is delegated to the `registrations` id sequence,
//! so the aggregate's counter is derived from `MAX(id)` on read rather than
//! stored.

use async_trait::async_trait;
use sqlx::PgPool;

use locreg_core::{LocationName, LocationsManager, Registration, RegistrationRepository, StoreError};

/// `PostgreSQL`-backed repository.
#[derive(Debug, Clone)]
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    /// Creates a repository over an existing connection pool. The schema
    /// comes from the workspace `migrations/` directory.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        // The three location rows are seeded by migration; their absence
        // means the schema is broken, not that the caller asked for a
        // missing row.
        sqlx::Error::RowNotFound => StoreError::CorruptState("seeded location row missing".into()),
        other => StoreError::unavailable(other),
    }
}

#[async_trait]
impl RegistrationRepository for PgRegistrationRepository {
    async fn read(&self) -> Result<LocationsManager, StoreError> {
        let mut manager = LocationsManager::new();

        for name in LocationName::ALL {
            let location_id: i64 = sqlx::query_scalar("SELECT id FROM locations WHERE name = $1")
                .bind(name.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx)?;

            let rows: Vec<(i64, String)> = sqlx::query_as(
                "SELECT id, contact_details FROM registrations \
                 WHERE location_id = $1 ORDER BY id",
            )
            .bind(location_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

            let registrations = &mut manager.location_mut(name).registrations;
            for (id, contact_details) in rows {
                registrations.push(Registration::new(name, &contact_details, id));
            }
        }

        let max_id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM registrations")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        manager.registration_count = max_id.map_or(0, |id| id + 1);

        Ok(manager)
    }

    async fn create_registration(
        &self,
        location: &str,
        contact_details: &str,
    ) -> Result<Registration, StoreError> {
        let name: LocationName = location.parse()?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Row-lock the location so concurrent creates against the same
        // location serialize inside the database.
        let location_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM locations WHERE name = $1 FOR UPDATE")
                .bind(name.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        let location_id =
            location_id.ok_or_else(|| StoreError::UnknownLocation(location.to_string()))?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO registrations (location_id, contact_details) \
             VALUES ($1, $2) RETURNING id",
        )
        .bind(location_id)
        .bind(contact_details)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;

        Ok(Registration::new(name, contact_details, id))
    }

    async fn delete_registration(&self, location: &str, id: i64) -> Result<(), StoreError> {
        // The location is validated but not part of the WHERE clause:
        // registration ids are globally unique, and the original wire
        // behavior deletes by id alone. Kept as-is; see DESIGN.md.
        let _: LocationName = location.parse()?;

        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            tracing::debug!(location, id, "delete of absent registration, ignoring");
        }
        Ok(())
    }
}
