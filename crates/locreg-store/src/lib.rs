//! Locreg Store — storage backends for the registration aggregate.
//!
//! Four interchangeable implementations of
//! [`locreg_core::RegistrationRepository`]: a local JSON file, an
//! S3-compatible object store, `PostgreSQL`, and `MongoDB`. The backend is
//! chosen once at startup from environment configuration via
//! [`config::StoreConfig`] and [`config::connect`].

pub mod config;
pub mod file;
pub mod mongo;
pub mod object;
pub mod postgres;

pub use config::{BackendKind, ConfigError, StoreConfig, connect};
pub use file::FileRepository;
pub use mongo::MongoRegistrationRepository;
pub use object::ObjectStoreRepository;
pub use postgres::PgRegistrationRepository;
