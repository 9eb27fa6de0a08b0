//! Locreg Core — shared domain model and persistence contract.
//!
//! This crate defines the registration aggregate and the repository trait
//! that every storage backend implements. It contains no infrastructure code.

pub mod error;
pub mod model;
pub mod repository;

pub use error::StoreError;
pub use model::{Location, LocationName, LocationsManager, Registration};
pub use repository::RegistrationRepository;
