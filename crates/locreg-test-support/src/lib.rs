//! Shared test doubles for the location registration service.

mod repository;

pub use repository::{FailingRepository, InMemoryRepository};
