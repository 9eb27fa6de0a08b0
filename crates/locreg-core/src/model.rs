//! The registration aggregate.
//!
//! Three fixed locations, each holding an ordered list of registrations, plus
//! a monotonic id counter. `LocationsManager` is the unit of persistence for
//! backends that store the whole aggregate together; the relational backend
//! derives it from normalized rows on read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One of the three fixed locations. The set never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationName {
    Bergen,
    Trondheim,
    Oslo,
}

impl LocationName {
    /// All three locations, in the order they appear in the persisted
    /// aggregate document.
    pub const ALL: [Self; 3] = [Self::Bergen, Self::Trondheim, Self::Oslo];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bergen => "bergen",
            Self::Trondheim => "trondheim",
            Self::Oslo => "oslo",
        }
    }

    /// Fixed (latitude, longitude) for the location.
    #[must_use]
    pub fn coordinates(self) -> (f64, f64) {
        match self {
            Self::Bergen => (60.391_183_8, 5.325_559_9),
            Self::Trondheim => (63.430_442_7, 10.395_295_6),
            Self::Oslo => (59.911_219_7, 10.733_027_5),
        }
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bergen" => Ok(Self::Bergen),
            "trondheim" => Ok(Self::Trondheim),
            "oslo" => Ok(Self::Oslo),
            other => Err(StoreError::UnknownLocation(other.to_string())),
        }
    }
}

/// A contact record tied to one location.
///
/// Created only through a repository's create operation, which assigns the
/// id; the id is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub location_name: Option<String>,
    pub contact_details: String,
    #[serde(default)]
    pub id: Option<i64>,
}

impl Registration {
    /// Builds a registration with an assigned id for a known location.
    #[must_use]
    pub fn new(location: LocationName, contact_details: &str, id: i64) -> Self {
        Self {
            location_name: Some(location.as_str().to_string()),
            contact_details: contact_details.to_string(),
            id: Some(id),
        }
    }
}

/// A fixed named site with coordinates and its registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub registrations: Vec<Registration>,
}

impl Location {
    /// An empty location with the fixed metadata for `name`.
    #[must_use]
    pub fn empty(name: LocationName) -> Self {
        let (latitude, longitude) = name.coordinates();
        Self {
            location_name: name.as_str().to_string(),
            latitude,
            longitude,
            registrations: Vec::new(),
        }
    }
}

/// The aggregate root: the whole persisted state of the service.
///
/// `registration_count` is the next id to assign. Invariant: it is always at
/// least the maximum assigned id plus one, and ids are never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsManager {
    pub registration_count: i64,
    pub bergen: Location,
    pub trondheim: Location,
    pub oslo: Location,
}

impl LocationsManager {
    /// A fresh aggregate: counter 0, empty registration lists, fixed
    /// location metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registration_count: 0,
            bergen: Location::empty(LocationName::Bergen),
            trondheim: Location::empty(LocationName::Trondheim),
            oslo: Location::empty(LocationName::Oslo),
        }
    }

    #[must_use]
    pub fn location(&self, name: LocationName) -> &Location {
        match name {
            LocationName::Bergen => &self.bergen,
            LocationName::Trondheim => &self.trondheim,
            LocationName::Oslo => &self.oslo,
        }
    }

    pub fn location_mut(&mut self, name: LocationName) -> &mut Location {
        match name {
            LocationName::Bergen => &mut self.bergen,
            LocationName::Trondheim => &mut self.trondheim,
            LocationName::Oslo => &mut self.oslo,
        }
    }

    /// Assigns the next id, appends the new registration under `location`,
    /// and returns it. The caller is responsible for persisting the mutated
    /// aggregate.
    pub fn register(&mut self, location: LocationName, contact_details: &str) -> Registration {
        let id = self.registration_count;
        self.registration_count += 1;
        let registration = Registration::new(location, contact_details, id);
        self.location_mut(location)
            .registrations
            .push(registration.clone());
        registration
    }

    /// Removes the registration with `id` from `location`. Returns whether
    /// anything was removed; an absent id is a benign no-op.
    pub fn remove_registration(&mut self, location: LocationName, id: i64) -> bool {
        let registrations = &mut self.location_mut(location).registrations;
        let before = registrations.len();
        registrations.retain(|r| r.id != Some(id));
        registrations.len() != before
    }

    /// Raises `registration_count` to one past the maximum assigned id.
    ///
    /// Persisted documents written by older processes can undercount; the
    /// counter is re-derived on every load so a stale value never causes an
    /// id to be reused.
    pub fn normalize_counter(&mut self) {
        let max_id = LocationName::ALL
            .iter()
            .flat_map(|name| &self.location(*name).registrations)
            .filter_map(|r| r.id)
            .max();
        if let Some(max_id) = max_id {
            self.registration_count = self.registration_count.max(max_id + 1);
        }
    }
}

impl Default for LocationsManager {
    fn default() -> Self {
        Self::new()
    }
}
