use serde::{Deserialize, Serialize};

use stockroom_core::{DomainResult, Entity, EntityKind, LocationId};

use crate::product::validate_name;

/// A named place stock can be sited at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }
}

/// Validated registration request for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    name: String,
}

impl NewLocation {
    pub fn new(name: &str) -> DomainResult<Self> {
        Ok(Self {
            name: validate_name(EntityKind::Location, name)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_location(self, id: LocationId) -> Location {
        Location { id, name: self.name }
    }
}
