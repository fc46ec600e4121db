use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    DomainError, DomainResult, Entity, LocationId, MovementId, ProductId, ValueObject,
};

/// A strictly positive movement quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(raw: i64) -> DomainResult<Self> {
        if raw <= 0 {
            return Err(DomainError::InvalidQuantity(raw));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl ValueObject for Quantity {}

/// Classification of a ledger entry by which ends are set.
///
/// Only entries that create or remove a location assignment change a
/// product's unallocated quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementKind {
    /// Unallocated stock is sited at `to`.
    InitialPlacement { to: LocationId },
    /// Stock at `from` goes back to unallocated.
    Deallocation { from: LocationId },
    /// Stock moves between two sited locations.
    Transfer { from: LocationId, to: LocationId },
}

impl MovementKind {
    pub fn classify(from: Option<LocationId>, to: Option<LocationId>) -> DomainResult<Self> {
        match (from, to) {
            (None, Some(to)) => Ok(Self::InitialPlacement { to }),
            (Some(from), None) => Ok(Self::Deallocation { from }),
            (Some(from), Some(to)) => Ok(Self::Transfer { from, to }),
            (None, None) => Err(DomainError::invalid_movement(
                "a movement needs a source or a destination location",
            )),
        }
    }

    /// Signed change to the product's unallocated quantity.
    pub fn allocation_delta(self, quantity: Quantity) -> i64 {
        match self {
            Self::InitialPlacement { .. } => -quantity.get(),
            Self::Deallocation { .. } => quantity.get(),
            Self::Transfer { .. } => 0,
        }
    }

    pub fn from_location(self) -> Option<LocationId> {
        match self {
            Self::InitialPlacement { .. } => None,
            Self::Deallocation { from } | Self::Transfer { from, .. } => Some(from),
        }
    }

    pub fn to_location(self) -> Option<LocationId> {
        match self {
            Self::Deallocation { .. } => None,
            Self::InitialPlacement { to } | Self::Transfer { to, .. } => Some(to),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InitialPlacement { .. } => "initial_placement",
            Self::Deallocation { .. } => "deallocation",
            Self::Transfer { .. } => "transfer",
        }
    }
}

impl ValueObject for MovementKind {}

/// A validated, id-based request to append one ledger entry.
///
/// Reference resolution (does the product/location exist?) is the store's
/// job; everything checkable without IO is checked here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: Quantity,
}

impl MovementRequest {
    pub fn new(
        product_id: ProductId,
        from: Option<LocationId>,
        to: Option<LocationId>,
        quantity: i64,
    ) -> DomainResult<Self> {
        let quantity = Quantity::new(quantity)?;
        let kind = MovementKind::classify(from, to)?;
        Ok(Self {
            product_id,
            kind,
            quantity,
        })
    }

    pub fn allocation_delta(&self) -> i64 {
        self.kind.allocation_delta(self.quantity)
    }
}

/// Name-based movement request, as submitted by an operator.
///
/// Blank location names mean "no location" (unallocated stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedMovement {
    pub product: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub quantity: i64,
}

impl NamedMovement {
    pub fn new(
        product: impl Into<String>,
        from: Option<&str>,
        to: Option<&str>,
        quantity: i64,
    ) -> Self {
        Self {
            product: product.into(),
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            quantity,
        }
    }

    pub fn from_name(&self) -> Option<&str> {
        non_blank(self.from.as_deref())
    }

    pub fn to_name(&self) -> Option<&str> {
        non_blank(self.to.as_deref())
    }
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

/// An appended, immutable ledger entry.
///
/// Location ids may refer to locations deleted after the entry was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementEntry {
    pub id: MovementId,
    pub product_id: ProductId,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub quantity: i64,
    pub recorded_at: DateTime<Utc>,
}

impl MovementEntry {
    /// Build the entry for an accepted request once the store assigned an id
    /// and a timestamp.
    pub fn from_request(id: MovementId, request: &MovementRequest, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id: request.product_id,
            from_location_id: request.kind.from_location(),
            to_location_id: request.kind.to_location(),
            quantity: request.quantity.get(),
            recorded_at,
        }
    }

    /// Signed quantity this entry contributes to `location`'s net stock.
    pub fn net_contribution(&self, location: LocationId) -> i64 {
        let mut net = 0;
        if self.to_location_id == Some(location) {
            net += self.quantity;
        }
        if self.from_location_id == Some(location) {
            net -= self.quantity;
        }
        net
    }
}

impl Entity for MovementEntry {
    type Id = MovementId;

    fn id(&self) -> MovementId {
        self.id
    }
}

/// A ledger reference resolved against the current entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LocationRef {
    /// The end was null: stock came from or went to the unallocated pool.
    Unallocated,
    /// The location still exists.
    Known(String),
    /// The location was deleted after the entry was written.
    Dangling(LocationId),
}

impl LocationRef {
    pub fn is_dangling(&self) -> bool {
        matches!(self, LocationRef::Dangling(_))
    }
}
