//! Read-side row types.

use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, ProductId};

use crate::movement::{LocationRef, MovementEntry};

/// Net quantity of one product at one location.
///
/// Names are `None` when the id no longer resolves (deleted record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub location_id: LocationId,
    pub location_name: Option<String>,
    pub net_quantity: i64,
}

/// Per-product stock counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub name: String,
    pub unallocated_quantity: i64,
    pub total_quantity: i64,
}

/// A product whose stored unallocated quantity disagrees with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDrift {
    pub product_id: ProductId,
    pub name: String,
    pub stored_unallocated: i64,
    pub recomputed_unallocated: i64,
}

impl AllocationDrift {
    pub fn difference(&self) -> i64 {
        self.stored_unallocated - self.recomputed_unallocated
    }
}

/// A ledger entry with its references resolved against the current store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementView {
    pub entry: MovementEntry,
    /// `None` when the product was deleted.
    pub product_name: Option<String>,
    pub from: LocationRef,
    pub to: LocationRef,
}

impl MovementView {
    pub fn has_dangling_reference(&self) -> bool {
        self.product_name.is_none() || self.from.is_dangling() || self.to.is_dangling()
    }
}
