//! Reconciliation math for deleting a location that still holds stock.

use serde::{Deserialize, Serialize};

use stockroom_core::ProductId;

/// Ledger totals for one product at the location being deleted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFlow {
    pub product_id: ProductId,
    /// Sum of quantities moved into the location.
    pub inbound: i64,
    /// Sum of quantities moved out of the location.
    pub outbound: i64,
}

impl LocationFlow {
    pub fn displaced(&self) -> i64 {
        self.inbound - self.outbound
    }
}

/// Stock stranded at a deleted location, credited back to the product's
/// unallocated quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplacedStock {
    pub product_id: ProductId,
    /// May be negative when the location's own history is inconsistent.
    pub displaced: i64,
}

impl DisplacedStock {
    /// One credit per product with a nonzero net at the location.
    ///
    /// Products appearing in several flows are merged, and the output is
    /// ordered by product id.
    pub fn plan(flows: impl IntoIterator<Item = LocationFlow>) -> Vec<DisplacedStock> {
        let mut merged = std::collections::BTreeMap::<ProductId, i64>::new();
        for flow in flows {
            *merged.entry(flow.product_id).or_default() += flow.displaced();
        }
        merged
            .into_iter()
            .filter(|(_, displaced)| *displaced != 0)
            .map(|(product_id, displaced)| DisplacedStock {
                product_id,
                displaced,
            })
            .collect()
    }
}
