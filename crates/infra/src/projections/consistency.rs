//! Replay check: recompute unallocated quantities from the ledger and compare
//! them with the stored counters.

use sqlx::SqliteConnection;
use tracing::instrument;

use stockroom_inventory::AllocationDrift;

use super::warehouse::{WarehouseSummary, summarize_all};
use crate::entity_store;
use crate::error::InventoryResult;

/// Products whose stored `unallocated_quantity` differs from
/// `total − Σ net(product, current location)`.
///
/// Only locations that still exist are summed: stock at a deleted location
/// was credited back to unallocated when it was deleted.
#[instrument(skip(conn), err)]
pub async fn check_allocation(conn: &mut SqliteConnection) -> InventoryResult<Vec<AllocationDrift>> {
    let products = entity_store::list_products(conn).await?;
    let summary = WarehouseSummary::new(summarize_all(conn).await?);

    let drift: Vec<AllocationDrift> = products
        .into_iter()
        .filter_map(|p| {
            let recomputed = p.total_quantity - summary.sited_quantity(p.id);
            (recomputed != p.unallocated_quantity).then(|| AllocationDrift {
                product_id: p.id,
                name: p.name,
                stored_unallocated: p.unallocated_quantity,
                recomputed_unallocated: recomputed,
            })
        })
        .collect();

    for d in &drift {
        tracing::warn!(
            product_id = %d.product_id,
            stored = d.stored_unallocated,
            recomputed = d.recomputed_unallocated,
            "unallocated quantity drifted from ledger"
        );
    }
    Ok(drift)
}
