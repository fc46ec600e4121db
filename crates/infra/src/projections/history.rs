//! Ledger entries with their references resolved to names.

use sqlx::SqliteConnection;

use stockroom_core::LocationId;
use stockroom_inventory::{LocationRef, MovementView};

use crate::entity_store;
use crate::error::InventoryResult;
use crate::ledger;

/// Every ledger entry, oldest first, with names resolved.
///
/// References to deleted records come back as dangling rather than failing.
pub async fn movement_history(conn: &mut SqliteConnection) -> InventoryResult<Vec<MovementView>> {
    let entries = ledger::list(conn).await?;
    let product_names = entity_store::product_names(conn).await?;
    let location_names = entity_store::location_names(conn).await?;

    let resolve = |id: Option<LocationId>| match id {
        None => LocationRef::Unallocated,
        Some(id) => match location_names.get(&id) {
            Some(name) => LocationRef::Known(name.clone()),
            None => LocationRef::Dangling(id),
        },
    };

    let views: Vec<MovementView> = entries
        .into_iter()
        .map(|entry| MovementView {
            product_name: product_names.get(&entry.product_id).cloned(),
            from: resolve(entry.from_location_id),
            to: resolve(entry.to_location_id),
            entry,
        })
        .collect();

    let dangling = views.iter().filter(|v| v.has_dangling_reference()).count();
    if dangling > 0 {
        tracing::debug!(dangling, "ledger contains references to deleted records");
    }
    Ok(views)
}
