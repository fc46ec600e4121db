//! Allocation Invariant Maintainer.
//!
//! Applies the unallocated-quantity delta implied by one accepted movement.
//! Runs on the append's connection, so it commits or rolls back with the
//! ledger entry.

use sqlx::SqliteConnection;
use tracing::instrument;

use stockroom_core::DomainError;
use stockroom_inventory::{MovementKind, MovementRequest};

use crate::entity_store;
use crate::error::InventoryResult;

/// Apply the allocation delta for `request`; returns the delta applied.
#[instrument(
    skip(conn, request),
    fields(
        product_id = %request.product_id,
        kind = request.kind.label(),
        quantity = request.quantity.get()
    ),
    err
)]
pub async fn apply(conn: &mut SqliteConnection, request: &MovementRequest) -> InventoryResult<i64> {
    if let MovementKind::Transfer { .. } = request.kind {
        return Ok(0);
    }
    let delta = request.allocation_delta();

    let updated = entity_store::adjust_unallocated(conn, request.product_id, delta).await?;
    if updated == 0 {
        return Err(DomainError::unknown_product(request.product_id).into());
    }
    Ok(delta)
}
