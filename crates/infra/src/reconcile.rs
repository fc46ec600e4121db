//! Reconciliation Engine: structural edits made after ledger entries already
//! reference the record being changed.

use sqlx::SqliteConnection;
use tracing::instrument;

use stockroom_core::{DomainError, EntityKind, LocationId, ProductId};
use stockroom_inventory::{DisplacedStock, LocationFlow, Product};

use crate::config::DeletionPolicy;
use crate::entity_store;
use crate::error::{InventoryResult, map_sqlx_error};
use crate::ledger;

/// Per-product inbound/outbound totals at `location`.
pub async fn location_flows(
    conn: &mut SqliteConnection,
    location: LocationId,
) -> InventoryResult<Vec<LocationFlow>> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT product_id,
               COALESCE(SUM(CASE WHEN to_location_id = ?1 THEN quantity ELSE 0 END), 0) AS inbound,
               COALESCE(SUM(CASE WHEN from_location_id = ?1 THEN quantity ELSE 0 END), 0) AS outbound
        FROM movements
        WHERE to_location_id = ?1 OR from_location_id = ?1
        GROUP BY product_id
        ORDER BY product_id
        "#,
    )
    .bind(location.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("location_flows", e))?;

    Ok(rows
        .into_iter()
        .map(|(product_id, inbound, outbound)| LocationFlow {
            product_id: ProductId::new(product_id),
            inbound,
            outbound,
        })
        .collect())
}

/// Delete a location, crediting its displaced stock back to unallocated.
///
/// Ledger entries naming the location are kept as history. Credits aimed at
/// products that were themselves deleted are skipped.
#[instrument(skip_all, fields(location_id = %id, policy = %policy), err)]
pub async fn delete_location(
    conn: &mut SqliteConnection,
    id: LocationId,
    policy: DeletionPolicy,
) -> InventoryResult<Vec<DisplacedStock>> {
    entity_store::location_by_id(conn, id).await?;

    if policy == DeletionPolicy::RejectReferenced {
        let entries = ledger::count_location_references(conn, id).await?;
        if entries > 0 {
            return Err(DomainError::Referenced {
                kind: EntityKind::Location,
                key: id.to_string(),
                entries,
            }
            .into());
        }
    }

    let plan = DisplacedStock::plan(location_flows(conn, id).await?);
    let mut credited = Vec::with_capacity(plan.len());
    for item in plan {
        match entity_store::projected_unallocated(conn, item.product_id, item.displaced).await? {
            Some(_) => credited.push(item),
            None => tracing::warn!(
                product_id = %item.product_id,
                displaced = item.displaced,
                "displaced stock belongs to a deleted product; nothing to credit"
            ),
        }
    }
    for item in &credited {
        entity_store::adjust_unallocated(conn, item.product_id, item.displaced).await?;
    }

    entity_store::delete_location_row(conn, id).await?;

    tracing::info!(
        location_id = %id,
        credited_products = credited.len(),
        "location deleted and displaced stock returned to unallocated"
    );
    Ok(credited)
}

/// Delete a product outright. No quantities move.
#[instrument(skip_all, fields(product_id = %id, policy = %policy), err)]
pub async fn delete_product(
    conn: &mut SqliteConnection,
    id: ProductId,
    policy: DeletionPolicy,
) -> InventoryResult<()> {
    if policy == DeletionPolicy::RejectReferenced {
        entity_store::product_by_id(conn, id).await?;
        let entries = ledger::count_product_references(conn, id).await?;
        if entries > 0 {
            return Err(DomainError::Referenced {
                kind: EntityKind::Product,
                key: id.to_string(),
                entries,
            }
            .into());
        }
    }

    entity_store::delete_product_row(conn, id).await?;
    tracing::info!(product_id = %id, "product deleted");
    Ok(())
}

/// Set a product's total quantity and move unallocated by the same delta.
///
/// Read and write happen on the same connection; the write is guarded on the
/// total that was read.
#[instrument(skip(conn), fields(product_id = %id), err)]
pub async fn edit_product_quantity(
    conn: &mut SqliteConnection,
    id: ProductId,
    new_total: i64,
) -> InventoryResult<Product> {
    if new_total < 0 {
        return Err(DomainError::InvalidQuantity(new_total).into());
    }
    let mut product = entity_store::product_by_id(conn, id).await?;
    let old_total = product.total_quantity;
    let delta = product.set_total_quantity(new_total)?;
    if delta == 0 {
        return Ok(product);
    }

    entity_store::write_quantities(conn, &product, old_total).await?;
    tracing::info!(product_id = %id, old_total, new_total, delta, "total quantity edited");
    entity_store::product_by_id(conn, id).await
}
