//! Movement Ledger: append-only log of stock movements.
//!
//! Entries are written once and never updated or deleted. An append checks
//! every reference, assigns the timestamp and runs the allocation maintainer,
//! all on the caller's connection.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

use stockroom_core::{LocationId, MovementId, ProductId};
use stockroom_inventory::{MovementEntry, MovementRequest};

use crate::allocation;
use crate::entity_store;
use crate::error::{InventoryResult, map_sqlx_error};

#[derive(Debug, FromRow)]
struct MovementRow {
    id: i64,
    product_id: i64,
    from_location_id: Option<i64>,
    to_location_id: Option<i64>,
    quantity: i64,
    recorded_at: DateTime<Utc>,
}

impl From<MovementRow> for MovementEntry {
    fn from(row: MovementRow) -> Self {
        MovementEntry {
            id: MovementId::new(row.id),
            product_id: ProductId::new(row.product_id),
            from_location_id: row.from_location_id.map(LocationId::new),
            to_location_id: row.to_location_id.map(LocationId::new),
            quantity: row.quantity,
            recorded_at: row.recorded_at,
        }
    }
}

const SELECT_MOVEMENT: &str =
    "SELECT id, product_id, from_location_id, to_location_id, quantity, recorded_at FROM movements";

/// Append one entry and update the product's unallocated quantity.
///
/// Nothing is written unless the product and every named location exist and
/// the product's unallocated counter can absorb the delta.
#[instrument(
    skip(conn, request),
    fields(product_id = %request.product_id, kind = request.kind.label()),
    err
)]
pub async fn append(conn: &mut SqliteConnection, request: &MovementRequest) -> InventoryResult<MovementEntry> {
    let mut product = entity_store::product_by_id(conn, request.product_id).await?;
    product.apply_allocation_delta(request.allocation_delta())?;
    for location in [request.kind.from_location(), request.kind.to_location()]
        .into_iter()
        .flatten()
    {
        entity_store::location_by_id(conn, location).await?;
    }

    let recorded_at = next_timestamp(conn).await?;

    let result = sqlx::query(
        "INSERT INTO movements (product_id, from_location_id, to_location_id, quantity, recorded_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(request.product_id.get())
    .bind(request.kind.from_location().map(LocationId::get))
    .bind(request.kind.to_location().map(LocationId::get))
    .bind(request.quantity.get())
    .bind(recorded_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("append_movement", e))?;

    let entry = MovementEntry::from_request(
        MovementId::new(result.last_insert_rowid()),
        request,
        recorded_at,
    );

    allocation::apply(conn, request).await?;

    Ok(entry)
}

/// `now`, unless the clock is behind the latest entry; never earlier than
/// anything already in the ledger.
async fn next_timestamp(conn: &mut SqliteConnection) -> InventoryResult<DateTime<Utc>> {
    let latest: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT recorded_at FROM movements ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("latest_timestamp", e))?;

    let now = Utc::now();
    Ok(match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    })
}

/// Every entry in append order.
pub async fn list(conn: &mut SqliteConnection) -> InventoryResult<Vec<MovementEntry>> {
    let rows: Vec<MovementRow> = sqlx::query_as(&format!("{SELECT_MOVEMENT} ORDER BY id"))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;
    Ok(rows.into_iter().map(MovementEntry::from).collect())
}

/// Number of entries naming `location` at either end.
pub async fn count_location_references(
    conn: &mut SqliteConnection,
    location: LocationId,
) -> InventoryResult<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM movements WHERE from_location_id = ?1 OR to_location_id = ?1",
    )
    .bind(location.get())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("count_location_references", e))
}

/// Number of entries for `product`.
pub async fn count_product_references(
    conn: &mut SqliteConnection,
    product: ProductId,
) -> InventoryResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM movements WHERE product_id = ?1")
        .bind(product.get())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("count_product_references", e))
}
