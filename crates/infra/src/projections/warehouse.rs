//! Warehouse Aggregator: net quantity per (product, location).

use std::collections::HashMap;

use sqlx::SqliteConnection;
use tracing::instrument;

use stockroom_core::{LocationId, ProductId, ids};
use stockroom_inventory::SummaryRow;

use crate::entity_store;
use crate::error::{InventoryResult, map_sqlx_error};

/// Inflows minus outflows per (product, location) over the whole ledger.
///
/// Pairs without any entry are absent; callers treat them as zero. Dangling
/// ids are included like any other.
pub async fn net_quantities(
    conn: &mut SqliteConnection,
) -> InventoryResult<HashMap<(ProductId, LocationId), i64>> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT product_id, location_id, SUM(delta) AS net
        FROM (
            SELECT product_id, to_location_id AS location_id, quantity AS delta
            FROM movements
            WHERE to_location_id IS NOT NULL
            UNION ALL
            SELECT product_id, from_location_id AS location_id, -quantity AS delta
            FROM movements
            WHERE from_location_id IS NOT NULL
        )
        GROUP BY product_id, location_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("net_quantities", e))?;

    Ok(rows
        .into_iter()
        .map(|(product, location, net)| ((ProductId::new(product), LocationId::new(location)), net))
        .collect())
}

/// One row per (product, location) pair, product-major in input order.
///
/// Zero-quantity pairs are included. Ids that no longer resolve get `None`
/// names instead of failing.
#[instrument(
    skip(conn, products, locations),
    fields(products = products.len(), locations = locations.len()),
    err
)]
pub async fn summarize(
    conn: &mut SqliteConnection,
    products: &[ProductId],
    locations: &[LocationId],
) -> InventoryResult<Vec<SummaryRow>> {
    let nets = net_quantities(conn).await?;
    let product_names = entity_store::product_names(conn).await?;
    let location_names = entity_store::location_names(conn).await?;

    let mut rows = Vec::with_capacity(products.len() * locations.len());
    for product_id in products {
        for location_id in locations {
            rows.push(SummaryRow {
                product_id: *product_id,
                product_name: product_names.get(product_id).cloned(),
                location_id: *location_id,
                location_name: location_names.get(location_id).cloned(),
                net_quantity: nets.get(&(*product_id, *location_id)).copied().unwrap_or(0),
            });
        }
    }
    Ok(rows)
}

/// [`summarize`] over every current product and location, in id order.
pub async fn summarize_all(conn: &mut SqliteConnection) -> InventoryResult<Vec<SummaryRow>> {
    let products = ids(&entity_store::list_products(conn).await?);
    let locations = ids(&entity_store::list_locations(conn).await?);
    summarize(conn, &products, &locations).await
}

/// Lookup view over summary rows.
#[derive(Debug, Clone, Default)]
pub struct WarehouseSummary {
    rows: Vec<SummaryRow>,
}

impl WarehouseSummary {
    pub fn new(rows: Vec<SummaryRow>) -> Self {
        Self { rows }
    }

    /// Sum of net quantities of `product` over the summarized locations.
    pub fn sited_quantity(&self, product: ProductId) -> i64 {
        self.rows
            .iter()
            .filter(|r| r.product_id == product)
            .map(|r| r.net_quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(p: i64, l: i64, net: i64) -> SummaryRow {
        SummaryRow {
            product_id: ProductId::new(p),
            product_name: Some(format!("p{p}")),
            location_id: LocationId::new(l),
            location_name: Some(format!("l{l}")),
            net_quantity: net,
        }
    }

    #[test]
    fn sited_quantity_sums_one_product_only() {
        let summary = WarehouseSummary::new(vec![row(1, 1, 20), row(1, 2, 10), row(2, 1, -4)]);
        assert_eq!(summary.sited_quantity(ProductId::new(1)), 30);
        assert_eq!(summary.sited_quantity(ProductId::new(2)), -4);
        assert_eq!(summary.sited_quantity(ProductId::new(3)), 0);
    }
}
