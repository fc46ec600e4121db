//! `InventoryEngine`: the operation surface handed to callers.
//!
//! Every method takes the caller's connection. To get all-or-nothing
//! behaviour, pass the connection of a transaction from
//! [`InventoryStore::begin`](crate::db::InventoryStore::begin) and commit it
//! once the call succeeds:
//!
//! ```ignore
//! let mut tx = store.begin().await?;
//! engine.record_movement(&mut tx, &NamedMovement::new("Widget", None, Some("A"), 30)).await?;
//! stockroom_infra::db::commit(tx).await?;
//! ```

use sqlx::SqliteConnection;
use tracing::instrument;

use stockroom_core::{DomainError, LocationId, ProductId};
use stockroom_inventory::{
    AllocationDrift, DeleteRequest, DisplacedStock, EditRequest, Location, LocationEdit,
    MovementEntry, MovementRequest, MovementView, NamedMovement, NewLocation, NewProduct, Product,
    ProductEdit, Quantity, StockLevel, SummaryRow,
};

use crate::config::{DeletionPolicy, InventoryConfig};
use crate::entity_store;
use crate::error::InventoryResult;
use crate::ledger;
use crate::projections;
use crate::reconcile;

/// Result of a tagged edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edited {
    Product(Product),
    Location(Location),
}

/// Result of a tagged delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    Product(ProductId),
    Location {
        id: LocationId,
        credited: Vec<DisplacedStock>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryEngine {
    deletion_policy: DeletionPolicy,
}

impl InventoryEngine {
    pub fn new(deletion_policy: DeletionPolicy) -> Self {
        Self { deletion_policy }
    }

    pub fn from_config(config: &InventoryConfig) -> Self {
        Self::new(config.deletion_policy)
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        self.deletion_policy
    }

    // ---- products -------------------------------------------------------

    #[instrument(skip(self, conn), err)]
    pub async fn create_product(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        total_quantity: i64,
    ) -> InventoryResult<Product> {
        let new = NewProduct::new(name, total_quantity)?;
        let product = entity_store::insert_product(conn, new).await?;
        tracing::info!(product_id = %product.id, name = %product.name, total_quantity, "product created");
        Ok(product)
    }

    #[instrument(skip(self, conn), err)]
    pub async fn rename_product(
        &self,
        conn: &mut SqliteConnection,
        id: ProductId,
        name: &str,
    ) -> InventoryResult<Product> {
        entity_store::rename_product(conn, id, name).await
    }

    pub async fn edit_product_quantity(
        &self,
        conn: &mut SqliteConnection,
        id: ProductId,
        new_total: i64,
    ) -> InventoryResult<Product> {
        reconcile::edit_product_quantity(conn, id, new_total).await
    }

    /// Apply the present parts of `edit`: the rename first, then the quantity.
    pub async fn edit_product(
        &self,
        conn: &mut SqliteConnection,
        id: ProductId,
        edit: &ProductEdit,
    ) -> InventoryResult<Product> {
        if let Some(total) = edit.total_quantity {
            if total < 0 {
                return Err(DomainError::InvalidQuantity(total).into());
            }
        }

        let mut product = match edit.new_name() {
            Some(name) => entity_store::rename_product(conn, id, name).await?,
            None => entity_store::product_by_id(conn, id).await?,
        };
        if let Some(total) = edit.total_quantity {
            product = reconcile::edit_product_quantity(conn, id, total).await?;
        }
        Ok(product)
    }

    pub async fn delete_product(&self, conn: &mut SqliteConnection, id: ProductId) -> InventoryResult<()> {
        reconcile::delete_product(conn, id, self.deletion_policy).await
    }

    pub async fn product(&self, conn: &mut SqliteConnection, id: ProductId) -> InventoryResult<Product> {
        entity_store::product_by_id(conn, id).await
    }

    pub async fn product_by_name(&self, conn: &mut SqliteConnection, name: &str) -> InventoryResult<Product> {
        entity_store::product_by_name(conn, name).await
    }

    pub async fn list_products(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<Product>> {
        entity_store::list_products(conn).await
    }

    /// Name, unallocated and total quantity of every product.
    pub async fn stock_levels(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<StockLevel>> {
        Ok(entity_store::list_products(conn)
            .await?
            .into_iter()
            .map(|p| StockLevel {
                product_id: p.id,
                name: p.name,
                unallocated_quantity: p.unallocated_quantity,
                total_quantity: p.total_quantity,
            })
            .collect())
    }

    // ---- locations ------------------------------------------------------

    #[instrument(skip(self, conn), err)]
    pub async fn create_location(&self, conn: &mut SqliteConnection, name: &str) -> InventoryResult<Location> {
        let location = entity_store::insert_location(conn, NewLocation::new(name)?).await?;
        tracing::info!(location_id = %location.id, name = %location.name, "location created");
        Ok(location)
    }

    #[instrument(skip(self, conn), err)]
    pub async fn rename_location(
        &self,
        conn: &mut SqliteConnection,
        id: LocationId,
        name: &str,
    ) -> InventoryResult<Location> {
        entity_store::rename_location(conn, id, name).await
    }

    /// Delete a location; returns the credits applied to unallocated stock.
    pub async fn delete_location(
        &self,
        conn: &mut SqliteConnection,
        id: LocationId,
    ) -> InventoryResult<Vec<DisplacedStock>> {
        reconcile::delete_location(conn, id, self.deletion_policy).await
    }

    pub async fn location(&self, conn: &mut SqliteConnection, id: LocationId) -> InventoryResult<Location> {
        entity_store::location_by_id(conn, id).await
    }

    pub async fn location_by_name(&self, conn: &mut SqliteConnection, name: &str) -> InventoryResult<Location> {
        entity_store::location_by_name(conn, name).await
    }

    pub async fn list_locations(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<Location>> {
        entity_store::list_locations(conn).await
    }

    // ---- tagged requests ------------------------------------------------

    pub async fn edit(&self, conn: &mut SqliteConnection, request: &EditRequest) -> InventoryResult<Edited> {
        match request {
            EditRequest::Product { id, edit } => {
                Ok(Edited::Product(self.edit_product(conn, *id, edit).await?))
            }
            EditRequest::Location { id, edit } => {
                Ok(Edited::Location(self.edit_location(conn, *id, edit).await?))
            }
        }
    }

    pub async fn delete(&self, conn: &mut SqliteConnection, request: DeleteRequest) -> InventoryResult<Deleted> {
        match request {
            DeleteRequest::Product(id) => {
                self.delete_product(conn, id).await?;
                Ok(Deleted::Product(id))
            }
            DeleteRequest::Location(id) => {
                let credited = self.delete_location(conn, id).await?;
                Ok(Deleted::Location { id, credited })
            }
        }
    }

    async fn edit_location(
        &self,
        conn: &mut SqliteConnection,
        id: LocationId,
        edit: &LocationEdit,
    ) -> InventoryResult<Location> {
        match edit.new_name() {
            Some(name) => entity_store::rename_location(conn, id, name).await,
            None => entity_store::location_by_id(conn, id).await,
        }
    }

    // ---- ledger ---------------------------------------------------------

    /// Append a movement given by ids.
    pub async fn append_movement(
        &self,
        conn: &mut SqliteConnection,
        product_id: ProductId,
        from: Option<LocationId>,
        to: Option<LocationId>,
        quantity: i64,
    ) -> InventoryResult<MovementEntry> {
        let request = MovementRequest::new(product_id, from, to, quantity)?;
        self.append(conn, &request).await
    }

    /// Append a movement given by names, resolving them first.
    #[instrument(skip(self, conn, movement), fields(product = %movement.product, quantity = movement.quantity), err)]
    pub async fn record_movement(
        &self,
        conn: &mut SqliteConnection,
        movement: &NamedMovement,
    ) -> InventoryResult<MovementEntry> {
        Quantity::new(movement.quantity)?;
        let (from_name, to_name) = (movement.from_name(), movement.to_name());
        if from_name.is_none() && to_name.is_none() {
            return Err(DomainError::invalid_movement(
                "a movement needs a source or a destination location",
            )
            .into());
        }

        let product = entity_store::product_by_name(conn, &movement.product).await?;
        let from = match from_name {
            Some(name) => Some(entity_store::location_by_name(conn, name).await?.id),
            None => None,
        };
        let to = match to_name {
            Some(name) => Some(entity_store::location_by_name(conn, name).await?.id),
            None => None,
        };

        let request = MovementRequest::new(product.id, from, to, movement.quantity)?;
        self.append(conn, &request).await
    }

    async fn append(&self, conn: &mut SqliteConnection, request: &MovementRequest) -> InventoryResult<MovementEntry> {
        let entry = ledger::append(conn, request).await?;
        tracing::info!(
            movement_id = %entry.id,
            product_id = %entry.product_id,
            kind = request.kind.label(),
            quantity = entry.quantity,
            "movement recorded"
        );
        Ok(entry)
    }

    pub async fn list_movements(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<MovementEntry>> {
        ledger::list(conn).await
    }

    pub async fn movement_history(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<MovementView>> {
        projections::movement_history(conn).await
    }

    // ---- aggregation ----------------------------------------------------

    pub async fn summarize(
        &self,
        conn: &mut SqliteConnection,
        products: &[ProductId],
        locations: &[LocationId],
    ) -> InventoryResult<Vec<SummaryRow>> {
        projections::summarize(conn, products, locations).await
    }

    pub async fn summarize_all(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<SummaryRow>> {
        projections::summarize_all(conn).await
    }

    /// Products whose stored unallocated quantity disagrees with the ledger.
    pub async fn check_consistency(&self, conn: &mut SqliteConnection) -> InventoryResult<Vec<AllocationDrift>> {
        projections::check_allocation(conn).await
    }
}
