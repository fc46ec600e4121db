//! Infrastructure layer: SQLite storage, config, and the inventory engine.

pub mod allocation;
pub mod config;
pub mod db;
pub mod engine;
pub mod entity_store;
pub mod error;
pub mod ledger;
pub mod projections;
pub mod reconcile;

#[cfg(test)]
mod integration_tests;

pub use config::{DeletionPolicy, InventoryConfig};
pub use db::{InventoryStore, commit};
pub use engine::{Deleted, Edited, InventoryEngine};
pub use error::{InventoryError, InventoryResult};
pub use projections::WarehouseSummary;
