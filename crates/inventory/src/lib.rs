//! Inventory domain module.
//!
//! Business rules for products, locations and the movement ledger, implemented
//! as deterministic domain logic (no IO, no SQL, no storage).

pub mod location;
pub mod movement;
pub mod product;
pub mod reconcile;
pub mod request;
pub mod summary;

pub use location::{Location, NewLocation};
pub use movement::{LocationRef, MovementEntry, MovementKind, MovementRequest, NamedMovement, Quantity};
pub use product::{NewProduct, Product, validate_name};
pub use reconcile::{DisplacedStock, LocationFlow};
pub use request::{DeleteRequest, EditRequest, LocationEdit, ProductEdit};
pub use summary::{AllocationDrift, MovementView, StockLevel, SummaryRow};
