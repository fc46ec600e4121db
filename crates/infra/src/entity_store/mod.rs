//! Entity Store: durable product and location records.
//!
//! Functions here take the caller's connection (usually a transaction) and
//! never open their own scope.

pub mod locations;
pub mod products;

pub use locations::{
    delete_location_row, insert_location, list_locations, location_by_id, location_by_name,
    location_names, rename_location,
};
pub use products::{
    adjust_unallocated, delete_product_row, insert_product, list_products, product_by_id,
    product_by_name, product_names, projected_unallocated, rename_product, write_quantities,
};
