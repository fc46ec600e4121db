//! `stockroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no IO).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::{Entity, ids};
pub use error::{DomainError, DomainResult, EntityKind};
pub use id::{LocationId, MovementId, ProductId};
pub use value_object::ValueObject;
