//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two instances holding the same values are
/// the same value. They are immutable; "changing" one means building a new one.
///
/// - **Value Object**: `Quantity(30)`, a movement classification
/// - **Entity**: a `Product` with a `ProductId`, whose name and counters change over time
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
