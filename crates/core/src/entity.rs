//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Identifiers of `entities`, in order.
pub fn ids<E: Entity>(entities: &[E]) -> Vec<E::Id> {
    entities.iter().map(Entity::id).collect()
}
