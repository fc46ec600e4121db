use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, EntityKind, ProductId};

/// Validate a product or location name.
///
/// Names are trimmed; a name that is empty after trimming is rejected.
pub fn validate_name(kind: EntityKind, raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{kind} name cannot be empty")));
    }
    Ok(name.to_string())
}

/// A registered product and its two stock counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Nominal stock level.
    pub total_quantity: i64,
    /// Portion of `total_quantity` not sited at any location. May go negative
    /// when the ledger moves more stock out of "unallocated" than was declared.
    pub unallocated_quantity: i64,
}

impl Product {
    /// Quantity currently sited at locations, as implied by the counters.
    pub fn allocated_quantity(&self) -> i64 {
        self.total_quantity - self.unallocated_quantity
    }

    /// Change the nominal stock level, returning the delta applied to
    /// `unallocated_quantity`.
    ///
    /// The delta goes entirely to unallocated stock: sited quantities are
    /// only ever changed through the ledger.
    pub fn set_total_quantity(&mut self, new_total: i64) -> DomainResult<i64> {
        if new_total < 0 {
            return Err(DomainError::InvalidQuantity(new_total));
        }
        let delta = new_total - self.total_quantity;
        self.unallocated_quantity = self
            .unallocated_quantity
            .checked_add(delta)
            .ok_or(DomainError::InvalidQuantity(new_total))?;
        self.total_quantity = new_total;
        Ok(delta)
    }

    /// Shift `unallocated_quantity` by a ledger or reconciliation delta.
    ///
    /// Fails without changing anything when the counter would leave the
    /// `i64` range.
    pub fn apply_allocation_delta(&mut self, delta: i64) -> DomainResult<()> {
        self.unallocated_quantity = self
            .unallocated_quantity
            .checked_add(delta)
            .ok_or(DomainError::InvalidQuantity(delta))?;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Validated registration request for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    name: String,
    total_quantity: i64,
}

impl NewProduct {
    pub fn new(name: &str, total_quantity: i64) -> DomainResult<Self> {
        let name = validate_name(EntityKind::Product, name)?;
        if total_quantity < 0 {
            return Err(DomainError::InvalidQuantity(total_quantity));
        }
        Ok(Self {
            name,
            total_quantity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    /// Unallocated quantity a freshly registered product starts with.
    pub fn initial_unallocated(&self) -> i64 {
        self.total_quantity
    }

    /// Materialise the product once the store has assigned an id.
    pub fn into_product(self, id: ProductId) -> Product {
        let unallocated_quantity = self.initial_unallocated();
        Product {
            id,
            name: self.name,
            total_quantity: self.total_quantity,
            unallocated_quantity,
        }
    }
}
