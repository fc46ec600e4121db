//! Tagged edit/delete requests.

use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, ProductId};

/// Edit to a product. Each present field is applied independently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub total_quantity: Option<i64>,
}

impl ProductEdit {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            total_quantity: None,
        }
    }

    pub fn quantity(total_quantity: i64) -> Self {
        Self {
            name: None,
            total_quantity: Some(total_quantity),
        }
    }

    /// The requested name, unless absent or blank.
    pub fn new_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Edit to a location. Blank names count as "no change".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationEdit {
    pub name: Option<String>,
}

impl LocationEdit {
    pub fn new_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditRequest {
    Product { id: ProductId, edit: ProductEdit },
    Location { id: LocationId, edit: LocationEdit },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DeleteRequest {
    Product(ProductId),
    Location(LocationId),
}
