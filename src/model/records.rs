//! Row types for every table, plus the write-side structs used by the store.

use serde::{Deserialize, Serialize};

/// Type names the application relies on
pub mod type_names {
    pub const STATION: &str = "STATION";
    pub const RESOURCE: &str = "RESOURCE";
    pub const UNIT: &str = "UNIT";
    pub const PRODUCT: &str = "PRODUCT";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemType {
    pub id: i64,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub item_type_id: i64,
}

/// An item joined with its type label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithType {
    pub id: i64,
    pub name: String,
    pub item_type_id: i64,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCharacteristic {
    pub id: i64,
    pub item_id: i64,
    pub key: String,
    pub value: String,
    /// Free-form hint such as "str", "int", "float"
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLoading {
    pub id: i64,
    pub item_id: i64,
    pub month_year: String,
    pub percent: f64,
    pub daily_rollup_exists: bool,
    /// `None` is unallocated capacity
    pub product_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemProductMapping {
    pub item_id: i64,
    pub product_id: i64,
}

/// Generic resources of one type a product needs in a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRequirement {
    pub id: i64,
    pub product_id: i64,
    pub item_type_id: i64,
    pub type_name: String,
    pub month_year: String,
    pub quantity: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUsage {
    pub id: i64,
    pub name: String,
    pub mapped_items: i64,
    pub loading_count: i64,
}

/// An item-month whose loading adds up to more than 100 percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overallocation {
    pub item_id: i64,
    pub item_name: String,
    pub month_year: String,
    pub total_percent: f64,
}

// -----------------------------------------------------------------------------
// Write side
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCharacteristic {
    pub item_id: i64,
    pub key: String,
    pub value: String,
    pub value_type: Option<String>,
}

impl NewCharacteristic {
    pub fn new(item_id: i64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            item_id,
            key: key.into(),
            value: value.into(),
            value_type: None,
        }
    }

    pub fn with_type(self, value_type: impl Into<String>) -> Self {
        Self {
            value_type: Some(value_type.into()),
            ..self
        }
    }
}

/// A loading row to insert. `month_year` is passed through as-is so that a
/// malformed value is rejected by the schema's CHECK constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoading {
    pub item_id: i64,
    pub month_year: String,
    pub percent: f64,
    pub daily_rollup_exists: bool,
    pub product_id: Option<i64>,
}

impl NewLoading {
    pub fn new(item_id: i64, month_year: impl Into<String>, percent: f64) -> Self {
        Self {
            item_id,
            month_year: month_year.into(),
            percent,
            daily_rollup_exists: false,
            product_id: None,
        }
    }

    pub fn for_product(self, product_id: i64) -> Self {
        Self {
            product_id: Some(product_id),
            ..self
        }
    }

    pub fn with_daily_rollup(self, exists: bool) -> Self {
        Self {
            daily_rollup_exists: exists,
            ..self
        }
    }
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub item_type_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacteristicUpdate {
    pub item_id: Option<i64>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadingUpdate {
    pub item_id: Option<i64>,
    pub month_year: Option<String>,
    pub percent: Option<f64>,
    pub daily_rollup_exists: Option<bool>,
    /// `Some(None)` moves the row back to unallocated
    pub product_id: Option<Option<i64>>,
}

/// Lookup filters; every `Some` field must match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacteristicFilter {
    pub item_id: Option<i64>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadingFilter {
    pub item_id: Option<i64>,
    pub month_year: Option<String>,
    /// `Some(None)` matches unallocated rows
    pub product_id: Option<Option<i64>>,
}
