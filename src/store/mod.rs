//! Key-value store module
//!
//! Defines the store seam every operation goes through, plus an
//! in-memory implementation used by the local server and by tests.

mod errors;
mod expression;
mod memory;
mod snapshot;
mod value;

use async_trait::async_trait;
use std::collections::HashMap;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use snapshot::SnapshotFile;
pub use value::{item_to_json, AttributeValue, Item};

/// Filter applied by a scan
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Attribute exists and equals the value
    Equals {
        attribute: String,
        value: AttributeValue,
    },
}

impl Condition {
    pub fn equals(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value,
        }
    }

    /// Check whether an item satisfies the condition
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Equals { attribute, value } => item.get(attribute) == Some(value),
        }
    }
}

/// Parameterized partial mutation
///
/// `expression` only ever refers to `#name` and `:value` placeholders;
/// the actual attribute names and values travel in the two maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateItem {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Store operations used by the request handlers
///
/// Every call names its table explicitly; implementations hold no
/// per-request state.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch one item by key
    async fn get_item(&self, table: &str, key_attr: &str, key: &str)
        -> StoreResult<Option<Item>>;

    /// Write an item, replacing any existing item with the same key
    async fn put_item(&self, table: &str, item: Item) -> StoreResult<()>;

    /// Apply a partial mutation, creating the item if missing
    ///
    /// Returns the new values of the attributes the mutation set.
    async fn update_item(
        &self,
        table: &str,
        key_attr: &str,
        key: &str,
        update: &UpdateItem,
    ) -> StoreResult<Item>;

    /// Remove an item; removing a missing key is not an error
    async fn delete_item(&self, table: &str, key_attr: &str, key: &str) -> StoreResult<()>;

    /// Look up items through a secondary index
    async fn query_index(
        &self,
        table: &str,
        index: &str,
        key_attr: &str,
        value: &str,
    ) -> StoreResult<Vec<Item>>;

    /// Read every item of a table, optionally filtered
    async fn scan(&self, table: &str, filter: Option<&Condition>) -> StoreResult<Vec<Item>>;
}
