//! In-memory store
//!
//! Tables and secondary indexes must be declared up front; calls against
//! an undeclared table or index fail the way a real store would, which
//! is how tests simulate structural failures.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::expression;
use super::snapshot::{Snapshot, SnapshotFile};
use super::{AttributeValue, Condition, Item, Store, UpdateItem};

/// Table schema: key attribute plus index name -> indexed attribute
#[derive(Debug, Clone)]
struct TableSchema {
    key_attr: String,
    indexes: HashMap<String, String>,
}

/// In-memory implementation of [`Store`]
pub struct MemoryStore {
    schemas: HashMap<String, TableSchema>,
    data: RwLock<Snapshot>,
    snapshot: Option<SnapshotFile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
            data: RwLock::new(Snapshot::default()),
            snapshot: None,
        }
    }

    /// Declare a table keyed by `key_attr`
    #[must_use]
    pub fn with_table(mut self, table: &str, key_attr: &str) -> Self {
        self.schemas.insert(
            table.to_string(),
            TableSchema {
                key_attr: key_attr.to_string(),
                indexes: HashMap::new(),
            },
        );
        self
    }

    /// Declare a secondary index on a previously declared table
    #[must_use]
    pub fn with_index(mut self, table: &str, index: &str, attribute: &str) -> Self {
        if let Some(schema) = self.schemas.get_mut(table) {
            schema
                .indexes
                .insert(index.to_string(), attribute.to_string());
        }
        self
    }

    /// Persist every mutation to a snapshot file, loading it first
    #[must_use]
    pub fn with_snapshot(mut self, file: SnapshotFile) -> Self {
        let loaded = file.load();
        self.data = RwLock::new(loaded);
        self.snapshot = Some(file);
        self
    }

    fn schema(&self, table: &str) -> StoreResult<&TableSchema> {
        self.schemas
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn check_key(schema: &TableSchema, key_attr: &str, key: &str) -> StoreResult<()> {
        if schema.key_attr != key_attr {
            return Err(StoreError::Validation(format!(
                "Key attribute mismatch: expected {}, got {key_attr}",
                schema.key_attr
            )));
        }
        if key.is_empty() {
            return Err(StoreError::Validation(format!(
                "Key {key_attr} must not be empty"
            )));
        }
        Ok(())
    }

    /// Save the snapshot after a single-row change
    ///
    /// When the save fails the row is put back to `previous`, so memory
    /// never shows a change the caller was told had failed.
    fn persist_or_restore(
        &self,
        data: &mut Snapshot,
        table: &str,
        key: &str,
        previous: Option<Item>,
    ) -> StoreResult<()> {
        let Some(file) = &self.snapshot else {
            return Ok(());
        };
        let Err(e) = file.save(data) else {
            return Ok(());
        };

        let rows = data.tables.entry(table.to_string()).or_default();
        match previous {
            Some(item) => {
                rows.insert(key.to_string(), item);
            }
            None => {
                rows.remove(key);
            }
        }
        Err(e)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_item(
        &self,
        table: &str,
        key_attr: &str,
        key: &str,
    ) -> StoreResult<Option<Item>> {
        let schema = self.schema(table)?;
        Self::check_key(schema, key_attr, key)?;

        let data = self.data.read().await;
        Ok(data.tables.get(table).and_then(|rows| rows.get(key)).cloned())
    }

    async fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        let schema = self.schema(table)?;
        let key = match item.get(&schema.key_attr) {
            Some(AttributeValue::S(key)) if !key.is_empty() => key.clone(),
            _ => {
                return Err(StoreError::Validation(format!(
                    "Item is missing string key attribute {}",
                    schema.key_attr
                )))
            }
        };

        let mut data = self.data.write().await;
        let previous = data
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(key.clone(), item);
        self.persist_or_restore(&mut data, table, &key, previous)
    }

    async fn update_item(
        &self,
        table: &str,
        key_attr: &str,
        key: &str,
        update: &UpdateItem,
    ) -> StoreResult<Item> {
        let schema = self.schema(table)?;
        Self::check_key(schema, key_attr, key)?;
        let actions = expression::parse(update, key_attr)?;

        let mut data = self.data.write().await;
        let rows = data.tables.entry(table.to_string()).or_default();
        let previous = rows.get(key).cloned();
        let item = rows.entry(key.to_string()).or_insert_with(|| {
            let mut fresh = Item::new();
            fresh.insert(key_attr.to_string(), AttributeValue::S(key.to_string()));
            fresh
        });
        let updated = expression::apply(item, actions);
        self.persist_or_restore(&mut data, table, key, previous)?;
        Ok(updated)
    }

    async fn delete_item(&self, table: &str, key_attr: &str, key: &str) -> StoreResult<()> {
        let schema = self.schema(table)?;
        Self::check_key(schema, key_attr, key)?;

        let mut data = self.data.write().await;
        let removed = data.tables.get_mut(table).and_then(|rows| rows.remove(key));
        if removed.is_some() {
            self.persist_or_restore(&mut data, table, key, removed)?;
        }
        Ok(())
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        key_attr: &str,
        value: &str,
    ) -> StoreResult<Vec<Item>> {
        let schema = self.schema(table)?;
        let indexed = schema
            .indexes
            .get(index)
            .ok_or_else(|| StoreError::IndexNotFound {
                table: table.to_string(),
                index: index.to_string(),
            })?;
        if indexed != key_attr {
            return Err(StoreError::Validation(format!(
                "Index {index} is keyed by {indexed}, not {key_attr}"
            )));
        }

        let wanted = AttributeValue::S(value.to_string());
        let data = self.data.read().await;
        Ok(data
            .tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|item| item.get(key_attr) == Some(&wanted))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn scan(&self, table: &str, filter: Option<&Condition>) -> StoreResult<Vec<Item>> {
        self.schema(table)?;

        let data = self.data.read().await;
        Ok(data
            .tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|item| filter.map_or(true, |cond| cond.matches(item)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
