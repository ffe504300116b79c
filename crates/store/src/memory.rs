use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::json;

use crate::row::{Filter, Row};
use crate::store::{Store, StoreError};

#[derive(Debug, Default)]
struct TableData {
    next_id: i64,
    rows: Vec<Row>,
}

/// In-memory relational store.
///
/// Intended for tests and small embeddings. Tables are created on first
/// insert; an `id` column is auto-assigned when the inserted row does not
/// carry one. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, TableData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(table: &mut TableData, mut values: Row) -> Row {
        if !values.contains_key("id") {
            table.next_id += 1;
            values.insert("id".to_string(), json!(table.next_id));
        }
        values
    }

    fn merge(target: &mut Row, values: &Row) {
        for (column, value) in values {
            target.insert(column.clone(), value.clone());
        }
    }
}

impl Store for InMemoryStore {
    fn select(&self, table: &str, filter: &Filter, columns: &[&str]) -> Result<Vec<Row>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let Some(data) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let rows = data
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .map(|row| {
                if columns.is_empty() {
                    row.clone()
                } else {
                    row.iter()
                        .filter(|(column, _)| columns.contains(&column.as_str()))
                        .map(|(column, value)| (column.clone(), value.clone()))
                        .collect()
                }
            })
            .collect();

        Ok(rows)
    }

    fn count(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        Ok(tables
            .get(table)
            .map(|data| data.rows.iter().filter(|row| filter.matches(row)).count() as u64)
            .unwrap_or(0))
    }

    fn insert(&self, table: &str, values: Row) -> Result<bool, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let data = tables.entry(table.to_string()).or_default();
        let row = Self::assign_id(data, values);
        data.rows.push(row);
        Ok(true)
    }

    fn update(&self, table: &str, values: Row, filter: &Filter) -> Result<bool, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let Some(data) = tables.get_mut(table) else {
            return Ok(false);
        };

        let mut changed = false;
        for row in data.rows.iter_mut().filter(|row| filter.matches(row)) {
            Self::merge(row, &values);
            changed = true;
        }
        Ok(changed)
    }

    fn delete(&self, table: &str, filter: &Filter) -> Result<bool, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let Some(data) = tables.get_mut(table) else {
            return Ok(false);
        };

        let before = data.rows.len();
        data.rows.retain(|row| !filter.matches(row));
        Ok(data.rows.len() != before)
    }

    fn upsert(&self, table: &str, values: Row, filter: &Filter) -> Result<bool, StoreError> {
        // One write-lock scope covers the existence check and the mutation,
        // which is this implementation's transaction boundary.
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let data = tables.entry(table.to_string()).or_default();
        let mut matched = false;
        for row in data.rows.iter_mut().filter(|row| filter.matches(row)) {
            Self::merge(row, &values);
            matched = true;
        }

        if !matched {
            let row = Self::assign_id(data, values);
            data.rows.push(row);
        }
        Ok(true)
    }
}
