use std::{fs, path::Path, sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard}};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::exec::ExecutionError;

pub type Row = Map<String, Value>;

/// Thread-safe handle to the in-memory tables.
pub type Store = Arc<RwLock<InternalStore>>;

/// Tables of JSON rows keyed by column name.
#[derive(Debug, Default)]
pub struct InternalStore {
    tables: IndexMap<String, Vec<Row>>,
}

impl InternalStore {
    pub fn into_protected(self) -> Store {
        Arc::new(RwLock::new(self))
    }

    pub fn create_table(&mut self, name: &str) {
        self.tables.entry(name.to_string()).or_default();
    }

    pub fn insert(&mut self, table: &str, row: Row) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn rows(&self, table: &str) -> Option<&[Row]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Remove the rows at `positions` (as returned by [`InternalStore::rows`]).
    pub fn remove_positions(&mut self, table: &str, positions: &[usize]) -> usize {
        let Some(rows) = self.tables.get_mut(table) else { return 0 };
        let before = rows.len();
        let mut position = 0;
        rows.retain(|_| {
            let keep = !positions.contains(&position);
            position += 1;
            keep
        });
        before - rows.len()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

pub trait StoreCommon {
    fn new_store() -> Self;
    /// Read access to every table for the lifetime of the guard.
    fn read_tables(&self) -> Result<RwLockReadGuard<'_, InternalStore>, ExecutionError>;
    /// Exclusive access, for work that must read and change tables atomically.
    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, InternalStore>, ExecutionError>;
    fn create_table(&self, name: &str) -> Result<(), ExecutionError>;
    fn insert(&self, table: &str, row: Row) -> Result<(), ExecutionError>;
    /// Snapshot of a table's rows.
    fn rows(&self, table: &str) -> Result<Vec<Row>, ExecutionError>;
    fn table_names(&self) -> Result<Vec<String>, ExecutionError>;
    /// Append every object of a JSON array; returns how many rows were added.
    fn load_from_json(&self, table: &str, rows: Value) -> Result<usize, ExecutionError>;
    fn load_from_file(&self, table: &str, path: &Path) -> Result<usize, ExecutionError>;
}

impl StoreCommon for Store {
    fn new_store() -> Self {
        InternalStore::default().into_protected()
    }

    fn read_tables(&self) -> Result<RwLockReadGuard<'_, InternalStore>, ExecutionError> {
        self.read().map_err(|_| ExecutionError::StoreUnavailable)
    }

    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, InternalStore>, ExecutionError> {
        self.write().map_err(|_| ExecutionError::StoreUnavailable)
    }

    fn create_table(&self, name: &str) -> Result<(), ExecutionError> {
        self.write_tables()?.create_table(name);
        Ok(())
    }

    fn insert(&self, table: &str, row: Row) -> Result<(), ExecutionError> {
        self.write_tables()?.insert(table, row);
        Ok(())
    }

    fn rows(&self, table: &str) -> Result<Vec<Row>, ExecutionError> {
        let guard = self.read_tables()?;
        guard.rows(table)
            .map(<[Row]>::to_vec)
            .ok_or_else(|| ExecutionError::UnknownTable(table.to_string()))
    }

    fn table_names(&self) -> Result<Vec<String>, ExecutionError> {
        Ok(self.read_tables()?.table_names())
    }

    fn load_from_json(&self, table: &str, rows: Value) -> Result<usize, ExecutionError> {
        let Value::Array(items) = rows else {
            return Err(ExecutionError::InvalidData(format!("expected an array of rows for '{table}'")));
        };

        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(row) => parsed.push(row),
                other => return Err(ExecutionError::InvalidData(format!("row of '{table}' is not an object: {other}"))),
            }
        }

        let count = parsed.len();
        let mut guard = self.write_tables()?;
        guard.create_table(table);
        for row in parsed {
            guard.insert(table, row);
        }
        debug!(table, rows = count, "loaded rows");
        Ok(count)
    }

    fn load_from_file(&self, table: &str, path: &Path) -> Result<usize, ExecutionError> {
        let text = fs::read_to_string(path).map_err(|e| ExecutionError::Io(e.to_string()))?;
        let rows: Value = serde_json::from_str(&text).map_err(|e| ExecutionError::InvalidData(e.to_string()))?;
        self.load_from_json(table, rows)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_table_is_an_error_but_an_empty_one_is_not() {
        let store = Store::new_store();
        assert_eq!(store.rows("EMP"), Err(ExecutionError::UnknownTable("EMP".into())));
        store.create_table("EMP").unwrap();
        assert!(store.rows("EMP").unwrap().is_empty());
    }

    #[test]
    fn load_from_json_rejects_non_object_rows_atomically() {
        let store = Store::new_store();
        let result = store.load_from_json("T", json!([{ "id": 1 }, 5]));
        assert!(matches!(result, Err(ExecutionError::InvalidData(_))));
        assert!(store.rows("T").is_err());
    }

    #[test]
    fn remove_positions_keeps_the_other_rows_in_order() {
        let store = Store::new_store();
        store.load_from_json("T", json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }, { "id": 4 }])).unwrap();
        assert_eq!(store.write_tables().unwrap().remove_positions("T", &[0, 2]), 2);
        let ids: Vec<Value> = store.rows("T").unwrap().into_iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(2), json!(4)]);
    }

    #[test]
    fn loads_rows_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "id": 1, "name": "a" }}, {{ "id": 2, "name": "b" }}]"#).unwrap();

        let store = Store::new_store();
        assert_eq!(store.load_from_file("T", file.path()).unwrap(), 2);
        assert_eq!(store.rows("T").unwrap()[1]["name"], json!("b"));
        assert_eq!(store.table_names().unwrap(), vec!["T".to_string()]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let store = Store::new_store();
        let dir = tempfile::tempdir().unwrap();
        let result = store.load_from_file("T", &dir.path().join("absent.json"));
        assert!(matches!(result, Err(ExecutionError::Io(_))));
    }
}
