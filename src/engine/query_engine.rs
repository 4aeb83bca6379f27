use std::{collections::HashMap, sync::Mutex};

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    config::Config,
    exec::{AstExecutor, Eval, ExecutionError, Row, RowReader, Store, StoreCommon},
    mapping::{AttributeMapping, DomainModel, EntityMapping, IdGenerator},
    produce::{CompileError, CompiledDelete, CompiledSelect, SqmConverter},
    sqm::{SqmDeleteStatement, SqmSelectStatement},
    types::{TypeConfiguration, ValueKind},
};

/// Persists domain values and runs domain-level statements against a store.
pub struct Engine {
    store: Store,
    model: DomainModel,
    types: TypeConfiguration,
    config: Config,
    id_generators: Mutex<HashMap<String, IdGenerator>>,
}

impl Engine {
    /// Creates an empty table for every mapped entity that has none yet.
    pub fn new(store: Store, model: DomainModel, types: TypeConfiguration, config: Config) -> Result<Self, ExecutionError> {
        for name in model.entity_names() {
            if let Some(entity) = model.entity(&name) {
                store.create_table(&entity.table)?;
            }
        }
        Ok(Self { store, model, types, config, id_generators: Mutex::new(HashMap::new()) })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn model(&self) -> &DomainModel {
        &self.model
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compile_select(&self, statement: &SqmSelectStatement) -> Result<CompiledSelect, CompileError> {
        SqmConverter::new(&self.model, &self.types, &self.config).convert_select(statement)
    }

    pub fn compile_delete(&self, statement: &SqmDeleteStatement) -> Result<CompiledDelete, CompileError> {
        SqmConverter::new(&self.model, &self.types, &self.config).convert_delete(statement)
    }

    /// Stores `value` as a new row of `entity` and returns its id.
    ///
    /// Embedded values are flattened into their columns, converted attributes
    /// are stored in converted form and transient attributes are dropped.
    /// The id check and the insert happen under one write lock, so an id
    /// already in the table is refused as [`ExecutionError::DuplicateId`].
    pub fn persist(&self, entity: &str, value: &Value) -> Result<Value, ExecutionError> {
        let mapping = self.entity(entity)?;
        let Value::Object(object) = value else {
            return Err(ExecutionError::InvalidData(format!("'{entity}' must be persisted from an object, got {value}")));
        };
        let id_column = mapping.id_mapping()
            .map_or(mapping.id_attribute.as_str(), |id| id.column.as_str());

        let mut tables = self.store.write_tables()?;
        let existing = tables.rows(&mapping.table).unwrap_or_default();
        let id = self.assign_id(mapping, object, existing, id_column)?;

        let mut row = Row::new();
        for (path, leaf) in mapping.flatten() {
            let AttributeMapping::Basic(basic) = leaf else { continue };
            let domain = if path.len() == 1 && path[0] == mapping.id_attribute {
                id.clone()
            } else {
                Self::value_at(object, &path)
            };
            let actual = ValueKind::of_value(&domain);
            if !basic.kind.accepts(actual) {
                return Err(ExecutionError::InvalidData(format!(
                    "'{entity}.{}' expects {:?}, got {domain}",
                    path.join("."),
                    basic.kind
                )));
            }
            let converter = self.types.converter_for(basic).map_err(|converter| CompileError::UnknownConverter {
                attribute: path.join("."),
                converter,
            })?;
            let stored = match converter {
                Some(converter) => converter.to_database(&domain)?,
                None => domain,
            };
            row.insert(basic.column.clone(), stored);
        }

        let stored_id = row.get(id_column).cloned().unwrap_or(Value::Null);
        if existing.iter().any(|other| other.get(id_column).is_some_and(|v| Eval::value_equal(v, &stored_id))) {
            return Err(ExecutionError::DuplicateId { entity: mapping.name.clone(), id });
        }

        tables.insert(&mapping.table, row);
        debug!(entity, table = %mapping.table, %id, "persisted");
        Ok(id)
    }

    pub fn list(&self, statement: &SqmSelectStatement) -> Result<Vec<Value>, ExecutionError> {
        let compiled = self.compile_select(statement)?;
        let usage = self.config.prune_columns.then_some(&compiled.column_usage);
        let rows = AstExecutor::new(&self.store, usage).execute_select(&compiled.query_spec)?;

        let reader = RowReader::new(&compiled.values_mapping, &compiled.domain_results);
        let results = rows.iter()
            .map(|row| reader.read_row(row).map_err(ExecutionError::from))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(results = results.len(), "listed");
        Ok(results)
    }

    /// `None` for no match; more than one match is an error.
    pub fn unique_result(&self, statement: &SqmSelectStatement) -> Result<Option<Value>, ExecutionError> {
        let mut results = self.list(statement)?;
        match results.len() {
            0 | 1 => Ok(results.pop()),
            count => Err(ExecutionError::NonUniqueResult { count }),
        }
    }

    pub fn execute_delete(&self, statement: &SqmDeleteStatement) -> Result<usize, ExecutionError> {
        let compiled = self.compile_delete(statement)?;
        let usage = self.config.prune_columns.then_some(&compiled.column_usage);
        AstExecutor::new(&self.store, usage).execute_delete(&compiled.statement)
    }

    fn entity(&self, name: &str) -> Result<&EntityMapping, ExecutionError> {
        self.model.entity(name)
            .ok_or_else(|| ExecutionError::Compile(CompileError::UnknownEntity(name.to_string())))
    }

    /// Supplied ids are kept; otherwise the entity's generator produces one,
    /// after catching up with the ids already stored.
    fn assign_id(
        &self,
        mapping: &EntityMapping,
        object: &Map<String, Value>,
        existing: &[Row],
        id_column: &str,
    ) -> Result<Value, ExecutionError> {
        let mut generators = self.id_generators.lock().map_err(|_| ExecutionError::StoreUnavailable)?;
        let generator = generators.entry(mapping.name.clone())
            .or_insert_with(|| IdGenerator::new(mapping.id_generation));

        // rows may have been loaded straight into the store
        for stored in existing.iter().filter_map(|row| row.get(id_column)) {
            generator.observe(stored);
        }

        match object.get(&mapping.id_attribute).filter(|id| !id.is_null()) {
            Some(id) => {
                generator.observe(id);
                Ok(id.clone())
            }
            None => generator.next().ok_or_else(|| ExecutionError::MissingId { entity: mapping.name.clone() }),
        }
    }

    fn value_at(object: &Map<String, Value>, path: &[String]) -> Value {
        let Some((first, rest)) = path.split_first() else { return Value::Null };
        let mut current = object.get(first);
        for segment in rest {
            current = current.and_then(|v| v.get(segment));
        }
        current.cloned().unwrap_or(Value::Null)
    }
}
