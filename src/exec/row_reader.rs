use serde_json::{Map, Value};

use crate::{
    produce::{DomainResult, FieldAssembler},
    sql_ast::SqlSelection,
    types::{AttributeConverter, ConversionError},
};

/// Turns result rows into domain values.
///
/// Each row is first spread into a buffer laid out by the statement's
/// values mapping; slots without a result column read as null.
pub struct RowReader<'c> {
    values_mapping: &'c [SqlSelection],
    domain_results: &'c [DomainResult],
}

impl<'c> RowReader<'c> {
    pub fn new(values_mapping: &'c [SqlSelection], domain_results: &'c [DomainResult]) -> Self {
        Self { values_mapping, domain_results }
    }

    /// A single result is returned as is. Several results become an object
    /// when every one is aliased and an array otherwise.
    pub fn read_row(&self, row: &[Value]) -> Result<Value, ConversionError> {
        let buffer = self.fill_buffer(row);

        if let [single] = self.domain_results {
            return Self::assemble(single, &buffer);
        }

        if self.domain_results.iter().all(|r| r.alias().is_some()) {
            let mut out = Map::new();
            for result in self.domain_results {
                let key = result.alias().unwrap_or_default().to_string();
                out.insert(key, Self::assemble(result, &buffer)?);
            }
            return Ok(Value::Object(out));
        }

        self.domain_results.iter()
            .map(|r| Self::assemble(r, &buffer))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    pub fn fill_buffer(&self, row: &[Value]) -> Vec<Value> {
        let mut buffer = vec![Value::Null; self.values_mapping.len()];
        for selection in self.values_mapping {
            let Some(ordinal) = selection.column_ordinal() else { continue };
            if let Some(slot) = buffer.get_mut(selection.buffer_index()) {
                *slot = row.get(ordinal - 1).cloned().unwrap_or(Value::Null);
            }
        }
        buffer
    }

    fn assemble(result: &DomainResult, buffer: &[Value]) -> Result<Value, ConversionError> {
        match result {
            DomainResult::Basic { buffer_index, converter, .. } => {
                Self::read_slot(buffer, *buffer_index, converter.as_deref())
            }
            DomainResult::Composite { fields, .. } => {
                let mut out = Map::new();
                for field in fields {
                    Self::place(&mut out, field, Self::read_field(buffer, field)?);
                }
                Ok(Value::Object(out))
            }
        }
    }

    fn read_field(buffer: &[Value], field: &FieldAssembler) -> Result<Value, ConversionError> {
        Self::read_slot(buffer, field.buffer_index, field.converter.as_deref())
    }

    fn read_slot(buffer: &[Value], index: usize, converter: Option<&dyn AttributeConverter>) -> Result<Value, ConversionError> {
        let raw = buffer.get(index).cloned().unwrap_or(Value::Null);
        match converter {
            Some(converter) => converter.to_domain(&raw),
            None => Ok(raw),
        }
    }

    // nested objects for embedded paths
    fn place(out: &mut Map<String, Value>, field: &FieldAssembler, value: Value) {
        let Some((last, parents)) = field.path.split_last() else { return };
        let mut target = out;
        for segment in parents {
            let entry = target.entry(segment.clone()).or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else { return };
            target = next;
        }
        target.insert(last.clone(), value);
    }
}
