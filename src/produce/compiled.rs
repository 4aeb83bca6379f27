use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::{
    sql_ast::{DeleteStatement, Expression, QuerySpec, SqlSelection},
    types::AttributeConverter,
};

/// One leaf value of a composite result and where to find it in the row buffer.
#[derive(Debug, Clone)]
pub struct FieldAssembler {
    /// attribute path inside the composite, e.g. `["name", "first"]`
    pub path: Vec<String>,
    pub buffer_index: usize,
    pub converter: Option<Arc<dyn AttributeConverter>>,
}

/// How to build one element of a result row from the row buffer.
#[derive(Debug, Clone)]
pub enum DomainResult {
    Basic {
        alias: Option<String>,
        buffer_index: usize,
        converter: Option<Arc<dyn AttributeConverter>>,
    },
    /// an entity or embedded value assembled into a JSON object
    Composite {
        alias: Option<String>,
        fields: Vec<FieldAssembler>,
    },
}

impl DomainResult {
    pub fn alias(&self) -> Option<&str> {
        match self {
            DomainResult::Basic { alias, .. } | DomainResult::Composite { alias, .. } => alias.as_deref(),
        }
    }
}

/// Columns a statement touches, per SQL table alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnUsage {
    columns: IndexMap<String, IndexSet<String>>,
}

impl ColumnUsage {
    pub fn record(&mut self, expression: &Expression) {
        expression.for_each_column(&mut |c| {
            self.columns.entry(c.qualifier.clone()).or_default().insert(c.column.clone());
        });
    }

    pub fn columns_of(&self, table_alias: &str) -> Option<&IndexSet<String>> {
        self.columns.get(table_alias)
    }
}

/// A select statement ready for execution.
#[derive(Debug, Clone)]
pub struct CompiledSelect {
    pub query_spec: QuerySpec,
    /// slots the row reader fills, in buffer order
    pub values_mapping: Vec<SqlSelection>,
    pub domain_results: Vec<DomainResult>,
    pub column_usage: ColumnUsage,
}

#[derive(Debug, Clone)]
pub struct CompiledDelete {
    pub statement: DeleteStatement,
    pub column_usage: ColumnUsage,
}
