use crate::sql_ast::{Expression, Predicate, SelectClause};

/// A table in a FROM clause with its statement-unique SQL alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableReference {
    pub table: String,
    pub alias: String,
}

impl TableReference {
    pub fn new(table: &str, alias: &str) -> Self {
        Self { table: table.to_string(), alias: alias.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpecification {
    pub expression: Expression,
    pub ascending: bool,
}

/// One query block: `SELECT .. FROM .. WHERE .. ORDER BY .. LIMIT ..`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// statement-unique block number; the root block is 0
    pub id: usize,
    pub from: TableReference,
    select_clause: SelectClause,
    pub where_clause: Option<Predicate>,
    pub sort_specifications: Vec<SortSpecification>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl QuerySpec {
    pub fn new(id: usize, from: TableReference) -> Self {
        Self {
            id,
            from,
            select_clause: SelectClause::default(),
            where_clause: None,
            sort_specifications: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn select_clause(&self) -> &SelectClause {
        &self.select_clause
    }

    pub(crate) fn select_clause_mut(&mut self) -> &mut SelectClause {
        &mut self.select_clause
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub target: TableReference,
    pub restriction: Option<Predicate>,
}
