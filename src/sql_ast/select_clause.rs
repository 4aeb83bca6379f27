use crate::sql_ast::SqlSelection;

/// The select list of one query block, in resolution order.
///
/// Append-only; entries are added by the block's projection resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectClause {
    selections: Vec<SqlSelection>,
}

impl SelectClause {
    pub(crate) fn add_sql_selection(&mut self, selection: SqlSelection) {
        self.selections.push(selection);
    }

    pub fn sql_selections(&self) -> &[SqlSelection] {
        &self.selections
    }

    /// Selections that produce a result column, in column-ordinal order.
    pub fn column_selections(&self) -> impl Iterator<Item = &SqlSelection> {
        self.selections.iter().filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}
