use crate::{sql_ast::Expression, types::{TypeConfiguration, ValueKind}};

/// A real select-list entry: `expression` is emitted as result column
/// `column_ordinal` and read into `buffer_index` of the row buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSelection {
    column_ordinal: usize,
    buffer_index: usize,
    expression: Expression,
    value_kind: ValueKind,
}

/// A buffer entry with no result column behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptySelection {
    buffer_index: usize,
}

/// Binds one expression to its position in the emitted column list and in
/// the row-value buffer. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlSelection {
    Column(ColumnSelection),
    Empty(EmptySelection),
}

impl SqlSelection {
    /// 1-based ordinal among the real selections; `None` for the placeholder.
    pub fn column_ordinal(&self) -> Option<usize> {
        match self {
            SqlSelection::Column(c) => Some(c.column_ordinal),
            SqlSelection::Empty(_) => None,
        }
    }

    /// 0-based position in the row-value buffer.
    pub fn buffer_index(&self) -> usize {
        match self {
            SqlSelection::Column(c) => c.buffer_index,
            SqlSelection::Empty(e) => e.buffer_index,
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        match self {
            SqlSelection::Column(c) => Some(&c.expression),
            SqlSelection::Empty(_) => None,
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            SqlSelection::Column(c) => c.value_kind,
            SqlSelection::Empty(_) => ValueKind::Null,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SqlSelection::Empty(_))
    }
}

/// What the projection resolver keys its slots on: a real expression, or the
/// one reserved placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionKey {
    Expression(Expression),
    Empty,
}

impl SelectionKey {
    /// Manufacture the slot this key occupies.
    ///
    /// The placeholder ignores `column_ordinal` and `value_kind`: it never
    /// becomes a result column.
    pub fn create_sql_selection(
        &self,
        column_ordinal: usize,
        buffer_index: usize,
        value_kind: ValueKind,
        types: &TypeConfiguration,
    ) -> SqlSelection {
        match self {
            SelectionKey::Expression(expression) => SqlSelection::Column(ColumnSelection {
                column_ordinal,
                buffer_index,
                value_kind: types.expressable_kind(expression, value_kind),
                expression: expression.clone(),
            }),
            SelectionKey::Empty => SqlSelection::Empty(EmptySelection { buffer_index }),
        }
    }
}

impl From<Expression> for SelectionKey {
    fn from(value: Expression) -> Self {
        SelectionKey::Expression(value)
    }
}
