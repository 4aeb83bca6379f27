use std::fmt;

use crate::{sql_ast::Literal, types::ValueKind};

/// A column of a table reference, qualified by the table's SQL alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    pub qualifier: String,
    pub column: String,
    /// kind of the value as stored
    pub kind: ValueKind,
}

impl ColumnReference {
    pub fn new(qualifier: &str, column: &str, kind: ValueKind) -> Self {
        Self { qualifier: qualifier.to_string(), column: column.to_string(), kind }
    }

    /// Key under which executors find the column in a scanned row.
    pub fn row_key(&self) -> String {
        format!("{}.{}", self.qualifier, self.column)
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.qualifier, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

/// Value-producing node of the SQL AST.
///
/// Equality is structural, which is also the identity the projection
/// resolver deduplicates on: two references to the same alias and column
/// denote the same expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Column(ColumnReference),
    Literal(Literal),
    Function(FunctionCall),
}

impl Expression {
    pub fn column(qualifier: &str, column: &str, kind: ValueKind) -> Self {
        Expression::Column(ColumnReference::new(qualifier, column, kind))
    }

    pub fn function(name: &str, args: Vec<Expression>) -> Self {
        Expression::Function(FunctionCall { name: name.to_ascii_lowercase(), args })
    }

    /// Kind known from the node itself; functions need the type configuration.
    pub fn intrinsic_kind(&self) -> Option<ValueKind> {
        match self {
            Expression::Column(c) => Some(c.kind),
            Expression::Literal(l) => Some(l.kind()),
            Expression::Function(_) => None,
        }
    }

    /// Visit every column reference, depth first.
    pub fn for_each_column<'a>(&'a self, f: &mut impl FnMut(&'a ColumnReference)) {
        match self {
            Expression::Column(c) => f(c),
            Expression::Literal(_) => {}
            Expression::Function(call) => {
                for arg in &call.args {
                    arg.for_each_column(f);
                }
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(c) => write!(f, "{}", c),
            Expression::Literal(l) => write!(f, "{}", l),
            Expression::Function(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}
