use crate::sql_ast::{ComparisonOperator, Expression, QuerySpec, Truth};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare { left: Expression, op: ComparisonOperator, right: Expression },
    IsNull { expr: Expression, negated: bool },
    Like { expr: Expression, pattern: Expression, negated: bool },
    Exists { query: Box<QuerySpec>, negated: bool },
    /// `expr IN (SELECT ...)`, compared against the sub-query's first column
    InSubQuery { expr: Expression, query: Box<QuerySpec>, negated: bool },
    Const3(Truth),
}
