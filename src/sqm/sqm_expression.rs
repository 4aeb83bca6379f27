use crate::{sql_ast::{ComparisonOperator, Literal}, sqm::SqmQuerySpec};

/// Navigation from a query root: `e.name.first` is alias `e` with attribute
/// path `["name", "first"]`. An empty path denotes the entity itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqmPath {
    pub alias: String,
    pub attribute_path: Vec<String>,
}

impl SqmPath {
    /// Build from dotted notation.
    pub fn parse(dotted: &str) -> Self {
        let mut parts = dotted.split('.').map(str::trim).map(String::from);
        let alias = parts.next().unwrap_or_default();
        Self { alias, attribute_path: parts.collect() }
    }

    pub fn is_entity(&self) -> bool {
        self.attribute_path.is_empty()
    }
}

impl std::fmt::Display for SqmPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.alias)?;
        for segment in &self.attribute_path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Domain-level value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SqmExpression {
    Path(SqmPath),
    Literal(Literal),
    Function { name: String, args: Vec<SqmExpression> },
}

impl SqmExpression {
    pub fn path(dotted: &str) -> Self {
        SqmExpression::Path(SqmPath::parse(dotted))
    }

    pub fn literal(literal: impl Into<Literal>) -> Self {
        SqmExpression::Literal(literal.into())
    }

    /// `None` for NaN, which has no literal form.
    pub fn float(value: f64) -> Option<Self> {
        ordered_float::NotNan::new(value)
            .ok()
            .map(|v| SqmExpression::Literal(Literal::Float(v)))
    }

    pub fn function(name: &str, args: Vec<SqmExpression>) -> Self {
        SqmExpression::Function { name: name.to_string(), args }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqmPredicate {
    Compare { left: SqmExpression, op: ComparisonOperator, right: SqmExpression },
    And(Vec<SqmPredicate>),
    Or(Vec<SqmPredicate>),
    Not(Box<SqmPredicate>),
    IsNull { expr: SqmExpression, negated: bool },
    Like { expr: SqmExpression, pattern: SqmExpression, negated: bool },
    Exists { query: Box<SqmQuerySpec>, negated: bool },
    InSubQuery { expr: SqmExpression, query: Box<SqmQuerySpec>, negated: bool },
}

impl SqmPredicate {
    pub fn compare(left: SqmExpression, op: ComparisonOperator, right: SqmExpression) -> Self {
        SqmPredicate::Compare { left, op, right }
    }

    pub fn eq(left: SqmExpression, right: SqmExpression) -> Self {
        Self::compare(left, ComparisonOperator::Eq, right)
    }

    pub fn exists(query: SqmQuerySpec) -> Self {
        SqmPredicate::Exists { query: Box::new(query), negated: false }
    }

    pub fn in_sub_query(expr: SqmExpression, query: SqmQuerySpec) -> Self {
        SqmPredicate::InSubQuery { expr, query: Box::new(query), negated: false }
    }
}
