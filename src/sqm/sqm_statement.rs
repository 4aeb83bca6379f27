use crate::sqm::{SqmExpression, SqmPredicate};

#[derive(Debug, Clone, PartialEq)]
pub struct SqmRoot {
    pub entity: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmSelection {
    pub expression: SqmExpression,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmSortSpecification {
    pub expression: SqmExpression,
    pub ascending: bool,
}

/// One domain-level query block. With no explicit selections the root
/// entity is selected (`from Employee e`).
#[derive(Debug, Clone, PartialEq)]
pub struct SqmQuerySpec {
    pub root: SqmRoot,
    pub selections: Vec<SqmSelection>,
    pub restriction: Option<SqmPredicate>,
    pub order_by: Vec<SqmSortSpecification>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SqmQuerySpec {
    pub fn from(entity: &str, alias: &str) -> Self {
        Self {
            root: SqmRoot { entity: entity.to_string(), alias: alias.to_string() },
            selections: Vec::new(),
            restriction: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn select(mut self, expression: SqmExpression) -> Self {
        self.selections.push(SqmSelection { expression, alias: None });
        self
    }

    pub fn select_as(mut self, expression: SqmExpression, alias: &str) -> Self {
        self.selections.push(SqmSelection { expression, alias: Some(alias.to_string()) });
        self
    }

    pub fn filter(mut self, predicate: SqmPredicate) -> Self {
        self.restriction = Some(predicate);
        self
    }

    pub fn order_by(mut self, expression: SqmExpression, ascending: bool) -> Self {
        self.order_by.push(SqmSortSpecification { expression, ascending });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmSelectStatement {
    pub query_spec: SqmQuerySpec,
}

impl From<SqmQuerySpec> for SqmSelectStatement {
    fn from(query_spec: SqmQuerySpec) -> Self {
        Self { query_spec }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmDeleteStatement {
    pub target: SqmRoot,
    pub restriction: Option<SqmPredicate>,
}

impl SqmDeleteStatement {
    pub fn from(entity: &str, alias: &str) -> Self {
        Self {
            target: SqmRoot { entity: entity.to_string(), alias: alias.to_string() },
            restriction: None,
        }
    }

    pub fn filter(mut self, predicate: SqmPredicate) -> Self {
        self.restriction = Some(predicate);
        self
    }
}
