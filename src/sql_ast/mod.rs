pub mod clause;
pub use clause::*;

pub mod literal;
pub use literal::*;

pub mod truth;
pub use truth::*;

pub mod expression;
pub use expression::*;

pub mod sql_selection;
pub use sql_selection::*;

pub mod select_clause;
pub use select_clause::*;

pub mod predicate;
pub use predicate::*;

pub mod query_spec;
pub use query_spec::*;
