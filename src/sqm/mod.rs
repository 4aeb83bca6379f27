pub mod sqm_expression;
pub use sqm_expression::*;

pub mod sqm_statement;
pub use sqm_statement::*;
