pub mod compile_error;
pub use compile_error::*;

pub mod active_cell;
pub use active_cell::*;

pub mod processing_state;
pub use processing_state::*;

pub mod query_spec_processing_state;
pub use query_spec_processing_state::*;

pub mod alias_scope;
pub use alias_scope::*;

pub mod compiled;
pub use compiled::*;

pub mod sqm_converter;
pub use sqm_converter::*;
