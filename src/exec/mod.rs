pub mod execution_error;
pub use execution_error::*;

pub mod store;
pub use store::*;

pub mod helpers;
pub use helpers::*;

pub mod eval;
pub use eval::*;

pub mod ast_executor;
pub use ast_executor::*;

pub mod row_reader;
pub use row_reader::*;
