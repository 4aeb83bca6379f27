pub mod config;
pub use config::Config;

pub mod types;
pub mod mapping;
pub mod sqm;
pub mod sql_ast;
pub mod produce;
pub use produce::{CompileError, SqmConverter};

pub mod exec;
pub use exec::{ExecutionError, Store, StoreCommon};

pub mod engine;
pub use engine::Engine;
