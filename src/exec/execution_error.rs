use std::fmt::Display;

use serde_json::Value;

use crate::{produce::CompileError, types::ConversionError};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    Compile(CompileError),
    Conversion(ConversionError),
    UnknownTable(String),
    /// data handed to the store or to `persist` has the wrong shape
    InvalidData(String),
    MissingId { entity: String },
    DuplicateId { entity: String, id: Value },
    NonUniqueResult { count: usize },
    Io(String),
    /// a store lock was poisoned by a panicking writer
    StoreUnavailable,
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionError::Compile(e) => write!(f, "compile error: {e}"),
            ExecutionError::Conversion(e) => write!(f, "{e}"),
            ExecutionError::UnknownTable(name) => write!(f, "unknown table '{name}'"),
            ExecutionError::InvalidData(message) => write!(f, "invalid data: {message}"),
            ExecutionError::MissingId { entity } => write!(f, "no id given or generated for '{entity}'"),
            ExecutionError::DuplicateId { entity, id } => write!(f, "'{entity}' already has a row with id {id}"),
            ExecutionError::NonUniqueResult { count } => write!(f, "query returned {count} rows where at most one was expected"),
            ExecutionError::Io(message) => write!(f, "io error: {message}"),
            ExecutionError::StoreUnavailable => f.write_str("store lock poisoned"),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<CompileError> for ExecutionError {
    fn from(value: CompileError) -> Self {
        ExecutionError::Compile(value)
    }
}

impl From<ConversionError> for ExecutionError {
    fn from(value: ConversionError) -> Self {
        ExecutionError::Conversion(value)
    }
}
