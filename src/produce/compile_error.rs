use std::fmt::Display;

use crate::{sql_ast::Clause, types::ConversionError};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    UnknownEntity(String),
    UnknownAlias(String),
    UnknownAttribute { entity: String, path: String },
    UnknownConverter { attribute: String, converter: String },
    /// the path names an embedded value or the like where a single column is needed
    NotABasicAttribute { path: String, clause: Clause },
    /// the placeholder slot was requested before any real selection of the block
    PlaceholderBeforeSelection { query_block: usize },
    /// the block already owns its placeholder slot
    PlaceholderAlreadyResolved { query_block: usize },
    QueryTooDeep { max: usize },
    /// a literal could not be converted to its stored form
    Conversion(ConversionError),
    Other(String),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::UnknownEntity(name) => write!(f, "unknown entity '{name}'"),
            CompileError::UnknownAlias(alias) => write!(f, "unknown alias '{alias}'"),
            CompileError::UnknownAttribute { entity, path } => {
                write!(f, "entity '{entity}' has no attribute '{path}'")
            }
            CompileError::UnknownConverter { attribute, converter } => {
                write!(f, "attribute '{attribute}' names unregistered converter '{converter}'")
            }
            CompileError::NotABasicAttribute { path, clause } => {
                write!(f, "'{path}' does not map to a single column (in {clause})")
            }
            CompileError::PlaceholderBeforeSelection { query_block } => {
                write!(f, "query block {query_block}: placeholder selection requested before any selection was resolved")
            }
            CompileError::PlaceholderAlreadyResolved { query_block } => {
                write!(f, "query block {query_block}: placeholder selection already resolved")
            }
            CompileError::QueryTooDeep { max } => write!(f, "sub-queries nested deeper than {max} levels"),
            CompileError::Conversion(e) => write!(f, "{e}"),
            CompileError::Other(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ConversionError> for CompileError {
    fn from(value: ConversionError) -> Self {
        CompileError::Conversion(value)
    }
}
