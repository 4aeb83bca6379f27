use std::fmt::Display;

use serde_json::Value;

/// A value could not be converted between its stored and domain forms.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    /// name of the converter that rejected the value
    pub converter: String,
    pub value: Value,
    pub message: String,
}

impl ConversionError {
    pub fn new(converter: &str, value: &Value, message: impl Into<String>) -> Self {
        Self {
            converter: converter.to_string(),
            value: value.clone(),
            message: message.into(),
        }
    }

    pub fn err<T>(self) -> Result<T, ConversionError> {
        Err(self)
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConversionError[{}]: {} (value: {})",
            self.converter,
            self.message,
            self.value
        )
    }
}

impl std::error::Error for ConversionError {}
