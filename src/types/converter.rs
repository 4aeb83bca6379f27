use std::fmt::Debug;

use indexmap::IndexMap;
use serde_json::Value;

use crate::types::{ConversionError, ValueKind};

/// Converts an attribute value between its domain form and the form kept in
/// the store.
///
/// Implementations must pass `Value::Null` through unchanged in both
/// directions; only non-null values are handed to the conversion logic.
pub trait AttributeConverter: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// kind of the value the application works with
    fn domain_kind(&self) -> ValueKind;

    /// kind of the value written to the column
    fn stored_kind(&self) -> ValueKind;

    fn to_database(&self, domain: &Value) -> Result<Value, ConversionError>;

    fn to_domain(&self, stored: &Value) -> Result<Value, ConversionError>;
}

/// Stores booleans as `0`/`1`.
#[derive(Debug, Default, Clone)]
pub struct BooleanIntConverter;

impl AttributeConverter for BooleanIntConverter {
    fn name(&self) -> &str { "boolean_int" }

    fn domain_kind(&self) -> ValueKind { ValueKind::Bool }

    fn stored_kind(&self) -> ValueKind { ValueKind::Int }

    fn to_database(&self, domain: &Value) -> Result<Value, ConversionError> {
        match domain {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::from(if *b { 1 } else { 0 })),
            other => ConversionError::new(self.name(), other, "expecting a boolean").err(),
        }
    }

    fn to_domain(&self, stored: &Value) -> Result<Value, ConversionError> {
        match stored {
            Value::Null => Ok(Value::Null),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
            other => ConversionError::new(
                self.name(),
                other,
                format!("unexpected boolean numeric; expecting null, 0 or 1, but found {other}"),
            ).err(),
        }
    }
}

/// Stores a decimal number as an integer scaled by `10^scale`
/// (e.g. money kept as cents).
#[derive(Debug, Clone)]
pub struct ScaledNumberConverter {
    pub scale: u32,
}

impl ScaledNumberConverter {
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }

    fn factor(&self) -> f64 {
        10f64.powi(self.scale as i32)
    }
}

impl AttributeConverter for ScaledNumberConverter {
    fn name(&self) -> &str { "scaled_number" }

    fn domain_kind(&self) -> ValueKind { ValueKind::Float }

    fn stored_kind(&self) -> ValueKind { ValueKind::Int }

    fn to_database(&self, domain: &Value) -> Result<Value, ConversionError> {
        match domain {
            Value::Null => Ok(Value::Null),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(Value::from((f * self.factor()).round() as i64)),
                None => ConversionError::new(self.name(), domain, "number out of range").err(),
            },
            other => ConversionError::new(self.name(), other, "expecting a number").err(),
        }
    }

    fn to_domain(&self, stored: &Value) -> Result<Value, ConversionError> {
        match stored {
            Value::Null => Ok(Value::Null),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::from(i as f64 / self.factor())),
                None => ConversionError::new(self.name(), stored, "expecting an integer column value").err(),
            },
            other => ConversionError::new(self.name(), other, "expecting a number").err(),
        }
    }
}

/// Maps a closed set of stored codes to domain names, e.g. `"M"` <-> `"MALE"`.
#[derive(Debug, Clone)]
pub struct CodeConverter {
    name: String,
    /// stored code -> domain value
    codes: IndexMap<String, String>,
}

impl CodeConverter {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), codes: IndexMap::new() }
    }

    pub fn with_code(mut self, stored: &str, domain: &str) -> Self {
        self.codes.insert(stored.to_string(), domain.to_string());
        self
    }
}

impl AttributeConverter for CodeConverter {
    fn name(&self) -> &str { &self.name }

    fn domain_kind(&self) -> ValueKind { ValueKind::String }

    fn stored_kind(&self) -> ValueKind { ValueKind::String }

    fn to_database(&self, domain: &Value) -> Result<Value, ConversionError> {
        match domain {
            Value::Null => Ok(Value::Null),
            Value::String(s) => self.codes.iter()
                .find(|(_, d)| *d == s)
                .map(|(code, _)| Value::String(code.clone()))
                .ok_or_else(|| ConversionError::new(&self.name, domain, format!("unknown value '{s}'"))),
            other => ConversionError::new(&self.name, other, "expecting a string").err(),
        }
    }

    fn to_domain(&self, stored: &Value) -> Result<Value, ConversionError> {
        match stored {
            Value::Null => Ok(Value::Null),
            Value::String(s) => self.codes.get(s)
                .map(|d| Value::String(d.clone()))
                .ok_or_else(|| ConversionError::new(
                    &self.name,
                    stored,
                    format!("unexpected code '{s}'; expecting one of {:?}", self.codes.keys().collect::<Vec<_>>()),
                )),
            other => ConversionError::new(&self.name, other, "expecting a string code").err(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_int_round_trips_and_rejects_unknown_numbers() {
        let c = BooleanIntConverter;
        assert_eq!(c.to_database(&json!(true)).unwrap(), json!(1));
        assert_eq!(c.to_domain(&json!(0)).unwrap(), json!(false));
        assert_eq!(c.to_domain(&Value::Null).unwrap(), Value::Null);

        let err = c.to_domain(&json!(5)).unwrap_err();
        assert_eq!(err.converter, "boolean_int");
        assert_eq!(err.value, json!(5));
        assert!(err.message.contains("expecting null, 0 or 1"));
    }

    #[test]
    fn scaled_number_rounds_to_the_nearest_unit() {
        let c = ScaledNumberConverter::new(2);
        // 267.89 * 100 is 26788.999.. in binary floating point
        assert_eq!(c.to_database(&json!(267.89)).unwrap(), json!(26789));
        assert_eq!(c.to_domain(&json!(26789)).unwrap(), json!(267.89));
        assert!(c.to_database(&json!("x")).is_err());
    }

    #[test]
    fn code_converter_rejects_codes_outside_the_table() {
        let c = CodeConverter::new("gender").with_code("M", "MALE").with_code("F", "FEMALE");
        assert_eq!(c.to_database(&json!("FEMALE")).unwrap(), json!("F"));
        assert_eq!(c.to_domain(&json!("M")).unwrap(), json!("MALE"));

        let err = c.to_domain(&json!("X")).unwrap_err();
        assert_eq!(err.converter, "gender");
        assert!(err.message.contains("unexpected code 'X'"));
    }
}
