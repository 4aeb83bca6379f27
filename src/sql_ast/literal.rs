use ordered_float::NotNan;
use serde_json::Value;
use std::fmt::{self, Display};

use crate::types::ValueKind;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(NotNan<f64>),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn kind(&self) -> ValueKind {
        match self {
            Literal::String(_) => ValueKind::String,
            Literal::Int(_) => ValueKind::Int,
            Literal::Float(_) => ValueKind::Float,
            Literal::Bool(_) => ValueKind::Bool,
            Literal::Null => ValueKind::Null,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Int(i) => Value::from(*i),
            Literal::Float(f) => Value::from(f.into_inner()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }

    /// Inverse of [`Literal::to_value`]; arrays, objects and NaN have no literal form.
    pub fn from_value(value: &Value) -> Option<Literal> {
        match value {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Literal::Int(i)),
                None => n.as_f64().and_then(|f| NotNan::new(f).ok()).map(Literal::Float),
            },
            Value::String(s) => Some(Literal::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self { Literal::Int(value) }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self { Literal::Int(value.into()) }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self { Literal::Bool(value) }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self { Literal::String(value.to_string()) }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(n) => write!(f, "{}", n.into_inner()),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "NULL"),
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(_) => write!(f, "String({})", self),
            Literal::Int(_) => write!(f, "Int({})", self),
            Literal::Float(_) => write!(f, "Float({})", self),
            Literal::Bool(_) => write!(f, "Bool({})", self),
            Literal::Null => write!(f, "Null"),
        }
    }
}
