use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse classification of the values that flow through the engine.
///
/// The same vocabulary describes the domain side of an attribute (what the
/// application sees) and the stored side of a column (what the store holds);
/// an attribute converter maps between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// JSON null
    Null,
    /// Boolean
    Bool,
    /// Integer number
    Int,
    /// Floating-point number
    Float,
    /// String
    String,
    /// JSON object (map)
    Object,
    /// JSON array
    Array,
}

impl ValueKind {
    /// Classify a serde_json `Value`.
    pub fn of_value(v: &Value) -> ValueKind {
        match v {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    ValueKind::Int
                } else {
                    ValueKind::Float
                }
            }
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Promote two kinds to a common representative.
    ///
    /// `Int` + `Float` -> `Float`. For different non-numeric kinds the left-hand
    /// kind wins unless it is `Null`.
    pub fn promote(a: ValueKind, b: ValueKind) -> ValueKind {
        use ValueKind::*;
        if a == b { return a; }
        match (a, b) {
            (Int, Float) | (Float, Int) => Float,
            (x, y) => if x == Null { y } else { x },
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }

    /// Whether a value of kind `other` can be stored where `self` is expected.
    pub fn accepts(&self, other: ValueKind) -> bool {
        *self == other
            || other == ValueKind::Null
            || (*self == ValueKind::Float && other == ValueKind::Int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_numbers_by_shape() {
        assert_eq!(ValueKind::of_value(&json!(3)), ValueKind::Int);
        assert_eq!(ValueKind::of_value(&json!(3.5)), ValueKind::Float);
        assert_eq!(ValueKind::of_value(&json!(null)), ValueKind::Null);
    }

    #[test]
    fn promotion_prefers_float_and_skips_null() {
        assert_eq!(ValueKind::promote(ValueKind::Int, ValueKind::Float), ValueKind::Float);
        assert_eq!(ValueKind::promote(ValueKind::Null, ValueKind::String), ValueKind::String);
        assert_eq!(ValueKind::promote(ValueKind::Bool, ValueKind::String), ValueKind::Bool);
    }

    #[test]
    fn float_accepts_int_but_not_the_reverse() {
        assert!(ValueKind::Float.accepts(ValueKind::Int));
        assert!(!ValueKind::Int.accepts(ValueKind::Float));
        assert!(ValueKind::String.accepts(ValueKind::Null));
    }
}
