use serde_json::Value;

pub struct Helpers;

impl Helpers {
    // NULLS LAST comparator helper (ascending flag)
    pub fn cmp_json_for_sort(a: &Value, b: &Value, ascending: bool) -> std::cmp::Ordering {
        use std::cmp::Ordering::*;
        use serde_json::Value::*;
        let ord = match (a, b) {
            (Null, Null) => return Equal,
            // nulls sort last in either direction
            (Null, _) => return Greater,
            (_, Null) => return Less,
            (Bool(x), Bool(y)) => x.cmp(y),
            (Number(x), Number(y)) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Equal),
                _ => Equal,
            },
            (String(x), String(y)) => x.cmp(y),
            (Array(_), Array(_)) | (Object(_), Object(_)) => a.to_string().cmp(&b.to_string()),
            (lhs, rhs) => Self::type_rank(lhs).cmp(&Self::type_rank(rhs)),
        };
        if ascending { ord } else { ord.reverse() }
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0, Value::Bool(_) => 1, Value::Number(_) => 2, Value::String(_) => 3,
            Value::Array(_) => 4, Value::Object(_) => 5
        }
    }
}
