use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::sql_ast::{ComparisonOperator, Expression, FunctionCall, Literal, Truth};

pub struct Eval;

impl Eval {
    /// Evaluate against a row keyed by `alias.column`; missing columns read as null.
    pub fn eval_expression(expr: &Expression, row: &Map<String, Value>) -> Value {
        match expr {
            Expression::Literal(l) => match l {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Self::json_i(*i),
                Literal::Float(f) => Self::json_f(f.into_inner()),
                Literal::String(s) => Value::String(s.clone()),
            },
            Expression::Column(c) => row.get(&c.row_key()).cloned().unwrap_or(Value::Null),
            Expression::Function(f) => Self::eval_function(f, row),
        }
    }

    fn eval_function(f: &FunctionCall, row: &Map<String, Value>) -> Value {
        let args: Vec<Value> = f.args.iter().map(|a| Self::eval_expression(a, row)).collect();
        match (f.name.as_str(), args.as_slice()) {
            ("upper", [Value::String(s)]) => Value::String(s.to_uppercase()),
            ("lower", [Value::String(s)]) => Value::String(s.to_lowercase()),
            ("trim", [Value::String(s)]) => Value::String(s.trim().to_string()),
            ("length", [Value::String(s)]) => Self::json_i(s.chars().count() as i64),
            ("abs", [Value::Number(n)]) => match n.as_i64() {
                Some(i) => Self::json_i(i.abs()),
                None => n.as_f64().map(|x| Self::json_f(x.abs())).unwrap_or(Value::Null),
            },
            ("coalesce", values) => values.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    pub fn compare3(l: &Value, op: ComparisonOperator, r: &Value) -> Truth {
        if l.is_null() || r.is_null() { return Truth::Unknown; }
        let ord = match (l, r) {
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => match op {
                ComparisonOperator::Eq | ComparisonOperator::NotEq => Some(a.cmp(b)),
                _ => None,
            },
            _ => None,
        };
        let Some(ord) = ord else { return Truth::Unknown };
        let hit = match op {
            ComparisonOperator::Eq => ord == Ordering::Equal,
            ComparisonOperator::NotEq => ord != Ordering::Equal,
            ComparisonOperator::Lt => ord == Ordering::Less,
            ComparisonOperator::LtEq => ord != Ordering::Greater,
            ComparisonOperator::Gt => ord == Ordering::Greater,
            ComparisonOperator::GtEq => ord != Ordering::Less,
        };
        Truth::from(hit)
    }

    pub fn like3(value: &Value, pattern: &Value) -> Truth {
        match (value, pattern) {
            (Value::String(s), Value::String(p)) => Truth::from(Self::eval_like(s, p)),
            _ => Truth::Unknown,
        }
    }

    // % -> .*  _ -> .  everything else literal
    fn eval_like(value: &str, pattern: &str) -> bool {
        let mut regex = String::from("^");
        let mut buf = [0u8; 4];
        for ch in pattern.chars() {
            match ch {
                '%' => regex.push_str(".*"),
                '_' => regex.push('.'),
                c => regex.push_str(&regex::escape(c.encode_utf8(&mut buf))),
            }
        }
        regex.push('$');
        regex::Regex::new(&regex).map(|re| re.is_match(value)).unwrap_or(false)
    }

    pub fn value_equal(a: &Value, b: &Value) -> bool {
        use serde_json::Value::*;
        match (a, b) {
            (Null, Null) => true,
            (Bool(x), Bool(y)) => x == y,
            (Number(x), Number(y)) => x.as_f64() == y.as_f64(),
            (String(x), String(y)) => x == y,
            _ => false,
        }
    }

    fn json_i(i: i64) -> Value { Value::Number(serde_json::Number::from(i)) }
    fn json_f(f: f64) -> Value { serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null) }
}
