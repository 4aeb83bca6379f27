use std::{collections::HashMap, sync::Arc};

use crate::{
    mapping::BasicAttribute,
    sql_ast::Expression,
    types::{AttributeConverter, BooleanIntConverter, ValueKind},
};

/// Converter registry plus the typing rules for SQL expressions.
///
/// Explicitly named converters win over auto-applied ones; an attribute that
/// disables conversion gets neither.
#[derive(Debug, Clone, Default)]
pub struct TypeConfiguration {
    converters: HashMap<String, Arc<dyn AttributeConverter>>,
    /// domain kind -> converter name
    auto_apply: HashMap<ValueKind, String>,
}

impl TypeConfiguration {
    pub fn new() -> Self {
        Self::default().with_converter(Arc::new(BooleanIntConverter))
    }

    pub fn with_converter(mut self, converter: Arc<dyn AttributeConverter>) -> Self {
        self.register(converter);
        self
    }

    /// Register `converter` and apply it to every attribute of its domain kind.
    pub fn with_auto_applied(mut self, converter: Arc<dyn AttributeConverter>) -> Self {
        self.auto_apply.insert(converter.domain_kind(), converter.name().to_string());
        self.register(converter);
        self
    }

    pub fn register(&mut self, converter: Arc<dyn AttributeConverter>) {
        self.converters.insert(converter.name().to_string(), converter);
    }

    pub fn converter(&self, name: &str) -> Option<Arc<dyn AttributeConverter>> {
        self.converters.get(name).cloned()
    }

    /// Converter in effect for `attribute`. An explicit name that is not
    /// registered yields `Err(name)`.
    pub fn converter_for(&self, attribute: &BasicAttribute) -> Result<Option<Arc<dyn AttributeConverter>>, String> {
        if let Some(name) = &attribute.converter {
            return self.converter(name).map(Some).ok_or_else(|| name.clone());
        }
        if attribute.disable_conversion {
            return Ok(None);
        }
        Ok(self.auto_apply.get(&attribute.kind).and_then(|name| self.converter(name)))
    }

    /// Kind of the column backing `attribute`.
    pub fn stored_kind(&self, attribute: &BasicAttribute) -> ValueKind {
        match self.converter_for(attribute) {
            Ok(Some(c)) => c.stored_kind(),
            _ => attribute.kind,
        }
    }

    /// Kind an expression produces; `fallback` when nothing better is known.
    pub fn expressable_kind(&self, expression: &Expression, fallback: ValueKind) -> ValueKind {
        if let Some(kind) = expression.intrinsic_kind() {
            return kind;
        }
        match expression {
            Expression::Function(call) => {
                let args: Vec<ValueKind> = call.args.iter()
                    .map(|a| self.expressable_kind(a, ValueKind::Null))
                    .collect();
                Self::function_kind(&call.name, &args).unwrap_or(fallback)
            }
            _ => fallback,
        }
    }

    fn function_kind(name: &str, args: &[ValueKind]) -> Option<ValueKind> {
        match (name, args) {
            ("upper", [_]) | ("lower", [_]) | ("trim", [_]) => Some(ValueKind::String),
            ("length", [_]) => Some(ValueKind::Int),
            ("abs", [k]) if k.is_numeric() => Some(*k),
            ("coalesce", many) if !many.is_empty() => {
                Some(many.iter().copied().fold(ValueKind::Null, ValueKind::promote))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sql_ast::Literal, types::ScaledNumberConverter};

    fn config() -> TypeConfiguration {
        TypeConfiguration::new().with_auto_applied(Arc::new(ScaledNumberConverter::new(2)))
    }

    #[test]
    fn explicit_converter_beats_auto_apply() {
        let types = config();
        let active = BasicAttribute::new("active", ValueKind::Bool).converted_by("boolean_int");
        let salary = BasicAttribute::new("salary", ValueKind::Float);
        let rate = BasicAttribute::new("rate", ValueKind::Float).without_conversion();

        assert_eq!(types.converter_for(&active).unwrap().unwrap().name(), "boolean_int");
        assert_eq!(types.converter_for(&salary).unwrap().unwrap().name(), "scaled_number");
        assert!(types.converter_for(&rate).unwrap().is_none());
        assert_eq!(types.stored_kind(&salary), ValueKind::Int);
        assert_eq!(types.stored_kind(&rate), ValueKind::Float);
    }

    #[test]
    fn unknown_converter_name_is_reported() {
        let types = config();
        let attr = BasicAttribute::new("x", ValueKind::String).converted_by("nope");
        assert_eq!(types.converter_for(&attr).unwrap_err(), "nope");
    }

    #[test]
    fn function_kinds_follow_their_arguments() {
        let types = TypeConfiguration::new();
        let len = Expression::function("LENGTH", vec![Expression::column("p", "name", ValueKind::String)]);
        assert_eq!(types.expressable_kind(&len, ValueKind::Null), ValueKind::Int);

        let coalesce = Expression::function("coalesce", vec![
            Expression::column("p", "age", ValueKind::Int),
            Expression::Literal(Literal::Float(ordered_float::NotNan::new(1.5).unwrap())),
        ]);
        assert_eq!(types.expressable_kind(&coalesce, ValueKind::Null), ValueKind::Float);

        let unknown = Expression::function("soundex", vec![]);
        assert_eq!(types.expressable_kind(&unknown, ValueKind::String), ValueKind::String);
    }
}
