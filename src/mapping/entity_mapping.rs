use indexmap::IndexMap;

use crate::{mapping::{AttributeMapping, BasicAttribute, EmbeddedAttribute, IdGeneration}, types::ValueKind};

/// How one entity type is laid out in its table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMapping {
    pub name: String,
    pub table: String,
    pub id_attribute: String,
    pub id_generation: IdGeneration,
    /// all attributes in declaration order, the id included
    pub attributes: IndexMap<String, AttributeMapping>,
}

impl EntityMapping {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            id_attribute: "id".to_string(),
            id_generation: IdGeneration::Assigned,
            attributes: IndexMap::new(),
        }
    }

    pub fn id(mut self, name: &str, kind: ValueKind, generation: IdGeneration) -> Self {
        self.id_attribute = name.to_string();
        self.id_generation = generation;
        self.attributes.shift_insert(0, name.to_string(), AttributeMapping::Basic(BasicAttribute::new(name, kind)));
        self
    }

    pub fn basic(self, name: &str, column: &str, kind: ValueKind) -> Self {
        self.attribute(name, AttributeMapping::Basic(BasicAttribute::new(column, kind)))
    }

    pub fn embedded(self, name: &str, embedded: EmbeddedAttribute) -> Self {
        self.attribute(name, AttributeMapping::Embedded(embedded))
    }

    pub fn transient(self, name: &str, kind: ValueKind) -> Self {
        self.attribute(name, AttributeMapping::Transient { kind })
    }

    pub fn attribute(mut self, name: &str, mapping: AttributeMapping) -> Self {
        self.attributes.insert(name.to_string(), mapping);
        self
    }

    pub fn id_mapping(&self) -> Option<&BasicAttribute> {
        self.attributes.get(&self.id_attribute).and_then(AttributeMapping::as_basic)
    }

    /// Find the mapping at a dotted attribute path such as `["name", "first"]`.
    pub fn attribute_at(&self, path: &[String]) -> Option<&AttributeMapping> {
        let (first, rest) = path.split_first()?;
        let mut current = self.attributes.get(first)?;
        for segment in rest {
            current = match current {
                AttributeMapping::Embedded(e) => e.attributes.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Every leaf attribute (basic or transient) with its full path, embedded
    /// attributes expanded in place.
    pub fn flatten(&self) -> Vec<(Vec<String>, &AttributeMapping)> {
        let mut out = Vec::new();
        Self::flatten_into(&self.attributes, &mut Vec::new(), &mut out);
        out
    }

    pub(crate) fn flatten_into<'a>(
        attributes: &'a IndexMap<String, AttributeMapping>,
        prefix: &mut Vec<String>,
        out: &mut Vec<(Vec<String>, &'a AttributeMapping)>,
    ) {
        for (name, mapping) in attributes {
            prefix.push(name.clone());
            match mapping {
                AttributeMapping::Embedded(e) => Self::flatten_into(&e.attributes, prefix, out),
                leaf => out.push((prefix.clone(), leaf)),
            }
            prefix.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> EntityMapping {
        EntityMapping::new("Person", "PERSON")
            .basic("age", "age", ValueKind::Int)
            .id("id", ValueKind::Int, IdGeneration::Sequence)
            .embedded("name", EmbeddedAttribute::new()
                .basic("first", "first_name", ValueKind::String)
                .basic("last", "last_name", ValueKind::String))
            .transient("nickname", ValueKind::String)
    }

    #[test]
    fn id_is_always_the_first_attribute() {
        let p = person();
        assert_eq!(p.attributes.keys().next().map(String::as_str), Some("id"));
        assert_eq!(p.id_mapping().map(|b| b.column.as_str()), Some("id"));
    }

    #[test]
    fn flatten_expands_embedded_attributes_in_place() {
        let p = person();
        let paths: Vec<String> = p.flatten().into_iter().map(|(path, _)| path.join(".")).collect();
        assert_eq!(paths, vec!["id", "age", "name.first", "name.last", "nickname"]);
    }

    #[test]
    fn attribute_at_walks_into_embedded() {
        let p = person();
        let path = vec!["name".to_string(), "last".to_string()];
        let leaf = p.attribute_at(&path).and_then(AttributeMapping::as_basic).unwrap();
        assert_eq!(leaf.column, "last_name");
        assert!(p.attribute_at(&["age".to_string(), "x".to_string()]).is_none());
    }
}
