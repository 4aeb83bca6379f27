use indexmap::IndexMap;

use crate::mapping::EntityMapping;

/// Registry of the entity mappings a query may refer to.
#[derive(Debug, Clone, Default)]
pub struct DomainModel {
    entities: IndexMap<String, EntityMapping>,
}

impl DomainModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntityMapping) -> Self {
        self.add_entity(entity);
        self
    }

    pub fn add_entity(&mut self, entity: EntityMapping) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }
}
