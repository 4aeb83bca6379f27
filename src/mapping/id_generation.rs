use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How identifiers are obtained for newly persisted entities.
///
/// - `Assigned`: the application supplies the id.
/// - `Sequence`: incrementing integers, starting after the largest id seen.
/// - `Uuid`: random v4 UUID strings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum IdGeneration {
    #[default]
    Assigned,
    Sequence,
    Uuid,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IdGenerator {
    pub generation: IdGeneration,
    current: Option<u64>,
}

impl IdGenerator {
    pub fn new(generation: IdGeneration) -> Self {
        Self { generation, current: None }
    }

    /// Record an id supplied by the caller so the sequence never hands it out.
    pub fn observe(&mut self, id: &Value) {
        if let (IdGeneration::Sequence, Some(n)) = (self.generation, id.as_u64()) {
            if self.current.is_none_or(|c| n > c) {
                self.current = Some(n);
            }
        }
    }
}

impl Iterator for IdGenerator {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.generation {
            IdGeneration::Assigned => None,
            IdGeneration::Uuid => Some(Value::String(Uuid::new_v4().to_string())),
            IdGeneration::Sequence => {
                // exhausted at u64::MAX
                let next = match self.current {
                    Some(id) => id.checked_add(1)?,
                    None => 1,
                };
                self.current = Some(next);
                Some(Value::from(next))
            }
        }
    }
}
