use serde::{Deserialize, Serialize};

/// Options that shape how statements are compiled and executed.
///
/// - `max_query_depth` bounds sub-query nesting; the root block is depth 0.
/// - `prune_columns` makes scans materialize only the columns a statement references.
/// - `alias_stem_length` is how many letters of the entity name start a
///   generated SQL alias (`Employee` -> `e1_0`); digits are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_query_depth: usize,
    pub prune_columns: bool,
    pub alias_stem_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_query_depth: 8, prune_columns: true, alias_stem_length: 1 }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_max_query_depth(mut self, depth: usize) -> Self {
        self.max_query_depth = depth;
        self
    }

    pub fn with_prune_columns(mut self, prune: bool) -> Self {
        self.prune_columns = prune;
        self
    }

    pub fn with_alias_stem_length(mut self, length: usize) -> Self {
        self.alias_stem_length = length;
        self
    }
}
