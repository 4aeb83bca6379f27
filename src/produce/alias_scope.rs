use indexmap::IndexMap;

use crate::{mapping::EntityMapping, sql_ast::TableReference};

#[derive(Debug, Clone)]
pub struct AliasEntry<'a> {
    pub entity: &'a EntityMapping,
    pub table: TableReference,
}

/// Domain aliases visible to one query block, chained to the enclosing
/// block's scope so correlated sub-queries can reach outer roots.
#[derive(Debug)]
pub struct AliasScope<'a> {
    entries: IndexMap<String, AliasEntry<'a>>,
    parent: Option<&'a AliasScope<'a>>,
}

impl<'a> AliasScope<'a> {
    pub fn new(parent: Option<&'a AliasScope<'a>>) -> Self {
        Self { entries: IndexMap::new(), parent }
    }

    pub fn register(&mut self, alias: &str, entity: &'a EntityMapping, table: TableReference) {
        self.entries.insert(alias.to_string(), AliasEntry { entity, table });
    }

    /// Innermost binding of `alias`.
    pub fn resolve(&self, alias: &str) -> Option<&AliasEntry<'a>> {
        match self.entries.get(alias) {
            Some(entry) => Some(entry),
            None => self.parent?.resolve(alias),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_alias_shadows_outer_and_outer_stays_reachable() {
        let emp = EntityMapping::new("Employee", "EMP");
        let dept = EntityMapping::new("Department", "DEPT");

        let mut outer = AliasScope::new(None);
        outer.register("e", &emp, TableReference::new("EMP", "e1_0"));
        outer.register("d", &dept, TableReference::new("DEPT", "d2_0"));

        let mut inner = AliasScope::new(Some(&outer));
        inner.register("e", &emp, TableReference::new("EMP", "e3_0"));

        assert_eq!(inner.resolve("e").unwrap().table.alias, "e3_0");
        assert_eq!(inner.resolve("d").unwrap().table.alias, "d2_0");
        assert!(inner.resolve("x").is_none());
    }
}
