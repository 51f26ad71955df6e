use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Foreign-key graph over the table registry, used to pick and order the
/// tables a partial `init` or `schema` run works on
pub struct DependencyResolver {
    /// table -> tables it references
    parents: HashMap<&'static str, HashSet<&'static str>>,
    /// table -> tables referencing it
    children: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut parents: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut children: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in ALL_TABLES {
            let refs = table.dependencies();
            for parent in &refs {
                children.entry(*parent).or_default().insert(table.name);
            }
            parents.insert(table.name, refs);
        }

        Self { parents, children }
    }

    /// The requested tables plus every table they reference, directly or not,
    /// parents first
    pub fn resolve_includes(&self, requested: &[&str]) -> Result<Vec<&'static TableSchema>, String> {
        let mut wanted: HashSet<&'static str> = HashSet::new();
        let mut pending: Vec<&'static str> = Vec::with_capacity(requested.len());
        for name in requested {
            pending.push(known(name)?);
        }

        while let Some(name) = pending.pop() {
            if wanted.insert(name) {
                if let Some(refs) = self.parents.get(name) {
                    pending.extend(refs.iter().copied());
                }
            }
        }

        self.ordered(&wanted)
    }

    /// Every table except the excluded ones and anything that depends on them
    pub fn resolve_excludes(&self, excluded: &[&str]) -> Result<Vec<&'static TableSchema>, String> {
        let mut dropped: HashSet<&'static str> = HashSet::new();
        for name in excluded {
            let name = known(name)?;
            dropped.insert(name);
            dropped.extend(self.dependents_of(name));
        }

        let kept: HashSet<&'static str> = ALL_TABLES
            .iter()
            .map(|t| t.name)
            .filter(|name| !dropped.contains(name))
            .collect();

        self.ordered(&kept)
    }

    /// All tables whose rows can be removed by a cascading delete on `name`, sorted
    pub fn dependents_of(&self, name: &str) -> Vec<&'static str> {
        let mut found: BTreeSet<&'static str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            for child in self.children.get(current).into_iter().flatten() {
                if *child != name && found.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }

        found.into_iter().collect()
    }

    /// Return all tables in dependency order
    pub fn all_tables_ordered(&self) -> Vec<&'static TableSchema> {
        ALL_TABLES.to_vec()
    }

    /// Kahn's algorithm over the selected tables. Ties go to the table that
    /// comes first in the registry so the output is stable.
    fn ordered(&self, selected: &HashSet<&'static str>) -> Result<Vec<&'static TableSchema>, String> {
        let mut waiting_on: HashMap<&'static str, usize> = selected
            .iter()
            .map(|name| {
                let open = self
                    .parents
                    .get(name)
                    .map(|refs| refs.iter().filter(|p| *p != name && selected.contains(*p)).count())
                    .unwrap_or(0);
                (*name, open)
            })
            .collect();

        let mut result = Vec::with_capacity(selected.len());
        while result.len() < selected.len() {
            let next = ALL_TABLES
                .iter()
                .find(|t| waiting_on.get(t.name) == Some(&0))
                .copied();
            let Some(table) = next else {
                let mut stuck: Vec<_> = waiting_on.keys().copied().collect();
                stuck.sort_unstable();
                return Err(format!("Circular dependency between: {}", stuck.join(", ")));
            };

            waiting_on.remove(table.name);
            for child in self.children.get(table.name).into_iter().flatten() {
                if let Some(open) = waiting_on.get_mut(child) {
                    *open -= 1;
                }
            }
            result.push(table);
        }

        Ok(result)
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn known(name: &str) -> Result<&'static str, String> {
    get_table(name)
        .map(|t| t.name)
        .ok_or_else(|| format!("Unknown table: {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&TableSchema]) -> Vec<&'static str> {
        tables.iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_include_loading_pulls_parents_first() {
        let resolver = DependencyResolver::new();
        let tables = resolver.resolve_includes(&["itemloading"]).unwrap();
        assert_eq!(names(&tables), vec!["itemtypes", "items", "itemloading"]);
    }

    #[test]
    fn test_include_product_loading() {
        let resolver = DependencyResolver::new();
        let tables = resolver
            .resolve_includes(&["productloading", "itemcharacteristics"])
            .unwrap();
        assert_eq!(
            names(&tables),
            vec!["itemtypes", "items", "itemcharacteristics", "productloading"]
        );
    }

    #[test]
    fn test_exclude_items_drops_every_dependent() {
        let resolver = DependencyResolver::new();
        let tables = resolver.resolve_excludes(&["items"]).unwrap();
        assert_eq!(names(&tables), vec!["itemtypes"]);
    }

    #[test]
    fn test_dependents_of_itemtypes() {
        let resolver = DependencyResolver::new();
        assert_eq!(
            resolver.dependents_of("itemtypes"),
            vec![
                "item_product_map",
                "itemcharacteristics",
                "itemloading",
                "items",
                "productloading",
            ]
        );
        assert!(resolver.dependents_of("itemloading").is_empty());
    }

    #[test]
    fn test_unknown_table() {
        let resolver = DependencyResolver::new();
        assert!(resolver.resolve_includes(&["no_such_table"]).is_err());
        assert!(resolver.resolve_excludes(&["no_such_table"]).is_err());
    }

    #[test]
    fn test_all_tables_ordered_respects_references() {
        let resolver = DependencyResolver::new();
        let ordered = resolver.all_tables_ordered();
        for (pos, table) in ordered.iter().enumerate() {
            for parent in table.dependencies() {
                let parent_pos = ordered.iter().position(|t| t.name == parent).unwrap();
                assert!(parent_pos < pos, "{} must come before {}", parent, table.name);
            }
        }
    }
}
