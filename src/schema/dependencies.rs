use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Resolves foreign key dependencies between tables
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in ALL_TABLES {
            let table_deps = table.dependencies();
            deps.insert(table.name, table_deps.clone());

            for dep in table_deps {
                reverse_deps.entry(dep).or_default().insert(table.name);
            }
        }

        Self { deps, reverse_deps }
    }

    /// All tables ordered so that every parent comes before its children
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let all: HashSet<&str> = ALL_TABLES.iter().map(|t| t.name).collect();
        self.topological_sort(&all)
    }

    /// Tables whose rows are removed, directly or transitively, when a row
    /// of `table` is deleted. Sorted by name.
    pub fn cascade_targets(&self, table: &str) -> Result<Vec<&'static str>, String> {
        if get_table(table).is_none() {
            return Err(format!("Unknown table: {}", table));
        }

        let mut reached: BTreeSet<&'static str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([table]);

        while let Some(name) = queue.pop_front() {
            if let Some(children) = self.reverse_deps.get(name) {
                for &child in children {
                    if reached.insert(child) {
                        queue.push_back(child);
                    }
                }
            }
        }

        Ok(reached.into_iter().collect())
    }

    /// Topological sort of tables by dependencies
    fn topological_sort(
        &self,
        included: &HashSet<&str>,
    ) -> Result<Vec<&'static TableSchema>, String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        // Walk in declaration order so the output is stable
        for table in ALL_TABLES {
            if included.contains(table.name) && !visited.contains(table.name) {
                self.visit(
                    table.name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        included: &HashSet<&'a str>,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            let mut ordered: Vec<&'static str> = deps.iter().copied().collect();
            ordered.sort_unstable();
            for dep in ordered {
                if dep != name && included.contains(dep) {
                    self.visit(dep, included, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(table) = get_table(name) {
            result.push(table);
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(names: &[&str], table: &str) -> usize {
        names.iter().position(|&n| n == table).unwrap()
    }

    #[test]
    fn test_creation_order_puts_parents_first() {
        let resolver = DependencyResolver::new();
        let tables = resolver.creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert_eq!(names.len(), ALL_TABLES.len());
        assert!(position(&names, "tournaments") < position(&names, "holes"));
        assert!(position(&names, "groups") < position(&names, "group_players"));
        assert!(position(&names, "holes") < position(&names, "scores"));
        assert!(position(&names, "players") < position(&names, "tournament_players"));
    }

    #[test]
    fn test_tournament_delete_cascades() {
        let resolver = DependencyResolver::new();
        let targets = resolver.cascade_targets("tournaments").unwrap();
        assert_eq!(
            targets,
            vec!["group_players", "groups", "holes", "scores", "tournament_players"]
        );
    }

    #[test]
    fn test_player_and_hole_cascades() {
        let resolver = DependencyResolver::new();
        assert_eq!(
            resolver.cascade_targets("players").unwrap(),
            vec!["group_players", "scores", "tournament_players"]
        );
        assert_eq!(resolver.cascade_targets("holes").unwrap(), vec!["scores"]);
        assert!(resolver.cascade_targets("app_settings").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_table_error() {
        let resolver = DependencyResolver::new();
        assert!(resolver.cascade_targets("nonexistent").is_err());
    }
}
