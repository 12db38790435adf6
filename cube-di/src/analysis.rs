//! Static analysis of definition graphs
//!
//! Walks definition references without instantiating anything, so a
//! configuration can be checked for dangling references, missing parameters
//! and cycles before the first `build`.

use crate::argument::{Argument, DEFINITION_SIGIL, PARAMETER_SIGIL};
use crate::config::ConfigStore;
use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::registry::ClassRegistry;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Result of analysing one definition
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DependencyAnalysis {
    /// Whether a reference cycle is reachable
    pub has_cycles: bool,
    /// First cycle found, starting and ending with the same id
    pub cycle: Option<Vec<String>>,
    /// Longest chain of definition references below the root
    pub dependency_depth: usize,
    /// Every reachable definition, in the order first referenced
    pub transitive_deps: Vec<String>,
    /// Referenced definitions that do not exist
    pub missing_definitions: Vec<String>,
    /// Referenced parameter paths that do not exist
    pub missing_parameters: Vec<String>,
}

/// A problem found in a configuration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Issue {
    MissingDefinition { from: String, id: String },
    MissingParameter { from: String, path: String },
    Cycle { path: Vec<String> },
    UnknownClass { id: String, class: String },
    UnknownMethod { id: String, class: String, method: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingDefinition { from, id } => {
                write!(f, "{} references undefined definition {}{}", from, DEFINITION_SIGIL, id)
            }
            Issue::MissingParameter { from, path } => {
                write!(f, "{} references undefined parameter {}{}", from, PARAMETER_SIGIL, path)
            }
            Issue::Cycle { path } => write!(f, "reference cycle {}", path.join(" -> ")),
            Issue::UnknownClass { id, class } => write!(f, "{} uses unknown class {}", id, class),
            Issue::UnknownMethod { id, class, method } => {
                write!(f, "{} calls {} which does not exist in {}", id, method, class)
            }
        }
    }
}

/// Definition ids referenced by a definition, in declaration order
pub fn references(definition: &Definition) -> impl Iterator<Item = &str> {
    definition.arguments().filter_map(|argument| match argument {
        Argument::Definition(id) => Some(id.as_str()),
        _ => None,
    })
}

/// Parameter paths referenced by a definition, in declaration order
pub fn parameter_references(definition: &Definition) -> impl Iterator<Item = &str> {
    definition.arguments().filter_map(|argument| match argument {
        Argument::Parameter(path) => Some(path.as_str()),
        _ => None,
    })
}

/// Analyse the definition `id` and everything it references
pub fn analyze(store: &dyn ConfigStore, id: &str) -> DiResult<DependencyAnalysis> {
    if !store.has_definition(id) {
        return Err(DiError::DefinitionNotFound { id: id.to_string() });
    }

    let walker = Walker { store };
    let mut analysis = DependencyAnalysis::default();

    // Detect cycles first
    let mut visited = FxHashSet::default();
    let mut stack = Vec::new();
    analysis.cycle = walker.find_cycle(id, &mut visited, &mut stack);
    analysis.has_cycles = analysis.cycle.is_some();

    // Depth is meaningless with a cycle
    if !analysis.has_cycles {
        analysis.dependency_depth = walker.depth(id, &mut FxHashMap::default());
    }

    walker.collect(id, &mut analysis);
    Ok(analysis)
}

/// Check every definition in the store
///
/// Issues are sorted and each cycle is reported once.
pub fn check(store: &dyn ConfigStore) -> Vec<Issue> {
    let walker = Walker { store };
    let mut ids = store.definition_ids();
    ids.sort_unstable();

    let mut issues = Vec::new();
    let mut seen_cycles: FxHashSet<Vec<String>> = FxHashSet::default();

    for id in ids {
        let Some(definition) = store.definition(id) else {
            continue;
        };

        for target in references(definition) {
            if !store.has_definition(target) {
                issues.push(Issue::MissingDefinition {
                    from: id.to_string(),
                    id: target.to_string(),
                });
            }
        }
        for path in parameter_references(definition) {
            if !store.has_parameter(path) {
                issues.push(Issue::MissingParameter {
                    from: id.to_string(),
                    path: path.to_string(),
                });
            }
        }

        let mut visited = FxHashSet::default();
        if let Some(cycle) = walker.find_cycle(id, &mut visited, &mut Vec::new()) {
            let mut members: Vec<String> = cycle[..cycle.len() - 1].to_vec();
            members.sort_unstable();
            if seen_cycles.insert(members) {
                issues.push(Issue::Cycle { path: cycle });
            }
        }
    }

    issues.sort();
    issues
}

/// Check class names and method calls against a registry
pub fn check_classes(store: &dyn ConfigStore, registry: &ClassRegistry) -> Vec<Issue> {
    let mut ids = store.definition_ids();
    ids.sort_unstable();

    let mut issues = Vec::new();
    for id in ids {
        let Some(definition) = store.definition(id) else {
            continue;
        };
        if !registry.contains(&definition.class) {
            issues.push(Issue::UnknownClass {
                id: id.to_string(),
                class: definition.class.clone(),
            });
            continue;
        }
        for call in definition.calls.iter().flatten() {
            if registry.class_has_method(&definition.class, &call.method) == Some(false) {
                issues.push(Issue::UnknownMethod {
                    id: id.to_string(),
                    class: definition.class.clone(),
                    method: call.method.clone(),
                });
            }
        }
    }
    issues
}

struct Walker<'a> {
    store: &'a dyn ConfigStore,
}

impl Walker<'_> {
    /// Depth-first search keeping the current path as the recursion stack
    fn find_cycle(
        &self,
        node: &str,
        visited: &mut FxHashSet<String>,
        stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        // Already on the current path: found a cycle
        if let Some(start) = stack.iter().position(|open| open == node) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(node.to_string());
            return Some(cycle);
        }

        if !visited.insert(node.to_string()) {
            return None;
        }

        let definition = self.store.definition(node)?;
        stack.push(node.to_string());
        for target in references(definition) {
            if self.store.has_definition(target) {
                if let Some(cycle) = self.find_cycle(target, visited, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        None
    }

    /// Longest reference chain below `node`; callers rule out cycles first
    fn depth(&self, node: &str, memo: &mut FxHashMap<String, usize>) -> usize {
        if let Some(&depth) = memo.get(node) {
            return depth;
        }

        let depth = match self.store.definition(node) {
            Some(definition) => references(definition)
                .filter(|target| self.store.has_definition(target))
                .map(|target| self.depth(target, memo) + 1)
                .max()
                .unwrap_or(0),
            None => 0,
        };

        memo.insert(node.to_string(), depth);
        depth
    }

    /// Gather reachable definitions and everything missing along the way
    fn collect(&self, root: &str, analysis: &mut DependencyAnalysis) {
        let mut visited = FxHashSet::default();
        visited.insert(root.to_string());
        let mut pending = vec![root.to_string()];

        while let Some(node) = pending.pop() {
            let Some(definition) = self.store.definition(&node) else {
                continue;
            };

            for path in parameter_references(definition) {
                if !self.store.has_parameter(path) && !analysis.missing_parameters.iter().any(|p| p == path) {
                    analysis.missing_parameters.push(path.to_string());
                }
            }

            let mut next = Vec::new();
            for target in references(definition) {
                if !visited.insert(target.to_string()) {
                    continue;
                }
                if self.store.has_definition(target) {
                    analysis.transitive_deps.push(target.to_string());
                    next.push(target.to_string());
                } else {
                    analysis.missing_definitions.push(target.to_string());
                }
            }
            // Depth-first, visiting references in declaration order
            pending.extend(next.into_iter().rev());
        }
    }
}
