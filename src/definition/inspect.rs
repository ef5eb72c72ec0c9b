// src/definition/inspect.rs

//! Structural diagnostics for a parsed definition.
//!
//! Nothing here rejects a definition: the graph builder renders whatever it is
//! given. The report exists so callers can log suspicious definitions.

use std::collections::{BTreeMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;

use crate::definition::model::{StateName, WorkflowDefinition};
use crate::graph::node_id::sanitize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionReport {
    /// `(from, to)` transitions whose target is not a state of the definition.
    pub dangling: Vec<(StateName, StateName)>,
    /// `StartAt` names a state that does not exist.
    pub missing_start: Option<StateName>,
    /// States not reachable from `StartAt`, in definition order.
    pub unreachable: Vec<StateName>,
    /// Pairs of distinct state names that sanitize to the same node id.
    pub id_collisions: Vec<(StateName, StateName)>,
}

impl DefinitionReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
            && self.missing_start.is_none()
            && self.unreachable.is_empty()
            && self.id_collisions.is_empty()
    }
}

pub fn inspect(definition: &WorkflowDefinition) -> DefinitionReport {
    let mut report = DefinitionReport::default();

    // Edge direction: state -> transition target.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in definition.state_names() {
        graph.add_node(name);
    }

    for (name, descriptor) in definition.states.iter() {
        for target in descriptor.targets() {
            if graph.contains_node(target) {
                graph.add_edge(name.as_str(), target, ());
            } else {
                report.dangling.push((name.clone(), target.to_string()));
            }
        }
    }

    match definition.start_at.as_deref() {
        Some(start) if graph.contains_node(start) => {
            let mut reached: HashSet<&str> = HashSet::new();
            let mut dfs = Dfs::new(&graph, start);
            while let Some(node) = dfs.next(&graph) {
                reached.insert(node);
            }
            report.unreachable = definition
                .state_names()
                .filter(|name| !reached.contains(name))
                .map(str::to_string)
                .collect();
        }
        Some(start) => report.missing_start = Some(start.to_string()),
        None => {}
    }

    let mut first_by_id: BTreeMap<String, &str> = BTreeMap::new();
    for name in definition.state_names() {
        let id = sanitize(name);
        match first_by_id.get(&id) {
            Some(first) => report
                .id_collisions
                .push((first.to_string(), name.to_string())),
            None => {
                first_by_id.insert(id, name);
            }
        }
    }

    report
}
