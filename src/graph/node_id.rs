// src/graph/node_id.rs

//! Node ids for the diagram syntax.

use std::collections::{HashMap, HashSet};

use tracing::warn;

/// Make a state name safe to use as a diagram node id.
///
/// Spaces and hyphens become `_`, parentheses are dropped.
pub fn sanitize(name: &str) -> String {
    name.replace([' ', '-'], "_").replace(['(', ')'], "")
}

/// Assigns each state a unique node id, in definition order.
///
/// The first state to claim a sanitized id keeps it; later states whose name
/// sanitizes to an id already taken get `<id>_2`, `<id>_3`, ... so two states
/// are never merged into one node.
#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    by_name: HashMap<String, String>,
    taken: HashSet<String>,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for `name`. Allocating the same name twice returns the
    /// id from the first call.
    pub fn allocate(&mut self, name: &str) -> &str {
        if !self.by_name.contains_key(name) {
            let base = sanitize(name);
            let mut id = base.clone();
            let mut suffix = 2;
            while self.taken.contains(&id) {
                id = format!("{base}_{suffix}");
                suffix += 1;
            }
            if id != base {
                warn!(
                    state = %name,
                    node_id = %base,
                    assigned = %id,
                    "state name collides with another after sanitizing; disambiguating"
                );
            }
            self.taken.insert(id.clone());
            self.by_name.insert(name.to_string(), id);
        }
        &self.by_name[name]
    }

    /// Id for `name`: the allocated one if any, else its plain sanitized form
    /// (transition targets that are not states of the definition).
    pub fn resolve(&self, name: &str) -> String {
        self.by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| sanitize(name))
    }
}
