// src/graph/model.rs

use std::fmt;

use crate::types::StateStatus;

/// Shape convention expected by downstream renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    /// Standard rounded node.
    Rounded,
    /// Decision shape, used for Choice states.
    Diamond,
}

/// Status-derived style class attached to each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleClass {
    NotStarted,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl StyleClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleClass::NotStarted => "notStarted",
            StyleClass::Running => "running",
            StyleClass::Completed => "completed",
            StyleClass::Failed => "failed",
            StyleClass::Aborted => "aborted",
        }
    }
}

impl From<StateStatus> for StyleClass {
    fn from(status: StateStatus) -> Self {
        match status {
            StateStatus::NotStarted => StyleClass::NotStarted,
            StateStatus::Running => StyleClass::Running,
            StateStatus::Completed => StyleClass::Completed,
            StateStatus::Failed => StyleClass::Failed,
            StateStatus::Aborted => StyleClass::Aborted,
        }
    }
}

impl fmt::Display for StyleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderNode {
    pub id: String,
    /// Display label: the unmodified state name.
    pub label: String,
    pub shape: NodeShape,
    pub style: StyleClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEdge {
    pub from: String,
    pub to: String,
}

/// Renderable graph for one (definition, status) pair.
///
/// Recomputed wholesale whenever status changes; never patched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Style of the node with the given id.
    pub fn style_of(&self, id: &str) -> Option<StyleClass> {
        self.node(id).map(|n| n.style)
    }

    /// Outgoing edge targets of `id`, in emission order.
    pub fn targets_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to.as_str())
            .collect()
    }

    /// blake3 digest (hex) of the diagram text.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.to_mermaid().as_bytes())
            .to_hex()
            .to_string()
    }
}
