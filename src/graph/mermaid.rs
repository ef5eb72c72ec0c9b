// src/graph/mermaid.rs

//! Mermaid flowchart emission.
//!
//! The header and class definitions are fixed; after them each node line is
//! followed by that node's outgoing edges, in graph order.

use std::collections::HashMap;
use std::fmt;

use crate::graph::model::{NodeShape, RenderEdge, RenderGraph, RenderNode};

const HEADER: [&str; 10] = [
    "graph TD",
    "    %% Node and edge styling",
    "    linkStyle default stroke:#333,stroke-width:2px;",
    "    %% Graph configuration",
    "    classDef default fill:#f9f9f9,stroke:#333,stroke-width:2px;",
    "    classDef running fill:#fff7e6,stroke:#ffab00,stroke-width:2px;",
    "    classDef completed fill:#e6f4ea,stroke:#34a853,stroke-width:2px;",
    "    classDef failed fill:#fce8e6,stroke:#ea4335,stroke-width:2px;",
    "    classDef notStarted fill:#f8f9fa,stroke:#dadce0,stroke-width:2px;",
    "    classDef aborted fill:#e0e0e0,stroke:#666666,stroke-width:2px;",
];

impl RenderGraph {
    /// Render as Mermaid flowchart text (lines joined by `\n`, no trailing
    /// newline).
    pub fn to_mermaid(&self) -> String {
        let mut lines: Vec<String> = HEADER.iter().map(|l| l.to_string()).collect();

        let mut outgoing: HashMap<&str, Vec<&RenderEdge>> = HashMap::new();
        for edge in &self.edges {
            outgoing.entry(edge.from.as_str()).or_default().push(edge);
        }

        for node in &self.nodes {
            lines.push(node_line(node));
            if let Some(edges) = outgoing.remove(node.id.as_str()) {
                lines.extend(edges.into_iter().map(edge_line));
            }
        }

        // Edges whose source is not a node of this graph; keep original order.
        lines.extend(
            self.edges
                .iter()
                .filter(|e| outgoing.contains_key(e.from.as_str()))
                .map(edge_line),
        );

        lines.join("\n")
    }
}

impl fmt::Display for RenderGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mermaid())
    }
}

fn node_line(node: &RenderNode) -> String {
    let label = escape_label(&node.label);
    match node.shape {
        NodeShape::Diamond => format!("    {}{{\"{}\"}}:::{}", node.id, label, node.style),
        NodeShape::Rounded => format!("    {}(\"{}\"):::{}", node.id, label, node.style),
    }
}

fn edge_line(edge: &RenderEdge) -> String {
    format!("    {} --> {}", edge.from, edge.to)
}

/// Double quotes would terminate the label; Mermaid accepts `#quot;`.
fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}
