// src/graph/mod.rs

//! Graph Builder: turns a workflow definition plus per-state status into a
//! renderable directed graph.
//!
//! - [`builder`] holds the pure `build_graph` pass.
//! - [`node_id`] sanitizes state names into unique diagram node ids.
//! - [`model`] defines the node/edge/style types.
//! - [`mermaid`] emits the graph as Mermaid flowchart text.

pub mod builder;
pub mod mermaid;
pub mod model;
pub mod node_id;

pub use builder::{build_graph, build_graph_from_json};
pub use model::{NodeShape, RenderEdge, RenderGraph, RenderNode, StyleClass};
pub use node_id::{NodeIdAllocator, sanitize};
