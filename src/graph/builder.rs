// src/graph/builder.rs

use tracing::debug;

use crate::definition::{StatusMap, WorkflowDefinition};
use crate::errors::Result;
use crate::graph::model::{NodeShape, RenderEdge, RenderGraph, RenderNode, StyleClass};
use crate::graph::node_id::NodeIdAllocator;
use crate::types::ExecutionStatus;

/// Build the render graph for a definition and its current per-state status.
///
/// Pure: the same inputs always yield the same graph, with nodes and edges in
/// definition order.
///
/// - Style comes from `status` (absent states are `notStarted`).
/// - If the execution ended `ABORTED` or `TIMED_OUT`, any state still styled
///   `running` is shown as `aborted`.
/// - Choice states are diamonds and emit one edge per branch, then one to the
///   default. Other states emit an edge to `next` if they have one.
pub fn build_graph(
    definition: &WorkflowDefinition,
    status: &StatusMap,
    execution_status: ExecutionStatus,
) -> RenderGraph {
    let mut ids = NodeIdAllocator::new();
    for name in definition.state_names() {
        ids.allocate(name);
    }

    let mut graph = RenderGraph::default();

    for (name, descriptor) in definition.states.iter() {
        let id = ids.resolve(name);

        let mut style = StyleClass::from(status.get(name));
        if style == StyleClass::Running && execution_status.forces_abort() {
            style = StyleClass::Aborted;
        }

        let shape = if descriptor.is_choice() {
            NodeShape::Diamond
        } else {
            NodeShape::Rounded
        };

        for target in descriptor.targets() {
            graph.edges.push(RenderEdge {
                from: id.clone(),
                to: ids.resolve(target),
            });
        }

        graph.nodes.push(RenderNode {
            id,
            label: name.clone(),
            shape,
            style,
        });
    }

    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        %execution_status,
        "built render graph"
    );

    graph
}

/// Parse definition text and build its graph in one go.
///
/// Fails with `MalformedDefinition` when the text has no top-level `States`.
pub fn build_graph_from_json(
    definition: &str,
    status: &StatusMap,
    execution_status: ExecutionStatus,
) -> Result<RenderGraph> {
    let definition = WorkflowDefinition::from_json(definition)?;
    Ok(build_graph(&definition, status, execution_status))
}
