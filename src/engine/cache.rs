// src/engine/cache.rs

use std::sync::Arc;

use tracing::debug;

use crate::definition::WorkflowDefinition;
use crate::engine::{ExecutionSnapshot, ViewState};
use crate::graph::{build_graph, RenderGraph};
use crate::source::ExecutionDetails;

/// Per-execution cache of derived view data.
///
/// This is the only place the cached graph and file listing are dropped:
/// [`ViewCache::invalidate`] clears both together with recording the new
/// snapshot, so a consumer never sees a graph from one poll next to files
/// from another.
#[derive(Debug, Default)]
pub struct ViewCache {
    snapshot: Option<ExecutionSnapshot>,
    details: Option<ExecutionDetails>,
    definition: Option<Arc<WorkflowDefinition>>,
    graph: Option<Arc<RenderGraph>>,
    files: Option<Vec<String>>,
    revision: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `snapshot` differs from the last recorded one. An empty cache
    /// is always stale.
    pub fn is_stale(&self, snapshot: &ExecutionSnapshot) -> bool {
        self.snapshot.as_ref() != Some(snapshot)
    }

    /// Keep the latest details and definition for the next rebuild.
    pub fn record(&mut self, details: ExecutionDetails, definition: Arc<WorkflowDefinition>) {
        self.details = Some(details);
        self.definition = Some(definition);
    }

    /// Record `snapshot` as current, drop the derived graph and files, and
    /// bump the revision. Returns the new revision.
    pub fn invalidate(&mut self, snapshot: ExecutionSnapshot) -> u64 {
        self.snapshot = Some(snapshot);
        self.graph = None;
        self.files = None;
        self.revision += 1;
        debug!(revision = self.revision, "invalidated view cache");
        self.revision
    }

    /// Get the graph for the current snapshot, building and caching it if
    /// necessary. `None` until something has been recorded.
    pub fn graph_or_build(&mut self) -> Option<Arc<RenderGraph>> {
        if let Some(graph) = &self.graph {
            return Some(Arc::clone(graph));
        }

        let snapshot = self.snapshot.as_ref()?;
        let definition = self.definition.as_ref()?;
        debug!(revision = self.revision, "cache miss: building graph");
        let graph = Arc::new(build_graph(definition, &snapshot.states, snapshot.status));
        self.graph = Some(Arc::clone(&graph));
        Some(graph)
    }

    pub fn set_files(&mut self, files: Vec<String>) {
        self.files = Some(files);
    }

    pub fn files(&self) -> Option<&[String]> {
        self.files.as_deref()
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Option<&ExecutionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Assemble a view from the cached parts.
    pub fn view(&mut self) -> Option<ViewState> {
        let graph = self.graph_or_build()?;
        Some(ViewState {
            revision: self.revision,
            details: self.details.clone()?,
            snapshot: self.snapshot.clone()?,
            graph,
            files: self.files.clone().unwrap_or_default(),
        })
    }
}
