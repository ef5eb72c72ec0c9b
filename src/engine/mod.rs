// src/engine/mod.rs

//! Live-status reconciliation for a single execution.
//!
//! A reconciler polls the workflow service on a timer, detects whether the
//! execution's status or any state status changed, and when it did:
//! - invalidates the cached graph and file listing,
//! - rebuilds the graph,
//! - publishes a fresh [`ViewState`] to subscribers.
//!
//! The pure decision logic lives in [`core`]; the async/IO shell (timer,
//! collaborator calls, publication, cancellation) is implemented in
//! [`runtime`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::model::ConfigFile;
use crate::definition::{StatusMap, WorkflowDefinition};
use crate::graph::RenderGraph;
use crate::session::WorkflowTarget;
use crate::source::ExecutionDetails;
use crate::types::ExecutionStatus;

/// The execution a reconciler watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub state_machine_arn: String,
    pub execution_arn: String,
}

impl WatchTarget {
    pub fn new(state_machine_arn: impl Into<String>, execution_arn: impl Into<String>) -> Self {
        Self {
            state_machine_arn: state_machine_arn.into(),
            execution_arn: execution_arn.into(),
        }
    }

    pub fn for_execution(workflow: &WorkflowTarget, execution_id: &str) -> Self {
        Self::new(
            workflow.state_machine_arn.clone(),
            workflow.execution_arn(execution_id),
        )
    }
}

/// What change detection compares between two polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSnapshot {
    pub status: ExecutionStatus,
    pub states: StatusMap,
}

/// One successful poll.
#[derive(Debug, Clone)]
pub struct Observation {
    pub details: ExecutionDetails,
    pub definition: Arc<WorkflowDefinition>,
    pub snapshot: ExecutionSnapshot,
}

/// Everything a consumer renders. Replaced wholesale on change, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Incremented on every detected change, starting at 1.
    pub revision: u64,
    pub details: ExecutionDetails,
    pub snapshot: ExecutionSnapshot,
    pub graph: Arc<RenderGraph>,
    /// Generated file keys, already ordered for display.
    pub files: Vec<String>,
}

impl ViewState {
    pub fn status(&self) -> ExecutionStatus {
        self.snapshot.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    /// A change was detected and published under this revision.
    Changed(u64),
    /// The poll failed; the previous view is still current.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilerPhase {
    #[default]
    Idle,
    Fetching,
    Notifying,
}

/// Runtime options shared by the core and the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub poll_interval: Duration,
    /// Bucket holding generated files.
    pub bucket: String,
    /// Key prefix of this execution's generated files.
    pub files_prefix: String,
    pub sort_files_by_date: bool,
    /// Consecutive failed polls before the user is notified. `0` disables.
    pub failure_notify_threshold: u32,
}

impl ReconcilerOptions {
    pub fn from_config(cfg: &ConfigFile, files_prefix: impl Into<String>) -> Self {
        Self {
            poll_interval: cfg.poll_interval,
            bucket: cfg.config.artifact_bucket.clone(),
            files_prefix: files_prefix.into(),
            sort_files_by_date: cfg.config.sort_files_by_date,
            failure_notify_threshold: cfg.config.failure_notify_threshold,
        }
    }
}

/// Command produced by the pure core, executed by the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerCommand {
    /// Re-list the execution's generated files.
    RefreshFiles,
    /// Publish the current view to subscribers.
    NotifyConsumers,
    /// Tell the user polling keeps failing.
    NotifyFetchTrouble { failures: u32, message: String },
}

/// Decision returned by the core for one poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileStep {
    pub changed: bool,
    pub commands: Vec<ReconcilerCommand>,
}

pub mod cache;
pub mod core;
pub mod runtime;

pub use cache::ViewCache;
pub use self::core::ReconcilerCore;
pub use runtime::{Reconciler, ReconcilerHandle};
