// src/source/mod.rs

//! Collaborator seams: the workflow service and the object store.
//!
//! The reconciler and the action controller talk to these traits instead of a
//! concrete cloud client. Two implementations ship with the crate:
//!
//! - [`memory::InMemorySource`]: scriptable in-process state, used by tests.
//! - [`directory::DirectorySource`]: an on-disk mirror of the service's JSON
//!   documents, used by the CLI.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::definition::{StatusMap, WorkflowDefinition};
use crate::errors::Result;

pub mod directory;
pub mod memory;
pub mod model;

pub use directory::DirectorySource;
pub use memory::InMemorySource;
pub use model::{
    ExecutionDetails, ExecutionSummary, HistoryPage, ObjectEntry, StartedExecution,
    sort_by_recency,
};

/// Boxed future returned by every collaborator call.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Read side of the workflow service.
pub trait ExecutionSource: Send + Sync {
    fn describe_execution<'a>(&'a self, execution_arn: &'a str)
    -> SourceFuture<'a, ExecutionDetails>;

    /// Definition text of a state machine.
    fn describe_state_machine<'a>(&'a self, state_machine_arn: &'a str) -> SourceFuture<'a, String>;

    /// One page of history; pass the previous page's `next_token` to continue.
    fn history_page<'a>(
        &'a self,
        execution_arn: &'a str,
        next_token: Option<String>,
    ) -> SourceFuture<'a, HistoryPage>;

    /// Most recent executions first.
    fn list_executions<'a>(
        &'a self,
        state_machine_arn: &'a str,
        max_results: usize,
    ) -> SourceFuture<'a, Vec<ExecutionSummary>>;
}

/// Object store listing, used for the generated-files display.
pub trait ObjectListing: Send + Sync {
    fn list_objects<'a>(&'a self, bucket: &'a str, prefix: &'a str)
    -> SourceFuture<'a, Vec<ObjectEntry>>;
}

/// Write side of the workflow service.
pub trait ExecutionActions: Send + Sync {
    fn start_execution<'a>(
        &'a self,
        state_machine_arn: &'a str,
        input: String,
        name: Option<String>,
    ) -> SourceFuture<'a, StartedExecution>;

    fn stop_execution<'a>(&'a self, execution_arn: &'a str) -> SourceFuture<'a, ()>;

    fn redrive_execution<'a>(&'a self, execution_arn: &'a str) -> SourceFuture<'a, ()>;
}

/// Fetch the definition once and replay the full history into a status map.
///
/// Every page is drained before the map is returned, so the result is final
/// for this poll.
pub async fn fetch_states_info<S>(
    source: &S,
    state_machine_arn: &str,
    execution_arn: &str,
) -> Result<(WorkflowDefinition, StatusMap)>
where
    S: ExecutionSource + ?Sized,
{
    let text = source.describe_state_machine(state_machine_arn).await?;
    let definition = WorkflowDefinition::from_json(&text)?;

    let mut status = StatusMap::seeded(&definition);
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;
    let mut events = 0usize;

    loop {
        let page = source.history_page(execution_arn, next_token.take()).await?;
        pages += 1;
        events += page.events.len();
        for event in &page.events {
            status.apply(event);
        }
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    debug!(
        execution = %execution_arn,
        pages,
        events,
        states = status.len(),
        "replayed execution history"
    );

    Ok((definition, status))
}
