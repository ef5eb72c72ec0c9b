// src/source/memory.rs

//! In-process collaborator with scriptable state and fault injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::definition::HistoryEvent;
use crate::errors::{Result, SfnwatchError};
use crate::session::execution_arn;
use crate::source::{
    ExecutionActions, ExecutionDetails, ExecutionSource, ExecutionSummary, HistoryPage,
    ObjectEntry, ObjectListing, SourceFuture, StartedExecution,
};
use crate::types::ExecutionStatus;

/// Number of calls made against each collaborator method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub describe_execution: usize,
    pub describe_state_machine: usize,
    pub history_page: usize,
    pub list_executions: usize,
    pub list_objects: usize,
    pub start_execution: usize,
    pub stop_execution: usize,
    pub redrive_execution: usize,
}

#[derive(Debug, Clone)]
struct ExecutionRecord {
    details: ExecutionDetails,
    history: Vec<HistoryEvent>,
}

#[derive(Debug)]
struct MemoryState {
    state_machines: HashMap<String, String>,
    executions: BTreeMap<String, ExecutionRecord>,
    objects: BTreeMap<String, Vec<ObjectEntry>>,
    page_size: usize,
    failing_fetches: usize,
    fetch_failure_message: String,
    action_failure: Option<String>,
    latency: Option<Duration>,
    calls: CallCounts,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            state_machines: HashMap::new(),
            executions: BTreeMap::new(),
            objects: BTreeMap::new(),
            page_size: 100,
            failing_fetches: 0,
            fetch_failure_message: String::new(),
            action_failure: None,
            latency: None,
            calls: CallCounts::default(),
        }
    }
}

/// Implements every collaborator trait over shared in-memory state.
///
/// Clones share state, so a test can keep one clone to mutate the "remote"
/// side while the reconciler polls another.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history events returned per page.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().unwrap().page_size = page_size.max(1);
        self
    }

    /// Register (or replace) a state machine's definition text.
    pub fn put_state_machine(&self, state_machine_arn: &str, definition: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .state_machines
            .insert(state_machine_arn.to_string(), definition.into());
    }

    pub fn put_execution(&self, details: ExecutionDetails) {
        let mut state = self.state.lock().unwrap();
        state.executions.insert(
            details.execution_arn.clone(),
            ExecutionRecord {
                details,
                history: Vec::new(),
            },
        );
    }

    pub fn set_status(&self, execution_arn: &str, status: ExecutionStatus) {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.executions.get_mut(execution_arn) {
            record.details.status = status;
            if status.is_terminal() {
                record.details.stop_date = Some(Utc::now());
            }
        }
    }

    pub fn push_event(&self, execution_arn: &str, event: HistoryEvent) {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.executions.get_mut(execution_arn) {
            record.history.push(event);
        }
    }

    pub fn put_object(&self, bucket: &str, entry: ObjectEntry) {
        self.state
            .lock()
            .unwrap()
            .objects
            .entry(bucket.to_string())
            .or_default()
            .push(entry);
    }

    /// Make the next `count` describe-execution calls fail.
    pub fn fail_fetches(&self, count: usize, message: &str) {
        let mut state = self.state.lock().unwrap();
        state.failing_fetches = count;
        state.fetch_failure_message = message.to_string();
    }

    /// Make every action call fail until cleared with `None`.
    pub fn fail_actions(&self, message: Option<&str>) {
        self.state.lock().unwrap().action_failure = message.map(str::to_string);
    }

    /// Delay every read call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().unwrap().latency = latency;
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    pub fn execution(&self, execution_arn: &str) -> Option<ExecutionDetails> {
        self.state
            .lock()
            .unwrap()
            .executions
            .get(execution_arn)
            .map(|r| r.details.clone())
    }

    fn read<'a, T, F>(&'a self, op: F) -> SourceFuture<'a, T>
    where
        T: Send + 'a,
        F: FnOnce(&mut MemoryState) -> Result<T>,
    {
        let (result, latency) = {
            let mut state = self.state.lock().unwrap();
            let latency = state.latency;
            (op(&mut state), latency)
        };
        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            result
        })
    }

    fn act<'a, T, F>(&'a self, op: F) -> SourceFuture<'a, T>
    where
        T: Send + 'a,
        F: FnOnce(&mut MemoryState) -> Result<T>,
    {
        let result = {
            let mut state = self.state.lock().unwrap();
            match state.action_failure.clone() {
                Some(message) => Err(SfnwatchError::Other(anyhow::anyhow!(message))),
                None => op(&mut state),
            }
        };
        Box::pin(async move { result })
    }
}

fn missing_execution(execution_arn: &str) -> SfnwatchError {
    SfnwatchError::NotFound(format!("execution {execution_arn}"))
}

impl ExecutionSource for InMemorySource {
    fn describe_execution<'a>(
        &'a self,
        execution_arn: &'a str,
    ) -> SourceFuture<'a, ExecutionDetails> {
        self.read(move |state| {
            state.calls.describe_execution += 1;
            if state.failing_fetches > 0 {
                state.failing_fetches -= 1;
                return Err(SfnwatchError::FetchFailure(state.fetch_failure_message.clone()));
            }
            state
                .executions
                .get(execution_arn)
                .map(|r| r.details.clone())
                .ok_or_else(|| missing_execution(execution_arn))
        })
    }

    fn describe_state_machine<'a>(&'a self, state_machine_arn: &'a str) -> SourceFuture<'a, String> {
        self.read(move |state| {
            state.calls.describe_state_machine += 1;
            state
                .state_machines
                .get(state_machine_arn)
                .cloned()
                .ok_or_else(|| SfnwatchError::NotFound(format!("state machine {state_machine_arn}")))
        })
    }

    fn history_page<'a>(
        &'a self,
        execution_arn: &'a str,
        next_token: Option<String>,
    ) -> SourceFuture<'a, HistoryPage> {
        self.read(move |state| {
            state.calls.history_page += 1;
            let page_size = state.page_size;
            let record = state
                .executions
                .get(execution_arn)
                .ok_or_else(|| missing_execution(execution_arn))?;

            let offset = match next_token {
                Some(token) => token.parse::<usize>().map_err(|_| {
                    SfnwatchError::FetchFailure(format!("invalid history token {token:?}"))
                })?,
                None => 0,
            };
            let end = (offset + page_size).min(record.history.len());
            let events = record.history.get(offset..end).unwrap_or_default().to_vec();
            let next_token = (end < record.history.len()).then(|| end.to_string());

            Ok(HistoryPage { events, next_token })
        })
    }

    fn list_executions<'a>(
        &'a self,
        state_machine_arn: &'a str,
        max_results: usize,
    ) -> SourceFuture<'a, Vec<ExecutionSummary>> {
        self.read(move |state| {
            state.calls.list_executions += 1;
            let mut summaries: Vec<ExecutionSummary> = state
                .executions
                .values()
                .filter(|r| r.details.state_machine_arn == state_machine_arn)
                .map(|r| ExecutionSummary::from(&r.details))
                .collect();
            summaries.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            summaries.truncate(max_results);
            Ok(summaries)
        })
    }
}

impl ObjectListing for InMemorySource {
    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> SourceFuture<'a, Vec<ObjectEntry>> {
        self.read(move |state| {
            state.calls.list_objects += 1;
            Ok(state
                .objects
                .get(bucket)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|e| e.key.starts_with(prefix))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        })
    }
}

impl ExecutionActions for InMemorySource {
    fn start_execution<'a>(
        &'a self,
        state_machine_arn: &'a str,
        input: String,
        name: Option<String>,
    ) -> SourceFuture<'a, StartedExecution> {
        self.act(move |state| {
            state.calls.start_execution += 1;
            let now = Utc::now();
            let name = name.unwrap_or_else(|| format!("run-{}", state.executions.len() + 1));
            let arn = execution_arn(state_machine_arn, &name);
            if state.executions.contains_key(&arn) {
                return Err(SfnwatchError::ActionFailure(format!(
                    "execution already exists: {arn}"
                )));
            }
            state.executions.insert(
                arn.clone(),
                ExecutionRecord {
                    details: ExecutionDetails {
                        execution_arn: arn.clone(),
                        state_machine_arn: state_machine_arn.to_string(),
                        name,
                        status: ExecutionStatus::Running,
                        start_date: Some(now),
                        stop_date: None,
                        input: Some(input),
                        redrive_count: None,
                    },
                    history: Vec::new(),
                },
            );
            Ok(StartedExecution {
                execution_arn: arn,
                start_date: now,
            })
        })
    }

    fn stop_execution<'a>(&'a self, execution_arn: &'a str) -> SourceFuture<'a, ()> {
        self.act(move |state| {
            state.calls.stop_execution += 1;
            let record = state
                .executions
                .get_mut(execution_arn)
                .ok_or_else(|| missing_execution(execution_arn))?;
            record.details.status = ExecutionStatus::Aborted;
            record.details.stop_date = Some(Utc::now());
            Ok(())
        })
    }

    fn redrive_execution<'a>(&'a self, execution_arn: &'a str) -> SourceFuture<'a, ()> {
        self.act(move |state| {
            state.calls.redrive_execution += 1;
            let record = state
                .executions
                .get_mut(execution_arn)
                .ok_or_else(|| missing_execution(execution_arn))?;
            record.details.status = ExecutionStatus::Running;
            record.details.stop_date = None;
            record.details.redrive_count = Some(record.details.redrive_count.unwrap_or(0) + 1);
            Ok(())
        })
    }
}
