#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use sfnwatch::definition::HistoryEvent;
use sfnwatch::engine::{ReconcilerOptions, WatchTarget};
use sfnwatch::session::execution_arn;
use sfnwatch::source::{ExecutionDetails, InMemorySource};
use sfnwatch::types::ExecutionStatus;

pub const STATE_MACHINE_ARN: &str =
    "arn:aws:states:eu-west-1:123456789012:stateMachine:summarize";
pub const BUCKET: &str = "wf-nlp-tasks";
pub const OUTPUT_DIRECTORY: &str = "summaries";

/// A fixed instant so derived names and dates are predictable.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
}

pub fn execution_details(execution_id: &str, status: ExecutionStatus) -> ExecutionDetails {
    let start = fixed_now();
    ExecutionDetails {
        execution_arn: execution_arn(STATE_MACHINE_ARN, execution_id),
        state_machine_arn: STATE_MACHINE_ARN.to_string(),
        name: execution_id.to_string(),
        status,
        start_date: Some(start),
        stop_date: status
            .is_terminal()
            .then(|| start + chrono::Duration::seconds(75)),
        input: Some("{}".to_string()),
        redrive_count: None,
    }
}

/// Register `definition_json` and an execution of it; returns the watch
/// target for that execution.
pub fn seed_execution(
    source: &InMemorySource,
    definition_json: &str,
    execution_id: &str,
    status: ExecutionStatus,
) -> WatchTarget {
    source.put_state_machine(STATE_MACHINE_ARN, definition_json);
    let details = execution_details(execution_id, status);
    let target = WatchTarget::new(STATE_MACHINE_ARN, details.execution_arn.clone());
    source.put_execution(details);
    target
}

/// Push a `TaskStateEntered` event for `state`.
pub fn enter(source: &InMemorySource, target: &WatchTarget, state: &str) {
    source.push_event(
        &target.execution_arn,
        HistoryEvent::entered("TaskStateEntered", state),
    );
}

/// Push a `TaskStateExited` event for `state`.
pub fn exit(source: &InMemorySource, target: &WatchTarget, state: &str) {
    source.push_event(
        &target.execution_arn,
        HistoryEvent::exited("TaskStateExited", state),
    );
}

pub fn reconciler_options(poll_interval: Duration, execution_id: &str) -> ReconcilerOptions {
    ReconcilerOptions {
        poll_interval,
        bucket: BUCKET.to_string(),
        files_prefix: format!("{OUTPUT_DIRECTORY}/{execution_id}/"),
        sort_files_by_date: true,
        failure_notify_threshold: 3,
    }
}
