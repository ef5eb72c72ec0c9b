// src/actions.rs

//! User-initiated actions on executions: abort, redrive, start.
//!
//! Every failure is reported to the [`Notifier`] and returned to the caller
//! as [`SfnwatchError::ActionFailure`]. Nothing is retried.

use tracing::{info, warn};

use crate::errors::{Result, SfnwatchError};
use crate::launch::StartRequest;
use crate::notify::{Notification, Notifier};
use crate::source::{ExecutionActions, ExecutionDetails, StartedExecution};

const START_SUCCEEDED: &str = "Run submitted successfully!";
const ABORT_SUCCEEDED: &str = "Execution aborted.";
const REDRIVE_SUCCEEDED: &str = "Execution redriven.";
const ABORT_FAILED: &str = "Error stopping Step Function execution.";
const REDRIVE_FAILED: &str = "Error redriving Step Function execution.";
const START_FAILED: &str = "Error while launching a Step Function execution.";

#[derive(Debug, Clone)]
pub struct ExecutionController<A, N> {
    actions: A,
    notifier: N,
}

impl<A, N> ExecutionController<A, N>
where
    A: ExecutionActions,
    N: Notifier,
{
    pub fn new(actions: A, notifier: N) -> Self {
        Self { actions, notifier }
    }

    /// Stop a running execution.
    pub async fn abort(&self, execution: &ExecutionDetails) -> Result<()> {
        let outcome = if execution.status.can_abort() {
            self.actions.stop_execution(&execution.execution_arn).await
        } else {
            Err(SfnwatchError::ActionFailure(format!(
                "execution {} is {} and cannot be aborted",
                execution.execution_id(),
                execution.status
            )))
        };

        self.report(outcome, ABORT_SUCCEEDED, ABORT_FAILED, &execution.execution_arn)
    }

    /// Redrive a failed, timed out or aborted execution.
    pub async fn redrive(&self, execution: &ExecutionDetails) -> Result<()> {
        let outcome = if execution.status.can_redrive() {
            self.actions.redrive_execution(&execution.execution_arn).await
        } else {
            Err(SfnwatchError::ActionFailure(format!(
                "execution {} is {} and cannot be redriven",
                execution.execution_id(),
                execution.status
            )))
        };

        self.report(outcome, REDRIVE_SUCCEEDED, REDRIVE_FAILED, &execution.execution_arn)
    }

    /// Launch a new execution.
    pub async fn start(&self, request: &StartRequest) -> Result<StartedExecution> {
        let outcome = self
            .actions
            .start_execution(
                &request.state_machine_arn,
                request.input.clone(),
                request.name.clone(),
            )
            .await;

        match outcome {
            Ok(started) => {
                info!(execution = %started.execution_arn, "execution started");
                self.notifier.notify(Notification::success(START_SUCCEEDED));
                Ok(started)
            }
            Err(err) => Err(self.fail(START_FAILED, &request.state_machine_arn, err)),
        }
    }

    fn report(
        &self,
        outcome: Result<()>,
        success: &str,
        failure: &str,
        execution_arn: &str,
    ) -> Result<()> {
        match outcome {
            Ok(()) => {
                info!(execution = %execution_arn, "{success}");
                self.notifier.notify(Notification::success(success));
                Ok(())
            }
            Err(err) => Err(self.fail(failure, execution_arn, err)),
        }
    }

    fn fail(&self, headline: &str, arn: &str, err: SfnwatchError) -> SfnwatchError {
        let detail = match err {
            SfnwatchError::ActionFailure(message) => message,
            other => other.to_string(),
        };
        warn!(arn = %arn, error = %detail, "{headline}");
        self.notifier
            .notify(Notification::error(format!("{headline}\n{detail}")));
        SfnwatchError::ActionFailure(detail)
    }
}
