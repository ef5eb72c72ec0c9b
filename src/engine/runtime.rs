// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::errors::{Result, SfnwatchError};
use crate::graph::RenderGraph;
use crate::notify::{Notification, Notifier};
use crate::source::{fetch_states_info, sort_by_recency, ExecutionSource, ObjectListing};

use super::core::ReconcilerCore;
use super::{
    ExecutionSnapshot, Observation, ReconcilerCommand, ReconcilerOptions, ReconcilerPhase,
    TickOutcome, ViewState, WatchTarget,
};

type SharedView = Option<Arc<ViewState>>;

/// Polls one execution and publishes its view on change.
///
/// This is the IO shell around [`ReconcilerCore`], which holds the change
/// detection and failure accounting. The shell performs the collaborator
/// calls, lists files, publishes views and notifies the user.
pub struct Reconciler<S, L, N> {
    target: WatchTarget,
    source: S,
    listing: L,
    notifier: N,
    options: ReconcilerOptions,
    core: ReconcilerCore,
    view_tx: watch::Sender<SharedView>,
}

impl<S, L, N> fmt::Debug for Reconciler<S, L, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<S, L, N> Reconciler<S, L, N>
where
    S: ExecutionSource + 'static,
    L: ObjectListing + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        target: WatchTarget,
        source: S,
        listing: L,
        notifier: N,
        options: ReconcilerOptions,
    ) -> Self {
        let (view_tx, _) = watch::channel(None);
        let core = ReconcilerCore::new(options.failure_notify_threshold);
        Self {
            target,
            source,
            listing,
            notifier,
            options,
            core,
            view_tx,
        }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn phase(&self) -> ReconcilerPhase {
        self.core.phase()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.core.consecutive_failures()
    }

    pub fn subscribe(&self) -> watch::Receiver<SharedView> {
        self.view_tx.subscribe()
    }

    pub fn current(&self) -> SharedView {
        self.view_tx.borrow().clone()
    }

    /// First fetch. Errors propagate since there is no earlier view to fall
    /// back to.
    pub async fn initialize(&mut self) -> Result<Arc<ViewState>> {
        info!(execution = %self.target.execution_arn, "initializing reconciler");

        self.core.begin_fetch();
        let observation = match self.fetch().await {
            Ok(observation) => observation,
            Err(err) => {
                self.core.fetch_failed(&err);
                return Err(err);
            }
        };

        let step = self.core.observe(observation);
        self.execute_commands(step.commands).await;

        self.current().ok_or_else(|| {
            SfnwatchError::NotFound(format!(
                "no view available for {}",
                self.target.execution_arn
            ))
        })
    }

    /// One poll. Fetch errors are logged and swallowed; the previous view
    /// (including its graph) stays current.
    pub async fn tick(&mut self) -> TickOutcome {
        self.core.begin_fetch();

        match self.fetch().await {
            Ok(observation) => {
                let step = self.core.observe(observation);
                let changed = step.changed;
                self.execute_commands(step.commands).await;
                if changed {
                    TickOutcome::Changed(self.core.revision())
                } else {
                    TickOutcome::Unchanged
                }
            }
            Err(err) => {
                if err.is_transient() {
                    warn!(
                        execution = %self.target.execution_arn,
                        error = %err,
                        "poll failed; keeping previous view"
                    );
                } else {
                    error!(
                        execution = %self.target.execution_arn,
                        error = %err,
                        "poll failed with an unexpected error; keeping previous view"
                    );
                }
                let step = self.core.fetch_failed(&err);
                self.execute_commands(step.commands).await;
                TickOutcome::Failed
            }
        }
    }

    /// Run the timer loop on its own task.
    ///
    /// The first poll happens one interval after spawning, since
    /// `initialize` has just fetched.
    pub fn spawn(self) -> ReconcilerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let view_rx = self.view_tx.subscribe();
        let task = tokio::spawn(self.run_loop(shutdown_rx));

        ReconcilerHandle {
            view_rx,
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run_loop(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = time::interval(self.options.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        info!(
            execution = %self.target.execution_arn,
            interval = ?self.options.poll_interval,
            "reconciler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                outcome = self.tick() => {
                    debug!(execution = %self.target.execution_arn, ?outcome, "tick complete");
                }
            }
        }

        info!(execution = %self.target.execution_arn, "reconciler stopped");
    }

    async fn fetch(&self) -> Result<Observation> {
        let details = self
            .source
            .describe_execution(&self.target.execution_arn)
            .await?;
        let (definition, states) = fetch_states_info(
            &self.source,
            &self.target.state_machine_arn,
            &self.target.execution_arn,
        )
        .await?;

        Ok(Observation {
            snapshot: ExecutionSnapshot {
                status: details.status,
                states,
            },
            definition: Arc::new(definition),
            details,
        })
    }

    async fn execute_commands(&mut self, commands: Vec<ReconcilerCommand>) {
        for command in commands {
            match command {
                ReconcilerCommand::RefreshFiles => self.refresh_files().await,
                ReconcilerCommand::NotifyConsumers => self.publish(),
                ReconcilerCommand::NotifyFetchTrouble { failures, message } => {
                    self.notifier.notify(Notification::warning(format!(
                        "Unable to refresh execution status after {failures} attempts.\n{message}"
                    )));
                }
            }
        }
    }

    async fn refresh_files(&mut self) {
        let listed = self
            .listing
            .list_objects(&self.options.bucket, &self.options.files_prefix)
            .await;

        let files = match listed {
            Ok(entries) if self.options.sort_files_by_date => sort_by_recency(entries),
            Ok(entries) => entries.into_iter().map(|e| e.key).collect(),
            Err(err) => {
                warn!(
                    bucket = %self.options.bucket,
                    prefix = %self.options.files_prefix,
                    error = %err,
                    "listing generated files failed"
                );
                Vec::new()
            }
        };

        self.core.files_listed(files);
    }

    fn publish(&mut self) {
        if let Some(view) = self.core.view() {
            debug!(
                execution = %self.target.execution_arn,
                revision = view.revision,
                fingerprint = %view.graph.fingerprint(),
                "publishing view"
            );
            self.view_tx.send_replace(Some(Arc::new(view)));
        }
        self.core.consumers_notified();
    }
}

/// Handle to a spawned reconciler.
///
/// Dropping the handle aborts the polling task; [`ReconcilerHandle::shutdown`]
/// stops it and waits for it to finish.
#[derive(Debug)]
pub struct ReconcilerHandle {
    view_rx: watch::Receiver<SharedView>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Receiver that is marked changed on every published view.
    pub fn subscribe(&self) -> watch::Receiver<SharedView> {
        self.view_rx.clone()
    }

    pub fn current(&self) -> SharedView {
        self.view_rx.borrow().clone()
    }

    pub fn current_graph(&self) -> Option<Arc<RenderGraph>> {
        self.view_rx
            .borrow()
            .as_ref()
            .map(|view| Arc::clone(&view.graph))
    }

    /// Execution status plus the per-state map of the latest view.
    pub fn current_status(&self) -> Option<ExecutionSnapshot> {
        self.view_rx
            .borrow()
            .as_ref()
            .map(|view| view.snapshot.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop polling. An in-flight fetch is abandoned; no tick runs after
    /// this returns.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "reconciler task ended abnormally");
                }
            }
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
