// src/engine/core.rs

//! Pure reconciler state machine.
//!
//! The core consumes poll results and produces commands for the IO shell
//! (`engine::runtime::Reconciler`). It has no channels, no Tokio types, and
//! performs no IO, so change detection and failure accounting are tested
//! without a runtime.

use tracing::{debug, info};

use crate::engine::cache::ViewCache;
use crate::engine::{
    Observation, ReconcileStep, ReconcilerCommand, ReconcilerPhase, ViewState,
};
use crate::errors::SfnwatchError;

#[derive(Debug)]
pub struct ReconcilerCore {
    cache: ViewCache,
    phase: ReconcilerPhase,
    consecutive_failures: u32,
    failure_notify_threshold: u32,
}

impl ReconcilerCore {
    pub fn new(failure_notify_threshold: u32) -> Self {
        Self {
            cache: ViewCache::new(),
            phase: ReconcilerPhase::Idle,
            consecutive_failures: 0,
            failure_notify_threshold,
        }
    }

    pub fn phase(&self) -> ReconcilerPhase {
        self.phase
    }

    pub fn revision(&self) -> u64 {
        self.cache.revision()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    /// A poll is about to start.
    pub fn begin_fetch(&mut self) {
        self.phase = ReconcilerPhase::Fetching;
    }

    /// Handle a successful poll.
    ///
    /// The execution status and the state status map are compared against
    /// the last observation. On any difference the cache is invalidated, the
    /// graph rebuilt, and the shell is told to refresh files and publish.
    pub fn observe(&mut self, observation: Observation) -> ReconcileStep {
        if self.consecutive_failures > 0 {
            info!(
                failures = self.consecutive_failures,
                "polling recovered after failures"
            );
        }
        self.consecutive_failures = 0;

        let Observation {
            details,
            definition,
            snapshot,
        } = observation;

        let changed = self.cache.is_stale(&snapshot);
        if changed {
            if let Some(previous) = self.cache.snapshot() {
                debug!(
                    from = %previous.status,
                    to = %snapshot.status,
                    states = ?previous.states.changed_states(&snapshot.states),
                    "execution changed"
                );
            }
        }

        self.cache.record(details, definition);

        if !changed {
            self.phase = ReconcilerPhase::Idle;
            return ReconcileStep::default();
        }

        self.cache.invalidate(snapshot);
        self.cache.graph_or_build();
        self.phase = ReconcilerPhase::Notifying;

        ReconcileStep {
            changed: true,
            commands: vec![
                ReconcilerCommand::RefreshFiles,
                ReconcilerCommand::NotifyConsumers,
            ],
        }
    }

    /// Handle a failed poll. The cached view is left untouched.
    ///
    /// Returns a [`ReconcilerCommand::NotifyFetchTrouble`] exactly once per
    /// failure streak, when the streak reaches the configured threshold.
    pub fn fetch_failed(&mut self, error: &SfnwatchError) -> ReconcileStep {
        self.phase = ReconcilerPhase::Idle;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        let threshold = self.failure_notify_threshold;
        let commands = if threshold > 0 && self.consecutive_failures == threshold {
            vec![ReconcilerCommand::NotifyFetchTrouble {
                failures: self.consecutive_failures,
                message: error.to_string(),
            }]
        } else {
            Vec::new()
        };

        ReconcileStep {
            changed: false,
            commands,
        }
    }

    pub fn files_listed(&mut self, files: Vec<String>) {
        self.cache.set_files(files);
    }

    /// The shell published the view.
    pub fn consumers_notified(&mut self) {
        self.phase = ReconcilerPhase::Idle;
    }

    pub fn view(&mut self) -> Option<ViewState> {
        self.cache.view()
    }
}
