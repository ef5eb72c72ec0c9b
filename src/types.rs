use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Execution-level status as reported by the workflow service.
///
/// This is not the same set as [`StateStatus`]: it describes the whole run,
/// not a single state in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
    /// Reported after a redrive was requested and before the run resumes.
    PendingRedrive,
}

impl ExecutionStatus {
    /// Statuses in the order the overview tallies them.
    pub const TALLIED: [ExecutionStatus; 5] = [
        ExecutionStatus::Running,
        ExecutionStatus::Succeeded,
        ExecutionStatus::Failed,
        ExecutionStatus::TimedOut,
        ExecutionStatus::Aborted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::TimedOut => "TIMED_OUT",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::PendingRedrive => "PENDING_REDRIVE",
        }
    }

    /// No further history events follow a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded
                | ExecutionStatus::Failed
                | ExecutionStatus::TimedOut
                | ExecutionStatus::Aborted
        )
    }

    /// The run was killed: anything still in flight is shown as aborted.
    pub fn forces_abort(&self) -> bool {
        matches!(self, ExecutionStatus::Aborted | ExecutionStatus::TimedOut)
    }

    pub fn can_abort(&self) -> bool {
        matches!(self, ExecutionStatus::Running)
    }

    pub fn can_redrive(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Failed | ExecutionStatus::TimedOut | ExecutionStatus::Aborted
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "RUNNING" => Ok(ExecutionStatus::Running),
            "SUCCEEDED" => Ok(ExecutionStatus::Succeeded),
            "FAILED" => Ok(ExecutionStatus::Failed),
            "TIMED_OUT" => Ok(ExecutionStatus::TimedOut),
            "ABORTED" => Ok(ExecutionStatus::Aborted),
            "PENDING_REDRIVE" => Ok(ExecutionStatus::PendingRedrive),
            other => Err(format!(
                "invalid execution status: {other} (expected RUNNING, SUCCEEDED, FAILED, TIMED_OUT or ABORTED)"
            )),
        }
    }
}

/// Per-state status derived from the execution history.
///
/// Only `NotStarted`, `Running` and `Completed` are ever produced by history
/// replay; `Failed` and `Aborted` exist so the closed set maps one-to-one onto
/// the graph style classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl StateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateStatus::NotStarted => "NOT_STARTED",
            StateStatus::Running => "RUNNING",
            StateStatus::Completed => "COMPLETED",
            StateStatus::Failed => "FAILED",
            StateStatus::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for StateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment a workflow ARN is registered under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
    Staging,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            other => Err(format!(
                "invalid environment: {other} (expected \"production\", \"development\" or \"staging\")"
            )),
        }
    }
}
