// src/source/model.rs

//! Documents exchanged with the workflow and object-storage collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::definition::HistoryEvent;
use crate::session::resource_name;
use crate::types::ExecutionStatus;

/// Describe-execution document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetails {
    pub execution_arn: String,
    pub state_machine_arn: String,
    #[serde(default)]
    pub name: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_date: Option<DateTime<Utc>>,
    /// Raw JSON input the execution was started with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redrive_count: Option<u32>,
}

impl ExecutionDetails {
    /// Last segment of the execution ARN.
    pub fn execution_id(&self) -> &str {
        resource_name(&self.execution_arn)
    }
}

/// One row of an execution listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub execution_arn: String,
    pub name: String,
    pub status: ExecutionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub stop_date: Option<DateTime<Utc>>,
}

impl From<&ExecutionDetails> for ExecutionSummary {
    fn from(details: &ExecutionDetails) -> Self {
        Self {
            execution_arn: details.execution_arn.clone(),
            name: details.name.clone(),
            status: details.status,
            start_date: details.start_date,
            stop_date: details.stop_date,
        }
    }
}

/// One page of an execution history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryPage {
    pub events: Vec<HistoryEvent>,
    /// Present when more pages follow.
    pub next_token: Option<String>,
}

/// Object key plus its modification time, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}

/// Result of a start-execution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedExecution {
    pub execution_arn: String,
    pub start_date: DateTime<Utc>,
}

impl StartedExecution {
    pub fn execution_id(&self) -> &str {
        resource_name(&self.execution_arn)
    }
}

/// Newest first; entries without a timestamp go last. Ties are ordered by key.
pub fn sort_by_recency(mut entries: Vec<ObjectEntry>) -> Vec<String> {
    entries.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });
    entries.into_iter().map(|e| e.key).collect()
}
