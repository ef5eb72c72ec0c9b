// src/report.rs

//! Plain-text execution report shown next to the graph.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::engine::ViewState;
use crate::session::{console_url, resource_name};
use crate::types::ExecutionStatus;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NOT_AVAILABLE: &str = "N/A";

/// `"{h}h {m}m {s}s"`, dropping leading zero units.
pub fn format_duration(start: DateTime<Utc>, stop: DateTime<Utc>) -> String {
    let total_seconds = (stop - start).num_seconds().max(0);

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Strip the output directory and execution id from a generated file key.
pub fn display_file_name(key: &str) -> String {
    key.split('/').skip(2).collect::<Vec<_>>().join("/")
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailableAction {
    Abort,
    Redrive,
}

impl AvailableAction {
    pub fn for_status(status: ExecutionStatus) -> Vec<AvailableAction> {
        let mut actions = Vec::new();
        if status.can_abort() {
            actions.push(AvailableAction::Abort);
        }
        if status.can_redrive() {
            actions.push(AvailableAction::Redrive);
        }
        actions
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailableAction::Abort => "abort",
            AvailableAction::Redrive => "redrive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub execution_id: String,
    pub state_machine: String,
    pub status: ExecutionStatus,
    pub started: String,
    pub stopped: String,
    pub duration: String,
    pub actions: Vec<AvailableAction>,
    pub files: Vec<String>,
    pub console_url: Option<String>,
    pub revision: u64,
}

impl StatusReport {
    pub fn from_view(view: &ViewState) -> Self {
        let details = &view.details;
        let duration = match (details.start_date, details.stop_date) {
            (Some(start), Some(stop)) => format_duration(start, stop),
            _ => NOT_AVAILABLE.to_string(),
        };

        Self {
            execution_id: details.execution_id().to_string(),
            state_machine: resource_name(&details.state_machine_arn).to_string(),
            status: view.status(),
            started: format_date(details.start_date),
            stopped: format_date(details.stop_date),
            duration,
            actions: AvailableAction::for_status(view.status()),
            files: view.files.iter().map(|key| display_file_name(key)).collect(),
            console_url: console_url(&details.execution_arn),
            revision: view.revision,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Execution:     {}", self.execution_id)?;
        writeln!(f, "State machine: {}", self.state_machine)?;
        writeln!(f, "Status:        {}", self.status)?;
        writeln!(f, "Started:       {}", self.started)?;
        writeln!(f, "Stopped:       {}", self.stopped)?;
        writeln!(f, "Duration:      {}", self.duration)?;
        if !self.actions.is_empty() {
            let actions: Vec<&str> = self.actions.iter().map(|a| a.as_str()).collect();
            writeln!(f, "Actions:       {}", actions.join(", "))?;
        }
        if let Some(url) = &self.console_url {
            writeln!(f, "Console:       {url}")?;
        }
        writeln!(f, "Generated files:")?;
        if self.files.is_empty() {
            writeln!(f, "  no files generated")?;
        }
        for file in &self.files {
            writeln!(f, "  {file}")?;
        }
        Ok(())
    }
}
