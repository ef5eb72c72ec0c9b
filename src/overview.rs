// src/overview.rs

//! Per-workflow execution listing and status counts.

use std::fmt;

use crate::errors::Result;
use crate::source::{ExecutionSource, ExecutionSummary};
use crate::types::ExecutionStatus;

/// Number of executions per status, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionCounts {
    counts: Vec<(ExecutionStatus, usize)>,
}

impl ExecutionCounts {
    /// Count executions by status.
    ///
    /// The usual statuses are always present (with zero counts); any other
    /// status only appears once seen.
    pub fn tally<'a, I>(executions: I) -> Self
    where
        I: IntoIterator<Item = &'a ExecutionSummary>,
    {
        let mut counts: Vec<(ExecutionStatus, usize)> = ExecutionStatus::TALLIED
            .iter()
            .map(|status| (*status, 0))
            .collect();

        for execution in executions {
            match counts.iter_mut().find(|(status, _)| *status == execution.status) {
                Some((_, count)) => *count += 1,
                None => counts.push((execution.status, 1)),
            }
        }

        Self { counts }
    }

    pub fn get(&self, status: ExecutionStatus) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExecutionStatus, usize)> + '_ {
        self.counts.iter().copied()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for ExecutionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(status, count)| format!("{}: {count}", status.as_str().replace('_', " ")))
            .collect();
        f.write_str(&parts.join("  "))
    }
}

/// Recent executions plus counts over every execution of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub recent: Vec<ExecutionSummary>,
    pub counts: ExecutionCounts,
}

pub async fn load_overview<S>(
    source: &S,
    state_machine_arn: &str,
    max_recent: usize,
) -> Result<Overview>
where
    S: ExecutionSource + ?Sized,
{
    let all = source.list_executions(state_machine_arn, usize::MAX).await?;
    let counts = ExecutionCounts::tally(&all);
    let recent = all.into_iter().take(max_recent).collect();
    Ok(Overview { recent, counts })
}
