// src/source/directory.rs

//! Collaborator backed by an on-disk mirror of the service's documents.
//!
//! Layout under the data directory:
//!
//! ```text
//! state-machines/<state machine name>.json    definition
//! executions/<execution id>/execution.json    describe-execution document
//! executions/<execution id>/history.json      JSON array of history events
//! objects/<bucket>/<key...>                   generated artifacts
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::definition::HistoryEvent;
use crate::errors::{Result, SfnwatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::session::{execution_arn, resource_name};
use crate::source::{
    ExecutionActions, ExecutionDetails, ExecutionSource, ExecutionSummary, HistoryPage,
    ObjectEntry, ObjectListing, SourceFuture, StartedExecution,
};
use crate::types::ExecutionStatus;

const STATE_MACHINES_DIR: &str = "state-machines";
const EXECUTIONS_DIR: &str = "executions";
const OBJECTS_DIR: &str = "objects";
const EXECUTION_FILE: &str = "execution.json";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    page_size: usize,
}

impl DirectorySource {
    /// Directory source over the real filesystem.
    pub fn new(root: impl Into<PathBuf>, page_size: usize) -> Self {
        Self::with_fs(root, Arc::new(RealFileSystem), page_size)
    }

    pub fn with_fs(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, page_size: usize) -> Self {
        Self {
            root: root.into(),
            fs,
            page_size: page_size.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_machine_path(&self, state_machine_arn: &str) -> PathBuf {
        self.root
            .join(STATE_MACHINES_DIR)
            .join(format!("{}.json", resource_name(state_machine_arn)))
    }

    pub fn execution_dir(&self, execution_arn: &str) -> PathBuf {
        self.root
            .join(EXECUTIONS_DIR)
            .join(resource_name(execution_arn))
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        if !self.fs.is_file(path) {
            return Err(SfnwatchError::NotFound(format!("{}", path.display())));
        }
        self.fs
            .read_to_string(path)
            .map_err(|e| SfnwatchError::FetchFailure(format!("{e:#}")))
    }

    fn read_details(&self, execution_arn: &str) -> Result<ExecutionDetails> {
        let path = self.execution_dir(execution_arn).join(EXECUTION_FILE);
        let text = self.read_text(&path)?;
        serde_json::from_str(&text).map_err(|e| {
            SfnwatchError::FetchFailure(format!("invalid {}: {e}", path.display()))
        })
    }

    fn write_details(&self, details: &ExecutionDetails) -> Result<()> {
        let path = self.execution_dir(&details.execution_arn).join(EXECUTION_FILE);
        let text = serde_json::to_string_pretty(details)?;
        self.fs.write(&path, text.as_bytes())?;
        Ok(())
    }

    fn read_history(&self, execution_arn: &str) -> Result<Vec<HistoryEvent>> {
        let path = self.execution_dir(execution_arn).join(HISTORY_FILE);
        if !self.fs.is_file(&path) {
            // An execution that has not produced events yet.
            return Ok(Vec::new());
        }
        let text = self.read_text(&path)?;
        serde_json::from_str(&text).map_err(|e| {
            SfnwatchError::FetchFailure(format!("invalid {}: {e}", path.display()))
        })
    }

    fn history_page_sync(&self, execution_arn: &str, next_token: Option<String>) -> Result<HistoryPage> {
        let history = self.read_history(execution_arn)?;
        let offset = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                SfnwatchError::FetchFailure(format!("invalid history token {token:?}"))
            })?,
            None => 0,
        };
        let end = (offset + self.page_size).min(history.len());
        let events = history.get(offset..end).unwrap_or_default().to_vec();
        let next_token = (end < history.len()).then(|| end.to_string());
        Ok(HistoryPage { events, next_token })
    }

    fn list_executions_sync(&self, state_machine_arn: &str, max_results: usize) -> Result<Vec<ExecutionSummary>> {
        let dir = self.root.join(EXECUTIONS_DIR);
        if !self.fs.is_dir(&dir) {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in self.fs.read_dir(&dir)? {
            let path = entry.join(EXECUTION_FILE);
            if !self.fs.is_file(&path) {
                continue;
            }
            let text = self.read_text(&path)?;
            match serde_json::from_str::<ExecutionDetails>(&text) {
                Ok(details) if details.state_machine_arn == state_machine_arn => {
                    summaries.push(ExecutionSummary::from(&details));
                }
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable execution"),
            }
        }

        summaries.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        summaries.truncate(max_results);
        Ok(summaries)
    }

    fn list_objects_sync(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let bucket_dir = self.root.join(OBJECTS_DIR).join(bucket);
        if !self.fs.is_dir(&bucket_dir) {
            debug!(bucket, "bucket directory missing; no objects");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut stack = vec![bucket_dir.clone()];
        while let Some(dir) = stack.pop() {
            for path in self.fs.read_dir(&dir)? {
                if self.fs.is_dir(&path) {
                    stack.push(path);
                    continue;
                }
                let Some(key) = object_key(&bucket_dir, &path) else {
                    continue;
                };
                if key.starts_with(prefix) {
                    let last_modified = self.fs.modified(&path)?;
                    entries.push(ObjectEntry { key, last_modified });
                }
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn start_sync(&self, state_machine_arn: &str, input: String, name: Option<String>) -> Result<StartedExecution> {
        let now = Utc::now();
        let name = name.unwrap_or_else(|| format!("run_{}", now.format("%Y%m%d_%H%M%S")));
        let arn = execution_arn(state_machine_arn, &name);

        let dir = self.execution_dir(&arn);
        if self.fs.is_file(&dir.join(EXECUTION_FILE)) {
            return Err(SfnwatchError::ActionFailure(format!(
                "execution already exists: {arn}"
            )));
        }

        self.write_details(&ExecutionDetails {
            execution_arn: arn.clone(),
            state_machine_arn: state_machine_arn.to_string(),
            name,
            status: ExecutionStatus::Running,
            start_date: Some(now),
            stop_date: None,
            input: Some(input),
            redrive_count: None,
        })?;
        self.fs.write(&dir.join(HISTORY_FILE), b"[]")?;

        Ok(StartedExecution {
            execution_arn: arn,
            start_date: now,
        })
    }

    fn update_details<F>(&self, execution_arn: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut ExecutionDetails),
    {
        let mut details = self.read_details(execution_arn)?;
        update(&mut details);
        self.write_details(&details)
    }

    /// Run `work` on the blocking pool. Dropping the returned future stops
    /// waiting on it; the filesystem call itself runs to completion.
    fn blocking<T, F>(&self, work: F) -> SourceFuture<'static, T>
    where
        T: Send + 'static,
        F: FnOnce(&DirectorySource) -> Result<T> + Send + 'static,
    {
        let source = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || work(&source))
                .await
                .map_err(|e| SfnwatchError::FetchFailure(format!("filesystem task failed: {e}")))?
        })
    }
}

/// Key of `path` relative to the bucket directory, `/`-separated.
fn object_key(bucket_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(bucket_dir).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

impl ExecutionSource for DirectorySource {
    fn describe_execution<'a>(
        &'a self,
        execution_arn: &'a str,
    ) -> SourceFuture<'a, ExecutionDetails> {
        let execution_arn = execution_arn.to_string();
        self.blocking(move |source| source.read_details(&execution_arn))
    }

    fn describe_state_machine<'a>(&'a self, state_machine_arn: &'a str) -> SourceFuture<'a, String> {
        let path = self.state_machine_path(state_machine_arn);
        self.blocking(move |source| source.read_text(&path))
    }

    fn history_page<'a>(
        &'a self,
        execution_arn: &'a str,
        next_token: Option<String>,
    ) -> SourceFuture<'a, HistoryPage> {
        let execution_arn = execution_arn.to_string();
        self.blocking(move |source| source.history_page_sync(&execution_arn, next_token))
    }

    fn list_executions<'a>(
        &'a self,
        state_machine_arn: &'a str,
        max_results: usize,
    ) -> SourceFuture<'a, Vec<ExecutionSummary>> {
        let state_machine_arn = state_machine_arn.to_string();
        self.blocking(move |source| source.list_executions_sync(&state_machine_arn, max_results))
    }
}

impl ObjectListing for DirectorySource {
    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> SourceFuture<'a, Vec<ObjectEntry>> {
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();
        self.blocking(move |source| source.list_objects_sync(&bucket, &prefix))
    }
}

impl ExecutionActions for DirectorySource {
    fn start_execution<'a>(
        &'a self,
        state_machine_arn: &'a str,
        input: String,
        name: Option<String>,
    ) -> SourceFuture<'a, StartedExecution> {
        let state_machine_arn = state_machine_arn.to_string();
        self.blocking(move |source| source.start_sync(&state_machine_arn, input, name))
    }

    fn stop_execution<'a>(&'a self, execution_arn: &'a str) -> SourceFuture<'a, ()> {
        let execution_arn = execution_arn.to_string();
        self.blocking(move |source| {
            source.update_details(&execution_arn, |details| {
                details.status = ExecutionStatus::Aborted;
                details.stop_date = Some(Utc::now());
            })
        })
    }

    fn redrive_execution<'a>(&'a self, execution_arn: &'a str) -> SourceFuture<'a, ()> {
        let execution_arn = execution_arn.to_string();
        self.blocking(move |source| {
            source.update_details(&execution_arn, |details| {
                details.status = ExecutionStatus::Running;
                details.stop_date = None;
                details.redrive_count = Some(details.redrive_count.unwrap_or(0) + 1);
            })
        })
    }
}
