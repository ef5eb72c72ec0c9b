// tests/directory_source.rs

mod common;
use crate::common::builders::DefinitionBuilder;
use crate::common::fixtures::{BUCKET, STATE_MACHINE_ARN, execution_details, reconciler_options};
use crate::common::init_tracing;
use crate::common::recording::RecordingNotifier;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use sfnwatch::definition::HistoryEvent;
use sfnwatch::engine::{Reconciler, WatchTarget};
use sfnwatch::errors::SfnwatchError;
use sfnwatch::fs::FileSystem;
use sfnwatch::fs::mock::MockFileSystem;
use sfnwatch::graph::StyleClass;
use sfnwatch::session::execution_arn;
use sfnwatch::source::{
    DirectorySource, ExecutionActions, ExecutionSource, ObjectListing, fetch_states_info,
};
use sfnwatch::types::{ExecutionStatus, StateStatus};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn definition_json() -> String {
    DefinitionBuilder::new("Fetch")
        .task("Fetch", "Summarize")
        .end_task("Summarize")
        .to_json()
}

fn write(path: &Path, contents: &str) -> TestResult {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Lay out one state machine with one execution under `root`.
fn seed_dir(root: &Path, id: &str, status: ExecutionStatus, events: &[HistoryEvent]) -> TestResult {
    let source = DirectorySource::new(root, 100);
    write(&source.state_machine_path(STATE_MACHINE_ARN), &definition_json())?;

    let details = execution_details(id, status);
    let dir = source.execution_dir(&details.execution_arn);
    write(&dir.join("execution.json"), &serde_json::to_string(&details)?)?;
    write(&dir.join("history.json"), &serde_json::to_string(events)?)?;
    Ok(())
}

#[tokio::test]
async fn reads_execution_definition_and_history_from_disk() -> TestResult {
    let tmp = tempdir()?;
    seed_dir(
        tmp.path(),
        "run-1",
        ExecutionStatus::Running,
        &[
            HistoryEvent::entered("TaskStateEntered", "Fetch"),
            HistoryEvent::exited("TaskStateExited", "Fetch"),
            HistoryEvent::entered("TaskStateEntered", "Summarize"),
        ],
    )?;
    let source = DirectorySource::new(tmp.path(), 2);
    let arn = execution_arn(STATE_MACHINE_ARN, "run-1");

    let details = source.describe_execution(&arn).await?;
    assert_eq!(details.status, ExecutionStatus::Running);
    assert_eq!(details.execution_id(), "run-1");

    // Page size 2 forces the history to be read across two pages.
    let (definition, states) = fetch_states_info(&source, STATE_MACHINE_ARN, &arn).await?;
    assert_eq!(definition.len(), 2);
    assert_eq!(states.get("Fetch"), StateStatus::Completed);
    assert_eq!(states.get("Summarize"), StateStatus::Running);
    Ok(())
}

#[tokio::test]
async fn service_shaped_documents_deserialize() -> TestResult {
    let tmp = tempdir()?;
    let source = DirectorySource::new(tmp.path(), 100);
    let arn = execution_arn(STATE_MACHINE_ARN, "from-service");
    write(&source.state_machine_path(STATE_MACHINE_ARN), &definition_json())?;

    let dir = source.execution_dir(&arn);
    let execution = json!({
        "executionArn": arn,
        "stateMachineArn": STATE_MACHINE_ARN,
        "name": "from-service",
        "status": "TIMED_OUT",
        "startDate": "2024-03-05T14:07:09Z",
        "stopDate": "2024-03-05T15:07:09Z",
        "input": "{\"topic\": \"rust\"}",
        "redriveCount": 0
    });
    let history = json!([
        {"type": "ExecutionStarted", "id": 1, "timestamp": "2024-03-05T14:07:09Z"},
        {"type": "TaskStateEntered", "id": 2, "stateEnteredEventDetails": {"name": "Fetch", "input": "{}"}},
        {"type": "ExecutionTimedOut", "id": 3}
    ]);
    write(&dir.join("execution.json"), &execution.to_string())?;
    write(&dir.join("history.json"), &history.to_string())?;

    let details = source.describe_execution(&arn).await?;
    assert_eq!(details.status, ExecutionStatus::TimedOut);
    assert_eq!(details.redrive_count, Some(0));

    let (_, states) = fetch_states_info(&source, STATE_MACHINE_ARN, &arn).await?;
    assert_eq!(states.get("Fetch"), StateStatus::Running);
    Ok(())
}

#[tokio::test]
async fn missing_history_file_means_no_events() -> TestResult {
    let tmp = tempdir()?;
    seed_dir(tmp.path(), "run-1", ExecutionStatus::Running, &[])?;
    let source = DirectorySource::new(tmp.path(), 100);
    let arn = execution_arn(STATE_MACHINE_ARN, "run-1");
    fs::remove_file(source.execution_dir(&arn).join("history.json"))?;

    let (_, states) = fetch_states_info(&source, STATE_MACHINE_ARN, &arn).await?;
    assert!(states.iter().all(|(_, s)| s == StateStatus::NotStarted));
    Ok(())
}

#[tokio::test]
async fn unknown_execution_is_not_found() -> TestResult {
    let tmp = tempdir()?;
    let source = DirectorySource::new(tmp.path(), 100);

    let err = source
        .describe_execution(&execution_arn(STATE_MACHINE_ARN, "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, SfnwatchError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn corrupt_execution_document_is_a_fetch_failure() -> TestResult {
    let tmp = tempdir()?;
    seed_dir(tmp.path(), "run-1", ExecutionStatus::Running, &[])?;
    let source = DirectorySource::new(tmp.path(), 100);
    let arn = execution_arn(STATE_MACHINE_ARN, "run-1");
    write(&source.execution_dir(&arn).join("execution.json"), "{ not json")?;

    let err = source.describe_execution(&arn).await.unwrap_err();
    assert!(matches!(err, SfnwatchError::FetchFailure(_)));
    assert!(err.is_transient());
    Ok(())
}

#[tokio::test]
async fn lists_executions_newest_first() -> TestResult {
    let tmp = tempdir()?;
    let source = DirectorySource::new(tmp.path(), 100);
    for (id, day) in [("older", 1), ("newest", 3), ("middle", 2)] {
        let mut details = execution_details(id, ExecutionStatus::Succeeded);
        details.start_date = Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap());
        let dir = source.execution_dir(&details.execution_arn);
        write(&dir.join("execution.json"), &serde_json::to_string(&details)?)?;
    }
    let other_machine = "arn:aws:states:eu-west-1:123456789012:stateMachine:other";
    let mut foreign = execution_details("foreign", ExecutionStatus::Running);
    foreign.state_machine_arn = other_machine.to_string();
    foreign.execution_arn = execution_arn(other_machine, "foreign");
    write(
        &source.execution_dir(&foreign.execution_arn).join("execution.json"),
        &serde_json::to_string(&foreign)?,
    )?;

    let listed = source.list_executions(STATE_MACHINE_ARN, 2).await?;
    let names: Vec<&str> = listed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["newest", "middle"]);
    Ok(())
}

#[tokio::test]
async fn lists_objects_under_a_prefix() -> TestResult {
    let tmp = tempdir()?;
    let objects = tmp.path().join("objects").join(BUCKET);
    write(&objects.join("summaries/run-1/summary.md"), "# summary")?;
    write(&objects.join("summaries/run-1/nested/chunk-0.json"), "{}")?;
    write(&objects.join("summaries/run-2/summary.md"), "# other")?;
    let source = DirectorySource::new(tmp.path(), 100);

    let entries = source.list_objects(BUCKET, "summaries/run-1/").await?;
    let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "summaries/run-1/nested/chunk-0.json",
            "summaries/run-1/summary.md"
        ]
    );
    assert!(entries.iter().all(|e| e.last_modified.is_some()));

    assert!(source.list_objects("missing-bucket", "").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn start_stop_and_redrive_persist_to_disk() -> TestResult {
    let tmp = tempdir()?;
    let source = DirectorySource::new(tmp.path(), 100);

    let started = source
        .start_execution(
            STATE_MACHINE_ARN,
            "{\"topic\":\"rust\"}".to_string(),
            Some("manual".to_string()),
        )
        .await?;
    assert_eq!(started.execution_id(), "manual");

    let details = source.describe_execution(&started.execution_arn).await?;
    assert_eq!(details.status, ExecutionStatus::Running);
    assert_eq!(details.input.as_deref(), Some("{\"topic\":\"rust\"}"));

    let duplicate = source
        .start_execution(STATE_MACHINE_ARN, "{}".to_string(), Some("manual".to_string()))
        .await;
    assert!(matches!(duplicate, Err(SfnwatchError::ActionFailure(_))));

    source.stop_execution(&started.execution_arn).await?;
    let stopped = source.describe_execution(&started.execution_arn).await?;
    assert_eq!(stopped.status, ExecutionStatus::Aborted);
    assert!(stopped.stop_date.is_some());

    source.redrive_execution(&started.execution_arn).await?;
    let redriven = source.describe_execution(&started.execution_arn).await?;
    assert_eq!(redriven.status, ExecutionStatus::Running);
    assert_eq!(redriven.redrive_count, Some(1));
    assert!(redriven.stop_date.is_none());
    Ok(())
}

#[tokio::test]
async fn reconciler_over_a_mock_filesystem() -> TestResult {
    init_tracing();
    let mock = MockFileSystem::new();
    let root = Path::new("data");
    let source = DirectorySource::with_fs(root, Arc::new(mock.clone()), 100);

    let details = execution_details("run-1", ExecutionStatus::Running);
    let dir = source.execution_dir(&details.execution_arn);
    mock.add_file(source.state_machine_path(STATE_MACHINE_ARN), definition_json());
    mock.add_file(dir.join("execution.json"), serde_json::to_string(&details)?);
    mock.add_file(
        dir.join("history.json"),
        serde_json::to_string(&[HistoryEvent::entered("TaskStateEntered", "Fetch")])?,
    );
    let objects = root.join("objects").join(BUCKET).join("summaries/run-1");
    mock.add_file_modified(
        objects.join("early.txt"),
        "a",
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    );
    mock.add_file_modified(
        objects.join("late.txt"),
        "b",
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    );

    let target = WatchTarget::new(STATE_MACHINE_ARN, details.execution_arn.clone());
    let mut reconciler = Reconciler::new(
        target,
        source.clone(),
        source.clone(),
        RecordingNotifier::new(),
        reconciler_options(Duration::from_secs(60), "run-1"),
    );

    let view = reconciler.initialize().await?;
    assert_eq!(view.graph.style_of("Fetch"), Some(StyleClass::Running));
    assert_eq!(view.graph.style_of("Summarize"), Some(StyleClass::NotStarted));
    assert_eq!(
        view.files,
        vec![
            "summaries/run-1/late.txt".to_string(),
            "summaries/run-1/early.txt".to_string()
        ]
    );

    // The "remote" side moves on; the next poll reads it from the mock.
    mock.add_file(
        dir.join("history.json"),
        serde_json::to_string(&[
            HistoryEvent::entered("TaskStateEntered", "Fetch"),
            HistoryEvent::exited("TaskStateExited", "Fetch"),
        ])?,
    );
    reconciler.tick().await;
    let view = reconciler.current().expect("view");
    assert_eq!(view.graph.style_of("Fetch"), Some(StyleClass::Completed));
    Ok(())
}

/// Filesystem whose reads hold the calling thread.
#[derive(Debug)]
struct StallingFileSystem {
    inner: MockFileSystem,
    stall: Duration,
}

impl FileSystem for StallingFileSystem {
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        std::thread::sleep(self.stall);
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        self.inner.write(path, contents)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }

    fn modified(&self, path: &Path) -> anyhow::Result<Option<DateTime<Utc>>> {
        self.inner.modified(path)
    }
}

#[tokio::test]
async fn slow_disk_reads_do_not_stall_the_runtime() -> TestResult {
    let mock = MockFileSystem::new();
    let stalling = StallingFileSystem {
        inner: mock.clone(),
        stall: Duration::from_millis(300),
    };
    let source = DirectorySource::with_fs("data", Arc::new(stalling), 100);
    mock.add_file(source.state_machine_path(STATE_MACHINE_ARN), definition_json());

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = tokio::spawn({
        let ticks = Arc::clone(&ticks);
        async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    let started = Instant::now();
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        source.describe_state_machine(STATE_MACHINE_ARN),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(started.elapsed() < Duration::from_millis(250));
    assert!(ticks.load(Ordering::SeqCst) > 0);

    // Without a deadline the same read still completes.
    let text = source.describe_state_machine(STATE_MACHINE_ARN).await?;
    assert_eq!(text, definition_json());

    ticker.abort();
    Ok(())
}
