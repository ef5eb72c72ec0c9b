// src/lib.rs

pub mod actions;
pub mod cli;
pub mod config;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod launch;
pub mod logging;
pub mod notify;
pub mod overview;
pub mod report;
pub mod session;
pub mod source;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::actions::ExecutionController;
use crate::cli::{CliArgs, Command, Selection};
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::ConfigFile;
use crate::definition::{HistoryEvent, StatusMap, WorkflowDefinition, inspect};
use crate::engine::{Reconciler, ReconcilerOptions, ViewState, WatchTarget};
use crate::graph::build_graph;
use crate::launch::{EXECUTION_NAME_FIELD, FormValues, StartRequest, prefill_from_input};
use crate::notify::LogNotifier;
use crate::overview::load_overview;
use crate::report::StatusReport;
use crate::session::{SessionContext, WorkflowTarget};
use crate::source::{DirectorySource, ExecutionSource};
use crate::types::ExecutionStatus;

/// High-level entry point used by `main.rs`.
///
/// Loads the config (except for `render`, which works on local files only),
/// builds the directory-backed collaborator and dispatches the command.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Render {
            definition,
            history,
            status,
        } => render_offline(&definition, history.as_deref(), status),
        command => {
            let config_path = args.config.unwrap_or_else(default_config_path);
            let cfg = load_and_validate(&config_path)
                .with_context(|| format!("loading config {}", config_path.display()))?;
            debug!(path = %config_path.display(), workflows = cfg.workflow.len(), "config loaded");
            run_with_config(&cfg, command).await
        }
    }
}

async fn run_with_config(cfg: &ConfigFile, command: Command) -> Result<()> {
    let source = DirectorySource::new(&cfg.config.data_dir, cfg.config.history_page_size);

    match command {
        Command::Check => {
            print_check(cfg);
            Ok(())
        }
        Command::List { selection } => {
            let target = resolve(cfg, &selection)?;
            list_executions(cfg, &source, &target).await
        }
        Command::Watch {
            selection,
            execution_id,
            once,
        } => {
            let target = resolve(cfg, &selection)?;
            watch_execution(cfg, source, &target, &execution_id, once).await
        }
        Command::Abort {
            selection,
            execution_id,
        } => {
            let target = resolve(cfg, &selection)?;
            let details = source
                .describe_execution(&target.execution_arn(&execution_id))
                .await?;
            ExecutionController::new(source, LogNotifier)
                .abort(&details)
                .await?;
            Ok(())
        }
        Command::Redrive {
            selection,
            execution_id,
        } => {
            let target = resolve(cfg, &selection)?;
            let details = source
                .describe_execution(&target.execution_arn(&execution_id))
                .await?;
            ExecutionController::new(source, LogNotifier)
                .redrive(&details)
                .await?;
            Ok(())
        }
        Command::Start {
            selection,
            name,
            params,
            from,
        } => {
            let target = resolve(cfg, &selection)?;
            start_execution(source, &target, name, params, from).await
        }
        Command::Render {
            definition,
            history,
            status,
        } => render_offline(&definition, history.as_deref(), status),
    }
}

fn resolve(cfg: &ConfigFile, selection: &Selection) -> Result<WorkflowTarget> {
    let session = SessionContext::new(selection.environment, Some(selection.workflow.clone()));
    let target = session.resolve(cfg)?;
    debug!(
        workflow = %target.name,
        environment = %session.environment,
        arn = %target.state_machine_arn,
        "resolved workflow"
    );
    Ok(target)
}

async fn list_executions(
    cfg: &ConfigFile,
    source: &DirectorySource,
    target: &WorkflowTarget,
) -> Result<()> {
    let overview =
        load_overview(source, &target.state_machine_arn, cfg.config.max_executions).await?;

    println!("{} ({})", target.display_name, target.state_machine_name());
    println!("  {}", overview.counts);
    println!();

    if overview.recent.is_empty() {
        println!("no executions");
        return Ok(());
    }

    for execution in &overview.recent {
        let started = execution
            .start_date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!("  {:<16} {:<20} {}", execution.status, started, execution.name);
    }
    Ok(())
}

async fn watch_execution(
    cfg: &ConfigFile,
    source: DirectorySource,
    target: &WorkflowTarget,
    execution_id: &str,
    once: bool,
) -> Result<()> {
    log_definition_report(&source, &target.state_machine_arn).await;

    let options = ReconcilerOptions::from_config(cfg, target.files_prefix(execution_id));
    let mut reconciler = Reconciler::new(
        WatchTarget::for_execution(target, execution_id),
        source.clone(),
        source,
        LogNotifier,
        options,
    );

    let view = reconciler.initialize().await?;
    print_view(&view);

    if once {
        return Ok(());
    }

    let handle = reconciler.spawn();
    let mut views = handle.subscribe();

    info!(execution = %execution_id, "watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = views.borrow_and_update().clone();
                if let Some(view) = current {
                    print_view(&view);
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn log_definition_report(source: &DirectorySource, state_machine_arn: &str) {
    let definition = match source.describe_state_machine(state_machine_arn).await {
        Ok(text) => WorkflowDefinition::from_json(&text),
        Err(e) => Err(e),
    };

    match definition {
        Ok(definition) => {
            let report = inspect(&definition);
            if !report.is_clean() {
                warn!(
                    dangling = ?report.dangling,
                    missing_start = ?report.missing_start,
                    unreachable = ?report.unreachable,
                    id_collisions = ?report.id_collisions,
                    "definition has structural issues"
                );
            }
        }
        Err(e) => warn!(error = %e, "could not inspect definition"),
    }
}

async fn start_execution(
    source: DirectorySource,
    target: &WorkflowTarget,
    name: Option<String>,
    params: Vec<(String, String)>,
    from: Option<String>,
) -> Result<()> {
    let mut values = FormValues::new();

    if let Some(previous) = from {
        let details = source
            .describe_execution(&target.execution_arn(&previous))
            .await?;
        let input = details.input.as_deref().unwrap_or("{}");
        values.extend(
            prefill_from_input(input)?
                .into_iter()
                .filter(|(key, _)| target.config.parameters.contains_key(key)),
        );
    }

    values.extend(params);
    if let Some(name) = name {
        values.insert(EXECUTION_NAME_FIELD.to_string(), name);
    }

    let request = StartRequest::from_form(
        &target.config,
        &target.state_machine_arn,
        &values,
        Utc::now(),
    )?;
    let started = ExecutionController::new(source, LogNotifier)
        .start(&request)
        .await?;

    println!("{}", started.execution_id());
    Ok(())
}

fn render_offline(
    definition_path: &Path,
    history_path: Option<&Path>,
    status: ExecutionStatus,
) -> Result<()> {
    let text = std::fs::read_to_string(definition_path)
        .with_context(|| format!("reading {}", definition_path.display()))?;
    let definition = WorkflowDefinition::from_json(&text)?;

    let events: Vec<HistoryEvent> = match history_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing history {}", path.display()))?
        }
        None => Vec::new(),
    };

    let states = StatusMap::replay(&definition, &events);
    let graph = build_graph(&definition, &states, status);
    println!("{}", graph.to_mermaid());
    Ok(())
}

fn print_view(view: &ViewState) {
    println!("{}", StatusReport::from_view(view));
    println!("{}", view.graph.to_mermaid());
    println!();
}

/// Dry-run output: global config and every workflow.
fn print_check(cfg: &ConfigFile) {
    println!("sfnwatch config check");
    println!("  config.poll_interval = {:?}", cfg.poll_interval);
    println!("  config.data_dir = {}", cfg.config.data_dir.display());
    println!("  config.artifact_bucket = {}", cfg.config.artifact_bucket);
    println!();

    println!("workflows ({}):", cfg.workflow.len());
    for (name, workflow) in cfg.workflow.iter() {
        println!("  - {name}");
        if let Some(display_name) = workflow.display_name() {
            println!("      display_name: {display_name}");
        }
        for (environment, arn) in workflow.environments.configured() {
            println!("      {environment}: {arn}");
        }
        println!("      files: {}", workflow.files.output_directory);
        for (param, spec) in workflow.parameters.iter() {
            println!("      param {param}: {:?}", spec.kind);
        }
    }

    debug!("config check complete");
}
