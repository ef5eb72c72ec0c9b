// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{Environment, ExecutionStatus};

/// Command-line arguments for `sfnwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sfnwatch",
    version,
    about = "Watch workflow executions and render their live state graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$SFNWATCH_CONFIG`, else `Sfnwatch.toml` in the current
    /// working directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SFNWATCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse + validate the config and print a summary.
    Check,

    /// Recent executions of a workflow and per-status counts.
    List {
        #[command(flatten)]
        selection: Selection,
    },

    /// Watch one execution, printing its report and graph on every change.
    Watch {
        #[command(flatten)]
        selection: Selection,

        /// Execution id (last segment of the execution ARN).
        execution_id: String,

        /// Print the current state once and exit.
        #[arg(long)]
        once: bool,
    },

    /// Render a graph offline from local files.
    Render {
        /// Definition JSON file.
        #[arg(long, value_name = "FILE")]
        definition: PathBuf,

        /// History events JSON file (array of events).
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Execution status to render with.
        #[arg(long, value_name = "STATUS", default_value = "RUNNING")]
        status: ExecutionStatus,
    },

    /// Abort a running execution.
    Abort {
        #[command(flatten)]
        selection: Selection,
        execution_id: String,
    },

    /// Redrive a failed, timed out or aborted execution.
    Redrive {
        #[command(flatten)]
        selection: Selection,
        execution_id: String,
    },

    /// Start a new execution.
    Start {
        #[command(flatten)]
        selection: Selection,

        /// Free-form name; cleaned and timestamped before use.
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Parameter value, `key=value`. Repeatable.
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Prefill parameters from an earlier execution's input.
        #[arg(long, value_name = "EXECUTION_ID")]
        from: Option<String>,
    },
}

/// Workflow and environment selection shared by most commands.
#[derive(Debug, Clone, Args)]
pub struct Selection {
    /// Workflow name as configured under `[workflow.<name>]`.
    #[arg(long, short = 'w', value_name = "NAME")]
    pub workflow: String,

    /// Environment (production, development, staging).
    #[arg(long = "env", short = 'e', value_name = "ENV", default_value = "production")]
    pub environment: Environment,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
