// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::types::Environment;

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// poll_interval = "5s"
/// data_dir = "data"
///
/// [workflow.summarize]
/// files = { output_directory = "summaries" }
///
/// [workflow.summarize.environments]
/// production = "arn:aws:states:eu-west-1:123456789012:stateMachine:summarize"
///
/// [workflow.summarize.parameters.language]
/// description = "Output language"
/// type = "select"
/// options = ["en", "es"]
/// default = "en"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All workflows from `[workflow.<name>]`, keyed by name.
    #[serde(default)]
    pub workflow: BTreeMap<String, WorkflowConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub workflow: BTreeMap<String, WorkflowConfig>,
    /// `config.poll_interval`, parsed.
    pub poll_interval: Duration,
}

impl ConfigFile {
    /// Assemble without validation; callers outside `validate` should go
    /// through `TryFrom<RawConfigFile>`.
    pub fn new_unchecked(
        config: ConfigSection,
        workflow: BTreeMap<String, WorkflowConfig>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            config,
            workflow,
            poll_interval,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How often a watched execution is re-polled (`"500ms"`, `"5s"`, `"1m"`).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Root of the directory-backed collaborator.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bucket holding generated artifacts.
    #[serde(default = "default_artifact_bucket")]
    pub artifact_bucket: String,

    /// List generated files newest first.
    #[serde(default = "default_true")]
    pub sort_files_by_date: bool,

    /// Executions shown by `list`.
    #[serde(default = "default_max_executions")]
    pub max_executions: usize,

    /// History events per page.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,

    /// Consecutive failed polls before the user is told.
    #[serde(default = "default_failure_notify_threshold")]
    pub failure_notify_threshold: u32,
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_artifact_bucket() -> String {
    "wf-nlp-tasks".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_executions() -> usize {
    20
}

fn default_history_page_size() -> usize {
    100
}

fn default_failure_notify_threshold() -> u32 {
    3
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            data_dir: default_data_dir(),
            artifact_bucket: default_artifact_bucket(),
            sort_files_by_date: default_true(),
            max_executions: default_max_executions(),
            history_page_size: default_history_page_size(),
            failure_notify_threshold: default_failure_notify_threshold(),
        }
    }
}

/// `[workflow.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub environments: EnvironmentArns,

    /// Launch parameters, keyed by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterConfig>,

    pub files: FilesConfig,
}

impl WorkflowConfig {
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// State machine ARN per environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentArns {
    #[serde(default)]
    pub production: Option<String>,
    #[serde(default)]
    pub development: Option<String>,
    #[serde(default)]
    pub staging: Option<String>,
}

impl EnvironmentArns {
    pub fn arn_for(&self, environment: Environment) -> Option<&str> {
        match environment {
            Environment::Production => self.production.as_deref(),
            Environment::Development => self.development.as_deref(),
            Environment::Staging => self.staging.as_deref(),
        }
    }

    /// Configured `(environment, arn)` pairs.
    pub fn configured(&self) -> Vec<(Environment, &str)> {
        [
            Environment::Production,
            Environment::Development,
            Environment::Staging,
        ]
        .into_iter()
        .filter_map(|env| self.arn_for(env).map(|arn| (env, arn)))
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Prefix under which an execution's files live: `<dir>/<execution id>/`.
    pub output_directory: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Text,
    Select,
    Integer,
    Boolean,
}

/// `[workflow.<name>.parameters.<param>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterConfig {
    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: ParameterType,

    #[serde(default)]
    pub default: Option<ParameterValue>,

    /// `select` only: accept several options.
    #[serde(default)]
    pub multiple: bool,

    /// `select` only: allowed values.
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// A typed parameter value (configured default or coerced form input).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl ParameterValue {
    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::Boolean(b) => Value::Bool(*b),
            ParameterValue::Integer(i) => Value::from(*i),
            ParameterValue::Text(s) => Value::String(s.clone()),
            ParameterValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}
