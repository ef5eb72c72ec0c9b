#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use sfnwatch::config::{
    ConfigFile, ConfigSection, EnvironmentArns, FilesConfig, ParameterConfig, ParameterType,
    ParameterValue, RawConfigFile, WorkflowConfig,
};
use sfnwatch::definition::WorkflowDefinition;
use sfnwatch::types::Environment;

/// Builder for workflow definition JSON.
///
/// States keep insertion order, which is the order nodes and edges are
/// emitted in.
pub struct DefinitionBuilder {
    start_at: Option<String>,
    states: Map<String, Value>,
}

impl DefinitionBuilder {
    pub fn new(start_at: &str) -> Self {
        Self {
            start_at: Some(start_at.to_string()),
            states: Map::new(),
        }
    }

    /// A definition without `StartAt`.
    pub fn without_start() -> Self {
        Self {
            start_at: None,
            states: Map::new(),
        }
    }

    /// A state of any type with an optional `Next`.
    pub fn state(mut self, name: &str, type_name: &str, next: Option<&str>) -> Self {
        let mut state = Map::new();
        state.insert("Type".to_string(), json!(type_name));
        match next {
            Some(next) => {
                state.insert("Next".to_string(), json!(next));
            }
            None if !matches!(type_name, "Succeed" | "Fail") => {
                state.insert("End".to_string(), json!(true));
            }
            None => {}
        }
        self.states.insert(name.to_string(), Value::Object(state));
        self
    }

    pub fn task(self, name: &str, next: &str) -> Self {
        self.state(name, "Task", Some(next))
    }

    /// A Task state with `End: true`.
    pub fn end_task(self, name: &str) -> Self {
        self.state(name, "Task", None)
    }

    pub fn pass(self, name: &str, next: &str) -> Self {
        self.state(name, "Pass", Some(next))
    }

    pub fn succeed(self, name: &str) -> Self {
        self.state(name, "Succeed", None)
    }

    pub fn fail(self, name: &str) -> Self {
        self.state(name, "Fail", None)
    }

    /// A Choice state with one rule per branch target.
    pub fn choice(mut self, name: &str, branches: &[&str], default: Option<&str>) -> Self {
        let rules: Vec<Value> = branches
            .iter()
            .enumerate()
            .map(|(i, next)| {
                json!({
                    "Variable": "$.branch",
                    "NumericEquals": i,
                    "Next": next,
                })
            })
            .collect();

        let mut state = Map::new();
        state.insert("Type".to_string(), json!("Choice"));
        state.insert("Choices".to_string(), Value::Array(rules));
        if let Some(default) = default {
            state.insert("Default".to_string(), json!(default));
        }
        self.states.insert(name.to_string(), Value::Object(state));
        self
    }

    /// Insert raw JSON for a state, for shapes the helpers do not cover.
    pub fn raw_state(mut self, name: &str, state: Value) -> Self {
        self.states.insert(name.to_string(), state);
        self
    }

    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("Comment".to_string(), json!("test definition"));
        if let Some(start) = &self.start_at {
            root.insert("StartAt".to_string(), json!(start));
        }
        root.insert("States".to_string(), Value::Object(self.states.clone()));
        Value::Object(root)
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    pub fn build(self) -> WorkflowDefinition {
        WorkflowDefinition::from_value(&self.to_value())
            .expect("Failed to build valid definition from builder")
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                workflow: BTreeMap::new(),
            },
        }
    }

    pub fn with_workflow(mut self, name: &str, workflow: WorkflowConfig) -> Self {
        self.config.workflow.insert(name.to_string(), workflow);
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.config.config.poll_interval = interval.to_string();
        self
    }

    pub fn failure_notify_threshold(mut self, threshold: u32) -> Self {
        self.config.config.failure_notify_threshold = threshold;
        self
    }

    pub fn artifact_bucket(mut self, bucket: &str) -> Self {
        self.config.config.artifact_bucket = bucket.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WorkflowConfig`.
pub struct WorkflowConfigBuilder {
    workflow: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn new(output_directory: &str) -> Self {
        Self {
            workflow: WorkflowConfig {
                display_name: None,
                environments: EnvironmentArns::default(),
                parameters: BTreeMap::new(),
                files: FilesConfig {
                    output_directory: output_directory.to_string(),
                },
            },
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.workflow.display_name = Some(name.to_string());
        self
    }

    pub fn arn(mut self, environment: Environment, arn: &str) -> Self {
        let slot = match environment {
            Environment::Production => &mut self.workflow.environments.production,
            Environment::Development => &mut self.workflow.environments.development,
            Environment::Staging => &mut self.workflow.environments.staging,
        };
        *slot = Some(arn.to_string());
        self
    }

    pub fn param(mut self, name: &str, param: ParameterConfig) -> Self {
        self.workflow.parameters.insert(name.to_string(), param);
        self
    }

    pub fn build(self) -> WorkflowConfig {
        self.workflow
    }
}

/// Builder for `ParameterConfig`.
pub struct ParameterBuilder {
    param: ParameterConfig,
}

impl ParameterBuilder {
    pub fn new(kind: ParameterType) -> Self {
        Self {
            param: ParameterConfig {
                description: String::new(),
                kind,
                default: None,
                multiple: false,
                options: None,
            },
        }
    }

    pub fn select(options: &[&str]) -> Self {
        let mut builder = Self::new(ParameterType::Select);
        builder.param.options = Some(options.iter().map(|o| o.to_string()).collect());
        builder
    }

    pub fn description(mut self, description: &str) -> Self {
        self.param.description = description.to_string();
        self
    }

    pub fn default_value(mut self, value: ParameterValue) -> Self {
        self.param.default = Some(value);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.param.multiple = multiple;
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.param.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }

    pub fn build(self) -> ParameterConfig {
        self.param
    }
}
