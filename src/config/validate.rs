// src/config/validate.rs

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::config::model::{
    ConfigFile, ParameterConfig, ParameterType, ParameterValue, RawConfigFile, WorkflowConfig,
};
use crate::errors::{Result, SfnwatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SfnwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let poll_interval = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.workflow, poll_interval))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<Duration> {
    ensure_has_workflows(cfg)?;
    let poll_interval = validate_global_config(cfg)?;
    for (name, workflow) in cfg.workflow.iter() {
        validate_workflow(name, workflow)?;
    }
    Ok(poll_interval)
}

fn config_error(message: String) -> SfnwatchError {
    SfnwatchError::ConfigError(message)
}

fn ensure_has_workflows(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workflow.is_empty() {
        return Err(config_error(
            "config must contain at least one [workflow.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<Duration> {
    let poll_interval = parse_duration(&cfg.config.poll_interval)
        .map_err(|e| config_error(format!("[config].poll_interval: {e}")))?;
    if poll_interval.is_zero() {
        return Err(config_error(
            "[config].poll_interval must be greater than zero".to_string(),
        ));
    }

    if cfg.config.history_page_size == 0 {
        return Err(config_error(
            "[config].history_page_size must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.max_executions == 0 {
        return Err(config_error(
            "[config].max_executions must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.artifact_bucket.trim().is_empty() {
        return Err(config_error(
            "[config].artifact_bucket must not be empty".to_string(),
        ));
    }

    Ok(poll_interval)
}

fn state_machine_arn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^arn:aws:states:[a-z0-9-]+:\d{12}:stateMachine:.+$")
            .expect("state machine ARN pattern is valid")
    })
}

fn validate_workflow(name: &str, workflow: &WorkflowConfig) -> Result<()> {
    let configured = workflow.environments.configured();
    if configured.is_empty() {
        return Err(config_error(format!(
            "workflow '{name}' must define at least one environment ARN"
        )));
    }

    for (environment, arn) in configured {
        if !state_machine_arn_pattern().is_match(arn) {
            return Err(config_error(format!(
                "workflow '{name}' has an invalid {environment} ARN: {arn}"
            )));
        }
    }

    if workflow.files.output_directory.trim().is_empty() {
        return Err(config_error(format!(
            "workflow '{name}' has an empty files.output_directory"
        )));
    }

    for (param, spec) in workflow.parameters.iter() {
        if param == "execution_name" {
            return Err(config_error(format!(
                "workflow '{name}': parameter name 'execution_name' is reserved"
            )));
        }
        validate_parameter(name, param, spec)?;
    }

    Ok(())
}

fn validate_parameter(workflow: &str, param: &str, spec: &ParameterConfig) -> Result<()> {
    let context = format!("workflow '{workflow}', parameter '{param}'");

    match (spec.kind, &spec.options) {
        (ParameterType::Select, None) => {
            return Err(config_error(format!(
                "{context}: options are required when type is 'select'"
            )));
        }
        (ParameterType::Select, Some(options)) if options.is_empty() => {
            return Err(config_error(format!(
                "{context}: options must not be empty"
            )));
        }
        (ParameterType::Select, Some(_)) => {}
        (_, Some(_)) => {
            return Err(config_error(format!(
                "{context}: options are only allowed when type is 'select'"
            )));
        }
        (_, None) => {}
    }

    if spec.multiple && spec.kind != ParameterType::Select {
        return Err(config_error(format!(
            "{context}: multiple is only allowed when type is 'select'"
        )));
    }

    if let Some(default) = &spec.default {
        if !default_matches(spec, default) {
            return Err(config_error(format!(
                "{context}: default {default:?} does not match type {:?}",
                spec.kind
            )));
        }
    }

    Ok(())
}

fn default_matches(spec: &ParameterConfig, default: &ParameterValue) -> bool {
    let options = spec.options.as_deref().unwrap_or_default();
    match (spec.kind, default) {
        (ParameterType::String | ParameterType::Text, ParameterValue::Text(_)) => true,
        (ParameterType::Integer, ParameterValue::Integer(_)) => true,
        (ParameterType::Boolean, ParameterValue::Boolean(_)) => true,
        (ParameterType::Select, ParameterValue::Text(value)) => options.contains(value),
        (ParameterType::Select, ParameterValue::List(values)) => {
            spec.multiple && values.iter().all(|v| options.contains(v))
        }
        _ => false,
    }
}

/// Parse a duration such as `"250ms"`, `"5s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
