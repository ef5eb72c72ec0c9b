// src/launch.rs

//! Turning launch form values into a start request.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::model::{ParameterConfig, ParameterType, ParameterValue, WorkflowConfig};
use crate::errors::{Result, SfnwatchError};

/// Form field holding the optional user-supplied execution name.
pub const EXECUTION_NAME_FIELD: &str = "execution_name";

const MAX_NAME_LENGTH: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Raw form values keyed by field name.
pub type FormValues = BTreeMap<String, String>;

fn invalid_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("name pattern is valid"))
}

fn underscore_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_+").expect("underscore pattern is valid"))
}

/// Derive an execution name the service accepts from free-form user input.
///
/// Characters outside `[a-zA-Z0-9_-]` become `_`, runs of `_` collapse, and a
/// UTC timestamp is appended. The cleaned part is truncated so the whole name
/// fits in 80 characters.
pub fn create_valid_name(user_input: &str, now: DateTime<Utc>) -> String {
    let cleaned = invalid_chars().replace_all(user_input, "_");
    let cleaned = underscore_runs().replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches('_');

    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    if cleaned.is_empty() {
        return timestamp;
    }

    let budget = MAX_NAME_LENGTH - timestamp.len() - 1;
    // Only ASCII survives the cleanup, so byte truncation is safe.
    let cleaned = cleaned[..cleaned.len().min(budget)].trim_end_matches('_');
    format!("{cleaned}_{timestamp}")
}

/// Everything needed to start an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub state_machine_arn: String,
    pub name: Option<String>,
    /// JSON object text.
    pub input: String,
}

impl StartRequest {
    /// Build a request from form values.
    ///
    /// Every configured parameter is coerced to its type. Blank or missing
    /// values fall back to the configured default, or are left out of the
    /// input. Fields that are not configured parameters are rejected.
    pub fn from_form(
        workflow: &WorkflowConfig,
        state_machine_arn: &str,
        values: &FormValues,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if let Some(unknown) = values
            .keys()
            .find(|k| k.as_str() != EXECUTION_NAME_FIELD && !workflow.parameters.contains_key(*k))
        {
            return Err(SfnwatchError::InvalidParameter(format!(
                "unknown parameter '{unknown}'"
            )));
        }

        let mut input = Map::new();
        for (name, spec) in workflow.parameters.iter() {
            let raw = values.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
            let value = match raw {
                Some(raw) => Some(coerce(name, spec, raw)?),
                None => spec.default.clone(),
            };
            if let Some(value) = value {
                input.insert(name.clone(), value.to_json());
            }
        }

        let name = values
            .get(EXECUTION_NAME_FIELD)
            .map(|raw| create_valid_name(raw, now));

        Ok(Self {
            state_machine_arn: state_machine_arn.to_string(),
            name,
            input: Value::Object(input).to_string(),
        })
    }
}

/// Coerce one raw form value by the parameter's type.
pub fn coerce(name: &str, spec: &ParameterConfig, raw: &str) -> Result<ParameterValue> {
    let invalid = |expected: &str| {
        SfnwatchError::InvalidParameter(format!("'{name}' expects {expected}, got {raw:?}"))
    };

    match spec.kind {
        ParameterType::String | ParameterType::Text => Ok(ParameterValue::Text(raw.to_string())),
        ParameterType::Integer => raw
            .parse::<i64>()
            .map(ParameterValue::Integer)
            .map_err(|_| invalid("an integer")),
        ParameterType::Boolean => match raw.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(ParameterValue::Boolean(true)),
            "false" | "no" | "off" | "0" => Ok(ParameterValue::Boolean(false)),
            _ => Err(invalid("a boolean")),
        },
        ParameterType::Select => {
            let options = spec.options.as_deref().unwrap_or_default();
            let check = |choice: &str| -> Result<String> {
                if options.iter().any(|o| o == choice) {
                    Ok(choice.to_string())
                } else {
                    Err(invalid(&format!("one of {options:?}")))
                }
            };

            if spec.multiple {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(check)
                    .collect::<Result<Vec<_>>>()
                    .map(ParameterValue::List)
            } else {
                check(raw).map(ParameterValue::Text)
            }
        }
    }
}

/// Turn a previous execution's input into form values, for relaunching.
///
/// Lists become comma-separated values; nested objects are kept as JSON
/// text; `null` fields are dropped.
pub fn prefill_from_input(input_json: &str) -> Result<FormValues> {
    let value: Value = serde_json::from_str(input_json)?;
    let Value::Object(fields) = value else {
        return Err(SfnwatchError::InvalidParameter(
            "execution input is not a JSON object".to_string(),
        ));
    };

    let mut values = FormValues::new();
    for (key, value) in fields {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            other @ Value::Object(_) => other.to_string(),
        };
        values.insert(key, text);
    }
    Ok(values)
}
