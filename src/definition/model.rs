// src/definition/model.rs

use std::fmt;

use serde_json::Value;

use crate::errors::{Result, SfnwatchError};

/// Canonical state name type used throughout the crate.
pub type StateName = String;

/// Known state kinds of the workflow language.
///
/// Anything unrecognised (including a missing `Type`) becomes `Unknown` and is
/// rendered like any other non-Choice state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKind {
    Task,
    Pass,
    Choice,
    Wait,
    Succeed,
    Fail,
    Parallel,
    Map,
    Unknown(String),
}

impl StateKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Task" => StateKind::Task,
            "Pass" => StateKind::Pass,
            "Choice" => StateKind::Choice,
            "Wait" => StateKind::Wait,
            "Succeed" => StateKind::Succeed,
            "Fail" => StateKind::Fail,
            "Parallel" => StateKind::Parallel,
            "Map" => StateKind::Map,
            other => StateKind::Unknown(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            StateKind::Task => "Task",
            StateKind::Pass => "Pass",
            StateKind::Choice => "Choice",
            StateKind::Wait => "Wait",
            StateKind::Succeed => "Succeed",
            StateKind::Fail => "Fail",
            StateKind::Parallel => "Parallel",
            StateKind::Map => "Map",
            StateKind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A branching state: one target per choice rule, plus an optional default.
///
/// Rule conditions are dropped at parse time; only the targets survive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChoiceState {
    pub branches: Vec<StateName>,
    pub default: Option<StateName>,
}

/// Any non-Choice state: at most one outgoing transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepState {
    pub kind: StateKind,
    pub next: Option<StateName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDescriptor {
    Choice(ChoiceState),
    Step(StepState),
}

impl StateDescriptor {
    /// Convenience constructor for a non-Choice state.
    pub fn step(kind: StateKind, next: Option<&str>) -> Self {
        StateDescriptor::Step(StepState {
            kind,
            next: next.map(str::to_string),
        })
    }

    /// Convenience constructor for a Choice state.
    pub fn choice<I, S>(branches: I, default: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateName>,
    {
        StateDescriptor::Choice(ChoiceState {
            branches: branches.into_iter().map(Into::into).collect(),
            default: default.map(str::to_string),
        })
    }

    pub fn kind(&self) -> StateKind {
        match self {
            StateDescriptor::Choice(_) => StateKind::Choice,
            StateDescriptor::Step(step) => step.kind.clone(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, StateDescriptor::Choice(_))
    }

    /// Outgoing transition targets in emission order: branches then default
    /// for Choice states, `next` otherwise.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            StateDescriptor::Choice(choice) => choice
                .branches
                .iter()
                .map(String::as_str)
                .chain(choice.default.as_deref())
                .collect(),
            StateDescriptor::Step(step) => step.next.as_deref().into_iter().collect(),
        }
    }

    fn from_value(raw: &Value) -> Self {
        let type_name = raw.get("Type").and_then(Value::as_str).unwrap_or("");
        match StateKind::from_type_name(type_name) {
            StateKind::Choice => {
                let branches = raw
                    .get("Choices")
                    .and_then(Value::as_array)
                    .map(|rules| {
                        rules
                            .iter()
                            .filter_map(|rule| string_field(rule, "Next"))
                            .collect()
                    })
                    .unwrap_or_default();
                StateDescriptor::Choice(ChoiceState {
                    branches,
                    default: string_field(raw, "Default"),
                })
            }
            kind => StateDescriptor::Step(StepState {
                kind,
                next: string_field(raw, "Next"),
            }),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A parsed workflow definition.
///
/// `states` keeps document order; edge order in the rendered graph follows it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowDefinition {
    pub start_at: Option<StateName>,
    pub states: Vec<(StateName, StateDescriptor)>,
}

impl WorkflowDefinition {
    pub fn new(start_at: Option<&str>, states: Vec<(StateName, StateDescriptor)>) -> Self {
        Self {
            start_at: start_at.map(str::to_string),
            states,
        }
    }

    /// Parse definition text as returned by the workflow service.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            SfnwatchError::MalformedDefinition(format!("definition is not valid JSON: {e}"))
        })?;
        Self::from_value(&value)
    }

    /// Build from an already-parsed JSON document.
    ///
    /// The only structural requirement is a top-level `States` object; states
    /// themselves are accepted as-is.
    pub fn from_value(value: &Value) -> Result<Self> {
        let states = value
            .get("States")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                SfnwatchError::MalformedDefinition(
                    "definition has no top-level \"States\" object".to_string(),
                )
            })?;

        Ok(Self {
            start_at: string_field(value, "StartAt"),
            states: states
                .iter()
                .map(|(name, raw)| (name.clone(), StateDescriptor::from_value(raw)))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&StateDescriptor> {
        self.states
            .iter()
            .find(|(state, _)| state == name)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
