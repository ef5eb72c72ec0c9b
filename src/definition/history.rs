// src/definition/history.rs

//! Execution history events and the per-state status map replayed from them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::definition::model::{StateName, WorkflowDefinition};
use crate::types::StateStatus;

/// Name carried by state entered/exited event details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEventDetails {
    pub name: StateName,
}

/// One event of an execution history, in the service's JSON shape.
///
/// Only the fields the status replay needs are modelled; everything else in
/// the document is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// RFC 3339 text or epoch seconds; both forms appear in mirrored histories.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_entered_event_details: Option<StateEventDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_exited_event_details: Option<StateEventDetails>,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(DateTime<Utc>),
        EpochSeconds(f64),
    }

    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Text(at)) => Ok(Some(at)),
        Some(RawTimestamp::EpochSeconds(secs)) => {
            let whole = secs.floor();
            let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
            DateTime::from_timestamp(whole as i64, nanos)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {secs}")))
        }
    }
}

impl HistoryEvent {
    /// An event with no state details (e.g. `ExecutionStarted`).
    pub fn other(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            id: None,
            timestamp: None,
            state_entered_event_details: None,
            state_exited_event_details: None,
        }
    }

    pub fn entered(event_type: &str, state: &str) -> Self {
        Self {
            state_entered_event_details: Some(StateEventDetails {
                name: state.to_string(),
            }),
            ..Self::other(event_type)
        }
    }

    pub fn exited(event_type: &str, state: &str) -> Self {
        Self {
            state_exited_event_details: Some(StateEventDetails {
                name: state.to_string(),
            }),
            ..Self::other(event_type)
        }
    }

    /// The status change this event implies, if any.
    ///
    /// Event types are matched by substring (`TaskStateEntered`,
    /// `ChoiceStateExited`, ...), so every state kind is covered.
    pub fn transition(&self) -> Option<(&str, StateStatus)> {
        if self.event_type.contains("StateEntered") {
            self.state_entered_event_details
                .as_ref()
                .map(|d| (d.name.as_str(), StateStatus::Running))
        } else if self.event_type.contains("StateExited") {
            self.state_exited_event_details
                .as_ref()
                .map(|d| (d.name.as_str(), StateStatus::Completed))
        } else {
            None
        }
    }
}

/// Mapping from state name to its current status.
///
/// Lookups for absent states yield [`StateStatus::NotStarted`]. Equality is by
/// value over the full key set, which is what the reconciler diffs on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusMap {
    states: BTreeMap<StateName, StateStatus>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every state of the definition, all `NotStarted`.
    pub fn seeded(definition: &WorkflowDefinition) -> Self {
        Self {
            states: definition
                .state_names()
                .map(|name| (name.to_string(), StateStatus::NotStarted))
                .collect(),
        }
    }

    /// Seed from the definition, then apply every event in order.
    pub fn replay<'a, I>(definition: &WorkflowDefinition, events: I) -> Self
    where
        I: IntoIterator<Item = &'a HistoryEvent>,
    {
        let mut map = Self::seeded(definition);
        for event in events {
            map.apply(event);
        }
        map
    }

    /// Apply a single history event. Returns true if a status was written.
    pub fn apply(&mut self, event: &HistoryEvent) -> bool {
        match event.transition() {
            Some((name, status)) => {
                self.states.insert(name.to_string(), status);
                true
            }
            None => false,
        }
    }

    pub fn insert(&mut self, name: impl Into<StateName>, status: StateStatus) {
        self.states.insert(name.into(), status);
    }

    pub fn get(&self, name: &str) -> StateStatus {
        self.states.get(name).copied().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StateStatus)> {
        self.states.iter().map(|(name, status)| (name.as_str(), *status))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Names whose status differs between `self` and `other` (including keys
    /// present on one side only). Used for change logging.
    pub fn changed_states(&self, other: &StatusMap) -> Vec<StateName> {
        let mut changed: Vec<StateName> = self
            .states
            .iter()
            .filter(|(name, status)| other.states.get(*name) != Some(*status))
            .map(|(name, _)| name.clone())
            .collect();
        changed.extend(
            other
                .states
                .keys()
                .filter(|name| !self.states.contains_key(*name))
                .cloned(),
        );
        changed.sort();
        changed
    }
}

impl<S: Into<StateName>> FromIterator<(S, StateStatus)> for StatusMap {
    fn from_iter<T: IntoIterator<Item = (S, StateStatus)>>(iter: T) -> Self {
        Self {
            states: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
