// src/definition/mod.rs

//! Workflow definitions and execution history.
//!
//! - [`model`] parses the service's JSON definition into a closed set of
//!   state descriptors.
//! - [`history`] models history events and replays them into a
//!   [`StatusMap`].
//! - [`inspect`] reports dangling transitions, unreachable states and node-id
//!   collisions.

pub mod history;
pub mod inspect;
pub mod model;

pub use history::{HistoryEvent, StateEventDetails, StatusMap};
pub use inspect::{DefinitionReport, inspect};
pub use model::{ChoiceState, StateDescriptor, StateKind, StateName, StepState, WorkflowDefinition};
