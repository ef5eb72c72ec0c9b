// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - TOML-backed data model (`model.rs`).
//! - Loading from disk (`loader.rs`).
//! - Semantic checks such as ARN shape and parameter typing (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, ConfigSection, EnvironmentArns, FilesConfig, ParameterConfig, ParameterType,
    ParameterValue, RawConfigFile, WorkflowConfig,
};
pub use validate::parse_duration;
