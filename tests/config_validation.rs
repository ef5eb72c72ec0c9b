// tests/config_validation.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, ParameterBuilder, WorkflowConfigBuilder};
use crate::common::fixtures::{OUTPUT_DIRECTORY, STATE_MACHINE_ARN};

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use sfnwatch::config::{
    ConfigFile, ParameterType, ParameterValue, load_and_validate, load_from_str, parse_duration,
};
use sfnwatch::errors::SfnwatchError;
use sfnwatch::types::Environment;
use tempfile::{NamedTempFile, tempdir};

type TestResult = Result<(), Box<dyn Error>>;

const FULL_CONFIG: &str = r#"
[config]
poll_interval = "2s"
data_dir = "mirror"
artifact_bucket = "nlp-artifacts"
failure_notify_threshold = 5

[workflow.summarize]
display_name = "Summarize documents"
files.output_directory = "summaries"

[workflow.summarize.environments]
production = "arn:aws:states:eu-west-1:123456789012:stateMachine:summarize"
development = "arn:aws:states:eu-west-1:123456789012:stateMachine:summarize-dev"

[workflow.summarize.parameters.topic]
type = "string"
description = "What to summarize"

[workflow.summarize.parameters.max_words]
type = "integer"
default = 200

[workflow.summarize.parameters.languages]
type = "select"
multiple = true
options = ["en", "fr"]
default = ["en"]
"#;

fn validation_error(cfg: sfnwatch::config::RawConfigFile) -> String {
    match ConfigFile::try_from(cfg) {
        Err(SfnwatchError::ConfigError(message)) => message,
        Err(other) => panic!("expected ConfigError, got {other:?}"),
        Ok(_) => panic!("expected validation to fail"),
    }
}

fn workflow() -> WorkflowConfigBuilder {
    WorkflowConfigBuilder::new(OUTPUT_DIRECTORY).arn(Environment::Production, STATE_MACHINE_ARN)
}

#[test]
fn full_config_loads_and_resolves_data_dir() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Sfnwatch.toml");
    std::fs::write(&path, FULL_CONFIG)?;

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.poll_interval, Duration::from_secs(2));
    assert_eq!(cfg.config.data_dir, dir.path().join("mirror"));
    assert_eq!(cfg.config.artifact_bucket, "nlp-artifacts");
    assert_eq!(cfg.config.failure_notify_threshold, 5);
    assert_eq!(cfg.config.max_executions, 20);

    let summarize = &cfg.workflow["summarize"];
    assert_eq!(summarize.display_name(), Some("Summarize documents"));
    assert_eq!(summarize.environments.configured().len(), 2);
    assert_eq!(
        summarize.parameters["max_words"].default,
        Some(ParameterValue::Integer(200))
    );
    assert_eq!(
        summarize.parameters["languages"].default,
        Some(ParameterValue::List(vec!["en".to_string()]))
    );
    Ok(())
}

#[test]
fn absolute_data_dir_is_kept() -> TestResult {
    let mut file = NamedTempFile::new()?;
    let text = FULL_CONFIG.replace("data_dir = \"mirror\"", "data_dir = \"/srv/mirror\"");
    file.write_all(text.as_bytes())?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.config.data_dir, std::path::PathBuf::from("/srv/mirror"));
    Ok(())
}

#[test]
fn defaults_apply_when_config_section_is_missing() -> TestResult {
    let raw = load_from_str(
        r#"
[workflow.minimal]
files.output_directory = "out"
environments.staging = "arn:aws:states:us-east-1:123456789012:stateMachine:minimal"
"#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;

    assert_eq!(cfg.poll_interval, Duration::from_secs(5));
    assert_eq!(cfg.config.artifact_bucket, "wf-nlp-tasks");
    assert!(cfg.config.sort_files_by_date);
    assert_eq!(cfg.config.history_page_size, 100);
    Ok(())
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let result = load_from_str("[workflow.broken\nfiles = ");
    assert!(matches!(result, Err(SfnwatchError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Sfnwatch.toml");
    assert!(matches!(result, Err(SfnwatchError::IoError(_))));
}

#[test]
fn at_least_one_workflow_is_required() {
    let message = validation_error(ConfigFileBuilder::new().raw());
    assert!(message.contains("at least one"));
}

#[test]
fn poll_interval_must_parse_and_be_positive() {
    let bad_unit = ConfigFileBuilder::new()
        .with_workflow("w", workflow().build())
        .poll_interval("5 fortnights")
        .raw();
    assert!(validation_error(bad_unit).contains("poll_interval"));

    let zero = ConfigFileBuilder::new()
        .with_workflow("w", workflow().build())
        .poll_interval("0s")
        .raw();
    assert!(validation_error(zero).contains("greater than zero"));
}

#[test]
fn empty_bucket_is_rejected() {
    let cfg = ConfigFileBuilder::new()
        .with_workflow("w", workflow().build())
        .artifact_bucket("  ")
        .raw();
    assert!(validation_error(cfg).contains("artifact_bucket"));
}

#[test]
fn workflow_needs_a_well_formed_arn() {
    let none = ConfigFileBuilder::new()
        .with_workflow("w", WorkflowConfigBuilder::new(OUTPUT_DIRECTORY).build())
        .raw();
    assert!(validation_error(none).contains("at least one environment"));

    let malformed = ConfigFileBuilder::new()
        .with_workflow(
            "w",
            workflow()
                .arn(Environment::Development, "arn:aws:lambda:eu-west-1:1:function:f")
                .build(),
        )
        .raw();
    assert!(validation_error(malformed).contains("invalid development ARN"));
}

#[test]
fn output_directory_must_not_be_empty() {
    let cfg = ConfigFileBuilder::new()
        .with_workflow(
            "w",
            WorkflowConfigBuilder::new("")
                .arn(Environment::Production, STATE_MACHINE_ARN)
                .build(),
        )
        .raw();
    assert!(validation_error(cfg).contains("output_directory"));
}

#[test]
fn execution_name_is_a_reserved_parameter() {
    let cfg = ConfigFileBuilder::new()
        .with_workflow(
            "w",
            workflow()
                .param(
                    "execution_name",
                    ParameterBuilder::new(ParameterType::String).build(),
                )
                .build(),
        )
        .raw();
    assert!(validation_error(cfg).contains("reserved"));
}

#[test]
fn select_parameters_need_options() {
    let missing = ConfigFileBuilder::new()
        .with_workflow(
            "w",
            workflow()
                .param("model", ParameterBuilder::new(ParameterType::Select).build())
                .build(),
        )
        .raw();
    assert!(validation_error(missing).contains("options are required"));

    let empty = ConfigFileBuilder::new()
        .with_workflow("w", workflow().param("model", ParameterBuilder::select(&[]).build()).build())
        .raw();
    assert!(validation_error(empty).contains("must not be empty"));
}

#[test]
fn options_and_multiple_are_select_only() {
    let options = ConfigFileBuilder::new()
        .with_workflow(
            "w",
            workflow()
                .param(
                    "topic",
                    ParameterBuilder::new(ParameterType::String)
                        .options(&["a"])
                        .build(),
                )
                .build(),
        )
        .raw();
    assert!(validation_error(options).contains("only allowed when type is 'select'"));

    let multiple = ConfigFileBuilder::new()
        .with_workflow(
            "w",
            workflow()
                .param(
                    "count",
                    ParameterBuilder::new(ParameterType::Integer)
                        .multiple(true)
                        .build(),
                )
                .build(),
        )
        .raw();
    assert!(validation_error(multiple).contains("multiple"));
}

#[test]
fn defaults_must_match_their_type() {
    let cases = [
        ParameterBuilder::new(ParameterType::Integer)
            .default_value(ParameterValue::Text("ten".to_string())),
        ParameterBuilder::new(ParameterType::Boolean).default_value(ParameterValue::Integer(1)),
        ParameterBuilder::select(&["a", "b"]).default_value(ParameterValue::Text("c".to_string())),
        ParameterBuilder::select(&["a", "b"])
            .default_value(ParameterValue::List(vec!["a".to_string()])),
    ];

    for param in cases {
        let cfg = ConfigFileBuilder::new()
            .with_workflow("w", workflow().param("p", param.build()).build())
            .raw();
        assert!(validation_error(cfg).contains("does not match type"));
    }
}

#[test]
fn parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
    assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("3d").is_err());
}
