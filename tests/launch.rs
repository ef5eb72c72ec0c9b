// tests/launch.rs

mod common;
use crate::common::builders::{ParameterBuilder, WorkflowConfigBuilder};
use crate::common::fixtures::{OUTPUT_DIRECTORY, STATE_MACHINE_ARN, fixed_now};

use std::error::Error;

use proptest::prelude::*;
use serde_json::{Value, json};
use sfnwatch::config::{ParameterType, ParameterValue, WorkflowConfig};
use sfnwatch::errors::SfnwatchError;
use sfnwatch::launch::{
    EXECUTION_NAME_FIELD, FormValues, StartRequest, coerce, create_valid_name, prefill_from_input,
};
use sfnwatch::types::Environment;

type TestResult = Result<(), Box<dyn Error>>;

fn summarize_workflow() -> WorkflowConfig {
    WorkflowConfigBuilder::new(OUTPUT_DIRECTORY)
        .arn(Environment::Production, STATE_MACHINE_ARN)
        .param("topic", ParameterBuilder::new(ParameterType::String).build())
        .param(
            "max_words",
            ParameterBuilder::new(ParameterType::Integer)
                .default_value(ParameterValue::Integer(200))
                .build(),
        )
        .param("dry_run", ParameterBuilder::new(ParameterType::Boolean).build())
        .param(
            "model",
            ParameterBuilder::select(&["small", "large"])
                .default_value(ParameterValue::Text("small".to_string()))
                .build(),
        )
        .param(
            "languages",
            ParameterBuilder::select(&["en", "fr", "de"]).multiple(true).build(),
        )
        .build()
}

fn form(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn input_of(request: &StartRequest) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_str(&request.input)?)
}

#[test]
fn valid_name_replaces_invalid_characters_and_appends_timestamp() {
    assert_eq!(
        create_valid_name("My run!", fixed_now()),
        "My_run_20240305_140709"
    );
    assert_eq!(
        create_valid_name("a  b//c__d", fixed_now()),
        "a_b_c_d_20240305_140709"
    );
    assert_eq!(
        create_valid_name("keep-dashes_ok", fixed_now()),
        "keep-dashes_ok_20240305_140709"
    );
}

#[test]
fn valid_name_of_nothing_usable_is_just_the_timestamp() {
    assert_eq!(create_valid_name("", fixed_now()), "20240305_140709");
    assert_eq!(create_valid_name("!!! ???", fixed_now()), "20240305_140709");
}

#[test]
fn valid_name_is_truncated_to_the_service_limit() {
    let name = create_valid_name(&"x".repeat(200), fixed_now());
    assert_eq!(name.len(), 80);
    assert!(name.ends_with("_20240305_140709"));
}

proptest! {
    #[test]
    fn valid_names_only_use_allowed_characters(input in ".{0,120}") {
        let name = create_valid_name(&input, fixed_now());
        prop_assert!(name.len() <= 80);
        prop_assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        prop_assert!(!name.contains("__"));
        prop_assert!(name.ends_with("20240305_140709"));
    }
}

#[test]
fn form_values_are_coerced_by_type() -> TestResult {
    let request = StartRequest::from_form(
        &summarize_workflow(),
        STATE_MACHINE_ARN,
        &form(&[
            ("topic", "rust ownership"),
            ("max_words", "350"),
            ("dry_run", "yes"),
            ("model", "large"),
            ("languages", "en, fr"),
        ]),
        fixed_now(),
    )?;

    assert_eq!(request.state_machine_arn, STATE_MACHINE_ARN);
    assert_eq!(request.name, None);
    assert_eq!(
        input_of(&request)?,
        json!({
            "dry_run": true,
            "languages": ["en", "fr"],
            "max_words": 350,
            "model": "large",
            "topic": "rust ownership"
        })
    );
    Ok(())
}

#[test]
fn blank_values_fall_back_to_defaults_or_are_omitted() -> TestResult {
    let request = StartRequest::from_form(
        &summarize_workflow(),
        STATE_MACHINE_ARN,
        &form(&[("topic", "   "), ("max_words", "")]),
        fixed_now(),
    )?;

    assert_eq!(
        input_of(&request)?,
        json!({"max_words": 200, "model": "small"})
    );
    Ok(())
}

#[test]
fn execution_name_field_becomes_a_valid_name() -> TestResult {
    let request = StartRequest::from_form(
        &summarize_workflow(),
        STATE_MACHINE_ARN,
        &form(&[(EXECUTION_NAME_FIELD, "weekly digest")]),
        fixed_now(),
    )?;

    assert_eq!(request.name.as_deref(), Some("weekly_digest_20240305_140709"));
    assert!(input_of(&request)?.get(EXECUTION_NAME_FIELD).is_none());
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() {
    let result = StartRequest::from_form(
        &summarize_workflow(),
        STATE_MACHINE_ARN,
        &form(&[("temperature", "0.3")]),
        fixed_now(),
    );

    assert!(matches!(
        result,
        Err(SfnwatchError::InvalidParameter(ref m)) if m.contains("temperature")
    ));
}

#[test]
fn values_that_do_not_fit_their_type_are_rejected() {
    let workflow = summarize_workflow();
    let spec = |name: &str| workflow.parameters[name].clone();

    assert!(coerce("max_words", &spec("max_words"), "lots").is_err());
    assert!(coerce("dry_run", &spec("dry_run"), "maybe").is_err());
    assert!(coerce("model", &spec("model"), "medium").is_err());
    assert!(coerce("languages", &spec("languages"), "en,xx").is_err());

    assert_eq!(
        coerce("dry_run", &spec("dry_run"), "OFF").ok(),
        Some(ParameterValue::Boolean(false))
    );
    assert_eq!(
        coerce("max_words", &spec("max_words"), "-5").ok(),
        Some(ParameterValue::Integer(-5))
    );
}

#[test]
fn previous_input_prefills_the_form() -> TestResult {
    let values = prefill_from_input(
        r#"{"topic": "rust", "max_words": 120, "dry_run": false,
            "languages": ["en", "de"], "extra": {"a": 1}, "gone": null}"#,
    )?;

    assert_eq!(values["topic"], "rust");
    assert_eq!(values["max_words"], "120");
    assert_eq!(values["dry_run"], "false");
    assert_eq!(values["languages"], "en,de");
    assert_eq!(values["extra"], r#"{"a":1}"#);
    assert!(!values.contains_key("gone"));
    Ok(())
}

#[test]
fn prefilled_values_round_trip_through_the_form() -> TestResult {
    let workflow = summarize_workflow();
    let original = r#"{"languages":["en","de"],"max_words":120,"model":"large","topic":"rust"}"#;

    let values = prefill_from_input(original)?;
    let request = StartRequest::from_form(&workflow, STATE_MACHINE_ARN, &values, fixed_now())?;

    assert_eq!(input_of(&request)?, serde_json::from_str::<Value>(original)?);
    Ok(())
}

#[test]
fn non_object_input_cannot_prefill() {
    assert!(matches!(
        prefill_from_input("[1, 2]"),
        Err(SfnwatchError::InvalidParameter(_))
    ));
    assert!(prefill_from_input("not json").is_err());
}
