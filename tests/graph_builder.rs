// tests/graph_builder.rs

mod common;
use crate::common::builders::DefinitionBuilder;

use std::error::Error;

use serde_json::json;
use sfnwatch::definition::{StatusMap, WorkflowDefinition};
use sfnwatch::errors::SfnwatchError;
use sfnwatch::graph::{NodeShape, StyleClass, build_graph, build_graph_from_json};
use sfnwatch::types::{ExecutionStatus, StateStatus};

type TestResult = Result<(), Box<dyn Error>>;

const START_END: &str = r#"{
    "StartAt": "Start",
    "States": {
        "Start": {"Type": "Task", "Next": "End"},
        "End": {"Type": "Task", "End": true}
    }
}"#;

fn start_end_status() -> StatusMap {
    [("Start", StateStatus::Completed), ("End", StateStatus::Running)]
        .into_iter()
        .collect()
}

#[test]
fn two_state_chain_while_running() -> TestResult {
    let graph = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::Running)?;

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.style_of("Start"), Some(StyleClass::Completed));
    assert_eq!(graph.style_of("End"), Some(StyleClass::Running));
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.targets_of("Start"), vec!["End"]);
    assert!(graph.targets_of("End").is_empty());
    Ok(())
}

#[test]
fn aborted_execution_marks_running_states_aborted() -> TestResult {
    let graph = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::Aborted)?;

    assert_eq!(graph.style_of("End"), Some(StyleClass::Aborted));
    assert_eq!(graph.style_of("Start"), Some(StyleClass::Completed));
    Ok(())
}

#[test]
fn timed_out_execution_marks_running_states_aborted() -> TestResult {
    let graph = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::TimedOut)?;
    assert_eq!(graph.style_of("End"), Some(StyleClass::Aborted));
    Ok(())
}

#[test]
fn failed_and_succeeded_executions_keep_running_style() -> TestResult {
    for status in [ExecutionStatus::Failed, ExecutionStatus::Succeeded] {
        let graph = build_graph_from_json(START_END, &start_end_status(), status)?;
        assert_eq!(graph.style_of("End"), Some(StyleClass::Running), "{status}");
    }
    Ok(())
}

#[test]
fn single_pass_state_without_status_is_not_started() -> TestResult {
    let definition = r#"{"States": {"Only": {"Type": "Pass"}}}"#;
    let graph = build_graph_from_json(definition, &StatusMap::new(), ExecutionStatus::Running)?;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.style_of("Only"), Some(StyleClass::NotStarted));
    assert!(graph.edges.is_empty());
    Ok(())
}

#[test]
fn choice_emits_branches_then_default() {
    let definition = DefinitionBuilder::new("Route")
        .choice("Route", &["A", "B"], Some("C"))
        .succeed("A")
        .succeed("B")
        .succeed("C")
        .build();

    let graph = build_graph(&definition, &StatusMap::new(), ExecutionStatus::Running);

    assert_eq!(graph.targets_of("Route"), vec!["A", "B", "C"]);
    assert_eq!(graph.node("Route").map(|n| n.shape), Some(NodeShape::Diamond));
    assert_eq!(graph.node("A").map(|n| n.shape), Some(NodeShape::Rounded));
}

#[test]
fn choice_conditions_do_not_reach_the_graph() -> TestResult {
    let definition = json!({
        "StartAt": "Route",
        "States": {
            "Route": {
                "Type": "Choice",
                "Choices": [
                    {"Variable": "$.lang", "StringEquals": "en", "Next": "English"},
                    {"And": [{"Variable": "$.n", "NumericGreaterThan": 3}], "Next": "Many"}
                ]
            },
            "English": {"Type": "Succeed"},
            "Many": {"Type": "Succeed"}
        }
    });
    let definition = WorkflowDefinition::from_value(&definition)?;
    let graph = build_graph(&definition, &StatusMap::new(), ExecutionStatus::Running);
    let text = graph.to_mermaid();

    assert_eq!(graph.targets_of("Route"), vec!["English", "Many"]);
    assert!(!text.contains("StringEquals"));
    assert!(!text.contains("-->|"));
    Ok(())
}

#[test]
fn names_are_sanitized_into_node_ids() {
    let definition = DefinitionBuilder::new("Load data")
        .task("Load data", "Clean-up (final)")
        .end_task("Clean-up (final)")
        .build();

    let graph = build_graph(&definition, &StatusMap::new(), ExecutionStatus::Running);

    assert_eq!(graph.nodes[0].id, "Load_data");
    assert_eq!(graph.nodes[0].label, "Load data");
    assert_eq!(graph.nodes[1].id, "Clean_up_final");
    assert_eq!(graph.targets_of("Load_data"), vec!["Clean_up_final"]);
}

#[test]
fn colliding_names_are_disambiguated_not_merged() {
    let definition = DefinitionBuilder::new("Load data")
        .task("Load data", "Load-data")
        .end_task("Load-data")
        .build();
    let status: StatusMap = [("Load-data", StateStatus::Running)].into_iter().collect();

    let graph = build_graph(&definition, &status, ExecutionStatus::Running);

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["Load_data", "Load_data_2"]);
    assert_eq!(graph.style_of("Load_data"), Some(StyleClass::NotStarted));
    assert_eq!(graph.style_of("Load_data_2"), Some(StyleClass::Running));
    assert_eq!(graph.targets_of("Load_data"), vec!["Load_data_2"]);
}

#[test]
fn unknown_and_missing_types_render_as_plain_states() -> TestResult {
    let definition = json!({
        "StartAt": "Odd",
        "States": {
            "Odd": {"Type": "Teleport", "Next": "Bare"},
            "Bare": {"Next": "Done"},
            "Done": {"Type": "Succeed"}
        }
    });
    let definition = WorkflowDefinition::from_value(&definition)?;
    let graph = build_graph(&definition, &StatusMap::new(), ExecutionStatus::Running);

    assert_eq!(graph.node("Odd").map(|n| n.shape), Some(NodeShape::Rounded));
    assert_eq!(graph.targets_of("Odd"), vec!["Bare"]);
    assert_eq!(graph.targets_of("Bare"), vec!["Done"]);
    Ok(())
}

#[test]
fn dangling_targets_still_produce_edges() {
    let definition = DefinitionBuilder::new("A").task("A", "Nowhere Land").build();
    let graph = build_graph(&definition, &StatusMap::new(), ExecutionStatus::Running);

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.targets_of("A"), vec!["Nowhere_Land"]);
}

#[test]
fn definition_without_states_is_malformed() {
    let result = build_graph_from_json(
        r#"{"StartAt": "A"}"#,
        &StatusMap::new(),
        ExecutionStatus::Running,
    );
    assert!(matches!(result, Err(SfnwatchError::MalformedDefinition(_))));

    let result = build_graph_from_json("not json", &StatusMap::new(), ExecutionStatus::Running);
    assert!(matches!(result, Err(SfnwatchError::MalformedDefinition(_))));
}

#[test]
fn mermaid_text_matches_renderer_format() -> TestResult {
    let graph = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::Running)?;

    let expected = [
        "graph TD",
        "    %% Node and edge styling",
        "    linkStyle default stroke:#333,stroke-width:2px;",
        "    %% Graph configuration",
        "    classDef default fill:#f9f9f9,stroke:#333,stroke-width:2px;",
        "    classDef running fill:#fff7e6,stroke:#ffab00,stroke-width:2px;",
        "    classDef completed fill:#e6f4ea,stroke:#34a853,stroke-width:2px;",
        "    classDef failed fill:#fce8e6,stroke:#ea4335,stroke-width:2px;",
        "    classDef notStarted fill:#f8f9fa,stroke:#dadce0,stroke-width:2px;",
        "    classDef aborted fill:#e0e0e0,stroke:#666666,stroke-width:2px;",
        "    Start(\"Start\"):::completed",
        "    Start --> End",
        "    End(\"End\"):::running",
    ]
    .join("\n");

    assert_eq!(graph.to_mermaid(), expected);
    assert_eq!(graph.to_string(), expected);
    Ok(())
}

#[test]
fn mermaid_uses_diamonds_for_choices_and_escapes_quotes() {
    let definition = DefinitionBuilder::new("Pick \"one\"")
        .choice("Pick \"one\"", &["A"], None)
        .succeed("A")
        .build();
    let graph = build_graph(&definition, &StatusMap::new(), ExecutionStatus::Running);
    let text = graph.to_mermaid();

    assert!(text.contains("    Pick_\"one\"{\"Pick #quot;one#quot;\"}:::notStarted"));
    assert!(text.contains("    A(\"A\"):::notStarted"));
}

#[test]
fn fingerprint_follows_rendered_text() -> TestResult {
    let running = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::Running)?;
    let again = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::Running)?;
    let aborted = build_graph_from_json(START_END, &start_end_status(), ExecutionStatus::Aborted)?;

    assert_eq!(running.fingerprint(), again.fingerprint());
    assert_ne!(running.fingerprint(), aborted.fingerprint());
    assert_eq!(running.fingerprint().len(), 64);
    Ok(())
}
