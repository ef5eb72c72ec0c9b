// src/session.rs

//! Session context and ARN helpers.
//!
//! The selected environment and workflow are carried in an explicit
//! [`SessionContext`] value owned by the top-level shell and passed to
//! whatever needs them.

use crate::config::model::{ConfigFile, WorkflowConfig};
use crate::errors::{Result, SfnwatchError};
use crate::types::Environment;

/// What the user currently has selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    pub environment: Environment,
    pub workflow: Option<String>,
}

impl SessionContext {
    pub fn new(environment: Environment, workflow: Option<String>) -> Self {
        Self {
            environment,
            workflow,
        }
    }

    /// Same environment, different workflow.
    pub fn select_workflow(&self, workflow: &str) -> Self {
        Self {
            environment: self.environment,
            workflow: Some(workflow.to_string()),
        }
    }

    /// Switching environment keeps the workflow selection; it may not exist
    /// in the new environment, which `resolve` reports.
    pub fn select_environment(&self, environment: Environment) -> Self {
        Self {
            environment,
            workflow: self.workflow.clone(),
        }
    }

    /// Workflows available in the selected environment.
    pub fn available_workflows<'a>(&self, cfg: &'a ConfigFile) -> Vec<&'a str> {
        cfg.workflow
            .iter()
            .filter(|(_, wf)| wf.environments.arn_for(self.environment).is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Resolve the selection against the configuration.
    pub fn resolve(&self, cfg: &ConfigFile) -> Result<WorkflowTarget> {
        let name = self.workflow.as_deref().ok_or_else(|| {
            SfnwatchError::ConfigError("no workflow selected".to_string())
        })?;
        let workflow = cfg.workflow.get(name).ok_or_else(|| {
            SfnwatchError::NotFound(format!("workflow '{name}' is not configured"))
        })?;
        let arn = workflow.environments.arn_for(self.environment).ok_or_else(|| {
            SfnwatchError::NotFound(format!(
                "workflow '{name}' has no ARN for environment '{}'",
                self.environment
            ))
        })?;

        Ok(WorkflowTarget {
            name: name.to_string(),
            display_name: workflow.display_name().unwrap_or(name).to_string(),
            state_machine_arn: arn.to_string(),
            output_directory: workflow.files.output_directory.clone(),
            config: workflow.clone(),
        })
    }
}

/// A configured workflow resolved for one environment.
#[derive(Debug, Clone)]
pub struct WorkflowTarget {
    pub name: String,
    pub display_name: String,
    pub state_machine_arn: String,
    pub output_directory: String,
    pub config: WorkflowConfig,
}

impl WorkflowTarget {
    pub fn state_machine_name(&self) -> &str {
        resource_name(&self.state_machine_arn)
    }

    pub fn execution_arn(&self, execution_id: &str) -> String {
        execution_arn(&self.state_machine_arn, execution_id)
    }

    /// Object-store prefix holding an execution's generated files.
    pub fn files_prefix(&self, execution_id: &str) -> String {
        format!("{}/{}/", self.output_directory, execution_id)
    }
}

/// Last `:`-separated segment of an ARN (the resource name).
pub fn resource_name(arn: &str) -> &str {
    arn.rsplit(':').next().unwrap_or(arn)
}

/// Execution ARN for an execution of the given state machine.
///
/// `arn:aws:states:<region>:<account>:stateMachine:<name>` becomes
/// `arn:aws:states:<region>:<account>:execution:<name>:<execution_id>`.
pub fn execution_arn(state_machine_arn: &str, execution_id: &str) -> String {
    format!(
        "{}:{}",
        state_machine_arn.replacen(":stateMachine:", ":execution:", 1),
        execution_id
    )
}

/// Web console URL for an execution, if the ARN carries a region.
pub fn console_url(execution_arn: &str) -> Option<String> {
    let region = execution_arn.split(':').nth(3).filter(|r| !r.is_empty())?;
    Some(format!(
        "https://{region}.console.aws.amazon.com/states/home?region={region}#/executions/details/{execution_arn}"
    ))
}
