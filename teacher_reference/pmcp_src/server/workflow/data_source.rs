//! Data source types for workflow argument mapping
//!
//! Defines where workflow step arguments get their values from.

use super::newtypes::{ArgName, BindingName};
use serde_json::Value;

/// Source of data for workflow step arguments
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum DataSource {
    /// Value from prompt arguments (user-provided)
    PromptArg(ArgName),

    /// Value from a previous step's output (by binding name)
    ///
    /// The `step` field refers to the **binding name** set via `.bind()`,
    /// not the step name passed to `WorkflowStep::new()`.
    StepOutput {
        /// The binding name of the step whose output to use
        step: BindingName,
        /// Optional field to extract from step output
        /// If None, use entire output
        field: Option<String>,
    },

    /// Constant value
    Constant(Value),
}

impl DataSource {
    /// Create a data source from a prompt argument
    pub fn prompt_arg(name: impl Into<ArgName>) -> Self {
        Self::PromptArg(name.into())
    }

    /// Create a data source from a step's entire output (by binding name)
    ///
    /// The `step` parameter should be the **binding name** set via `.bind()`,
    /// not the step name passed to `WorkflowStep::new()`.
    pub fn from_step(step: impl Into<BindingName>) -> Self {
        Self::StepOutput {
            step: step.into(),
            field: None,
        }
    }

    /// Create a data source from a step's output field (by binding name)
    ///
    /// The `step` parameter should be the **binding name** set via `.bind()`,
    /// not the step name passed to `WorkflowStep::new()`.
    pub fn from_step_field(step: impl Into<BindingName>, field: impl Into<String>) -> Self {
        Self::StepOutput {
            step: step.into(),
            field: Some(field.into()),
        }
    }

    /// Create a constant data source
    pub fn constant(value: Value) -> Self {
        Self::Constant(value)
    }
}
