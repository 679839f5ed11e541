//! Workflow step with chainable builder
//!
//! Provides a type-safe, ergonomic API for building workflow steps.

use super::{
    data_source::DataSource,
    error::WorkflowError,
    handles::ToolHandle,
    newtypes::{ArgName, BindingName, StepName},
};
use indexmap::IndexMap;

/// A single step in a workflow
#[derive(Clone, Debug)]
pub struct WorkflowStep {
    /// Step identifier
    name: StepName,
    /// Tool to invoke
    tool: ToolHandle,
    /// Argument mappings (tool arg name -> data source)
    /// `IndexMap` for deterministic iteration
    arguments: IndexMap<ArgName, DataSource>,
    /// Optional binding name for step output
    binding: Option<BindingName>,
}

impl WorkflowStep {
    /// Create a new workflow step
    ///
    /// # Example
    /// ```
    /// use pmcp::server::workflow::{WorkflowStep, ToolHandle};
    ///
    /// let step = WorkflowStep::new("step1", ToolHandle::new("greet"));
    /// ```
    #[must_use]
    pub fn new(name: impl Into<StepName>, tool: ToolHandle) -> Self {
        Self {
            name: name.into(),
            tool,
            arguments: IndexMap::new(),
            binding: None,
        }
    }

    /// Add an argument mapping (chainable)
    ///
    /// # Example
    /// ```
    /// use pmcp::server::workflow::{WorkflowStep, ToolHandle, DataSource};
    ///
    /// let step = WorkflowStep::new("step1", ToolHandle::new("greet"))
    ///     .arg("name", DataSource::prompt_arg("user_name"))
    ///     .arg("greeting", DataSource::constant(serde_json::json!("Hello")));
    /// ```
    #[must_use]
    pub fn arg(mut self, name: impl Into<ArgName>, source: DataSource) -> Self {
        self.arguments.insert(name.into(), source);
        self
    }

    /// Set the output binding name (chainable)
    ///
    /// # Example
    /// ```
    /// use pmcp::server::workflow::{WorkflowStep, ToolHandle};
    ///
    /// let step = WorkflowStep::new("step1", ToolHandle::new("greet"))
    ///     .bind("greeting_result");
    /// ```
    #[must_use]
    pub fn bind(mut self, binding: impl Into<BindingName>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// Get step name
    pub fn name(&self) -> &StepName {
        &self.name
    }

    /// Get tool handle
    pub fn tool(&self) -> &ToolHandle {
        &self.tool
    }

    /// Get arguments
    pub fn arguments(&self) -> &IndexMap<ArgName, DataSource> {
        &self.arguments
    }

    /// Get binding name if set
    pub fn binding(&self) -> Option<&BindingName> {
        self.binding.as_ref()
    }

    /// Validate the step
    ///
    /// Checks that all referenced bindings are available
    pub fn validate(&self, available_bindings: &[BindingName]) -> Result<(), WorkflowError> {
        // Check that all step output references exist
        for (_arg_name, source) in &self.arguments {
            if let DataSource::StepOutput { step, .. } = source {
                // Convert step name to binding name for lookup
                let binding = BindingName::new(step.as_str());
                if !available_bindings.contains(&binding) {
                    return Err(WorkflowError::UnknownBinding {
                        step: self.name.to_string(),
                        binding: binding.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
