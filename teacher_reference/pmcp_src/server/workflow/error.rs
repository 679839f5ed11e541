//! Error types for workflow system

use thiserror::Error;

/// Errors that can occur during workflow construction and execution
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A step references a binding that hasn't been defined yet
    #[error("Step '{step}' references unknown binding '{binding}'")]
    UnknownBinding {
        /// The step that has the invalid reference
        step: String,
        /// The binding name that was not found
        binding: String,
    },

    /// A workflow requires a tool that is not registered
    #[error("Workflow '{workflow}' requires unregistered tool '{tool}'")]
    MissingTool {
        /// The workflow that requires the tool
        workflow: String,
        /// The tool name that was not found
        tool: String,
    },

    /// A workflow requires a resource that is not registered
    #[error("Workflow '{workflow}' requires unregistered resource '{resource}'")]
    MissingResource {
        /// The workflow that requires the resource
        workflow: String,
        /// The resource URI that was not found
        resource: String,
    },

    /// Steps have circular dependencies that prevent execution
    #[error("Circular dependency detected in workflow: {cycle}")]
    CircularDependency {
        /// Description of the circular dependency
        cycle: String,
    },

    /// Invalid argument mapping in a workflow step
    #[error("Invalid argument mapping in step '{step}': {reason}")]
    InvalidMapping {
        /// The step with invalid mapping
        step: String,
        /// Why the mapping is invalid
        reason: String,
    },

    /// A resource URI is not in a valid format
    #[error("Invalid URI '{uri}': must start with 'resource://' or 'file://'")]
    InvalidUri {
        /// The invalid URI
        uri: String,
    },

    /// A workflow is missing a required field
    #[error("Workflow '{workflow}' is missing required field: {field}")]
    MissingField {
        /// The workflow that is missing the field
        workflow: String,
        /// The name of the missing field
        field: &'static str,
    },

    /// A step's output field could not be found
    #[error("Step '{step}' output field '{field}' not found in result")]
    OutputFieldNotFound {
        /// The step whose output was queried
        step: String,
        /// The field that was not found
        field: String,
    },

    /// A wrapped error from another part of the system
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

// Convert from crate::Error to WorkflowError
impl From<crate::Error> for WorkflowError {
    fn from(err: crate::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
