//! DSL helpers for ergonomic workflow construction
//!
//! Provides convenient functions to reduce boilerplate when building workflows.

use super::{
    data_source::DataSource,
    newtypes::{ArgName, BindingName},
};
use serde_json::Value;

/// Create a data source from a prompt argument
///
/// # Example
/// ```
/// use pmcp::server::workflow::dsl::prompt_arg;
///
/// let source = prompt_arg("user_name");
/// ```
pub fn prompt_arg(name: impl Into<ArgName>) -> DataSource {
    DataSource::prompt_arg(name)
}

/// Create a data source from a step's entire output
///
/// The `step` parameter should be the **binding name** set via `.bind()`,
/// not the step name passed to `WorkflowStep::new()`.
///
/// # Example
/// ```
/// use pmcp::server::workflow::dsl::from_step;
///
/// // If you have: WorkflowStep::new("my_step", ...).bind("output")
/// // Reference it as:
/// let source = from_step("output");  // Use binding name, not "my_step"
/// ```
pub fn from_step(step: impl Into<BindingName>) -> DataSource {
    DataSource::from_step(step)
}

/// Create a data source from a step's output field
///
/// The `step` parameter should be the **binding name** set via `.bind()`,
/// not the step name passed to `WorkflowStep::new()`.
///
/// # Example
/// ```
/// use pmcp::server::workflow::dsl::field;
///
/// // If you have: WorkflowStep::new("my_step", ...).bind("output")
/// // Reference a field as:
/// let source = field("output", "result");  // Use binding name, not "my_step"
/// ```
pub fn field(step: impl Into<BindingName>, field: impl Into<String>) -> DataSource {
    DataSource::from_step_field(step, field)
}

/// Create a constant data source
///
/// # Example
/// ```
/// use pmcp::server::workflow::dsl::constant;
/// use serde_json::json;
///
/// let source = constant(json!("Hello"));
/// ```
pub fn constant(value: Value) -> DataSource {
    DataSource::constant(value)
}
