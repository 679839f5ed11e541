//! Domain-specific newtypes for workflow system
//!
//! These newtypes prevent type confusion and encode domain invariants.
//! All use Arc<str> for O(1) cloning.

use super::error::WorkflowError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

// Helper module for Arc<str> serialization
mod arc_str_serde {
    use super::{Arc, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(arc: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(arc)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|s| Arc::from(s.as_str()))
    }
}

/// Workflow step identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepName(#[serde(with = "arc_str_serde")] Arc<str>);

impl StepName {
    /// Create a new step name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the step name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Output variable binding name
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingName(#[serde(with = "arc_str_serde")] Arc<str>);

impl BindingName {
    /// Create a new binding name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the binding name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BindingName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BindingName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BindingName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Argument name
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgName(#[serde(with = "arc_str_serde")] Arc<str>);

impl ArgName {
    /// Create a new argument name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the argument name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArgName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ArgName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ArgName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Resource URI with validation
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(#[serde(with = "arc_str_serde")] Arc<str>);

impl Uri {
    /// Create a new URI with validation
    ///
    /// URIs must start with "resource://" or "file://"
    pub fn new(uri: impl AsRef<str>) -> Result<Self, WorkflowError> {
        let uri_str = uri.as_ref();

        // Validate URI format (basic check)
        if !uri_str.starts_with("resource://") && !uri_str.starts_with("file://") {
            return Err(WorkflowError::InvalidUri {
                uri: uri_str.to_string(),
            });
        }

        Ok(Self(Arc::from(uri_str)))
    }

    /// Get the URI as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
