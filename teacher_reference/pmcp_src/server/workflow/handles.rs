//! Type-safe handles for tools and resources
//!
//! Handles are lightweight identifiers using Arc<str> for O(1) cloning.

use super::{error::WorkflowError, newtypes::Uri};
use std::sync::Arc;

/// Type-safe identifier for a tool
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolHandle {
    name: Arc<str>,
}

impl ToolHandle {
    /// Create a new tool handle
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Get the tool name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ToolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for ToolHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ToolHandle {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Type-safe identifier for a resource
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    uri: Uri,
}

impl ResourceHandle {
    /// Create a new resource handle with URI validation
    pub fn new(uri: impl AsRef<str>) -> Result<Self, WorkflowError> {
        Ok(Self {
            uri: Uri::new(uri)?,
        })
    }

    /// Get the resource URI
    pub fn uri(&self) -> &str {
        self.uri.as_str()
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri.as_str())
    }
}
