//! Error types for the component tree.

use crate::component::ComponentId;

/// Result type alias for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Errors that can occur while building or navigating a component tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The layout description is not an ordered sequence of descriptors.
    #[error("Invalid argument '{name}': expected {expected}, got {got}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// A node descriptor could not be read.
    #[error("Invalid component descriptor at '{path}': {source}")]
    InvalidDescriptor {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Two components resolved to the same identifier.
    #[error("Duplicate component id '{0}'")]
    DuplicateComponentId(ComponentId),

    /// The component key is not part of this tree's arena.
    #[error("Invalid component key")]
    InvalidComponentKey,
}

impl TreeError {
    /// Create an invalid-argument error describing the JSON kind that was received.
    pub fn invalid_argument(
        name: &'static str,
        expected: &'static str,
        got: &serde_json::Value,
    ) -> Self {
        Self::InvalidArgument {
            name,
            expected,
            got: json_kind(got),
        }
    }

    /// Create a descriptor error.
    pub fn invalid_descriptor(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidDescriptor {
            path: path.into(),
            source,
        }
    }
}

/// Human-readable name for the kind of a JSON value.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
