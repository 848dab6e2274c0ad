//! Error types for the layout model.

use lattice_layout_core::TreeError;

/// Result type alias for layout operations.
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;

/// Errors that can occur in the layout model.
///
/// Only hard failures are reported here. Recoverable conditions (a missing
/// settings component, a non-object snapshot passed to
/// [`LayoutModel::merge_store`](crate::LayoutModel::merge_store)) are logged
/// and the call degrades gracefully instead.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Building or navigating the component tree failed.
    #[error("Component tree error: {0}")]
    Tree(#[from] TreeError),

    /// A component selection passed to sync was empty.
    #[error("Component selection does not have sufficient length")]
    EmptySelection,

    /// A store operation that writes was called before `create_store`.
    #[error("State store has not been created")]
    StoreNotCreated,

    /// JSON text could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayoutError {
    /// Whether this error reports an argument of the wrong shape.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::Tree(TreeError::InvalidArgument { .. }))
    }
}
