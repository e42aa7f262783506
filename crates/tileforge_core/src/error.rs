//! Errors raised by structural edits and project import

use thiserror::Error;

/// Failure of a structural edit or an import.
///
/// Pointer-driven edits never produce these; out-of-range coordinates are
/// silently ignored instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Map or tile dimensions are zero or above the supported maximum
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Project JSON is missing fields or has inconsistent arrays
    #[error("malformed project: {0}")]
    MalformedProject(String),
    /// Removing the layer would leave the map without any
    #[error("a map must keep at least one layer")]
    MinimumLayerViolation,
    #[error("no layer at index {0}")]
    NoSuchLayer(usize),
}
