//! Error types for calendar rendering.

use std::io;
use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a calendar document.
///
/// Formatting itself is total over its input; only the output sink can fail.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("failed to write calendar output: {0}")]
    Io(#[from] io::Error),
}
