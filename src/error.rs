//! Pipeline error taxonomy.
//!
//! Worker-side failures never terminate a worker loop; they are converted
//! into failed render results and flow through the same generation-checked
//! delivery path as successes. Queue saturation and stale-result discards
//! are flow-control signals, logged but never surfaced as errors.

use std::fmt;

/// Failure while reading raw page bytes from a [`PageSource`](crate::source::PageSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The requested page identifier does not exist in the collection.
    NotFound(String),
    /// The underlying read failed (I/O, permissions, truncated archive).
    Io(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(name) => write!(f, "page not found: {}", name),
            SourceError::Io(e) => write!(f, "source read error: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

/// Failure produced while rendering a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Fetching raw bytes from the page source failed.
    Source(SourceError),
    /// Decoding or resizing the image data failed.
    Decode(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Source(e) => write!(f, "{}", e),
            RenderError::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Source(e) => Some(e),
            RenderError::Decode(_) => None,
        }
    }
}

impl From<SourceError> for RenderError {
    fn from(e: SourceError) -> Self {
        RenderError::Source(e)
    }
}
