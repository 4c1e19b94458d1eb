//! Error types for foveate.

use thiserror::Error;

/// Result alias for foveate operations.
pub type RetinaResult<T> = std::result::Result<T, RetinaError>;

/// Errors that can occur while configuring or running the retina pipeline.
///
/// Variants fall into three groups: configuration errors (fatal for a whole
/// batch), input errors and computation errors (scoped to a single image).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RetinaError {
    /// A configuration field is out of its valid range.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// An unknown pixel effect identifier was requested.
    #[error("unsupported pixel effect `{name}` (expected `grayscale` or `color`)")]
    UnsupportedEffect { name: String },
    /// An unknown foveation mode identifier was requested.
    #[error("unsupported foveation mode `{name}` (expected `static` or `dynamic`)")]
    UnsupportedMode { name: String },
    /// Image dimensions are zero or do not match.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The provided buffer is smaller than required.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Reading or decoding an image file failed.
    #[error("image I/O failed for {path}: {reason}")]
    ImageIo { path: String, reason: String },
    /// Dynamic foveation was requested without a following frame.
    #[error("dynamic foveation needs a next frame")]
    MissingNextFrame,
    /// A pipeline stage failed on otherwise valid input.
    #[error("computation failed in {stage}: {reason}")]
    Computation {
        stage: &'static str,
        reason: String,
    },
    /// The per-image time budget was exhausted.
    #[error("time budget of {budget_ms} ms exhausted before {stage}")]
    Timeout { stage: &'static str, budget_ms: u64 },
}

impl RetinaError {
    /// Returns true for configuration errors, which abort a whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::UnsupportedEffect { .. } | Self::UnsupportedMode { .. }
        )
    }

    pub(crate) fn config(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidConfig { field, reason }
    }
}
