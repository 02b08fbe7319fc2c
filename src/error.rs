//! Error types for the F-K filtering pipeline.

use thiserror::Error;

/// Errors that can occur while normalizing, transforming or filtering a trace gather.
///
/// None of these are retried internally: the pipeline is deterministic, so the caller
/// corrects the input and runs it again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FkError {
    /// Malformed static input (headers, spacing, kernel size).
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of what is wrong with the input.
        reason: String,
    },

    /// The pick protocol delivered fewer than two points.
    #[error("insufficient picks: expected 2 points, got {got}")]
    InsufficientInput {
        /// Number of points received.
        got: usize,
    },

    /// The pick protocol delivered more than two points.
    #[error("ambiguous picks: expected 2 points, got {got}")]
    AmbiguousInput {
        /// Number of points received.
        got: usize,
    },

    /// Spectrum and mask grids disagree in shape.
    #[error("shape mismatch: spectrum is {spectrum:?}, mask is {mask:?}")]
    ShapeMismatch {
        /// Shape `(n_k, n_f)` of the spectrum.
        spectrum: (usize, usize),
        /// Shape `(n_k, n_f)` of the mask.
        mask: (usize, usize),
    },
}

impl FkError {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        FkError::Configuration {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FkError>;
