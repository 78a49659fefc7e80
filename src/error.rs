//! Error types for the stroke pipeline
//!
//! Only conditions that must refuse an operation surface as errors. The
//! lossy-tolerant paths (bad samples, degenerate geometry, rejected jobs)
//! drop or fall back and keep the stroke running instead.

use thiserror::Error;

/// Errors reported to the caller by the stroke pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A stroke was started without an image to paint on
    #[error("no active image")]
    NoActiveImage,

    /// The image has no usable target layer
    #[error("no active layer")]
    NoActiveLayer,

    /// A pressure device pressed below the press threshold
    #[error("press below pressure threshold")]
    PressureBelowThreshold,

    /// The operation needs an active stroke and none is running
    #[error("no active stroke")]
    StrokeInactive,
}
