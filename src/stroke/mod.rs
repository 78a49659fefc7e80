//! The interactive stroke pipeline
//!
//! Raw pointer events become normalized samples, get smoothed, and are
//! fitted into line or Bézier paint jobs that the helper emits to the
//! stroke executor.

pub mod bezier;
pub mod executor;
pub mod helper;
pub mod sample;
pub mod smoothing;

pub use executor::{
    CompositeOp, OutlineMode, OutlinePath, PaintOpId, PaintOpPreset, PaintOpSettings, Painter,
    PainterInfo, RecordingAdapter, RecordedElement, ResourcesSnapshot, StrokeExecutor, StrokeId,
    StrokeJobData, StrokeRecorder, StrokeStrategy,
};
pub use helper::{PositionHistory, StrokeHelper, STROKE_TIMEOUT_MS};
pub use sample::{DistanceAccumulator, PaintSample};
pub use smoothing::{SmoothingConfig, SmoothingMode};
