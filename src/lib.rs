//! Interactive stroke pipeline for layered bitmap painting
//!
//! Two subsystems cooperate here:
//!
//! - The **stroke pipeline** ([`stroke`]) turns raw pointer samples into
//!   paint jobs: the [`input::SampleBuilder`] normalizes events, the
//!   [`stroke::StrokeHelper`] smooths them, fits Bézier segments and
//!   emits dabs, lines and curves into a [`stroke::StrokeExecutor`].
//! - The **update queue** ([`update`]) schedules the dirty-region
//!   recomputations those marks produce: dirty rectangles become
//!   [`update::RectsWalker`]s, which the [`update::UpdateQueue`]
//!   coalesces and dispatches as non-overlapping jobs into an
//!   [`update::UpdaterContext`].
//!
//! Rendering backends, pixel compositing, undo storage and widget
//! toolkits stay outside; this crate only speaks samples, jobs and
//! rectangles.

pub mod error;
pub mod geometry;
pub mod image;
pub mod input;
pub mod stroke;
pub mod update;

pub use error::PipelineError;
pub use geometry::{Point, Rect};
pub use input::{InputDevice, RawPointerEvent, SampleBuilder};
pub use stroke::{
    PaintSample, SmoothingConfig, SmoothingMode, StrokeExecutor, StrokeHelper, StrokeId,
};
pub use update::{RectsWalker, UpdateQueue, UpdaterContext};
