//! Contracts between the stroke helper and its collaborators
//!
//! The executor schedules opaque paint jobs on its own worker pool; the
//! helper only emits them. Resources are snapshotted once per stroke and
//! shared read-only. Painters are shared between the helper and the
//! executor for the duration of a stroke.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::geometry::{Point, Rect};
use crate::image::{Image, LayerId, LayerNode};
use crate::stroke::sample::{DistanceAccumulator, PaintSample};

/// Opaque handle identifying one stroke inside the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrokeId(pub u64);

/// Identifies a paint-op implementation inside the executor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaintOpId(pub String);

/// Composite operation name, interpreted by the executor's blitters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeOp(pub String);

impl CompositeOp {
    pub fn over() -> Self {
        CompositeOp("normal".to_string())
    }
}

/// How the brush-outline cursor shape is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlineMode {
    /// Outline at the nominal brush diameter
    Normal,
    /// Outline scaled by the current pressure
    Precise,
}

/// A closed polyline in image coordinates, drawn as the cursor outline
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlinePath {
    pub points: Vec<Point>,
}

impl OutlinePath {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

const OUTLINE_SEGMENTS: usize = 32;

/// Settings of the active paint op, as far as the helper needs them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintOpSettings {
    /// Brush diameter in pixels
    pub diameter: f32,
    /// Dab re-emission interval for airbrush presets; `None` disables
    pub airbrush_interval_ms: Option<u32>,
}

impl Default for PaintOpSettings {
    fn default() -> Self {
        Self {
            diameter: 20.0,
            airbrush_interval_ms: None,
        }
    }
}

impl PaintOpSettings {
    /// The outline shape to draw as cursor for the given sample
    pub fn brush_outline(
        &self,
        sample: &PaintSample,
        _distance: Option<&DistanceAccumulator>,
        mode: OutlineMode,
    ) -> OutlinePath {
        let radius = match mode {
            OutlineMode::Normal => self.diameter / 2.0,
            OutlineMode::Precise => self.diameter / 2.0 * sample.pressure.max(0.05),
        };

        let mut points = Vec::with_capacity(OUTLINE_SEGMENTS);
        for i in 0..OUTLINE_SEGMENTS {
            let angle = i as f32 / OUTLINE_SEGMENTS as f32 * std::f32::consts::TAU;
            points.push(Point::new(
                sample.pos.x + radius * angle.cos(),
                sample.pos.y + radius * angle.sin(),
            ));
        }
        OutlinePath { points }
    }
}

/// A paint-op preset: identity plus settings
#[derive(Debug, Clone, PartialEq)]
pub struct PaintOpPreset {
    pub id: PaintOpId,
    pub settings: PaintOpSettings,
}

impl PaintOpPreset {
    pub fn new(id: impl Into<String>, settings: PaintOpSettings) -> Self {
        Self {
            id: PaintOpId(id.into()),
            settings,
        }
    }
}

/// Immutable snapshot of the painting resources at stroke start
///
/// Shared read-only with the executor; nothing in it changes while the
/// stroke runs.
#[derive(Debug, Clone)]
pub struct ResourcesSnapshot {
    image_bounds: Rect,
    current_node: Arc<LayerNode>,
    preset: PaintOpPreset,
    opacity: f32,
    composite_op: CompositeOp,
    indirect_painting: bool,
}

impl ResourcesSnapshot {
    /// Snapshot the given image's painting state
    ///
    /// Refuses when there is no image or no usable target layer.
    pub fn new(
        image: Option<&Image>,
        override_node: Option<Arc<LayerNode>>,
        preset: PaintOpPreset,
    ) -> Result<Self, PipelineError> {
        let image = image.ok_or(PipelineError::NoActiveImage)?;
        let current_node = override_node
            .or_else(|| image.current_layer().cloned())
            .ok_or(PipelineError::NoActiveLayer)?;

        Ok(Self {
            image_bounds: image.bounds(),
            current_node,
            preset,
            opacity: 1.0,
            composite_op: CompositeOp::over(),
            indirect_painting: false,
        })
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_composite_op(mut self, composite_op: CompositeOp) -> Self {
        self.composite_op = composite_op;
        self
    }

    pub fn with_indirect_painting(mut self, indirect: bool) -> Self {
        self.indirect_painting = indirect;
        self
    }

    pub fn image_bounds(&self) -> Rect {
        self.image_bounds
    }

    pub fn current_node(&self) -> &Arc<LayerNode> {
        &self.current_node
    }

    pub fn preset(&self) -> &PaintOpPreset {
        &self.preset
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn composite_op(&self) -> &CompositeOp {
        &self.composite_op
    }

    pub fn needs_indirect_painting(&self) -> bool {
        self.indirect_painting
    }

    pub fn needs_airbrushing(&self) -> bool {
        self.preset.settings.airbrush_interval_ms.is_some()
    }

    pub fn airbrushing_interval_ms(&self) -> Option<u32> {
        self.preset.settings.airbrush_interval_ms
    }
}

/// A pixel-level painter handle
///
/// The actual blitting machinery lives in the executor; the helper only
/// routes jobs to it and exposes its active paint op.
#[derive(Debug, Clone, PartialEq)]
pub struct Painter {
    paint_op: PaintOpId,
}

impl Painter {
    pub fn new(paint_op: PaintOpId) -> Self {
        Self { paint_op }
    }

    pub fn paint_op(&self) -> &PaintOpId {
        &self.paint_op
    }
}

/// A painter paired with its own distance accumulator
///
/// Owned jointly by the helper and the executor for the duration of the
/// stroke; the executor advances the drag distance as it consumes jobs and
/// the outline query reads it live.
#[derive(Debug)]
pub struct PainterInfo {
    painter: Painter,
    drag_distance: Mutex<DistanceAccumulator>,
}

impl PainterInfo {
    pub fn new(painter: Painter, start_pos: Point, start_time_ms: u32) -> Self {
        Self {
            painter,
            drag_distance: Mutex::new(DistanceAccumulator::new(start_pos, start_time_ms)),
        }
    }

    pub fn painter(&self) -> &Painter {
        &self.painter
    }

    /// Copy of the current drag distance state
    pub fn drag_distance(&self) -> DistanceAccumulator {
        match self.drag_distance.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Advance the drag distance; called by the executor per consumed job
    pub fn push_distance(&self, pos: Point, time_ms: u32) {
        match self.drag_distance.lock() {
            Ok(mut guard) => guard.push(pos, time_ms),
            Err(poisoned) => poisoned.into_inner().push(pos, time_ms),
        }
    }
}

/// Everything the executor needs to set up one stroke
#[derive(Debug, Clone)]
pub struct StrokeStrategy {
    pub indirect_painting: bool,
    pub composite_op: CompositeOp,
    pub resources: Arc<ResourcesSnapshot>,
    pub painters: Vec<Arc<PainterInfo>>,
    /// Human-readable transaction label, e.g. for undo history
    pub transaction_text: String,
}

/// One opaque paint work unit handed to the executor
#[derive(Debug, Clone)]
pub enum StrokeJobData {
    Dab {
        node: LayerId,
        painter: Arc<PainterInfo>,
        sample: PaintSample,
    },
    Line {
        node: LayerId,
        painter: Arc<PainterInfo>,
        start: PaintSample,
        end: PaintSample,
    },
    Curve {
        node: LayerId,
        painter: Arc<PainterInfo>,
        start: PaintSample,
        control1: Point,
        control2: Point,
        end: PaintSample,
    },
}

/// The stroke executor the helper emits jobs into
///
/// Jobs for one stroke preserve their emission order. `add_job` returns
/// `false` for a rejected job (e.g. the stroke was cancelled upstream);
/// the helper drops such jobs silently.
pub trait StrokeExecutor {
    fn start_stroke(&mut self, strategy: StrokeStrategy) -> StrokeId;
    fn add_job(&mut self, id: StrokeId, data: StrokeJobData) -> bool;
    fn end_stroke(&mut self, id: StrokeId);
}

/// Optional recording hook mirroring everything the helper emits
pub trait RecordingAdapter {
    fn start_stroke(&mut self, image_bounds: Rect, resources: &ResourcesSnapshot);
    fn add_point(&mut self, sample: &PaintSample);
    fn add_line(&mut self, start: &PaintSample, end: &PaintSample);
    fn add_curve(
        &mut self,
        start: &PaintSample,
        control1: Point,
        control2: Point,
        end: &PaintSample,
    );
    fn end_stroke(&mut self);
}

/// One recorded stroke element
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedElement {
    StrokeStart { image_bounds: Rect, node: LayerId },
    Point(PaintSample),
    Line(PaintSample, PaintSample),
    Curve(PaintSample, Point, Point, PaintSample),
    StrokeEnd,
}

/// In-memory recording adapter, useful for replay and tests
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    elements: Vec<RecordedElement>,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[RecordedElement] {
        &self.elements
    }
}

impl RecordingAdapter for StrokeRecorder {
    fn start_stroke(&mut self, image_bounds: Rect, resources: &ResourcesSnapshot) {
        self.elements.push(RecordedElement::StrokeStart {
            image_bounds,
            node: resources.current_node().id,
        });
    }

    fn add_point(&mut self, sample: &PaintSample) {
        self.elements.push(RecordedElement::Point(*sample));
    }

    fn add_line(&mut self, start: &PaintSample, end: &PaintSample) {
        self.elements.push(RecordedElement::Line(*start, *end));
    }

    fn add_curve(
        &mut self,
        start: &PaintSample,
        control1: Point,
        control2: Point,
        end: &PaintSample,
    ) {
        self.elements
            .push(RecordedElement::Curve(*start, control1, control2, *end));
    }

    fn end_stroke(&mut self) {
        self.elements.push(RecordedElement::StrokeEnd);
    }
}
