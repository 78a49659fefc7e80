//! Freehand stroke helper
//!
//! Orchestrates one stroke at a time: builds samples from pointer events,
//! smooths them, fits Bézier segments, and emits dab/line/curve jobs to
//! the stroke executor. Timer behavior (airbrush, stroke timeout) is
//! deadline-based and driven by the host through [`StrokeHelper::pump_timers`],
//! so tests never depend on a wall clock.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::geometry::Point;
use crate::input::{InputDevice, RawPointerEvent, SampleBuilder};
use crate::stroke::bezier::bezier_controls;
use crate::stroke::executor::{
    OutlineMode, OutlinePath, PaintOpId, PaintOpSettings, Painter, PainterInfo, RecordingAdapter,
    ResourcesSnapshot, StrokeExecutor, StrokeId, StrokeJobData, StrokeStrategy,
};
use crate::stroke::sample::{DistanceAccumulator, PaintSample};
use crate::stroke::smoothing::{weighted_smooth, SmoothingConfig, SmoothingMode};

/// Cursor movement below this (per axis) keeps the outline reference stable
const POINT_SWAP_THRESHOLD: f32 = 7.0;

/// A paused stroke finalizes its pending segment after this long
pub const STROKE_TIMEOUT_MS: u64 = 100;

/// Previous cursor position for the paint-op outline
///
/// Keeps two past points and guarantees the returned point differs from
/// the current one, so the outline never flickers against a zero-length
/// reference. Mouse devices generate x and y offsets separately (a stairs
/// pattern), hence both axes must clear the threshold before swapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionHistory {
    first: Point,
    second: Point,
}

impl PositionHistory {
    /// Return the previously used point, guaranteed not equal to `pt`,
    /// updating the history if the cursor moved far enough
    pub fn push_through_history(&mut self, pt: Point) -> Point {
        if (pt.x - self.second.x).abs() > POINT_SWAP_THRESHOLD
            && (pt.y - self.second.y).abs() > POINT_SWAP_THRESHOLD
        {
            let result = self.second;
            self.first = self.second;
            self.second = pt;
            result
        } else {
            self.first
        }
    }
}

/// Airbrush re-emission deadline
#[derive(Debug, Clone, Copy)]
struct AirbrushTimer {
    interval_ms: u32,
    next_fire_ms: u64,
}

/// Everything owned by one active stroke
struct StrokeState {
    stroke_id: StrokeId,
    resources: Arc<ResourcesSnapshot>,
    painters: Vec<Arc<PainterInfo>>,

    /// Host clock at stroke start; sample times are relative to this
    stroke_start_ms: u64,

    previous: PaintSample,
    older: PaintSample,
    previous_tangent: Point,
    have_tangent: bool,
    has_painted: bool,

    /// Per-stroke snapshot; later `set_smoothness` calls do not reshape
    /// a stroke already in flight
    smoothing: SmoothingConfig,

    history: Vec<PaintSample>,
    distance_history: Vec<f32>,

    timeout_deadline_ms: Option<u64>,
    airbrush: Option<AirbrushTimer>,
}

impl StrokeState {
    fn first_painter(&self) -> Arc<PainterInfo> {
        // The sample pipeline routes to the first painter; additional
        // painters are the executor's concern (mirror/symmetry modes)
        Arc::clone(&self.painters[0])
    }

    fn paint_at(
        &mut self,
        sample: PaintSample,
        facade: &mut dyn StrokeExecutor,
        recorder: &mut Option<Box<dyn RecordingAdapter>>,
    ) {
        self.has_painted = true;
        let accepted = facade.add_job(
            self.stroke_id,
            StrokeJobData::Dab {
                node: self.resources.current_node().id,
                painter: self.first_painter(),
                sample,
            },
        );
        if !accepted {
            debug!(stroke = self.stroke_id.0, "dab job rejected");
        }
        if let Some(recorder) = recorder {
            recorder.add_point(&sample);
        }
    }

    fn paint_line(
        &mut self,
        start: PaintSample,
        end: PaintSample,
        facade: &mut dyn StrokeExecutor,
        recorder: &mut Option<Box<dyn RecordingAdapter>>,
    ) {
        self.has_painted = true;
        let accepted = facade.add_job(
            self.stroke_id,
            StrokeJobData::Line {
                node: self.resources.current_node().id,
                painter: self.first_painter(),
                start,
                end,
            },
        );
        if !accepted {
            debug!(stroke = self.stroke_id.0, "line job rejected");
        }
        if let Some(recorder) = recorder {
            recorder.add_line(&start, &end);
        }
    }

    fn paint_curve(
        &mut self,
        start: PaintSample,
        control1: Point,
        control2: Point,
        end: PaintSample,
        facade: &mut dyn StrokeExecutor,
        recorder: &mut Option<Box<dyn RecordingAdapter>>,
    ) {
        self.has_painted = true;
        let accepted = facade.add_job(
            self.stroke_id,
            StrokeJobData::Curve {
                node: self.resources.current_node().id,
                painter: self.first_painter(),
                start,
                control1,
                control2,
                end,
            },
        );
        if !accepted {
            debug!(stroke = self.stroke_id.0, "curve job rejected");
        }
        if let Some(recorder) = recorder {
            recorder.add_curve(&start, control1, control2, &end);
        }
    }

    fn paint_bezier_segment(
        &mut self,
        start: PaintSample,
        end: PaintSample,
        tangent1: Point,
        tangent2: Point,
        facade: &mut dyn StrokeExecutor,
        recorder: &mut Option<Box<dyn RecordingAdapter>>,
    ) {
        let Some(controls) = bezier_controls(start.pos, end.pos, tangent1, tangent2) else {
            return;
        };
        self.paint_curve(
            start,
            controls.control1,
            controls.control2,
            end,
            facade,
            recorder,
        );
    }

    /// Finalize the pending segment up to the last consumed sample
    fn finish_segment(
        &mut self,
        facade: &mut dyn StrokeExecutor,
        recorder: &mut Option<Box<dyn RecordingAdapter>>,
    ) {
        if !self.have_tangent {
            return;
        }
        self.have_tangent = false;

        let delta_ms = self.previous.time_ms.saturating_sub(self.older.time_ms).max(1);
        let new_tangent = (self.previous.pos - self.older.pos) / delta_ms as f32;

        let (older, previous, previous_tangent) = (self.older, self.previous, self.previous_tangent);
        self.paint_bezier_segment(older, previous, previous_tangent, new_tangent, facade, recorder);
    }
}

/// The freehand stroke orchestrator
///
/// Owns at most one active stroke. Runs on the UI thread and never
/// blocks; jobs handed to the executor are scheduled elsewhere.
pub struct StrokeHelper {
    builder: SampleBuilder,
    transaction_text: String,
    recorder: Option<Box<dyn RecordingAdapter>>,

    smoothing: SmoothingConfig,
    outline_pos: PositionHistory,

    state: Option<StrokeState>,
}

impl StrokeHelper {
    pub fn new(builder: SampleBuilder, transaction_text: impl Into<String>) -> Self {
        Self {
            builder,
            transaction_text: transaction_text.into(),
            recorder: None,
            smoothing: SmoothingConfig::default(),
            outline_pos: PositionHistory::default(),
            state: None,
        }
    }

    pub fn with_recorder(
        builder: SampleBuilder,
        transaction_text: impl Into<String>,
        recorder: Box<dyn RecordingAdapter>,
    ) -> Self {
        let mut helper = Self::new(builder, transaction_text);
        helper.recorder = Some(recorder);
        helper
    }

    /// Swap the smoothing configuration for subsequent strokes
    pub fn set_smoothness(&mut self, smoothing: SmoothingConfig) {
        self.smoothing = smoothing;
    }

    pub fn smoothness(&self) -> &SmoothingConfig {
        &self.smoothing
    }

    pub fn is_stroke_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn active_stroke_id(&self) -> Option<StrokeId> {
        self.state.as_ref().map(|s| s.stroke_id)
    }

    /// The first painter's active paint op while a stroke is live
    pub fn current_paint_op(&self) -> Option<&PaintOpId> {
        self.state
            .as_ref()
            .and_then(|s| s.painters.first())
            .map(|p| p.painter().paint_op())
    }

    /// Begin a stroke from a press event
    ///
    /// Builds the first sample, snapshots resources, creates painters,
    /// registers the stroke with the executor and arms the airbrush timer
    /// when the preset asks for it.
    pub fn init_paint(
        &mut self,
        event: &RawPointerEvent,
        resources: Arc<ResourcesSnapshot>,
        facade: &mut dyn StrokeExecutor,
    ) -> Result<StrokeId, PipelineError> {
        if self.state.is_some() {
            debug!("stroke already active, restarting");
            self.end_paint(facade);
        }

        let first = self
            .builder
            .start_stroke(event, 0)
            .ok_or(PipelineError::PressureBelowThreshold)?;

        let painter = Painter::new(resources.preset().id.clone());
        let painters = vec![Arc::new(PainterInfo::new(
            painter,
            first.pos,
            first.time_ms,
        ))];

        if let Some(recorder) = &mut self.recorder {
            recorder.start_stroke(resources.image_bounds(), &resources);
        }

        let strategy = StrokeStrategy {
            indirect_painting: resources.needs_indirect_painting(),
            composite_op: resources.composite_op().clone(),
            resources: Arc::clone(&resources),
            painters: painters.clone(),
            transaction_text: self.transaction_text.clone(),
        };
        let stroke_id = facade.start_stroke(strategy);

        let airbrush = resources
            .airbrushing_interval_ms()
            .map(|interval_ms| AirbrushTimer {
                interval_ms,
                next_fire_ms: event.timestamp_ms + interval_ms as u64,
            });

        info!(stroke = stroke_id.0, device = ?event.device, "stroke started");

        self.state = Some(StrokeState {
            stroke_id,
            resources,
            painters,
            stroke_start_ms: event.timestamp_ms,
            previous: first,
            older: first,
            previous_tangent: Point::ZERO,
            have_tangent: false,
            has_painted: false,
            smoothing: self.smoothing,
            history: Vec::new(),
            distance_history: Vec::new(),
            timeout_deadline_ms: None,
            airbrush,
        });

        Ok(stroke_id)
    }

    /// Ingest one sample of the active stroke
    ///
    /// No-op when no stroke is active (e.g. after an upstream cancel).
    pub fn paint(&mut self, event: &RawPointerEvent, facade: &mut dyn StrokeExecutor) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        // Sample times within a stroke are non-decreasing even if the host
        // clock misbehaves
        let elapsed = event
            .timestamp_ms
            .saturating_sub(state.stroke_start_ms)
            .min(u32::MAX as u64) as u32;
        let elapsed = elapsed.max(state.previous.time_ms);

        let mut info = self.builder.continue_stroke(event, elapsed);

        if !info.is_valid() {
            warn!(pos = ?info.pos, "dropping non-finite sample");
            return;
        }

        // Smooth the coordinates against the history and travelled
        // distance. Distance is used instead of velocity because event
        // timing is too unstable on real systems.
        if state.smoothing.mode == SmoothingMode::Weighted
            && state.smoothing.smoothness_distance > 0.0
        {
            let prev_pos = state
                .history
                .last()
                .map(|s| s.pos)
                .unwrap_or(state.previous.pos);
            state.distance_history.push(prev_pos.distance_to(info.pos));
            state.history.push(info);

            if let Some(smoothed) =
                weighted_smooth(&state.history, &state.distance_history, &state.smoothing)
            {
                info = info.with_pos(smoothed.pos);
                if let Some(pressure) = smoothed.pressure {
                    info = info.with_pressure(pressure);
                }
                if let Some(last) = state.history.last_mut() {
                    *last = info;
                }
            }
        }

        if state.smoothing.uses_bezier() {
            // Paint between the samples with Bézier interpolation; the
            // first post-initial sample only seeds the tangent
            if !state.have_tangent {
                state.have_tangent = true;
                let delta_ms = info.time_ms.saturating_sub(state.previous.time_ms).max(1);
                state.previous_tangent = (info.pos - state.previous.pos) / delta_ms as f32;
            } else {
                let delta_ms = info.time_ms.saturating_sub(state.older.time_ms).max(1);
                let new_tangent = (info.pos - state.older.pos) / delta_ms as f32;

                let (older, previous, previous_tangent) =
                    (state.older, state.previous, state.previous_tangent);
                state.paint_bezier_segment(
                    older,
                    previous,
                    previous_tangent,
                    new_tangent,
                    facade,
                    &mut self.recorder,
                );
                state.previous_tangent = new_tangent;
            }
            state.older = state.previous;
            state.timeout_deadline_ms = Some(event.timestamp_ms + STROKE_TIMEOUT_MS);
        } else {
            let previous = state.previous;
            state.paint_line(previous, info, facade, &mut self.recorder);
        }

        state.previous = info;

        if let Some(airbrush) = &mut state.airbrush {
            airbrush.next_fire_ms = event.timestamp_ms + airbrush.interval_ms as u64;
        }
    }

    /// End the active stroke
    ///
    /// A stroke that never painted leaves a single dab at its starting
    /// sample; otherwise the pending segment is finalized. Timers stop,
    /// painters are released and the executor closes the stroke id.
    pub fn end_paint(&mut self, facade: &mut dyn StrokeExecutor) {
        let Some(mut state) = self.state.take() else {
            return;
        };

        if !state.has_painted {
            let previous = state.previous;
            state.paint_at(previous, facade, &mut self.recorder);
        } else if state.smoothing.mode != SmoothingMode::None {
            state.finish_segment(facade, &mut self.recorder);
        }

        facade.end_stroke(state.stroke_id);
        info!(stroke = state.stroke_id.0, "stroke ended");

        if let Some(recorder) = &mut self.recorder {
            recorder.end_stroke();
        }
    }

    /// Finalize the pending Bézier segment without ending the stroke
    ///
    /// This is what the stroke timeout fires; exposed so hosts and tests
    /// can flush a paused stroke deterministically.
    pub fn flush_timeout(&mut self, facade: &mut dyn StrokeExecutor) {
        if let Some(state) = self.state.as_mut() {
            state.timeout_deadline_ms = None;
            state.finish_segment(facade, &mut self.recorder);
        }
    }

    /// Fire any timers whose deadline has passed
    ///
    /// Called from the host's event loop; never re-enters `paint` or
    /// `end_paint`. The airbrush timer catches up one dab per elapsed
    /// interval so a stationary cursor keeps spraying.
    pub fn pump_timers(&mut self, now_ms: u64, facade: &mut dyn StrokeExecutor) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        if let Some(mut airbrush) = state.airbrush {
            while airbrush.next_fire_ms <= now_ms {
                let dab = state.previous.with_device(InputDevice::AirbrushTimer);
                state.paint_at(dab, facade, &mut self.recorder);
                airbrush.next_fire_ms += airbrush.interval_ms.max(1) as u64;
            }
            state.airbrush = Some(airbrush);
        }

        if state.timeout_deadline_ms.is_some_and(|deadline| now_ms >= deadline) {
            state.timeout_deadline_ms = None;
            state.finish_segment(facade, &mut self.recorder);
        }
    }

    /// The brush outline to draw as cursor
    ///
    /// Pure query: uses the hover sample and position history while idle,
    /// and the live stroke sample plus the first painter's drag distance
    /// while painting.
    pub fn paint_op_outline(
        &mut self,
        saved_cursor: Point,
        event: &RawPointerEvent,
        global_settings: &PaintOpSettings,
        mode: OutlineMode,
    ) -> OutlinePath {
        let hover = self.builder.hover(saved_cursor, event);
        let history_pos = self.outline_pos.push_through_history(saved_cursor);

        match self.state.as_ref() {
            Some(state) => {
                let settings = &state.resources.preset().settings;
                let distance = state.painters[0].drag_distance();
                settings.brush_outline(&state.previous, Some(&distance), mode)
            }
            None => {
                let distance = DistanceAccumulator::new(history_pos, 0);
                global_settings.brush_outline(&hover, Some(&distance), mode)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn history_sizes(&self) -> (usize, usize) {
        self.state
            .as_ref()
            .map(|s| (s.history.len(), s.distance_history.len()))
            .unwrap_or((0, 0))
    }
}
