//! Stroke samples and per-painter distance tracking

use crate::geometry::Point;
use crate::input::InputDevice;

/// One normalized observation of the input device
///
/// Samples are small immutable values; the pipeline copies them freely
/// between the smoothing history, emitted jobs and the recorder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintSample {
    pub pos: Point,
    /// Normalized pressure in 0-1
    pub pressure: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
    pub device: InputDevice,
    /// Milliseconds since the stroke started
    pub time_ms: u32,
}

impl PaintSample {
    pub fn new(
        pos: Point,
        pressure: f32,
        tilt_x: f32,
        tilt_y: f32,
        device: InputDevice,
        time_ms: u32,
    ) -> Self {
        Self {
            pos,
            pressure,
            tilt_x,
            tilt_y,
            device,
            time_ms,
        }
    }

    /// Copy with a different position, used when smoothing rewrites a sample
    pub fn with_pos(mut self, pos: Point) -> Self {
        self.pos = pos;
        self
    }

    /// Copy with a different pressure
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    /// Copy re-tagged with another device, used by the airbrush timer
    pub fn with_device(mut self, device: InputDevice) -> Self {
        self.device = device;
        self
    }

    /// False for NaN or infinite coordinates/pressure; such samples are
    /// dropped by the helper
    pub fn is_valid(&self) -> bool {
        self.pos.is_finite() && self.pressure.is_finite()
    }
}

/// Running arc-length of a painter within one stroke
///
/// Created when a painter begins, fed every consumed sample, and read by
/// the brush-outline query while the stroke is live. Shares the lifetime
/// of its painter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceAccumulator {
    total_distance: f32,
    last_pos: Point,
    last_time_ms: u32,
}

impl DistanceAccumulator {
    pub fn new(pos: Point, time_ms: u32) -> Self {
        Self {
            total_distance: 0.0,
            last_pos: pos,
            last_time_ms: time_ms,
        }
    }

    /// Consume one sample position, accumulating the travelled distance
    pub fn push(&mut self, pos: Point, time_ms: u32) {
        self.total_distance += self.last_pos.distance_to(pos);
        self.last_pos = pos;
        self.last_time_ms = time_ms;
    }

    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    pub fn last_pos(&self) -> Point {
        self.last_pos
    }

    pub fn last_time_ms(&self) -> u32 {
        self.last_time_ms
    }
}
