//! Pointer input types feeding the stroke pipeline
//!
//! The pipeline consumes a clean stream of [`RawPointerEvent`]s; whatever
//! windowing system or tablet API produces them is expected to sit above
//! this module. The pressure-edge synthesizer lives here as the one
//! compatibility adapter for devices that report pressure but no buttons.

pub mod builder;

pub use builder::SampleBuilder;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Maximum raw pressure value reported by pointer events
pub const PRESSURE_RAW_MAX: f32 = 255.0;

/// Normalized pressure that turns a touch into a press
///
/// A rising edge through this value is treated as a left-button press, a
/// falling edge as a release, even when the device reports no buttons.
pub const PRESSURE_THRESHOLD: f32 = 1.0 / 256.0;

/// Left button bit in [`RawPointerEvent::buttons`]
pub const BUTTON_LEFT: u32 = 1 << 0;
/// Right button bit in [`RawPointerEvent::buttons`]
pub const BUTTON_RIGHT: u32 = 1 << 1;
/// Middle button bit in [`RawPointerEvent::buttons`]
pub const BUTTON_MIDDLE: u32 = 1 << 2;

/// The physical device a sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputDevice {
    Mouse,
    Stylus,
    Eraser,
    Puck,
    /// Synthetic samples re-emitted by the airbrush timer
    AirbrushTimer,
}

impl InputDevice {
    /// Whether the device reports meaningful pressure values
    pub fn supports_pressure(&self) -> bool {
        matches!(
            self,
            InputDevice::Stylus | InputDevice::Eraser | InputDevice::Puck
        )
    }
}

/// One raw pointer event as delivered by the host windowing layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPointerEvent {
    /// Position in image coordinates, sub-pixel
    pub pos: Point,
    /// Position in screen coordinates
    pub global_pos: Point,
    /// Raw pressure 0-255; `None` for devices without a pressure axis
    pub pressure: Option<u16>,
    /// Tilt around the x axis, degrees
    pub tilt_x: f32,
    /// Tilt around the y axis, degrees
    pub tilt_y: f32,
    pub device: InputDevice,
    /// Button state bitmap (`BUTTON_*` bits)
    pub buttons: u32,
    /// Keyboard modifier bitmap
    pub modifiers: u32,
    /// Host clock timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl RawPointerEvent {
    /// A minimal event at a position, useful for tests and hover queries
    pub fn at(pos: Point, device: InputDevice, timestamp_ms: u64) -> Self {
        Self {
            pos,
            global_pos: pos,
            pressure: None,
            tilt_x: 0.0,
            tilt_y: 0.0,
            device,
            buttons: 0,
            modifiers: 0,
            timestamp_ms,
        }
    }

    /// Raw pressure normalized to 0-1, if the event carries any
    pub fn normalized_pressure(&self) -> Option<f32> {
        self.pressure
            .map(|raw| (raw as f32 / PRESSURE_RAW_MAX).clamp(0.0, 1.0))
    }
}

/// Pressure curve types for mapping normalized pressure to output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureCurve {
    /// Linear mapping (1:1)
    Linear,
    /// Soft curve (easier light pressure)
    Soft,
    /// Hard curve (requires more pressure)
    Hard,
    /// S-curve (soft at extremes, linear in middle)
    SCurve,
}

impl PressureCurve {
    /// Apply the pressure curve to a normalized pressure value (0.0 - 1.0)
    pub fn apply(&self, pressure: f32) -> f32 {
        let p = pressure.clamp(0.0, 1.0);
        match self {
            PressureCurve::Linear => p,
            PressureCurve::Soft => p.sqrt(),
            PressureCurve::Hard => p * p,
            PressureCurve::SCurve => p * p * (3.0 - 2.0 * p),
        }
    }
}

impl Default for PressureCurve {
    fn default() -> Self {
        PressureCurve::Linear
    }
}

/// Synthetic button transition derived from a pressure edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticButton {
    Pressed,
    Released,
}

/// Turns pressure threshold crossings into left-button transitions
///
/// Tablet drivers on some platforms deliver pen contact purely as a
/// pressure stream. This adapter watches for crossings of
/// [`PRESSURE_THRESHOLD`] and reports them as button events so the rest of
/// the pipeline only ever deals with pressed/released state.
#[derive(Debug, Default)]
pub struct PressureEdgeSynthesizer {
    previous: f32,
}

impl PressureEdgeSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one normalized pressure value; returns a transition on an edge
    pub fn transition(&mut self, pressure: f32) -> Option<SyntheticButton> {
        let was_down = self.previous >= PRESSURE_THRESHOLD;
        let is_down = pressure >= PRESSURE_THRESHOLD;
        self.previous = pressure;

        match (was_down, is_down) {
            (false, true) => Some(SyntheticButton::Pressed),
            (true, false) => Some(SyntheticButton::Released),
            _ => None,
        }
    }

    /// Forget the tracked state, e.g. on proximity leave
    pub fn reset(&mut self) {
        self.previous = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_pressure() {
        let mut event = RawPointerEvent::at(Point::ZERO, InputDevice::Stylus, 0);
        event.pressure = Some(255);
        assert_eq!(event.normalized_pressure(), Some(1.0));

        event.pressure = Some(0);
        assert_eq!(event.normalized_pressure(), Some(0.0));

        event.pressure = None;
        assert_eq!(event.normalized_pressure(), None);
    }

    #[test]
    fn test_pressure_curve_soft_and_hard() {
        assert!(PressureCurve::Soft.apply(0.25) > 0.25);
        assert!(PressureCurve::Hard.apply(0.5) < 0.5);
        assert_eq!(PressureCurve::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn test_edge_synthesizer_rising_and_falling() {
        let mut edges = PressureEdgeSynthesizer::new();

        assert_eq!(edges.transition(0.0), None);
        assert_eq!(edges.transition(0.5), Some(SyntheticButton::Pressed));
        assert_eq!(edges.transition(0.6), None);
        assert_eq!(edges.transition(0.0), Some(SyntheticButton::Released));
        assert_eq!(edges.transition(0.0), None);
    }

    #[test]
    fn test_edge_synthesizer_threshold_boundary() {
        let mut edges = PressureEdgeSynthesizer::new();

        // Just below the threshold is still "up"
        assert_eq!(edges.transition(PRESSURE_THRESHOLD * 0.9), None);
        assert_eq!(
            edges.transition(PRESSURE_THRESHOLD),
            Some(SyntheticButton::Pressed)
        );
    }
}
