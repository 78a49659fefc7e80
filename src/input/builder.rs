//! Builds normalized stroke samples from raw pointer events

use tracing::debug;

use crate::geometry::Point;
use crate::input::{PressureCurve, RawPointerEvent, PRESSURE_THRESHOLD};
use crate::stroke::sample::PaintSample;

/// Pressure used when the device has no pressure axis
pub const DEFAULT_PRESSURE: f32 = 1.0;

/// Converts raw pointer events into [`PaintSample`]s
///
/// Applies the configured pressure curve and normalization, fixes pressure
/// for non-pressure devices, and enforces the press threshold at stroke
/// start.
#[derive(Debug, Clone, Default)]
pub struct SampleBuilder {
    pressure_curve: PressureCurve,
}

impl SampleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pressure_curve(pressure_curve: PressureCurve) -> Self {
        Self { pressure_curve }
    }

    pub fn set_pressure_curve(&mut self, pressure_curve: PressureCurve) {
        self.pressure_curve = pressure_curve;
    }

    /// Build the first sample of a stroke
    ///
    /// A press on a pressure device below the press threshold does not
    /// initiate a stroke and returns `None`.
    pub fn start_stroke(&self, event: &RawPointerEvent, elapsed_ms: u32) -> Option<PaintSample> {
        let pressure = self.pressure_of(event);

        if event.device.supports_pressure() && pressure < PRESSURE_THRESHOLD {
            debug!(
                pressure,
                device = ?event.device,
                "press below threshold, stroke not started"
            );
            return None;
        }

        Some(self.sample_from(event, pressure, elapsed_ms))
    }

    /// Build an intermediate sample of a running stroke
    pub fn continue_stroke(&self, event: &RawPointerEvent, elapsed_ms: u32) -> PaintSample {
        let pressure = self.pressure_of(event);
        self.sample_from(event, pressure, elapsed_ms)
    }

    /// Build a sample for outline display only; commits nothing
    pub fn hover(&self, pos: Point, event: &RawPointerEvent) -> PaintSample {
        PaintSample::new(
            pos,
            DEFAULT_PRESSURE,
            event.tilt_x.clamp(-90.0, 90.0),
            event.tilt_y.clamp(-90.0, 90.0),
            event.device,
            0,
        )
    }

    fn pressure_of(&self, event: &RawPointerEvent) -> f32 {
        match event.normalized_pressure() {
            Some(raw) if event.device.supports_pressure() => self.pressure_curve.apply(raw),
            _ => DEFAULT_PRESSURE,
        }
    }

    fn sample_from(&self, event: &RawPointerEvent, pressure: f32, elapsed_ms: u32) -> PaintSample {
        PaintSample::new(
            event.pos,
            pressure,
            event.tilt_x.clamp(-90.0, 90.0),
            event.tilt_y.clamp(-90.0, 90.0),
            event.device,
            elapsed_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputDevice;

    fn stylus_event(pressure_raw: u16) -> RawPointerEvent {
        let mut event = RawPointerEvent::at(Point::new(10.0, 20.0), InputDevice::Stylus, 100);
        event.pressure = Some(pressure_raw);
        event
    }

    #[test]
    fn test_mouse_gets_default_pressure() {
        let builder = SampleBuilder::new();
        let event = RawPointerEvent::at(Point::new(1.0, 1.0), InputDevice::Mouse, 0);

        let sample = builder.start_stroke(&event, 0).unwrap();
        assert_eq!(sample.pressure, DEFAULT_PRESSURE);
        assert_eq!(sample.device, InputDevice::Mouse);
    }

    #[test]
    fn test_press_below_threshold_rejected() {
        let builder = SampleBuilder::new();

        // Raw 0 normalizes to 0.0, below 1/256
        assert!(builder.start_stroke(&stylus_event(0), 0).is_none());

        // Raw 1 normalizes to 1/255, above 1/256
        assert!(builder.start_stroke(&stylus_event(1), 0).is_some());
    }

    #[test]
    fn test_continue_stroke_keeps_low_pressure() {
        let builder = SampleBuilder::new();

        // The threshold only gates stroke start
        let sample = builder.continue_stroke(&stylus_event(0), 50);
        assert_eq!(sample.pressure, 0.0);
        assert_eq!(sample.time_ms, 50);
    }

    #[test]
    fn test_pressure_normalization_and_curve() {
        let builder = SampleBuilder::with_pressure_curve(PressureCurve::Hard);

        let sample = builder.continue_stroke(&stylus_event(255), 0);
        assert_eq!(sample.pressure, 1.0);

        let half = builder.continue_stroke(&stylus_event(128), 0);
        let linear = 128.0 / 255.0;
        assert!((half.pressure - linear * linear).abs() < 1e-6);
    }

    #[test]
    fn test_hover_sample() {
        let builder = SampleBuilder::new();
        let mut event = RawPointerEvent::at(Point::ZERO, InputDevice::Stylus, 42);
        event.tilt_x = 120.0;

        let sample = builder.hover(Point::new(5.0, 6.0), &event);
        assert_eq!(sample.pos, Point::new(5.0, 6.0));
        assert_eq!(sample.pressure, DEFAULT_PRESSURE);
        assert_eq!(sample.tilt_x, 90.0);
        assert_eq!(sample.time_ms, 0);
    }
}
