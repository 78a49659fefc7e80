//! Weighted stroke smoothing
//!
//! The weighted mode is a Gaussian over accumulated arc-length, walked in
//! reverse chronological order. Distance is used instead of velocity
//! because wall-clock deltas from real devices are too unstable, and the
//! kernel width adapts at the stroke tail when pressure is dropping so the
//! visible end of the stroke is not smoothed away.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Point;
use crate::stroke::sample::PaintSample;

/// How the helper rewrites incoming samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingMode {
    /// Pass samples through; the helper paints straight line segments
    None,
    /// Pass coordinates through but fit Bézier segments between samples
    Simple,
    /// Gaussian arc-length smoothing plus Bézier fitting
    Weighted,
}

/// Per-stroke smoothing configuration
///
/// Swapping the config on the helper affects the next stroke; a running
/// stroke keeps the snapshot taken when it started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub mode: SmoothingMode,
    /// Kernel reach in pixels; the Gaussian sigma is a third of this
    pub smoothness_distance: f32,
    /// 0-1, how aggressively the kernel narrows on a fading stroke tail
    pub tail_aggressiveness: f32,
    /// Smooth pressure along with coordinates
    pub smooth_pressure: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            mode: SmoothingMode::Simple,
            smoothness_distance: 80.0,
            tail_aggressiveness: 0.15,
            smooth_pressure: false,
        }
    }
}

impl SmoothingConfig {
    pub fn none() -> Self {
        Self {
            mode: SmoothingMode::None,
            ..Self::default()
        }
    }

    pub fn simple() -> Self {
        Self {
            mode: SmoothingMode::Simple,
            ..Self::default()
        }
    }

    pub fn weighted(smoothness_distance: f32, tail_aggressiveness: f32) -> Self {
        Self {
            mode: SmoothingMode::Weighted,
            smoothness_distance,
            tail_aggressiveness,
            smooth_pressure: false,
        }
    }

    /// Whether Bézier segment fitting is active for this config
    pub fn uses_bezier(&self) -> bool {
        matches!(self.mode, SmoothingMode::Simple | SmoothingMode::Weighted)
    }
}

/// Result of one weighted smoothing pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedSample {
    pub pos: Point,
    /// Present only when pressure smoothing is enabled
    pub pressure: Option<f32>,
}

/// Ratio between the newest weight and the weight at which the remaining
/// history tail stops contributing
const NEGLIGIBLE_RATE_RATIO: f32 = 100.0;

/// Kernel degeneracy floor; below this the raw sample is kept
const SCALE_SUM_EPSILON: f32 = 1e-12;

/// Compute the weighted mean of the sample history
///
/// `history` and `distance_history` run oldest to newest and must have
/// equal length; the newest entry is the sample being smoothed. Returns
/// `None` when the kernel degenerates, in which case the caller keeps the
/// raw sample.
pub fn weighted_smooth(
    history: &[PaintSample],
    distance_history: &[f32],
    config: &SmoothingConfig,
) -> Option<SmoothedSample> {
    debug_assert_eq!(history.len(), distance_history.len());

    if history.len() <= 3 || config.smoothness_distance <= 0.0 {
        return None;
    }

    // The configured distance spans the 3-sigma range of the kernel
    let sigma = config.smoothness_distance / 3.0;
    let gaussian_weight = 1.0 / ((2.0 * std::f32::consts::PI).sqrt() * sigma);
    let sigma_squared = sigma * sigma;

    let mut distance_sum = 0.0f32;
    let mut scale_sum = 0.0f32;
    let mut x = 0.0f32;
    let mut y = 0.0f32;
    let mut pressure = 0.0f32;
    let mut base_rate = 0.0f32;

    let newest = history.len() - 1;

    for i in (0..history.len()).rev() {
        let sample = &history[i];
        let mut distance = distance_history[i];

        // Stretch the effective distance where pressure is dropping toward
        // the tail, so the kernel does not smooth the stroke end away
        if i < newest {
            let pressure_grad = sample.pressure - history[i + 1].pressure;
            if pressure_grad > 0.0 {
                let tail = 40.0 * config.tail_aggressiveness;
                distance += pressure_grad * tail * (1.0 - sample.pressure) * 3.0 * sigma;
            }
        }

        distance_sum += distance;
        let rate = gaussian_weight * (-distance_sum * distance_sum / (2.0 * sigma_squared)).exp();

        if i == newest {
            base_rate = rate;
        } else if base_rate / rate > NEGLIGIBLE_RATE_RATIO {
            break;
        }

        scale_sum += rate;
        x += rate * sample.pos.x;
        y += rate * sample.pos.y;

        if config.smooth_pressure {
            pressure += rate * sample.pressure;
        }
    }

    if scale_sum <= SCALE_SUM_EPSILON {
        debug!(scale_sum, "smoothing kernel degenerated, keeping raw sample");
        return None;
    }

    let pos = Point::new(x / scale_sum, y / scale_sum);
    if !pos.is_finite() {
        debug!("smoothing produced non-finite position, keeping raw sample");
        return None;
    }

    Some(SmoothedSample {
        pos,
        pressure: config.smooth_pressure.then(|| pressure / scale_sum),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputDevice;

    fn sample(x: f32, y: f32, pressure: f32, time_ms: u32) -> PaintSample {
        PaintSample::new(
            Point::new(x, y),
            pressure,
            0.0,
            0.0,
            InputDevice::Stylus,
            time_ms,
        )
    }

    fn build_history(samples: &[PaintSample]) -> Vec<f32> {
        let mut distances = Vec::with_capacity(samples.len());
        for (i, s) in samples.iter().enumerate() {
            let d = if i == 0 {
                0.0
            } else {
                samples[i - 1].pos.distance_to(s.pos)
            };
            distances.push(d);
        }
        distances
    }

    #[test]
    fn test_short_history_is_left_alone() {
        let history = vec![
            sample(0.0, 0.0, 1.0, 0),
            sample(10.0, 0.0, 1.0, 10),
            sample(20.0, 0.0, 1.0, 20),
        ];
        let distances = build_history(&history);

        let config = SmoothingConfig::weighted(50.0, 0.15);
        assert!(weighted_smooth(&history, &distances, &config).is_none());
    }

    #[test]
    fn test_straight_line_stays_on_line() {
        let history: Vec<_> = (0..6).map(|i| sample(i as f32 * 10.0, 5.0, 1.0, i * 10)).collect();
        let distances = build_history(&history);

        let config = SmoothingConfig::weighted(50.0, 0.15);
        let smoothed = weighted_smooth(&history, &distances, &config).unwrap();

        // All samples sit on y = 5, so the weighted mean must too
        assert!((smoothed.pos.y - 5.0).abs() < 1e-4);
        // The smoothed x lags behind the newest sample but never leads it
        assert!(smoothed.pos.x <= 50.0);
        assert!(smoothed.pos.x > 0.0);
        assert_eq!(smoothed.pressure, None);
    }

    #[test]
    fn test_jitter_is_attenuated() {
        // Zig-zag around y = 0 with 2 px amplitude
        let history: Vec<_> = (0..8)
            .map(|i| {
                let y = if i % 2 == 0 { 2.0 } else { -2.0 };
                sample(i as f32 * 5.0, y, 1.0, i * 10)
            })
            .collect();
        let distances = build_history(&history);

        let config = SmoothingConfig::weighted(60.0, 0.15);
        let smoothed = weighted_smooth(&history, &distances, &config).unwrap();

        let raw_y = history.last().unwrap().pos.y;
        assert!(smoothed.pos.y.abs() < raw_y.abs());
    }

    #[test]
    fn test_pressure_smoothing_gated_by_flag() {
        let history: Vec<_> = (0..6)
            .map(|i| sample(i as f32 * 10.0, 0.0, 0.2 + 0.1 * i as f32, i * 10))
            .collect();
        let distances = build_history(&history);

        let mut config = SmoothingConfig::weighted(50.0, 0.15);
        assert_eq!(
            weighted_smooth(&history, &distances, &config).unwrap().pressure,
            None
        );

        config.smooth_pressure = true;
        let smoothed = weighted_smooth(&history, &distances, &config).unwrap();
        let smoothed_pressure = smoothed.pressure.unwrap();
        assert!(smoothed_pressure > 0.0 && smoothed_pressure < 1.0);
        // The mean must lag behind the newest (rising) pressure
        assert!(smoothed_pressure < history.last().unwrap().pressure);
    }

    #[test]
    fn test_dropping_pressure_narrows_kernel() {
        // Identical paths, one with falling tail pressure
        let flat: Vec<_> = (0..8).map(|i| sample(i as f32 * 10.0, 0.0, 0.8, i * 10)).collect();
        let fading: Vec<_> = (0..8)
            .map(|i| sample(i as f32 * 10.0, 0.0, 0.8 - 0.09 * i as f32, i * 10))
            .collect();

        let config = SmoothingConfig::weighted(120.0, 1.0);
        let flat_result = weighted_smooth(&flat, &build_history(&flat), &config).unwrap();
        let fading_result = weighted_smooth(&fading, &build_history(&fading), &config).unwrap();

        // With pressure dropping, older samples count less, so the smoothed
        // point stays closer to the newest sample
        assert!(fading_result.pos.x > flat_result.pos.x);
    }

    #[test]
    fn test_zero_distance_kernel_keeps_raw_sample() {
        let config = SmoothingConfig {
            mode: SmoothingMode::Weighted,
            smoothness_distance: 0.0,
            tail_aggressiveness: 0.15,
            smooth_pressure: false,
        };

        let history: Vec<_> = (0..6).map(|i| sample(i as f32, 0.0, 1.0, i * 10)).collect();
        let distances = build_history(&history);
        assert!(weighted_smooth(&history, &distances, &config).is_none());
    }
}
