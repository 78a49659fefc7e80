//! Cubic Bézier control points from sample tangents
//!
//! Given two consecutive samples and their tangents, computes the two
//! control points of the connecting cubic segment. The control targets are
//! pulled toward the tangent ray intersection, with an asymmetric blend
//! that keeps fast-then-slow transitions from cutting corners.

use tracing::{debug, warn};

use crate::geometry::{extend_to_length, intersect_lines, LineIntersection, Point};

/// Intersection points farther out than this are treated as runaway and
/// replaced by the segment midpoint
pub const SANITY_RADIUS: f32 = 1e6;

/// Floor applied to degenerate tangent velocities
pub const VELOCITY_FLOOR: f32 = 1e-6;

/// How far control points approach their targets before similarity damping
const CONTROL_APPROACH: f32 = 0.8;

/// Velocity similarity is clamped so the controls differ at most 50%
const SIMILARITY_FLOOR: f32 = 0.5;

/// Control points of one cubic segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierControls {
    pub control1: Point,
    pub control2: Point,
}

/// Compute control points for the segment from `p1` to `p2`
///
/// `tangent1` and `tangent2` are the time-normalized tangents at the two
/// endpoints. Returns `None` when either tangent is unset; the caller
/// skips the segment in that case.
pub fn bezier_controls(
    p1: Point,
    p2: Point,
    tangent1: Point,
    tangent2: Point,
) -> Option<BezierControls> {
    if tangent1.is_null() || tangent2.is_null() {
        return None;
    }

    // Directions in which the control points want to travel
    let control_direction1 = p1 + tangent1;
    let control_direction2 = p2 - tangent2;

    let control_target1;
    let control_target2;

    // When the chord between the control directions crosses the endpoint
    // chord, the controls stay on their own rays at half the endpoint
    // distance; otherwise both pull toward the ray intersection
    let crossing = intersect_lines(control_direction1, control_direction2, p1, p2);
    if let LineIntersection::Bounded(_) = crossing {
        let control_length = p1.distance_to(p2) / 2.0;
        control_target1 = extend_to_length(p1, control_direction1, control_length);
        control_target2 = extend_to_length(p2, control_direction2, control_length);
    } else {
        let intersection = match intersect_lines(p1, control_direction1, p2, control_direction2) {
            LineIntersection::Bounded(point) | LineIntersection::Unbounded(point)
                if point.manhattan_length() <= SANITY_RADIUS =>
            {
                point
            }
            _ => {
                debug!("tangent rays do not intersect sanely, using segment midpoint");
                Point::midpoint(p1, p2)
            }
        };

        control_target1 = intersection;
        control_target2 = intersection;
    }

    let mut velocity1 = tangent1.length();
    let mut velocity2 = tangent2.length();

    if velocity1 == 0.0 || velocity2 == 0.0 {
        velocity1 = VELOCITY_FLOOR;
        velocity2 = VELOCITY_FLOOR;
        warn!("zero tangent velocity in segment fitting");
    }

    let similarity = (velocity1 / velocity2).min(velocity2 / velocity1);

    // The controls should not differ more than 50%
    let similarity = similarity.max(SIMILARITY_FLOOR);

    // Symmetric controls get shorter reach to avoid corner-like curves
    let mut coeff = CONTROL_APPROACH * (1.0 - (similarity - 0.8).max(0.0));

    let control1;
    let control2;

    // The faster side gets the full coefficient, the slower side a damped
    // one, which biases the curve toward the incoming motion
    if velocity1 > velocity2 {
        control1 = p1 * (1.0 - coeff) + control_target1 * coeff;
        coeff *= similarity;
        control2 = p2 * (1.0 - coeff) + control_target2 * coeff;
    } else {
        control2 = p2 * (1.0 - coeff) + control_target2 * coeff;
        coeff *= similarity;
        control1 = p1 * (1.0 - coeff) + control_target1 * coeff;
    }

    Some(BezierControls { control1, control2 })
}
