//! Geometry model: frames, straight lines, hyperbolic arcs and worldlines.
//!
//! Everything here is a value type. Each shape knows how to clip itself
//! against a [`Bounds`] and how to re-express itself in another [`Frame`].

mod frame;
mod hyperbola;
mod line;
mod worldline;

pub use frame::Frame;
pub use hyperbola::{HyperbolicSegment, OffsetAcceleration};
pub use line::{Axis, ConcreteLine, Line, LineSegment};
pub use worldline::{CurveSegment, Duration, Leg, Motion, Observer, WorldlineSegment};

use crate::relativity::{fuzzy_gt, fuzzy_lt, fuzzy_zero};
use crate::types::{Bounds, Coordinate};

/// Liang–Barsky clip of `p + d·s` for `s` in `[s0, s1]` against `bounds`.
///
/// Returns the surviving parameter range. Direction components that are
/// fuzzy-zero are treated as parallel to that edge.
pub(crate) fn clip_parametric(
    p: Coordinate,
    d: Coordinate,
    mut s0: f64,
    mut s1: f64,
    bounds: &Bounds,
) -> Option<(f64, f64)> {
    let min = bounds.min();
    let max = bounds.max();
    let edges = [
        (-d.x, p.x - min.x),
        (d.x, max.x - p.x),
        (-d.t, p.t - min.t),
        (d.t, max.t - p.t),
    ];
    for (step, room) in edges {
        if fuzzy_zero(step) {
            if fuzzy_lt(room, 0.0) {
                return None;
            }
            continue;
        }
        let r = room / step;
        if step < 0.0 {
            s0 = s0.max(r);
        } else {
            s1 = s1.min(r);
        }
    }
    if fuzzy_gt(s0, s1) || !s0.is_finite() || !s1.is_finite() {
        return None;
    }
    Some((s0, s1.max(s0)))
}
