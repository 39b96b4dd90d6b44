//! Hyperbolic worldlines of constant proper acceleration

use super::frame::Frame;
use crate::relativity::{asinh, fuzzy_gt, fuzzy_le, fuzzy_lt, gamma};
use crate::types::{Bounds, Coordinate};

/// Upper bound on points produced by [`HyperbolicSegment::sample`]
const MAX_SAMPLES: usize = 4096;

/// The branch `(x - xc)² - (t - tc)² = 1/a²` traced by something under
/// constant proper acceleration `a`, with `x` a function of `t`.
///
/// Positive acceleration gives the right-hand branch (`x >= xc`), negative
/// the left-hand one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetAcceleration {
    acceleration: f64,
    center: Coordinate,
}

impl OffsetAcceleration {
    /// `acceleration` must be finite and non-zero
    pub fn new(acceleration: f64, center: Coordinate) -> Self {
        OffsetAcceleration {
            acceleration,
            center,
        }
    }

    /// The curve through `start` with instantaneous velocity `velocity` there
    pub fn through(start: Coordinate, velocity: f64, acceleration: f64) -> Self {
        let k = 1.0 / acceleration.abs();
        let s = acceleration.signum();
        let g = gamma(velocity);
        let center = Coordinate::new(start.x - s * k * g, start.t - s * velocity * k * g);
        OffsetAcceleration::new(acceleration, center)
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Distance from the center to the vertex, `1/|a|`
    fn radius(&self) -> f64 {
        1.0 / self.acceleration.abs()
    }

    fn side(&self) -> f64 {
        self.acceleration.signum()
    }

    pub fn t_to_x(&self, t: f64) -> f64 {
        let k = self.radius();
        self.center.x + self.side() * k.hypot(t - self.center.t)
    }

    pub fn t_to_v(&self, t: f64) -> f64 {
        let u = t - self.center.t;
        if u.is_infinite() {
            return self.side() * u.signum();
        }
        self.side() * u / self.radius().hypot(u)
    }

    /// The two times (earlier, later) at which the curve passes `x`; NaN
    /// when it never does
    pub fn x_to_t(&self, x: f64) -> (f64, f64) {
        let k = self.radius();
        let r = self.side() * (x - self.center.x);
        if r < k {
            return (f64::NAN, f64::NAN);
        }
        let u = ((r - k) * (r + k)).sqrt();
        (self.center.t - u, self.center.t + u)
    }

    /// Coordinate time at which the curve moves at `v`
    pub fn v_to_t(&self, v: f64) -> f64 {
        self.center.t + self.side() * v * self.radius() * gamma(v)
    }

    /// Proper time elapsed from the vertex to `t` (negative before it)
    pub fn t_to_tau(&self, t: f64) -> f64 {
        let k = self.radius();
        k * asinh((t - self.center.t) / k)
    }

    pub fn tau_to_t(&self, tau: f64) -> f64 {
        let k = self.radius();
        self.center.t + k * (tau / k).sinh()
    }

    pub fn event_at(&self, t: f64) -> Coordinate {
        Coordinate::new(self.t_to_x(t), t)
    }

    /// Boosts about the center keep the hyperbola and its branch
    pub fn relative_to(&self, frame: &Frame) -> OffsetAcceleration {
        OffsetAcceleration::new(self.acceleration, frame.to_frame(self.center))
    }
}

/// A piece of an [`OffsetAcceleration`] curve between two coordinate times.
/// Either end may be infinite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HyperbolicSegment {
    curve: OffsetAcceleration,
    min_t: f64,
    max_t: f64,
}

impl HyperbolicSegment {
    pub fn new(curve: OffsetAcceleration, t0: f64, t1: f64) -> Self {
        HyperbolicSegment {
            curve,
            min_t: t0.min(t1),
            max_t: t0.max(t1),
        }
    }

    pub fn curve(&self) -> &OffsetAcceleration {
        &self.curve
    }

    pub fn min_t(&self) -> f64 {
        self.min_t
    }

    pub fn max_t(&self) -> f64 {
        self.max_t
    }

    pub fn start(&self) -> Coordinate {
        self.curve.event_at(self.min_t)
    }

    pub fn end(&self) -> Coordinate {
        self.curve.event_at(self.max_t)
    }

    /// Trim to the part inside `bounds`.
    ///
    /// The t range is clipped first. `|t - tc|` is then limited to the band
    /// where `x(t)` stays inside the x extent. When the curve leaves and
    /// re-enters around its vertex the hull of both pieces is returned; the
    /// gap lies outside the bounds and is clipped by the canvas.
    pub fn intersect(&self, bounds: &Bounds) -> Option<HyperbolicSegment> {
        let t0 = self.min_t.max(bounds.min().t);
        let t1 = self.max_t.min(bounds.max().t);
        if fuzzy_gt(t0, t1) {
            return None;
        }

        let k = self.curve.radius();
        let c = self.curve.center;
        // Distance from the center line along the branch, s·(x - xc)
        let (lo, hi) = if self.curve.side() > 0.0 {
            (bounds.min().x - c.x, bounds.max().x - c.x)
        } else {
            (c.x - bounds.max().x, c.x - bounds.min().x)
        };
        if fuzzy_lt(hi, k) {
            return None;
        }
        let band = |r: f64| if r <= k { 0.0 } else { ((r - k) * (r + k)).sqrt() };
        let u_min = band(lo);
        let u_max = band(hi);

        let (u0, u1) = (t0 - c.t, t1 - c.t);
        let mut hull: Option<(f64, f64)> = None;
        for (a, b) in [(-u_max, -u_min), (u_min, u_max)] {
            let lo = u0.max(a);
            let hi = u1.min(b);
            if fuzzy_le(lo, hi) {
                hull = Some(match hull {
                    Some((h0, h1)) => (h0.min(lo), h1.max(hi)),
                    None => (lo, hi),
                });
            }
        }
        let (a, b) = hull?;
        Some(HyperbolicSegment::new(
            self.curve,
            c.t + a,
            c.t + b.max(a),
        ))
    }

    /// Points along the arc, at most `step` apart in coordinate time.
    /// Both ends must be finite.
    pub fn sample(&self, step: f64) -> Vec<Coordinate> {
        let span = self.max_t - self.min_t;
        if !span.is_finite() || !(step > 0.0) {
            return Vec::new();
        }
        let n = ((span / step).ceil() as usize).clamp(1, MAX_SAMPLES);
        (0..=n)
            .map(|i| self.curve.event_at(self.min_t + span * i as f64 / n as f64))
            .collect()
    }

    pub fn relative_to(&self, frame: &Frame) -> HyperbolicSegment {
        let boost_t = |t: f64| {
            if t.is_finite() {
                frame.to_frame(self.curve.event_at(t)).t
            } else {
                t
            }
        };
        HyperbolicSegment::new(
            self.curve.relative_to(frame),
            boost_t(self.min_t),
            boost_t(self.max_t),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x0: f64, t0: f64, x1: f64, t1: f64) -> Bounds {
        Bounds::from_extents(x0, t0, x1, t1)
    }

    fn unit() -> OffsetAcceleration {
        // x = sqrt(1 + t²), starting at rest at (1, 0)
        OffsetAcceleration::new(1.0, Coordinate::ORIGIN)
    }

    // ===== OffsetAcceleration tests =====

    #[test]
    fn through_start_event_matches_velocity() {
        for (v, a) in [(0.0, 1.0), (0.5, 2.0), (-0.3, -0.5), (0.9, -1.5)] {
            let start = Coordinate::new(2.0, -1.0);
            let curve = OffsetAcceleration::through(start, v, a);
            assert!((curve.t_to_x(start.t) - start.x).abs() < 1e-9);
            assert!((curve.t_to_v(start.t) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn velocity_approaches_light_speed() {
        let curve = unit();
        assert!(curve.t_to_v(1e6) < 1.0);
        assert!(curve.t_to_v(1e6) > 0.999);
        assert_eq!(curve.t_to_v(f64::INFINITY), 1.0);
        assert_eq!(curve.t_to_v(f64::NEG_INFINITY), -1.0);
    }

    #[test]
    fn x_to_t_inverts_t_to_x() {
        let curve = OffsetAcceleration::new(-0.5, Coordinate::new(1.0, 3.0));
        let (early, late) = curve.x_to_t(curve.t_to_x(5.0));
        assert!((late - 5.0).abs() < 1e-9);
        assert!((early - 1.0).abs() < 1e-9);
        assert!(curve.x_to_t(2.0).0.is_nan());
    }

    #[test]
    fn proper_time_round_trip() {
        let curve = OffsetAcceleration::through(Coordinate::ORIGIN, 0.2, 0.7);
        for t in [-3.0, 0.0, 1.5, 10.0] {
            assert!((curve.tau_to_t(curve.t_to_tau(t)) - t).abs() < 1e-9);
        }
        // One unit of proper time at a = 1 from rest covers t = sinh(1)
        assert!((unit().tau_to_t(1.0) - 1f64.sinh()).abs() < 1e-12);
    }

    #[test]
    fn v_to_t_inverts_t_to_v() {
        let curve = OffsetAcceleration::through(Coordinate::new(1.0, 1.0), -0.4, 1.2);
        let t = curve.v_to_t(0.6);
        assert!((curve.t_to_v(t) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn boost_keeps_points_on_curve() {
        let curve = OffsetAcceleration::through(Coordinate::new(1.0, 0.0), 0.3, 2.0);
        let frame = Frame::new(0.6, Coordinate::new(0.5, 0.5)).unwrap();
        let boosted = curve.relative_to(&frame);
        let p = frame.to_frame(curve.event_at(2.0));
        assert!((boosted.t_to_x(p.t) - p.x).abs() < 1e-9);
    }

    // ===== HyperbolicSegment tests =====

    #[test]
    fn no_t_overlap_is_none() {
        let seg = HyperbolicSegment::new(unit(), 0.0, 2.0);
        assert_eq!(seg.intersect(&b(-10.0, 3.0, 10.0, 5.0)), None);
        assert_eq!(seg.intersect(&b(-10.0, -5.0, 10.0, -1.0)), None);
    }

    #[test]
    fn x_range_left_of_branch_is_none() {
        let seg = HyperbolicSegment::new(unit(), -5.0, 5.0);
        assert_eq!(seg.intersect(&b(-10.0, -10.0, 0.5, 10.0)), None);
    }

    #[test]
    fn partial_t_overlap() {
        let seg = HyperbolicSegment::new(unit(), 0.0, 4.0);
        let clipped = seg.intersect(&b(-100.0, 1.0, 100.0, 10.0)).unwrap();
        assert_eq!(clipped.min_t(), 1.0);
        assert_eq!(clipped.max_t(), 4.0);
        assert_eq!(clipped.start().x, unit().t_to_x(1.0));
        assert_eq!(clipped.end().x, unit().t_to_x(4.0));
    }

    #[test]
    fn x_limit_trims_t_range() {
        let seg = HyperbolicSegment::new(unit(), 0.0, 10.0);
        // x <= sqrt(1 + 3²) stops the arc at t = 3
        let clipped = seg.intersect(&b(0.0, -10.0, 10f64.sqrt(), 20.0)).unwrap();
        assert!((clipped.max_t() - 3.0).abs() < 1e-9);
        assert_eq!(clipped.min_t(), 0.0);
    }

    #[test]
    fn left_branch_clips_mirror_image() {
        let curve = OffsetAcceleration::new(-1.0, Coordinate::ORIGIN);
        let seg = HyperbolicSegment::new(curve, -10.0, 10.0);
        let clipped = seg.intersect(&b(-10f64.sqrt(), -10.0, 0.0, 10.0)).unwrap();
        assert!((clipped.min_t() + 3.0).abs() < 1e-9);
        assert!((clipped.max_t() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn unbounded_ends_are_clipped_finite() {
        let seg = HyperbolicSegment::new(unit(), f64::NEG_INFINITY, f64::INFINITY);
        let clipped = seg.intersect(&b(-50.0, -5.0, 50.0, 5.0)).unwrap();
        assert_eq!((clipped.min_t(), clipped.max_t()), (-5.0, 5.0));
        assert!(clipped.sample(0.5).len() > 2);
    }

    #[test]
    fn sample_hits_both_ends() {
        let seg = HyperbolicSegment::new(unit(), -1.0, 2.0);
        let pts = seg.sample(0.25);
        assert_eq!(pts.len(), 13);
        assert_eq!(pts[0], seg.start());
        assert!((pts[12].t - 2.0).abs() < 1e-12);
        assert!(HyperbolicSegment::new(unit(), 0.0, f64::INFINITY).sample(1.0).is_empty());
    }

    #[test]
    fn boosted_segment_keeps_endpoints() {
        let seg = HyperbolicSegment::new(unit(), 0.0, 2.0);
        let frame = Frame::boost(0.4).unwrap();
        let boosted = seg.relative_to(&frame);
        let end = frame.to_frame(seg.end());
        assert!((boosted.max_t() - end.t).abs() < 1e-9);
        assert!((boosted.end().x - end.x).abs() < 1e-9);
    }
}
