//! Observers: worldlines assembled from coasting and accelerating segments

use super::frame::Frame;
use super::hyperbola::{HyperbolicSegment, OffsetAcceleration};
use super::line::{ConcreteLine, LineSegment};
use crate::errors::ExecutionErrorKind;
use crate::relativity::{fuzzy_le, fuzzy_lt, fuzzy_zero, gamma, is_subluminal};
use crate::types::{Bounds, Coordinate};

/// The drawable shape of one worldline piece
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CurveSegment {
    Segment(LineSegment),
    Line(ConcreteLine),
    Hyperbola(HyperbolicSegment),
}

impl CurveSegment {
    /// Clip to `bounds`. Infinite lines come back as finite segments.
    pub fn intersect(&self, bounds: &Bounds) -> Option<CurveSegment> {
        match self {
            CurveSegment::Segment(s) => s.intersect(bounds).map(CurveSegment::Segment),
            CurveSegment::Line(l) => l.intersect(bounds).map(CurveSegment::Segment),
            CurveSegment::Hyperbola(h) => h.intersect(bounds).map(CurveSegment::Hyperbola),
        }
    }

    pub fn relative_to(&self, frame: &Frame) -> CurveSegment {
        match self {
            CurveSegment::Segment(s) => CurveSegment::Segment(s.relative_to(frame)),
            CurveSegment::Line(l) => CurveSegment::Line(l.relative_to(frame)),
            CurveSegment::Hyperbola(h) => CurveSegment::Hyperbola(h.relative_to(frame)),
        }
    }
}

/// One piece of a worldline, valid for coordinate times `[min_t, max_t]`.
///
/// Proper time is tracked through an anchor: the segment's proper time at
/// coordinate time `anchor_t` is `anchor_tau`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldlineSegment {
    curve: CurveSegment,
    min_t: f64,
    max_t: f64,
    anchor_t: f64,
    anchor_tau: f64,
}

impl WorldlineSegment {
    /// Constant velocity through `anchor`, where the proper time is `tau`
    fn coasting(anchor: Coordinate, velocity: f64, tau: f64, min_t: f64, max_t: f64) -> Self {
        let curve = if min_t.is_finite() && max_t.is_finite() {
            let at = |t: f64| Coordinate::new(anchor.x + velocity * (t - anchor.t), t);
            CurveSegment::Segment(LineSegment::new(at(min_t), at(max_t)))
        } else {
            CurveSegment::Line(ConcreteLine::with_velocity(anchor, velocity))
        };
        WorldlineSegment {
            curve,
            min_t,
            max_t,
            anchor_t: anchor.t,
            anchor_tau: tau,
        }
    }

    fn accelerating(curve: OffsetAcceleration, anchor_t: f64, tau: f64, min_t: f64, max_t: f64) -> Self {
        WorldlineSegment {
            curve: CurveSegment::Hyperbola(HyperbolicSegment::new(curve, min_t, max_t)),
            min_t,
            max_t,
            anchor_t,
            anchor_tau: tau,
        }
    }

    pub fn curve(&self) -> &CurveSegment {
        &self.curve
    }

    pub fn min_t(&self) -> f64 {
        self.min_t
    }

    pub fn max_t(&self) -> f64 {
        self.max_t
    }

    pub fn contains_t(&self, t: f64) -> bool {
        fuzzy_le(self.min_t, t) && fuzzy_le(t, self.max_t)
    }

    pub fn is_accelerating(&self) -> bool {
        matches!(self.curve, CurveSegment::Hyperbola(_))
    }

    pub fn x_at(&self, t: f64) -> f64 {
        match &self.curve {
            CurveSegment::Segment(s) => s.x_at(t),
            CurveSegment::Line(l) => l.x_at(t),
            CurveSegment::Hyperbola(h) => h.curve().t_to_x(t),
        }
    }

    pub fn event_at(&self, t: f64) -> Coordinate {
        Coordinate::new(self.x_at(t), t)
    }

    pub fn velocity_at(&self, t: f64) -> f64 {
        match &self.curve {
            CurveSegment::Segment(s) => s.velocity(),
            CurveSegment::Line(l) => l.velocity(),
            CurveSegment::Hyperbola(h) => h.curve().t_to_v(t),
        }
    }

    pub fn tau_at(&self, t: f64) -> f64 {
        match &self.curve {
            CurveSegment::Hyperbola(h) => {
                let c = h.curve();
                self.anchor_tau + c.t_to_tau(t) - c.t_to_tau(self.anchor_t)
            }
            _ => self.anchor_tau + (t - self.anchor_t) / gamma(self.velocity_at(t)),
        }
    }

    pub fn t_at_tau(&self, tau: f64) -> f64 {
        match &self.curve {
            CurveSegment::Hyperbola(h) => {
                let c = h.curve();
                c.tau_to_t(c.t_to_tau(self.anchor_t) + tau - self.anchor_tau)
            }
            _ => self.anchor_t + (tau - self.anchor_tau) * gamma(self.velocity_at(self.anchor_t)),
        }
    }

    /// Proper time at both ends (infinite for unbounded ends)
    pub fn tau_range(&self) -> (f64, f64) {
        (self.tau_at(self.min_t), self.tau_at(self.max_t))
    }

    /// The visible piece, honouring this segment's own t range
    pub fn intersect(&self, bounds: &Bounds) -> Option<CurveSegment> {
        let t0 = bounds.min().t.max(self.min_t);
        let t1 = bounds.max().t.min(self.max_t);
        if fuzzy_lt(t1, t0) {
            return None;
        }
        let slab = Bounds::from_extents(bounds.min().x, t0, bounds.max().x, t1.max(t0));
        self.curve.intersect(&slab)
    }

    /// Restrict to `[min_t, max_t]`; `None` when nothing of positive length
    /// remains
    pub fn clamp(&self, min_t: f64, max_t: f64) -> Option<WorldlineSegment> {
        let lo = self.min_t.max(min_t);
        let hi = self.max_t.min(max_t);
        if !fuzzy_lt(lo, hi) {
            return None;
        }
        let curve = match &self.curve {
            CurveSegment::Hyperbola(h) => {
                CurveSegment::Hyperbola(HyperbolicSegment::new(*h.curve(), lo, hi))
            }
            CurveSegment::Segment(_) | CurveSegment::Line(_) if lo.is_finite() && hi.is_finite() => {
                CurveSegment::Segment(LineSegment::new(self.event_at(lo), self.event_at(hi)))
            }
            other => *other,
        };
        Some(WorldlineSegment {
            curve,
            min_t: lo,
            max_t: hi,
            ..*self
        })
    }

    pub fn relative_to(&self, frame: &Frame) -> WorldlineSegment {
        let boost_t = |t: f64| {
            if t.is_finite() {
                frame.to_frame(self.event_at(t)).t
            } else {
                t
            }
        };
        WorldlineSegment {
            curve: self.curve.relative_to(frame),
            min_t: boost_t(self.min_t),
            max_t: boost_t(self.max_t),
            anchor_t: boost_t(self.anchor_t),
            anchor_tau: self.anchor_tau,
        }
    }
}

/// What an observer does during one leg of its journey
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    /// Switch instantly to `velocity`, then coast
    Coast { velocity: f64 },
    /// Constant proper acceleration
    Accelerate { acceleration: f64 },
}

/// How long a leg lasts
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Duration {
    ProperTime(f64),
    CoordinateTime(f64),
    /// Only allowed on the final leg
    Unbounded,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leg {
    pub motion: Motion,
    pub duration: Duration,
}

/// A worldline: ordered segments covering increasing coordinate time
#[derive(Clone, Debug, PartialEq)]
pub struct Observer {
    segments: Vec<WorldlineSegment>,
}

fn observer_error(property: &str, reason: impl Into<String>) -> ExecutionErrorKind {
    ExecutionErrorKind::OutOfRange {
        command: "observer",
        property: property.to_string(),
        reason: reason.into(),
    }
}

impl Observer {
    /// Constant velocity forever, passing `start` at proper time `tau`
    pub fn inertial(start: Coordinate, velocity: f64, tau: f64) -> Result<Observer, ExecutionErrorKind> {
        Observer::new(start, velocity, tau, &[])
    }

    /// Coast at `velocity` until `start`, fly each leg in turn, then coast at
    /// the final velocity unless the last leg is unbounded
    pub fn new(
        start: Coordinate,
        velocity: f64,
        tau: f64,
        legs: &[Leg],
    ) -> Result<Observer, ExecutionErrorKind> {
        if !start.is_finite() {
            return Err(observer_error("start", "must be a finite event"));
        }
        if !tau.is_finite() {
            return Err(observer_error("tau", "must be finite"));
        }
        if !is_subluminal(velocity) {
            return Err(ExecutionErrorKind::Superluminal { velocity });
        }

        let mut segments = vec![WorldlineSegment::coasting(
            start,
            velocity,
            tau,
            f64::NEG_INFINITY,
            start.t,
        )];
        let mut here = start;
        let mut v = velocity;
        let mut tau = tau;
        let mut open_ended = false;

        for (i, leg) in legs.iter().enumerate() {
            let valid = match leg.duration {
                Duration::Unbounded => i + 1 == legs.len(),
                Duration::ProperTime(d) | Duration::CoordinateTime(d) => d.is_finite() && d >= 0.0,
            };
            if !valid {
                let reason = if leg.duration == Duration::Unbounded {
                    "only the last segment may omit its duration"
                } else {
                    "durations must be finite and not negative"
                };
                return Err(observer_error("segments", reason));
            }

            let accel = match leg.motion {
                Motion::Coast { velocity } => {
                    if !is_subluminal(velocity) {
                        return Err(ExecutionErrorKind::Superluminal { velocity });
                    }
                    v = velocity;
                    None
                }
                Motion::Accelerate { acceleration } if !acceleration.is_finite() => {
                    return Err(observer_error("segments", "acceleration must be finite"));
                }
                Motion::Accelerate { acceleration } if fuzzy_zero(acceleration) => None,
                Motion::Accelerate { acceleration } => Some(acceleration),
            };

            match accel {
                None => {
                    let dt = match leg.duration {
                        Duration::ProperTime(d) => d * gamma(v),
                        Duration::CoordinateTime(d) => d,
                        Duration::Unbounded => f64::INFINITY,
                    };
                    if fuzzy_zero(dt) {
                        continue;
                    }
                    segments.push(WorldlineSegment::coasting(here, v, tau, here.t, here.t + dt));
                    if dt.is_infinite() {
                        open_ended = true;
                        break;
                    }
                    tau += dt / gamma(v);
                    here = Coordinate::new(here.x + v * dt, here.t + dt);
                }
                Some(a) => {
                    let curve = OffsetAcceleration::through(here, v, a);
                    let end_t = match leg.duration {
                        Duration::ProperTime(d) => curve.tau_to_t(curve.t_to_tau(here.t) + d),
                        Duration::CoordinateTime(d) => here.t + d,
                        Duration::Unbounded => f64::INFINITY,
                    };
                    if fuzzy_le(end_t, here.t) {
                        continue;
                    }
                    segments.push(WorldlineSegment::accelerating(curve, here.t, tau, here.t, end_t));
                    if end_t.is_infinite() {
                        open_ended = true;
                        break;
                    }
                    tau += curve.t_to_tau(end_t) - curve.t_to_tau(here.t);
                    v = curve.t_to_v(end_t);
                    here = curve.event_at(end_t);
                }
            }
        }

        if !open_ended {
            segments.push(WorldlineSegment::coasting(here, v, tau, here.t, f64::INFINITY));
        }
        Ok(Observer { segments })
    }

    /// Bound the worldline in coordinate time (an interval observer)
    pub fn with_interval(self, min_t: f64, max_t: f64) -> Result<Observer, ExecutionErrorKind> {
        if min_t.is_nan() || max_t.is_nan() || !fuzzy_lt(min_t, max_t) {
            return Err(observer_error("min_t", "must be earlier than max_t"));
        }
        let segments: Vec<_> = self
            .segments
            .iter()
            .filter_map(|s| s.clamp(min_t, max_t))
            .collect();
        if segments.is_empty() {
            return Err(observer_error("min_t", "interval leaves nothing of the worldline"));
        }
        Ok(Observer { segments })
    }

    pub fn segments(&self) -> &[WorldlineSegment] {
        &self.segments
    }

    pub fn min_t(&self) -> f64 {
        self.segments.first().map_or(f64::NAN, |s| s.min_t())
    }

    pub fn max_t(&self) -> f64 {
        self.segments.last().map_or(f64::NAN, |s| s.max_t())
    }

    /// Finite end events of an interval observer
    pub fn endpoints(&self) -> (Option<Coordinate>, Option<Coordinate>) {
        let at = |t: f64| t.is_finite().then(|| self.event_at(t));
        (at(self.min_t()), at(self.max_t()))
    }

    fn segment_at(&self, t: f64) -> Option<&WorldlineSegment> {
        self.segments.iter().find(|s| s.contains_t(t))
    }

    fn segment_at_tau(&self, tau: f64) -> Option<&WorldlineSegment> {
        self.segments.iter().find(|s| {
            let (lo, hi) = s.tau_range();
            fuzzy_le(lo, tau) && fuzzy_le(tau, hi)
        })
    }

    /// Position at coordinate time `t`; NaN outside the worldline
    pub fn x_at(&self, t: f64) -> f64 {
        self.segment_at(t).map_or(f64::NAN, |s| s.x_at(t))
    }

    pub fn event_at(&self, t: f64) -> Coordinate {
        Coordinate::new(self.x_at(t), t)
    }

    pub fn velocity_at(&self, t: f64) -> f64 {
        self.segment_at(t).map_or(f64::NAN, |s| s.velocity_at(t))
    }

    pub fn tau_at(&self, t: f64) -> f64 {
        self.segment_at(t).map_or(f64::NAN, |s| s.tau_at(t))
    }

    pub fn t_at_tau(&self, tau: f64) -> f64 {
        self.segment_at_tau(tau).map_or(f64::NAN, |s| s.t_at_tau(tau))
    }

    pub fn event_at_tau(&self, tau: f64) -> Coordinate {
        match self.segment_at_tau(tau) {
            Some(s) => s.event_at(s.t_at_tau(tau)),
            None => Coordinate::new(f64::NAN, f64::NAN),
        }
    }

    pub fn velocity_at_tau(&self, tau: f64) -> f64 {
        self.segment_at_tau(tau)
            .map_or(f64::NAN, |s| s.velocity_at(s.t_at_tau(tau)))
    }

    /// The observer's instantaneous rest frame at proper time `tau`, with its
    /// origin on the worldline there
    pub fn frame_at_tau(&self, tau: f64) -> Result<Frame, ExecutionErrorKind> {
        let event = self.event_at_tau(tau);
        if !event.is_finite() {
            return Err(observer_error("tau", format!("{tau} is not on the worldline")));
        }
        Frame::new(self.velocity_at_tau(tau), event)
    }

    /// Visible pieces of the worldline, in order
    pub fn intersect(&self, bounds: &Bounds) -> Vec<CurveSegment> {
        self.segments
            .iter()
            .filter_map(|s| s.intersect(bounds))
            .collect()
    }

    pub fn relative_to(&self, frame: &Frame) -> Observer {
        Observer {
            segments: self.segments.iter().map(|s| s.relative_to(frame)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rocket() -> Observer {
        // Rest at origin, accelerate at 1 for τ = 1, coast 2 units of τ, stop
        Observer::new(
            Coordinate::ORIGIN,
            0.0,
            0.0,
            &[
                Leg {
                    motion: Motion::Accelerate { acceleration: 1.0 },
                    duration: Duration::ProperTime(1.0),
                },
                Leg {
                    motion: Motion::Coast { velocity: 1f64.tanh() },
                    duration: Duration::ProperTime(2.0),
                },
                Leg {
                    motion: Motion::Coast { velocity: 0.0 },
                    duration: Duration::Unbounded,
                },
            ],
        )
        .unwrap()
    }

    // ===== Inertial observer tests =====

    #[test]
    fn inertial_observer_queries() {
        let obs = Observer::inertial(Coordinate::new(1.0, 0.0), 0.6, 0.0).unwrap();
        assert!(close(obs.x_at(5.0), 4.0));
        assert!(close(obs.velocity_at(-3.0), 0.6));
        assert!(close(obs.tau_at(5.0), 4.0));
        assert!(close(obs.tau_at(-5.0), -4.0));
        assert!(close(obs.t_at_tau(4.0), 5.0));
        let e = obs.event_at_tau(8.0);
        assert!(close(e.x, 7.0) && close(e.t, 10.0));
    }

    #[test]
    fn superluminal_observer_is_rejected() {
        assert_eq!(
            Observer::inertial(Coordinate::ORIGIN, 1.0, 0.0),
            Err(ExecutionErrorKind::Superluminal { velocity: 1.0 })
        );
    }

    #[test]
    fn frame_at_tau_is_comoving() {
        let obs = Observer::inertial(Coordinate::ORIGIN, 0.5, 0.0).unwrap();
        let frame = obs.frame_at_tau(2.0).unwrap();
        assert!(close(frame.velocity(), 0.5));
        let later = frame.to_frame(obs.event_at_tau(3.0));
        assert!(fuzzy_zero(later.x) && close(later.t, 1.0));
    }

    // ===== Accelerated observer tests =====

    #[test]
    fn acceleration_leg_reaches_expected_velocity() {
        let obs = rocket();
        assert_eq!(obs.segments().len(), 4);
        assert!(obs.segments()[1].is_accelerating());
        let t_end = 1f64.sinh();
        assert!(close(obs.velocity_at(t_end), 1f64.tanh()));
        assert!(close(obs.x_at(t_end), 1f64.cosh() - 1.0));
        assert!(close(obs.tau_at(t_end), 1.0));
    }

    #[test]
    fn proper_time_is_continuous_across_segments() {
        let obs = rocket();
        for pair in obs.segments().windows(2) {
            let t = pair[0].max_t();
            assert!(close(pair[0].tau_at(t), pair[1].tau_at(t)));
            assert!(close(pair[0].x_at(t), pair[1].x_at(t)));
        }
        assert!(close(obs.velocity_at_tau(3.5), 0.0));
        assert!(close(obs.t_at_tau(obs.tau_at(7.0)), 7.0));
    }

    #[test]
    fn unbounded_leg_must_be_last() {
        let err = Observer::new(
            Coordinate::ORIGIN,
            0.0,
            0.0,
            &[
                Leg {
                    motion: Motion::Coast { velocity: 0.2 },
                    duration: Duration::Unbounded,
                },
                Leg {
                    motion: Motion::Coast { velocity: 0.0 },
                    duration: Duration::CoordinateTime(1.0),
                },
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("only the last segment"));
    }

    #[test]
    fn open_ended_acceleration() {
        let obs = Observer::new(
            Coordinate::ORIGIN,
            0.0,
            0.0,
            &[Leg {
                motion: Motion::Accelerate { acceleration: 0.5 },
                duration: Duration::Unbounded,
            }],
        )
        .unwrap();
        assert_eq!(obs.segments().len(), 2);
        assert_eq!(obs.max_t(), f64::INFINITY);
        assert!(obs.velocity_at(100.0) > 0.99);
    }

    // ===== Interval and frame tests =====

    #[test]
    fn interval_observer_has_endpoints() {
        let obs = Observer::inertial(Coordinate::ORIGIN, 0.0, 0.0)
            .unwrap()
            .with_interval(-1.0, 2.0)
            .unwrap();
        let (start, end) = obs.endpoints();
        assert!(start.unwrap().fuzzy_eq(Coordinate::new(0.0, -1.0)));
        assert!(end.unwrap().fuzzy_eq(Coordinate::new(0.0, 2.0)));
        assert!(obs.x_at(3.0).is_nan());
        assert!(obs
            .segments()
            .iter()
            .all(|s| matches!(s.curve(), CurveSegment::Segment(_))));
    }

    #[test]
    fn empty_interval_is_an_error() {
        let obs = Observer::inertial(Coordinate::ORIGIN, 0.0, 0.0).unwrap();
        assert!(obs.clone().with_interval(2.0, 1.0).is_err());
        assert!(obs.with_interval(1.0, 1.0).is_err());
    }

    #[test]
    fn worldline_clipped_to_view() {
        let obs = rocket();
        let pieces = obs.intersect(&Bounds::from_extents(-10.0, -1.0, 10.0, 3.0));
        assert_eq!(pieces.len(), 3);
        assert!(matches!(pieces[1], CurveSegment::Hyperbola(_)));
    }

    #[test]
    fn relative_to_own_frame_is_at_rest() {
        let obs = Observer::inertial(Coordinate::new(2.0, 1.0), -0.4, 0.0).unwrap();
        let frame = obs.frame_at_tau(0.0).unwrap();
        let seen = obs.relative_to(&frame);
        assert!(fuzzy_zero(seen.velocity_at(10.0)));
        assert!(fuzzy_zero(seen.x_at(-4.0)));
        assert!(close(seen.tau_at(3.0), 3.0));
    }
}
