//! Inertial reference frames

use std::fmt;

use crate::errors::ExecutionErrorKind;
use crate::relativity::{
    add_velocities, fuzzy_zero, inverse_lorentz_transform, is_subluminal, lorentz_transform,
    relative_velocity, velocity_to_angle,
};
use crate::types::Coordinate;

/// An inertial frame moving at `velocity` relative to the rest frame, whose
/// own origin sits at the rest-frame event `origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    velocity: f64,
    origin: Coordinate,
}

impl Default for Frame {
    fn default() -> Self {
        Frame::REST
    }
}

impl Frame {
    /// The base frame every script coordinate is written in
    pub const REST: Frame = Frame {
        velocity: 0.0,
        origin: Coordinate::ORIGIN,
    };

    /// Fails for `|velocity| >= 1`
    pub fn new(velocity: f64, origin: Coordinate) -> Result<Frame, ExecutionErrorKind> {
        if !is_subluminal(velocity) {
            return Err(ExecutionErrorKind::Superluminal { velocity });
        }
        Ok(Frame { velocity, origin })
    }

    /// A frame sharing the rest frame's origin
    pub fn boost(velocity: f64) -> Result<Frame, ExecutionErrorKind> {
        Frame::new(velocity, Coordinate::ORIGIN)
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn is_rest(&self) -> bool {
        fuzzy_zero(self.velocity) && self.origin.fuzzy_eq(Coordinate::ORIGIN)
    }

    /// Rest-frame coordinates → this frame's coordinates
    pub fn to_frame(&self, c: Coordinate) -> Coordinate {
        lorentz_transform(c - self.origin, self.velocity)
    }

    /// This frame's coordinates → rest-frame coordinates
    pub fn to_rest(&self, c: Coordinate) -> Coordinate {
        inverse_lorentz_transform(c, self.velocity) + self.origin
    }

    /// Rest-frame velocity → velocity measured in this frame
    pub fn velocity_to_frame(&self, u: f64) -> f64 {
        relative_velocity(u, self.velocity)
    }

    /// Velocity measured in this frame → rest-frame velocity
    pub fn velocity_to_rest(&self, u: f64) -> f64 {
        add_velocities(u, self.velocity)
    }

    /// Re-express this frame in the coordinates of `base`
    pub fn relative_to(&self, base: &Frame) -> Frame {
        Frame {
            velocity: base.velocity_to_frame(self.velocity),
            origin: base.to_frame(self.origin),
        }
    }

    /// Drawing-plane angle of this frame's x axis
    pub fn x_axis_angle(&self) -> f64 {
        velocity_to_angle(self.velocity)
    }

    /// Drawing-plane angle of this frame's t axis
    pub fn t_axis_angle(&self) -> f64 {
        std::f64::consts::FRAC_PI_2 - velocity_to_angle(self.velocity)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame(v={}, origin={})", self.velocity, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Coordinate, b: Coordinate) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.t - b.t).abs() < 1e-9
    }

    #[test]
    fn rejects_light_speed() {
        assert_eq!(
            Frame::boost(1.0),
            Err(ExecutionErrorKind::Superluminal { velocity: 1.0 })
        );
        assert!(Frame::boost(-1.5).is_err());
        assert!(Frame::boost(f64::NAN).is_err());
        assert!(Frame::boost(0.999).is_ok());
    }

    #[test]
    fn round_trip_through_frame() {
        let events = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 3.0),
            Coordinate::new(-4.0, 1.5),
        ];
        for v in [-0.9, -0.25, 0.0, 0.4, 0.95] {
            let frame = Frame::new(v, Coordinate::new(1.0, -2.0)).unwrap();
            for c in events {
                assert!(close(frame.to_frame(frame.to_rest(c)), c));
                assert!(close(frame.to_rest(frame.to_frame(c)), c));
            }
        }
    }

    #[test]
    fn origin_maps_to_zero() {
        let frame = Frame::new(0.5, Coordinate::new(3.0, 4.0)).unwrap();
        assert!(close(frame.to_frame(Coordinate::new(3.0, 4.0)), Coordinate::ORIGIN));
    }

    #[test]
    fn relative_to_composes_boosts() {
        let base = Frame::new(0.3, Coordinate::new(1.0, 1.0)).unwrap();
        let frame = Frame::new(-0.6, Coordinate::new(-2.0, 5.0)).unwrap();
        let rebased = frame.relative_to(&base);
        for c in [Coordinate::new(0.0, 0.0), Coordinate::new(4.0, -3.0)] {
            let direct = frame.to_frame(c);
            let via_base = rebased.to_frame(base.to_frame(c));
            assert!(close(direct, via_base), "{direct} vs {via_base}");
        }
    }

    #[test]
    fn rest_relative_to_itself() {
        let frame = Frame::new(0.7, Coordinate::new(2.0, 2.0)).unwrap();
        assert!(frame.relative_to(&frame).is_rest());
        assert!(Frame::REST.is_rest());
    }

    #[test]
    fn axis_angles_are_symmetric_about_light_cone() {
        let frame = Frame::boost(0.5).unwrap();
        let sum = frame.x_axis_angle() + frame.t_axis_angle();
        assert!((sum - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
