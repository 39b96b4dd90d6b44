//! Straight lines: frame-relative lines, concrete infinite lines and segments

use glam::DAffine2;

use super::clip_parametric;
use super::frame::Frame;
use crate::relativity::{fuzzy_zero, transform_angle};
use crate::types::{Bounds, Coordinate};

/// Which axis of a frame a line runs parallel to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    T,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::T => "t",
        }
    }
}

/// A line parallel to one axis of a frame: `t' = offset` for [`Axis::X`],
/// `x' = offset` for [`Axis::T`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    axis: Axis,
    frame: Frame,
    offset: f64,
}

impl Line {
    pub fn new(axis: Axis, frame: Frame, offset: f64) -> Self {
        Line {
            axis,
            frame,
            offset,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn angle(&self) -> f64 {
        match self.axis {
            Axis::X => self.frame.x_axis_angle(),
            Axis::T => self.frame.t_axis_angle(),
        }
    }

    /// Resolve into rest-frame anchor and angle
    pub fn concrete(&self) -> ConcreteLine {
        let (a, b) = match self.axis {
            Axis::X => (
                Coordinate::new(0.0, self.offset),
                Coordinate::new(1.0, self.offset),
            ),
            Axis::T => (
                Coordinate::new(self.offset, 0.0),
                Coordinate::new(self.offset, 1.0),
            ),
        };
        let anchor = self.frame.to_rest(a);
        let dir = self.frame.to_rest(b) - anchor;
        ConcreteLine::new(anchor, dir.t.atan2(dir.x))
    }

    pub fn relative_to(&self, base: &Frame) -> Line {
        Line {
            frame: self.frame.relative_to(base),
            ..*self
        }
    }
}

/// An infinite line through `anchor` at drawing-plane `angle`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConcreteLine {
    anchor: Coordinate,
    angle: f64,
}

impl ConcreteLine {
    pub fn new(anchor: Coordinate, angle: f64) -> Self {
        ConcreteLine { anchor, angle }
    }

    /// Line through two distinct points
    pub fn through(a: Coordinate, b: Coordinate) -> Option<Self> {
        let d = b - a;
        if fuzzy_zero(d.x) && fuzzy_zero(d.t) {
            return None;
        }
        Some(ConcreteLine::new(a, d.t.atan2(d.x)))
    }

    /// Worldline of something passing `anchor` at velocity `v`
    pub fn with_velocity(anchor: Coordinate, v: f64) -> Self {
        ConcreteLine::new(anchor, 1.0f64.atan2(v))
    }

    pub fn anchor(&self) -> Coordinate {
        self.anchor
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Unit direction vector
    pub fn direction(&self) -> Coordinate {
        let (sin, cos) = self.angle.sin_cos();
        Coordinate::new(cos, sin)
    }

    /// dx/dt; infinite for a line of constant t
    pub fn velocity(&self) -> f64 {
        let d = self.direction();
        if fuzzy_zero(d.t) {
            return f64::INFINITY.copysign(d.x);
        }
        d.x / d.t
    }

    pub fn point_at(&self, s: f64) -> Coordinate {
        self.anchor + self.direction() * s
    }

    /// x where the line crosses coordinate time `t`; NaN for a line of constant t
    pub fn x_at(&self, t: f64) -> f64 {
        let d = self.direction();
        if fuzzy_zero(d.t) {
            return f64::NAN;
        }
        self.anchor.x + d.x * (t - self.anchor.t) / d.t
    }

    /// The finite piece inside `bounds`
    pub fn intersect(&self, bounds: &Bounds) -> Option<LineSegment> {
        let d = self.direction();
        let (s0, s1) = clip_parametric(self.anchor, d, f64::NEG_INFINITY, f64::INFINITY, bounds)?;
        Some(LineSegment::new(self.point_at(s0), self.point_at(s1)))
    }

    pub fn relative_to(&self, frame: &Frame) -> ConcreteLine {
        ConcreteLine {
            anchor: frame.to_frame(self.anchor),
            angle: transform_angle(self.angle, frame.velocity()),
        }
    }
}

/// A finite straight segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    start: Coordinate,
    end: Coordinate,
}

impl LineSegment {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        LineSegment { start, end }
    }

    pub fn start(&self) -> Coordinate {
        self.start
    }

    pub fn end(&self) -> Coordinate {
        self.end
    }

    pub fn delta(&self) -> Coordinate {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    pub fn angle(&self) -> f64 {
        let d = self.delta();
        d.t.atan2(d.x)
    }

    pub fn is_degenerate(&self) -> bool {
        let d = self.delta();
        fuzzy_zero(d.x) && fuzzy_zero(d.t)
    }

    pub fn point_at(&self, s: f64) -> Coordinate {
        self.start + self.delta() * s
    }

    /// dx/dt along the segment
    pub fn velocity(&self) -> f64 {
        let d = self.delta();
        if fuzzy_zero(d.t) {
            return f64::INFINITY.copysign(d.x);
        }
        d.x / d.t
    }

    /// x at coordinate time `t` (extrapolating past the ends)
    pub fn x_at(&self, t: f64) -> f64 {
        let d = self.delta();
        if fuzzy_zero(d.t) {
            return f64::NAN;
        }
        self.start.x + d.x * (t - self.start.t) / d.t
    }

    /// Clip against `bounds`; handles axis-parallel segments without dividing
    /// by a zero direction component
    pub fn intersect(&self, bounds: &Bounds) -> Option<LineSegment> {
        let (s0, s1) = clip_parametric(self.start, self.delta(), 0.0, 1.0, bounds)?;
        Some(LineSegment::new(self.point_at(s0), self.point_at(s1)))
    }

    pub fn transform(&self, affine: &DAffine2) -> LineSegment {
        LineSegment::new(
            affine.transform_point2(self.start.to_vec()).into(),
            affine.transform_point2(self.end.to_vec()).into(),
        )
    }

    /// Map into screen space and clip to the (axis-aligned) screen rectangle.
    ///
    /// The world-space envelope of a rotated canvas is larger than what is
    /// actually visible, so the final clip happens after the transform.
    pub fn clip_to_screen(&self, to_screen: &DAffine2, screen: &Bounds) -> Option<LineSegment> {
        self.transform(to_screen).intersect(screen)
    }

    pub fn relative_to(&self, frame: &Frame) -> LineSegment {
        LineSegment::new(frame.to_frame(self.start), frame.to_frame(self.end))
    }
}
