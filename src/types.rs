//! Value types shared by the geometry kernel and the engines.
//!
//! Spacetime coordinates are `(x, t)` pairs with the speed of light
//! normalized to 1. They are plain copyable values; arithmetic produces new
//! values rather than mutating in place.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use glam::{DAffine2, DVec2, dvec2};

use crate::relativity::{fuzzy_ge, fuzzy_gt, fuzzy_le};

/// An event in spacetime: position `x` and coordinate time `t`
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub t: f64,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0.0, t: 0.0 };

    pub const fn new(x: f64, t: f64) -> Self {
        Coordinate { x, t }
    }

    /// Both components finite (NaN or infinite coordinates are never drawn)
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.t.is_finite()
    }

    /// Drawing-plane vector: x to the right, t up
    #[inline]
    pub fn to_vec(self) -> DVec2 {
        dvec2(self.x, self.t)
    }

    /// Euclidean length in the drawing plane (not the spacetime interval)
    pub fn length(self) -> f64 {
        self.x.hypot(self.t)
    }

    /// The invariant interval `x² - t²` measured from the origin
    pub fn interval(self) -> f64 {
        self.x * self.x - self.t * self.t
    }

    /// Component-wise fuzzy equality
    pub fn fuzzy_eq(self, other: Coordinate) -> bool {
        crate::relativity::fuzzy_eq(self.x, other.x) && crate::relativity::fuzzy_eq(self.t, other.t)
    }
}

impl From<DVec2> for Coordinate {
    fn from(v: DVec2) -> Self {
        Coordinate { x: v.x, t: v.y }
    }
}

impl From<Coordinate> for DVec2 {
    fn from(c: Coordinate) -> Self {
        c.to_vec()
    }
}

impl Add for Coordinate {
    type Output = Coordinate;
    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.t + rhs.t)
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;
    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.t - rhs.t)
    }
}

impl Mul<f64> for Coordinate {
    type Output = Coordinate;
    fn mul(self, rhs: f64) -> Coordinate {
        Coordinate::new(self.x * rhs, self.t * rhs)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;
    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.t)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.t)
    }
}

/// Axis-aligned rectangle in spacetime.
///
/// `min.x <= max.x` and `min.t <= max.t` always hold; the constructor orders
/// its inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    min: Coordinate,
    max: Coordinate,
}

impl Bounds {
    /// Create bounds from two opposite corners, in any order
    pub fn new(a: Coordinate, b: Coordinate) -> Self {
        Bounds {
            min: Coordinate::new(a.x.min(b.x), a.t.min(b.t)),
            max: Coordinate::new(a.x.max(b.x), a.t.max(b.t)),
        }
    }

    pub fn from_extents(x0: f64, t0: f64, x1: f64, t1: f64) -> Self {
        Self::new(Coordinate::new(x0, t0), Coordinate::new(x1, t1))
    }

    /// Smallest bounds containing every point; `None` for an empty slice
    pub fn enclosing(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Bounds::new(*first, *first);
        for p in rest {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.t = bounds.min.t.min(p.t);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.t = bounds.max.t.max(p.t);
        }
        Some(bounds)
    }

    pub fn min(&self) -> Coordinate {
        self.min
    }

    pub fn max(&self) -> Coordinate {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.t - self.min.t
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.t + self.max.t) / 2.0,
        )
    }

    /// The four corners, counter-clockwise from `min`
    pub fn corners(&self) -> [Coordinate; 4] {
        [
            self.min,
            Coordinate::new(self.max.x, self.min.t),
            self.max,
            Coordinate::new(self.min.x, self.max.t),
        ]
    }

    /// Overlap of two bounds, `None` when they are disjoint.
    ///
    /// Bounds that merely touch produce a degenerate (zero-width) result.
    pub fn intersect(&self, other: &Bounds) -> Option<Bounds> {
        let min = Coordinate::new(self.min.x.max(other.min.x), self.min.t.max(other.min.t));
        let max = Coordinate::new(self.max.x.min(other.max.x), self.max.t.min(other.max.t));
        if fuzzy_gt(min.x, max.x) || fuzzy_gt(min.t, max.t) {
            return None;
        }
        // Fuzzy touch may leave min a hair above max
        Some(Bounds::new(min, max))
    }

    /// Apply an affine map and return the axis-aligned envelope of the result
    pub fn transform(&self, affine: &DAffine2) -> Bounds {
        let corners = self
            .corners()
            .map(|c| Coordinate::from(affine.transform_point2(c.to_vec())));
        // Four corners always present
        let mut out = Bounds::new(corners[0], corners[0]);
        for c in &corners[1..] {
            out.min.x = out.min.x.min(c.x);
            out.min.t = out.min.t.min(c.t);
            out.max.x = out.max.x.max(c.x);
            out.max.t = out.max.t.max(c.t);
        }
        out
    }

    /// Point containment, inclusive and fuzzy on the edges
    pub fn contains(&self, c: Coordinate) -> bool {
        fuzzy_ge(c.x, self.min.x)
            && fuzzy_le(c.x, self.max.x)
            && fuzzy_ge(c.t, self.min.t)
            && fuzzy_le(c.t, self.max.t)
    }

    /// Whether `other` lies entirely inside these bounds
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: f64) -> Bounds {
        Bounds::new(
            Coordinate::new(self.min.x - margin, self.min.t - margin),
            Coordinate::new(self.max.x + margin, self.max.t + margin),
        )
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

/// An RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Same color with a new alpha (0.0 ..= 1.0)
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color { a, ..self }
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "rgb({},{},{})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x0: f64, t0: f64, x1: f64, t1: f64) -> Bounds {
        Bounds::from_extents(x0, t0, x1, t1)
    }

    // ==================== Coordinate tests ====================

    #[test]
    fn coordinate_arithmetic() {
        let a = Coordinate::new(3.0, 2.0);
        let c = Coordinate::new(1.0, 5.0);
        assert_eq!(a + c, Coordinate::new(4.0, 7.0));
        assert_eq!(a - c, Coordinate::new(2.0, -3.0));
        assert_eq!(a * 2.0, Coordinate::new(6.0, 4.0));
        assert_eq!(-a, Coordinate::new(-3.0, -2.0));
    }

    #[test]
    fn coordinate_interval_is_signed() {
        assert_eq!(Coordinate::new(3.0, 2.0).interval(), 5.0);
        assert_eq!(Coordinate::new(1.0, 2.0).interval(), -3.0);
    }

    #[test]
    fn coordinate_finiteness() {
        assert!(Coordinate::new(1.0, 2.0).is_finite());
        assert!(!Coordinate::new(f64::NAN, 2.0).is_finite());
        assert!(!Coordinate::new(1.0, f64::INFINITY).is_finite());
    }

    // ==================== Bounds tests ====================

    #[test]
    fn bounds_orders_corners() {
        let bounds = b(5.0, -1.0, -2.0, 4.0);
        assert_eq!(bounds.min(), Coordinate::new(-2.0, -1.0));
        assert_eq!(bounds.max(), Coordinate::new(5.0, 4.0));
        assert_eq!(bounds.width(), 7.0);
        assert_eq!(bounds.height(), 5.0);
    }

    #[test]
    fn bounds_intersect_is_commutative_and_contained() {
        let cases = [
            (b(0.0, 0.0, 4.0, 4.0), b(2.0, 1.0, 6.0, 3.0)),
            (b(-3.0, -3.0, 3.0, 3.0), b(-1.0, -1.0, 1.0, 1.0)),
            (b(0.0, 0.0, 1.0, 1.0), b(1.0, 0.0, 2.0, 1.0)),
            (b(0.0, 0.0, 1.0, 1.0), b(-5.0, 0.5, 5.0, 0.75)),
        ];
        for (left, right) in cases {
            let ab = left.intersect(&right);
            let ba = right.intersect(&left);
            assert_eq!(ab, ba, "intersection of {left} and {right} should commute");
            let overlap = ab.expect("cases overlap");
            assert!(left.contains_bounds(&overlap));
            assert!(right.contains_bounds(&overlap));
        }
    }

    #[test]
    fn bounds_intersect_disjoint_is_none() {
        assert_eq!(b(0.0, 0.0, 1.0, 1.0).intersect(&b(2.0, 0.0, 3.0, 1.0)), None);
        assert_eq!(b(0.0, 0.0, 1.0, 1.0).intersect(&b(0.0, 2.0, 1.0, 3.0)), None);
    }

    #[test]
    fn bounds_touching_within_epsilon_overlap() {
        let left = b(0.0, 0.0, 1.0, 1.0);
        let right = b(1.0 + 1e-13, 0.0, 2.0, 1.0);
        assert!(left.intersect(&right).is_some());
    }

    #[test]
    fn bounds_transform_envelope_of_rotation() {
        let square = b(-1.0, -1.0, 1.0, 1.0);
        let rotated = square.transform(&DAffine2::from_angle(std::f64::consts::FRAC_PI_4));
        let half_diag = std::f64::consts::SQRT_2;
        assert!((rotated.max().x - half_diag).abs() < 1e-12);
        assert!((rotated.min().t + half_diag).abs() < 1e-12);
    }

    #[test]
    fn bounds_contains_edges() {
        let bounds = b(0.0, 0.0, 1.0, 1.0);
        assert!(bounds.contains(Coordinate::new(1.0, 0.5)));
        assert!(bounds.contains(Coordinate::new(1.0 + 1e-13, 0.5)));
        assert!(!bounds.contains(Coordinate::new(1.1, 0.5)));
        assert!(!bounds.contains(Coordinate::new(f64::NAN, 0.5)));
    }

    #[test]
    fn bounds_enclosing_points() {
        let pts = [
            Coordinate::new(1.0, 5.0),
            Coordinate::new(-2.0, 3.0),
            Coordinate::new(0.0, -1.0),
        ];
        let bounds = Bounds::enclosing(&pts).unwrap();
        assert_eq!(bounds, b(-2.0, -1.0, 1.0, 5.0));
        assert_eq!(Bounds::enclosing(&[]), None);
    }

    // ==================== Color tests ====================

    #[test]
    fn color_display() {
        assert_eq!(Color::rgb(255, 0, 0).to_string(), "rgb(255,0,0)");
        assert_eq!(Color::BLACK.with_alpha(0.5).to_string(), "rgba(0,0,0,128)");
    }
}
