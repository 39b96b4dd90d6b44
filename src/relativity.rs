//! Closed-form special relativity.
//!
//! Units have `c = 1`, so velocities are fractions of light speed and must
//! satisfy `|v| < 1`. Everything here is a pure function. Out-of-domain input
//! produces NaN rather than an error; callers skip NaN geometry instead of
//! failing the whole draw.

use crate::types::Coordinate;

/// Tolerance for every geometric boundary decision
pub const EPSILON: f64 = 5e-12;

// ============================================================================
// Fuzzy comparisons
// ============================================================================

#[inline]
pub fn fuzzy_zero(a: f64) -> bool {
    a.abs() < EPSILON
}

#[inline]
pub fn fuzzy_eq(a: f64, b: f64) -> bool {
    // Equal infinities compare equal; the subtraction would give NaN
    a == b || (a - b).abs() < EPSILON
}

#[inline]
pub fn fuzzy_lt(a: f64, b: f64) -> bool {
    a < b && !fuzzy_eq(a, b)
}

#[inline]
pub fn fuzzy_le(a: f64, b: f64) -> bool {
    a < b || fuzzy_eq(a, b)
}

#[inline]
pub fn fuzzy_gt(a: f64, b: f64) -> bool {
    a > b && !fuzzy_eq(a, b)
}

#[inline]
pub fn fuzzy_ge(a: f64, b: f64) -> bool {
    a > b || fuzzy_eq(a, b)
}

// ============================================================================
// Inverse hyperbolic functions
// ============================================================================

/// Inverse hyperbolic sine; `asinh(-0.0)` is `-0.0`
pub fn asinh(x: f64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let ax = x.abs();
    (ax + ax.hypot(1.0)).ln().copysign(x)
}

/// Inverse hyperbolic cosine; NaN below 1
pub fn acosh(x: f64) -> f64 {
    if x < 1.0 || x.is_nan() {
        return f64::NAN;
    }
    (x + ((x - 1.0) * (x + 1.0)).sqrt()).ln()
}

/// Inverse hyperbolic tangent; `atanh(-0.0)` is `-0.0`, `atanh(±1)` is ±∞
pub fn atanh(x: f64) -> f64 {
    if x == 0.0 {
        return x;
    }
    if x.abs() > 1.0 || x.is_nan() {
        return f64::NAN;
    }
    0.5 * ((1.0 + x) / (1.0 - x)).ln()
}

// ============================================================================
// Velocities, rapidities, angles
// ============================================================================

/// Lorentz factor γ = 1/√(1 - v²); NaN for `|v| >= 1`
pub fn gamma(v: f64) -> f64 {
    if v.abs() >= 1.0 {
        return f64::NAN;
    }
    1.0 / (1.0 - v * v).sqrt()
}

/// Whether `v` is an admissible frame velocity
#[inline]
pub fn is_subluminal(v: f64) -> bool {
    v.is_finite() && v.abs() < 1.0
}

/// Drawing-plane angle of a boosted frame's x axis, measured from the rest
/// x axis. The boosted t axis sits at `π/2 - angle`.
pub fn velocity_to_angle(v: f64) -> f64 {
    v.atan()
}

/// Inverse of [`velocity_to_angle`]
pub fn angle_to_velocity(angle: f64) -> f64 {
    angle.tan()
}

/// Rapidity φ = atanh(v); rapidities add where velocities do not
pub fn velocity_to_rapidity(v: f64) -> f64 {
    atanh(v)
}

pub fn rapidity_to_velocity(phi: f64) -> f64 {
    phi.tanh()
}

/// Relativistic velocity addition: `u` observed in a frame moving at `v`
pub fn add_velocities(u: f64, v: f64) -> f64 {
    (u + v) / (1.0 + u * v)
}

/// Velocity `u` (rest frame) as seen from a frame moving at `v`
pub fn relative_velocity(u: f64, v: f64) -> f64 {
    (u - v) / (1.0 - u * v)
}

/// Direction angle (in the drawing plane) of a worldline or line after
/// boosting into a frame moving at `v`
pub fn transform_angle(angle: f64, v: f64) -> f64 {
    let (dt, dx) = angle.sin_cos();
    let d = lorentz_transform(Coordinate::new(dx, dt), v);
    d.t.atan2(d.x)
}

// ============================================================================
// Lengths and boosts
// ============================================================================

/// Length of a rest-frame object of proper length `len` measured by an
/// observer it moves past at `v`
pub fn length_contraction(len: f64, v: f64) -> f64 {
    len / gamma(v)
}

/// Proper length of an object measured as `len` while moving at `v`
pub fn inv_length_contraction(len: f64, v: f64) -> f64 {
    len * gamma(v)
}

/// Coordinate-time span of a proper-time interval `tau` at speed `v`
pub fn time_dilation(tau: f64, v: f64) -> f64 {
    tau * gamma(v)
}

/// Standard boost into a frame moving at `v`
pub fn lorentz_transform(c: Coordinate, v: f64) -> Coordinate {
    let g = gamma(v);
    Coordinate::new(g * (c.x - v * c.t), g * (c.t - v * c.x))
}

/// Inverse boost out of a frame moving at `v`
pub fn inverse_lorentz_transform(c: Coordinate, v: f64) -> Coordinate {
    lorentz_transform(c, -v)
}

/// Screen distance covered by one unit of a boosted axis: the calibration
/// hyperbola stretches boosted units by √((1+v²)/(1-v²))
pub fn axis_stretch(v: f64) -> f64 {
    ((1.0 + v * v) / (1.0 - v * v)).sqrt()
}
