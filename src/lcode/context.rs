//! Viewport state and the derived drawing context

use glam::{DAffine2, DVec2, dvec2};

use super::defaults;
use crate::errors::ProgrammingError;
use crate::geometry::{ConcreteLine, LineSegment};
use crate::log::debug;
use crate::types::{Bounds, Coordinate};

/// Pixels a point may sit past the screen edge and still count as visible
const SCREEN_SLACK: f64 = 1e-6;

/// What the host shows: pixel size, zoom, the world point at the center of
/// the screen and a rotation of the drawing plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Pixels per spacetime unit
    pub scale: f64,
    pub center: Coordinate,
    /// Radians, counter-clockwise
    pub rotation: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            scale: defaults::SCALE,
            center: Coordinate::ORIGIN,
            rotation: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_scale(self, scale: f64) -> Self {
        Viewport { scale, ..self }
    }

    pub fn with_center(self, center: Coordinate) -> Self {
        Viewport { center, ..self }
    }

    pub fn with_rotation(self, rotation: f64) -> Self {
        Viewport { rotation, ..self }
    }

    /// Drag the picture by a pixel offset (screen y grows downwards)
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let delta = DAffine2::from_angle(-self.rotation)
            .transform_vector2(dvec2(dx / self.scale, -dy / self.scale));
        self.center = self.center - Coordinate::from(delta);
    }

    pub fn zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Zoom while keeping the world point under `screen` fixed
    pub fn zoom_about(&mut self, factor: f64, screen: DVec2) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let Ok(ctx) = Context::new(self) else {
            return;
        };
        let anchor = ctx.to_world(screen);
        self.scale *= factor;
        self.center = anchor - (anchor - self.center) * (1.0 / factor);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn rotate(&mut self, delta: f64) {
        self.rotation += delta;
    }
}

/// Cached world ↔ screen mapping for one viewport state
#[derive(Clone, Debug, PartialEq)]
pub struct Context {
    transform: DAffine2,
    inverse: DAffine2,
    scale: f64,
    inv_scale: f64,
    /// World-space envelope of the screen
    bounds: Bounds,
    screen: Bounds,
}

impl Context {
    pub fn new(viewport: &Viewport) -> Result<Context, ProgrammingError> {
        let Viewport {
            width,
            height,
            scale,
            center,
            rotation,
        } = *viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ProgrammingError::new(format!(
                "viewport size {width}x{height} is not drawable"
            )));
        }

        let transform = DAffine2::from_translation(dvec2(width / 2.0, height / 2.0))
            * DAffine2::from_scale(dvec2(scale, -scale))
            * DAffine2::from_angle(rotation)
            * DAffine2::from_translation(-center.to_vec());
        let det = transform.matrix2.determinant();
        if !det.is_finite() || det == 0.0 || !transform.translation.is_finite() {
            return Err(ProgrammingError::new(format!(
                "viewport transform is not invertible (scale {scale}, rotation {rotation})"
            )));
        }
        let inverse = transform.inverse();
        let screen = Bounds::from_extents(0.0, 0.0, width, height);
        let bounds = screen.transform(&inverse);
        debug!(%bounds, scale, "viewport context");

        Ok(Context {
            transform,
            inverse,
            scale,
            inv_scale: 1.0 / scale,
            bounds,
            screen,
        })
    }

    pub fn transform(&self) -> &DAffine2 {
        &self.transform
    }

    pub fn inverse(&self) -> &DAffine2 {
        &self.inverse
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// World units per pixel
    pub fn inv_scale(&self) -> f64 {
        self.inv_scale
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn screen(&self) -> &Bounds {
        &self.screen
    }

    pub fn to_screen(&self, c: Coordinate) -> DVec2 {
        self.transform.transform_point2(c.to_vec())
    }

    pub fn to_world(&self, p: DVec2) -> Coordinate {
        self.inverse.transform_point2(p).into()
    }

    /// Whether a world point lands on the screen
    pub fn is_visible(&self, c: Coordinate) -> bool {
        let p = self.to_screen(c);
        p.is_finite() && self.screen.expand(SCREEN_SLACK).contains(p.into())
    }

    /// The part of `segment` that is on screen, in world coordinates.
    ///
    /// [`Context::bounds`] is only the envelope of a rotated screen, so the
    /// exact clip is done in screen space and mapped back.
    pub fn clip_segment(&self, segment: &LineSegment) -> Option<LineSegment> {
        if !(segment.start().is_finite() && segment.end().is_finite()) {
            return None;
        }
        let on_screen = segment.clip_to_screen(&self.transform, &self.screen)?;
        Some(on_screen.transform(&self.inverse))
    }

    /// The part of an infinite line that is on screen
    pub fn clip_line(&self, line: &ConcreteLine) -> Option<LineSegment> {
        if !(line.anchor().is_finite() && line.angle().is_finite()) {
            return None;
        }
        self.clip_segment(&line.intersect(&self.bounds)?)
    }

    /// Screen direction (unit vector) of a world-space direction
    pub fn screen_direction(&self, d: Coordinate) -> DVec2 {
        self.transform.transform_vector2(d.to_vec()).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn bounds_of_square_viewport() {
        let ctx = Context::new(&Viewport::new(500.0, 500.0).with_scale(5.0)).unwrap();
        assert_eq!(*ctx.bounds(), Bounds::from_extents(-50.0, -50.0, 50.0, 50.0));
        assert_eq!(ctx.inv_scale(), 0.2);
    }

    #[test]
    fn t_points_up_on_screen() {
        let ctx = Context::new(&Viewport::new(200.0, 100.0).with_scale(10.0)).unwrap();
        assert!(close(ctx.to_screen(Coordinate::ORIGIN), dvec2(100.0, 50.0)));
        assert!(close(ctx.to_screen(Coordinate::new(1.0, 1.0)), dvec2(110.0, 40.0)));
        let back = ctx.to_world(dvec2(110.0, 40.0));
        assert!(back.fuzzy_eq(Coordinate::new(1.0, 1.0)));
    }

    #[test]
    fn rotated_bounds_grow() {
        let plain = Context::new(&Viewport::new(400.0, 200.0)).unwrap();
        let turned = Context::new(&Viewport::new(400.0, 200.0).with_rotation(0.5)).unwrap();
        assert!(turned.bounds().contains_bounds(&plain.bounds().expand(-1e-9)));
    }

    #[test]
    fn rotated_clip_follows_the_screen_not_the_envelope() {
        let ctx = Context::new(&Viewport::new(400.0, 400.0).with_scale(10.0).with_rotation(0.3)).unwrap();
        let x_axis = ConcreteLine::new(Coordinate::ORIGIN, 0.0);
        let envelope = x_axis.intersect(ctx.bounds()).unwrap();
        let visible = ctx.clip_line(&x_axis).unwrap();
        assert!(visible.length() < envelope.length());
        assert!(!ctx.is_visible(envelope.start()));
        assert!(!ctx.is_visible(envelope.end()));
        for end in [visible.start(), visible.end()] {
            assert!(ctx.is_visible(end));
            let p = ctx.to_screen(end);
            let on_edge = [p.x, p.y, p.x - 400.0, p.y - 400.0].iter().any(|d| d.abs() < 1e-9);
            assert!(on_edge, "{p}");
        }
    }

    #[test]
    fn non_finite_geometry_is_never_visible() {
        let ctx = Context::new(&Viewport::new(100.0, 100.0)).unwrap();
        let nan = Coordinate::new(f64::NAN, 0.0);
        assert!(!ctx.is_visible(nan));
        assert!(ctx.clip_segment(&LineSegment::new(nan, Coordinate::ORIGIN)).is_none());
        assert!(ctx.clip_line(&ConcreteLine::new(nan, 0.5)).is_none());
    }

    #[test]
    fn degenerate_viewports_are_rejected() {
        assert!(Context::new(&Viewport::new(0.0, 100.0)).is_err());
        assert!(Context::new(&Viewport::new(100.0, 100.0).with_scale(0.0)).is_err());
        assert!(Context::new(&Viewport::new(100.0, 100.0).with_scale(f64::NAN)).is_err());
    }

    #[test]
    fn pan_moves_center_against_drag() {
        let mut vp = Viewport::new(100.0, 100.0).with_scale(10.0);
        vp.pan(20.0, 10.0);
        assert!(vp.center.fuzzy_eq(Coordinate::new(-2.0, 1.0)));
    }

    #[test]
    fn zoom_about_keeps_anchor() {
        let mut vp = Viewport::new(100.0, 100.0).with_scale(10.0);
        let p = dvec2(80.0, 30.0);
        let before = Context::new(&vp).unwrap().to_world(p);
        vp.zoom_about(2.0, p);
        let after = Context::new(&vp).unwrap().to_world(p);
        assert!(before.fuzzy_eq(after));
        assert_eq!(vp.scale, 20.0);
    }
}
