//! Drawing of each command kind.
//!
//! Every drawable struct implements [`Draw`]; [`CommandStruct`] dispatches
//! to them through `enum_dispatch`. Geometry is clipped to the world bounds
//! of the [`Context`] before it is mapped to pixels.

use enum_dispatch::enum_dispatch;
use glam::{DVec2, dvec2};

use super::canvas::{Canvas, TextAnchor, TextStyle};
use super::context::Context;
use super::defaults;
use super::structs::{
    AxesStruct, EventStruct, GridStruct, HypergridStruct, LabelStruct, LineShape, LineStruct, PathStruct,
    WorldlineStruct,
};
use super::style::StyleStruct;
use crate::geometry::{Axis, CurveSegment, Frame, HyperbolicSegment, Line, LineSegment, OffsetAcceleration};
use crate::log::debug;
use crate::relativity::axis_stretch;
use crate::types::{Bounds, Coordinate};

/// Slack used when deciding whether a tick sits inside the visible range
const TICK_SLACK: f64 = 1e-9;

#[enum_dispatch]
pub trait Draw {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas);

    /// Re-express the command in `frame`'s coordinates
    fn rebase(&mut self, frame: &Frame);
}

#[enum_dispatch(Draw)]
#[derive(Clone, Debug, PartialEq)]
pub enum CommandStruct {
    Axes(AxesStruct),
    Grid(GridStruct),
    Hypergrid(HypergridStruct),
    Event(EventStruct),
    Line(LineStruct),
    Worldline(WorldlineStruct),
    Path(PathStruct),
    Label(LabelStruct),
}

// ============================================================================
// Tick helpers
// ============================================================================

/// Round tick spacing (a power of ten) for an axis of a frame moving at
/// `velocity`, aiming for about [`defaults::IDEAL_TICK_PIXELS`] between ticks
pub fn tick_spacing(inv_scale: f64, velocity: f64) -> f64 {
    let ideal = defaults::IDEAL_TICK_PIXELS * inv_scale / axis_stretch(velocity);
    10f64.powi(ideal.log10().round() as i32)
}

/// Label every nth tick, given the ratio of label width to tick distance
pub fn label_skip(ratio: f64) -> usize {
    defaults::LABEL_SKIP_THRESHOLDS
        .iter()
        .find(|(threshold, _)| ratio > *threshold)
        .map_or(1, |(_, skip)| *skip)
}

/// Tick label text with as many decimals as the spacing needs
pub fn format_tick(value: f64, spacing: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let decimals = if spacing >= 1.0 {
        0
    } else {
        (-spacing.log10()).round().max(0.0) as usize
    };
    format!("{value:.decimals$}")
}

/// One tick on an axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Frame coordinate along the axis
    pub value: f64,
    /// Rest-frame event
    pub location: Coordinate,
    pub labeled: bool,
}

/// Frame coordinate range covered by the corners of `bounds`
fn frame_extent(frame: &Frame, bounds: &Bounds) -> (Coordinate, Coordinate) {
    let mut lo = Coordinate::new(f64::INFINITY, f64::INFINITY);
    let mut hi = Coordinate::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for corner in bounds.corners() {
        let c = frame.to_frame(corner);
        lo = Coordinate::new(lo.x.min(c.x), lo.t.min(c.t));
        hi = Coordinate::new(hi.x.max(c.x), hi.t.max(c.t));
    }
    (lo, hi)
}

/// Integer multiples of `spacing` inside `[lo, hi]`, or `None` if there
/// are more than `limit`
fn multiples(lo: f64, hi: f64, spacing: f64, limit: usize) -> Option<std::ops::RangeInclusive<i64>> {
    if !(spacing.is_finite() && spacing > 0.0 && lo.is_finite() && hi.is_finite()) {
        return None;
    }
    let first = (lo / spacing - TICK_SLACK).ceil() as i64;
    let last = (hi / spacing + TICK_SLACK).floor() as i64;
    if last < first || (last - first) as usize >= limit {
        return None;
    }
    Some(first..=last)
}

// ============================================================================
// Canvas helpers
// ============================================================================

fn text_style(style: &StyleStruct, anchor: TextAnchor) -> TextStyle {
    TextStyle {
        color: style.color,
        size: style.font_size,
        rotation: 0.0,
        anchor,
    }
}

fn stroke_points(points: &[Coordinate], style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
    let screen: Vec<DVec2> = points.iter().map(|p| ctx.to_screen(*p)).collect();
    if screen.iter().any(|p| !p.is_finite()) {
        debug!(count = screen.len(), "skipping polyline with non-finite points");
        return;
    }
    canvas.stroke_polyline(&screen, &style.stroke());
}

/// Stroke the visible part of a curve. Returns the first and last points
/// that are on screen.
fn stroke_curve(
    curve: &CurveSegment,
    style: &StyleStruct,
    ctx: &Context,
    canvas: &mut dyn Canvas,
) -> Option<(Coordinate, Coordinate)> {
    match curve {
        CurveSegment::Segment(s) => {
            stroke_visible(ctx.clip_segment(s), style, ctx, canvas).map(|v| (v.start(), v.end()))
        }
        CurveSegment::Line(l) => stroke_visible(ctx.clip_line(l), style, ctx, canvas).map(|v| (v.start(), v.end())),
        CurveSegment::Hyperbola(h) => {
            // Arcs are clipped to the envelope; the canvas trims the rest
            let points = h
                .intersect(ctx.bounds())?
                .sample(defaults::HYPERBOLA_STEP_PIXELS * ctx.inv_scale());
            stroke_points(&points, style, ctx, canvas);
            let mut on_screen = points.into_iter().filter(|p| ctx.is_visible(*p));
            let first = on_screen.next()?;
            Some((first, on_screen.last().unwrap_or(first)))
        }
    }
}

fn stroke_visible(
    visible: Option<LineSegment>,
    style: &StyleStruct,
    ctx: &Context,
    canvas: &mut dyn Canvas,
) -> Option<LineSegment> {
    let visible = visible?;
    stroke_points(&[visible.start(), visible.end()], style, ctx, canvas);
    Some(visible)
}

fn draw_point(at: Coordinate, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
    if !ctx.is_visible(at) {
        return;
    }
    let center = ctx.to_screen(at);
    canvas.fill_circle(center, style.point_radius, style.fill.unwrap_or(style.color));
}

/// Text placed up and to the right of an event
fn draw_annotation(text: &str, at: Coordinate, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
    let offset = style.point_radius + defaults::LABEL_OFFSET;
    let p = ctx.to_screen(at) + dvec2(offset, -offset);
    if p.is_finite() {
        canvas.text(text, p, &text_style(style, TextAnchor::Start));
    }
}

/// A short mark across a curve whose screen direction is `along`
fn draw_tick_mark(at: DVec2, along: DVec2, style: &StyleStruct, canvas: &mut dyn Canvas) {
    let half = dvec2(-along.y, along.x) * (defaults::TICK_LENGTH / 2.0);
    canvas.stroke_polyline(&[at - half, at + half], &style.stroke());
}

// ============================================================================
// Axes
// ============================================================================

impl AxesStruct {
    fn axis_point(axis: Axis, value: f64) -> Coordinate {
        match axis {
            Axis::X => Coordinate::new(value, 0.0),
            Axis::T => Coordinate::new(0.0, value),
        }
    }

    fn axis_value(axis: Axis, c: Coordinate) -> f64 {
        match axis {
            Axis::X => c.x,
            Axis::T => c.t,
        }
    }

    /// Ticks on the visible part of one axis. The zero tick is left out
    /// when both axes are drawn.
    pub fn ticks(&self, axis: Axis, ctx: &Context, style: &StyleStruct, canvas: &dyn Canvas) -> Vec<Tick> {
        let Some(visible) = ctx.clip_line(&Line::new(axis, self.frame, 0.0).concrete()) else {
            return Vec::new();
        };
        let a = Self::axis_value(axis, self.frame.to_frame(visible.start()));
        let b = Self::axis_value(axis, self.frame.to_frame(visible.end()));
        let spacing = tick_spacing(ctx.inv_scale(), self.frame.velocity());
        let Some(range) = multiples(a.min(b), a.max(b), spacing, defaults::MAX_TICKS) else {
            debug!(axis = axis.name(), spacing, "no ticks to draw");
            return Vec::new();
        };

        let pixels = spacing * axis_stretch(self.frame.velocity()) * ctx.scale();
        let widest = range
            .clone()
            .map(|n| canvas.text_width(&format_tick(n as f64 * spacing, spacing), style.font_size))
            .fold(0.0, f64::max);
        let skip = label_skip((widest + defaults::LABEL_PADDING) / pixels) as i64;
        let skip_zero = self.x && self.t;

        range
            .filter(|n| !(skip_zero && *n == 0))
            .map(|n| {
                let value = n as f64 * spacing;
                Tick {
                    value,
                    location: self.frame.to_rest(Self::axis_point(axis, value)),
                    labeled: n % skip == 0,
                }
            })
            .collect()
    }

    fn draw_axis(&self, axis: Axis, label: &str, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let line = Line::new(axis, self.frame, 0.0).concrete();
        let Some(visible) = ctx.clip_line(&line) else {
            return;
        };
        stroke_points(&[visible.start(), visible.end()], style, ctx, canvas);
        let along = ctx.screen_direction(line.direction());

        if self.ticks {
            let spacing = tick_spacing(ctx.inv_scale(), self.frame.velocity());
            let ticks = self.ticks(axis, ctx, style, &*canvas);
            for tick in ticks {
                let at = ctx.to_screen(tick.location);
                draw_tick_mark(at, along, style, canvas);
                if self.labels && tick.labeled {
                    let text = format_tick(tick.value, spacing);
                    let (anchor, offset) = match axis {
                        Axis::X => (TextAnchor::Middle, dvec2(0.0, defaults::TICK_LENGTH + style.font_size)),
                        Axis::T => (TextAnchor::End, dvec2(-defaults::TICK_LENGTH - defaults::LABEL_OFFSET, style.font_size / 3.0)),
                    };
                    canvas.text(&text, at + offset, &text_style(style, anchor));
                }
            }
        }

        if !label.is_empty() {
            // Name the axis at its positive end
            let a = Self::axis_value(axis, self.frame.to_frame(visible.start()));
            let b = Self::axis_value(axis, self.frame.to_frame(visible.end()));
            let end = if a > b { visible.start() } else { visible.end() };
            let inset = -along * if a > b { -1.0 } else { 1.0 } * (defaults::LABEL_PADDING + style.font_size);
            let perp = dvec2(along.y, -along.x) * defaults::LABEL_OFFSET;
            let at = ctx.to_screen(end) + inset + perp;
            canvas.text(label, at, &text_style(style, TextAnchor::Middle));
        }
    }
}

impl Draw for AxesStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        if self.x {
            self.draw_axis(Axis::X, &self.x_label, style, ctx, canvas);
        }
        if self.t {
            self.draw_axis(Axis::T, &self.t_label, style, ctx, canvas);
        }
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

// ============================================================================
// Grids
// ============================================================================

impl Draw for GridStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let mut spacing = self
            .spacing
            .unwrap_or_else(|| tick_spacing(ctx.inv_scale(), self.frame.velocity()));
        let (lo, hi) = frame_extent(&self.frame, ctx.bounds());

        // Coarsen until the line count is reasonable
        let mut ranges = None;
        for _ in 0..6 {
            let xs = multiples(lo.x, hi.x, spacing, defaults::MAX_GRID_LINES);
            let ts = multiples(lo.t, hi.t, spacing, defaults::MAX_GRID_LINES);
            if let (Some(xs), Some(ts)) = (xs, ts) {
                ranges = Some((xs, ts));
                break;
            }
            spacing *= 10.0;
        }
        let Some((xs, ts)) = ranges else {
            debug!(spacing, "grid too dense to draw");
            return;
        };

        let mut lines = Vec::new();
        if self.x {
            lines.extend(xs.map(|n| Line::new(Axis::T, self.frame, n as f64 * spacing)));
        }
        if self.t {
            lines.extend(ts.map(|n| Line::new(Axis::X, self.frame, n as f64 * spacing)));
        }
        for line in lines {
            stroke_visible(ctx.clip_line(&line.concrete()), style, ctx, canvas);
        }
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

impl HypergridStruct {
    /// Visible arcs of `|x - x0| = sqrt(r² + (t - t0)²)`; each arc is a
    /// list of points
    fn spacelike_arcs(&self, radius: f64, bounds: &Bounds, step: f64) -> Vec<Vec<Coordinate>> {
        [1.0, -1.0]
            .into_iter()
            .filter_map(|side| {
                let curve = OffsetAcceleration::new(side / radius, self.origin);
                HyperbolicSegment::new(curve, f64::NEG_INFINITY, f64::INFINITY).intersect(bounds)
            })
            .map(|arc| arc.sample(step))
            .collect()
    }

    /// Visible arcs of `|t - t0| = sqrt(r² + (x - x0)²)`, traced with the
    /// roles of x and t exchanged
    fn timelike_arcs(&self, radius: f64, bounds: &Bounds, step: f64) -> Vec<Vec<Coordinate>> {
        let swap = |c: Coordinate| Coordinate::new(c.t, c.x);
        let swapped_bounds = Bounds::new(swap(bounds.min()), swap(bounds.max()));
        let swapped_origin = swap(self.origin);
        [1.0, -1.0]
            .into_iter()
            .filter_map(|side| {
                let curve = OffsetAcceleration::new(side / radius, swapped_origin);
                HyperbolicSegment::new(curve, f64::NEG_INFINITY, f64::INFINITY).intersect(&swapped_bounds)
            })
            .map(|arc| arc.sample(step).into_iter().map(swap).collect())
            .collect()
    }
}

impl Draw for HypergridStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let spacing = self
            .spacing
            .unwrap_or_else(|| tick_spacing(ctx.inv_scale(), 0.0));
        let bounds = ctx.bounds();
        let step = defaults::HYPERBOLA_STEP_PIXELS * ctx.inv_scale();

        let mut reach = Coordinate::ORIGIN;
        for corner in bounds.corners() {
            let d = corner - self.origin;
            reach = Coordinate::new(reach.x.max(d.x.abs()), reach.t.max(d.t.abs()));
        }

        let families: [(bool, f64, fn(&Self, f64, &Bounds, f64) -> Vec<Vec<Coordinate>>); 2] = [
            (self.spacelike, reach.x, Self::spacelike_arcs),
            (self.timelike, reach.t, Self::timelike_arcs),
        ];
        for (enabled, reach, arcs) in families {
            if !enabled {
                continue;
            }
            let count = (reach / spacing).floor();
            if !count.is_finite() {
                continue;
            }
            let count = count as usize;
            if count > defaults::MAX_HYPERBOLAS {
                debug!(count, "hypergrid too dense to draw");
                continue;
            }
            for n in 1..=count {
                for points in arcs(self, n as f64 * spacing, bounds, step) {
                    stroke_points(&points, style, ctx, canvas);
                }
            }
        }
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

// ============================================================================
// Events, lines, worldlines
// ============================================================================

impl Draw for EventStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        draw_point(self.location, style, ctx, canvas);
        if let Some(label) = &self.label {
            draw_annotation(label, self.location, style, ctx, canvas);
        }
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

impl Draw for LineStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let visible = match &self.shape {
            LineShape::Segment(s) => ctx.clip_segment(s),
            LineShape::Infinite(l) => ctx.clip_line(l),
        };
        let visible = stroke_visible(visible, style, ctx, canvas);
        if let (Some(visible), Some(label)) = (visible, &self.label) {
            draw_annotation(label, visible.point_at(0.5), style, ctx, canvas);
        }
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

impl WorldlineStruct {
    /// Proper-time marks along the visible part of the worldline
    fn draw_ticks(&self, visible: &[(Coordinate, Coordinate)], style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let spacing = self
            .tick_spacing
            .unwrap_or_else(|| tick_spacing(ctx.inv_scale(), 0.0));
        for (start, end) in visible {
            let a = self.observer.tau_at(start.t);
            let b = self.observer.tau_at(end.t);
            let Some(range) = multiples(a.min(b), a.max(b), spacing, defaults::MAX_TICKS) else {
                continue;
            };
            for n in range {
                let tau = n as f64 * spacing;
                let event = self.observer.event_at_tau(tau);
                if !ctx.is_visible(event) {
                    continue;
                }
                let v = self.observer.velocity_at_tau(tau);
                let along = ctx.screen_direction(Coordinate::new(v, 1.0));
                draw_tick_mark(ctx.to_screen(event), along, style, canvas);
            }
        }
    }
}

impl Draw for WorldlineStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let visible: Vec<(Coordinate, Coordinate)> = self
            .observer
            .segments()
            .iter()
            .filter_map(|s| stroke_curve(s.curve(), style, ctx, canvas))
            .collect();
        let (first, last) = self.observer.endpoints();
        for end in [first, last].into_iter().flatten() {
            draw_point(end, style, ctx, canvas);
        }
        if self.ticks {
            self.draw_ticks(&visible, style, ctx, canvas);
        }
        if let (Some(label), Some((_, top))) = (&self.label, visible.last()) {
            draw_annotation(label, *top, style, ctx, canvas);
        }
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

// ============================================================================
// Paths and labels
// ============================================================================

impl Draw for PathStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let mut points: Vec<DVec2> = self.points.iter().map(|p| ctx.to_screen(*p)).collect();
        if points.iter().any(|p| !p.is_finite()) {
            debug!(count = points.len(), "skipping path with non-finite points");
            return;
        }
        if let Some(fill) = style.fill {
            canvas.fill_polygon(&points, fill);
        }
        if self.closed {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        canvas.stroke_polyline(&points, &style.stroke());
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

impl Draw for LabelStruct {
    fn draw(&self, style: &StyleStruct, ctx: &Context, canvas: &mut dyn Canvas) {
        let at = ctx.to_screen(self.location);
        if !at.is_finite() {
            return;
        }
        let text = TextStyle {
            rotation: self.rotation.to_radians(),
            ..text_style(style, TextAnchor::Middle)
        };
        canvas.text(&self.text, at, &text);
    }

    fn rebase(&mut self, frame: &Frame) {
        *self = self.relative_to(frame);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geometry::{ConcreteLine, Observer};
    use crate::lcode::canvas::{DrawOp, RecordingCanvas};
    use crate::lcode::context::Viewport;

    fn square_ctx() -> Context {
        Context::new(&Viewport::new(500.0, 500.0).with_scale(5.0)).unwrap()
    }

    fn axes() -> AxesStruct {
        AxesStruct {
            frame: Frame::REST,
            x: true,
            t: true,
            ticks: true,
            labels: true,
            x_label: "x".into(),
            t_label: "t".into(),
        }
    }

    // ===== Tick helper tests =====

    #[test]
    fn spacing_is_power_of_ten() {
        assert_eq!(tick_spacing(0.2, 0.0), 10.0);
        assert_eq!(tick_spacing(0.02, 0.0), 1.0);
        assert_eq!(tick_spacing(0.002, 0.0), 0.1);
        // Boosted axes are stretched, so their ticks get denser
        assert!(tick_spacing(0.2, 0.99) < 10.0);
    }

    #[test]
    fn label_skip_thresholds() {
        assert_eq!(label_skip(0.5), 1);
        assert_eq!(label_skip(1.0), 1);
        assert_eq!(label_skip(1.5), 2);
        assert_eq!(label_skip(3.0), 5);
        assert_eq!(label_skip(60.0), 100);
    }

    #[test]
    fn tick_text() {
        assert_eq!(format_tick(20.0, 10.0), "20");
        assert_eq!(format_tick(0.30000000000000004, 0.1), "0.3");
        assert_eq!(format_tick(-0.05, 0.01), "-0.05");
        assert_eq!(format_tick(0.0, 0.1), "0");
    }

    // ===== Axes tests =====

    #[test]
    fn square_viewport_ticks() {
        let ctx = square_ctx();
        let canvas = RecordingCanvas::new();
        let ticks = axes().ticks(Axis::X, &ctx, &StyleStruct::default(), &canvas);
        let values: Vec<f64> = ticks.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![-50.0, -40.0, -30.0, -20.0, -10.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        assert!(ticks.iter().all(|t| t.labeled));
        assert!(ticks[0].location.fuzzy_eq(Coordinate::new(-50.0, 0.0)));
    }

    #[test]
    fn zero_tick_kept_for_single_axis() {
        let ctx = square_ctx();
        let canvas = RecordingCanvas::new();
        let only_t = AxesStruct { x: false, ..axes() };
        let ticks = only_t.ticks(Axis::T, &ctx, &StyleStruct::default(), &canvas);
        assert_eq!(ticks.len(), 11);
        assert!(ticks.iter().any(|t| t.value == 0.0));
    }

    #[test]
    fn crowded_labels_are_skipped() {
        let ctx = square_ctx();
        let canvas = RecordingCanvas::new();
        let style = StyleStruct {
            font_size: 40.0,
            ..StyleStruct::default()
        };
        let ticks = axes().ticks(Axis::X, &ctx, &style, &canvas);
        // "-50" at 40px is 72px wide plus padding: more than one tick apart
        assert!(ticks.iter().any(|t| !t.labeled));
        assert!(ticks.iter().filter(|t| t.labeled).all(|t| (t.value / 10.0) as i64 % 2 == 0));
    }

    #[test]
    fn axes_draw_labels() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        axes().draw(&StyleStruct::default(), &ctx, &mut canvas);
        let texts = canvas.texts();
        assert!(texts.contains(&"-50"));
        assert!(texts.contains(&"40"));
        assert!(texts.contains(&"x"));
        assert!(texts.contains(&"t"));
        assert!(!texts.contains(&"0"));
    }

    // ===== Shape tests =====

    #[test]
    fn event_is_a_dot() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let event = EventStruct {
            location: Coordinate::new(10.0, 10.0),
            label: Some("A".into()),
        };
        event.draw(&StyleStruct::default(), &ctx, &mut canvas);
        let circles: Vec<_> = canvas.circles().collect();
        assert_eq!(circles, vec![(dvec2(300.0, 200.0), defaults::POINT_RADIUS)]);
        assert_eq!(canvas.texts(), vec!["A"]);
    }

    #[test]
    fn offscreen_event_is_skipped() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let event = EventStruct {
            location: Coordinate::new(100.0, 0.0),
            label: None,
        };
        event.draw(&StyleStruct::default(), &ctx, &mut canvas);
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn infinite_line_is_clipped_to_screen() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let line = LineStruct {
            shape: LineShape::Infinite(ConcreteLine::with_velocity(Coordinate::ORIGIN, 0.0)),
            label: None,
        };
        line.draw(&StyleStruct::default(), &ctx, &mut canvas);
        let lines: Vec<_> = canvas.polylines().collect();
        assert_eq!(lines.len(), 1);
        let ys: Vec<f64> = lines[0].iter().map(|p| p.y).collect();
        assert!(ys.iter().any(|y| (y - 0.0).abs() < 1e-9));
        assert!(ys.iter().any(|y| (y - 500.0).abs() < 1e-9));
    }

    #[test]
    fn hypergrid_draws_both_families() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let grid = HypergridStruct {
            origin: Coordinate::ORIGIN,
            spacing: Some(20.0),
            timelike: true,
            spacelike: true,
        };
        grid.draw(&StyleStruct::default(), &ctx, &mut canvas);
        // r = 20, 40 on each side for each family
        assert_eq!(canvas.polylines().count(), 8);
        for points in canvas.polylines() {
            assert!(points.len() > 2);
        }
    }

    #[test]
    fn grid_draws_both_directions() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let grid = GridStruct {
            frame: Frame::REST,
            spacing: Some(25.0),
            x: true,
            t: true,
        };
        grid.draw(&StyleStruct::default(), &ctx, &mut canvas);
        // -50, -25, 0, 25, 50 in each direction
        assert_eq!(canvas.polylines().count(), 10);
    }

    #[test]
    fn worldline_with_ticks_and_ends() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let observer = Observer::inertial(Coordinate::ORIGIN, 0.0, 0.0)
            .unwrap()
            .with_interval(0.0, 30.0)
            .unwrap();
        let worldline = WorldlineStruct {
            observer: Arc::new(observer),
            label: Some("Bob".into()),
            ticks: true,
            tick_spacing: Some(10.0),
        };
        worldline.draw(&StyleStruct::default(), &ctx, &mut canvas);
        assert_eq!(canvas.circles().count(), 2);
        // The worldline plus marks at tau = 0, 10, 20, 30
        assert_eq!(canvas.polylines().count(), 5);
        assert_eq!(canvas.texts(), vec!["Bob"]);
    }

    #[test]
    fn closed_filled_path() {
        let ctx = square_ctx();
        let mut canvas = RecordingCanvas::new();
        let path = PathStruct {
            points: vec![Coordinate::ORIGIN, Coordinate::new(10.0, 0.0), Coordinate::new(10.0, 10.0)],
            closed: true,
        };
        let style = StyleStruct {
            fill: Some(crate::types::Color::WHITE),
            ..StyleStruct::default()
        };
        path.draw(&style, &ctx, &mut canvas);
        assert!(matches!(canvas.ops()[0], DrawOp::Polygon { ref points, .. } if points.len() == 3));
        assert_eq!(canvas.polylines().next().map(|p| p.len()), Some(4));
    }

    #[test]
    fn rebase_through_dispatch() {
        let mut cmd: CommandStruct = EventStruct {
            location: Coordinate::new(3.0, 5.0),
            label: None,
        }
        .into();
        cmd.rebase(&Frame::boost(0.6).unwrap());
        match cmd {
            CommandStruct::Event(e) => assert!(e.location.fuzzy_eq(Coordinate::new(0.0, 4.0))),
            other => panic!("unexpected {other:?}"),
        }
    }
}
