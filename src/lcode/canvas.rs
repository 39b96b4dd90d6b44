//! Pixel-level drawing surface.
//!
//! Drawing routines do all the relativity and clipping work and hand the
//! canvas finished screen-space geometry. [`RecordingCanvas`] keeps a
//! display list, which hosts can replay onto a real graphics context and
//! tests can inspect.

use glam::DVec2;

use super::defaults;
use crate::types::Color;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub dashed: bool,
}

/// Horizontal alignment of text relative to its anchor point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub size: f64,
    /// Radians, counter-clockwise on screen
    pub rotation: f64,
    pub anchor: TextAnchor,
}

pub trait Canvas {
    fn clear(&mut self, background: Color);

    fn stroke_polyline(&mut self, points: &[DVec2], stroke: &Stroke);

    fn fill_polygon(&mut self, points: &[DVec2], fill: Color);

    fn fill_circle(&mut self, center: DVec2, radius: f64, fill: Color);

    fn text(&mut self, text: &str, at: DVec2, style: &TextStyle);

    /// Width of `text` in pixels; the default is an average-glyph estimate
    fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * defaults::CHAR_WIDTH_RATIO
    }
}

/// One recorded canvas call
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear(Color),
    Polyline { points: Vec<DVec2>, stroke: Stroke },
    Polygon { points: Vec<DVec2>, fill: Color },
    Circle { center: DVec2, radius: f64, fill: Color },
    Text { text: String, at: DVec2, style: TextStyle },
}

/// A canvas that records every call
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Every text drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn polylines(&self) -> impl Iterator<Item = &[DVec2]> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Polyline { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = (DVec2, f64)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Circle { center, radius, .. } => Some((*center, *radius)),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, background: Color) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(background));
    }

    fn stroke_polyline(&mut self, points: &[DVec2], stroke: &Stroke) {
        self.ops.push(DrawOp::Polyline {
            points: points.to_vec(),
            stroke: *stroke,
        });
    }

    fn fill_polygon(&mut self, points: &[DVec2], fill: Color) {
        self.ops.push(DrawOp::Polygon {
            points: points.to_vec(),
            fill,
        });
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, fill: Color) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            fill,
        });
    }

    fn text(&mut self, text: &str, at: DVec2, style: &TextStyle) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            style: *style,
        });
    }
}
