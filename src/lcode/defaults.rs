//! Default sizes and settings (screen quantities are in pixels)

use crate::types::Color;

/// Target on-screen distance between axis ticks
pub const IDEAL_TICK_PIXELS: f64 = 50.0;
pub const TICK_LENGTH: f64 = 6.0;
/// Gap kept between neighbouring tick labels
pub const LABEL_PADDING: f64 = 8.0;
/// Offset of a label from the point it annotates
pub const LABEL_OFFSET: f64 = 5.0;
/// `(label/tick pixel ratio, label every nth tick)`, checked in order
pub const LABEL_SKIP_THRESHOLDS: [(f64, usize); 6] = [
    (50.0, 100),
    (20.0, 50),
    (10.0, 20),
    (5.0, 10),
    (2.0, 5),
    (1.0, 2),
];

/// Sampling step along hyperbolas
pub const HYPERBOLA_STEP_PIXELS: f64 = 2.0;
pub const MAX_GRID_LINES: usize = 500;
pub const MAX_HYPERBOLAS: usize = 200;
pub const MAX_TICKS: usize = 1000;

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 600.0;
/// Pixels per spacetime unit
pub const SCALE: f64 = 50.0;

pub const LINE_WIDTH: f64 = 1.5;
pub const AXIS_LINE_WIDTH: f64 = 1.0;
pub const GRID_LINE_WIDTH: f64 = 0.5;
pub const FONT_SIZE: f64 = 12.0;
pub const POINT_RADIUS: f64 = 3.0;
/// Average glyph advance as a fraction of the font size
pub const CHAR_WIDTH_RATIO: f64 = 0.6;

pub const BACKGROUND: Color = Color::WHITE;
pub const GRID_COLOR: Color = Color::rgb(200, 200, 200);
pub const HYPERGRID_COLOR: Color = Color::rgb(180, 200, 230);

/// Animation frames per second at speed 1
pub const BASE_FPS: f64 = 30.0;
/// Frame cap for unbounded animations: ten hours at the base rate
pub const MAX_FRAMES: usize = 10 * 3600 * 30;
