//! Per-command parameter structs.
//!
//! Each command kind has a typed struct filled from a script property list
//! by an explicit match over property names. Required properties are held
//! as `Option`s until the struct is finished; a missing one is an execution
//! error. Style properties (`color`, `width`, ...) are accepted by every
//! drawing command and land in the command's style snapshot.

use std::sync::Arc;

use super::draw::CommandStruct;
use super::style::{StyleDefaults, StyleStruct};
use crate::errors::ExecutionErrorKind;
use crate::geometry::{Axis, ConcreteLine, Duration, Frame, Leg, Line, LineSegment, Motion, Observer};
use crate::hcode::{Datum, Properties};
use crate::relativity::is_subluminal;
use crate::types::{Color, Coordinate};

/// Every command a script can issue
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    Axes,
    Grid,
    Hypergrid,
    Event,
    Line,
    Worldline,
    Path,
    Label,
    Display,
    Frame,
    Animation,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::Axes,
        CommandKind::Grid,
        CommandKind::Hypergrid,
        CommandKind::Event,
        CommandKind::Line,
        CommandKind::Worldline,
        CommandKind::Path,
        CommandKind::Label,
        CommandKind::Display,
        CommandKind::Frame,
        CommandKind::Animation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Axes => "axes",
            CommandKind::Grid => "grid",
            CommandKind::Hypergrid => "hypergrid",
            CommandKind::Event => "event",
            CommandKind::Line => "line",
            CommandKind::Worldline => "worldline",
            CommandKind::Path => "path",
            CommandKind::Label => "label",
            CommandKind::Display => "display",
            CommandKind::Frame => "frame",
            CommandKind::Animation => "animation",
        }
    }

    pub fn from_name(name: &str) -> Option<CommandKind> {
        CommandKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

// ============================================================================
// Property helpers
// ============================================================================

fn unknown(command: &'static str, name: &str) -> ExecutionErrorKind {
    ExecutionErrorKind::UnknownProperty {
        command,
        property: name.to_string(),
    }
}

fn out_of_range(command: &'static str, name: &str, reason: impl Into<String>) -> ExecutionErrorKind {
    ExecutionErrorKind::OutOfRange {
        command,
        property: name.to_string(),
        reason: reason.into(),
    }
}

fn required<T>(command: &'static str, property: &'static str, value: Option<T>) -> Result<T, ExecutionErrorKind> {
    value.ok_or(ExecutionErrorKind::MissingProperty { command, property })
}

fn positive(command: &'static str, name: &str, value: &Datum) -> Result<f64, ExecutionErrorKind> {
    let v = value.as_number()?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(out_of_range(command, name, format!("must be a positive number, got {v}")))
    }
}

fn finite(command: &'static str, name: &str, value: &Datum) -> Result<f64, ExecutionErrorKind> {
    let v = value.as_number()?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(out_of_range(command, name, format!("must be finite, got {v}")))
    }
}

fn velocity(value: &Datum) -> Result<f64, ExecutionErrorKind> {
    let v = value.as_number()?;
    if !is_subluminal(v) {
        return Err(ExecutionErrorKind::Superluminal { velocity: v });
    }
    Ok(v)
}

/// A drawable event. NaN from an out-of-domain calculation is kept; the
/// drawing routines skip what they cannot place.
fn event_coordinate(value: &Datum) -> Result<Coordinate, ExecutionErrorKind> {
    value.as_coordinate()
}

/// An event that anchors a frame or viewport, which must be finite
fn coordinate(command: &'static str, name: &str, value: &Datum) -> Result<Coordinate, ExecutionErrorKind> {
    let c = value.as_coordinate()?;
    if !c.is_finite() {
        return Err(out_of_range(command, name, format!("must be a finite event, got {c}")));
    }
    Ok(c)
}

/// Route a property the command itself does not know to the style
fn style_or_unknown(
    command: &'static str,
    style: &mut StyleStruct,
    name: &str,
    value: &Datum,
) -> Result<(), ExecutionErrorKind> {
    if style.apply(command, name, value)? {
        Ok(())
    } else {
        Err(unknown(command, name))
    }
}

// ============================================================================
// Drawing commands
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct AxesStruct {
    pub frame: Frame,
    pub x: bool,
    pub t: bool,
    pub ticks: bool,
    pub labels: bool,
    pub x_label: String,
    pub t_label: String,
}

impl AxesStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "axes";
        let mut axes = AxesStruct {
            frame: Frame::REST,
            x: true,
            t: true,
            ticks: true,
            labels: true,
            x_label: "x".to_string(),
            t_label: "t".to_string(),
        };
        for (name, value) in props.iter() {
            match name {
                "frame" => axes.frame = value.as_frame()?,
                "x" => axes.x = value.as_bool()?,
                "t" => axes.t = value.as_bool()?,
                "ticks" => axes.ticks = value.as_bool()?,
                "labels" => axes.labels = value.as_bool()?,
                "x_label" => axes.x_label = value.as_str()?.to_string(),
                "t_label" => axes.t_label = value.as_str()?.to_string(),
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(axes)
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        AxesStruct {
            frame: self.frame.relative_to(base),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridStruct {
    pub frame: Frame,
    /// `None` follows the axis tick spacing
    pub spacing: Option<f64>,
    /// Lines of constant x'
    pub x: bool,
    /// Lines of constant t'
    pub t: bool,
}

impl GridStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "grid";
        let mut grid = GridStruct {
            frame: Frame::REST,
            spacing: None,
            x: true,
            t: true,
        };
        for (name, value) in props.iter() {
            match name {
                "frame" => grid.frame = value.as_frame()?,
                "spacing" => grid.spacing = Some(positive(C, name, value)?),
                "x" => grid.x = value.as_bool()?,
                "t" => grid.t = value.as_bool()?,
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(grid)
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        GridStruct {
            frame: self.frame.relative_to(base),
            ..self.clone()
        }
    }
}

/// Invariant hyperbolas `(x - x0)² - (t - t0)² = ±(n·spacing)²`
#[derive(Clone, Debug, PartialEq)]
pub struct HypergridStruct {
    pub origin: Coordinate,
    pub spacing: Option<f64>,
    pub timelike: bool,
    pub spacelike: bool,
}

impl HypergridStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "hypergrid";
        let mut grid = HypergridStruct {
            origin: Coordinate::ORIGIN,
            spacing: None,
            timelike: true,
            spacelike: true,
        };
        for (name, value) in props.iter() {
            match name {
                "origin" => grid.origin = coordinate(C, name, value)?,
                "spacing" => grid.spacing = Some(positive(C, name, value)?),
                "timelike" => grid.timelike = value.as_bool()?,
                "spacelike" => grid.spacelike = value.as_bool()?,
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(grid)
    }

    /// The hyperbolas are invariant; only their center moves
    pub fn relative_to(&self, base: &Frame) -> Self {
        HypergridStruct {
            origin: base.to_frame(self.origin),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventStruct {
    pub location: Coordinate,
    pub label: Option<String>,
}

impl EventStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "event";
        let mut location = None;
        let mut label = None;
        for (name, value) in props.iter() {
            match name {
                "location" => location = Some(event_coordinate(value)?),
                "label" => label = Some(value.as_str()?.to_string()),
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(EventStruct {
            location: required(C, "location", location)?,
            label,
        })
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        EventStruct {
            location: base.to_frame(self.location),
            ..self.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineShape {
    Segment(LineSegment),
    Infinite(ConcreteLine),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineStruct {
    pub shape: LineShape,
    pub label: Option<String>,
}

impl LineStruct {
    /// A segment (`from`, `to`), a line through an event at a velocity
    /// (`through`, `velocity`) or a frame-parallel line (`axis`, `frame`,
    /// `offset`)
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "line";
        let mut from = None;
        let mut to = None;
        let mut through = None;
        let mut speed = None;
        let mut axis = None;
        let mut frame = Frame::REST;
        let mut offset = 0.0;
        let mut label = None;
        for (name, value) in props.iter() {
            match name {
                "from" => from = Some(event_coordinate(value)?),
                "to" => to = Some(event_coordinate(value)?),
                "through" => through = Some(event_coordinate(value)?),
                "velocity" => speed = Some(velocity(value)?),
                "axis" => {
                    axis = Some(match value.as_str()? {
                        "x" => Axis::X,
                        "t" => Axis::T,
                        other => return Err(out_of_range(C, name, format!("must be \"x\" or \"t\", got {other:?}"))),
                    })
                }
                "frame" => frame = value.as_frame()?,
                "offset" => offset = finite(C, name, value)?,
                "label" => label = Some(value.as_str()?.to_string()),
                _ => style_or_unknown(C, style, name, value)?,
            }
        }

        let shape = if from.is_some() || to.is_some() {
            if through.is_some() || axis.is_some() {
                return Err(out_of_range(C, "from", "cannot be combined with `through` or `axis`"));
            }
            LineShape::Segment(LineSegment::new(required(C, "from", from)?, required(C, "to", to)?))
        } else if let Some(anchor) = through {
            if axis.is_some() {
                return Err(out_of_range(C, "through", "cannot be combined with `axis`"));
            }
            LineShape::Infinite(ConcreteLine::with_velocity(anchor, required(C, "velocity", speed)?))
        } else if let Some(axis) = axis {
            LineShape::Infinite(Line::new(axis, frame, offset).concrete())
        } else {
            return Err(ExecutionErrorKind::MissingProperty {
                command: C,
                property: "from",
            });
        };
        Ok(LineStruct { shape, label })
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        let shape = match self.shape {
            LineShape::Segment(s) => LineShape::Segment(s.relative_to(base)),
            LineShape::Infinite(l) => LineShape::Infinite(l.relative_to(base)),
        };
        LineStruct {
            shape,
            label: self.label.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldlineStruct {
    pub observer: Arc<Observer>,
    pub label: Option<String>,
    /// Mark proper time along the worldline
    pub ticks: bool,
    pub tick_spacing: Option<f64>,
}

impl WorldlineStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "worldline";
        let mut observer = None;
        let mut label = None;
        let mut ticks = false;
        let mut tick_spacing = None;
        for (name, value) in props.iter() {
            match name {
                "observer" => observer = Some(value.as_observer()?.clone()),
                "label" => label = Some(value.as_str()?.to_string()),
                "ticks" => ticks = value.as_bool()?,
                "tick_spacing" => tick_spacing = Some(positive(C, name, value)?),
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(WorldlineStruct {
            observer: required(C, "observer", observer)?,
            label,
            ticks,
            tick_spacing,
        })
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        WorldlineStruct {
            observer: Arc::new(self.observer.relative_to(base)),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathStruct {
    pub points: Vec<Coordinate>,
    pub closed: bool,
}

impl PathStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "path";
        let mut points = None;
        let mut closed = false;
        for (name, value) in props.iter() {
            match name {
                "points" => {
                    let list = value
                        .as_array()?
                        .iter()
                        .map(event_coordinate)
                        .collect::<Result<Vec<_>, _>>()?;
                    if list.len() < 2 {
                        return Err(out_of_range(C, name, "needs at least two points"));
                    }
                    points = Some(list);
                }
                "closed" => closed = value.as_bool()?,
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(PathStruct {
            points: required(C, "points", points)?,
            closed,
        })
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        PathStruct {
            points: self.points.iter().map(|p| base.to_frame(*p)).collect(),
            closed: self.closed,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelStruct {
    pub text: String,
    pub location: Coordinate,
    /// Degrees, counter-clockwise
    pub rotation: f64,
}

impl LabelStruct {
    pub fn from_properties(props: &Properties, style: &mut StyleStruct) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "label";
        let mut text = None;
        let mut location = None;
        let mut rotation = 0.0;
        for (name, value) in props.iter() {
            match name {
                "text" => text = Some(value.as_str()?.to_string()),
                "location" => location = Some(event_coordinate(value)?),
                "rotation" => rotation = finite(C, name, value)?,
                _ => style_or_unknown(C, style, name, value)?,
            }
        }
        Ok(LabelStruct {
            text: required(C, "text", text)?,
            location: required(C, "location", location)?,
            rotation,
        })
    }

    pub fn relative_to(&self, base: &Frame) -> Self {
        LabelStruct {
            location: base.to_frame(self.location),
            ..self.clone()
        }
    }
}

// ============================================================================
// Pinned commands
// ============================================================================

/// Canvas setup. The viewport fields seed the host viewport when a script
/// loads; the background is used on every redraw.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayStruct {
    pub scale: Option<f64>,
    pub center: Option<Coordinate>,
    /// Degrees, counter-clockwise
    pub rotation: Option<f64>,
    pub background: Color,
}

impl Default for DisplayStruct {
    fn default() -> Self {
        DisplayStruct {
            scale: None,
            center: None,
            rotation: None,
            background: super::defaults::BACKGROUND,
        }
    }
}

impl DisplayStruct {
    pub fn from_properties(props: &Properties) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "display";
        let mut display = DisplayStruct::default();
        for (name, value) in props.iter() {
            match name {
                "scale" => display.scale = Some(positive(C, name, value)?),
                "center" => display.center = Some(coordinate(C, name, value)?),
                "rotation" => display.rotation = Some(finite(C, name, value)?),
                "background" => display.background = value.as_color()?,
                _ => return Err(unknown(C, name)),
            }
        }
        Ok(display)
    }
}

/// The frame the whole diagram is drawn in
#[derive(Clone, Debug, PartialEq)]
pub struct FrameStruct {
    pub frame: Frame,
}

impl FrameStruct {
    /// One of `velocity` (with optional `origin`), `frame`, or `observer`
    /// (with optional `tau`)
    pub fn from_properties(props: &Properties) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "frame";
        let mut speed = None;
        let mut origin = Coordinate::ORIGIN;
        let mut given = None;
        let mut observer = None;
        let mut tau = 0.0;
        for (name, value) in props.iter() {
            match name {
                "velocity" => speed = Some(velocity(value)?),
                "origin" => origin = coordinate(C, name, value)?,
                "frame" => given = Some(value.as_frame()?),
                "observer" => observer = Some(value.as_observer()?.clone()),
                "tau" => tau = finite(C, name, value)?,
                _ => return Err(unknown(C, name)),
            }
        }
        let sources = [speed.is_some(), given.is_some(), observer.is_some()];
        if sources.iter().filter(|s| **s).count() > 1 {
            return Err(out_of_range(C, "velocity", "give only one of `velocity`, `frame` or `observer`"));
        }
        let frame = match (speed, given, observer) {
            (Some(v), _, _) => Frame::new(v, origin)?,
            (_, Some(f), _) => f,
            (_, _, Some(o)) => o.frame_at_tau(tau)?,
            _ => {
                return Err(ExecutionErrorKind::MissingProperty {
                    command: C,
                    property: "velocity",
                });
            }
        };
        Ok(FrameStruct { frame })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Control {
    /// Restart from the first frame
    #[default]
    Loop,
    /// Play forwards then backwards
    Cycle,
}

/// Animation playback settings
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationStruct {
    /// `None` repeats forever
    pub reps: Option<usize>,
    pub control: Control,
    pub speed: f64,
}

impl Default for AnimationStruct {
    fn default() -> Self {
        AnimationStruct {
            reps: Some(1),
            control: Control::Loop,
            speed: 1.0,
        }
    }
}

impl AnimationStruct {
    pub fn from_properties(props: &Properties) -> Result<Self, ExecutionErrorKind> {
        const C: &str = "animation";
        let mut anim = AnimationStruct::default();
        for (name, value) in props.iter() {
            match name {
                "reps" => {
                    let n = value.as_number()?;
                    anim.reps = if n == f64::INFINITY {
                        None
                    } else if n >= 1.0 && n.fract() == 0.0 {
                        Some(n as usize)
                    } else {
                        return Err(out_of_range(C, name, format!("must be a whole number >= 1 or infinity, got {n}")));
                    };
                }
                "control" => {
                    anim.control = match value.as_str()? {
                        "loop" => Control::Loop,
                        "cycle" => Control::Cycle,
                        other => return Err(out_of_range(C, name, format!("must be \"loop\" or \"cycle\", got {other:?}"))),
                    }
                }
                "speed" => anim.speed = positive(C, name, value)?,
                _ => return Err(unknown(C, name)),
            }
        }
        Ok(anim)
    }
}

// ============================================================================
// Observer constructor
// ============================================================================

/// Build an observer from `start`, `velocity`, `tau`, `segments`, `min_t`
/// and `max_t`
pub fn observer_from_properties(props: &Properties) -> Result<Observer, ExecutionErrorKind> {
    const C: &str = "observer";
    let mut start = Coordinate::ORIGIN;
    let mut v0 = 0.0;
    let mut tau = 0.0;
    let mut legs = Vec::new();
    let mut min_t = f64::NEG_INFINITY;
    let mut max_t = f64::INFINITY;
    for (name, value) in props.iter() {
        match name {
            "start" => start = coordinate(C, name, value)?,
            "velocity" => v0 = velocity(value)?,
            "tau" => tau = finite(C, name, value)?,
            "segments" => {
                legs = value
                    .as_array()?
                    .iter()
                    .map(|seg| leg_from_properties(seg.as_properties()?))
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "min_t" => min_t = value.as_number()?,
            "max_t" => max_t = value.as_number()?,
            _ => return Err(unknown(C, name)),
        }
    }
    let observer = Observer::new(start, v0, tau, &legs)?;
    if min_t == f64::NEG_INFINITY && max_t == f64::INFINITY {
        Ok(observer)
    } else {
        observer.with_interval(min_t, max_t)
    }
}

fn leg_from_properties(props: &Properties) -> Result<Leg, ExecutionErrorKind> {
    const C: &str = "segment";
    let mut motion = None;
    let mut duration = Duration::Unbounded;
    let mut timed = false;
    for (name, value) in props.iter() {
        match name {
            "velocity" | "acceleration" if motion.is_some() => {
                return Err(out_of_range(C, name, "give either `velocity` or `acceleration`"));
            }
            "velocity" => {
                motion = Some(Motion::Coast {
                    velocity: velocity(value)?,
                })
            }
            "acceleration" => {
                motion = Some(Motion::Accelerate {
                    acceleration: finite(C, name, value)?,
                })
            }
            "tau" | "t" if timed => {
                return Err(out_of_range(C, name, "give either `tau` or `t`"));
            }
            "tau" => {
                duration = Duration::ProperTime(value.as_number()?);
                timed = true;
            }
            "t" => {
                duration = Duration::CoordinateTime(value.as_number()?);
                timed = true;
            }
            _ => return Err(unknown(C, name)),
        }
    }
    Ok(Leg {
        motion: required(C, "velocity", motion)?,
        duration,
    })
}

// ============================================================================
// Building commands
// ============================================================================

/// One drawing command: parameters plus the style captured when it was
/// issued
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub shape: CommandStruct,
    pub style: StyleStruct,
}

/// What a command statement produces
#[derive(Clone, Debug, PartialEq)]
pub enum Built {
    Draw(Command),
    Display(DisplayStruct),
    Frame(FrameStruct),
    Animation(AnimationStruct),
}

pub fn build(kind: CommandKind, props: &Properties, styles: &StyleDefaults) -> Result<Built, ExecutionErrorKind> {
    let mut style = styles.get(kind);
    let shape: CommandStruct = match kind {
        CommandKind::Axes => AxesStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Grid => GridStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Hypergrid => HypergridStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Event => EventStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Line => LineStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Worldline => WorldlineStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Path => PathStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Label => LabelStruct::from_properties(props, &mut style)?.into(),
        CommandKind::Display => return Ok(Built::Display(DisplayStruct::from_properties(props)?)),
        CommandKind::Frame => return Ok(Built::Frame(FrameStruct::from_properties(props)?)),
        CommandKind::Animation => {
            return Ok(Built::Animation(AnimationStruct::from_properties(props)?));
        }
    };
    Ok(Built::Draw(Command { kind, shape, style }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: Vec<(&str, Datum)>) -> Properties {
        entries
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect()
    }

    fn coord(x: f64, t: f64) -> Datum {
        Datum::Coordinate(Coordinate::new(x, t))
    }

    // ===== Property matching tests =====

    #[test]
    fn missing_required_property() {
        let err = build(CommandKind::Event, &Properties::new(), &StyleDefaults::default()).unwrap_err();
        assert_eq!(
            err,
            ExecutionErrorKind::MissingProperty {
                command: "event",
                property: "location"
            }
        );
    }

    #[test]
    fn unknown_property_is_rejected() {
        let p = props(vec![("location", coord(0.0, 0.0)), ("size", Datum::Number(3.0))]);
        let err = build(CommandKind::Event, &p, &StyleDefaults::default()).unwrap_err();
        assert_eq!(
            err,
            ExecutionErrorKind::UnknownProperty {
                command: "event",
                property: "size".into()
            }
        );
    }

    #[test]
    fn style_properties_go_to_snapshot() {
        let p = props(vec![
            ("location", coord(1.0, 2.0)),
            ("color", Datum::Color(Color::WHITE)),
        ]);
        match build(CommandKind::Event, &p, &StyleDefaults::default()).unwrap() {
            Built::Draw(cmd) => {
                assert_eq!(cmd.style.color, Color::WHITE);
                assert_eq!(cmd.kind, CommandKind::Event);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_mismatch() {
        let p = props(vec![("x", Datum::Number(1.0))]);
        let err = build(CommandKind::Axes, &p, &StyleDefaults::default()).unwrap_err();
        assert_eq!(
            err,
            ExecutionErrorKind::TypeMismatch {
                expected: "boolean",
                got: "number"
            }
        );
    }

    // ===== Line tests =====

    #[test]
    fn line_segment_needs_both_ends() {
        let p = props(vec![("from", coord(0.0, 0.0))]);
        let err = build(CommandKind::Line, &p, &StyleDefaults::default()).unwrap_err();
        assert_eq!(
            err,
            ExecutionErrorKind::MissingProperty {
                command: "line",
                property: "to"
            }
        );
    }

    #[test]
    fn line_through_with_velocity() {
        let p = props(vec![("through", coord(1.0, 0.0)), ("velocity", Datum::Number(0.5))]);
        let mut style = StyleStruct::default();
        let line = LineStruct::from_properties(&p, &mut style).unwrap();
        match line.shape {
            LineShape::Infinite(l) => assert!((l.velocity() - 0.5).abs() < 1e-12),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn line_rejects_superluminal_velocity() {
        let p = props(vec![("through", coord(0.0, 0.0)), ("velocity", Datum::Number(1.5))]);
        let err = LineStruct::from_properties(&p, &mut StyleStruct::default()).unwrap_err();
        assert_eq!(err, ExecutionErrorKind::Superluminal { velocity: 1.5 });
    }

    // ===== Pinned command tests =====

    #[test]
    fn frame_from_velocity() {
        let p = props(vec![("velocity", Datum::Number(0.0))]);
        let frame = FrameStruct::from_properties(&p).unwrap();
        assert!(frame.frame.is_rest());
        assert!(FrameStruct::from_properties(&Properties::new()).is_err());
    }

    #[test]
    fn animation_settings() {
        let p = props(vec![
            ("reps", Datum::Number(f64::INFINITY)),
            ("control", Datum::Str("cycle".into())),
        ]);
        let anim = AnimationStruct::from_properties(&p).unwrap();
        assert_eq!(anim.reps, None);
        assert_eq!(anim.control, Control::Cycle);

        let bad = props(vec![("reps", Datum::Number(1.5))]);
        assert!(AnimationStruct::from_properties(&bad).is_err());
        let bad = props(vec![("control", Datum::Str("bounce".into()))]);
        assert!(AnimationStruct::from_properties(&bad).is_err());
    }

    #[test]
    fn display_rejects_style_properties() {
        let p = props(vec![("color", Datum::Color(Color::BLACK))]);
        assert!(DisplayStruct::from_properties(&p).is_err());
    }

    // ===== Observer tests =====

    #[test]
    fn observer_with_segments() {
        let seg = |entries: Vec<(&str, Datum)>| Datum::Properties(props(entries));
        let p = props(vec![
            ("start", coord(0.0, 0.0)),
            (
                "segments",
                Datum::Array(vec![
                    seg(vec![("acceleration", Datum::Number(1.0)), ("tau", Datum::Number(1.0))]),
                    seg(vec![("velocity", Datum::Number(0.0))]),
                ]),
            ),
        ]);
        let obs = observer_from_properties(&p).unwrap();
        assert_eq!(obs.segments().len(), 3);
        assert_eq!(obs.max_t(), f64::INFINITY);
    }

    #[test]
    fn observer_segment_needs_motion() {
        let p = props(vec![(
            "segments",
            Datum::Array(vec![Datum::Properties(props(vec![("tau", Datum::Number(1.0))]))]),
        )]);
        assert_eq!(
            observer_from_properties(&p).unwrap_err(),
            ExecutionErrorKind::MissingProperty {
                command: "segment",
                property: "velocity"
            }
        );
    }

    #[test]
    fn interval_observer() {
        let p = props(vec![("min_t", Datum::Number(0.0)), ("max_t", Datum::Number(4.0))]);
        let obs = observer_from_properties(&p).unwrap();
        assert_eq!(obs.min_t(), 0.0);
        assert_eq!(obs.max_t(), 4.0);
    }

    #[test]
    fn rebasing_event_moves_location() {
        let event = EventStruct {
            location: Coordinate::new(3.0, 5.0),
            label: None,
        };
        let frame = Frame::boost(0.6).unwrap();
        let moved = event.relative_to(&frame);
        assert!(moved.location.fuzzy_eq(Coordinate::new(0.0, 4.0)));
    }
}
