//! Style snapshots, per-kind style defaults and the color table.
//!
//! A [`ScriptConfig`] is created for each script load and handed to the
//! H-code engine, which clones it at the start of every run so `style`
//! statements from one run never leak into the next.

use std::collections::BTreeMap;

use super::canvas::Stroke;
use super::defaults;
use super::structs::CommandKind;
use crate::errors::ExecutionErrorKind;
use crate::hcode::{Datum, Properties};
use crate::types::Color;

/// Visual properties attached to one command
#[derive(Clone, Debug, PartialEq)]
pub struct StyleStruct {
    pub color: Color,
    pub line_width: f64,
    pub dashed: bool,
    pub font_size: f64,
    pub fill: Option<Color>,
    pub point_radius: f64,
}

impl Default for StyleStruct {
    fn default() -> Self {
        StyleStruct {
            color: Color::BLACK,
            line_width: defaults::LINE_WIDTH,
            dashed: false,
            font_size: defaults::FONT_SIZE,
            fill: None,
            point_radius: defaults::POINT_RADIUS,
        }
    }
}

impl StyleStruct {
    /// Apply one style property. Returns `Ok(false)` if `name` is not a
    /// style property at all.
    pub fn apply(&mut self, command: &'static str, name: &str, value: &Datum) -> Result<bool, ExecutionErrorKind> {
        let non_negative = |v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(v)
            } else {
                Err(ExecutionErrorKind::OutOfRange {
                    command,
                    property: name.to_string(),
                    reason: format!("must be a non-negative number, got {v}"),
                })
            }
        };
        match name {
            "color" => self.color = value.as_color()?,
            "width" | "line_width" => self.line_width = non_negative(value.as_number()?)?,
            "dashed" => self.dashed = value.as_bool()?,
            "font_size" => self.font_size = non_negative(value.as_number()?)?,
            "fill" => {
                self.fill = match value {
                    Datum::Bool(false) => None,
                    Datum::Bool(true) => Some(self.color),
                    other => Some(other.as_color()?),
                }
            }
            "radius" => self.point_radius = non_negative(value.as_number()?)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn stroke(&self) -> Stroke {
        Stroke {
            color: self.color,
            width: self.line_width,
            dashed: self.dashed,
        }
    }
}

/// Which command kinds a `style` statement targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleTarget {
    All,
    Kind(CommandKind),
}

impl StyleTarget {
    pub fn from_name(name: &str) -> Option<StyleTarget> {
        match name {
            "all" => Some(StyleTarget::All),
            other => CommandKind::from_name(other).map(StyleTarget::Kind),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleTarget::All => "all",
            StyleTarget::Kind(kind) => kind.name(),
        }
    }
}

/// Style defaults for every drawing command kind
#[derive(Clone, Debug, PartialEq)]
pub struct StyleDefaults {
    kinds: BTreeMap<CommandKind, StyleStruct>,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        let kinds = CommandKind::ALL
            .iter()
            .map(|&kind| {
                let mut style = StyleStruct::default();
                match kind {
                    CommandKind::Axes => style.line_width = defaults::AXIS_LINE_WIDTH,
                    CommandKind::Grid => {
                        style.color = defaults::GRID_COLOR;
                        style.line_width = defaults::GRID_LINE_WIDTH;
                    }
                    CommandKind::Hypergrid => {
                        style.color = defaults::HYPERGRID_COLOR;
                        style.line_width = defaults::GRID_LINE_WIDTH;
                    }
                    _ => {}
                }
                (kind, style)
            })
            .collect();
        StyleDefaults { kinds }
    }
}

impl StyleDefaults {
    /// Snapshot for a new command
    pub fn get(&self, kind: CommandKind) -> StyleStruct {
        self.kinds.get(&kind).cloned().unwrap_or_default()
    }

    /// Apply a `style` statement
    pub fn apply(&mut self, target: StyleTarget, props: &Properties) -> Result<(), ExecutionErrorKind> {
        let command = target.name();
        for (kind, style) in self.kinds.iter_mut() {
            if matches!(target, StyleTarget::Kind(k) if k != *kind) {
                continue;
            }
            for (name, value) in props.iter() {
                if !style.apply(command, name, value)? {
                    return Err(ExecutionErrorKind::UnknownProperty {
                        command,
                        property: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Named colors available to scripts as protected symbols
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
    colors: BTreeMap<String, Color>,
}

impl Default for ColorTable {
    fn default() -> Self {
        let colors = [
            ("black", Color::BLACK),
            ("white", Color::WHITE),
            ("transparent", Color::TRANSPARENT),
            ("red", Color::rgb(220, 40, 40)),
            ("green", Color::rgb(30, 160, 60)),
            ("blue", Color::rgb(40, 80, 220)),
            ("yellow", Color::rgb(240, 200, 20)),
            ("orange", Color::rgb(245, 140, 20)),
            ("purple", Color::rgb(130, 50, 170)),
            ("magenta", Color::rgb(210, 40, 170)),
            ("cyan", Color::rgb(20, 180, 200)),
            ("brown", Color::rgb(140, 90, 40)),
            ("gray", Color::rgb(128, 128, 128)),
            ("lightgray", Color::rgb(200, 200, 200)),
            ("darkgray", Color::rgb(70, 70, 70)),
        ];
        ColorTable {
            colors: colors
                .into_iter()
                .map(|(n, c)| (n.to_string(), c))
                .collect(),
        }
    }
}

impl ColorTable {
    pub fn get(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, color: Color) {
        self.colors.insert(name.into(), color);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        self.colors.iter().map(|(n, c)| (n.as_str(), *c))
    }
}

/// Per-load configuration threaded through H-code execution
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptConfig {
    pub styles: StyleDefaults,
    pub colors: ColorTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, Datum)]) -> Properties {
        entries
            .iter()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn style_all_reaches_every_kind() {
        let mut styles = StyleDefaults::default();
        styles
            .apply(StyleTarget::All, &props(&[("color", Datum::Color(Color::WHITE))]))
            .unwrap();
        for kind in CommandKind::ALL {
            assert_eq!(styles.get(kind).color, Color::WHITE);
        }
    }

    #[test]
    fn style_kind_is_targeted() {
        let mut styles = StyleDefaults::default();
        styles
            .apply(
                StyleTarget::Kind(CommandKind::Event),
                &props(&[("radius", Datum::Number(6.0))]),
            )
            .unwrap();
        assert_eq!(styles.get(CommandKind::Event).point_radius, 6.0);
        assert_eq!(styles.get(CommandKind::Label).point_radius, defaults::POINT_RADIUS);
    }

    #[test]
    fn unknown_style_property() {
        let mut styles = StyleDefaults::default();
        let err = styles
            .apply(StyleTarget::All, &props(&[("glow", Datum::Number(1.0))]))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionErrorKind::UnknownProperty {
                command: "all",
                property: "glow".into()
            }
        );
    }

    #[test]
    fn fill_true_uses_stroke_color() {
        let mut style = StyleStruct::default();
        style.apply("path", "color", &Datum::Color(Color::WHITE)).unwrap();
        style.apply("path", "fill", &Datum::Bool(true)).unwrap();
        assert_eq!(style.fill, Some(Color::WHITE));
        assert!(style.apply("path", "width", &Datum::Number(-1.0)).is_err());
    }

    #[test]
    fn grid_defaults_are_lighter() {
        let styles = StyleDefaults::default();
        assert_eq!(styles.get(CommandKind::Grid).color, defaults::GRID_COLOR);
        assert_eq!(styles.get(CommandKind::Event).color, Color::BLACK);
    }
}
