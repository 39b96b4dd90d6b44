//! Symbol tables.
//!
//! The base [`SymbolTable`] is rebuilt on every H-code run. Animation and
//! dynamic variables live in overlay tables that survive re-runs: the first
//! run inserts them, later runs leave them alone, and the host or the
//! animation driver mutates them in place between runs. Reads consult the
//! overlays before the base table.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::datum::Datum;
use crate::errors::ExecutionErrorKind;
use crate::geometry::Frame;
use crate::lcode::ColorTable;
use crate::relativity::{fuzzy_eq, fuzzy_zero};

/// Name → value mapping with read-only entries
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    values: HashMap<String, Datum>,
    protected: HashSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the protected built-ins: `infinity`, `pi`, `true`,
    /// `false`, `rest` and every color in `colors`
    pub fn with_builtins(colors: &ColorTable) -> Self {
        let mut table = SymbolTable::new();

        macro_rules! builtins {
            ($($name:literal => $value:expr),* $(,)?) => {
                $(
                    table.values.insert($name.to_string(), $value);
                    table.protected.insert($name.to_string());
                )*
            };
        }

        builtins! {
            "infinity" => Datum::Number(f64::INFINITY),
            "pi" => Datum::Number(std::f64::consts::PI),
            "true" => Datum::Bool(true),
            "false" => Datum::Bool(false),
            "rest" => Datum::Frame(Frame::REST),
        }

        for (name, color) in colors.iter() {
            table.values.insert(name.to_string(), Datum::Color(color));
            table.protected.insert(name.to_string());
        }
        table
    }

    pub fn protect(&mut self, name: &str) {
        self.protected.insert(name.to_string());
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(name)
    }

    /// Insert or overwrite; fails for protected names
    pub fn put(&mut self, name: &str, value: Datum) -> Result<(), ExecutionErrorKind> {
        if self.is_protected(name) {
            return Err(ExecutionErrorKind::ProtectedSymbol {
                name: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

// ============================================================================
// Animation variables
// ============================================================================

/// A variable stepped by the animation frame counter
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationVariable {
    initial: f64,
    step: f64,
    /// NaN when the variable runs forever
    final_value: f64,
    current: f64,
}

impl AnimationVariable {
    pub fn new(initial: f64, step: f64, final_value: Option<f64>) -> Result<Self, ExecutionErrorKind> {
        let invalid = |reason: &str| ExecutionErrorKind::InvalidArgument {
            function: "animate",
            reason: reason.to_string(),
        };
        if !initial.is_finite() || !step.is_finite() {
            return Err(invalid("initial value and step must be finite"));
        }
        if fuzzy_zero(step) {
            return Err(invalid("step must not be zero"));
        }
        let final_value = match final_value {
            Some(f) if f.is_nan() => return Err(invalid("final value must be a number")),
            Some(f) if f.is_infinite() => f64::NAN,
            Some(f) if (f - initial) / step < 0.0 && !fuzzy_eq(f, initial) => {
                return Err(invalid("final value cannot be reached with this step"));
            }
            Some(f) => f,
            None => f64::NAN,
        };
        Ok(AnimationVariable {
            initial,
            step,
            final_value,
            current: initial,
        })
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// `None` when unbounded
    pub fn final_value(&self) -> Option<f64> {
        (!self.final_value.is_nan()).then_some(self.final_value)
    }

    pub fn current_value(&self) -> f64 {
        self.current
    }

    /// Frames needed to walk from the initial to the final value, endpoints
    /// included; `None` when unbounded
    pub fn frame_count(&self) -> Option<usize> {
        let last = self.final_value()?;
        let steps = (last - self.initial) / self.step;
        let rounded = steps.round();
        let whole = if fuzzy_eq(steps, rounded) {
            rounded
        } else {
            steps.ceil()
        };
        Some(whole.max(0.0) as usize + 1)
    }

    /// Set the value for a 1-based logical frame; bounded variables hold
    /// their final value once they reach it
    pub fn set_current_frame(&mut self, frame: usize) {
        let value = self.initial + frame.saturating_sub(1) as f64 * self.step;
        self.current = match self.final_value() {
            Some(last) if self.step > 0.0 => value.min(last),
            Some(last) => value.max(last),
            None => value,
        };
    }
}

/// Overlay of animation variables
#[derive(Clone, Debug, Default)]
pub struct AnimationSymbolTable {
    vars: BTreeMap<String, AnimationVariable>,
}

impl AnimationSymbolTable {
    /// Insert once; returns false (and changes nothing) if `name` exists
    pub fn put(&mut self, name: &str, var: AnimationVariable) -> bool {
        if self.vars.contains_key(name) {
            return false;
        }
        self.vars.insert(name.to_string(), var);
        true
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).map(AnimationVariable::current_value)
    }

    pub fn variable(&self, name: &str) -> Option<&AnimationVariable> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnimationVariable)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Push a 1-based logical frame into every variable
    pub fn set_frame(&mut self, frame: usize) {
        for var in self.vars.values_mut() {
            var.set_current_frame(frame);
        }
    }
}

// ============================================================================
// Dynamic variables
// ============================================================================

/// A variable exposed as a live control, clamped to `[min, max]`
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicVariable {
    initial: f64,
    min: f64,
    max: f64,
    value: f64,
}

impl DynamicVariable {
    pub fn new(initial: f64, min: f64, max: f64) -> Result<Self, ExecutionErrorKind> {
        if !(min.is_finite() && max.is_finite() && initial.is_finite()) || min > max {
            return Err(ExecutionErrorKind::InvalidArgument {
                function: "dynamic",
                reason: format!("need finite min <= max, got {min} and {max}"),
            });
        }
        Ok(DynamicVariable {
            initial,
            min,
            max,
            value: initial.clamp(min, max),
        })
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the stored (clamped) value
    pub fn set(&mut self, value: f64) -> f64 {
        if !value.is_nan() {
            self.value = value.clamp(self.min, self.max);
        }
        self.value
    }
}

/// Overlay of dynamic variables
#[derive(Clone, Debug, Default)]
pub struct DynamicSymbolTable {
    vars: BTreeMap<String, DynamicVariable>,
}

impl DynamicSymbolTable {
    /// Insert once; returns false (and changes nothing) if `name` exists
    pub fn put(&mut self, name: &str, var: DynamicVariable) -> bool {
        if self.vars.contains_key(name) {
            return false;
        }
        self.vars.insert(name.to_string(), var);
        true
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).map(DynamicVariable::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<f64, ExecutionErrorKind> {
        self.vars
            .get_mut(name)
            .map(|var| var.set(value))
            .ok_or_else(|| ExecutionErrorKind::UnknownVariable {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynamicVariable)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }
}

// ============================================================================
// Combined view
// ============================================================================

/// The base table plus both overlays, as seen by H-code instructions
#[derive(Clone, Debug, Default)]
pub struct Symbols {
    pub base: SymbolTable,
    pub animation: AnimationSymbolTable,
    pub dynamic: DynamicSymbolTable,
}

impl Symbols {
    pub fn new(colors: &ColorTable) -> Self {
        Symbols {
            base: SymbolTable::with_builtins(colors),
            ..Default::default()
        }
    }

    /// Fresh base table for a new run; overlays are kept
    pub fn reset_base(&mut self, colors: &ColorTable) {
        self.base = SymbolTable::with_builtins(colors);
    }

    pub fn get(&self, name: &str) -> Result<Datum, ExecutionErrorKind> {
        if let Some(v) = self.animation.get(name) {
            return Ok(Datum::Number(v));
        }
        if let Some(v) = self.dynamic.get(name) {
            return Ok(Datum::Number(v));
        }
        self.base
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutionErrorKind::UndefinedSymbol {
                name: name.to_string(),
            })
    }

    /// Plain assignment; overlay variables cannot be reassigned
    pub fn put(&mut self, name: &str, value: Datum) -> Result<(), ExecutionErrorKind> {
        if self.animation.contains(name) || self.dynamic.contains(name) {
            return Err(ExecutionErrorKind::ProtectedSymbol {
                name: name.to_string(),
            });
        }
        self.base.put(name, value)
    }
}
