//! H-code instructions.
//!
//! Each instruction declares how many operands it takes (fixed, or read
//! from a `Count` literal on top of the stack), what type each operand must
//! have, and whether it leaves a result. The engine slices the operand
//! window off the stack and checks it before calling [`HCode::execute`].

use std::fmt;
use std::sync::Arc;

use super::datum::{Datum, Kind, Properties};
use super::symbols::{AnimationVariable, DynamicVariable, Symbols};
use crate::errors::{ExecutionErrorKind, ProgrammingError, ScriptError};
use crate::geometry::Frame;
use crate::lcode::structs::{self, CommandKind};
use crate::lcode::{LCodeEngine, ScriptConfig, StyleTarget};
use crate::relativity::{self, asinh, atanh, gamma, is_subluminal, lorentz_transform};
use crate::types::Coordinate;

/// How many operands an instruction consumes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// The count is a `Count` literal pushed right before the instruction
    Stack,
}

/// Single-argument math functions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathFn {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Abs,
    Exp,
    Ln,
    Asinh,
    Acosh,
    Atanh,
    Gamma,
}

impl MathFn {
    pub const ALL: [MathFn; 11] = [
        MathFn::Sqrt,
        MathFn::Sin,
        MathFn::Cos,
        MathFn::Tan,
        MathFn::Abs,
        MathFn::Exp,
        MathFn::Ln,
        MathFn::Asinh,
        MathFn::Acosh,
        MathFn::Atanh,
        MathFn::Gamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathFn::Sqrt => "sqrt",
            MathFn::Sin => "sin",
            MathFn::Cos => "cos",
            MathFn::Tan => "tan",
            MathFn::Abs => "abs",
            MathFn::Exp => "exp",
            MathFn::Ln => "ln",
            MathFn::Asinh => "asinh",
            MathFn::Acosh => "acosh",
            MathFn::Atanh => "atanh",
            MathFn::Gamma => "gamma",
        }
    }

    pub fn from_name(name: &str) -> Option<MathFn> {
        MathFn::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Out-of-domain inputs give NaN, except `gamma`, which rejects
    /// superluminal speeds
    pub fn apply(self, x: f64) -> Result<f64, ExecutionErrorKind> {
        Ok(match self {
            MathFn::Sqrt => x.sqrt(),
            MathFn::Sin => x.sin(),
            MathFn::Cos => x.cos(),
            MathFn::Tan => x.tan(),
            MathFn::Abs => x.abs(),
            MathFn::Exp => x.exp(),
            MathFn::Ln => x.ln(),
            MathFn::Asinh => asinh(x),
            MathFn::Acosh => relativity::acosh(x),
            MathFn::Atanh => atanh(x),
            MathFn::Gamma => {
                if !is_subluminal(x) {
                    return Err(ExecutionErrorKind::Superluminal { velocity: x });
                }
                gamma(x)
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HCode {
    /// `Name` → value
    Fetch,
    /// `Name, value` →
    Assign,
    Negate,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// `x, t` → coordinate
    Coordinate,
    Function(MathFn),
    Min,
    Max,
    Sum,
    /// `Name, value, ...` pairs → property list
    Properties,
    Array,
    /// property list → observer
    Observer,
    /// velocity, velocity + origin, observer, or observer + tau → frame
    FrameOf,
    ToFrame,
    ToRest,
    Lorentz,
    XOf,
    TOf,
    EventAt,
    VelocityAt,
    /// `Name, initial, step[, final]` →
    Animate,
    /// `Name, initial, min, max` →
    Dynamic,
    /// property list → (emits a command)
    Command(CommandKind),
    /// property list → (updates style defaults)
    StyleDefaults(StyleTarget),
}

/// Everything an instruction can touch while it runs
pub struct Runtime<'a> {
    pub symbols: &'a mut Symbols,
    pub config: &'a mut ScriptConfig,
    pub lcode: &'a mut LCodeEngine,
}

fn number_or_coordinate(datum: &Datum) -> ExecutionErrorKind {
    ExecutionErrorKind::TypeMismatch {
        expected: "number or coordinate",
        got: datum.kind_name(),
    }
}

fn next(args: &mut std::vec::IntoIter<Datum>) -> Result<Datum, ProgrammingError> {
    args.next()
        .ok_or_else(|| ProgrammingError::new("operand window shorter than checked"))
}

fn text(datum: &Datum) -> String {
    match datum {
        Datum::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

impl HCode {
    pub fn arity(self) -> Arity {
        match self {
            HCode::Fetch
            | HCode::Negate
            | HCode::Function(_)
            | HCode::Observer
            | HCode::XOf
            | HCode::TOf
            | HCode::Command(_)
            | HCode::StyleDefaults(_) => Arity::Fixed(1),
            HCode::Assign
            | HCode::Add
            | HCode::Sub
            | HCode::Mul
            | HCode::Div
            | HCode::Pow
            | HCode::Coordinate
            | HCode::ToFrame
            | HCode::ToRest
            | HCode::Lorentz
            | HCode::EventAt
            | HCode::VelocityAt => Arity::Fixed(2),
            HCode::Dynamic => Arity::Fixed(4),
            HCode::Min
            | HCode::Max
            | HCode::Sum
            | HCode::Properties
            | HCode::Array
            | HCode::FrameOf
            | HCode::Animate => Arity::Stack,
        }
    }

    /// Number of values left on the stack
    pub fn returns(self) -> usize {
        match self {
            HCode::Assign
            | HCode::Animate
            | HCode::Dynamic
            | HCode::Command(_)
            | HCode::StyleDefaults(_) => 0,
            _ => 1,
        }
    }

    /// Name used in error messages
    pub fn function_name(self) -> &'static str {
        match self {
            HCode::Function(f) => f.name(),
            HCode::Min => "min",
            HCode::Max => "max",
            HCode::Sum => "sum",
            HCode::Properties => "property list",
            HCode::Array => "array",
            HCode::FrameOf => "frame",
            HCode::Animate => "animate",
            HCode::Dynamic => "dynamic",
            HCode::Observer => "observer",
            HCode::ToFrame => "to_frame",
            HCode::ToRest => "to_rest",
            HCode::Lorentz => "lorentz",
            HCode::XOf => "x",
            HCode::TOf => "t",
            HCode::EventAt => "event",
            HCode::VelocityAt => "velocity",
            HCode::Command(kind) => kind.name(),
            HCode::StyleDefaults(_) => "style",
            _ => "operator",
        }
    }

    /// Validate a stack-supplied operand count
    pub fn check_count(self, count: usize) -> Result<(), ExecutionErrorKind> {
        let (ok, expected) = match self {
            HCode::Min | HCode::Max | HCode::Sum | HCode::Array => (count >= 1, "at least 1"),
            HCode::Properties => (count % 2 == 0, "an even number of"),
            HCode::FrameOf => ((1..=2).contains(&count), "1 or 2"),
            // The leading Name operand is not something the user wrote
            HCode::Animate => {
                return if (3..=4).contains(&count) {
                    Ok(())
                } else {
                    Err(ExecutionErrorKind::ArgumentCount {
                        function: "animate",
                        expected: "2 or 3",
                        got: count.saturating_sub(1),
                    })
                };
            }
            _ => match self.arity() {
                Arity::Fixed(n) => (count == n, "a fixed number of"),
                Arity::Stack => (true, ""),
            },
        };
        if ok {
            Ok(())
        } else {
            Err(ExecutionErrorKind::ArgumentCount {
                function: self.function_name(),
                expected,
                got: count,
            })
        }
    }

    /// Required type of operand `index`
    pub fn param_kind(self, index: usize) -> Kind {
        match (self, index) {
            (HCode::Fetch | HCode::Assign | HCode::Animate | HCode::Dynamic, 0) => Kind::Name,
            (HCode::Animate | HCode::Dynamic, _) => Kind::Number,
            (HCode::Properties, i) if i % 2 == 0 => Kind::Name,
            (HCode::Coordinate | HCode::Function(_) | HCode::Pow | HCode::Min | HCode::Max | HCode::Sum, _) => {
                Kind::Number
            }
            (HCode::Observer | HCode::Command(_) | HCode::StyleDefaults(_), _) => Kind::Properties,
            (HCode::ToFrame | HCode::ToRest, 0) => Kind::Frame,
            (HCode::ToFrame | HCode::ToRest, _) => Kind::Coordinate,
            (HCode::Lorentz, 0) => Kind::Coordinate,
            (HCode::Lorentz, _) => Kind::Number,
            (HCode::XOf | HCode::TOf, _) => Kind::Coordinate,
            (HCode::EventAt | HCode::VelocityAt, 0) => Kind::Observer,
            (HCode::EventAt | HCode::VelocityAt, _) => Kind::Number,
            _ => Kind::Value,
        }
    }

    pub fn mnemonic(self) -> String {
        match self {
            HCode::Fetch => "fetch".into(),
            HCode::Assign => "assign".into(),
            HCode::Negate => "neg".into(),
            HCode::Add => "add".into(),
            HCode::Sub => "sub".into(),
            HCode::Mul => "mul".into(),
            HCode::Div => "div".into(),
            HCode::Pow => "pow".into(),
            HCode::Coordinate => "coord".into(),
            HCode::Function(f) => format!("call {}", f.name()),
            HCode::Min => "min".into(),
            HCode::Max => "max".into(),
            HCode::Sum => "sum".into(),
            HCode::Properties => "props".into(),
            HCode::Array => "array".into(),
            HCode::Observer => "observer".into(),
            HCode::FrameOf => "frame_of".into(),
            HCode::ToFrame => "to_frame".into(),
            HCode::ToRest => "to_rest".into(),
            HCode::Lorentz => "lorentz".into(),
            HCode::XOf => "x_of".into(),
            HCode::TOf => "t_of".into(),
            HCode::EventAt => "event_at".into(),
            HCode::VelocityAt => "velocity_at".into(),
            HCode::Animate => "animate".into(),
            HCode::Dynamic => "dynamic".into(),
            HCode::Command(kind) => format!("cmd {}", kind.name()),
            HCode::StyleDefaults(target) => format!("style {}", target.name()),
        }
    }

    /// Run with an already checked operand window
    pub fn execute(self, args: Vec<Datum>, rt: &mut Runtime<'_>) -> Result<Option<Datum>, ScriptError> {
        let mut args = args.into_iter();

        let result = match self {
            HCode::Fetch => Some(rt.symbols.get(next(&mut args)?.as_name()?)?),
            HCode::Assign => {
                let name = next(&mut args)?;
                let value = next(&mut args)?;
                rt.symbols.put(name.as_name()?, value)?;
                None
            }
            HCode::Negate => Some(match next(&mut args)? {
                Datum::Number(n) => Datum::Number(-n),
                Datum::Coordinate(c) => Datum::Coordinate(-c),
                other => return Err(number_or_coordinate(&other).into()),
            }),
            HCode::Add => Some(match (next(&mut args)?, next(&mut args)?) {
                (Datum::Number(a), Datum::Number(b)) => Datum::Number(a + b),
                (Datum::Coordinate(a), Datum::Coordinate(b)) => Datum::Coordinate(a + b),
                (a @ Datum::Str(_), b) | (a, b @ Datum::Str(_)) => Datum::Str(text(&a) + &text(&b)),
                (Datum::Number(_) | Datum::Coordinate(_), other) | (other, _) => {
                    return Err(number_or_coordinate(&other).into());
                }
            }),
            HCode::Sub => Some(match (next(&mut args)?, next(&mut args)?) {
                (Datum::Number(a), Datum::Number(b)) => Datum::Number(a - b),
                (Datum::Coordinate(a), Datum::Coordinate(b)) => Datum::Coordinate(a - b),
                (Datum::Number(_) | Datum::Coordinate(_), other) | (other, _) => {
                    return Err(number_or_coordinate(&other).into());
                }
            }),
            HCode::Mul => Some(match (next(&mut args)?, next(&mut args)?) {
                (Datum::Number(a), Datum::Number(b)) => Datum::Number(a * b),
                (Datum::Coordinate(c), Datum::Number(k)) | (Datum::Number(k), Datum::Coordinate(c)) => {
                    Datum::Coordinate(c * k)
                }
                (Datum::Number(_) | Datum::Coordinate(_), other) | (other, _) => {
                    return Err(number_or_coordinate(&other).into());
                }
            }),
            HCode::Div => {
                let a = next(&mut args)?;
                let b = next(&mut args)?.as_number()?;
                if b == 0.0 {
                    return Err(ExecutionErrorKind::DivisionByZero.into());
                }
                Some(match a {
                    Datum::Number(a) => Datum::Number(a / b),
                    Datum::Coordinate(c) => Datum::Coordinate(c * (1.0 / b)),
                    other => return Err(number_or_coordinate(&other).into()),
                })
            }
            HCode::Pow => {
                let a = next(&mut args)?.as_number()?;
                let b = next(&mut args)?.as_number()?;
                Some(Datum::Number(a.powf(b)))
            }
            HCode::Coordinate => {
                let x = next(&mut args)?.as_number()?;
                let t = next(&mut args)?.as_number()?;
                Some(Datum::Coordinate(Coordinate::new(x, t)))
            }
            HCode::Function(f) => Some(Datum::Number(f.apply(next(&mut args)?.as_number()?)?)),
            HCode::Min | HCode::Max | HCode::Sum => {
                let values = args.map(|d| d.as_number()).collect::<Result<Vec<_>, _>>()?;
                let folded = match self {
                    HCode::Min => values.into_iter().fold(f64::INFINITY, f64::min),
                    HCode::Max => values.into_iter().fold(f64::NEG_INFINITY, f64::max),
                    _ => values.into_iter().sum(),
                };
                Some(Datum::Number(folded))
            }
            HCode::Properties => {
                let mut props = Properties::new();
                while let Some(name) = args.next() {
                    let value = args
                        .next()
                        .ok_or_else(|| ProgrammingError::new("property without a value"))?;
                    props.insert(name.as_name()?, value);
                }
                Some(Datum::Properties(props))
            }
            HCode::Array => Some(Datum::Array(args.collect())),
            HCode::Observer => {
                let props = next(&mut args)?;
                let observer = structs::observer_from_properties(props.as_properties()?)?;
                Some(Datum::Observer(Arc::new(observer)))
            }
            HCode::FrameOf => {
                let first = next(&mut args)?;
                let second = args.next();
                let frame = match (first, second) {
                    (Datum::Number(v), None) => Frame::boost(v)?,
                    (Datum::Number(v), Some(origin)) => Frame::new(v, origin.as_coordinate()?)?,
                    (Datum::Observer(o), None) => o.frame_at_tau(0.0)?,
                    (Datum::Observer(o), Some(tau)) => o.frame_at_tau(tau.as_number()?)?,
                    (Datum::Frame(f), None) => f,
                    (other, _) => {
                        return Err(ExecutionErrorKind::InvalidArgument {
                            function: "frame",
                            reason: format!("cannot make a frame from a {}", other.kind_name()),
                        }
                        .into());
                    }
                };
                Some(Datum::Frame(frame))
            }
            HCode::ToFrame | HCode::ToRest => {
                let frame = next(&mut args)?.as_frame()?;
                let c = next(&mut args)?.as_coordinate()?;
                Some(Datum::Coordinate(if self == HCode::ToFrame {
                    frame.to_frame(c)
                } else {
                    frame.to_rest(c)
                }))
            }
            HCode::Lorentz => {
                let c = next(&mut args)?.as_coordinate()?;
                let v = next(&mut args)?.as_number()?;
                if !is_subluminal(v) {
                    return Err(ExecutionErrorKind::Superluminal { velocity: v }.into());
                }
                Some(Datum::Coordinate(lorentz_transform(c, v)))
            }
            HCode::XOf => Some(Datum::Number(next(&mut args)?.as_coordinate()?.x)),
            HCode::TOf => Some(Datum::Number(next(&mut args)?.as_coordinate()?.t)),
            HCode::EventAt | HCode::VelocityAt => {
                let observer = next(&mut args)?;
                let observer = observer.as_observer()?;
                let tau = next(&mut args)?.as_number()?;
                Some(if self == HCode::EventAt {
                    Datum::Coordinate(observer.event_at_tau(tau))
                } else {
                    Datum::Number(observer.velocity_at_tau(tau))
                })
            }
            HCode::Animate => {
                let name = next(&mut args)?;
                let initial = next(&mut args)?.as_number()?;
                let step = next(&mut args)?.as_number()?;
                let last = args.next().map(|d| d.as_number()).transpose()?;
                let name = name.as_name()?;
                if rt.symbols.base.is_protected(name) {
                    return Err(ExecutionErrorKind::ProtectedSymbol { name: name.to_string() }.into());
                }
                rt.symbols
                    .animation
                    .put(name, AnimationVariable::new(initial, step, last)?);
                None
            }
            HCode::Dynamic => {
                let name = next(&mut args)?;
                let initial = next(&mut args)?.as_number()?;
                let min = next(&mut args)?.as_number()?;
                let max = next(&mut args)?.as_number()?;
                let name = name.as_name()?;
                if rt.symbols.base.is_protected(name) {
                    return Err(ExecutionErrorKind::ProtectedSymbol { name: name.to_string() }.into());
                }
                rt.symbols
                    .dynamic
                    .put(name, DynamicVariable::new(initial, min, max)?);
                None
            }
            HCode::Command(kind) => {
                let props = next(&mut args)?;
                let built = structs::build(kind, props.as_properties()?, &rt.config.styles)?;
                rt.lcode.push(built);
                None
            }
            HCode::StyleDefaults(target) => {
                let props = next(&mut args)?;
                rt.config.styles.apply(target, props.as_properties()?)?;
                None
            }
        };
        Ok(result)
    }
}

impl fmt::Display for HCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Arity tests =====

    #[test]
    fn stack_counts_are_checked() {
        assert!(HCode::Sum.check_count(2).is_ok());
        assert!(HCode::Sum.check_count(0).is_err());
        assert!(HCode::Properties.check_count(3).is_err());
        assert!(HCode::Properties.check_count(0).is_ok());
        assert!(HCode::FrameOf.check_count(3).is_err());
    }

    #[test]
    fn animate_count_hides_name() {
        assert!(HCode::Animate.check_count(4).is_ok());
        assert_eq!(
            HCode::Animate.check_count(2).unwrap_err(),
            ExecutionErrorKind::ArgumentCount {
                function: "animate",
                expected: "2 or 3",
                got: 1
            }
        );
    }

    #[test]
    fn property_operands_alternate() {
        assert_eq!(HCode::Properties.param_kind(0), Kind::Name);
        assert_eq!(HCode::Properties.param_kind(1), Kind::Value);
        assert_eq!(HCode::Properties.param_kind(2), Kind::Name);
    }

    #[test]
    fn returns_match_side_effects() {
        assert_eq!(HCode::Command(CommandKind::Axes).returns(), 0);
        assert_eq!(HCode::Assign.returns(), 0);
        assert_eq!(HCode::Add.returns(), 1);
    }

    // ===== Math tests =====

    #[test]
    fn math_functions() {
        assert_eq!(MathFn::from_name("sqrt"), Some(MathFn::Sqrt));
        assert_eq!(MathFn::from_name("boost"), None);
        assert_eq!(MathFn::Sqrt.apply(9.0).unwrap(), 3.0);
        assert!(MathFn::Sqrt.apply(-1.0).unwrap().is_nan());
        assert!((MathFn::Gamma.apply(0.6).unwrap() - 1.25).abs() < 1e-12);
        assert!(MathFn::Gamma.apply(1.0).is_err());
    }

    #[test]
    fn mnemonics() {
        assert_eq!(HCode::Function(MathFn::Cos).to_string(), "call cos");
        assert_eq!(HCode::Command(CommandKind::Event).to_string(), "cmd event");
        assert_eq!(HCode::StyleDefaults(StyleTarget::All).to_string(), "style all");
    }
}
