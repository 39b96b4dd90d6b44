//! Values that live on the H-code data stack

use std::fmt;
use std::sync::Arc;

use crate::errors::ExecutionErrorKind;
use crate::geometry::{Frame, Observer};
use crate::types::{Color, Coordinate};

/// A literal operand or an instruction result
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Number(f64),
    /// Operand count for a stack-arity instruction
    Count(usize),
    Bool(bool),
    Str(String),
    /// A symbol name, consumed by Fetch/Assign and friends
    Name(String),
    Coordinate(Coordinate),
    Color(Color),
    Frame(Frame),
    Observer(Arc<Observer>),
    Properties(Properties),
    Array(Vec<Datum>),
}

/// Type tags used to check an instruction's operand window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Number,
    Count,
    Bool,
    Str,
    Name,
    Coordinate,
    Color,
    Frame,
    Observer,
    Properties,
    Array,
    /// Anything except a Count or a Name
    Value,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Number => "number",
            Kind::Count => "count",
            Kind::Bool => "boolean",
            Kind::Str => "string",
            Kind::Name => "name",
            Kind::Coordinate => "coordinate",
            Kind::Color => "color",
            Kind::Frame => "frame",
            Kind::Observer => "observer",
            Kind::Properties => "property list",
            Kind::Array => "array",
            Kind::Value => "value",
        }
    }

    pub fn accepts(self, datum: &Datum) -> bool {
        match self {
            Kind::Value => !matches!(datum, Datum::Count(_) | Datum::Name(_)),
            kind => datum.kind() == kind,
        }
    }
}

impl Datum {
    pub fn kind(&self) -> Kind {
        match self {
            Datum::Number(_) => Kind::Number,
            Datum::Count(_) => Kind::Count,
            Datum::Bool(_) => Kind::Bool,
            Datum::Str(_) => Kind::Str,
            Datum::Name(_) => Kind::Name,
            Datum::Coordinate(_) => Kind::Coordinate,
            Datum::Color(_) => Kind::Color,
            Datum::Frame(_) => Kind::Frame,
            Datum::Observer(_) => Kind::Observer,
            Datum::Properties(_) => Kind::Properties,
            Datum::Array(_) => Kind::Array,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    fn mismatch(&self, expected: Kind) -> ExecutionErrorKind {
        ExecutionErrorKind::TypeMismatch {
            expected: expected.name(),
            got: self.kind_name(),
        }
    }

    pub fn as_number(&self) -> Result<f64, ExecutionErrorKind> {
        match self {
            Datum::Number(n) => Ok(*n),
            other => Err(other.mismatch(Kind::Number)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ExecutionErrorKind> {
        match self {
            Datum::Bool(b) => Ok(*b),
            other => Err(other.mismatch(Kind::Bool)),
        }
    }

    pub fn as_str(&self) -> Result<&str, ExecutionErrorKind> {
        match self {
            Datum::Str(s) => Ok(s),
            other => Err(other.mismatch(Kind::Str)),
        }
    }

    pub fn as_name(&self) -> Result<&str, ExecutionErrorKind> {
        match self {
            Datum::Name(s) => Ok(s),
            other => Err(other.mismatch(Kind::Name)),
        }
    }

    pub fn as_coordinate(&self) -> Result<Coordinate, ExecutionErrorKind> {
        match self {
            Datum::Coordinate(c) => Ok(*c),
            other => Err(other.mismatch(Kind::Coordinate)),
        }
    }

    pub fn as_color(&self) -> Result<Color, ExecutionErrorKind> {
        match self {
            Datum::Color(c) => Ok(*c),
            other => Err(other.mismatch(Kind::Color)),
        }
    }

    pub fn as_frame(&self) -> Result<Frame, ExecutionErrorKind> {
        match self {
            Datum::Frame(f) => Ok(*f),
            other => Err(other.mismatch(Kind::Frame)),
        }
    }

    pub fn as_observer(&self) -> Result<&Arc<Observer>, ExecutionErrorKind> {
        match self {
            Datum::Observer(o) => Ok(o),
            other => Err(other.mismatch(Kind::Observer)),
        }
    }

    pub fn as_properties(&self) -> Result<&Properties, ExecutionErrorKind> {
        match self {
            Datum::Properties(p) => Ok(p),
            other => Err(other.mismatch(Kind::Properties)),
        }
    }

    pub fn as_array(&self) -> Result<&[Datum], ExecutionErrorKind> {
        match self {
            Datum::Array(items) => Ok(items),
            other => Err(other.mismatch(Kind::Array)),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Number(n) => write!(f, "{n}"),
            Datum::Count(n) => write!(f, "#{n}"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Str(s) => write!(f, "{s:?}"),
            Datum::Name(s) => write!(f, "'{s}"),
            Datum::Coordinate(c) => write!(f, "{c}"),
            Datum::Color(c) => write!(f, "{c}"),
            Datum::Frame(fr) => write!(f, "{fr}"),
            Datum::Observer(o) => write!(f, "observer({} segments)", o.segments().len()),
            Datum::Properties(p) => write!(f, "{p}"),
            Datum::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An ordered `name: value` list handed to commands and constructors
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, Datum)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same name win
    pub fn insert(&mut self, name: impl Into<String>, value: Datum) {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Datum)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, Datum)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (name, value) in iter {
            props.insert(name, value);
        }
        props
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kind_rejects_internal_operands() {
        assert!(Kind::Value.accepts(&Datum::Number(1.0)));
        assert!(Kind::Value.accepts(&Datum::Str("x".into())));
        assert!(!Kind::Value.accepts(&Datum::Count(2)));
        assert!(!Kind::Value.accepts(&Datum::Name("x".into())));
        assert!(Kind::Number.accepts(&Datum::Number(0.0)));
        assert!(!Kind::Number.accepts(&Datum::Bool(true)));
    }

    #[test]
    fn accessor_reports_type_mismatch() {
        let err = Datum::Str("hi".into()).as_number().unwrap_err();
        assert_eq!(
            err,
            ExecutionErrorKind::TypeMismatch {
                expected: "number",
                got: "string"
            }
        );
    }

    #[test]
    fn properties_last_write_wins() {
        let mut props = Properties::new();
        props.insert("x", Datum::Number(1.0));
        props.insert("t", Datum::Number(2.0));
        props.insert("x", Datum::Number(3.0));
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("x"), Some(&Datum::Number(3.0)));
        assert_eq!(props.to_string(), "[t: 2, x: 3]");
    }

    #[test]
    fn display_forms() {
        assert_eq!(Datum::Count(3).to_string(), "#3");
        assert_eq!(Datum::Name("v".into()).to_string(), "'v");
        assert_eq!(Datum::Str("a b".into()).to_string(), "\"a b\"");
        let arr = Datum::Array(vec![Datum::Number(1.5), Datum::Bool(false)]);
        assert_eq!(arr.to_string(), "[1.5, false]");
    }
}
