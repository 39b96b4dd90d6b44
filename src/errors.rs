//! Error types with rich diagnostics using miette
//!
//! Script failures come in three kinds: execution errors (the script is
//! wrong), programming errors (the engine is wrong) and everything else.
//! Parse errors are reported separately because they happen before any
//! H-code exists.

use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Location of an instruction in the script source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first character
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            len,
            line,
            column,
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.offset, span.len).into()
    }
}

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the script (filename or "<input>")
    pub name: String,
    /// The full script text
    pub source: Arc<str>,
}

impl SourceContext {
    pub fn new(name: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.to_string())
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors raised while turning script text into H-code
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("syntax error: {message}")]
    #[diagnostic(code(minkowski::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("invalid number: {text}")]
    #[diagnostic(code(minkowski::parse::invalid_number))]
    InvalidNumber {
        text: String,
        #[label("not a number")]
        span: SourceSpan,
    },

    #[error("unknown function: {name}")]
    #[diagnostic(code(minkowski::parse::unknown_function))]
    UnknownFunction {
        name: String,
        #[label("no such function")]
        span: SourceSpan,
    },

    #[error("`{name}(...)` declares a variable and must be assigned directly")]
    #[diagnostic(
        code(minkowski::parse::misplaced_declaration),
        help("write `name = {name}(...);`")
    )]
    MisplacedDeclaration {
        name: String,
        #[label("used inside an expression")]
        span: SourceSpan,
    },

    #[error("`{name}` expects {expected} argument(s), got {got}")]
    #[diagnostic(code(minkowski::parse::argument_count))]
    ArgumentCount {
        name: String,
        expected: String,
        got: usize,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("unknown style target: {name}")]
    #[diagnostic(code(minkowski::parse::unknown_style_target))]
    UnknownStyleTarget {
        name: String,
        #[label("not a command kind")]
        span: SourceSpan,
    },
}

// ============================================================================
// Execution Errors
// ============================================================================

/// What went wrong in a user script
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionErrorKind {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("cannot assign to protected symbol `{name}`")]
    ProtectedSymbol { name: String },

    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String },

    #[error("{command}: unknown property `{property}`")]
    UnknownProperty {
        command: &'static str,
        property: String,
    },

    #[error("{command}: missing required property `{property}`")]
    MissingProperty {
        command: &'static str,
        property: &'static str,
    },

    #[error("{command}: property `{property}` {reason}")]
    OutOfRange {
        command: &'static str,
        property: String,
        reason: String,
    },

    #[error("velocity {velocity} is not slower than light")]
    Superluminal { velocity: f64 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("`{function}` expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("`{function}`: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },

    #[error("unknown dynamic variable `{name}`")]
    UnknownVariable { name: String },
}

/// A user script error, attributed to the instruction that raised it
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{kind}")]
#[diagnostic(code(minkowski::execution))]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    #[label("{kind}")]
    pub span: Option<SourceSpan>,
    /// 1-based (line, column) of the failing instruction
    pub position: Option<(usize, usize)>,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind) -> Self {
        Self {
            kind,
            span: None,
            position: None,
        }
    }

    /// Attach a location unless one is already present
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.into());
            self.position = Some((span.line, span.column));
        }
        self
    }

    pub fn line(&self) -> Option<usize> {
        self.position.map(|(line, _)| line)
    }
}

impl From<ExecutionErrorKind> for ExecutionError {
    fn from(kind: ExecutionErrorKind) -> Self {
        Self::new(kind)
    }
}

// ============================================================================
// Programming Errors
// ============================================================================

/// An internal invariant was violated
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("internal error: {message}")]
#[diagnostic(
    code(minkowski::internal),
    help("this should not happen, please report it")
)]
pub struct ProgrammingError {
    pub message: String,
}

impl ProgrammingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Top-level
// ============================================================================

/// Everything a load, run or redraw can fail with
#[derive(Error, Diagnostic, Debug)]
pub enum ScriptError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Programming(#[from] ProgrammingError),

    #[error("{message}")]
    #[diagnostic(code(minkowski::other))]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ScriptError {
    /// Wrap a collaborator failure
    pub fn other(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ScriptError::Other {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Re-tag an execution error with the location of the current instruction
    pub fn at(self, span: Span) -> Self {
        match self {
            ScriptError::Execution(e) => ScriptError::Execution(e.at(span)),
            other => other,
        }
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, ScriptError::Execution(_))
    }

    pub fn is_programming(&self) -> bool {
        matches!(self, ScriptError::Programming(_))
    }

    /// The execution error kind, if this is a user script error
    pub fn execution_kind(&self) -> Option<&ExecutionErrorKind> {
        match self {
            ScriptError::Execution(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Attach the script text so the host can print a source snippet
    pub fn into_report(self, source: &SourceContext) -> miette::Report {
        miette::Report::new(self).with_source_code(source.named_source())
    }
}

impl From<ExecutionErrorKind> for ScriptError {
    fn from(kind: ExecutionErrorKind) -> Self {
        ScriptError::Execution(ExecutionError::new(kind))
    }
}
