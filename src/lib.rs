//! Animated Minkowski spacetime diagrams.
//!
//! A script is parsed into H-code, a small stack-machine program. Running it
//! produces L-code, a list of drawing commands that is replayed onto any
//! [`Canvas`](lcode::Canvas). [`Diagram`] ties the two together and re-runs
//! the script when an animation frame or dynamic variable changes.

pub mod animation;
pub mod diagram;
pub mod errors;
pub mod geometry;
pub mod hcode;
pub mod lcode;
mod log;
pub mod parse;
pub mod relativity;
pub mod types;

use pest_derive::Parser;

pub use animation::{AnimationDriver, FrameModel, PlaybackState, StopHandle, Tick};
pub use diagram::Diagram;
pub use errors::{ExecutionError, ExecutionErrorKind, ParseError, ProgrammingError, ScriptError, SourceContext};
pub use lcode::{Canvas, RecordingCanvas, Viewport};
pub use parse::parse;
pub use types::{Color, Coordinate};

#[derive(Parser)]
#[grammar = "minkowski.pest"]
pub struct MinkowskiParser;

/// Load a script and draw it once.
///
/// Returns an error with a source snippet on failure.
pub fn render(name: &str, source: &str, viewport: Viewport, canvas: &mut dyn Canvas) -> Result<(), miette::Report> {
    let diagram = Diagram::load_with_viewport(name, source, viewport)
        .map_err(|e| e.into_report(&SourceContext::new(name, source)))?;
    diagram.render(canvas);
    Ok(())
}
