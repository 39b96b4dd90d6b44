//! L-code: the drawing command list built by a script run.
//!
//! The H-code engine pushes one [`Built`] value per command statement.
//! Drawing commands are kept in order; `display`, `frame` and `animation`
//! are pinned settings where the last one issued wins. [`LCodeEngine::execute`]
//! replays the list onto a [`Canvas`] and may be called any number of times
//! for one run, e.g. after a pan or zoom.

pub mod canvas;
pub mod context;
pub mod defaults;
pub mod draw;
pub mod structs;
pub mod style;

pub use canvas::{Canvas, DrawOp, RecordingCanvas, Stroke, TextAnchor, TextStyle};
pub use context::{Context, Viewport};
pub use draw::{CommandStruct, Draw, Tick, format_tick, label_skip, tick_spacing};
pub use structs::{
    AnimationStruct, AxesStruct, Built, Command, CommandKind, Control, DisplayStruct, EventStruct, FrameStruct,
    GridStruct, HypergridStruct, LabelStruct, LineShape, LineStruct, PathStruct, WorldlineStruct,
};
pub use style::{ColorTable, ScriptConfig, StyleDefaults, StyleStruct, StyleTarget};

use crate::errors::ProgrammingError;
use crate::geometry::Frame;
use crate::log::{debug, trace};

pub struct LCodeEngine {
    commands: Vec<Command>,
    display: DisplayStruct,
    frame: Option<FrameStruct>,
    animation: Option<AnimationStruct>,
    viewport: Viewport,
    context: Context,
}

impl LCodeEngine {
    pub fn new(viewport: Viewport) -> Result<Self, ProgrammingError> {
        let context = Context::new(&viewport)?;
        Ok(LCodeEngine {
            commands: Vec::new(),
            display: DisplayStruct::default(),
            frame: None,
            animation: None,
            viewport,
            context,
        })
    }

    /// Forget everything from the previous run
    pub fn clear(&mut self) {
        self.commands.clear();
        self.display = DisplayStruct::default();
        self.frame = None;
        self.animation = None;
    }

    pub fn push(&mut self, built: Built) {
        match built {
            Built::Draw(command) => {
                trace!(kind = command.kind.name(), index = self.commands.len(), "push command");
                self.commands.push(command);
            }
            Built::Display(display) => self.display = display,
            Built::Frame(frame) => self.frame = Some(frame),
            Built::Animation(animation) => self.animation = Some(animation),
        }
    }

    /// Re-express every drawing command in the pinned frame. Called once
    /// at the end of a run.
    pub fn apply_frame(&mut self) {
        let Some(FrameStruct { frame }) = self.frame.clone() else {
            return;
        };
        if frame == Frame::REST {
            return;
        }
        debug!(%frame, count = self.commands.len(), "rebasing commands");
        for command in &mut self.commands {
            command.shape.rebase(&frame);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), ProgrammingError> {
        self.context = Context::new(&viewport)?;
        self.viewport = viewport;
        Ok(())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn display(&self) -> &DisplayStruct {
        &self.display
    }

    pub fn frame(&self) -> Option<&FrameStruct> {
        self.frame.as_ref()
    }

    pub fn animation(&self) -> Option<&AnimationStruct> {
        self.animation.as_ref()
    }

    /// Clear the canvas to the display background and draw every command
    pub fn execute(&self, canvas: &mut dyn Canvas) {
        canvas.clear(self.display.background);
        for command in &self.commands {
            command.shape.draw(&command.style, &self.context, canvas);
        }
    }
}
