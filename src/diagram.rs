//! A loaded script and the engines that run it
//!
//! [`Diagram`] is what a host holds on to: it owns the parsed program, the
//! per-load configuration and the current drawing command list. Anything
//! that changes what the script computes (an animation frame, a dynamic
//! variable) re-runs the H-code; anything that only changes what is visible
//! (the viewport) just redraws.

use crate::animation::{AnimationDriver, FrameModel};
use crate::errors::{ScriptError, SourceContext};
use crate::hcode::{DynamicVariable, HCodeEngine, Program};
use crate::lcode::{Canvas, LCodeEngine, ScriptConfig, Viewport};
use crate::log::debug;
use crate::parse::parse;

pub struct Diagram {
    source: SourceContext,
    hcode: HCodeEngine,
    lcode: LCodeEngine,
}

impl Diagram {
    /// Parse and run a script in the default viewport
    pub fn load(name: &str, source: &str) -> Result<Diagram, ScriptError> {
        Diagram::load_with_viewport(name, source, Viewport::default())
    }

    /// Parse and run a script. The script's `display` settings override the
    /// matching fields of `viewport`.
    pub fn load_with_viewport(name: &str, source: &str, viewport: Viewport) -> Result<Diagram, ScriptError> {
        let program = parse(source)?;
        let mut hcode = HCodeEngine::new(program, ScriptConfig::default());
        let mut lcode = LCodeEngine::new(viewport)?;
        hcode.execute(&mut lcode)?;

        let display = lcode.display().clone();
        let mut seeded = viewport;
        if let Some(scale) = display.scale {
            seeded.scale = scale;
        }
        if let Some(center) = display.center {
            seeded.center = center;
        }
        if let Some(rotation) = display.rotation {
            seeded.rotation = rotation.to_radians();
        }
        if seeded != viewport {
            lcode.set_viewport(seeded)?;
        }

        debug!(name, commands = lcode.commands().len(), "loaded diagram");
        Ok(Diagram {
            source: SourceContext::new(name, source),
            hcode,
            lcode,
        })
    }

    pub fn source(&self) -> &SourceContext {
        &self.source
    }

    pub fn program(&self) -> &Program {
        self.hcode.program()
    }

    pub fn disassemble(&self) -> String {
        self.hcode.disassemble()
    }

    pub fn lcode(&self) -> &LCodeEngine {
        &self.lcode
    }

    pub fn viewport(&self) -> &Viewport {
        self.lcode.viewport()
    }

    /// Draw the current command list
    pub fn render(&self, canvas: &mut dyn Canvas) {
        self.lcode.execute(canvas);
    }

    /// Pan, zoom, resize or rotate. No re-run is needed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), ScriptError> {
        self.lcode.set_viewport(viewport)?;
        Ok(())
    }

    /// Move the animation to a 1-based logical frame and re-run
    pub fn show_frame(&mut self, frame: usize) -> Result<(), ScriptError> {
        self.hcode.set_animation_frame(frame);
        self.hcode.execute(&mut self.lcode)
    }

    /// Change a dynamic variable and re-run. Returns the value actually
    /// used after clamping to the variable's range.
    pub fn set_dynamic(&mut self, name: &str, value: f64) -> Result<f64, ScriptError> {
        let value = self.hcode.set_dynamic_value(name, value)?;
        self.hcode.execute(&mut self.lcode)?;
        Ok(value)
    }

    /// The host-adjustable variables, for building sliders
    pub fn dynamic_variables(&self) -> impl Iterator<Item = (&str, &DynamicVariable)> {
        self.hcode.symbols().dynamic.iter()
    }

    pub fn is_animated(&self) -> bool {
        self.hcode.program().animated
    }

    /// A playback driver for this script's animation, `None` when the
    /// script declares no animation variables
    pub fn animation_driver(&self) -> Option<AnimationDriver> {
        if !self.is_animated() {
            return None;
        }
        let settings = self.lcode.animation().cloned().unwrap_or_default();
        let model = FrameModel::new(&self.hcode.symbols().animation, &settings);
        Some(AnimationDriver::new(model, settings.speed))
    }

    /// Turn an error from this diagram into a report with a source snippet
    pub fn report(&self, err: ScriptError) -> miette::Report {
        err.into_report(&self.source)
    }
}
