//! H-code: the stack machine that runs a parsed script.
//!
//! A [`Program`] is a flat list of literal operands and instructions. The
//! engine walks it with a data stack: literals are pushed, instructions pop
//! their operand window, check it and push their result (if any). The
//! program itself is never mutated, so it can be run again for every
//! animation frame or dynamic-variable change.
//!
//! Each run starts from a fresh base symbol table and a fresh copy of the
//! load-time [`ScriptConfig`]. Animation and dynamic variables live in
//! overlay tables that survive between runs: the script's declaration only
//! creates them the first time, after which the host drives their values.

pub mod datum;
pub mod instruction;
pub mod symbols;

use std::fmt;

pub use datum::{Datum, Kind, Properties};
pub use instruction::{Arity, HCode, MathFn, Runtime};
pub use symbols::{
    AnimationSymbolTable, AnimationVariable, DynamicSymbolTable, DynamicVariable, SymbolTable, Symbols,
};

use crate::errors::{ExecutionErrorKind, ProgrammingError, ScriptError, Span};
use crate::lcode::{LCodeEngine, ScriptConfig, Viewport};
use crate::log::{debug, trace};

/// An instruction and where it came from
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instruction {
    pub code: HCode,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HEntry {
    Data(Datum),
    Instruction(Instruction),
}

impl fmt::Display for HEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HEntry::Data(d) => write!(f, "{d}"),
            HEntry::Instruction(i) => write!(f, "{}", i.code),
        }
    }
}

/// Parser output
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub code: Vec<HEntry>,
    /// Declares at least one animation variable
    pub animated: bool,
    /// Declares at least one dynamic variable
    pub dynamic: bool,
}

impl Program {
    /// One entry per line, numbered
    pub fn disassemble(&self) -> String {
        self.code
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{i:04} {entry}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn instruction_count(&self) -> usize {
        self.code
            .iter()
            .filter(|e| matches!(e, HEntry::Instruction(_)))
            .count()
    }
}

pub struct HCodeEngine {
    program: Program,
    config: ScriptConfig,
    symbols: Symbols,
}

impl HCodeEngine {
    pub fn new(program: Program, config: ScriptConfig) -> Self {
        let symbols = Symbols::new(&config.colors);
        HCodeEngine {
            program,
            config,
            symbols,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn disassemble(&self) -> String {
        self.program.disassemble()
    }

    /// Run the whole program, rebuilding `lcode` from scratch
    pub fn execute(&mut self, lcode: &mut LCodeEngine) -> Result<(), ScriptError> {
        lcode.clear();
        let stack = self.run(lcode)?;
        if !stack.is_empty() {
            return Err(ProgrammingError::new(format!(
                "{} value(s) left on the stack after the last instruction",
                stack.len()
            ))
            .into());
        }
        lcode.apply_frame();
        debug!(
            instructions = self.program.instruction_count(),
            commands = lcode.commands().len(),
            "h-code run finished"
        );
        Ok(())
    }

    /// Run the program and return whatever is left on the stack. Commands
    /// go to a scratch L-code engine.
    pub fn evaluate(&mut self) -> Result<Vec<Datum>, ScriptError> {
        let mut scratch = LCodeEngine::new(Viewport::default())?;
        self.run(&mut scratch)
    }

    /// Move every animation variable to a 1-based logical frame
    pub fn set_animation_frame(&mut self, frame: usize) {
        trace!(frame, "animation frame");
        self.symbols.animation.set_frame(frame);
    }

    /// Change a dynamic variable; returns the value after clamping
    pub fn set_dynamic_value(&mut self, name: &str, value: f64) -> Result<f64, ExecutionErrorKind> {
        self.symbols.dynamic.set(name, value)
    }

    fn run(&mut self, lcode: &mut LCodeEngine) -> Result<Vec<Datum>, ScriptError> {
        let HCodeEngine {
            program,
            config,
            symbols,
        } = self;
        symbols.reset_base(&config.colors);
        let mut run_config = config.clone();
        let mut rt = Runtime {
            symbols,
            config: &mut run_config,
            lcode,
        };

        let mut stack = Vec::new();
        for entry in &program.code {
            match entry {
                HEntry::Data(datum) => stack.push(datum.clone()),
                HEntry::Instruction(ins) => step(ins.code, &mut stack, &mut rt).map_err(|e| e.at(ins.span))?,
            }
        }
        Ok(stack)
    }
}

fn step(code: HCode, stack: &mut Vec<Datum>, rt: &mut Runtime<'_>) -> Result<(), ScriptError> {
    let count = match code.arity() {
        Arity::Fixed(n) => n,
        Arity::Stack => match stack.pop() {
            Some(Datum::Count(n)) => {
                code.check_count(n)?;
                n
            }
            other => {
                return Err(ProgrammingError::new(format!(
                    "`{code}` expects an operand count on the stack, found {other:?}"
                ))
                .into());
            }
        },
    };
    if stack.len() < count {
        return Err(ProgrammingError::new(format!(
            "`{code}` needs {count} operand(s), stack holds {}",
            stack.len()
        ))
        .into());
    }

    let args = stack.split_off(stack.len() - count);
    for (i, arg) in args.iter().enumerate() {
        let kind = code.param_kind(i);
        if !kind.accepts(arg) {
            return Err(ExecutionErrorKind::TypeMismatch {
                expected: kind.name(),
                got: arg.kind_name(),
            }
            .into());
        }
    }
    trace!(%code, count, depth = stack.len(), "exec");
    let result = code.execute(args, rt)?;
    let produced = usize::from(result.is_some());
    if produced != code.returns() {
        return Err(ProgrammingError::new(format!(
            "`{code}` declares {} result(s) but produced {produced}",
            code.returns()
        ))
        .into());
    }
    stack.extend(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcode::CommandKind;

    fn ins(code: HCode) -> HEntry {
        HEntry::Instruction(Instruction {
            code,
            span: Span::new(0, 1, 1, 1),
        })
    }

    fn num(n: f64) -> HEntry {
        HEntry::Data(Datum::Number(n))
    }

    fn name(n: &str) -> HEntry {
        HEntry::Data(Datum::Name(n.into()))
    }

    fn engine(code: Vec<HEntry>) -> HCodeEngine {
        HCodeEngine::new(
            Program {
                code,
                ..Default::default()
            },
            ScriptConfig::default(),
        )
    }

    // ===== Stack machine tests =====

    #[test]
    fn stack_arity_consumes_exactly_the_operands() {
        let mut e = engine(vec![num(10.0), num(20.0), HEntry::Data(Datum::Count(2)), ins(HCode::Sum)]);
        assert_eq!(e.evaluate().unwrap(), vec![Datum::Number(30.0)]);
    }

    #[test]
    fn operands_below_window_are_untouched() {
        let mut e = engine(vec![
            num(1.0),
            num(10.0),
            num(20.0),
            HEntry::Data(Datum::Count(2)),
            ins(HCode::Max),
        ]);
        assert_eq!(e.evaluate().unwrap(), vec![Datum::Number(1.0), Datum::Number(20.0)]);
    }

    #[test]
    fn leftover_stack_is_a_programming_error() {
        let mut e = engine(vec![num(1.0)]);
        let mut lcode = LCodeEngine::new(Viewport::default()).unwrap();
        assert!(e.execute(&mut lcode).unwrap_err().is_programming());
    }

    #[test]
    fn missing_count_is_a_programming_error() {
        let mut e = engine(vec![num(1.0), num(2.0), ins(HCode::Sum)]);
        assert!(e.evaluate().unwrap_err().is_programming());
    }

    #[test]
    fn type_errors_carry_the_instruction_span() {
        let mut e = engine(vec![
            num(1.0),
            HEntry::Data(Datum::Str("x".into())),
            HEntry::Instruction(Instruction {
                code: HCode::Pow,
                span: Span::new(12, 3, 2, 5),
            }),
        ]);
        let err = e.evaluate().unwrap_err();
        assert_eq!(
            err.execution_kind(),
            Some(&ExecutionErrorKind::TypeMismatch {
                expected: "number",
                got: "string"
            })
        );
        match err {
            ScriptError::Execution(e) => assert_eq!(e.position, Some((2, 5))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn every_instruction_leaves_its_declared_results() {
        let program = crate::parse::parse(
            "style all [color: red];
             s = animate(0, 1, 3);
             v = dynamic(0.2, 0, 0.5);
             bob = observer [velocity: v, segments: [[acceleration: 1, tau: 1]]];
             f = frame(bob, 1);
             p = to_rest(f, (1, 2)) + lorentz((s, 1), 0.5) * 2 - (0, 1) / 2;
             q = -p;
             n = min(x(q), t(q), sum(1, 2)) ^ 2 + max(sqrt(4), velocity(bob, 0.5));
             event [location: event(bob, 0.5), label: \"e\" + n];
             path [points: [to_frame(f, p), q]];",
        )
        .unwrap();
        let mut e = HCodeEngine::new(program, ScriptConfig::default());
        assert_eq!(e.evaluate().unwrap(), Vec::<Datum>::new());
    }

    #[test]
    fn division_by_zero() {
        let mut e = engine(vec![num(1.0), num(0.0), ins(HCode::Div)]);
        assert_eq!(e.evaluate().unwrap_err().execution_kind(), Some(&ExecutionErrorKind::DivisionByZero));
    }

    // ===== Symbol tests =====

    #[test]
    fn assign_then_fetch() {
        let mut e = engine(vec![name("a"), num(4.0), ins(HCode::Assign), name("a"), ins(HCode::Fetch)]);
        assert_eq!(e.evaluate().unwrap(), vec![Datum::Number(4.0)]);
    }

    #[test]
    fn builtins_are_protected() {
        let mut e = engine(vec![name("pi"), num(3.0), ins(HCode::Assign)]);
        assert_eq!(
            e.evaluate().unwrap_err().execution_kind(),
            Some(&ExecutionErrorKind::ProtectedSymbol { name: "pi".into() })
        );
    }

    #[test]
    fn base_table_is_rebuilt_every_run() {
        let mut e = engine(vec![name("a"), ins(HCode::Fetch)]);
        assert!(e.evaluate().is_err());
        let mut e = engine(vec![name("a"), num(1.0), ins(HCode::Assign)]);
        e.evaluate().unwrap();
        e.evaluate().unwrap();
    }

    #[test]
    fn animation_variable_survives_reruns() {
        let mut e = engine(vec![
            name("s"),
            num(0.0),
            num(0.5),
            num(2.0),
            HEntry::Data(Datum::Count(4)),
            ins(HCode::Animate),
            name("s"),
            ins(HCode::Fetch),
        ]);
        assert_eq!(e.evaluate().unwrap(), vec![Datum::Number(0.0)]);
        e.set_animation_frame(3);
        assert_eq!(e.evaluate().unwrap(), vec![Datum::Number(1.0)]);
    }

    #[test]
    fn dynamic_variable_is_clamped_and_kept() {
        let mut e = engine(vec![
            name("v"),
            num(0.5),
            num(0.0),
            num(0.9),
            ins(HCode::Dynamic),
            name("v"),
            ins(HCode::Fetch),
        ]);
        e.evaluate().unwrap();
        assert_eq!(e.set_dynamic_value("v", 2.0).unwrap(), 0.9);
        assert_eq!(e.evaluate().unwrap(), vec![Datum::Number(0.9)]);
        assert!(e.set_dynamic_value("w", 1.0).is_err());
    }

    // ===== Command tests =====

    #[test]
    fn commands_reach_lcode() {
        let mut e = engine(vec![
            name("location"),
            num(1.0),
            num(2.0),
            ins(HCode::Coordinate),
            HEntry::Data(Datum::Count(2)),
            ins(HCode::Properties),
            ins(HCode::Command(CommandKind::Event)),
        ]);
        let mut lcode = LCodeEngine::new(Viewport::default()).unwrap();
        e.execute(&mut lcode).unwrap();
        e.execute(&mut lcode).unwrap();
        assert_eq!(lcode.commands().len(), 1);
        assert_eq!(lcode.commands()[0].kind, CommandKind::Event);
    }

    #[test]
    fn disassembly_listing() {
        let e = engine(vec![num(10.0), num(20.0), HEntry::Data(Datum::Count(2)), ins(HCode::Sum)]);
        insta::assert_snapshot!(e.disassemble(), @r"
        0000 10
        0001 20
        0002 #2
        0003 sum
        ");
    }
}
