//! Compile pest pairs straight into H-code
//!
//! There is no intermediate AST: every rule emits its operands and then
//! the instruction that consumes them, so the output is already in the
//! postfix order the stack machine runs.

use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};

use crate::errors::{ParseError, Span};
use crate::hcode::{Datum, HCode, HEntry, Instruction, MathFn, Program};
use crate::lcode::{CommandKind, StyleTarget};
use crate::log::debug;
use crate::{MinkowskiParser, Rule};

/// Parse script source into an H-code program
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let pairs = MinkowskiParser::parse(Rule::program, source).map_err(syntax_error)?;

    let mut out = Emitter::default();
    for pair in pairs {
        if pair.as_rule() == Rule::program {
            for inner in pair.into_inner() {
                parse_statement(inner, &mut out)?;
            }
        }
    }

    let program = out.program;
    debug!(
        entries = program.code.len(),
        animated = program.animated,
        dynamic = program.dynamic,
        "parsed script"
    );
    Ok(program)
}

#[derive(Default)]
struct Emitter {
    program: Program,
}

impl Emitter {
    fn data(&mut self, datum: Datum) {
        self.program.code.push(HEntry::Data(datum));
    }

    fn name(&mut self, pair: &Pair<Rule>) {
        self.data(Datum::Name(pair.as_str().to_string()));
    }

    fn count(&mut self, n: usize) {
        self.data(Datum::Count(n));
    }

    fn op(&mut self, code: HCode, pair: &Pair<Rule>) {
        self.program.code.push(HEntry::Instruction(Instruction {
            code,
            span: span_of(pair),
        }));
    }
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    Span::new(span.start(), span.end() - span.start(), line, column)
}

fn syntax_error(err: pest::error::Error<Rule>) -> ParseError {
    let (offset, len) = match err.location {
        InputLocation::Pos(p) => (p, 0),
        InputLocation::Span((start, end)) => (start, end - start),
    };
    let err = err.renamed_rules(|rule| rule_name(*rule).to_string());
    ParseError::Syntax {
        message: err.variant.message().into_owned(),
        span: (offset, len).into(),
    }
}

fn rule_name(rule: Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::ident => "name",
        Rule::number => "number",
        Rule::string => "string",
        Rule::expr | Rule::term | Rule::factor | Rule::power => "expression",
        Rule::prop_list => "property list",
        Rule::property => "property",
        Rule::add_op | Rule::mul_op => "operator",
        _ => "token",
    }
}

fn unexpected(pair: &Pair<Rule>) -> ParseError {
    ParseError::Syntax {
        message: format!("unexpected {:?}", pair.as_rule()),
        span: span_of(pair).into(),
    }
}

/// Next child of `parent`; the grammar guarantees it, so a miss is reported
/// against the parent
fn child<'i>(inner: &mut Pairs<'i, Rule>, parent: &Pair<'i, Rule>) -> Result<Pair<'i, Rule>, ParseError> {
    inner.next().ok_or_else(|| ParseError::Syntax {
        message: format!("incomplete {:?}", parent.as_rule()),
        span: span_of(parent).into(),
    })
}

fn parse_statement(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    match pair.as_rule() {
        Rule::assignment => parse_assignment(pair, out),
        Rule::command => parse_command(pair, out),
        Rule::style_stmt => parse_style(pair, out),
        Rule::EOI => Ok(()),
        _ => Err(unexpected(&pair)),
    }
}

fn parse_assignment(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    let name = child(&mut inner, &pair)?;
    let value = child(&mut inner, &pair)?;

    out.name(&name);
    if let Some(call) = declaration(&value) {
        return parse_declaration(call, out);
    }
    parse_expr(value, out)?;
    out.op(HCode::Assign, &pair);
    Ok(())
}

/// The call node when an expression is nothing but `animate(...)` or
/// `dynamic(...)`
fn declaration<'i>(expr: &Pair<'i, Rule>) -> Option<Pair<'i, Rule>> {
    let mut node = expr.clone();
    loop {
        match node.as_rule() {
            Rule::call => {
                let name = node.clone().into_inner().next()?;
                return matches!(name.as_str(), "animate" | "dynamic").then_some(node);
            }
            Rule::expr | Rule::term | Rule::factor | Rule::power => {
                let mut inner = node.into_inner();
                let only = inner.next()?;
                if inner.next().is_some() {
                    return None;
                }
                node = only;
            }
            _ => return None,
        }
    }
}

fn parse_declaration(call: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = call.clone().into_inner();
    let name = child(&mut inner, &call)?;
    let args: Vec<_> = inner.collect();

    let (code, accepted, expected) = match name.as_str() {
        "animate" => (HCode::Animate, (2..=3).contains(&args.len()), "2 or 3"),
        _ => (HCode::Dynamic, args.len() == 3, "3"),
    };
    if !accepted {
        return Err(ParseError::ArgumentCount {
            name: name.as_str().to_string(),
            expected: expected.to_string(),
            got: args.len(),
            span: span_of(&call).into(),
        });
    }

    let count = args.len();
    for arg in args {
        parse_expr(arg, out)?;
    }
    if code == HCode::Animate {
        out.count(count + 1);
        out.program.animated = true;
    } else {
        out.program.dynamic = true;
    }
    out.op(code, &call);
    Ok(())
}

fn parse_command(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    let name = child(&mut inner, &pair)?;
    let props = child(&mut inner, &pair)?;

    let kind = CommandKind::from_name(name.as_str()).ok_or_else(|| ParseError::Syntax {
        message: format!("unknown command `{}`", name.as_str()),
        span: span_of(&name).into(),
    })?;
    parse_prop_list(props, out)?;
    out.op(HCode::Command(kind), &pair);
    Ok(())
}

fn parse_style(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    let _keyword = child(&mut inner, &pair)?;
    let target = child(&mut inner, &pair)?;
    let props = child(&mut inner, &pair)?;

    let target_kind = StyleTarget::from_name(target.as_str()).ok_or_else(|| ParseError::UnknownStyleTarget {
        name: target.as_str().to_string(),
        span: span_of(&target).into(),
    })?;
    parse_prop_list(props, out)?;
    out.op(HCode::StyleDefaults(target_kind), &pair);
    Ok(())
}

fn parse_prop_list(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut count = 0;
    for property in pair.clone().into_inner() {
        let mut inner = property.clone().into_inner();
        let key = child(&mut inner, &property)?;
        let value = child(&mut inner, &property)?;
        out.name(&key);
        parse_expr(value, out)?;
        count += 2;
    }
    out.count(count);
    out.op(HCode::Properties, &pair);
    Ok(())
}

fn parse_expr(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    match pair.as_rule() {
        Rule::expr | Rule::term => parse_binary(pair, out),
        Rule::factor => parse_factor(pair, out),
        Rule::power => parse_power(pair, out),
        _ => parse_primary(pair, out),
    }
}

/// `operand (op operand)*`, left associative
fn parse_binary(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    parse_expr(child(&mut inner, &pair)?, out)?;
    while let Some(op) = inner.next() {
        let rhs = child(&mut inner, &pair)?;
        parse_expr(rhs, out)?;
        let code = match op.as_str() {
            "+" => HCode::Add,
            "-" => HCode::Sub,
            "*" => HCode::Mul,
            "/" => HCode::Div,
            _ => return Err(unexpected(&op)),
        };
        out.op(code, &op);
    }
    Ok(())
}

fn parse_factor(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    let first = child(&mut inner, &pair)?;
    if first.as_rule() != Rule::neg {
        return parse_expr(first, out);
    }

    let operand = child(&mut inner, &pair)?;
    // `-2` is a literal, not a negation
    if let Some(number) = bare_number(&operand) {
        let value = parse_number(&number)?;
        out.data(Datum::Number(-value));
        return Ok(());
    }
    parse_expr(operand, out)?;
    out.op(HCode::Negate, &first);
    Ok(())
}

fn bare_number<'i>(power: &Pair<'i, Rule>) -> Option<Pair<'i, Rule>> {
    let mut inner = power.clone().into_inner();
    let only = inner.next()?;
    (inner.next().is_none() && only.as_rule() == Rule::number).then_some(only)
}

/// `base ^ exponent`, right associative through the grammar
fn parse_power(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    parse_expr(child(&mut inner, &pair)?, out)?;
    if let Some(exponent) = inner.next() {
        parse_expr(exponent, out)?;
        out.op(HCode::Pow, &pair);
    }
    Ok(())
}

fn parse_primary(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    match pair.as_rule() {
        Rule::number => {
            let value = parse_number(&pair)?;
            out.data(Datum::Number(value));
        }
        Rule::string => {
            let text = pair.clone().into_inner().next().map(|p| p.as_str()).unwrap_or("");
            out.data(Datum::Str(unescape(text)));
        }
        Rule::ident => {
            out.name(&pair);
            out.op(HCode::Fetch, &pair);
        }
        Rule::paren => {
            let mut inner = pair.clone().into_inner();
            parse_expr(child(&mut inner, &pair)?, out)?;
        }
        Rule::coordinate => {
            let mut inner = pair.clone().into_inner();
            parse_expr(child(&mut inner, &pair)?, out)?;
            parse_expr(child(&mut inner, &pair)?, out)?;
            out.op(HCode::Coordinate, &pair);
        }
        Rule::prop_list => parse_prop_list(pair, out)?,
        Rule::array => {
            let mut count = 0;
            for item in pair.clone().into_inner() {
                parse_expr(item, out)?;
                count += 1;
            }
            out.count(count);
            out.op(HCode::Array, &pair);
        }
        Rule::observer_ctor => {
            let mut inner = pair.clone().into_inner();
            let _keyword = child(&mut inner, &pair)?;
            parse_prop_list(child(&mut inner, &pair)?, out)?;
            out.op(HCode::Observer, &pair);
        }
        Rule::call => parse_call(pair, out)?,
        _ => return Err(unexpected(&pair)),
    }
    Ok(())
}

fn parse_number(pair: &Pair<Rule>) -> Result<f64, ParseError> {
    pair.as_str().parse().map_err(|_| ParseError::InvalidNumber {
        text: pair.as_str().to_string(),
        span: span_of(pair).into(),
    })
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// How a named function maps onto H-code
enum Callee {
    /// Exactly `n` arguments
    Fixed(HCode, usize),
    /// Argument count is pushed as a `Count`
    Counted(HCode, usize, usize),
}

fn callee(name: &str) -> Option<Callee> {
    if let Some(f) = MathFn::from_name(name) {
        return Some(Callee::Fixed(HCode::Function(f), 1));
    }
    Some(match name {
        "min" => Callee::Counted(HCode::Min, 1, usize::MAX),
        "max" => Callee::Counted(HCode::Max, 1, usize::MAX),
        "sum" => Callee::Counted(HCode::Sum, 1, usize::MAX),
        "boost" => Callee::Counted(HCode::FrameOf, 1, 1),
        "frame" => Callee::Counted(HCode::FrameOf, 1, 2),
        "to_frame" => Callee::Fixed(HCode::ToFrame, 2),
        "to_rest" => Callee::Fixed(HCode::ToRest, 2),
        "lorentz" => Callee::Fixed(HCode::Lorentz, 2),
        "x" => Callee::Fixed(HCode::XOf, 1),
        "t" => Callee::Fixed(HCode::TOf, 1),
        "event" => Callee::Fixed(HCode::EventAt, 2),
        "velocity" => Callee::Fixed(HCode::VelocityAt, 2),
        _ => return None,
    })
}

fn parse_call(pair: Pair<Rule>, out: &mut Emitter) -> Result<(), ParseError> {
    let mut inner = pair.clone().into_inner();
    let name = child(&mut inner, &pair)?;
    let args: Vec<_> = inner.collect();

    if matches!(name.as_str(), "animate" | "dynamic") {
        return Err(ParseError::MisplacedDeclaration {
            name: name.as_str().to_string(),
            span: span_of(&pair).into(),
        });
    }
    let callee = callee(name.as_str()).ok_or_else(|| ParseError::UnknownFunction {
        name: name.as_str().to_string(),
        span: span_of(&name).into(),
    })?;

    let (code, min, max) = match callee {
        Callee::Fixed(code, n) => (code, n, n),
        Callee::Counted(code, min, max) => (code, min, max),
    };
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(ParseError::ArgumentCount {
            name: name.as_str().to_string(),
            expected,
            got: args.len(),
            span: span_of(&pair).into(),
        });
    }

    let count = args.len();
    for arg in args {
        parse_expr(arg, out)?;
    }
    if matches!(callee, Callee::Counted(..)) {
        out.count(count);
    }
    out.op(code, &pair);
    Ok(())
}
