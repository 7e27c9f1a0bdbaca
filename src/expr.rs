use std::{
    cmp::Ordering,
    fmt::{self, Display},
    io,
    rc::Rc,
};

use num_traits::ToPrimitive;

use crate::store::VariableStore;

#[derive(Debug, PartialEq, Clone)]
pub enum Val {
    String(Rc<str>),
    Num(f64),
}

impl Val {
    pub fn from_bool(b: bool) -> Val {
        Val::Num(if b { 1.0 } else { 0.0 })
    }

    /// Text that does not parse as a number counts as zero.
    pub fn as_number(&self) -> f64 {
        match self {
            Val::Num(x) => *x,
            Val::String(s) => parse_number(s).unwrap_or(0.0),
        }
    }

    pub fn as_text(&self) -> Rc<str> {
        match self {
            Val::String(s) => s.clone(),
            Val::Num(_) => self.to_string().into(),
        }
    }

    pub fn truthy(&self) -> bool {
        self.as_number() != 0.0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Val::String(_))
    }
}

/// Accepts the decimal shape of a number literal with an optional sign, plus
/// the renderings of the non-finite numbers.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    match s {
        "Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    let well_formed = digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if !well_formed {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::String(x) => write!(f, "{}", x),
            Self::Num(x) if x.is_nan() => write!(f, "NaN"),
            Self::Num(x) if x.is_infinite() => {
                write!(f, "{}", if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Num(x) if *x == 0.0 => write!(f, "0"),
            Self::Num(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Sign {
    Plus,
    Minus,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RelOp {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LogicOp {
    And,
    Or,
}

impl RelOp {
    fn holds(self, ord: Option<Ordering>) -> bool {
        // NaN compares as unordered: only `<>` holds.
        let Some(ord) = ord else {
            return self == RelOp::NotEqual;
        };
        match self {
            Self::Less => ord.is_lt(),
            Self::LessEqual => ord.is_le(),
            Self::Greater => ord.is_gt(),
            Self::GreaterEqual => ord.is_ge(),
            Self::Equal => ord.is_eq(),
            Self::NotEqual => ord.is_ne(),
        }
    }
}

impl Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
        })
    }
}

impl Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        })
    }
}

impl Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "<>",
        })
    }
}

impl Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

pub type ExprRef = Box<Expr>;

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Literal(Val),
    Variable(Rc<str>),
    Unary(Sign, ExprRef),
    Arithmetic(ArithOp, ExprRef, ExprRef),
    Relational(RelOp, ExprRef, ExprRef),
    Logical(LogicOp, ExprRef, ExprRef),
}

impl Expr {
    pub fn eval(&self, vars: &VariableStore) -> Result<Val, EvalError> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Variable(id) => {
                if !vars.is_defined(id) {
                    return Err(EvalError::UndefinedIdentifier(id.clone()));
                }
                Ok(vars.get_or_zero(id))
            }
            Self::Unary(Sign::Minus, x) => Ok(Val::Num(-x.eval(vars)?.as_number())),
            Self::Unary(Sign::Plus, x) => x.eval(vars),
            Self::Arithmetic(op, x, y) => {
                let l = x.eval(vars)?;
                let r = y.eval(vars)?;
                arithmetic(*op, l, r)
            }
            Self::Relational(op, x, y) => {
                let l = x.eval(vars)?;
                let r = y.eval(vars)?;
                let ord = if l.is_text() {
                    Some(l.as_text().cmp(&r.as_text()))
                } else {
                    l.as_number().partial_cmp(&r.as_number())
                };
                Ok(Val::from_bool(op.holds(ord)))
            }
            Self::Logical(op, x, y) => {
                // Both sides always run.
                let l = x.eval(vars)?.truthy();
                let r = y.eval(vars)?.truthy();
                Ok(Val::from_bool(match op {
                    LogicOp::And => l && r,
                    LogicOp::Or => l || r,
                }))
            }
        }
    }
}

/// Upper bound in bytes for the text produced by `text * count`.
pub const MAX_REPEAT_LEN: usize = 1 << 28;

fn repeat(text: &str, count: f64) -> Result<Val, EvalError> {
    let count = count.trunc();
    if count.is_nan() || count <= 0.0 {
        return Ok(Val::String("".into()));
    }
    match count.to_usize() {
        Some(n) if text.len().checked_mul(n).is_some_and(|len| len <= MAX_REPEAT_LEN) => {
            Ok(Val::String(text.repeat(n).into()))
        }
        _ => Err(EvalError::RepeatTooLarge(count)),
    }
}

fn arithmetic(op: ArithOp, l: Val, r: Val) -> Result<Val, EvalError> {
    let res = match (op, l) {
        (ArithOp::Mul, Val::String(a)) => return repeat(&a, r.as_number()),
        // Every other operator on text concatenates.
        (_, Val::String(a)) => {
            let mut c = a.to_string();
            c.push_str(&r.as_text());
            Val::String(c.into())
        }
        (ArithOp::Add, Val::Num(a)) => Val::Num(a + r.as_number()),
        (ArithOp::Sub, Val::Num(a)) => Val::Num(a - r.as_number()),
        (ArithOp::Mul, Val::Num(a)) => Val::Num(a * r.as_number()),
        (ArithOp::Div, Val::Num(a)) => Val::Num(a / r.as_number()),
    };
    Ok(res)
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(Val::String(s)) => write!(f, "\"{}\"", s.escape_debug()),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Variable(id) => write!(f, "{id}"),
            Self::Unary(op, x) => write!(f, "[{op} {x}]"),
            Self::Arithmetic(op, x, y) => write!(f, "[{x} {op} {y}]"),
            Self::Relational(op, x, y) => write!(f, "[{x} {op} {y}]"),
            Self::Logical(op, x, y) => write!(f, "[{x} {op} {y}]"),
        }
    }
}

#[derive(Debug)]
pub enum EvalError {
    UndefinedIdentifier(Rc<str>),
    LoopControlOutsideLoop(&'static str),
    RepeatTooLarge(f64),
    Io(io::Error),
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedIdentifier(id) => write!(f, "Undefined identifier '{id}'."),
            Self::LoopControlOutsideLoop(kw) => write!(f, "`{kw}` outside of a loop."),
            Self::RepeatTooLarge(n) => {
                write!(f, "Cannot repeat text {} times.", Val::Num(*n))
            }
            Self::Io(e) => write!(f, "Failed to write output: {e}"),
        }
    }
}

impl From<io::Error> for EvalError {
    fn from(value: io::Error) -> Self {
        EvalError::Io(value)
    }
}
