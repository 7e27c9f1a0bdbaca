use crate::expr::{EvalError, ExprRef};
use crate::store::VariableStore;
use crate::trace::{trace_log, Phase};
use std::{
    fmt::{self, Display},
    io::Write,
    rc::Rc,
};

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Assign(Rc<str>, ExprRef),
    Write { expr: ExprRef, newline: bool },
    If(ExprRef, Box<Stmt>, Option<Box<Stmt>>),
    While(ExprRef, Box<Stmt>),
    RepeatUntil(Box<Stmt>, ExprRef),
    Block(Vec<Stmt>),
    Break,
    Continue,
}

/// How a statement finished. Only loops consume `Break` and `Continue`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Flow {
    Normal,
    Break,
    Continue,
}

pub struct Context<'a> {
    pub vars: &'a mut VariableStore,
    pub out: &'a mut dyn Write,
}

impl Stmt {
    pub fn exec(&self, ctx: &mut Context) -> Result<Flow, EvalError> {
        match self {
            Self::Assign(id, expr) => {
                let val = expr.eval(ctx.vars)?;
                trace_log!(Phase::Exec, "{id} := {val}");
                ctx.vars.set(id.clone(), val);
            }
            Self::Write { expr, newline } => {
                let val = expr.eval(ctx.vars)?;
                write!(ctx.out, "{}", val)?;
                if *newline {
                    writeln!(ctx.out)?;
                }
            }
            Self::If(cond, stmt, other) => {
                if cond.eval(ctx.vars)?.truthy() {
                    return stmt.exec(ctx);
                } else if let Some(other) = other {
                    return other.exec(ctx);
                }
            }
            Self::While(cond, body) => {
                let mut rounds = 0usize;
                while cond.eval(ctx.vars)?.truthy() {
                    rounds += 1;
                    if body.exec(ctx)? == Flow::Break {
                        break;
                    }
                }
                trace_log!(Phase::Exec, "while finished after {rounds} rounds");
            }
            Self::RepeatUntil(body, cond) => {
                let mut rounds = 0usize;
                loop {
                    rounds += 1;
                    if body.exec(ctx)? == Flow::Break {
                        break;
                    }
                    if cond.eval(ctx.vars)?.truthy() {
                        break;
                    }
                }
                trace_log!(Phase::Exec, "repeat finished after {rounds} rounds");
            }
            Self::Block(stmts) => {
                for stmt in stmts.iter() {
                    let flow = stmt.exec(ctx)?;
                    if flow != Flow::Normal {
                        return Ok(flow);
                    }
                }
            }
            Self::Break => return Ok(Flow::Break),
            Self::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Normal)
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign(id, expr) => write!(f, "{id} := {expr}"),
            Self::Write { expr, newline: true } => write!(f, "writeln {expr}"),
            Self::Write { expr, newline: false } => write!(f, "write {expr}"),
            Self::If(cond, stmt, other) => {
                write!(f, "if {cond} then {stmt}")?;
                if let Some(other) = other {
                    write!(f, "\nelse {other}")?;
                }
                Ok(())
            }
            Self::While(cond, body) => write!(f, "while {cond} do {body}"),
            Self::RepeatUntil(body, cond) => write!(f, "repeat {body} until {cond}"),
            Self::Block(stmts) => {
                writeln!(f, "begin")?;
                for stmt in stmts {
                    writeln!(f, "{stmt}")?;
                }
                write!(f, "end")
            }
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
        }
    }
}
