use crate::expr::{EvalError, Val};
use crate::parser::{ParseErr, Parser};
use crate::scanner::{scan, ScanErr};
use crate::statement::{Context, Flow, Stmt};
use crate::store::VariableStore;
use std::{
    fmt::{self, Display},
    io::{self, Stdout, Write},
};

#[derive(Debug)]
pub enum InterpretErr {
    Scan(ScanErr),
    Parse(ParseErr),
    Eval(EvalError),
}

impl Display for InterpretErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Eval(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for InterpretErr {}

impl From<ScanErr> for InterpretErr {
    fn from(value: ScanErr) -> Self {
        InterpretErr::Scan(value)
    }
}

impl From<ParseErr> for InterpretErr {
    fn from(value: ParseErr) -> Self {
        InterpretErr::Parse(value)
    }
}

impl From<EvalError> for InterpretErr {
    fn from(value: EvalError) -> Self {
        InterpretErr::Eval(value)
    }
}

/// Scans and parses a whole program into its root block.
pub fn compile(code: &str) -> Result<Stmt, InterpretErr> {
    let tokens = scan(code)?;
    Ok(Parser::new(&tokens).parse()?)
}

pub struct Interpreter<W: Write = Stdout> {
    vars: VariableStore,
    out: W,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_output(io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        Interpreter {
            vars: VariableStore::new(),
            out,
        }
    }

    pub fn run(&mut self, code: &str) -> Result<(), InterpretErr> {
        let program = compile(code)?;
        self.interpret(&program)?;
        Ok(())
    }

    /// Executes an already parsed program against this interpreter's variables.
    pub fn interpret(&mut self, program: &Stmt) -> Result<(), EvalError> {
        let mut ctx = Context {
            vars: &mut self.vars,
            out: &mut self.out,
        };
        let flow = program.exec(&mut ctx);
        self.out.flush()?;
        match flow? {
            Flow::Normal => Ok(()),
            Flow::Break => Err(EvalError::LoopControlOutsideLoop("break")),
            Flow::Continue => Err(EvalError::LoopControlOutsideLoop("continue")),
        }
    }

    pub fn get_global(&self, id: &str) -> Option<Val> {
        self.vars.get(id)
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
