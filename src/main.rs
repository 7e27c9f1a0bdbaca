use std::{
    error::Error,
    fs,
    io::{self, stdin, IsTerminal},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use pastel::interpreter::{compile, InterpretErr, Interpreter};
use pastel::scanner::{scan, ScanErr};
use pastel::token::TokenType;
use rustyline::validate::{ValidationContext, ValidationResult};
use rustyline::{
    error::ReadlineError, Cmd, ConditionalEventHandler, Event, EventContext, EventHandler, KeyEvent,
    Movement, RepeatCount,
};
use rustyline::{Completer, Editor, Helper, Highlighter, Hinter, Validator};

/// Runs programs written in pastel, a small Pascal-flavoured scripting language.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the scanned tokens before running.
    #[arg(long)]
    tokens: bool,

    /// Print the parsed program tree before running.
    #[arg(long)]
    ast: bool,

    /// Program to run. Without one, stdin is read or a prompt is started.
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match &args.file {
        Some(path) => run_file(path, &args),
        None => run_prompt(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(code: &str, args: &Args, interpreter: &mut Interpreter) -> Result<(), InterpretErr> {
    if args.tokens {
        for token in scan(code)? {
            println!("{token}");
        }
    }

    let program = compile(code)?;
    if args.ast {
        println!("{program}");
    }

    interpreter.interpret(&program)?;
    Ok(())
}

fn run_file(path: &Path, args: &Args) -> Result<(), Box<dyn Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {e}", path.display()))?;
    let mut interpreter = Interpreter::new();
    run(&content, args, &mut interpreter)?;
    Ok(())
}

struct TabEventHandler;
impl ConditionalEventHandler for TabEventHandler {
    fn handle(&self, _: &Event, _n: RepeatCount, _: bool, _: &EventContext) -> Option<Cmd> {
        Some(Cmd::Indent(Movement::WholeLine))
    }
}

/// Keeps reading lines while a `begin` is unmatched or a `{` comment is open.
struct BlockValidator;

impl rustyline::validate::Validator for BlockValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let result = match scan(ctx.input()) {
            Err(ScanErr::UnterminatedComment { .. }) => ValidationResult::Incomplete,
            Err(_) => ValidationResult::Valid(None),
            Ok(tokens) => {
                let depth = tokens.iter().fold(0i64, |depth, tok| match tok.data {
                    TokenType::Begin => depth + 1,
                    TokenType::End => depth - 1,
                    _ => depth,
                });
                if depth > 0 {
                    ValidationResult::Incomplete
                } else {
                    ValidationResult::Valid(None)
                }
            }
        };
        Ok(result)
    }
}

#[derive(Helper, Completer, Hinter, Highlighter, Validator)]
struct PromptHelper {
    #[rustyline(Validator)]
    validator: BlockValidator,
}

fn run_prompt(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut interpreter = Interpreter::new();
    if !stdin().is_terminal() {
        let program = io::read_to_string(stdin().lock())?;
        run(&program, args, &mut interpreter)?;
        return Ok(());
    }

    let h = PromptHelper {
        validator: BlockValidator,
    };
    let mut rl = Editor::new()?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabEventHandler)),
    );

    loop {
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                if let Err(err) = run(&line, args, &mut interpreter) {
                    println!("error: {}", err);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => {
                break Err(Box::new(err));
            }
        }
    }
}
