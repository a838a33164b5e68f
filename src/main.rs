use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser as ClapParser;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use glint::diagnostics::Session;
use glint::{print_tokens, run, scan};

/// `glint` — a small tree-walking interpreter.
///
/// Invocation shapes:
///   glint                 interactive REPL
///   glint PATH            run a file in the `parse` phase
///   glint PHASE PATH      `scan` (print tokens) or `parse` (run)
#[derive(ClapParser)]
#[command(name = "glint", version, about)]
struct Cli {
    /// Raise log verbosity (repeatable). Does not affect program output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Positional arguments; dispatched on count rather than declared
    /// arity, since usage errors must exit with code 64, not clap's own
    /// code.
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init().ok();

    match dispatch(&cli.args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(64)
        }
    }
}

fn dispatch(args: &[String]) -> Result<ExitCode, CliError> {
    match args {
        [] => Ok(run_repl()),
        [path] => Ok(run_file("parse", path)?),
        [phase, path] => Ok(run_file(phase, path)?),
        _ => Err(CliError::Usage(format!(
            "Usage: glint [script]\nUsage: glint [phase] [script]\ngot {} arguments",
            args.len()
        ))),
    }
}

fn run_repl() -> ExitCode {
    let mut session = Session::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {
                run(&line, &mut session);
                session.clear_had_parse_error();
            }
            Err(_) => return ExitCode::SUCCESS,
        }
    }
}

fn run_file(phase: &str, path: &str) -> Result<ExitCode, CliError> {
    let source = fs::read_to_string(path)?;
    let mut session = Session::new();

    match phase {
        "scan" => {
            let tokens = scan(&source, &mut session);
            print_tokens(&tokens);
            Ok(ExitCode::SUCCESS)
        }
        "parse" => {
            run(&source, &mut session);
            if session.had_parse_error {
                Ok(ExitCode::from(65))
            } else if session.had_runtime_error {
                Ok(ExitCode::from(70))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        other => Err(CliError::Usage(format!("Unknown phase '{other}', expected 'scan' or 'parse'."))),
    }
}
