//! loxi-drv - Interpreter driver.
//!
//! Orchestrates the pipeline (lex -> parse -> resolve -> evaluate) for one
//! session, renders diagnostics in the reporting formats, and implements
//! the two entry points: run a script file, or an interactive REPL.
//!
//! Exit codes follow the sysexits convention the original tooling uses:
//! 0 on success, 64 for bad usage, 65 for any lex/parse/resolve error,
//! 70 for a runtime error.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

use loxi_eval::Interpreter;
use loxi_lex::tokenize;
use loxi_par::Parser;
use loxi_sem::Resolver;
use loxi_util::{Handler, NodeIdGenerator};

/// Exit code for command-line misuse.
pub const EXIT_USAGE: i32 = 64;
/// Exit code when any static (lex/parse/resolve) error occurred.
pub const EXIT_STATIC_ERROR: i32 = 65;
/// Exit code when evaluation raised a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// One interpreter session.
///
/// The interpreter and the node-id generator persist for the session's
/// lifetime, so REPL inputs see definitions from earlier lines and the
/// resolver side table accumulates without id collisions.
pub struct Session {
    interpreter: Interpreter,
    ids: NodeIdGenerator,
    had_error: bool,
    had_runtime_error: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
            ids: NodeIdGenerator::new(),
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Whether any static error has been reported.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Whether a runtime error has been reported.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears the error flags (the REPL does this per line).
    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Runs one source buffer through the full pipeline.
    ///
    /// Static errors are rendered to stderr and skip evaluation; a
    /// runtime error aborts the buffer's remaining statements. The
    /// session stays usable either way.
    pub fn run_source(&mut self, source: &str) {
        let handler = Handler::new();

        let tokens = tokenize(source, &handler);
        debug!("lexed {} tokens", tokens.len());

        let mut parser = Parser::new(tokens, &handler, &self.ids);
        let ast = parser.parse();
        debug!("parsed {} declarations", ast.len());

        // Lex and parse errors accumulate; either kind stops the pipeline
        // before resolution.
        if handler.has_errors() {
            self.report_static(&handler);
            return;
        }

        let bindings = Resolver::new(&handler).resolve(&ast);
        debug!("resolved {} local references", bindings.len());

        if handler.has_errors() {
            self.report_static(&handler);
            return;
        }

        self.interpreter.add_bindings(bindings);
        if let Err(error) = self.interpreter.interpret(&ast) {
            eprintln!("{}\n[line {}]", error.message, error.line);
            self.had_runtime_error = true;
        }
    }

    fn report_static(&mut self, handler: &Handler) {
        for diagnostic in handler.take_diagnostics() {
            eprintln!("{}", diagnostic.render());
        }
        self.had_error = true;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and runs a script file, returning the process exit code.
pub fn run_file(path: &Path) -> Result<i32> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read script '{}'", path.display()))?;

    let mut session = Session::new();
    session.run_source(&source);

    Ok(if session.had_error() {
        EXIT_STATIC_ERROR
    } else if session.had_runtime_error() {
        EXIT_RUNTIME_ERROR
    } else {
        0
    })
}

/// Runs the interactive prompt until end of input.
///
/// Every line goes through the full pipeline against the same session;
/// errors are reported and the loop continues.
pub fn run_prompt() -> Result<()> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "> ").context("could not write prompt")?;
        stdout.flush().context("could not flush prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("could not read input line")?;
        if read == 0 {
            // EOF: leave the loop quietly.
            break;
        }

        session.run_source(&line);
        session.reset_errors();
    }

    Ok(())
}
