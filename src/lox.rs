//! The pipeline driver: scan → parse → resolve → interpret, with the two
//! diagnostic flags that decide the process exit status.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// `sysexits.h` codes used by the CLI.
pub const EX_OK: i32 = 0;
pub const EX_USAGE: i32 = 64;
pub const EX_DATAERR: i32 = 65;
pub const EX_SOFTWARE: i32 = 70;

/// Native stack for a thread running a session: enough for
/// [`MAX_CALL_DEPTH`](crate::interpreter::MAX_CALL_DEPTH) nested Lox calls in
/// an unoptimized build.
pub const STACK_SIZE: usize = 512 * 1024 * 1024;

/// One interpreter session.  The REPL reuses a single session across lines
/// so globals persist.
pub struct Lox {
    interpreter: Interpreter,
    err: Box<dyn Write>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to the process's standard streams.
    pub fn new() -> Self {
        Self::with_streams(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// A session with injected output (`print`) and error sinks.
    pub fn with_streams(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        info!("Lox session created");

        Self {
            interpreter: Interpreter::with_output(out),
            err,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// The REPL forgives static errors from earlier lines, not runtime ones.
    pub fn reset_error(&mut self) {
        self.had_error = false;
    }

    /// 65 for static errors, 70 for runtime errors, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            EX_DATAERR
        } else if self.had_runtime_error {
            EX_SOFTWARE
        } else {
            EX_OK
        }
    }

    /// Run one chunk of source to completion.
    pub fn run(&mut self, source: &str) {
        debug!("Running {} bytes of source", source.len());

        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        self.report_all(lex_errors);

        let (statements, parse_errors) = Parser::new(tokens).parse();
        self.report_all(parse_errors);

        if self.had_error {
            return;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.report_all(errors);
        }

        if self.had_error {
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.report(e);
        }
    }

    fn report_all(&mut self, errors: Vec<LoxError>) {
        for e in errors {
            self.report(e);
        }
    }

    /// Write a diagnostic to the error sink and raise the matching flag.
    pub fn report(&mut self, error: LoxError) {
        debug!("Reporting: {}", error);

        if error.is_static() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        // Nowhere left to report a broken error stream.
        let _ = writeln!(self.err, "{}", error);
        let _ = self.err.flush();
    }
}
