//! Pipeline glue: scanner → parser → resolver → interpreter.
//!
//! A `Lox` value owns one interpreter session.  In file mode the flags in the
//! diagnostic sink map to exit codes (65 for syntax errors, 70 for runtime
//! errors); in REPL mode the flags reset between lines while the global
//! environment and the side-table persist for the whole session.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use log::{debug, info};

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::report::Reporter;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
    reporter: Reporter,
    // Expression ids must stay unique for the lifetime of the session: the
    // side-table keeps entries from earlier REPL lines alive for the closures
    // they resolved.
    next_expr_id: usize,
}

impl<W: Write> Lox<W> {
    pub fn new(output: W) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            reporter: Reporter::new(),
            next_expr_id: 0,
        }
    }

    /// Runs one source buffer through every phase, stopping at the first
    /// phase boundary with accumulated syntax errors.
    pub fn run(&mut self, source: Vec<u8>) {
        let scanner = Scanner::new(source);

        let mut tokens: Vec<Token> = Vec::new();

        for result in scanner {
            match result {
                Ok(token) => tokens.push(token),

                Err(e) => self.reporter.syntax_error(&e),
            }
        }

        let mut parser = Parser::new(tokens, self.next_expr_id, &mut self.reporter);
        let statements = parser.parse();
        self.next_expr_id = parser.next_id();

        if self.reporter.had_syntax_error() {
            debug!("Skipping resolution: syntax errors reported");
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter, &mut self.reporter);
        resolver.resolve(&statements);

        if self.reporter.had_syntax_error() {
            debug!("Skipping evaluation: resolve errors reported");
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.reporter.runtime_error(&e);
        }
    }

    /// Runs a script file and reports the process exit code: 0 on success,
    /// 65 on syntax errors, 70 on runtime errors.
    pub fn run_file(&mut self, path: &Path) -> Result<i32> {
        info!("Running file {}", path.display());

        let mut buf: Vec<u8> = Vec::new();
        let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
        reader.read_to_end(&mut buf)?;

        // Validate the encoding up front; the scanner assumes well-formed
        // UTF-8 from here on.
        let source = String::from_utf8(buf)?;

        self.run(source.into_bytes());

        if self.reporter.had_syntax_error() {
            Ok(65)
        } else if self.reporter.had_runtime_error() {
            Ok(70)
        } else {
            Ok(0)
        }
    }

    /// Interactive prompt: one line per iteration, error flags cleared
    /// between lines, session state retained.  Exits on end-of-input.
    pub fn run_prompt(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            print!("> ");
            io::stdout().flush()?;

            line.clear();

            if stdin.lock().read_line(&mut line)? == 0 {
                info!("End of input, leaving the prompt");
                return Ok(());
            }

            self.run(line.clone().into_bytes());

            self.reporter.reset();
        }
    }

    pub fn had_syntax_error(&self) -> bool {
        self.reporter.had_syntax_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }
}
