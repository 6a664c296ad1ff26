use log::debug;

use crate::error::LoxError;

/// Shared diagnostic sink.
///
/// Scanner, parser, and resolver errors are formatted to the diagnostic
/// stream and flip `had_syntax_error`; runtime errors flip
/// `had_runtime_error`.  The driver inspects the flags between phases and
/// maps them to exit codes; the REPL resets them between lines.
#[derive(Debug, Default)]
pub struct Reporter {
    had_syntax_error: bool,
    had_runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    pub fn syntax_error(&mut self, error: &LoxError) {
        debug!("Reporting syntax error: {}", error);

        eprintln!("{}", error);
        self.had_syntax_error = true;
    }

    pub fn runtime_error(&mut self, error: &LoxError) {
        debug!("Reporting runtime error: {}", error);

        eprintln!("{}", error);
        self.had_runtime_error = true;
    }

    pub fn had_syntax_error(&self) -> bool {
        self.had_syntax_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_syntax_error = false;
        self.had_runtime_error = false;
    }
}
