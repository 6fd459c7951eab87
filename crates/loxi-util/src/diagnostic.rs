//! Error reporting infrastructure.
//!
//! The lexer, parser, and resolver never abort on a bad program; they
//! report through a shared [`Handler`] and keep going so a single run
//! surfaces as many problems as possible. The driver checks
//! [`Handler::has_errors`] between phases and skips evaluation when any
//! static error was recorded.
//!
//! Rendered diagnostics follow the fixed one-line format
//! `[line N] Error <where>: <message>`, where `<where>` is empty, " at
//! end", or " at '<lexeme>'".

use std::cell::RefCell;
use std::fmt;

use crate::Span;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A static error; evaluation will be skipped.
    Error,
    /// A non-fatal notice.
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
        }
    }
}

/// A single reported problem.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity.
    pub level: Level,
    /// The message text, without location decoration.
    pub message: String,
    /// Token context for the `<where>` slot: `"end"` or `"'lexeme'"`.
    pub at: Option<String>,
    /// Source location; `span.line` is what rendering uses.
    pub span: Span,
}

impl Diagnostic {
    /// Creates an error diagnostic with no token context.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            at: None,
            span,
        }
    }

    /// Attaches the `<where>` context fragment.
    pub fn with_at(mut self, at: impl Into<String>) -> Self {
        self.at = Some(at.into());
        self
    }

    /// Renders the diagnostic in the reporting format.
    ///
    /// # Examples
    ///
    /// ```
    /// use loxi_util::{Diagnostic, Span};
    ///
    /// let diag = Diagnostic::error("Unexpected character.", Span::new(0, 1, 3, 1));
    /// assert_eq!(diag.render(), "[line 3] Error: Unexpected character.");
    ///
    /// let diag = diag.with_at("'@'");
    /// assert_eq!(diag.render(), "[line 3] Error at '@': Unexpected character.");
    /// ```
    pub fn render(&self) -> String {
        match &self.at {
            Some(at) => format!(
                "[line {}] {} at {}: {}",
                self.span.line, self.level, at, self.message
            ),
            None => format!("[line {}] {}: {}", self.span.line, self.level, self.message),
        }
    }
}

/// Collects diagnostics from every front-end phase.
///
/// Uses interior mutability so one handler can be shared by the lexer and
/// the parser within a single pipeline run.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Records a diagnostic.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Records an error with no token context.
    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::error(message, span));
    }

    /// Records an error at a token, filling the `<where>` slot.
    ///
    /// `at` is the context fragment, e.g. `"end"` or `"'var'"`.
    pub fn error_at(&self, at: impl Into<String>, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::error(message, span).with_at(at));
    }

    /// Whether any error-level diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of recorded error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Removes and returns every recorded diagnostic.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
