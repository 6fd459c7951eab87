//! loxi-eval - The Lox runtime: values, environments, and the
//! tree-walking evaluator.
//!
//! The interpreter dispatches directly on AST node kind, holds a chain of
//! scope frames plus the global frame, and consults the resolver's
//! distance table (see `loxi-sem`) to read locals by `(distance, name)`
//! and globals by name.
//!
//! `return` is a non-local exit, not an error: evaluation results are
//! threaded as `Result<_, Unwind>` where [`Unwind`] is either a returned
//! value (absorbed at the nearest function-call boundary) or a
//! [`RuntimeError`] (propagated to the top of the current statement).

mod env;
mod interp;
mod object;
mod value;

pub use env::{EnvRef, Environment};
pub use interp::Interpreter;
pub use object::{LoxClass, LoxFunction, LoxInstance, NativeFunction};
pub use value::Value;

use loxi_util::Span;
use thiserror::Error;

/// An error raised during evaluation.
///
/// Aborts the current top-level statement; the driver renders it as
/// `<message>\n[line N]` and exits with code 70 in file mode.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub line: u32,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            line: span.line,
        }
    }
}

/// Non-local exit during evaluation.
///
/// `Return` carries the value of a `return` statement up to the function
/// call that absorbs it; it does not set any error state. `Error` carries
/// a runtime error all the way out of the statement.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

/// Result type threaded through every evaluator arm.
pub type EvalResult<T> = Result<T, Unwind>;
