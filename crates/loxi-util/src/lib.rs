//! loxi-util - Foundation types shared by every interpreter phase.
//!
//! This crate provides the pieces the rest of the pipeline is built on:
//!
//! - [`Span`]: source location tracking (byte range + line/column)
//! - [`Symbol`]: interned strings for identifiers and literals
//! - [`Diagnostic`] / [`Handler`]: error reporting infrastructure
//! - [`NodeId`] / [`NodeIdGenerator`]: stable identities for AST nodes

mod diagnostic;
mod node_id;
mod span;
mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use node_id::{NodeId, NodeIdGenerator};
pub use span::Span;
pub use symbol::{sym, Symbol};
