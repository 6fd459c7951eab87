//! Stable identities for AST nodes.
//!
//! The resolver records lexical distances in a side table keyed by node
//! identity. Identity is an integer assigned at parse time, so the table
//! survives the AST being cloned or moved, and two syntactically identical
//! expressions at different positions never collide.

use std::sync::atomic::{AtomicU32, Ordering};

/// Unique identifier for an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Reserved id for synthesized nodes that are never resolved.
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}

/// Generator for unique [`NodeId`]s.
///
/// The driver owns one generator per session, so ids stay unique across
/// every parse it runs (each REPL line included) and the accumulated side
/// table never sees a key reused.
pub struct NodeIdGenerator {
    counter: AtomicU32,
}

impl NodeIdGenerator {
    /// Creates a new generator starting from 0.
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    /// Returns the next unused id.
    pub fn next_id(&self) -> NodeId {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        assert!(id != u32::MAX, "node id space exhausted");
        NodeId(id)
    }
}

impl Default for NodeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
