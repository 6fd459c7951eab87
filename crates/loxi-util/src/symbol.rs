//! String interning for identifiers and literals.
//!
//! A [`Symbol`] is a 4-byte handle to a string stored once in a global,
//! thread-safe table. Interning makes name comparison and hashing O(1),
//! which matters because environment lookups, field access, and method
//! dispatch are all keyed by name.
//!
//! Interned strings are leaked into `'static` storage and live for the
//! process lifetime; the total is bounded by the distinct names appearing
//! in source, which is acceptable for an interpreter run.

use std::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};

use dashmap::DashMap;

static INTERNER: LazyLock<Interner> = LazyLock::new(Interner::new);

/// An interned string.
///
/// Two symbols are equal iff the strings they were interned from are equal.
///
/// # Examples
///
/// ```
/// use loxi_util::Symbol;
///
/// let a = Symbol::intern("counter");
/// let b = Symbol::intern("counter");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "counter");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Interns a string, returning its symbol.
    pub fn intern(string: &str) -> Symbol {
        INTERNER.intern(string)
    }

    /// Returns the string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        INTERNER.resolve(self)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

/// Names the runtime refers to by fixed identity.
pub mod sym {
    use super::Symbol;
    use std::sync::LazyLock;

    pub static THIS: LazyLock<Symbol> = LazyLock::new(|| Symbol::intern("this"));
    pub static SUPER: LazyLock<Symbol> = LazyLock::new(|| Symbol::intern("super"));
    pub static INIT: LazyLock<Symbol> = LazyLock::new(|| Symbol::intern("init"));
    pub static CLOCK: LazyLock<Symbol> = LazyLock::new(|| Symbol::intern("clock"));
}

/// The global string table.
struct Interner {
    /// string -> id, lock-free for the common already-interned case.
    names: DashMap<&'static str, u32>,
    /// id -> string, append-only.
    strings: RwLock<Vec<&'static str>>,
}

impl Interner {
    fn new() -> Self {
        Self {
            names: DashMap::with_capacity(256),
            strings: RwLock::new(Vec::with_capacity(256)),
        }
    }

    fn intern(&self, string: &str) -> Symbol {
        if let Some(id) = self.names.get(string) {
            return Symbol(*id);
        }

        let mut strings = self
            .strings
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Another thread may have interned the string while we were
        // waiting for the write lock.
        if let Some(id) = self.names.get(string) {
            return Symbol(*id);
        }

        let interned: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let id = strings.len() as u32;
        strings.push(interned);
        self.names.insert(interned, id);
        Symbol(id)
    }

    fn resolve(&self, symbol: Symbol) -> &'static str {
        self.strings
            .read()
            .unwrap_or_else(PoisonError::into_inner)[symbol.0 as usize]
    }
}
