//! Lexical scope frames.
//!
//! Environments form a singly linked parent chain of shared, interiorly
//! mutable frames. The outermost frame is the global frame. Frames are
//! kept alive by the closures that captured them; reference cycles
//! through class methods are possible and accepted (the memory lives
//! until the interpreter does).

use std::cell::RefCell;
use std::rc::Rc;

use loxi_util::{Span, Symbol};
use rustc_hash::FxHashMap;

use crate::{RuntimeError, Value};

/// Shared handle to a scope frame.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope frame: bindings plus the enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: FxHashMap<Symbol, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// Creates a frame with no parent (the global frame).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frame nested inside `enclosing`.
    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Self {
            values: FxHashMap::default(),
            enclosing: Some(enclosing),
        }
    }

    /// Defines (or overwrites) a binding in this frame.
    pub fn define(&mut self, name: Symbol, value: Value) {
        self.values.insert(name, value);
    }

    /// Reads a binding, walking the parent chain.
    pub fn get(&self, name: Symbol, span: Span) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name) {
            return Ok(value.clone());
        }
        match &self.enclosing {
            Some(parent) => parent.borrow().get(name, span),
            None => Err(undefined_variable(name, span)),
        }
    }

    /// Writes an existing binding, walking the parent chain.
    pub fn assign(&mut self, name: Symbol, value: Value, span: Span) -> Result<(), RuntimeError> {
        if let std::collections::hash_map::Entry::Occupied(mut slot) =
            self.values.entry(name)
        {
            slot.insert(value);
            return Ok(());
        }
        match &self.enclosing {
            Some(parent) => parent.borrow_mut().assign(name, value, span),
            None => Err(undefined_variable(name, span)),
        }
    }

    /// Reads a binding in the frame exactly `distance` parents up.
    ///
    /// The resolver guarantees the slot exists at that distance; a miss
    /// still reports an undefined variable rather than panicking.
    pub fn get_at(
        env: &EnvRef,
        distance: usize,
        name: Symbol,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let frame = Self::ancestor(env, distance);
        let value = frame.borrow().values.get(&name).cloned();
        value.ok_or_else(|| undefined_variable(name, span))
    }

    /// Writes the binding in the frame exactly `distance` parents up.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: Symbol,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();
        if let std::collections::hash_map::Entry::Occupied(mut slot) =
            frame.values.entry(name)
        {
            slot.insert(value);
            Ok(())
        } else {
            Err(undefined_variable(name, span))
        }
    }

    /// Follows `distance` parent links.
    fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut frame = Rc::clone(env);
        for _ in 0..distance {
            let parent = frame.borrow().enclosing.clone();
            match parent {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        frame
    }
}

fn undefined_variable(name: Symbol, span: Span) -> RuntimeError {
    RuntimeError::new(format!("Undefined variable '{}'.", name), span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn shared(env: Environment) -> EnvRef {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn define_and_get() {
        let mut env = Environment::new();
        env.define(sym("a"), Value::Number(1.0));
        assert_eq!(env.get(sym("a"), Span::DUMMY).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_walks_parents() {
        let global = shared(Environment::new());
        global
            .borrow_mut()
            .define(sym("a"), Value::Str(Rc::from("outer")));
        let inner = Environment::with_enclosing(Rc::clone(&global));
        assert_eq!(
            inner.get(sym("a"), Span::DUMMY).unwrap(),
            Value::Str(Rc::from("outer"))
        );
    }

    #[test]
    fn missing_variable_is_an_error() {
        let env = Environment::new();
        let err = env.get(sym("ghost"), Span::new(0, 0, 4, 1)).unwrap_err();
        assert_eq!(err.message, "Undefined variable 'ghost'.");
        assert_eq!(err.line, 4);
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let global = shared(Environment::new());
        global.borrow_mut().define(sym("a"), Value::Number(1.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&global)));
        inner
            .borrow_mut()
            .assign(sym("a"), Value::Number(2.0), Span::DUMMY)
            .unwrap();

        assert_eq!(
            global.borrow().get(sym("a"), Span::DUMMY).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn assign_to_missing_variable_is_an_error() {
        let mut env = Environment::new();
        let err = env
            .assign(sym("ghost"), Value::Nil, Span::DUMMY)
            .unwrap_err();
        assert_eq!(err.message, "Undefined variable 'ghost'.");
    }

    #[test]
    fn define_shadows_without_touching_parent() {
        let global = shared(Environment::new());
        global.borrow_mut().define(sym("a"), Value::Number(1.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&global)));
        inner.borrow_mut().define(sym("a"), Value::Number(2.0));

        assert_eq!(
            inner.borrow().get(sym("a"), Span::DUMMY).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            global.borrow().get(sym("a"), Span::DUMMY).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn get_at_reads_the_exact_frame() {
        let global = shared(Environment::new());
        global.borrow_mut().define(sym("a"), Value::Number(1.0));

        let middle = shared(Environment::with_enclosing(Rc::clone(&global)));
        middle.borrow_mut().define(sym("a"), Value::Number(2.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&middle)));

        assert_eq!(
            Environment::get_at(&inner, 1, sym("a"), Span::DUMMY).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 2, sym("a"), Span::DUMMY).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn assign_at_writes_the_exact_frame() {
        let global = shared(Environment::new());
        global.borrow_mut().define(sym("a"), Value::Number(1.0));

        let middle = shared(Environment::with_enclosing(Rc::clone(&global)));
        middle.borrow_mut().define(sym("a"), Value::Number(2.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&middle)));
        Environment::assign_at(&inner, 2, sym("a"), Value::Number(9.0), Span::DUMMY).unwrap();

        assert_eq!(
            global.borrow().get(sym("a"), Span::DUMMY).unwrap(),
            Value::Number(9.0)
        );
        assert_eq!(
            middle.borrow().get(sym("a"), Span::DUMMY).unwrap(),
            Value::Number(2.0)
        );
    }
}
