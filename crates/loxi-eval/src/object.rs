//! Callables and class objects.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use loxi_par::FunctionDecl;
use loxi_util::{sym, Span, Symbol};
use rustc_hash::FxHashMap;

use crate::env::{EnvRef, Environment};
use crate::{RuntimeError, Value};

/// A user-defined function or method.
///
/// Holds the declaration it was built from and the frame that was current
/// when the declaration executed; calls run in a fresh child of that
/// frame, which is what makes closures work.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    /// Set for methods named `init`; changes the return protocol so a
    /// constructor always yields the instance.
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produces a copy of this method with `this` pre-bound to
    /// `instance`, via a one-slot frame between the method's closure and
    /// its body.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let mut frame = Environment::with_enclosing(Rc::clone(&self.closure));
        frame.define(*sym::THIS, Value::Instance(instance));
        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(frame)),
            is_initializer: self.is_initializer,
        }
    }
}

/// A built-in function implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, RuntimeError>,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A class: a name, an optional superclass, and a method table.
#[derive(Debug)]
pub struct LoxClass {
    pub name: Symbol,
    pub superclass: Option<Rc<LoxClass>>,
    /// Declaration order is preserved; first definition of a name wins
    /// lookups down the inheritance chain.
    pub methods: IndexMap<Symbol, Rc<LoxFunction>>,
}

impl LoxClass {
    /// Looks a method up on this class, then linearly up the superclass
    /// chain.
    pub fn find_method(&self, name: Symbol) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(&name) {
            return Some(Rc::clone(method));
        }
        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// A class called as a constructor takes as many arguments as its
    /// `init` method declares; zero if it has none.
    pub fn arity(&self) -> usize {
        self.find_method(*sym::INIT)
            .map(|init| init.arity())
            .unwrap_or(0)
    }
}

/// An instance of a class: a field map plus the class for method lookup.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: RefCell<FxHashMap<Symbol, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: RefCell::new(FxHashMap::default()),
        }
    }

    /// Property read: fields shadow methods; a method hit is bound to the
    /// instance; neither is "Undefined property".
    pub fn get(instance: &Rc<LoxInstance>, name: Symbol, span: Span) -> Result<Value, RuntimeError> {
        if let Some(value) = instance.fields.borrow().get(&name) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.class.find_method(name) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        Err(RuntimeError::new(
            format!("Undefined property '{}'.", name),
            span,
        ))
    }

    /// Property write: fields are created on first assignment.
    pub fn set(&self, name: Symbol, value: Value) {
        self.fields.borrow_mut().insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loxi_util::Span;

    fn decl(name: &str, params: &[&str]) -> Rc<FunctionDecl> {
        Rc::new(FunctionDecl {
            name: Symbol::intern(name),
            params: params
                .iter()
                .map(|p| loxi_par::Param {
                    name: Symbol::intern(p),
                    span: Span::DUMMY,
                })
                .collect(),
            body: Vec::new(),
            span: Span::DUMMY,
        })
    }

    fn function(name: &str, params: &[&str]) -> Rc<LoxFunction> {
        Rc::new(LoxFunction::new(
            decl(name, params),
            Rc::new(RefCell::new(Environment::new())),
            name == "init",
        ))
    }

    fn class_with_methods(name: &str, methods: &[Rc<LoxFunction>]) -> Rc<LoxClass> {
        let mut table = IndexMap::new();
        for method in methods {
            table.insert(method.declaration.name, Rc::clone(method));
        }
        Rc::new(LoxClass {
            name: Symbol::intern(name),
            superclass: None,
            methods: table,
        })
    }

    #[test]
    fn arity_counts_parameters() {
        assert_eq!(function("f", &[]).arity(), 0);
        assert_eq!(function("f", &["a", "b", "c"]).arity(), 3);
    }

    #[test]
    fn class_arity_follows_init() {
        let plain = class_with_methods("A", &[function("m", &["x"])]);
        assert_eq!(plain.arity(), 0);

        let with_init = class_with_methods("B", &[function("init", &["x", "y"])]);
        assert_eq!(with_init.arity(), 2);
    }

    #[test]
    fn method_lookup_walks_superclass_chain() {
        let base_method = function("go", &[]);
        let base = class_with_methods("Base", &[Rc::clone(&base_method)]);

        let derived = Rc::new(LoxClass {
            name: Symbol::intern("Derived"),
            superclass: Some(Rc::clone(&base)),
            methods: IndexMap::new(),
        });

        let found = derived.find_method(Symbol::intern("go")).unwrap();
        assert!(Rc::ptr_eq(&found, &base_method));
        assert!(derived.find_method(Symbol::intern("missing")).is_none());
    }

    #[test]
    fn overriding_method_wins() {
        let base = class_with_methods("Base", &[function("go", &[])]);
        let override_method = function("go", &["x"]);
        let mut table = IndexMap::new();
        table.insert(
            override_method.declaration.name,
            Rc::clone(&override_method),
        );
        let derived = Rc::new(LoxClass {
            name: Symbol::intern("Derived"),
            superclass: Some(base),
            methods: table,
        });

        let found = derived.find_method(Symbol::intern("go")).unwrap();
        assert!(Rc::ptr_eq(&found, &override_method));
    }

    #[test]
    fn fields_are_created_on_first_assignment() {
        let instance = Rc::new(LoxInstance::new(class_with_methods("A", &[])));
        let name = Symbol::intern("x");

        let err = LoxInstance::get(&instance, name, Span::new(0, 0, 2, 1)).unwrap_err();
        assert_eq!(err.message, "Undefined property 'x'.");
        assert_eq!(err.line, 2);

        instance.set(name, Value::Number(3.0));
        assert_eq!(
            LoxInstance::get(&instance, name, Span::DUMMY).unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn missing_field_falls_back_to_bound_method() {
        let method = function("go", &[]);
        let instance = Rc::new(LoxInstance::new(class_with_methods(
            "A",
            &[Rc::clone(&method)],
        )));

        let bound = LoxInstance::get(&instance, Symbol::intern("go"), Span::DUMMY).unwrap();
        let Value::Function(bound) = bound else {
            panic!("expected a bound method");
        };
        // The bound copy is a new function value over the same declaration,
        // with `this` in scope.
        assert!(Rc::ptr_eq(&bound.declaration, &method.declaration));
        let this = Environment::get_at(&bound.closure, 0, *sym::THIS, Span::DUMMY).unwrap();
        assert_eq!(this, Value::Instance(instance));
    }

    #[test]
    fn fields_shadow_methods() {
        let method = function("go", &[]);
        let instance = Rc::new(LoxInstance::new(class_with_methods("A", &[method])));
        let name = Symbol::intern("go");

        instance.set(name, Value::Number(1.0));
        assert_eq!(
            LoxInstance::get(&instance, name, Span::DUMMY).unwrap(),
            Value::Number(1.0)
        );
    }
}
