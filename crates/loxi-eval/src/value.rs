//! The Lox value model.

use std::fmt;
use std::rc::Rc;

use crate::object::{LoxClass, LoxFunction, LoxInstance, NativeFunction};

/// A runtime value.
///
/// Numbers are IEEE-754 doubles. Strings are immutable shared buffers.
/// Functions, classes, and instances are shared references; cloning a
/// `Value` clones the handle, never the object.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Function(Rc<LoxFunction>),
    Native(Rc<NativeFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

impl Value {
    /// Lox truthiness: `nil` and `false` are falsy, everything else is
    /// truthy (including `0` and the empty string).
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// The textual form used by `print`.
    ///
    /// Integral doubles print without a trailing `.0`.
    pub fn stringify(&self) -> String {
        match self {
            Value::Nil => "nil".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Function(f) => format!("<fn {}>", f.declaration.name),
            Value::Native(_) => "<native fn>".to_owned(),
            Value::Class(c) => c.name.to_string(),
            Value::Instance(i) => format!("{} instance", i.class.name),
        }
    }
}

/// Formats a double the way Lox prints it.
fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Lox equality: structural on nil/booleans/numbers/strings, reference
/// identity on functions, classes, and instances. Numbers compare as
/// IEEE doubles, so `NaN != NaN`. Mismatched types are unequal; `==`
/// never raises.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Environment;
    use indexmap::IndexMap;
    use loxi_par::FunctionDecl;
    use loxi_util::{Span, Symbol};
    use std::cell::RefCell;

    fn class(name: &str) -> Rc<LoxClass> {
        Rc::new(LoxClass {
            name: Symbol::intern(name),
            superclass: None,
            methods: IndexMap::new(),
        })
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::Str(Rc::from("")).is_truthy());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_eq!(Value::Number(1.5), Value::Number(1.5));
        assert_eq!(Value::Str(Rc::from("a")), Value::Str(Rc::from("a")));
        assert_ne!(Value::Number(1.0), Value::Str(Rc::from("1")));
        assert_ne!(Value::Nil, Value::Bool(false));
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn reference_equality_for_objects() {
        let a = class("A");
        let b = class("A");
        assert_eq!(Value::Class(Rc::clone(&a)), Value::Class(Rc::clone(&a)));
        assert_ne!(Value::Class(a.clone()), Value::Class(b));

        let instance = Rc::new(LoxInstance::new(a));
        assert_eq!(
            Value::Instance(Rc::clone(&instance)),
            Value::Instance(Rc::clone(&instance))
        );
    }

    #[test]
    fn number_formatting() {
        assert_eq!(Value::Number(1.0).stringify(), "1");
        assert_eq!(Value::Number(7.0).stringify(), "7");
        assert_eq!(Value::Number(2.5).stringify(), "2.5");
        assert_eq!(Value::Number(-0.5).stringify(), "-0.5");
        assert_eq!(Value::Number(f64::INFINITY).stringify(), "inf");
    }

    #[test]
    fn object_formatting() {
        let declaration = Rc::new(FunctionDecl {
            name: Symbol::intern("greet"),
            params: Vec::new(),
            body: Vec::new(),
            span: Span::DUMMY,
        });
        let function = LoxFunction {
            declaration,
            closure: Rc::new(RefCell::new(Environment::new())),
            is_initializer: false,
        };
        assert_eq!(Value::Function(Rc::new(function)).stringify(), "<fn greet>");

        let klass = class("Point");
        assert_eq!(Value::Class(Rc::clone(&klass)).stringify(), "Point");
        let instance = Rc::new(LoxInstance::new(klass));
        assert_eq!(Value::Instance(instance).stringify(), "Point instance");
    }
}
