//! The tree-walking evaluator.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use loxi_par::{BinOp, ClassStmt, Expr, LiteralValue, LogicalOp, Stmt, UnOp};
use loxi_sem::Bindings;
use loxi_util::{sym, NodeId, Span, Symbol};

use crate::env::{EnvRef, Environment};
use crate::object::{LoxClass, LoxFunction, LoxInstance, NativeFunction};
use crate::{EvalResult, RuntimeError, Unwind, Value};

/// The Lox interpreter.
///
/// Owns the global frame, the current-frame pointer, and the resolver's
/// side table. One interpreter instance runs one script or one whole REPL
/// session; state persists across [`Interpreter::interpret`] calls.
pub struct Interpreter {
    /// The global frame; `clock` is installed here at construction.
    globals: EnvRef,

    /// The frame evaluation currently runs in.
    environment: EnvRef,

    /// Lexical distances recorded by the resolver. Nodes without an
    /// entry are global accesses, even if a shadowing local exists
    /// somewhere; the resolver's output is authoritative.
    locals: Bindings,

    /// Sink for `print` output.
    out: Box<dyn Write>,
}

impl Interpreter {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter printing to the given sink.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let mut globals = Environment::new();
        globals.define(
            *sym::CLOCK,
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: native_clock,
            })),
        );

        let globals = Rc::new(RefCell::new(globals));
        Self {
            globals: Rc::clone(&globals),
            environment: globals,
            locals: Bindings::new(),
            out,
        }
    }

    /// Merges freshly resolved distances into the side table.
    pub fn add_bindings(&mut self, bindings: Bindings) {
        self.locals.extend(bindings);
    }

    /// Executes a program.
    ///
    /// A runtime error aborts the remaining statements and is returned;
    /// the interpreter stays usable (the current frame is always the
    /// global frame between top-level statements).
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                // The resolver rejects top-level `return`; a stray one
                // unwinding this far is simply dropped.
                Err(Unwind::Return(_)) => {}
                Err(Unwind::Error(error)) => return Err(error),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn execute(&mut self, statement: &Stmt) -> EvalResult<()> {
        match statement {
            Stmt::Expr(stmt) => {
                self.evaluate(&stmt.expr)?;
                Ok(())
            }
            Stmt::Print(stmt) => {
                let value = self.evaluate(&stmt.expr)?;
                let _ = writeln!(self.out, "{}", value.stringify());
                Ok(())
            }
            Stmt::Var(stmt) => {
                let value = match &stmt.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(stmt.name, value);
                Ok(())
            }
            Stmt::Block(stmt) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(&stmt.statements, Rc::new(RefCell::new(frame)))
            }
            Stmt::If(stmt) => {
                if self.evaluate(&stmt.condition)?.is_truthy() {
                    self.execute(&stmt.then_branch)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(stmt) => {
                while self.evaluate(&stmt.condition)?.is_truthy() {
                    self.execute(&stmt.body)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(
                    Rc::clone(decl),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(decl.name, Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return(stmt) => {
                let value = match &stmt.value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Class(stmt) => self.execute_class(stmt),
        }
    }

    /// Runs `statements` in `frame`, restoring the previous frame on both
    /// the normal and the unwinding exit path.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], frame: EnvRef) -> EvalResult<()> {
        let previous = Rc::clone(&self.environment);
        self.environment = frame;

        let mut result = Ok(());
        for statement in statements {
            result = self.execute(statement);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, stmt: &ClassStmt) -> EvalResult<()> {
        let superclass = match &stmt.superclass {
            Some(superclass) => {
                let value =
                    self.lookup_variable(superclass.id, superclass.name, superclass.span)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        return Err(RuntimeError::new(
                            "Superclass must be a class.",
                            superclass.span,
                        )
                        .into())
                    }
                }
            }
            None => None,
        };

        // Bind the name first so methods can refer to the class itself.
        self.environment.borrow_mut().define(stmt.name, Value::Nil);

        // Methods of a subclass close over an extra frame holding `super`.
        let method_closure = match &superclass {
            Some(superclass) => {
                let mut frame = Environment::with_enclosing(Rc::clone(&self.environment));
                frame.define(*sym::SUPER, Value::Class(Rc::clone(superclass)));
                Rc::new(RefCell::new(frame))
            }
            None => Rc::clone(&self.environment),
        };

        let mut methods = IndexMap::new();
        for declaration in &stmt.methods {
            let function = LoxFunction::new(
                Rc::clone(declaration),
                Rc::clone(&method_closure),
                declaration.name == *sym::INIT,
            );
            methods.insert(declaration.name, Rc::new(function));
        }

        let class = Value::Class(Rc::new(LoxClass {
            name: stmt.name,
            superclass,
            methods,
        }));

        self.environment
            .borrow_mut()
            .assign(stmt.name, class, stmt.span)
            .map_err(Unwind::from)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn evaluate(&mut self, expression: &Expr) -> EvalResult<Value> {
        match expression {
            Expr::Literal(literal) => Ok(match &literal.value {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(Rc::from(s.as_str())),
            }),
            Expr::Variable(var) => self
                .lookup_variable(var.id, var.name, var.span)
                .map_err(Unwind::from),
            Expr::Assign(assign) => {
                let value = self.evaluate(&assign.value)?;
                match self.locals.depth(assign.id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        assign.name,
                        value.clone(),
                        assign.span,
                    )?,
                    None => self.globals.borrow_mut().assign(
                        assign.name,
                        value.clone(),
                        assign.span,
                    )?,
                }
                Ok(value)
            }
            Expr::Unary(unary) => {
                let operand = self.evaluate(&unary.operand)?;
                match unary.op {
                    UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnOp::Neg => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new("Operand must be a number.", unary.span)
                            .into()),
                    },
                }
            }
            Expr::Binary(binary) => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                self.binary_op(&left, binary.op, &right, binary.span)
                    .map_err(Unwind::from)
            }
            Expr::Logical(logical) => {
                let left = self.evaluate(&logical.left)?;
                let decided = match logical.op {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };
                if decided {
                    // Short-circuit: the deciding operand is the result.
                    Ok(left)
                } else {
                    self.evaluate(&logical.right)
                }
            }
            Expr::Grouping(grouping) => self.evaluate(&grouping.inner),
            Expr::Call(call) => {
                let callee = self.evaluate(&call.callee)?;
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.evaluate(arg)?);
                }
                self.call_value(callee, args, call.span)
            }
            Expr::Get(get) => {
                let object = self.evaluate(&get.object)?;
                match object {
                    Value::Instance(instance) => {
                        LoxInstance::get(&instance, get.name, get.span).map_err(Unwind::from)
                    }
                    _ => Err(RuntimeError::new(
                        "Only instances have properties.",
                        get.span,
                    )
                    .into()),
                }
            }
            Expr::Set(set) => {
                let object = self.evaluate(&set.object)?;
                let Value::Instance(instance) = object else {
                    return Err(
                        RuntimeError::new("Only instances have fields.", set.span).into()
                    );
                };
                let value = self.evaluate(&set.value)?;
                instance.set(set.name, value.clone());
                Ok(value)
            }
            Expr::This(this) => self
                .lookup_variable(this.id, *sym::THIS, this.span)
                .map_err(Unwind::from),
            Expr::Super(sup) => self.evaluate_super(sup.id, sup.method, sup.span),
        }
    }

    fn binary_op(
        &self,
        left: &Value,
        op: BinOp,
        right: &Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match op {
            BinOp::Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => {
                    let mut joined = String::with_capacity(a.len() + b.len());
                    joined.push_str(a);
                    joined.push_str(b);
                    Ok(Value::Str(Rc::from(joined)))
                }
                _ => Err(RuntimeError::new(
                    "Operands must be two numbers or two strings.",
                    span,
                )),
            },
            BinOp::Sub => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Number(a - b))
            }
            BinOp::Mul => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Number(a * b))
            }
            // Division by zero follows IEEE-754: ±inf or NaN, no error.
            BinOp::Div => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Number(a / b))
            }
            BinOp::Gt => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Bool(a > b))
            }
            BinOp::Ge => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Bool(a >= b))
            }
            BinOp::Lt => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Bool(a < b))
            }
            BinOp::Le => {
                let (a, b) = number_operands(left, right, span)?;
                Ok(Value::Bool(a <= b))
            }
            BinOp::Eq => Ok(Value::Bool(left == right)),
            BinOp::Ne => Ok(Value::Bool(left != right)),
        }
    }

    /// `super.method`: the superclass sits in the frame the resolver
    /// measured; `this` is one frame nearer (the method binding frame).
    fn evaluate_super(&mut self, id: NodeId, method: Symbol, span: Span) -> EvalResult<Value> {
        let Some(distance) = self.locals.depth(id) else {
            return Err(RuntimeError::new("Undefined variable 'super'.", span).into());
        };

        let superclass =
            match Environment::get_at(&self.environment, distance, *sym::SUPER, span)? {
                Value::Class(class) => class,
                _ => return Err(RuntimeError::new("Superclass must be a class.", span).into()),
            };

        let this = match Environment::get_at(
            &self.environment,
            distance.saturating_sub(1),
            *sym::THIS,
            span,
        )? {
            Value::Instance(instance) => instance,
            _ => {
                return Err(
                    RuntimeError::new("Only instances have properties.", span).into(),
                )
            }
        };

        match superclass.find_method(method) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(this)))),
            None => Err(RuntimeError::new(
                format!("Undefined property '{}'.", method),
                span,
            )
            .into()),
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Dispatches a call on the callee's kind. Anything that is not a
    /// function, class, or native is not callable.
    fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => {
                self.check_arity(function.arity(), args.len(), span)?;
                self.call_function(&function, args)
            }
            Value::Native(native) => {
                self.check_arity(native.arity, args.len(), span)?;
                (native.func)(&args).map_err(Unwind::from)
            }
            Value::Class(class) => {
                self.check_arity(class.arity(), args.len(), span)?;
                self.instantiate(&class, args)
            }
            _ => Err(RuntimeError::new("Can only call functions and classes.", span).into()),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, span: Span) -> Result<(), Unwind> {
        if expected == got {
            return Ok(());
        }
        Err(RuntimeError::new(
            format!("Expected {} arguments but got {}.", expected, got),
            span,
        )
        .into())
    }

    /// Invokes a user function: parameters bind by position in a fresh
    /// child of the captured closure frame, a `Return` unwind stops here,
    /// and initializers always yield their bound instance.
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> EvalResult<Value> {
        log::trace!(
            "call {} ({} args)",
            function.declaration.name,
            args.len()
        );

        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.declaration.params.iter().zip(args) {
            frame.define(param.name, arg);
        }

        let result = self.execute_block(&function.declaration.body, Rc::new(RefCell::new(frame)));

        let returned = match result {
            Ok(()) => Value::Nil,
            Err(Unwind::Return(value)) => value,
            Err(error) => return Err(error),
        };

        if function.is_initializer {
            // `this` lives in the binding frame the closure points at.
            return Environment::get_at(
                &function.closure,
                0,
                *sym::THIS,
                function.declaration.span,
            )
            .map_err(Unwind::from);
        }

        Ok(returned)
    }

    /// Calling a class: make the instance, run a bound `init` exactly
    /// once if any class on the chain declares one, and yield the
    /// instance regardless of what `init` returned.
    fn instantiate(&mut self, class: &Rc<LoxClass>, args: Vec<Value>) -> EvalResult<Value> {
        let instance = Rc::new(LoxInstance::new(Rc::clone(class)));

        if let Some(initializer) = class.find_method(*sym::INIT) {
            let bound = initializer.bind(Rc::clone(&instance));
            self.call_function(&bound, args)?;
        }

        Ok(Value::Instance(instance))
    }

    // =========================================================================
    // Variable access
    // =========================================================================

    /// Resolver-assisted lookup: a recorded distance reads the exact
    /// frame; no record means the global frame, full stop.
    fn lookup_variable(
        &self,
        id: NodeId,
        name: Symbol,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match self.locals.depth(id) {
            Some(distance) => Environment::get_at(&self.environment, distance, name, span),
            None => self.globals.borrow().get(name, span),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn number_operands(left: &Value, right: &Value, span: Span) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new("Operands must be numbers.", span)),
    }
}

/// The `clock` native: seconds since the Unix epoch, sub-second precision.
fn native_clock(_args: &[Value]) -> Result<Value, RuntimeError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Ok(Value::Number(elapsed.as_secs_f64()))
}
