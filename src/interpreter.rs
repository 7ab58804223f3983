use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::LoxError;
use crate::function::LoxFunction;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Everything that unwinds statement execution.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] LoxError),

    /// Non‑local `return`; only `LoxFunction::call` catches it.
    #[error("Return signal with value: {0}")]
    ReturnSignal(Value),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

/// Deepest Lox call nesting before a runtime "Stack overflow." error.  Each
/// level costs several tree-walking frames, so hosts must run the
/// interpreter on a stack of at least [`crate::lox::STACK_SIZE`] bytes.
pub const MAX_CALL_DEPTH: usize = 4_000;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,

    /// Resolver output: scope distance per resolved expression.
    locals: HashMap<ExprId, usize>,

    out: Box<dyn Write>,

    /// Lox calls currently on the native stack.
    call_depth: usize,
}

impl Interpreter {
    /// An interpreter whose `print` statements go to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_ref();

        for native in crate::callable::natives() {
            debug!("Defining native function '{}'", native.name);
            globals
                .borrow_mut()
                .define(native.name, Value::NativeFunction(Rc::new(native)));
        }

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            out,
            call_depth: 0,
        }
    }

    /// Record the scope distance the resolver found for `expr`.
    pub fn resolve(&mut self, expr: &Expr, depth: usize) {
        debug!("Noting local {:?} at depth {}", expr.id, depth);

        self.locals.insert(expr.id, depth);
    }

    /// Interprets a list of statements (a "program").
    ///
    /// The first runtime error aborts the remaining statements.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        debug!("Interpreting {} statements", statements.len());

        let mut outcome = Ok(());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(InterpretError::Runtime(e)) => {
                    outcome = Err(e);
                    break;
                }
                // The resolver rejects top-level `return`.
                Err(InterpretError::ReturnSignal(_)) => break,
            }
        }

        self.out.flush().map_err(LoxError::from)?;

        if outcome.is_ok() {
            info!("Interpretation completed successfully");
        }

        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(LoxError::from)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, environment.into_ref())?;
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Err(InterpretError::ReturnSignal(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods)?,
        }

        Ok(())
    }

    /// Run `statements` inside `environment`, restoring the current frame on
    /// every exit path (normal, `return`, runtime error).
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<()> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at = match &expr.kind {
                        ExprKind::Variable(token) => token,
                        _ => name,
                    };
                    return Err(LoxError::runtime(at, "Superclass must be a class.").into());
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let enclosing = superclass.as_ref().map(|superclass| {
            let mut environment = Environment::with_enclosing(self.environment.clone());
            environment.define("super", Value::Class(superclass.clone()));
            std::mem::replace(&mut self.environment, environment.into_ref())
        });

        let methods: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == "init";
                let function =
                    LoxFunction::new(method.clone(), self.environment.clone(), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);

        if let Some(enclosing) = enclosing {
            self.environment = enclosing;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.").into()),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.").into()),
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary(operator, left, right)
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Variable(name) => self.look_up_variable(name, expr),

            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(&expr.id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Some(callable) = callee.as_callable() else {
                    return Err(
                        LoxError::runtime(paren, "Can only call functions and classes.").into(),
                    );
                };

                if values.len() != callable.arity() {
                    let message = format!(
                        "Expected {} arguments but got {}.",
                        callable.arity(),
                        values.len()
                    );
                    return Err(LoxError::runtime(paren, message).into());
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(LoxError::runtime(paren, "Stack overflow.").into());
                }

                self.call_depth += 1;
                let result = callable.call(self, values);
                self.call_depth -= 1;

                result
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),
                _ => Err(LoxError::runtime(name, "Only instances have properties.").into()),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields.").into());
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            ExprKind::This(keyword) => self.look_up_variable(keyword, expr),

            ExprKind::Super { keyword, method } => self.evaluate_super(expr, keyword, method),
        }
    }

    fn look_up_variable(&self, name: &Token, expr: &Expr) -> IResult<Value> {
        let value = match self.locals.get(&expr.id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
                })?,
            None => self.globals.borrow().get(name)?,
        };

        debug!("Variable '{}' evaluated to: {}", name.lexeme, value);

        Ok(value)
    }

    /// `super.method`: the superclass sits at the recorded distance, the
    /// receiver one frame nearer.
    fn evaluate_super(&self, expr: &Expr, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance = self.locals.get(&expr.id).copied().ok_or_else(|| {
            LoxError::runtime(keyword, "Can't use 'super' outside of a class.")
        })?;

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.").into()),
        };

        let instance = match distance
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
        {
            Some(Value::Instance(instance)) => instance,
            _ => {
                return Err(
                    LoxError::runtime(keyword, "Can't use 'super' outside of a method.").into(),
                )
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }
}

/// Arithmetic, comparison and equality on already‑evaluated operands.
fn binary(operator: &Token, left: Value, right: Value) -> IResult<Value> {
    let numbers = |left: &Value, right: &Value| match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(InterpretError::from(LoxError::runtime(
            operator,
            "Operands must be numbers.",
        ))),
    };

    let value = match operator.token_type {
        TokenType::PLUS => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(a), Value::String(b)) => Value::from(format!("{}{}", a, b)),
            _ => {
                return Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into())
            }
        },

        TokenType::MINUS => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a - b)
        }

        TokenType::STAR => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a * b)
        }

        // No zero check: IEEE‑754 gives inf / NaN.
        TokenType::SLASH => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a / b)
        }

        TokenType::GREATER => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a > b)
        }

        TokenType::GREATER_EQUAL => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a >= b)
        }

        TokenType::LESS => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a < b)
        }

        TokenType::LESS_EQUAL => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a <= b)
        }

        TokenType::EQUAL_EQUAL => Value::Bool(left == right),

        TokenType::BANG_EQUAL => Value::Bool(left != right),

        _ => return Err(LoxError::runtime(operator, "Invalid binary operator.").into()),
    };

    Ok(value)
}
