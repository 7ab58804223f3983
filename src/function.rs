use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::callable::Callable;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::LoxError;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::value::Value;

/// A user‑defined function or method together with the environment it
/// closed over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: environment.into_ref(),
            is_initializer: self.is_initializer,
        }
    }

    /// The instance an initializer hands back, whatever its body returned.
    fn bound_this(&self) -> IResult<Value> {
        Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
            InterpretError::Runtime(LoxError::runtime(
                &self.declaration.name,
                "Initializer is not bound to an instance.",
            ))
        })
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let mut environment = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let returned = match interpreter.execute_block(&self.declaration.body, environment.into_ref())
        {
            Ok(()) => Value::Nil,
            Err(InterpretError::ReturnSignal(value)) => value,
            Err(e) => return Err(e),
        };

        if self.is_initializer {
            return self.bound_this();
        }

        info!("Function '{}' returned: {}", self.name(), returned);

        Ok(returned)
    }
}
