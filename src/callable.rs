use chrono::Utc;
use log::debug;

use crate::interpreter::{IResult, Interpreter};
use crate::value::Value;

/// Anything a Lox call expression can invoke: natives, user functions and
/// classes.  Arity is checked by the interpreter before `call`.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value>;
}

/// A host function exposed in the global environment.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

/// Seconds since the Unix epoch, with sub‑second precision.
fn clock(_args: &[Value]) -> Value {
    let micros = Utc::now().timestamp_micros();

    Value::Number(micros as f64 / 1_000_000.0)
}

/// Every native the global environment starts with.
pub fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction {
        name: "clock",
        arity: 0,
        func: clock,
    }]
}
