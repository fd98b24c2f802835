use std::fmt;

use itertools::Itertools;

use crate::{
    env::{Env, EnvRef},
    error::EvalResult,
};

/// Formal parameter that collects every remaining argument
pub const VARIADIC: &str = "&";

pub type BuiltinFn = fn(&EnvRef, Vec<Value>) -> EvalResult;

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Error(String),
    Symbol(String),
    SExpr(Vec<Value>),
    QExpr(Vec<Value>),
    Function(Function),
}

#[derive(Debug, Clone)]
pub enum Function {
    Builtin(Builtin),
    Lambda(Box<Lambda>),
}

/// A native operation. Copies share the function pointer.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

/// A user-defined closure.
///
/// `env` holds the arguments bound so far. Its parent link stays empty until
/// every formal is bound, at which point the caller's environment is attached.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub formals: Vec<String>,
    pub body: Vec<Value>,
    pub env: Env,
}

impl Value {
    pub fn sexpr() -> Self {
        Value::SExpr(Vec::new())
    }
    pub fn qexpr() -> Self {
        Value::QExpr(Vec::new())
    }
    pub fn symbol<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Value::Symbol(name.into())
    }
    pub fn builtin(name: &'static str, func: BuiltinFn) -> Self {
        Value::Function(Function::Builtin(Builtin { name, func }))
    }
    /// Build a closure with a fresh, parentless environment
    pub fn lambda(formals: Vec<String>, body: Vec<Value>) -> Self {
        Value::Function(Function::Lambda(Box::new(Lambda {
            formals,
            body,
            env: Env::new(),
        })))
    }
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
            Value::Function(_) => "Function",
        }
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
    /// The children of a list value, or nothing for any other kind
    pub fn cells(&self) -> &[Value] {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => cells,
            _ => &[],
        }
    }
    pub fn into_cells(self) -> Vec<Value> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => cells,
            _ => Vec::new(),
        }
    }
    /// Remove the child at `index`, shifting the rest down.
    ///
    /// Panics if `self` is not a list or `index` is out of bounds.
    #[track_caller]
    pub fn pop(&mut self, index: usize) -> Value {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => cells.remove(index),
            other => unreachable!("pop from {}", other.kind_name()),
        }
    }
    /// Remove the child at `index` and drop the rest of the container
    #[track_caller]
    pub fn take(mut self, index: usize) -> Value {
        self.pop(index)
    }
    pub fn into_sexpr(self) -> Value {
        Value::SExpr(self.into_cells())
    }
    pub fn into_qexpr(self) -> Value {
        Value::QExpr(self.into_cells())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::SExpr(a), Value::SExpr(b)) => a == b,
            (Value::QExpr(a), Value::QExpr(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a.name == b.name,
            (Function::Lambda(a), Function::Lambda(b)) => {
                a.formals == b.formals && a.body == b.body
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:.6}", x),
            Value::Error(message) => write!(f, "Error: {}", message),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::SExpr(cells) => write!(f, "({})", cells.iter().format(" ")),
            Value::QExpr(cells) => write!(f, "{{{}}}", cells.iter().format(" ")),
            Value::Function(function) => write!(f, "{}", function),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Builtin(_) => write!(f, "<builtin>"),
            Function::Lambda(lambda) => write!(
                f,
                "(\\ {{{}}} {{{}}})",
                lambda.formals.iter().format(" "),
                lambda.body.iter().format(" ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(ns: &[i64]) -> Vec<Value> {
        ns.iter().copied().map(Value::Integer).collect()
    }

    #[test]
    fn display() {
        assert_eq!(Value::Integer(-42).to_string(), "-42");
        assert_eq!(Value::Float(3.0).to_string(), "3.000000");
        assert_eq!(Value::Error("oops".into()).to_string(), "Error: oops");
        assert_eq!(Value::sexpr().to_string(), "()");
        let nested = Value::QExpr(vec![
            Value::Integer(1),
            Value::symbol("x"),
            Value::SExpr(nums(&[2, 3])),
        ]);
        assert_eq!(nested.to_string(), "{1 x (2 3)}");
    }

    #[test]
    fn display_functions() {
        fn noop(_: &EnvRef, _: Vec<Value>) -> EvalResult {
            Ok(Value::sexpr())
        }
        assert_eq!(Value::builtin("noop", noop).to_string(), "<builtin>");
        let lambda = Value::lambda(
            vec!["x".into(), "y".into()],
            vec![Value::symbol("+"), Value::symbol("x"), Value::symbol("y")],
        );
        assert_eq!(lambda.to_string(), "(\\ {x y} {+ x y})");
    }

    #[test]
    fn pop_and_take() {
        let mut list = Value::QExpr(nums(&[1, 2, 3]));
        assert_eq!(list.pop(1), Value::Integer(2));
        assert_eq!(list, Value::QExpr(nums(&[1, 3])));
        assert_eq!(list.take(1), Value::Integer(3));
    }

    #[test]
    fn copies_are_independent() {
        let original = Value::QExpr(vec![Value::QExpr(nums(&[1, 2]))]);
        let mut copy = original.clone();
        copy.pop(0);
        assert_eq!(original.cells().len(), 1);
        assert!(copy.cells().is_empty());
    }

    #[test]
    fn equality_is_kind_sensitive() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::SExpr(nums(&[1])), Value::QExpr(nums(&[1])));
        assert_eq!(Value::QExpr(nums(&[1, 2])), Value::QExpr(nums(&[1, 2])));
    }
}
