use std::iter::once;

use crate::{
    env::{Env, EnvRef},
    error::EvalError,
    value::{Function, Lambda, Value, VARIADIC},
};

/// Reduce a value to its result in `env`
pub fn eval(env: &EnvRef, value: Value) -> Value {
    match value {
        Value::Symbol(name) => env.borrow().get(&name),
        Value::SExpr(cells) => eval_sexpr(env, cells),
        value => value,
    }
}

fn eval_sexpr(env: &EnvRef, cells: Vec<Value>) -> Value {
    let mut cells: Vec<Value> = cells.into_iter().map(|cell| eval(env, cell)).collect();

    if let Some(i) = cells.iter().position(Value::is_error) {
        return cells.swap_remove(i);
    }

    match cells.len() {
        0 => return Value::SExpr(cells),
        1 => return Value::SExpr(cells).take(0),
        _ => {}
    }

    let first = cells.remove(0);
    match first {
        Value::Function(function) => call(env, function, cells),
        other => EvalError::NotAFunction(other.kind_name()).into(),
    }
}

/// Apply a function to already evaluated arguments
pub fn call(env: &EnvRef, function: Function, args: Vec<Value>) -> Value {
    match function {
        Function::Builtin(builtin) => {
            tracing::debug!(name = builtin.name, args = args.len(), "builtin call");
            (builtin.func)(env, args).unwrap_or_else(Value::from)
        }
        Function::Lambda(lambda) => call_lambda(env, *lambda, args).unwrap_or_else(Value::from),
    }
}

fn call_lambda(env: &EnvRef, mut lambda: Lambda, args: Vec<Value>) -> Result<Value, EvalError> {
    let given = args.len();
    let total = lambda.formals.len();
    tracing::debug!(given, total, "lambda call");

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if lambda.formals.is_empty() {
            return Err(EvalError::TooManyArguments { given, total });
        }
        let formal = lambda.formals.remove(0);
        if formal == VARIADIC {
            if lambda.formals.len() != 1 {
                return Err(EvalError::InvalidVariadic);
            }
            let rest = lambda.formals.remove(0);
            let collected = once(arg).chain(args.by_ref()).collect();
            lambda.env.put(rest, Value::QExpr(collected));
            break;
        }
        lambda.env.put(formal, arg);
    }

    // No arguments were left for a trailing variadic formal
    if lambda.formals.first().map(String::as_str) == Some(VARIADIC) {
        if lambda.formals.len() != 2 {
            return Err(EvalError::InvalidVariadic);
        }
        let rest = lambda.formals.remove(1);
        lambda.formals.clear();
        lambda.env.put(rest, Value::qexpr());
    }

    if !lambda.formals.is_empty() {
        tracing::trace!(
            remaining = lambda.formals.len(),
            bound = lambda.env.len(),
            "partial application"
        );
        return Ok(Value::Function(Function::Lambda(Box::new(lambda))));
    }

    let Lambda {
        body,
        env: mut scope,
        ..
    } = lambda;
    scope.set_parent(Some(env.clone()));
    let scope = scope.into_ref();
    Ok(eval(&scope, Value::SExpr(body)))
}

/// Build an environment holding every builtin
pub fn global_env() -> EnvRef {
    let env = Env::new().into_ref();
    crate::builtins::add_builtins(&env);
    env
}

#[cfg(test)]
pub(crate) fn run(env: &EnvRef, input: &str) -> Value {
    let root = crate::parse::parse(input).expect("input should parse");
    eval(env, root)
}
