use std::cmp::Ordering;

use itertools::Itertools;

use crate::{
    env::{Env, EnvRef},
    error::{EvalError, EvalResult},
    eval::eval,
    value::{BuiltinFn, Value},
};

macro_rules! builtin_functions {
    ($($name:literal => $func:path),* $(,)?) => {
        &[$(($name, $func as BuiltinFn)),*]
    };
}

pub const BUILTIN_FUNCTIONS: &[(&str, BuiltinFn)] = builtin_functions!(
    // Lists
    "list" => list,
    "head" => head,
    "tail" => tail,
    "init" => init,
    "len" => len,
    "cons" => cons,
    "eval" => eval_qexpr,
    "join" => join,
    // Binding
    "def" => def,
    "=" => put,
    "\\" => lambda,
    // Arithmetic
    "+" => add,
    "-" => sub,
    "*" => mul,
    "/" => div,
    "%" => rem,
    "^" => pow,
    "min" => min,
    "max" => max,
    // Comparison
    ">" => gt,
    "<" => lt,
    ">=" => ge,
    "<=" => le,
    "==" => eq,
    "!=" => ne,
    // Control
    "if" => if_,
    "print" => print,
);

/// Bind every builtin in `env`
pub fn add_builtins(env: &EnvRef) {
    let mut env = env.borrow_mut();
    for &(name, func) in BUILTIN_FUNCTIONS {
        env.put(name, Value::builtin(name, func));
    }
}

fn expect_count(func: &'static str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::ArgCount {
            func,
            got: args.len(),
            expected,
        })
    }
}

fn expect_qexpr(func: &'static str, args: &[Value], index: usize) -> Result<(), EvalError> {
    match args.get(index) {
        Some(Value::QExpr(_)) => Ok(()),
        Some(other) => Err(EvalError::ArgType {
            func,
            index,
            got: other.kind_name(),
            expected: "Q-Expression",
        }),
        None => Err(EvalError::ArgCount {
            func,
            got: args.len(),
            expected: index + 1,
        }),
    }
}

fn expect_non_empty(func: &'static str, list: &Value) -> Result<(), EvalError> {
    if list.cells().is_empty() {
        Err(EvalError::EmptyList(func))
    } else {
        Ok(())
    }
}

/* Lists */

fn list(_: &EnvRef, args: Vec<Value>) -> EvalResult {
    Ok(Value::SExpr(args).into_qexpr())
}

fn head(_: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("head", &args, 1)?;
    expect_qexpr("head", &args, 0)?;
    let list = args.remove(0);
    expect_non_empty("head", &list)?;
    Ok(Value::QExpr(vec![list.take(0)]))
}

fn tail(_: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("tail", &args, 1)?;
    expect_qexpr("tail", &args, 0)?;
    let mut list = args.remove(0);
    expect_non_empty("tail", &list)?;
    list.pop(0);
    Ok(list)
}

fn init(_: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("init", &args, 1)?;
    expect_qexpr("init", &args, 0)?;
    let mut list = args.remove(0);
    expect_non_empty("init", &list)?;
    let last = list.cells().len() - 1;
    list.pop(last);
    Ok(list)
}

fn len(_: &EnvRef, args: Vec<Value>) -> EvalResult {
    expect_count("len", &args, 1)?;
    expect_qexpr("len", &args, 0)?;
    Ok(Value::Integer(args[0].cells().len() as i64))
}

fn cons(_: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("cons", &args, 2)?;
    expect_qexpr("cons", &args, 1)?;
    let value = args.remove(0);
    let mut cells = args.remove(0).into_cells();
    cells.insert(0, value);
    Ok(Value::QExpr(cells))
}

fn eval_qexpr(env: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("eval", &args, 1)?;
    expect_qexpr("eval", &args, 0)?;
    Ok(eval(env, args.remove(0).into_sexpr()))
}

fn join(_: &EnvRef, args: Vec<Value>) -> EvalResult {
    expect_qexpr("join", &args, 0)?;
    for i in 1..args.len() {
        expect_qexpr("join", &args, i)?;
    }
    let mut joined = Vec::new();
    for arg in args {
        joined.extend(arg.into_cells());
    }
    Ok(Value::QExpr(joined))
}

/* Binding */

fn def(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    bind("def", args, |name, value| Env::def(env, name, value))
}

fn put(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    bind("=", args, |name, value| env.borrow_mut().put(name, value))
}

fn bind<F>(func: &'static str, mut args: Vec<Value>, mut install: F) -> EvalResult
where
    F: FnMut(String, Value),
{
    expect_qexpr(func, &args, 0)?;
    let symbols = args.remove(0).into_cells();
    let names = symbol_names(func, symbols)?;
    if names.len() != args.len() {
        return Err(EvalError::SymbolCount {
            func,
            got: args.len(),
            expected: names.len(),
        });
    }
    for (name, value) in names.into_iter().zip(args) {
        install(name, value);
    }
    Ok(Value::sexpr())
}

fn symbol_names(func: &'static str, cells: Vec<Value>) -> Result<Vec<String>, EvalError> {
    cells
        .into_iter()
        .map(|cell| match cell {
            Value::Symbol(name) => Ok(name),
            other => Err(EvalError::NonSymbol {
                func,
                got: other.kind_name(),
            }),
        })
        .collect()
}

fn lambda(_: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("\\", &args, 2)?;
    expect_qexpr("\\", &args, 0)?;
    expect_qexpr("\\", &args, 1)?;
    let formals = symbol_names("\\", args.remove(0).into_cells())?;
    let body = args.remove(0).into_cells();
    Ok(Value::lambda(formals, body))
}

/* Arithmetic */

macro_rules! arithmetic {
    ($($func:ident => $op:literal),* $(,)?) => {
        $(fn $func(_: &EnvRef, args: Vec<Value>) -> EvalResult {
            arith($op, args)
        })*
    };
}

arithmetic!(
    add => "+",
    sub => "-",
    mul => "*",
    div => "/",
    rem => "%",
    pow => "^",
    min => "min",
    max => "max",
);

/// Left fold `op` over the arguments, promoting to float where one participates
fn arith(op: &'static str, args: Vec<Value>) -> EvalResult {
    if args.iter().any(|arg| arg.as_float().is_none()) {
        return Err(EvalError::NotANumber);
    }
    let mut args = args.into_iter();
    let first = args.next().ok_or(EvalError::ArgCount {
        func: op,
        got: 0,
        expected: 1,
    })?;
    if op == "-" && args.len() == 0 {
        return Ok(match first {
            Value::Integer(i) => Value::Integer(i.wrapping_neg()),
            Value::Float(f) => Value::Float(-f),
            _ => return Err(EvalError::NotANumber),
        });
    }
    args.try_fold(first, |acc, next| combine(op, acc, next))
}

fn combine(op: &str, x: Value, y: Value) -> EvalResult {
    match (&x, &y) {
        (Value::Integer(a), Value::Integer(b)) => int_op(op, *a, *b).map(Value::Integer),
        _ => match (x.as_float(), y.as_float()) {
            (Some(a), Some(b)) => float_op(op, a, b).map(Value::Float),
            _ => Err(EvalError::NotANumber),
        },
    }
}

fn int_op(op: &str, a: i64, b: i64) -> Result<i64, EvalError> {
    Ok(match op {
        "+" => a.wrapping_add(b),
        "-" => a.wrapping_sub(b),
        "*" => a.wrapping_mul(b),
        "/" if b == 0 => return Err(EvalError::DivisionByZero),
        "/" => a.wrapping_div(b),
        "%" if b == 0 => return Err(EvalError::DivisionByZero),
        "%" => a.wrapping_rem(b),
        "^" => int_pow(a, b),
        "min" => a.min(b),
        "max" => a.max(b),
        _ => return Err(EvalError::UnknownOperator(op.into())),
    })
}

fn float_op(op: &str, a: f64, b: f64) -> Result<f64, EvalError> {
    Ok(match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        "%" => a % b,
        "^" => a.powf(b),
        "min" => a.min(b),
        "max" => a.max(b),
        _ => return Err(EvalError::UnknownOperator(op.into())),
    })
}

/// Exponentiation by squaring. Negative exponents yield 1.
fn int_pow(mut base: i64, mut exp: i64) -> i64 {
    let mut result: i64 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

/* Comparison */

macro_rules! comparison {
    ($($func:ident => $op:literal: $test:path),* $(,)?) => {
        $(fn $func(_: &EnvRef, args: Vec<Value>) -> EvalResult {
            let ordering = compare($op, &args)?;
            Ok(Value::Integer(ordering.map_or(false, $test) as i64))
        })*
    };
}

comparison!(
    gt => ">": Ordering::is_gt,
    lt => "<": Ordering::is_lt,
    ge => ">=": Ordering::is_ge,
    le => "<=": Ordering::is_le,
);

fn compare(func: &'static str, args: &[Value]) -> Result<Option<Ordering>, EvalError> {
    expect_count(func, args, 2)?;
    Ok(match (&args[0], &args[1]) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (x, y) => match (x.as_float(), y.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(EvalError::NotANumber),
        },
    })
}

fn eq(_: &EnvRef, args: Vec<Value>) -> EvalResult {
    expect_count("==", &args, 2)?;
    Ok(Value::Integer((args[0] == args[1]) as i64))
}

fn ne(_: &EnvRef, args: Vec<Value>) -> EvalResult {
    expect_count("!=", &args, 2)?;
    Ok(Value::Integer((args[0] != args[1]) as i64))
}

/* Control */

fn if_(env: &EnvRef, mut args: Vec<Value>) -> EvalResult {
    expect_count("if", &args, 3)?;
    let truthy = match &args[0] {
        Value::Integer(i) => *i != 0,
        other => {
            return Err(EvalError::ArgType {
                func: "if",
                index: 0,
                got: other.kind_name(),
                expected: "Integer",
            })
        }
    };
    expect_qexpr("if", &args, 1)?;
    expect_qexpr("if", &args, 2)?;
    let branch = if truthy { args.swap_remove(1) } else { args.swap_remove(2) };
    Ok(eval(env, branch.into_sexpr()))
}

fn print(_: &EnvRef, args: Vec<Value>) -> EvalResult {
    println!("{}", args.iter().format(" "));
    Ok(Value::sexpr())
}
