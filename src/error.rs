use crate::value::Value;

pub type EvalResult = Result<Value, EvalError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Unbound Symbol '{0}'")]
    UnboundSymbol(String),
    #[error("S-Expression starts with incorrect type. Got {0}, Expected Function.")]
    NotAFunction(&'static str),
    #[error("Function passed too many arguments. Got {given}, Expected {total}.")]
    TooManyArguments { given: usize, total: usize },
    #[error("Function format invalid. Symbol '&' not followed by single symbol.")]
    InvalidVariadic,
    #[error("Cannot operate on non-number!")]
    NotANumber,
    #[error("Division By Zero!")]
    DivisionByZero,
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("Function '{func}' passed incorrect number of arguments. Got {got}, Expected {expected}.")]
    ArgCount {
        func: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("Function '{func}' passed incorrect type for argument {index}. Got {got}, Expected {expected}.")]
    ArgType {
        func: &'static str,
        index: usize,
        got: &'static str,
        expected: &'static str,
    },
    #[error("Function '{0}' passed {{}}!")]
    EmptyList(&'static str),
    #[error("Function '{func}' cannot define non-symbol. Got {got}, Expected Symbol.")]
    NonSymbol { func: &'static str, got: &'static str },
    #[error("Function '{func}' passed incorrect number of values for symbols. Got {got}, Expected {expected}.")]
    SymbolCount {
        func: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("Invalid Number '{0}'")]
    InvalidNumber(String),
}

impl From<EvalError> for Value {
    fn from(error: EvalError) -> Self {
        Value::Error(error.to_string())
    }
}
