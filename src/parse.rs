#![allow(clippy::upper_case_acronyms)]

use pest::{error::Error as PestError, iterators::Pair, Parser};

use crate::{error::EvalError, value::Value};

pub type ParseResult<T> = Result<T, PestError<Rule>>;

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct LispyParser;

/// Parse a whole input into a root S-Expression
pub fn parse(input: &str) -> ParseResult<Value> {
    let mut pairs = LispyParser::parse(Rule::lispy, input)?;
    match pairs.next() {
        Some(pair) => Ok(read(pair)),
        None => Ok(Value::sexpr()),
    }
}

/// Build a value tree from a parsed pair
pub fn read(pair: Pair<Rule>) -> Value {
    match pair.as_rule() {
        Rule::number => match pair.as_str().parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => EvalError::InvalidNumber(pair.as_str().into()).into(),
        },
        Rule::float => match pair.as_str().parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => EvalError::InvalidNumber(pair.as_str().into()).into(),
        },
        Rule::symbol => Value::symbol(pair.as_str()),
        Rule::qexpr => Value::QExpr(read_cells(pair)),
        Rule::lispy | Rule::sexpr => Value::SExpr(read_cells(pair)),
        rule => unreachable!("{:?}", rule),
    }
}

fn read_cells(pair: Pair<Rule>) -> Vec<Value> {
    pair.into_inner()
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(read)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    #[test]
    fn atoms() {
        assert_eq!(
            parse("1 -2 3.5 -0.25 + foo &").unwrap(),
            Value::SExpr(vec![
                int(1),
                int(-2),
                Value::Float(3.5),
                Value::Float(-0.25),
                Value::symbol("+"),
                Value::symbol("foo"),
                Value::symbol("&"),
            ])
        );
    }

    #[test]
    fn nested() {
        assert_eq!(
            parse("(+ 1 {2 (3)}) ; trailing comment").unwrap(),
            Value::SExpr(vec![Value::SExpr(vec![
                Value::symbol("+"),
                int(1),
                Value::QExpr(vec![int(2), Value::SExpr(vec![int(3)])]),
            ])])
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse("").unwrap(), Value::sexpr());
        assert_eq!(parse("   ").unwrap(), Value::sexpr());
    }

    #[test]
    fn overflow_reads_as_error() {
        let root = parse("99999999999999999999").unwrap();
        assert_eq!(
            root.cells(),
            &[Value::Error(
                "Invalid Number '99999999999999999999'".into()
            )]
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(parse("(+ 1 2").is_err());
        assert!(parse("{1 2))").is_err());
        assert!(parse("#").is_err());
    }

    #[test]
    fn printed_qexpr_reparses() {
        let text = "{1 2 {3 4}}";
        let value = parse(text).unwrap().take(0);
        let printed = value.to_string();
        assert_eq!(printed, text);
        assert_eq!(parse(&printed).unwrap().take(0), value);
    }
}
