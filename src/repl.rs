use std::{
    fs,
    io::{self, BufRead, IsTerminal, Write},
    iter, mem,
    path::Path,
};

use anyhow::Context;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    env::EnvRef,
    eval::{eval, global_env},
    parse::{parse, ParseResult},
    value::Value,
};

const PROMPT: &str = "tinylisp> ";
const INVALID_UTF8: &str = "Input is not valid UTF-8";

/// A line of input, or a message describing why it could not be read
pub type Line = Result<String, String>;

/// Parse one line as a root S-Expression and evaluate it
pub fn interpret(env: &EnvRef, input: &str) -> ParseResult<Value> {
    let value = parse(input)?;
    #[cfg(feature = "debug")]
    eprintln!("{:#?}", value);
    Ok(eval(env, value))
}

/// Run an interactive session on stdin.
///
/// A terminal gets line editing and history. Piped input is read line by
/// line without a prompt.
pub fn repl() -> anyhow::Result<()> {
    let env = global_env();
    let stdout = io::stdout();

    if !io::stdin().is_terminal() {
        let stdin = io::stdin();
        return run_lines(&env, read_lines(stdin.lock()), &mut stdout.lock())
            .context("failed to write output");
    }

    println!("TinyLisp Version {}", env!("CARGO_PKG_VERSION"));
    println!("Press Ctrl+c to Exit\n");

    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    let lines = iter::from_fn(|| match editor.readline(PROMPT) {
        Ok(line) => {
            if let Err(error) = editor.add_history_entry(line.as_str()) {
                tracing::warn!(%error, "failed to record history");
            }
            Some(Ok(line))
        }
        Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => None,
        Err(ReadlineError::Io(error)) if error.kind() == io::ErrorKind::InvalidData => {
            Some(Err(INVALID_UTF8.into()))
        }
        Err(error) => {
            tracing::error!(%error, "failed to read input");
            None
        }
    });
    run_lines(&env, lines, &mut stdout.lock()).context("failed to write output")
}

/// Split a byte stream into lines, flagging any that are not UTF-8
pub fn read_lines<R>(mut reader: R) -> impl Iterator<Item = Line>
where
    R: BufRead,
{
    let mut buf = Vec::new();
    iter::from_fn(move || match reader.read_until(b'\n', &mut buf) {
        Ok(0) => None,
        Ok(_) => {
            while matches!(buf.last(), Some(&b'\n') | Some(&b'\r')) {
                buf.pop();
            }
            Some(String::from_utf8(mem::take(&mut buf)).map_err(|_| INVALID_UTF8.into()))
        }
        Err(error) => {
            tracing::error!(%error, "failed to read input");
            None
        }
    })
}

/// Evaluate each line and print its result until the input ends
pub fn run_lines<I, W>(env: &EnvRef, lines: I, out: &mut W) -> io::Result<()>
where
    I: IntoIterator<Item = Line>,
    W: Write,
{
    for line in lines {
        match line {
            Ok(line) => match interpret(env, &line) {
                Ok(value) => writeln!(out, "{}", value)?,
                Err(error) => writeln!(out, "{}", error)?,
            },
            Err(message) => writeln!(out, "Error: {}", message)?,
        }
        out.flush()?;
    }
    Ok(())
}

pub fn run_file(path: &Path) -> anyhow::Result<()> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let stdout = io::stdout();
    run_source(&global_env(), &input, &mut stdout.lock())
        .with_context(|| format!("failed to run {}", path.display()))
}

/// Evaluate each top-level expression in order, reporting errors to `out`
pub fn run_source<W>(env: &EnvRef, input: &str, out: &mut W) -> anyhow::Result<()>
where
    W: Write,
{
    let root = parse(input)?;
    for expr in root.into_cells() {
        let result = eval(env, expr);
        if result.is_error() {
            writeln!(out, "{}", result)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_lines() {
        let env = global_env();
        assert_eq!(interpret(&env, "+ 1 2").unwrap(), Value::Integer(3));
        assert_eq!(interpret(&env, "def {x} 4").unwrap(), Value::sexpr());
        assert_eq!(interpret(&env, "* x x").unwrap().to_string(), "16");
        assert!(interpret(&env, "(+ 1").is_err());
    }

    #[test]
    fn session_survives_invalid_utf8() {
        let input: &[u8] = b"+ 1 2\n\xff\xfe\n+ 3 4\n";
        let mut out = Vec::new();
        run_lines(&global_env(), read_lines(input), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "3\nError: Input is not valid UTF-8\n7\n"
        );
    }

    #[test]
    fn session_keeps_state_across_lines() {
        let input: &[u8] = b"def {x} 5\r\n\n(+ x\n* x 2";
        let mut out = Vec::new();
        run_lines(&global_env(), read_lines(input), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "()");
        assert_eq!(lines[1], "()");
        assert!(lines[2..].iter().any(|line| line.contains("expected")), "{}", out);
        assert_eq!(lines.last(), Some(&"10"));
    }

    #[test]
    fn run_reports_errors_and_keeps_going() {
        let env = global_env();
        let source = "
            ; definitions
            (def {sq} (\\ {n} {* n n}))
            (/ 1 0)
            (def {nine} (sq 3))
            (nope)
        ";
        let mut out = Vec::new();
        run_source(&env, source, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "Error: Division By Zero!\nError: Unbound Symbol 'nope'\n"
        );
        assert_eq!(env.borrow().get("nine"), Value::Integer(9));
    }

    #[test]
    fn run_rejects_bad_syntax() {
        let mut out = Vec::new();
        assert!(run_source(&global_env(), "(def {x} 1", &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_file() {
        assert!(run_file(Path::new("definitely/not/here.lspy")).is_err());
    }
}
