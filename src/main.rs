mod builtins;
mod env;
mod error;
mod eval;
mod parse;
mod repl;
mod value;

use std::path::PathBuf;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    init_tracing();

    let app = App::parse();

    match app.command.unwrap_or(Command::Repl) {
        Command::Repl => repl::repl(),
        Command::Run { path } => repl::run_file(&path),
    }
}

#[derive(Parser)]
#[clap(version, about = "An interactive evaluator for a small S-expression language")]
struct App {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start an interactive session
    #[clap(alias = "i")]
    Repl,
    /// Evaluate every expression in a file
    #[clap(alias = "r")]
    Run { path: PathBuf },
}

/// Enable with `RUST_LOG=tinylisp=debug` or `RUST_LOG=tinylisp=trace`
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
