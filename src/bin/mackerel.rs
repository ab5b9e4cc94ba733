use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};

use mackerel::{repl::print_outcome, MackerelError, Mode, Outcome, Repl, Session};

#[derive(Parser)]
#[command(author, version, about = "Mackerel declaration language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Mackerel source file (`-` reads standard input)
    Run { script: PathBuf },
    /// Start an interactive session
    Repl,
    /// Evaluate a snippet given on the command line
    Eval { source: String },
}

const EXIT_DATA: u8 = 65;
const EXIT_SOFTWARE: u8 = 70;
const EXIT_IO: u8 = 74;

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let result = match args.command.unwrap_or(Command::Repl) {
        Command::Run { script } => read_script(&script).map(|source| run(&source, Mode::Batch)),
        Command::Eval { source } => Ok(run(&source, Mode::Interactive)),
        Command::Repl => Repl::new().run().map(|()| ExitCode::SUCCESS),
    };
    result.unwrap_or_else(|err| {
        eprintln!("error: {err}");
        ExitCode::from(EXIT_IO)
    })
}

/// Logs to stderr, only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_script(path: &Path) -> Result<String, MackerelError> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    Ok(fs::read_to_string(path)?)
}

fn run(source: &str, mode: Mode) -> ExitCode {
    let mut session = Session::new();
    let outcome = session.run(source, mode);
    print_outcome(&outcome);
    exit_code(&outcome)
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.lexical.has_errors() || outcome.syntactic.has_errors() {
        ExitCode::from(EXIT_DATA)
    } else if outcome.evaluation.has_errors() {
        ExitCode::from(EXIT_SOFTWARE)
    } else {
        ExitCode::SUCCESS
    }
}
