//! Veles — the interactive shell of the Veles logic-synthesis toolchain.
//!
//! Runs a command loop over stdin, a script file, or a `-c` command
//! string. Commands load netlists, run optimization passes and technology
//! mapping, manage save points, and emit results; see `help` for the full
//! surface.

#![warn(missing_docs)]

mod graphml;
mod lec;
mod shell;
mod writers;

use clap::Parser;
use shell::{Flow, ShellContext};
use std::io::{BufRead, Write};
use std::process::ExitCode;

/// Veles — gate-level logic synthesis.
#[derive(Parser, Debug)]
#[command(name = "veles", version, about = "Veles logic synthesis shell")]
struct Cli {
    /// Script file to execute instead of the interactive loop.
    script: Option<String>,

    /// Execute a single command line and exit.
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    /// Suppress command output.
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn drain_output(ctx: &mut ShellContext, quiet: bool) {
    if !quiet && !ctx.output.is_empty() {
        print!("{}", ctx.output);
        let _ = std::io::stdout().flush();
    }
    ctx.output.clear();
}

fn run_lines(
    ctx: &mut ShellContext,
    lines: impl Iterator<Item = String>,
    quiet: bool,
    interactive: bool,
) -> ExitCode {
    let mut status = ExitCode::SUCCESS;
    for line in lines {
        match ctx.run_line(&line) {
            Ok(Flow::Continue) => {
                drain_output(ctx, quiet);
            }
            Ok(Flow::Exit) => {
                drain_output(ctx, quiet);
                return status;
            }
            Err(message) => {
                drain_output(ctx, quiet);
                eprintln!("error: {message}");
                status = ExitCode::FAILURE;
                if !interactive {
                    return status;
                }
            }
        }
        if interactive && !quiet {
            print!("veles> ");
            let _ = std::io::stdout().flush();
        }
    }
    status
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match veles_config::load_config(&veles_config::home_dir()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };
    let mut ctx = ShellContext::new(config);

    if let Some(command) = cli.command {
        return run_lines(&mut ctx, std::iter::once(command), cli.quiet, false);
    }

    if let Some(path) = cli.script {
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) => {
                eprintln!("error: cannot read '{path}': {error}");
                return ExitCode::FAILURE;
            }
        };
        let lines: Vec<String> = source.lines().map(|s| s.to_string()).collect();
        return run_lines(&mut ctx, lines.into_iter(), cli.quiet, false);
    }

    if !cli.quiet {
        println!("veles {} — type 'help' for commands", env!("CARGO_PKG_VERSION"));
        print!("veles> ");
        let _ = std::io::stdout().flush();
    }
    let stdin = std::io::stdin();
    let lines = stdin.lock().lines().map_while(Result::ok);
    run_lines(&mut ctx, lines, cli.quiet, true)
}
