mod commands;

use std::env;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use commands::debug::DebugArgs;
use commands::run::RunArgs;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run   "<code>"                    # Run Brainfuck code (args are concatenated)
  {0} run   --file <PATH>               # Run Brainfuck code loaded from file
  {0} debug [--bare|--editor] <PATH>    # Open the debug shell on a source file

Run "{0} <subcommand> --help" for more info.
Set BFDB_LOG (or RUST_LOG) to e.g. "debug" for diagnostic logging on stderr.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfdb", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Debug(DebugArgs),
}

fn init_logging() {
    // BFDB_LOG wins over RUST_LOG; default to WARN if neither parses
    let filter = env::var("BFDB_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bfdb"));

    let cli = Cli::parse();

    let Some(command) = cli.command.filter(|_| !cli.help) else {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    };

    let code = match command {
        Command::Run(args) => commands::run::run(&program, args),
        Command::Debug(args) => commands::debug::run(&program, args),
    };

    std::process::exit(code);
}
