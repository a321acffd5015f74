use std::fs;
use std::io::{self, Write};

use clap::Args;
use tracing::debug;

use bfdb::cli_util::print_analysis_error;
use bfdb::{analyze, Engine};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs { file, code, .. } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let source = if let Some(path) = file {
        match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{program}: failed to read code file as UTF-8: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        code.join("")
    };

    let parsed = match analyze(&source, false) {
        Ok(p) => p,
        Err(err) => {
            print_analysis_error(Some(program), &err);
            return 1;
        }
    };

    // Flush whatever the program printed before leaving on ctrl+c
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(130);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut engine = Engine::new(parsed);
    let status = engine.run();
    debug!(?status, "run complete");

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run "<code>"
  {0} run --file <PATH>

Options:
  --file, -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --help, -h         Show this help

Notes:
- Characters outside of Brainfuck's ><+-.,[] are comments.
- Input (`,`) reads a single byte from stdin; on EOF the current cell is set to 0.
- The tape is unbounded in both directions and cells wrap modulo 256.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Feed program input from a file:
    {0} run ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
