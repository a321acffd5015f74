use std::fs;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Args;

use bfdb::cli_util::{print_analysis_error, print_warnings};
use bfdb::repl::{run_bare, run_editor, select_mode, ModeFlagOverride, ShellMode};
use bfdb::shell::DebugShell;
use bfdb::{analyze, config, Engine};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct DebugArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Brainfuck source file to debug
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: DebugArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let Some(path) = args.path else {
        usage_and_exit(program, 2);
    };

    let mode_flag = if args.bare {
        ModeFlagOverride::Bare
    } else if args.editor {
        ModeFlagOverride::Editor
    } else {
        ModeFlagOverride::None
    };

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match select_mode(mode_flag) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let source = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: failed to read code file as UTF-8: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let parsed = match analyze(&source, true) {
        Ok(p) => p,
        Err(err) => {
            print_analysis_error(Some(program), &err);
            return 1;
        }
    };
    print_warnings(program, parsed.warnings());

    // Ctrl+c suspends a running program instead of ending the session
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut engine = Engine::new(parsed);
    engine.set_interrupt(interrupt);

    let settings = config::settings().clone();
    let styled = io::stdout().is_terminal();
    let mut shell = DebugShell::new(engine, io::stdout(), settings).with_color(styled);

    // Print banners only if stderr is a TTY
    if io::stderr().is_terminal() {
        let loaded = shell.engine().program();
        eprintln!(
            "Debugging {path}: {} instructions, {} lines. Type h for help.",
            loaded.len(),
            loaded.line_count()
        );
        let _ = io::stderr().flush();
    }

    let result = match mode {
        ShellMode::Editor => run_editor(&mut shell),
        ShellMode::Bare => run_bare(&mut shell),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: shell error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} debug [--bare|--editor] <PATH>

Options:
  --bare        Force non-interactive bare mode
  --editor      Force interactive editor mode (errors if stdin is not a TTY)
  --help, -h    Show this help

Description:
  Loads PATH with line information and opens a debug shell. Type "h" in the
  shell for the list of commands.

Notes:
    - Breakpoints are set by source line; lines without instructions map to
      the next line that has one.
    - Ctrl+C suspends a running program; Ctrl+D or "q" leaves the shell.
    - In bare mode, a program's `,` reads from stdin after the current command line.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: BFDB_SHELL_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
        * Prompts/banners suppressed if stderr is not a TTY.
    - Settings are read from $XDG_CONFIG_HOME/bfdb.toml ([shell] and [colors]).
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
