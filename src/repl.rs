use std::env;
use std::io::{self, BufRead, IsTerminal, Write};

use reedline::{
    default_emacs_keybindings, DefaultCompleter, DefaultPrompt, DefaultPromptSegment, Emacs,
    ExampleHighlighter, FileBackedHistory, IdeMenu, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};

use crate::shell::{DebugShell, Flow};

/// Words the editor completes and highlights.
const COMMAND_WORDS: &[&str] = &[
    "run", "continue", "step", "detailed", "until", "stop", "tape", "ptr", "break", "delete",
    "watch", "peek", "info", "next", "reset", "code", "clear", "help", "quit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Pick the front end: flags, then `BFDB_SHELL_MODE`, then whether stdin is a TTY.
pub fn select_mode(flag: ModeFlagOverride) -> Result<ShellMode, String> {
    resolve_mode(flag, env::var("BFDB_SHELL_MODE").ok().as_deref(), io::stdin().is_terminal())
}

fn resolve_mode(
    flag: ModeFlagOverride,
    env_value: Option<&str>,
    stdin_is_tty: bool,
) -> Result<ShellMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ShellMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_is_tty {
                return Err("cannot start editor: stdin is not a TTY (use --bare or BFDB_SHELL_MODE=bare)".to_string());
            }
            return Ok(ShellMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_value {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ShellMode::Bare),
            "editor" => {
                if !stdin_is_tty {
                    return Err("cannot start editor: stdin is not a TTY (use BFDB_SHELL_MODE=bare)".to_string());
                }
                Ok(ShellMode::Editor)
            }
            _ => Err(format!("invalid BFDB_SHELL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if stdin_is_tty { Ok(ShellMode::Editor) } else { Ok(ShellMode::Bare) }
}

/// Read one command line. `None` on EOF.
pub fn read_command<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    match input.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}

/// Feed commands from `next_line` until EOF or `quit`. The prompt goes to
/// stderr and only when `show_prompt` is set.
pub fn bare_loop<W, F>(shell: &mut DebugShell<W>, show_prompt: bool, mut next_line: F) -> io::Result<()>
where
    W: Write,
    F: FnMut() -> io::Result<Option<String>>,
{
    loop {
        if show_prompt {
            eprint!("{}", shell.prompt());
            let _ = io::stderr().flush();
        }

        let Some(line) = next_line()? else {
            return Ok(());
        };

        if shell.execute(&line)? == Flow::Quit {
            return Ok(());
        }
    }
}

/// Run the shell on stdin one line at a time. Stdin is not held locked
/// between commands, so a program's `,` reads whatever follows the command.
pub fn run_bare<W: Write>(shell: &mut DebugShell<W>) -> io::Result<()> {
    let show_prompt = io::stderr().is_terminal();
    bare_loop(shell, show_prompt, || read_command(&mut io::stdin().lock()))
}

fn init_line_editor() -> io::Result<Reedline> {
    let words: Vec<String> = COMMAND_WORDS.iter().map(|w| w.to_string()).collect();

    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&['-', '_']);
        completions.insert(words.clone());
        completions
    });
    let completion_menu = Box::new(IdeMenu::default().with_name("completion_menu"));

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );

    let history = FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(ExampleHighlighter::new(words)))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

/// Run the shell inside an interactive line editor with history and
/// command completion. Ctrl+C clears the line; Ctrl+D quits.
pub fn run_editor<W: Write>(shell: &mut DebugShell<W>) -> io::Result<()> {
    let mut editor = init_line_editor()?;
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(shell.prompt().trim_end().to_string()),
        DefaultPromptSegment::Empty,
    );

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if shell.execute(&line)? == Flow::Quit {
                    return Ok(());
                }
            }
            Ok(Signal::CtrlC) => continue,
            Ok(Signal::CtrlD) => {
                println!();
                return Ok(());
            }
            Err(e) => {
                eprintln!("bfdb: editor error: {e}");
                let _ = io::stderr().flush();
                return Ok(());
            }
        }
    }
}
