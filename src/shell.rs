//! The debug shell: turns command lines into engine calls and renders what
//! the engine reports.
//!
//! The shell is agnostic of where lines come from; `repl` feeds it either
//! from a line editor or from plain stdin.

use std::io::{self, Write};
use std::str::FromStr;

use nu_ansi_term::Color;
use tracing::debug;

use crate::config::Settings;
use crate::engine::{DebugError, Engine, Status, Suspend};

pub const HELP: &str = "\
Execute commands:
r[un]                    : Run code from the beginning
c[ontinue]               : Continue running code
s[tep] [times]           : Step by times, default 1
d[etailed] [times]       : Detailed step for times, default until finished
u[ntil]                  : Continue until the current loop exits
stop [index]             : Stop once before operator index, or show the stop point

Debug commands:
b[reak] <line>           : Set breakpoint at line
w[atch] <address>        : Watch memory at address
del[ete] s|b|w <num>     : Delete the stop point, a breakpoint or a watchpoint
i[nfo] [s|b|w]           : Show stop point, breakpoints or watchpoints, default all
clear [s|b|w]            : Clear stop point, breakpoints or watchpoints, default all

Memory commands:
ptr                      : Show current memory pointer
p[eek] [offset [length]] : Peek memory bytes relative to the pointer
t[ape]                   : Show tape around the pointer
reset                    : Reset memory tape

Other commands:
n[ext]                   : Show next operator to be executed
code                     : Show analysed code
h[elp]                   : Show this help message
q[uit]                   : Quit debug shell
";

/// Longest byte run a single `peek` prints.
pub const PEEK_LIMIT: usize = 4096;

/// Which debugger setting a `delete`, `info` or `clear` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Stop,
    Breakpoints,
    Watches,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Continue,
    Step(u64),
    Detailed(Option<u64>),
    Until,
    Stop(Option<usize>),
    Tape,
    Pointer,
    Break(usize),
    DeleteStop,
    DeleteBreakpoint(usize),
    DeleteWatch(usize),
    Watch(isize),
    Peek { offset: isize, len: usize },
    Info(Option<Target>),
    Next,
    Reset,
    Code,
    Clear(Option<Target>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type h for help")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

fn no_args(args: &[&str], usage: &'static str) -> Result<(), CommandError> {
    if args.is_empty() { Ok(()) } else { Err(CommandError::Usage(usage)) }
}

fn number<T: FromStr>(arg: &str, usage: &'static str) -> Result<T, CommandError> {
    arg.parse().map_err(|_| CommandError::Usage(usage))
}

fn target(arg: &str, usage: &'static str) -> Result<Target, CommandError> {
    match arg {
        "s" => Ok(Target::Stop),
        "b" => Ok(Target::Breakpoints),
        "w" => Ok(Target::Watches),
        _ => Err(CommandError::Usage(usage)),
    }
}

impl Command {
    /// Parse one command line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match name {
            "r" | "run" => no_args(&args, "run").map(|_| Command::Run)?,
            "c" | "continue" => no_args(&args, "continue").map(|_| Command::Continue)?,
            "u" | "until" => no_args(&args, "until").map(|_| Command::Until)?,
            "t" | "tape" => no_args(&args, "tape").map(|_| Command::Tape)?,
            "ptr" => no_args(&args, "ptr").map(|_| Command::Pointer)?,
            "n" | "next" => no_args(&args, "next").map(|_| Command::Next)?,
            "reset" => no_args(&args, "reset").map(|_| Command::Reset)?,
            "code" => no_args(&args, "code").map(|_| Command::Code)?,
            "h" | "help" => Command::Help,
            "q" | "quit" => Command::Quit,

            "s" | "step" => {
                const USAGE: &str = "s[tep] [times]";
                match args.as_slice() {
                    [] => Command::Step(1),
                    [times] => Command::Step(number(times, USAGE)?),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "d" | "detailed" => {
                const USAGE: &str = "d[etailed] [times]";
                match args.as_slice() {
                    [] => Command::Detailed(None),
                    [times] => Command::Detailed(Some(number(times, USAGE)?)),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "stop" => {
                const USAGE: &str = "stop [index]";
                match args.as_slice() {
                    [] => Command::Stop(None),
                    [index] => Command::Stop(Some(number(index, USAGE)?)),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "b" | "break" => {
                const USAGE: &str = "b[reak] <line>";
                match args.as_slice() {
                    [line] => Command::Break(number(line, USAGE)?),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "w" | "watch" => {
                const USAGE: &str = "w[atch] <address>";
                match args.as_slice() {
                    [address] => Command::Watch(number(address, USAGE)?),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "del" | "delete" => {
                const USAGE: &str = "del[ete] s|b|w <num>";
                match args.as_slice() {
                    ["s"] | ["s", _] => Command::DeleteStop,
                    ["b", num] => Command::DeleteBreakpoint(number(num, USAGE)?),
                    ["w", num] => Command::DeleteWatch(number(num, USAGE)?),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "p" | "peek" => {
                const USAGE: &str = "p[eek] [offset [length]]";
                match args.as_slice() {
                    [] => Command::Peek { offset: 0, len: 1 },
                    [offset] => Command::Peek { offset: number(offset, USAGE)?, len: 1 },
                    [offset, len] => {
                        let len: usize = number(len, USAGE)?;
                        if len > PEEK_LIMIT {
                            return Err(CommandError::Usage(USAGE));
                        }
                        Command::Peek { offset: number(offset, USAGE)?, len }
                    }
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "i" | "info" => {
                const USAGE: &str = "i[nfo] [s|b|w]";
                match args.as_slice() {
                    [] => Command::Info(None),
                    [which] => Command::Info(Some(target(which, USAGE)?)),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "clear" => {
                const USAGE: &str = "clear [s|b|w]";
                match args.as_slice() {
                    [] => Command::Clear(None),
                    [which] => Command::Clear(Some(target(which, USAGE)?)),
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Whether the shell should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A debug session bound to an output stream.
pub struct DebugShell<W: Write> {
    engine: Engine,
    out: W,
    settings: Settings,
    styled: bool,
}

impl<W: Write> DebugShell<W> {
    pub fn new(engine: Engine, out: W, settings: Settings) -> Self {
        Self { engine, out, settings, styled: false }
    }

    /// Paint status lines with the configured colours.
    pub fn with_color(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn prompt(&self) -> &str {
        &self.settings.prompt
    }

    /// Execute one command line.
    pub fn execute(&mut self, line: &str) -> io::Result<Flow> {
        // A ctrl+c pressed at the prompt must not interrupt the next command.
        self.engine.take_interrupt();

        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                let color = self.settings.colors.error;
                self.say(color, &e.to_string())?;
                self.out.flush()?;
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "shell command");
        let flow = self.dispatch(command)?;
        self.out.flush()?;
        Ok(flow)
    }

    fn dispatch(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Run => {
                let status = self.engine.run();
                self.report(status)?;
            }
            Command::Continue => {
                if self.require_running()? {
                    let status = self.engine.resume();
                    self.report(status)?;
                }
            }
            Command::Until => {
                if self.require_running()? {
                    if self.engine.arm_until() {
                        self.note("Entering until mode")?;
                    } else {
                        self.note("Already in until mode")?;
                    }
                    let status = self.engine.resume();
                    self.report(status)?;
                }
            }
            Command::Step(times) => self.step(times)?,
            Command::Detailed(times) => self.detailed(times)?,
            Command::Stop(None) => self.show_stop()?,
            Command::Stop(Some(index)) => match self.engine.set_stop(index) {
                Ok(_) => self.note(&format!("Stop point set at operator index {index}"))?,
                Err(e) => self.debug_error(&e)?,
            },
            Command::Tape => {
                writeln!(self.out, "Current memory pointer: {}", self.engine.pointer())?;
                self.tape_window()?;
            }
            Command::Pointer => {
                self.note(&format!("Current memory pointer: {}", self.engine.pointer()))?;
            }
            Command::Break(line) => match self.engine.add_breakpoint(line) {
                Ok(bp) if bp.is_inert() => {
                    self.warn(&format!("Warning: breakpoint at line {line} will not work"))?;
                }
                Ok(_) => self.note(&format!("Breakpoint added at line {line}"))?,
                Err(e) => self.debug_error(&e)?,
            },
            Command::DeleteStop => {
                if self.engine.clear_stop() {
                    self.note("Stop point removed")?;
                } else {
                    self.note("No stop point set now.")?;
                }
            }
            Command::DeleteBreakpoint(ordinal) => match self.engine.remove_breakpoint(ordinal) {
                Ok(_) => self.note(&format!("Breakpoint {ordinal} removed"))?,
                Err(e) => self.debug_error(&e)?,
            },
            Command::DeleteWatch(ordinal) => match self.engine.remove_watch(ordinal) {
                Ok(address) => {
                    self.note(&format!("Watchpoint {ordinal} at address {address} removed"))?;
                }
                Err(e) => self.debug_error(&e)?,
            },
            Command::Watch(address) => match self.engine.add_watch(address) {
                Ok(()) => self.note(&format!("Watching memory {address}"))?,
                Err(e) => self.debug_error(&e)?,
            },
            Command::Peek { offset, len } => self.peek(offset, len)?,
            Command::Info(which) => {
                if matches!(which, None | Some(Target::Stop)) {
                    self.show_stop()?;
                }
                if matches!(which, None | Some(Target::Breakpoints)) {
                    self.show_breakpoints()?;
                }
                if matches!(which, None | Some(Target::Watches)) {
                    self.show_watches()?;
                }
            }
            Command::Next => self.next()?,
            Command::Reset => {
                self.engine.reset();
                self.note("Memory tape reset.")?;
            }
            Command::Code => {
                write!(self.out, "{}", self.engine.program().listing())?;
                writeln!(self.out)?;
            }
            Command::Clear(which) => {
                let message = match which {
                    Some(Target::Stop) => {
                        self.engine.clear_stop();
                        "Stop point cleared"
                    }
                    Some(Target::Breakpoints) => {
                        self.engine.clear_breakpoints();
                        "All breakpoints cleared"
                    }
                    Some(Target::Watches) => {
                        self.engine.clear_watches();
                        "All watchpoints cleared"
                    }
                    None => {
                        self.engine.clear_stop();
                        self.engine.clear_breakpoints();
                        self.engine.clear_watches();
                        "Stop point, breakpoints and watchpoints cleared"
                    }
                };
                self.note(message)?;
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn require_running(&mut self) -> io::Result<bool> {
        if self.engine.is_running() {
            return Ok(true);
        }
        self.warn("Code is not running. Use 'run' command to start.")?;
        Ok(false)
    }

    fn describe(&self, reason: Suspend) -> String {
        match reason {
            Suspend::Breakpoint { index } => {
                let line = self
                    .engine
                    .breakpoints()
                    .iter()
                    .find(|bp| bp.index == Some(index))
                    .map(|bp| bp.line);
                match line {
                    Some(line) => format!("Hit breakpoint at line {line}"),
                    None => "Hit breakpoint".to_string(),
                }
            }
            Suspend::Watch { address } => format!("Watch hit at address {address}"),
            Suspend::Until => "Until finished".to_string(),
            Suspend::StopPoint { index } => format!("Reached stop point at operator index {index}"),
            Suspend::Step => "Stepped".to_string(),
            Suspend::Interrupted => "Interrupted".to_string(),
        }
    }

    // Program output may not end with a newline, so status lines after a
    // run are set apart with a blank line.
    fn report(&mut self, status: Status) -> io::Result<()> {
        write!(self.out, "\n\n")?;
        match status {
            Status::Finished => {
                let color = self.settings.colors.finished;
                self.say(color, "Running finished")
            }
            Status::Suspended(reason) => {
                let message = self.describe(reason);
                let color = self.settings.colors.stop_event;
                self.say(color, &message)
            }
        }
    }

    /// Stepping only reports events other than a plain step. Returns whether
    /// stepping may go on.
    fn report_step(&mut self, status: Status) -> io::Result<bool> {
        match status {
            Status::Suspended(Suspend::Step) => Ok(true),
            other => {
                self.report(other)?;
                Ok(false)
            }
        }
    }

    fn step(&mut self, times: u64) -> io::Result<()> {
        for _ in 0..times {
            let status = self.engine.step();
            if !self.report_step(status)? {
                return Ok(());
            }
        }
        writeln!(self.out)
    }

    fn detailed(&mut self, times: Option<u64>) -> io::Result<()> {
        let mut remaining = times.unwrap_or(u64::MAX);
        while remaining > 0 {
            remaining -= 1;
            if self.engine.take_interrupt() {
                return self.report(Status::Suspended(Suspend::Interrupted));
            }

            self.next()?;
            writeln!(self.out, "Memory pointer at: {}", self.engine.pointer())?;
            let status = self.engine.step();
            self.tape_window()?;
            if !self.report_step(status)? {
                break;
            }
        }
        Ok(())
    }

    fn next(&mut self) -> io::Result<()> {
        let (index, instr) = self.engine.next_instruction();
        writeln!(self.out, "{:<8} {}", index, instr)?;
        writeln!(self.out)
    }

    fn tape_window(&mut self) -> io::Result<()> {
        let (before, width) = (self.settings.tape_before, self.settings.tape_width);
        self.peek(-before, width)
    }

    fn peek(&mut self, offset: isize, len: usize) -> io::Result<()> {
        let bytes = self.engine.peek(offset, len);
        let mut line = String::new();
        for (i, byte) in bytes.iter().enumerate() {
            let address = isize::try_from(i).ok().and_then(|i| offset.checked_add(i));
            if address == Some(0) {
                let cell = format!("[{byte}]");
                line.push_str(&self.paint(self.settings.colors.pointer_cell, &cell));
                line.push(' ');
            } else {
                line.push_str(&format!("{byte} "));
            }
        }
        writeln!(self.out, "{line}")?;
        writeln!(self.out)
    }

    fn show_stop(&mut self) -> io::Result<()> {
        match self.engine.stop_point() {
            Some(index) => self.note(&format!("Stop point set at operator index {index}")),
            None => self.note("No stop point set now."),
        }
    }

    fn show_breakpoints(&mut self) -> io::Result<()> {
        if self.engine.breakpoints().is_empty() {
            return self.note("No breakpoints exist now.");
        }
        writeln!(self.out, "Num\tLine\tOperator")?;
        for (i, bp) in self.engine.breakpoints().iter().enumerate() {
            match bp.index {
                Some(index) => writeln!(self.out, "{}\t{}\t{}", i + 1, bp.line, index)?,
                None => writeln!(self.out, "{}\t{}\t- (inert)", i + 1, bp.line)?,
            }
        }
        writeln!(self.out)
    }

    fn show_watches(&mut self) -> io::Result<()> {
        if self.engine.watches().is_empty() {
            return self.note("No watchpoints exist now.");
        }
        writeln!(self.out, "Num\tAddress")?;
        for (i, address) in self.engine.watches().iter().enumerate() {
            writeln!(self.out, "{}\t{}", i + 1, address)?;
        }
        writeln!(self.out)
    }

    fn debug_error(&mut self, err: &DebugError) -> io::Result<()> {
        match err {
            DebugError::AlreadyExists { .. } | DebugError::AlreadyWatched { .. } => {
                self.warn(&format!("Warning: {err}"))
            }
            _ => {
                let color = self.settings.colors.error;
                self.say(color, &format!("Error: {err}"))
            }
        }
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.styled {
            color.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn say(&mut self, color: Color, message: &str) -> io::Result<()> {
        let painted = self.paint(color, message);
        writeln!(self.out, "{painted}")?;
        writeln!(self.out)
    }

    fn note(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")?;
        writeln!(self.out)
    }

    fn warn(&mut self, message: &str) -> io::Result<()> {
        let color = self.settings.colors.warning;
        self.say(color, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;

    fn shell(source: &str) -> DebugShell<Vec<u8>> {
        let mut engine = Engine::new(analyze(source, true).unwrap());
        engine.set_output_sink(|_| {});
        engine.set_input_provider(|| None);
        DebugShell::new(engine, Vec::new(), Settings::default())
    }

    fn exec(shell: &mut DebugShell<Vec<u8>>, line: &str) -> String {
        shell.writer_mut().clear();
        shell.execute(line).unwrap();
        String::from_utf8(shell.writer().clone()).unwrap()
    }

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(Command::parse("s"), Ok(Some(Command::Step(1))));
        assert_eq!(Command::parse("step 3"), Ok(Some(Command::Step(3))));
        assert_eq!(Command::parse("d"), Ok(Some(Command::Detailed(None))));
        assert_eq!(
            Command::parse("p -2 5"),
            Ok(Some(Command::Peek { offset: -2, len: 5 }))
        );
        assert_eq!(Command::parse("peek 3"), Ok(Some(Command::Peek { offset: 3, len: 1 })));
        assert_eq!(Command::parse("  del b 2 "), Ok(Some(Command::DeleteBreakpoint(2))));
        assert_eq!(Command::parse("delete s"), Ok(Some(Command::DeleteStop)));
        assert_eq!(Command::parse("w -4"), Ok(Some(Command::Watch(-4))));
        assert_eq!(Command::parse("i w"), Ok(Some(Command::Info(Some(Target::Watches)))));
        assert_eq!(Command::parse("clear"), Ok(Some(Command::Clear(None))));
        assert_eq!(Command::parse("stop"), Ok(Some(Command::Stop(None))));
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(Command::parse("b x"), Err(CommandError::Usage("b[reak] <line>")));
        assert_eq!(Command::parse("b"), Err(CommandError::Usage("b[reak] <line>")));
        assert_eq!(Command::parse("del b"), Err(CommandError::Usage("del[ete] s|b|w <num>")));
        assert_eq!(Command::parse("i x"), Err(CommandError::Usage("i[nfo] [s|b|w]")));
        assert_eq!(Command::parse("run now"), Err(CommandError::Usage("run")));
        assert_eq!(Command::parse("s -1"), Err(CommandError::Usage("s[tep] [times]")));
    }

    #[test]
    fn peek_length_is_capped() {
        assert_eq!(
            Command::parse(&format!("p 0 {PEEK_LIMIT}")),
            Ok(Some(Command::Peek { offset: 0, len: PEEK_LIMIT }))
        );
        assert_eq!(
            Command::parse("p 0 4611686018427387904"),
            Err(CommandError::Usage("p[eek] [offset [length]]"))
        );
    }

    #[test]
    fn peek_at_the_edge_of_the_address_space() {
        let mut sh = shell("+");
        exec(&mut sh, "r");
        assert_eq!(exec(&mut sh, "p 9223372036854775807"), "0 \n\n");
        assert_eq!(exec(&mut sh, "p -9223372036854775808 3"), "0 0 0 \n\n");
        assert_eq!(exec(&mut sh, "p -1 2"), "0 [1] \n\n");
    }

    #[test]
    fn ctrl_c_stops_a_long_step_run() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        // The input byte keeps `[]` spinning; reading it raises the flag.
        let mut sh = shell(",[]");
        let flag = Arc::new(AtomicBool::new(false));
        let raise = flag.clone();
        sh.engine_mut().set_interrupt(flag.clone());
        sh.engine_mut().set_input_provider(move || {
            raise.store(true, Ordering::Relaxed);
            Some(1)
        });

        let out = exec(&mut sh, "s 1000000000000");
        assert!(out.contains("Interrupted"));
        assert!(!flag.load(Ordering::Relaxed));
        assert_eq!(sh.engine().next_instruction().0, 1);
    }

    #[test]
    fn continue_requires_a_running_session() {
        let mut sh = shell("+");
        let out = exec(&mut sh, "c");
        assert!(out.contains("Code is not running. Use 'run' command to start."));
        let out = exec(&mut sh, "u");
        assert!(out.contains("Code is not running"));
    }

    #[test]
    fn breakpoint_then_continue_to_finish() {
        crate::test_utils::init_test_logging();
        let mut sh = shell("+\n+\n");
        assert!(exec(&mut sh, "b 2").contains("Breakpoint added at line 2"));
        assert!(exec(&mut sh, "r").contains("Hit breakpoint at line 2"));
        assert!(exec(&mut sh, "c").contains("Running finished"));
        assert!(exec(&mut sh, "c").contains("Code is not running"));
    }

    #[test]
    fn breakpoint_messages() {
        let mut sh = shell("+\n\n");
        assert!(exec(&mut sh, "b 2").contains("Warning: breakpoint at line 2 will not work"));
        assert!(exec(&mut sh, "b 2").contains("Warning: breakpoint at line 2 already exists"));
        assert!(exec(&mut sh, "b 9").contains(
            "Error: breakpoint out of range, line count is 2, got line 9"
        ));
        assert!(exec(&mut sh, "del b 1").contains("Breakpoint 1 removed"));
        assert!(exec(&mut sh, "del b 1").contains("Error: breakpoint index out of range"));
    }

    #[test]
    fn peek_brackets_the_pointer_cell() {
        let mut sh = shell("+>++");
        exec(&mut sh, "r");
        assert_eq!(exec(&mut sh, "p -1 3"), "1 [2] 0 \n\n");
        assert_eq!(exec(&mut sh, "p"), "[2] \n\n");
        assert_eq!(exec(&mut sh, "p 1 2"), "0 0 \n\n");
    }

    #[test]
    fn tape_and_pointer() {
        let mut sh = shell("+>++");
        exec(&mut sh, "r");
        let out = exec(&mut sh, "t");
        assert!(out.starts_with("Current memory pointer: 1\n"));
        assert!(out.contains("1 [2] 0"));
        assert_eq!(exec(&mut sh, "ptr"), "Current memory pointer: 1\n\n");
    }

    #[test]
    fn watch_hit_and_listing() {
        let mut sh = shell("+\n+\n");
        assert!(exec(&mut sh, "w 0").contains("Watching memory 0"));
        assert!(exec(&mut sh, "w 0").contains("Warning: address 0 is already being watched"));
        assert!(exec(&mut sh, "r").contains("Watch hit at address 0"));
        assert!(exec(&mut sh, "p").contains("[0]"));
        let out = exec(&mut sh, "i w");
        assert!(out.contains("Num\tAddress\n1\t0\n"));
        assert!(exec(&mut sh, "del w 1").contains("Watchpoint 1 at address 0 removed"));
        assert!(exec(&mut sh, "i w").contains("No watchpoints exist now."));
    }

    #[test]
    fn step_stops_early_on_events() {
        let mut sh = shell("+\n+\n+\n");
        exec(&mut sh, "w 0");
        let out = exec(&mut sh, "s 5");
        assert!(out.contains("Watch hit at address 0"));
        assert_eq!(sh.engine().peek(0, 1), vec![0]);

        let out = exec(&mut sh, "s 2");
        assert!(!out.contains("Running finished"));
        assert_eq!(sh.engine().peek(0, 1), vec![2]);
        assert!(exec(&mut sh, "s").contains("Running finished"));
    }

    #[test]
    fn detailed_step_prints_each_instruction() {
        let mut sh = shell("+>");
        let out = exec(&mut sh, "d");
        assert!(out.contains("Increment"));
        assert!(out.contains("ShiftRight"));
        assert!(out.contains("Memory pointer at: 0"));
        assert!(out.contains("Running finished"));
    }

    #[test]
    fn detailed_step_with_count() {
        let mut sh = shell("+>+");
        let out = exec(&mut sh, "d 1");
        assert!(out.contains("Increment"));
        assert!(!out.contains("ShiftRight"));
        assert!(!out.contains("Running finished"));
        assert!(sh.engine().is_running());
    }

    #[test]
    fn until_runs_to_loop_exit() {
        let mut sh = shell("++\n[\n-\n]\n+\n");
        exec(&mut sh, "s 3");
        let out = exec(&mut sh, "u");
        assert!(out.contains("Entering until mode"));
        assert!(out.contains("Until finished"));
        assert_eq!(sh.engine().peek(0, 1), vec![0]);
    }

    #[test]
    fn stop_point_lifecycle() {
        let mut sh = shell("+\n+\n+\n");
        assert!(exec(&mut sh, "stop").contains("No stop point set now."));
        assert!(exec(&mut sh, "stop 1").contains("Stop point set at operator index 1"));
        assert!(exec(&mut sh, "stop 9").contains("Error: instruction index 9 out of range"));
        assert!(exec(&mut sh, "r").contains("Reached stop point at operator index 1"));
        assert!(exec(&mut sh, "stop").contains("No stop point set now."));
        exec(&mut sh, "stop 2");
        assert!(exec(&mut sh, "del s").contains("Stop point removed"));
    }

    #[test]
    fn info_shows_everything_by_default() {
        let mut sh = shell("+\n+\n\n");
        exec(&mut sh, "b 1");
        exec(&mut sh, "b 3");
        exec(&mut sh, "w 5");
        let out = exec(&mut sh, "i");
        assert!(out.contains("No stop point set now."));
        assert!(out.contains("Num\tLine\tOperator\n1\t1\t0\n2\t3\t- (inert)\n"));
        assert!(out.contains("1\t5"));
    }

    #[test]
    fn clear_commands() {
        let mut sh = shell("+\n+\n");
        exec(&mut sh, "b 1");
        exec(&mut sh, "w 1");
        assert!(exec(&mut sh, "clear b").contains("All breakpoints cleared"));
        assert!(sh.engine().breakpoints().is_empty());
        assert_eq!(sh.engine().watches(), &[1]);
        exec(&mut sh, "clear");
        assert!(sh.engine().watches().is_empty());
    }

    #[test]
    fn next_and_reset() {
        let mut sh = shell("+\n>\n");
        exec(&mut sh, "s");
        assert!(exec(&mut sh, "n").starts_with("1        ShiftRight"));
        assert!(exec(&mut sh, "reset").contains("Memory tape reset."));
        assert!(exec(&mut sh, "n").starts_with("0        Increment"));
        assert!(exec(&mut sh, "c").contains("Code is not running"));
    }

    #[test]
    fn code_help_quit_and_unknown() {
        let mut sh = shell("+[-]");
        assert!(exec(&mut sh, "code").contains("Total instructions: 4"));
        assert!(exec(&mut sh, "h").contains("Execute commands:"));
        assert!(exec(&mut sh, "bogus").contains("Unknown command 'bogus'"));
        assert_eq!(sh.execute("q").unwrap(), Flow::Quit);
        assert_eq!(sh.execute("").unwrap(), Flow::Continue);
    }

    #[test]
    fn color_only_when_enabled() {
        let mut sh = shell("+");
        assert!(!exec(&mut sh, "r").contains('\u{1b}'));
        let mut sh = shell("+").with_color(true);
        assert!(exec(&mut sh, "r").contains('\u{1b}'));
    }
}
