//! Execution engine with debugger support.
//!
//! The engine interprets a [`Program`] against a [`Tape`] and returns control
//! to its caller whenever something interesting happens: the program
//! finished, a breakpoint or watchpoint fired, a loop exited in `until` mode,
//! the one-shot stop point was reached, or a single step completed.
//!
//! Resuming is just calling [`Engine::resume`] or [`Engine::step`] again;
//! the engine remembers which checks it already reported for the instruction
//! it stopped at, so a resume never reports the same event twice.
//!
//! Execution itself cannot fail: cells wrap, exhausted input reads as 0 and
//! unallocated tape reads as 0.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace, warn};

use crate::program::{Instruction, Op, Program};
use crate::tape::Tape;

/// Why execution paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspend {
    /// About to execute a breakpointed instruction.
    Breakpoint { index: usize },
    /// About to mutate a watched cell; the cell still holds its old value.
    Watch { address: isize },
    /// A loop exited while `until` mode was armed.
    Until,
    /// About to execute the stop point instruction. The stop point is gone.
    StopPoint { index: usize },
    /// A single step completed.
    Step,
    /// The interrupt flag was raised.
    Interrupted,
}

/// Result of a `run`, `resume` or `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Finished,
    Suspended(Suspend),
}

/// Session state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not started, reset, or finished.
    Idle,
    Suspended(Suspend),
}

/// Debugger configuration errors. None of them affect the running program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DebugError {
    #[error("breakpoint out of range, line count is {line_count}, got line {line}")]
    OutOfRange { line: usize, line_count: usize },

    #[error("breakpoint at line {line} already exists")]
    AlreadyExists { line: usize },

    #[error("{kind} index out of range, got {index}, {kind} count is {count}")]
    IndexOutOfRange { kind: PointKind, index: usize, count: usize },

    #[error("address {address} is already being watched")]
    AlreadyWatched { address: isize },

    #[error("instruction index {index} out of range, program has {len} instructions")]
    InstructionOutOfRange { index: usize, len: usize },

    #[error("breakpoints need line information; analyze the program with line metadata")]
    LineInfoUnavailable,
}

/// Which list an ordinal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Breakpoint,
    Watchpoint,
}

impl std::fmt::Display for PointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointKind::Breakpoint => write!(f, "breakpoint"),
            PointKind::Watchpoint => write!(f, "watchpoint"),
        }
    }
}

/// A breakpoint on a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// 1-based source line.
    pub line: usize,
    /// Instruction the line maps to; `None` for an inert breakpoint.
    pub index: Option<usize>,
}

impl Breakpoint {
    /// An inert breakpoint sits on a line with no instruction to stop at.
    pub fn is_inert(&self) -> bool {
        self.index.is_none()
    }
}

// Checks made before an instruction runs, in the order they are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Breakpoint,
    StopPoint,
    Watch,
}

impl Gate {
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

// Watch state for the current pointer dwell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dwell {
    Unchecked,
    Unwatched,
    Armed,
    Consumed,
}

type OutputSink = Box<dyn FnMut(&[u8])>;
type InputProvider = Box<dyn FnMut() -> Option<u8>>;

fn stdout_sink(bytes: &[u8]) {
    let _ = io::stdout().write_all(bytes);
}

fn stdin_byte() -> Option<u8> {
    let mut buf = [0u8; 1];
    match io::stdin().read(&mut buf) {
        Ok(0) => None,
        Ok(_) => Some(buf[0]),
        Err(e) => {
            warn!("failed reading program input, treating as EOF: {e}");
            None
        }
    }
}

/// A debug session over one program.
///
/// Breakpoints need a program analyzed with line metadata; everything else
/// works with either kind of program.
pub struct Engine {
    program: Program,
    tape: Tape,
    pc: usize,
    state: State,

    breakpoints: Vec<Breakpoint>,
    // One flag per instruction, set while some breakpoint maps to it.
    marked: Vec<bool>,
    watches: Vec<isize>,
    stop: Option<usize>,
    until: bool,

    dwell: Dwell,
    // Bit set of the gates already reported for the visit to `pc`.
    reported: Option<(usize, u8)>,
    interrupt: Option<Arc<AtomicBool>>,

    output: OutputSink,
    input: InputProvider,
}

impl Engine {
    /// Start a session. Program output goes to stdout and input comes from
    /// stdin until other hooks are installed.
    pub fn new(program: Program) -> Self {
        let len = program.len();
        Self {
            program,
            tape: Tape::new(),
            pc: 0,
            state: State::Idle,
            breakpoints: Vec::new(),
            marked: vec![false; len],
            watches: Vec::new(),
            stop: None,
            until: false,
            dwell: Dwell::Unchecked,
            reported: None,
            interrupt: None,
            output: Box::new(stdout_sink),
            input: Box::new(stdin_byte),
        }
    }

    /// Provide an output sink. `.` sends a one-byte slice to it.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&[u8]) + 'static,
    {
        self.output = Box::new(sink);
    }

    /// Provide an input provider. Returning `None` means EOF; the cell is set to 0.
    pub fn set_input_provider<F>(&mut self, provider: F)
    where
        F: FnMut() -> Option<u8> + 'static,
    {
        self.input = Box::new(provider);
    }

    /// Install a flag that suspends execution with [`Suspend::Interrupted`]
    /// when raised. The engine lowers it again once observed.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn line_count(&self) -> usize {
        self.program.line_count()
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether a run is in progress (suspended somewhere mid-program).
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Suspended(_))
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Absolute address of the data pointer.
    pub fn pointer(&self) -> isize {
        self.tape.pointer()
    }

    /// `len` bytes starting at `pointer + offset`.
    pub fn peek(&self, offset: isize, len: usize) -> Vec<u8> {
        self.tape.peek(offset, len)
    }

    /// The instruction that executes next, with its index. Once the program
    /// has finished this is instruction 0, where the next run begins.
    pub fn next_instruction(&self) -> (usize, Instruction) {
        let index = if self.pc < self.program.len() { self.pc } else { 0 };
        (index, self.program.instructions()[index])
    }

    /// Discard the tape and all per-run state, keeping breakpoints,
    /// watchpoints and the stop point.
    pub fn reset(&mut self) {
        self.tape = Tape::new();
        self.pc = 0;
        self.state = State::Idle;
        self.dwell = Dwell::Unchecked;
        self.reported = None;
        self.until = false;
        debug!("session reset");
    }

    /// Start over from the first instruction.
    pub fn run(&mut self) -> Status {
        self.reset();
        self.execute_until_event()
    }

    /// Continue from where the last call stopped. Starts over when idle.
    pub fn resume(&mut self) -> Status {
        if self.state == State::Idle {
            self.reset();
        }
        self.execute_until_event()
    }

    /// Execute exactly one instruction. Breakpoints and the stop point are
    /// ignored; watchpoints and `until` still apply. Starts over when idle.
    /// A raised interrupt flag suspends without executing anything.
    pub fn step(&mut self) -> Status {
        if self.state == State::Idle {
            self.reset();
        }
        if self.take_interrupt() {
            return self.suspend(Suspend::Interrupted);
        }
        let event = self.execute();
        if self.pc >= self.program.len() {
            return self.finish();
        }
        self.suspend(event.unwrap_or(Suspend::Step))
    }

    fn execute_until_event(&mut self) -> Status {
        debug!(pc = self.pc, "executing");
        let len = self.program.len();
        loop {
            if self.pc >= len {
                return self.finish();
            }

            if self.take_interrupt() {
                return self.suspend(Suspend::Interrupted);
            }

            if !self.already_reported(Gate::Breakpoint) && self.marked[self.pc] {
                trace!(pc = self.pc, "breakpoint gate");
                self.mark_reported(Gate::Breakpoint);
                return self.suspend(Suspend::Breakpoint { index: self.pc });
            }

            if !self.already_reported(Gate::StopPoint) && self.stop == Some(self.pc) {
                trace!(pc = self.pc, "stop point gate");
                self.stop = None;
                self.mark_reported(Gate::StopPoint);
                return self.suspend(Suspend::StopPoint { index: self.pc });
            }

            if let Some(event) = self.execute() {
                if self.pc >= len {
                    return self.finish();
                }
                return self.suspend(event);
            }
        }
    }

    fn already_reported(&self, gate: Gate) -> bool {
        matches!(self.reported, Some((pc, gates)) if pc == self.pc && gates & gate.bit() != 0)
    }

    fn mark_reported(&mut self, gate: Gate) {
        let gates = match self.reported {
            Some((pc, gates)) if pc == self.pc => gates,
            _ => 0,
        };
        self.reported = Some((self.pc, gates | gate.bit()));
    }

    /// Observe the interrupt flag, lowering it. Callers driving the engine
    /// one step at a time use this to honour ctrl+c between steps.
    pub fn take_interrupt(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.swap(false, Ordering::Relaxed))
    }

    fn finish(&mut self) -> Status {
        self.state = State::Idle;
        self.until = false;
        self.reported = None;
        debug!("program finished");
        Status::Finished
    }

    fn suspend(&mut self, reason: Suspend) -> Status {
        self.state = State::Suspended(reason);
        debug!(pc = self.pc, ?reason, "suspended");
        Status::Suspended(reason)
    }

    fn jump(&mut self, target: usize) {
        self.pc = target;
        self.reported = None;
    }

    /// Returns the event raised by the watch check when the pointer dwell
    /// still has an armed watch. Fires at most once per dwell.
    fn watch_fires(&mut self) -> bool {
        if self.watches.is_empty() {
            return false;
        }
        if self.dwell == Dwell::Unchecked {
            self.dwell = if self.watches.binary_search(&self.tape.pointer()).is_ok() {
                Dwell::Armed
            } else {
                Dwell::Unwatched
            };
        }
        if self.dwell == Dwell::Armed {
            self.dwell = Dwell::Consumed;
            return true;
        }
        false
    }

    /// Execute the instruction at `pc`. A watch hit returns before mutating
    /// anything and leaves `pc` in place.
    fn execute(&mut self) -> Option<Suspend> {
        let Instruction { op, operand } = self.program.instructions()[self.pc];

        if matches!(op, Op::Increment | Op::Decrement | Op::Input) && self.watch_fires() {
            trace!(pc = self.pc, "watch gate");
            self.mark_reported(Gate::Watch);
            return Some(Suspend::Watch { address: self.tape.pointer() });
        }

        let next = self.pc + 1;
        match op {
            Op::Increment => {
                self.tape.increment(operand);
                self.jump(next);
            }
            Op::Decrement => {
                self.tape.decrement(operand);
                self.jump(next);
            }
            Op::ShiftLeft => {
                self.tape.move_pointer(-(operand as isize));
                self.dwell = Dwell::Unchecked;
                self.jump(next);
            }
            Op::ShiftRight => {
                self.tape.move_pointer(operand as isize);
                self.dwell = Dwell::Unchecked;
                self.jump(next);
            }
            Op::LoopStart => {
                let target = if self.tape.current() == 0 { operand } else { next };
                self.jump(target);
            }
            Op::LoopEnd => {
                if self.tape.current() != 0 {
                    self.jump(operand);
                } else {
                    self.jump(next);
                    if self.until {
                        self.until = false;
                        return Some(Suspend::Until);
                    }
                }
            }
            Op::Input => {
                let byte = (self.input)().unwrap_or(0);
                self.tape.write(byte);
                self.jump(next);
            }
            Op::Output => {
                let byte = [self.tape.current()];
                (self.output)(&byte);
                self.jump(next);
            }
        }
        None
    }

    // Breakpoints

    /// Set a breakpoint on a 1-based source line. A line without an
    /// instruction of its own maps to the next line that has one; when none
    /// exists the breakpoint is kept but inert.
    pub fn add_breakpoint(&mut self, line: usize) -> Result<Breakpoint, DebugError> {
        if !self.program.has_line_info() {
            return Err(DebugError::LineInfoUnavailable);
        }
        let line_count = self.program.line_count();
        if line == 0 || line > line_count {
            return Err(DebugError::OutOfRange { line, line_count });
        }

        let position = match self.breakpoints.binary_search_by_key(&line, |b| b.line) {
            Ok(_) => return Err(DebugError::AlreadyExists { line }),
            Err(position) => position,
        };

        let breakpoint = Breakpoint { line, index: self.program.line_begin(line) };
        if let Some(index) = breakpoint.index {
            self.marked[index] = true;
        }
        self.breakpoints.insert(position, breakpoint);
        debug!(line, index = ?breakpoint.index, "breakpoint added");
        Ok(breakpoint)
    }

    /// Remove the breakpoint at a 1-based position in [`Engine::breakpoints`].
    pub fn remove_breakpoint(&mut self, ordinal: usize) -> Result<Breakpoint, DebugError> {
        let count = self.breakpoints.len();
        if ordinal == 0 || ordinal > count {
            return Err(DebugError::IndexOutOfRange {
                kind: PointKind::Breakpoint,
                index: ordinal,
                count,
            });
        }

        let removed = self.breakpoints.remove(ordinal - 1);
        if let Some(index) = removed.index {
            // Several lines can share an instruction; keep the mark for the others.
            if !self.breakpoints.iter().any(|b| b.index == Some(index)) {
                self.marked[index] = false;
            }
        }
        Ok(removed)
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
        self.marked.fill(false);
    }

    /// Breakpoints sorted by line.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    // Watchpoints

    /// Watch an absolute tape address.
    pub fn add_watch(&mut self, address: isize) -> Result<(), DebugError> {
        let position = match self.watches.binary_search(&address) {
            Ok(_) => return Err(DebugError::AlreadyWatched { address }),
            Err(position) => position,
        };
        self.watches.insert(position, address);
        if address == self.tape.pointer() && self.dwell == Dwell::Unwatched {
            self.dwell = Dwell::Armed;
        }
        debug!(address, "watch added");
        Ok(())
    }

    /// Remove the watch at a 1-based position in [`Engine::watches`] and
    /// return its address.
    pub fn remove_watch(&mut self, ordinal: usize) -> Result<isize, DebugError> {
        let count = self.watches.len();
        if ordinal == 0 || ordinal > count {
            return Err(DebugError::IndexOutOfRange {
                kind: PointKind::Watchpoint,
                index: ordinal,
                count,
            });
        }
        let address = self.watches.remove(ordinal - 1);
        if address == self.tape.pointer() && self.dwell == Dwell::Armed {
            self.dwell = Dwell::Unwatched;
        }
        Ok(address)
    }

    pub fn clear_watches(&mut self) {
        self.watches.clear();
        if self.dwell == Dwell::Armed {
            self.dwell = Dwell::Unwatched;
        }
    }

    /// Watched addresses, sorted.
    pub fn watches(&self) -> &[isize] {
        &self.watches
    }

    // Stop point

    /// Stop before the instruction at `index` the next time it is reached.
    /// Replaces any previous stop point and returns it.
    pub fn set_stop(&mut self, index: usize) -> Result<Option<usize>, DebugError> {
        let len = self.program.len();
        if index >= len {
            return Err(DebugError::InstructionOutOfRange { index, len });
        }
        Ok(self.stop.replace(index))
    }

    /// Remove the stop point; reports whether there was one.
    pub fn clear_stop(&mut self) -> bool {
        self.stop.take().is_some()
    }

    pub fn stop_point(&self) -> Option<usize> {
        self.stop
    }

    // Until mode

    /// Suspend at the next loop exit. Returns `false` when already armed.
    pub fn arm_until(&mut self) -> bool {
        !std::mem::replace(&mut self.until, true)
    }

    /// Disarm `until` mode; reports whether it was armed.
    pub fn cancel_until(&mut self) -> bool {
        std::mem::replace(&mut self.until, false)
    }

    pub fn until_armed(&self) -> bool {
        self.until
    }
}
