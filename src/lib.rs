//! A Brainfuck interpreter with a GDB-style debugger.
//!
//! Source text is first analyzed into a [`Program`]: runs of `+ - < >` are
//! merged into single instructions with a repeat count, comments are dropped
//! and every bracket learns where its partner is. An [`Engine`] then runs the
//! program against an unbounded [`Tape`], suspending for breakpoints,
//! watchpoints, single steps, a one-shot stop point and `until` loop exits.
//!
//! Behaviours:
//! - Cells are bytes and wrap modulo 256.
//! - The tape grows in both directions; unvisited cells read as 0.
//! - Input `,` reads one byte; on EOF the current cell is set to 0.
//! - Unmatched brackets and programs without instructions are rejected by
//!   [`analyze`]; execution itself cannot fail.
//!
//! Quick start:
//!
//! ```no_run
//! use bfdb::{analyze, Engine, Status, Suspend};
//!
//! let program = analyze("+++\n[\n-\n]\n", true).expect("valid program");
//! let mut engine = Engine::new(program);
//! engine.add_breakpoint(3).expect("line 3 exists");
//!
//! let mut status = engine.run();
//! while let Status::Suspended(Suspend::Breakpoint { index }) = status {
//!     println!("stopped before instruction {index}, cell = {}", engine.peek(0, 1)[0]);
//!     status = engine.resume();
//! }
//! ```

pub mod analyzer;
pub mod cli_util;
pub mod config;
pub mod engine;
pub mod program;
pub mod repl;
pub mod shell;
pub mod tape;

pub use analyzer::{analyze, AnalysisError, AnalysisWarning, UnmatchedBracketKind};
pub use engine::{Breakpoint, DebugError, Engine, PointKind, State, Status, Suspend};
pub use program::{Instruction, Op, Program};
pub use tape::Tape;
