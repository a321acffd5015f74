//! Source analysis: turns Brainfuck text into a [`Program`].
//!
//! Features and behaviors:
//! - Any character outside `><+-.,[]` is a comment and is skipped.
//! - Runs of `+`/`-` and `<`/`>` are merged into one instruction with a count;
//!   an opposite operator right after a run decrements it and removes the
//!   instruction once the count reaches zero.
//! - Brackets are resolved up front; each jump target points one past the
//!   matching bracket.
//! - With line metadata enabled, no instruction spans two lines, so every
//!   source line maps to exactly one instruction index (or to none).

use std::fmt;

use tracing::debug;

use crate::program::{Instruction, Op, Program};

/// Errors that make a source text unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// A `]` without a preceding `[`, or a `[` that is never closed.
    #[error("Unmatched bracket {kind} at line {line}, column {column}")]
    UnmatchedBracket {
        kind: UnmatchedBracketKind,
        /// 1-based line number.
        line: usize,
        /// 0-based column, counted in characters.
        column: usize,
        /// The offending line without its terminator.
        source_line: String,
    },

    /// The source contains no instruction once comments and cancelled runs
    /// are removed.
    #[error("Program is empty")]
    EmptyProgram,
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Non-fatal findings reported alongside a successfully analyzed program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisWarning {
    /// `[]` with nothing inside: either skipped or spins forever.
    EmptyLoop { line: usize },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::EmptyLoop { line } => write!(f, "empty loop at line {line}"),
        }
    }
}

struct OpenBracket {
    index: usize,
    line: usize,
    column: usize,
}

struct Analyzer {
    line_info: bool,
    instructions: Vec<Instruction>,
    line_begins: Vec<Option<usize>>,
    open: Vec<OpenBracket>,
    warnings: Vec<AnalysisWarning>,
    line: usize,
    line_begin: usize,
}

impl Analyzer {
    fn new(line_info: bool) -> Self {
        Self {
            line_info,
            instructions: Vec::new(),
            line_begins: Vec::new(),
            open: Vec::new(),
            warnings: Vec::new(),
            line: 0,
            line_begin: 0,
        }
    }

    fn begin_line(&mut self) {
        self.line += 1;
        self.line_begin = self.instructions.len();
        if self.line_info {
            self.line_begins.push(Some(self.line_begin));
        }
    }

    fn push_run(&mut self, op: Op) {
        // A line that has produced nothing yet (or whose instructions all
        // cancelled out) must start a fresh instruction in line mode.
        let line_is_empty = self.instructions.len() == self.line_begin;
        if !(self.line_info && line_is_empty) {
            if let Some(last) = self.instructions.last_mut() {
                if last.op == op {
                    last.operand += 1;
                    return;
                }
                if Some(last.op) == op.opposite() {
                    last.operand -= 1;
                    if last.operand == 0 {
                        self.instructions.pop();
                    }
                    return;
                }
            }
        }
        self.instructions.push(Instruction::new(op, 1));
    }

    fn open_loop(&mut self, column: usize) {
        self.open.push(OpenBracket {
            index: self.instructions.len(),
            line: self.line,
            column,
        });
        // Target is patched when the matching `]` shows up.
        self.instructions.push(Instruction::new(Op::LoopStart, 0));
    }

    /// Returns `false` when there is no `[` to close.
    fn close_loop(&mut self) -> bool {
        let Some(open) = self.open.pop() else {
            return false;
        };
        let close = self.instructions.len();
        self.instructions.push(Instruction::new(Op::LoopEnd, open.index + 1));
        self.instructions[open.index].operand = close + 1;

        if close == open.index + 1 {
            self.warnings.push(AnalysisWarning::EmptyLoop { line: self.line });
        }
        true
    }

    fn finish(mut self) -> Program {
        let len = self.instructions.len();
        // Trailing lines without instructions have nothing to attach to.
        for begin in self.line_begins.iter_mut().rev() {
            if begin.is_some_and(|index| index >= len) {
                *begin = None;
            } else {
                break;
            }
        }

        Program {
            instructions: self.instructions,
            line_begins: self.line_info.then_some(self.line_begins),
            line_count: self.line,
            warnings: self.warnings,
        }
    }
}

fn strip_terminator(line: &str) -> String {
    line.trim_end_matches(['\n', '\r']).to_string()
}

/// Analyze `source` into a [`Program`].
///
/// `line_info` requests the per-line offset table needed for breakpoints. It
/// also stops run-length merging at line boundaries, so the instruction count
/// may differ from a plain analysis of the same text.
pub fn analyze(source: &str, line_info: bool) -> Result<Program, AnalysisError> {
    if source.is_empty() {
        return Err(AnalysisError::EmptyProgram);
    }

    let mut analyzer = Analyzer::new(line_info);

    for text in source.split_inclusive('\n') {
        analyzer.begin_line();

        for (column, ch) in text.chars().enumerate() {
            let Some(op) = Op::from_char(ch) else {
                continue;
            };
            match op {
                Op::Increment | Op::Decrement | Op::ShiftLeft | Op::ShiftRight => {
                    analyzer.push_run(op);
                }
                Op::LoopStart => analyzer.open_loop(column),
                Op::LoopEnd => {
                    if !analyzer.close_loop() {
                        return Err(AnalysisError::UnmatchedBracket {
                            kind: UnmatchedBracketKind::Close,
                            line: analyzer.line,
                            column,
                            source_line: strip_terminator(text),
                        });
                    }
                }
                Op::Input | Op::Output => {
                    analyzer.instructions.push(Instruction::new(op, 1));
                }
            }
        }
    }

    // The outermost unclosed bracket is the one reported.
    if let Some(open) = analyzer.open.first() {
        let source_line = source
            .split_inclusive('\n')
            .nth(open.line - 1)
            .map(strip_terminator)
            .unwrap_or_default();
        return Err(AnalysisError::UnmatchedBracket {
            kind: UnmatchedBracketKind::Open,
            line: open.line,
            column: open.column,
            source_line,
        });
    }

    let program = analyzer.finish();
    if program.is_empty() {
        return Err(AnalysisError::EmptyProgram);
    }

    debug!(
        instructions = program.len(),
        lines = program.line_count(),
        line_info,
        "analysis finished"
    );
    Ok(program)
}
