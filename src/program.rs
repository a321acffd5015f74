//! The analyzed instruction stream.
//!
//! A [`Program`] is produced once by [`crate::analyze`] and never mutated
//! afterwards. Every `LoopStart` carries the index one past its matching
//! `LoopEnd` and every `LoopEnd` the index one past its matching `LoopStart`,
//! so both jumps land on the first instruction that should run next.

use std::fmt;

use crate::analyzer::AnalysisWarning;

/// One of the eight Brainfuck operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `<`
    ShiftLeft,
    /// `>`
    ShiftRight,
    /// `[`
    LoopStart,
    /// `]`
    LoopEnd,
    /// `,`
    Input,
    /// `.`
    Output,
}

impl Op {
    /// Classify a source character; anything else is a comment.
    pub fn from_char(ch: char) -> Option<Op> {
        match ch {
            '+' => Some(Op::Increment),
            '-' => Some(Op::Decrement),
            '<' => Some(Op::ShiftLeft),
            '>' => Some(Op::ShiftRight),
            '[' => Some(Op::LoopStart),
            ']' => Some(Op::LoopEnd),
            ',' => Some(Op::Input),
            '.' => Some(Op::Output),
            _ => None,
        }
    }

    /// The operator that cancels this one, for the four run-length operators.
    pub fn opposite(self) -> Option<Op> {
        match self {
            Op::Increment => Some(Op::Decrement),
            Op::Decrement => Some(Op::Increment),
            Op::ShiftLeft => Some(Op::ShiftRight),
            Op::ShiftRight => Some(Op::ShiftLeft),
            _ => None,
        }
    }

    /// Source character for this operator.
    pub fn symbol(self) -> char {
        match self {
            Op::Increment => '+',
            Op::Decrement => '-',
            Op::ShiftLeft => '<',
            Op::ShiftRight => '>',
            Op::LoopStart => '[',
            Op::LoopEnd => ']',
            Op::Input => ',',
            Op::Output => '.',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Increment => "Increment",
            Op::Decrement => "Decrement",
            Op::ShiftLeft => "ShiftLeft",
            Op::ShiftRight => "ShiftRight",
            Op::LoopStart => "LoopStart",
            Op::LoopEnd => "LoopEnd",
            Op::Input => "Input",
            Op::Output => "Output",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// An operator with its operand: a repeat count for `+ - < >`, a jump target
/// for `[ ]`, and always 1 for `, .`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub operand: usize,
}

impl Instruction {
    pub fn new(op: Op, operand: usize) -> Self {
        Self { op, operand }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<15} {}", self.op, self.operand)
    }
}

/// An analyzed Brainfuck program.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) instructions: Vec<Instruction>,
    // One entry per source line, only when line metadata was requested.
    // `None` marks trailing lines that contribute no instruction.
    pub(crate) line_begins: Option<Vec<Option<usize>>>,
    pub(crate) line_count: usize,
    pub(crate) warnings: Vec<AnalysisWarning>,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Instruction> {
        self.instructions.get(index).copied()
    }

    /// Number of lines in the source text.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Whether the program was analyzed with line metadata.
    pub fn has_line_info(&self) -> bool {
        self.line_begins.is_some()
    }

    /// Per-line begin offsets, if line metadata was requested.
    pub fn line_begins(&self) -> Option<&[Option<usize>]> {
        self.line_begins.as_deref()
    }

    /// Instruction index where the 1-based `line` begins. A line without
    /// instructions of its own resolves to the next line that has one;
    /// `None` when no such line exists or line metadata is missing.
    pub fn line_begin(&self, line: usize) -> Option<usize> {
        let begins = self.line_begins.as_ref()?;
        line.checked_sub(1)
            .and_then(|i| begins.get(i).copied())
            .flatten()
    }

    /// Warnings collected during analysis.
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    /// Human readable dump of the whole program with loop labels.
    pub fn listing(&self) -> Listing<'_> {
        Listing { program: self }
    }
}

/// Display adapter produced by [`Program::listing`].
///
/// Each `[` opens a numbered label `Ln:` and its `]` closes it with `Ln End`;
/// instructions are indented by their loop nesting depth.
pub struct Listing<'a> {
    program: &'a Program,
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.program;
        writeln!(f, "Total instructions: {}", program.len())?;
        writeln!(f)?;

        let mut next_label = 0usize;
        let mut open: Vec<usize> = Vec::new();

        for (index, instr) in program.instructions.iter().enumerate() {
            if instr.op == Op::LoopStart {
                next_label += 1;
                writeln!(f, "{:indent$}L{}:", "", next_label, indent = open.len() * 2)?;
                open.push(next_label);
            }

            let depth = match instr.op {
                Op::LoopStart | Op::LoopEnd => open.len().saturating_sub(1),
                _ => open.len(),
            };
            writeln!(f, "{:indent$}  {:<8} {}", "", index, instr, indent = depth * 2)?;

            if instr.op == Op::LoopEnd {
                if let Some(label) = open.pop() {
                    writeln!(f, "{:indent$}L{} End", "", label, indent = open.len() * 2)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Lines: {}", program.line_count)?;
        if let Some(begins) = &program.line_begins {
            writeln!(f, "Line\tBegin")?;
            for (i, begin) in begins.iter().enumerate() {
                match begin {
                    Some(index) => writeln!(f, "  {}\t{}", i + 1, index)?,
                    None => writeln!(f, "  {}\t-", i + 1)?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;

    #[test]
    fn every_operator_character_is_classified() {
        for ch in "+-<>[],.".chars() {
            let op = Op::from_char(ch).expect("operator");
            assert_eq!(op.symbol(), ch);
        }
        assert_eq!(Op::from_char('a'), None);
        assert_eq!(Op::from_char('\n'), None);
    }

    #[test]
    fn only_run_length_operators_have_opposites() {
        assert_eq!(Op::Increment.opposite(), Some(Op::Decrement));
        assert_eq!(Op::ShiftRight.opposite(), Some(Op::ShiftLeft));
        assert_eq!(Op::LoopStart.opposite(), None);
        assert_eq!(Op::Output.opposite(), None);
    }

    #[test]
    fn line_begin_is_one_based_and_handles_sentinels() {
        let program = analyze("+\n\n>\n\n", true).unwrap();
        assert_eq!(program.line_count(), 4);
        assert_eq!(program.line_begin(0), None);
        assert_eq!(program.line_begin(1), Some(0));
        // Blank line resolves to the next instruction.
        assert_eq!(program.line_begin(2), Some(1));
        assert_eq!(program.line_begin(3), Some(1));
        // Trailing blank line has nothing to attach to.
        assert_eq!(program.line_begin(4), None);
        assert_eq!(program.line_begin(5), None);
    }

    #[test]
    fn listing_labels_loops() {
        let program = analyze("+[>[-]<-]", false).unwrap();
        let text = program.listing().to_string();
        assert!(text.contains("Total instructions: 9"));
        assert!(text.contains("L1:"));
        assert!(text.contains("L2:"));
        assert!(text.contains("L2 End"));
        assert!(text.contains("L1 End"));
        assert!(text.contains("LoopStart"));
        // No line table without debug metadata.
        assert!(!text.contains("Line\tBegin"));
    }
}
