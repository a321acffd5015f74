use std::io::{self, Write};
use crate::analyzer::{AnalysisError, AnalysisWarning};

/// Render an analysis error, with the offending source line and a caret
/// under the bracket. If `program` is `Some("bfdb")`, the first line is
/// prefixed with "bfdb: ...".
pub fn render_analysis_error(program: Option<&str>, err: &AnalysisError) -> String {
    let headline = match program {
        Some(p) => format!("{p}: Parse error: {err}"),
        None => format!("Parse error: {err}"),
    };

    match err {
        AnalysisError::UnmatchedBracket { column, source_line, .. } => {
            format!("{headline}\n{}", error_context(source_line, *column))
        }
        AnalysisError::EmptyProgram => headline,
    }
}

pub fn print_analysis_error(program: Option<&str>, err: &AnalysisError) {
    eprintln!("{}", render_analysis_error(program, err));
    let _ = io::stderr().flush();
}

pub fn print_warnings(program: &str, warnings: &[AnalysisWarning]) {
    for warning in warnings {
        eprintln!("{program}: warning: {warning}");
    }
    let _ = io::stderr().flush();
}

/// The source line with a caret under `column` (counted in chars). Tabs are
/// kept in the padding so the caret lines up however they render.
fn error_context(line: &str, column: usize) -> String {
    let underline: String = line
        .chars()
        .take(column)
        .map(|ch| if ch == '\t' { '\t' } else { ' ' })
        .chain(std::iter::once('^'))
        .collect();
    format!("  {line}\n  {underline}")
}
