//! Indentation validation.
//!
//! Nesting may deepen by at most one level per line, and only beneath a line
//! that opened a level.

use crate::error::CompileError;
use crate::line::SourceLine;

/// Deepest indentation `previous` allows for the line that follows it.
pub fn max_indent(previous: Option<&SourceLine>) -> usize {
    match previous {
        Some(prev) => prev.indent + usize::from(prev.opens_level()),
        None => 0,
    }
}

/// Check `line` against the previous accepted (non-ignored) line.
pub fn check_indentation(
    previous: Option<&SourceLine>,
    line: &SourceLine,
) -> Result<(), CompileError> {
    if line.leading_spaces % 2 != 0 {
        return Err(CompileError::odd_indentation(
            line.number,
            line.leading_spaces,
        ));
    }

    if line.indent > max_indent(previous) {
        return Err(CompileError::indentation(line.number));
    }

    Ok(())
}
