use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a compile.
///
/// Once one of these is produced no further lines are processed and no
/// partial output is returned.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Line is nested deeper than the previous accepted line allows.
    #[error("invalid indentation on line {line}")]
    Indentation {
        /// Line number (1-indexed)
        line: usize,
    },
    /// Leading whitespace is not a whole number of two-space levels.
    #[error("invalid indentation on line {line}: {spaces} leading spaces is not a multiple of two")]
    OddIndentation {
        /// Line number (1-indexed)
        line: usize,
        /// Number of leading spaces found
        spaces: usize,
    },
    /// The template could not be opened or read.
    #[error("cannot read template {}: {source}", .path.display())]
    SourceUnavailable {
        /// Path that was requested
        path: PathBuf,
        /// Underlying IO failure
        source: std::io::Error,
    },
}

impl CompileError {
    /// Create an indentation error for the given line
    pub fn indentation(line: usize) -> Self {
        Self::Indentation { line }
    }

    /// Create an odd-indentation error for the given line
    pub fn odd_indentation(line: usize, spaces: usize) -> Self {
        Self::OddIndentation { line, spaces }
    }

    /// Create a source error for an unreadable path
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Line the error points at, if it came from a specific line.
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Indentation { line } | CompileError::OddIndentation { line, .. } => {
                Some(*line)
            }
            CompileError::SourceUnavailable { .. } => None,
        }
    }
}

/// Non-fatal warnings that don't prevent compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileWarning {
    /// Line looked like an element declaration but was emitted as literal text
    LiteralFallback {
        /// Line number (1-indexed)
        line: usize,
        /// Content that was passed through
        content: String,
    },
    /// Control-flow keyword the compiler does not nest, emitted as raw code
    UnsupportedControlFlow {
        /// Line number (1-indexed)
        line: usize,
        /// Keyword found after the code marker
        keyword: String,
    },
    /// Leading whitespace contains tabs, which do not count toward nesting depth
    TabIndentation {
        /// Line number (1-indexed)
        line: usize,
    },
}

impl CompileWarning {
    /// Get the line this warning points at
    pub fn line(&self) -> usize {
        match self {
            CompileWarning::LiteralFallback { line, .. } => *line,
            CompileWarning::UnsupportedControlFlow { line, .. } => *line,
            CompileWarning::TabIndentation { line } => *line,
        }
    }
}

impl std::fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileWarning::LiteralFallback { line, content } => {
                write!(
                    f,
                    "line {}: unrecognized element syntax, emitted as text: '{}'",
                    line, content
                )
            }
            CompileWarning::UnsupportedControlFlow { line, keyword } => {
                write!(
                    f,
                    "line {}: '{}' is not a nesting control statement, emitted as raw code",
                    line, keyword
                )
            }
            CompileWarning::TabIndentation { line } => {
                write!(
                    f,
                    "line {}: tabs in indentation are ignored, only spaces set the nesting depth",
                    line
                )
            }
        }
    }
}

/// Warnings collected over one compile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// List of non-fatal warnings, in line order
    pub warnings: Vec<CompileWarning>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the diagnostics collection
    pub fn add_warning(&mut self, warning: CompileWarning) {
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
