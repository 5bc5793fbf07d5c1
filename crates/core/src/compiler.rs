//! Template compilation.
//!
//! The driver walks the lines once: classify, skip ignored lines, validate
//! indentation against the previous accepted line, reconcile the frame
//! stack, emit. Remaining frames are flushed at end of input. Each call owns
//! its own stack and buffer, so nothing is shared between compiles.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CompileError, Diagnostics};
use crate::indent::check_indentation;
use crate::line::SourceLine;
use crate::output::OutputBuffer;
use crate::source::Source;
use crate::stack::FrameStack;

/// Configuration options for compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Memoize compiled output per source path and modification time.
    /// Accepted but not acted on yet.
    pub cache: bool,
}

/// Output from a successful compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileOutput {
    /// The assembled markup.
    pub code: String,
    /// Non-fatal warnings raised along the way.
    pub diagnostics: Diagnostics,
}

/// Compiles template lines into markup.
///
/// # Example
///
/// ```
/// let html = phml_core::compile(["%div", "  %p foo"]).unwrap();
/// assert_eq!(html, "<div>\n  <p>foo</p>\n</div>");
/// ```
pub fn compile<I, S>(lines: I) -> Result<String, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compile_with_diagnostics(lines).map(|output| output.code)
}

/// Compiles template text, splitting it on `\n` / `\r\n`.
pub fn compile_str(source: &str) -> Result<String, CompileError> {
    compile(source.lines())
}

/// Compiles template lines, keeping the warnings for fallback lines.
pub fn compile_with_diagnostics<I, S>(lines: I) -> Result<CompileOutput, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stack = FrameStack::new();
    let mut buffer = OutputBuffer::new();
    let mut diagnostics = Diagnostics::new();
    let mut previous: Option<SourceLine> = None;
    let mut count = 0;

    for (index, raw) in lines.into_iter().enumerate() {
        count += 1;
        let line = SourceLine::parse(index + 1, raw.as_ref());
        if line.is_ignored() {
            continue;
        }

        check_indentation(previous.as_ref(), &line)?;
        stack.reconcile(&line, &mut buffer);
        for warning in [line.indentation_warning(), line.fallback_warning()]
            .into_iter()
            .flatten()
        {
            diagnostics.add_warning(warning);
        }
        previous = Some(line);
    }

    let unclosed = stack.flush(&mut buffer);
    log::debug!(
        "compiled {} lines into {} fragments ({} closed at end of input)",
        count,
        buffer.len(),
        unclosed
    );

    Ok(CompileOutput {
        code: buffer.render(),
        diagnostics,
    })
}

/// Loads `source` and compiles it.
pub fn compile_source(
    source: &Source,
    options: &CompileOptions,
) -> Result<CompileOutput, CompileError> {
    if options.cache {
        log::trace!("cache requested for {}; compiling uncached", source.name());
    }
    let text = source.read()?;
    compile_with_diagnostics(text.lines())
}

/// Reads the template at `path` and compiles it.
pub fn compile_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    compile_source(&Source::file(path.as_ref()), options).map(|output| output.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileWarning;

    #[test]
    fn empty_input_compiles_to_empty_output() {
        assert_eq!(compile(Vec::<String>::new()).unwrap(), "");
        assert_eq!(compile_str("\n\n-# nothing here\n").unwrap(), "");
    }

    #[test]
    fn ignored_lines_do_not_count_as_previous() {
        // the blank and silent-comment lines between %div and its child
        // must not reset the permitted depth
        let out = compile_str("%div\n\n-# note\n  %p child").unwrap();
        assert_eq!(out, "<div>\n  <p>child</p>\n</div>");
    }

    #[test]
    fn ignored_lines_may_have_any_indentation() {
        let out = compile_str("%p a\n         -# deep silent comment\n   \n%p b").unwrap();
        assert_eq!(out, "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn line_numbers_count_ignored_lines() {
        let err = compile_str("%p a\n\n-# c\n  %p b").unwrap_err();
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn crlf_input() {
        assert_eq!(
            compile_str("%div\r\n  %p x\r\n").unwrap(),
            "<div>\n  <p>x</p>\n</div>"
        );
    }

    #[test]
    fn collects_fallback_warnings_in_line_order() {
        let output = compile_with_diagnostics(["%p!bad", "- else", "%p fine"]).unwrap();
        assert_eq!(output.code, "%p!bad\n<?php else ?>\n<p>fine</p>");
        assert_eq!(output.diagnostics.warnings.len(), 2);
        assert!(matches!(
            output.diagnostics.warnings[0],
            CompileWarning::LiteralFallback { line: 1, .. }
        ));
        assert_eq!(output.diagnostics.warnings[1].line(), 2);
    }

    #[test]
    fn tab_indented_line_compiles_as_sibling_with_warning() {
        let output = compile_with_diagnostics(["%div", "\t%p x"]).unwrap();
        assert_eq!(output.code, "<div>\n</div>\n<p>x</p>");
        assert_eq!(
            output.diagnostics.warnings,
            [CompileWarning::TabIndentation { line: 2 }]
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: CompileOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.cache);
        let options: CompileOptions = serde_json::from_str(r#"{"cache": true}"#).unwrap();
        assert!(options.cache);
    }

    #[test]
    fn cache_flag_does_not_change_output() {
        let source = Source::inline("t.phml", "%ul\n  %li one");
        let plain = compile_source(&source, &CompileOptions::default()).unwrap();
        let cached = compile_source(&source, &CompileOptions { cache: true }).unwrap();
        assert_eq!(plain, cached);
    }
}
