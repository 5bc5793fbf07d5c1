#![deny(missing_docs)]
//! phml core: compiles indentation-based templates into HTML with embedded
//! PHP code regions.

/// Parallel compilation of many templates.
pub mod batch;
/// Compiler driver and options.
pub mod compiler;
/// Core error and diagnostic types.
pub mod error;
/// Indentation validation.
pub mod indent;
/// Line classification.
pub mod line;
/// Output assembly.
pub mod output;
/// Template sources.
pub mod source;
/// Nesting stack of open frames.
pub mod stack;

pub use batch::{
    BatchError, BatchInput, BatchOptions, BatchProcessingResult, BatchResult, BatchStats,
    compile_batch,
};
pub use compiler::{
    CompileOptions, CompileOutput, compile, compile_file, compile_source, compile_str,
    compile_with_diagnostics,
};
pub use error::{CompileError, CompileWarning, Diagnostics};
pub use line::{Doctype, Element, LineKind, PHP_CLOSE, PHP_OPEN, SourceLine};
pub use output::OutputBuffer;
pub use source::Source;
pub use stack::{Frame, FrameStack};
