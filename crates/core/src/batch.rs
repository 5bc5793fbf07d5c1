//! Batch processing types and utilities for parallel compilation.

use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use crate::compiler::{CompileOptions, CompileOutput, compile_source};
use crate::error::CompileError;
use crate::source::Source;

/// Input for batch processing - represents a single template to compile.
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Template identifier (typically the file path).
    pub id: String,
    /// Where the template text comes from.
    pub source: Source,
}

impl BatchInput {
    /// Input for a file on disk, identified by its path.
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        let source = Source::file(path);
        Self {
            id: source.name().into_owned(),
            source,
        }
    }
}

/// Failure for one template in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchError {
    /// Human-readable message.
    pub message: String,
    /// Offending line, when the failure came from a specific line.
    pub line: Option<usize>,
}

impl From<&CompileError> for BatchError {
    fn from(err: &CompileError) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
        }
    }
}

/// Result for a single template in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Template identifier matching the input.
    pub id: String,
    /// Compilation result (present on success).
    pub result: Option<CompileOutput>,
    /// Error (present on failure).
    pub error: Option<BatchError>,
}

/// Statistics for batch processing.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    /// Total number of templates submitted.
    pub total: u32,
    /// Number of successfully compiled templates.
    pub succeeded: u32,
    /// Number of failed compilations.
    pub failed: u32,
    /// Total processing time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch processing.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum number of threads to use. Defaults to number of CPU cores.
    pub max_threads: Option<usize>,
    /// Whether to continue processing after an error. Defaults to true.
    pub continue_on_error: Option<bool>,
    /// Compiler configuration to use for all templates.
    pub config: CompileOptions,
}

/// Result of batch processing containing all results and statistics.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProcessingResult {
    /// Individual results for each input, in input order.
    pub results: Vec<BatchResult>,
    /// Processing statistics.
    pub stats: BatchStats,
}

impl BatchProcessingResult {
    /// Whether every submitted template compiled.
    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0 && self.stats.succeeded == self.stats.total
    }
}

/// Compiles many templates, in parallel unless stopping on the first error.
///
/// Each template is an independent compile with its own state; only the
/// counters are shared between workers. `max_threads` sizes the pool for the
/// parallel path and is ignored when `continue_on_error` is false.
pub fn compile_batch(inputs: Vec<BatchInput>, options: &BatchOptions) -> BatchProcessingResult {
    let start = Instant::now();
    let total = inputs.len() as u32;
    let counters = Counters::default();
    let config = options.config;
    let compile_one = |input: BatchInput| counters.record(compile_input(input, &config));

    let results: Vec<BatchResult> = if options.continue_on_error.unwrap_or(true) {
        match options.max_threads.and_then(build_pool) {
            Some(pool) => pool.install(|| inputs.into_par_iter().map(compile_one).collect()),
            None => inputs.into_par_iter().map(compile_one).collect(),
        }
    } else {
        // Inputs after the first failure are never read.
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = compile_one(input);
            let failed = result.error.is_some();
            results.push(result);
            if failed {
                break;
            }
        }
        results
    };

    BatchProcessingResult {
        results,
        stats: BatchStats {
            total,
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    }
}

#[derive(Default)]
struct Counters {
    succeeded: AtomicU32,
    failed: AtomicU32,
}

impl Counters {
    fn record(&self, result: BatchResult) -> BatchResult {
        let counter = if result.error.is_some() {
            &self.failed
        } else {
            &self.succeeded
        };
        counter.fetch_add(1, Ordering::Relaxed);
        result
    }
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|err| log::warn!("falling back to the global thread pool: {err}"))
        .ok()
}

fn compile_input(input: BatchInput, config: &CompileOptions) -> BatchResult {
    match compile_source(&input.source, config) {
        Ok(output) => BatchResult {
            id: input.id,
            result: Some(output),
            error: None,
        },
        Err(err) => {
            log::debug!("{}: {}", input.id, err);
            BatchResult {
                id: input.id,
                result: None,
                error: Some(BatchError::from(&err)),
            }
        }
    }
}
