//! Command-line interface for phml.
//! Compiles one or more templates into PHP/HTML.
//!
//! Usage:
//!   phml `<paths>...`                    - Print compiled output to stdout
//!   phml `<paths>...` --out-dir `<dir>`  - Write `<stem>.php` per template into `<dir>`
//!   phml `<paths>...` --json             - Print a JSON report with results and stats

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use phml_core::{BatchInput, BatchOptions, BatchProcessingResult, CompileOptions, compile_batch};

#[derive(Parser, Debug)]
#[command(name = "phml", version, about = "Compile phml templates into PHP/HTML")]
struct Args {
    /// Template files to compile
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Write `<stem>.php` for each template into this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Worker threads used when compiling several templates (needs --keep-going)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Keep compiling the remaining templates after a failure
    #[arg(long)]
    keep_going: bool,

    /// Memoize compiled output (accepted, currently has no effect)
    #[arg(long)]
    cache: bool,

    /// Print a JSON report instead of the compiled output
    #[arg(long)]
    json: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Compile every path; returns whether all of them succeeded.
fn run(args: &Args) -> Result<bool> {
    if args.jobs.is_some() && !args.keep_going {
        log::warn!("--jobs has no effect without --keep-going; templates compile one at a time");
    }

    let inputs = args.paths.iter().map(BatchInput::file).collect();
    let options = BatchOptions {
        max_threads: args.jobs,
        continue_on_error: Some(args.keep_going),
        config: CompileOptions { cache: args.cache },
    };

    let batch = compile_batch(inputs, &options);
    log::info!(
        "compiled {}/{} templates in {:.1}ms",
        batch.stats.succeeded,
        batch.stats.total,
        batch.stats.processing_time_ms
    );

    for result in &batch.results {
        if let Some(output) = &result.result {
            for warning in &output.diagnostics.warnings {
                log::warn!("{}: {}", result.id, warning);
            }
        }
    }

    if let Some(dir) = &args.out_dir {
        write_outputs(dir, &batch)?;
    }

    if args.json {
        let report = serde_json::to_string_pretty(&batch).context("serializing report")?;
        println!("{report}");
    } else {
        print_results(&batch, args.out_dir.is_none());
    }

    Ok(batch.all_succeeded())
}

fn print_results(batch: &BatchProcessingResult, to_stdout: bool) {
    for result in &batch.results {
        match (&result.result, &result.error) {
            (_, Some(error)) => match error.line {
                Some(line) => eprintln!("{}:{}: {}", result.id, line, error.message),
                None => eprintln!("error: {}", error.message),
            },
            (Some(output), None) if to_stdout => println!("{}", output.code),
            _ => {}
        }
    }

    let skipped = batch.stats.total as usize - batch.results.len();
    if skipped > 0 {
        eprintln!(
            "skipped {} template(s) after the first failure; pass --keep-going to compile them",
            skipped
        );
    }
}

fn write_outputs(dir: &Path, batch: &BatchProcessingResult) -> Result<()> {
    let targets = output_targets(dir, batch)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    for (result, target) in batch.results.iter().zip(targets) {
        let (Some(output), Some(target)) = (&result.result, target) else {
            continue;
        };
        std::fs::write(&target, format!("{}\n", output.code))
            .with_context(|| format!("writing {}", target.display()))?;
        log::info!("{} -> {}", result.id, target.display());
    }

    Ok(())
}

/// Output path per result, `None` for failed templates.
/// Fails before anything is written if two templates map to the same file.
fn output_targets(dir: &Path, batch: &BatchProcessingResult) -> Result<Vec<Option<PathBuf>>> {
    let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
    let mut targets = Vec::with_capacity(batch.results.len());

    for result in &batch.results {
        if result.result.is_none() {
            targets.push(None);
            continue;
        }
        let target = output_path(dir, &result.id);
        if let Some(previous) = claimed.insert(target.clone(), &result.id) {
            bail!(
                "{} and {} would both be written to {}",
                previous,
                result.id,
                target.display()
            );
        }
        targets.push(Some(target));
    }

    Ok(targets)
}

fn output_path(dir: &Path, id: &str) -> PathBuf {
    let stem = Path::new(id)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string());
    dir.join(format!("{stem}.php"))
}
