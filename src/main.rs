use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clong::pipeline::{self, PredictOpt, DEFAULT_MODEL_PATH, OUTPUT_DIR};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "clong",
    author,
    version,
    about = "Predict longevity gene classes for protein sequences",
    arg_required_else_help = true
)]
struct Cli {
    /// Input protein FASTA file
    input: PathBuf,
    /// Pre-trained classifier (.model, or .safetensors with the `candle` feature)
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
    /// Directory for clong_predictions.csv
    #[arg(short = 'o', long = "output-dir", default_value = OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run_predict(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // 致命错误不经过日志过滤
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_target(false)
        .init();
}

fn run_predict(cli: Cli) -> Result<()> {
    let opt = PredictOpt {
        input: cli.input,
        model: cli.model,
        output_dir: cli.output_dir,
        ..PredictOpt::default()
    };
    let summary = pipeline::run(&opt)
        .with_context(|| format!("prediction for '{}' failed", opt.input.display()))?;

    println!("sequences: {}", summary.sequences);
    println!("output: {}", summary.output.display());
    Ok(())
}
