//! Chain Analysis CLI Application
//!
//! Command-line front end for the chain-analysis library. It adds:
//! - Argument parsing and an optional TOML configuration file
//! - Logger setup for analysis diagnostics
//! - Report generation (text table / JSON)

use anyhow::{bail, Context, Result};
use chain_analysis::{catalog, log_parser, Analyzer, ResponseTimeMode};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};

/// Chain Analysis - response-time statistics for call chains
#[derive(Parser, Debug)]
#[command(name = "chain-analysis")]
#[command(about = "Compute BCRT/ACRT/WCRT of call chains from an event log", long_about = None)]
#[command(version)]
struct Args {
    /// Chain catalog (JSON)
    #[arg(short, long, value_name = "FILE")]
    chains: Option<PathBuf>,

    /// Event log to analyze
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How response times are derived from the log
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Only analyze these chain IDs (can be repeated)
    #[arg(long = "chain", value_name = "ID")]
    chain_filter: Vec<u32>,

    /// Analyze chains in parallel
    #[arg(long)]
    parallel: bool,

    /// Worker threads for parallel analysis (implies --parallel)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Maximum accepted log line length in bytes
    #[arg(long, value_name = "BYTES")]
    max_line_len: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for results (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Match per-callback events against each chain's path
    Path,
    /// Treat every event as one end-to-end measurement
    PerEvent,
}

impl From<ModeArg> for ResponseTimeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Path => ResponseTimeMode::PathMatching,
            ModeArg::PerEvent => ResponseTimeMode::PerEvent,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Chain Analysis CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using analysis library v{}", chain_analysis::VERSION);

    let config = merge_config(&args)?;
    run(config, args.jobs)
}

/// Combine the optional config file with command line overrides
fn merge_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(chains) = &args.chains {
        config.input.chains = Some(chains.clone());
    }
    if let Some(log) = &args.log {
        config.input.log = Some(log.clone());
    }
    if let Some(mode) = args.mode {
        config.analysis.mode = mode.into();
    }
    if !args.chain_filter.is_empty() {
        config.analysis.chain_filter = Some(args.chain_filter.clone());
    }
    if args.parallel || args.jobs.is_some() {
        config.analysis.parallel = true;
    }
    if let Some(max_line_len) = args.max_line_len {
        config.analysis.max_line_len = max_line_len;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(output) = &args.output {
        config.output.file = Some(output.clone());
    }

    Ok(config)
}

fn run(config: AppConfig, jobs: Option<usize>) -> Result<()> {
    let (Some(chains_path), Some(log_path)) = (&config.input.chains, &config.input.log) else {
        bail!("both a chain catalog (--chains) and an event log (--log) are required");
    };

    if let Some(jobs) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let chains = catalog::load(chains_path)
        .with_context(|| format!("Failed to load chain catalog {:?}", chains_path))?;
    let events = log_parser::parse_file(log_path, &config.analysis)
        .with_context(|| format!("Failed to read event log {:?}", log_path))?;

    let analyzer = Analyzer::new(config.analysis.clone());
    let results = analyzer.analyze(&chains, &events)?;
    log::info!(
        "{} of {} chains produced results",
        results.len(),
        chains.len()
    );

    let rendered = report::render(config.output.format, analyzer.config(), &chains, &results)?;
    write_output(config.output.file.as_deref(), &rendered)
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write results to {:?}", path))?;
            log::info!("Results written to {:?}", path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
