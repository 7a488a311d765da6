//! Stockfetch CLI: download price history for a list of tickers.
//!
//! Commands:
//! - (default): collect selections from flags or an interactive prompt,
//!   fetch every ticker, write CSV files and HTML charts under a run directory
//! - `intervals`: list supported intervals with their lookback window

mod input;
mod interrupt;
mod report;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stockfetch_core::chart::{ChartRenderer, PlotlyHtmlRenderer};
use stockfetch_core::config::AppConfig;
use stockfetch_core::data::yahoo::DEFAULT_BASE_URL;
use stockfetch_core::data::{
    BatchFetcher, BatchResult, CancelToken, CircuitBreaker, StdoutProgress, YahooProvider,
};
use stockfetch_core::domain::Interval;
use stockfetch_core::output::{write_batch, RunContext, WriteResults};
use stockfetch_core::range::RangePreset;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::input::{ArgsInput, InputSource, PromptInput};

#[derive(Parser)]
#[command(
    name = "stockfetch",
    version,
    about = "Download stock price history to CSV and render interactive charts",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    fetch: FetchArgs,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported intervals with their available history.
    Intervals,
}

#[derive(Args, Debug, Default)]
struct FetchArgs {
    /// Comma-separated tickers (e.g. AAPL,MSFT). Defaults to the input file.
    #[arg(long)]
    tickers: Option<String>,

    /// Ticker file, one symbol per line. Defaults to input_tickers/input_tickers.txt.
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Bar interval (1m, 2m, 5m, 15m, 30m, 60m, 90m, 1h, 1d, 5d, 1wk, 1mo, 3mo).
    #[arg(long)]
    interval: Option<Interval>,

    /// Start date (YYYY-MM-DD).
    #[arg(long, conflicts_with_all = ["preset", "max"])]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Named range, e.g. last-30-days, last-1-year. Defaults to the interval's first preset.
    #[arg(long, conflicts_with = "max")]
    preset: Option<RangePreset>,

    /// Everything the provider has for the interval.
    #[arg(long, default_value_t = false)]
    max: bool,

    /// Skip chart generation.
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Ask for every selection on the terminal.
    #[arg(long, short = 'i', default_value_t = false)]
    interactive: bool,

    /// Do not ask for confirmation before downloading.
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,

    /// Retries per ticker after the first attempt.
    #[arg(long)]
    retries: Option<u32>,

    /// Tickers fetched in parallel.
    #[arg(long)]
    workers: Option<usize>,

    /// Root of the output tree. Defaults to ./data.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// TOML config file. Defaults to <config dir>/stockfetch/config.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Some(Commands::Intervals) => {
            print_intervals(&mut std::io::stdout().lock())?;
            report::EXIT_OK
        }
        None => run_fetch(cli.fetch)?,
    };

    if code != report::EXIT_OK {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,stockfetch={level},stockfetch_core={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file from `--config`, else the per-user file when it exists, else defaults.
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    let user_file = dirs::config_dir().map(|d| d.join("stockfetch").join("config.toml"));
    match user_file {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "loading user config");
            AppConfig::from_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        _ => Ok(AppConfig::default()),
    }
}

/// Command-line values win over the config file.
fn apply_overrides(config: &mut AppConfig, args: &FetchArgs) {
    if let Some(retries) = args.retries {
        config.fetch.max_retries = retries;
    }
    if let Some(workers) = args.workers {
        config.fetch.workers = workers.max(1);
    }
    if let Some(dir) = &args.output_dir {
        config.output.root_dir = dir.clone();
    }
    if let Some(file) = &args.input_file {
        config.input.ticker_file = file.clone();
    }
    if let Some(interval) = args.interval {
        config.input.default_interval = interval;
    }
    if args.no_charts {
        config.charts.enabled = false;
    }
}

fn args_input(args: &FetchArgs, config: &AppConfig) -> ArgsInput {
    ArgsInput {
        tickers: args.tickers.clone(),
        ticker_file: config.input.ticker_file.clone(),
        interval: config.input.default_interval,
        start: args.start,
        end: args.end,
        preset: args.preset,
        max: args.max,
        generate_charts: config.charts.enabled,
    }
}

fn run_fetch(args: FetchArgs) -> Result<i32> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    let ctx = RunContext::now(&config.output.root_dir);
    let today = ctx.started_at().date();

    let mut source: Box<dyn InputSource> = if args.interactive {
        println!("Stock Universe - Data Collection");
        Box::new(PromptInput::new(
            std::io::stdin().lock(),
            std::io::stdout(),
            &config.input.ticker_file,
            config.input.default_interval,
        ))
    } else {
        Box::new(args_input(&args, &config))
    };

    let selection = input::collect(source.as_mut())?;
    if !args.yes && !source.confirm(&selection, today)? {
        println!("Operation cancelled by user.");
        return Ok(report::EXIT_OK);
    }
    drop(source);

    let (start, end) = selection
        .range
        .to_dates(selection.interval, today)
        .context("invalid date range")?;
    info!(
        tickers = selection.tickers.len(),
        interval = %selection.interval,
        %start,
        %end,
        "selection complete"
    );

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::with_base_url(breaker, DEFAULT_BASE_URL, config.fetch.timeout())
        .context("failed to set up the Yahoo Finance client")?;
    let limiter = config.fetch.rate_limiter();
    let cancel = CancelToken::new();
    interrupt::install(cancel.clone());

    let progress = StdoutProgress;
    let batch = BatchFetcher::new(&provider, &limiter)
        .with_options(config.fetch.fetch_options())
        .with_progress(&progress)
        .with_cancel(cancel.clone())
        .fetch_all(&selection.tickers, selection.interval, start, end, today);

    let renderer = PlotlyHtmlRenderer::new(config.charts.options());
    let renderer: Option<&dyn ChartRenderer> = if selection.generate_charts {
        Some(&renderer)
    } else {
        None
    };

    let (run_dir, written) = write_outputs(&ctx, &batch, renderer)?;

    let mut out = std::io::stdout().lock();
    report::write_report(&mut out, &batch, &written, run_dir.as_deref())?;
    out.flush()?;

    let code = report::exit_code(&batch, &written, cancel.is_cancelled());
    debug!(code, "run finished");
    Ok(code)
}

/// Write every successful ticker under the run directory. The directory is
/// only created when there is something to put in it.
fn write_outputs(
    ctx: &RunContext,
    batch: &BatchResult,
    renderer: Option<&dyn ChartRenderer>,
) -> Result<(Option<PathBuf>, WriteResults)> {
    if batch.summary().succeeded == 0 {
        return Ok((None, WriteResults::new()));
    }
    let dir = ctx
        .create()
        .context("failed to create the run directory")?;
    info!(run = %ctx.id(), started_at = %ctx.started_at(), "writing run output");
    println!("\nCreated data directory: {}", dir.display());
    Ok((Some(dir), write_batch(ctx, batch, renderer)))
}

fn print_intervals(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "Supported Data Intervals\n")?;
    writeln!(out, "  {:<8} {:<20} Description", "Interval", "Period Available")?;
    for interval in Interval::ALL {
        writeln!(
            out,
            "  {:<8} {:<20} {}",
            interval.as_str(),
            interval.availability(),
            interval.description()
        )?;
    }
    Ok(())
}
