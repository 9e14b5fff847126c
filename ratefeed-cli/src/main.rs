//! Ratefeed CLI: fetch, import and query currency and key rates.
//!
//! Commands:
//! - `sweep`: fetch daily rates for a date range (default: trailing 30 days)
//! - `import`: load a local .xlsx/.xls/.csv key-rate file
//! - `key-rate`: fetch the key-rate history page
//! - `rate` / `latest` / `range`: query the stored series
//! - `status`: report what the store holds

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ratefeed_core::{InstrumentCode, RateBook};
use ratefeed_runner::{Pipeline, PipelineConfig, SweepSummary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ratefeed",
    about = "Ratefeed CLI: central-bank currency and key-rate pipeline"
)]
struct Cli {
    /// Path to a TOML config file. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file. Defaults to parsed_data/currency_rates.json.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Concurrent day fetches during a sweep.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Merge into the existing store instead of replacing it.
    #[arg(long, global = true, default_value_t = false)]
    merge: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch daily currency rates for every day in a range.
    Sweep {
        /// Start date (YYYY-MM-DD). Defaults to `--days` before the end date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Trailing window length when --start is omitted.
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Import a local spreadsheet or CSV key-rate file.
    Import {
        /// Path to a .xlsx, .xls or .csv file.
        path: PathBuf,
    },
    /// Fetch the key-rate history page.
    KeyRate,
    /// Rate for one instrument on one date.
    Rate {
        /// Date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Instrument code (e.g. USD), case-insensitive.
        #[arg(long)]
        code: InstrumentCode,
    },
    /// Rate for one instrument on the latest stored date.
    Latest {
        /// Instrument code (e.g. USD), case-insensitive.
        #[arg(long)]
        code: InstrumentCode,

        /// Use the latest date that has this code, not the latest date overall.
        #[arg(long, default_value_t = false)]
        per_code: bool,
    },
    /// Rates for one instrument over an inclusive date range.
    Range {
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        to: String,

        /// Instrument code (e.g. USD), case-insensitive.
        #[arg(long)]
        code: InstrumentCode,
    },
    /// Report store contents and metadata.
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(load_config(&cli)?)?.with_merge_existing(cli.merge);

    match cli.command {
        Commands::Sweep { start, end, days } => run_sweep(&pipeline, start, end, days),
        Commands::Import { path } => {
            let summary = pipeline.run_from_file(&path)?;
            println!(
                "Imported {} date(s) from {} via {}; store now holds {} date(s).",
                summary.dates,
                path.display(),
                summary.source,
                summary.series.len()
            );
            Ok(())
        }
        Commands::KeyRate => {
            let summary = pipeline.run_key_rate_page()?;
            println!(
                "Fetched {} key-rate date(s) from {}.",
                summary.dates,
                pipeline.config().key_rate_url
            );
            Ok(())
        }
        Commands::Rate { date, code } => {
            let date = parse_date(&date)?;
            let book = pipeline.open_book()?;
            match book.rate_on(date, code.as_str()) {
                Some(rate) => println!("{date} {code} {rate}"),
                None => println!("{date} {code}: no data"),
            }
            Ok(())
        }
        Commands::Latest { code, per_code } => run_latest(&pipeline.open_book()?, &code, per_code),
        Commands::Range { from, to, code } => {
            let (from, to) = (parse_date(&from)?, parse_date(&to)?);
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            let rows = pipeline.open_book()?.rates_in_range(from, to, code.as_str());
            if rows.is_empty() {
                println!("No {code} data between {from} and {to}.");
            }
            for (date, rate) in rows {
                println!("{date} {rate}");
            }
            Ok(())
        }
        Commands::Status => run_status(&pipeline),
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }
    Ok(config)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn run_sweep(
    pipeline: &Pipeline,
    start: Option<String>,
    end: Option<String>,
    days: u32,
) -> Result<()> {
    let end_date = end
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let summary = match start.as_deref().map(parse_date).transpose()? {
        Some(start_date) => pipeline.run_remote_sweep(start_date, end_date)?,
        None => pipeline.run_trailing_sweep(days, end_date)?,
    };
    print_sweep_summary(&summary);

    if !summary.all_succeeded() {
        for (date, err) in &summary.errors {
            eprintln!("Error for {date}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_latest(book: &RateBook, code: &InstrumentCode, per_code: bool) -> Result<()> {
    if per_code {
        match book.latest_observation(code.as_str()) {
            Some((date, rate)) => println!("{date} {code} {rate}"),
            None => println!("{code}: no data"),
        }
        return Ok(());
    }

    let Some((_, last)) = book.date_span() else {
        bail!("store is empty; run `ratefeed sweep` or `ratefeed import` first");
    };
    match book.latest_rate(code.as_str())? {
        Some(rate) => println!("{last} {code} {rate}"),
        None => println!("{code}: not present on {last} (try --per-code)"),
    }
    Ok(())
}

fn run_status(pipeline: &Pipeline) -> Result<()> {
    let store = pipeline.store();
    if !store.path().exists() {
        println!("Store does not exist: {}", store.path().display());
        return Ok(());
    }

    let book = pipeline.open_book()?;
    println!("Store: {}", store.path().display());
    println!("Dates: {}", book.len());
    if let Some((first, last)) = book.date_span() {
        println!("Range: {first} to {last}");
    }

    let instruments = book.instruments();
    let codes: Vec<&str> = instruments.iter().map(|c| c.as_str()).collect();
    println!("Instruments ({}): {}", codes.len(), codes.join(" "));

    match store.meta() {
        Some(meta) => {
            println!("Source: {}", meta.source);
            println!("Written: {}", meta.written_at.format("%Y-%m-%d %H:%M:%S"));
            println!("Hash: {}", meta.data_hash);
        }
        None => println!("No metadata sidecar at {}", store.meta_path().display()),
    }
    Ok(())
}

fn print_summary_line(label: &str, value: impl std::fmt::Display) {
    println!("{label:<12}{value}");
}

fn print_sweep_summary(summary: &SweepSummary) {
    println!();
    println!("=== Sweep Result ===");
    print_summary_line("Days:", summary.total);
    print_summary_line("Succeeded:", summary.succeeded);
    print_summary_line("Failed:", summary.failed);
    print_summary_line("Stored:", summary.series.len());
    if let (Some(first), Some(last)) = (summary.series.first_date(), summary.series.last_date()) {
        print_summary_line("Range:", format!("{first} to {last}"));
    }
    println!();
}
