use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use spendtrack_core::{
    BudgetStatus, DateRange, FilterSpec, TransactionStore, category_breakdown, evaluate,
    monthly_by_category, monthly_summary,
};
use spendtrack_ingest::{BatchReport, FileFailure, Pipeline, SourceProfile, export_to_path, export_to_string};

mod config;

use config::{Config, load_config};

#[derive(Parser, Debug)]
#[command(name = "spendtrack", version, about = "Personal spending tracker: ingest bank CSV exports, summarize, budget")]
struct Cli {
    /// TOML config: sources, column synonyms, noise phrases, category rules, budget
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Restrict to one grouped category
    #[arg(long)]
    category: Option<String>,

    /// Include rows marked excluded
    #[arg(long)]
    include_excluded: bool,
}

impl FilterArgs {
    fn spec(&self, month: Option<&str>) -> Result<FilterSpec> {
        let mut spec = FilterSpec::new().include_excluded(self.include_excluded);
        if self.from.is_some() || self.to.is_some() {
            let start = self.from.unwrap_or(NaiveDate::MIN);
            let end = self.to.unwrap_or(NaiveDate::MAX);
            spec = spec.date_range(DateRange::new(start, end)?);
        }
        if let Some(category) = &self.category {
            spec = spec.category(category.clone());
        }
        if let Some(month) = month {
            spec = spec.month(month);
        }
        Ok(spec)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest bank CSV exports and report what was added, dropped, and skipped
    Import {
        files: Vec<PathBuf>,

        /// Force a configured source tag instead of auto-detecting per file
        #[arg(long)]
        source: Option<String>,
    },

    /// Monthly spend / income / net totals
    Summary {
        files: Vec<PathBuf>,

        /// Restrict to one month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Expense totals per grouped category, largest first
    Breakdown {
        files: Vec<PathBuf>,

        #[arg(long)]
        month: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Month-by-month expense totals per category
    Timeline {
        files: Vec<PathBuf>,

        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Compare a month's spend against a budget limit
    Budget {
        files: Vec<PathBuf>,

        /// Budget limit; falls back to [budget] monthly_limit in the config
        #[arg(long)]
        limit: Option<f64>,

        /// Restrict to one month (YYYY-MM); default: every month present
        #[arg(long)]
        month: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Write ingested transactions as canonical CSV
    Export {
        files: Vec<PathBuf>,

        /// Output path; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let pipeline = config.pipeline()?;

    match cli.command {
        Command::Import { files, source } => {
            let report = ingest(&pipeline, &config, &files, source.as_deref())?;
            print_report(&report);
            let mut store = TransactionStore::new();
            let added = store.add_batch(report.rows).len();
            println!("Added {added} transactions across {} file(s)", files.len());
        }

        Command::Summary {
            files,
            month,
            source,
            filter,
        } => {
            let store = load_store(&pipeline, &config, &files, source.as_deref())?;
            let view = store.view(&filter.spec(month.as_deref())?);
            let rows = monthly_summary(&view);
            if rows.is_empty() {
                println!("No transactions match.");
            }
            for row in rows {
                println!(
                    "{}  spend=${:.2}  income=${:.2}  net=${:+.2}",
                    row.month, row.total_spend, row.total_income, row.net
                );
            }
        }

        Command::Breakdown {
            files,
            month,
            source,
            filter,
        } => {
            let store = load_store(&pipeline, &config, &files, source.as_deref())?;
            let view = store.view(&filter.spec(month.as_deref())?);
            let rows = category_breakdown(&view);
            if rows.is_empty() {
                println!("No expenses match.");
            }
            for row in rows {
                println!("{:<20} ${:.2}", row.grouped_category, row.total_spend);
            }
        }

        Command::Timeline { files, source, filter } => {
            let store = load_store(&pipeline, &config, &files, source.as_deref())?;
            let view = store.view(&filter.spec(None)?);
            let mut current_month = String::new();
            for cell in monthly_by_category(&view) {
                if cell.month != current_month {
                    println!("{}", cell.month);
                    current_month = cell.month.clone();
                }
                println!("  {:<20} ${:.2}", cell.grouped_category, cell.total_spend);
            }
        }

        Command::Budget {
            files,
            limit,
            month,
            source,
            filter,
        } => {
            let limit = match limit.or(config.budget.monthly_limit) {
                Some(limit) => limit,
                None => {
                    println!("No budget set (pass --limit or configure [budget] monthly_limit).");
                    return Ok(());
                }
            };
            let store = load_store(&pipeline, &config, &files, source.as_deref())?;
            let view = store.view(&filter.spec(month.as_deref())?);
            let summaries = monthly_summary(&view);
            if summaries.is_empty() {
                println!("No transactions match.");
            }
            for summary in summaries {
                print_budget(&evaluate(summary.month, summary.total_spend, limit));
            }
        }

        Command::Export {
            files,
            out,
            source,
            filter,
        } => {
            let store = load_store(&pipeline, &config, &files, source.as_deref())?;
            let view = store.view(&filter.spec(None)?);
            match out {
                Some(path) => {
                    export_to_path(&path, &view)?;
                    println!("Wrote {} transactions to {}", view.len(), path.display());
                }
                None => print!("{}", export_to_string(&view)?),
            }
        }
    }

    Ok(())
}

/// Ingest every file, detecting its source profile unless one was
/// forced. A file that cannot be read or matched fails alone; the rest
/// of the batch still loads.
fn ingest(
    pipeline: &Pipeline,
    config: &Config,
    files: &[PathBuf],
    source: Option<&str>,
) -> Result<BatchReport> {
    if files.is_empty() {
        bail!("no input files given");
    }
    let forced = match source {
        Some(tag) => Some(
            config
                .source
                .iter()
                .find(|p| p.tag.eq_ignore_ascii_case(tag))
                .with_context(|| format!("no configured source with tag '{tag}'"))?,
        ),
        None => None,
    };

    let mut report = BatchReport::default();
    for path in files {
        match ingest_one(pipeline, config, path, forced) {
            Ok(outcome) => {
                report.rows.extend(outcome.rows);
                report.skipped.extend(outcome.skipped);
                report.noise_dropped += outcome.noise_dropped;
            }
            Err(error) => report.failed_files.push(FileFailure {
                file: path.display().to_string(),
                error,
            }),
        }
    }
    Ok(report)
}

fn ingest_one(
    pipeline: &Pipeline,
    config: &Config,
    path: &Path,
    forced: Option<&SourceProfile>,
) -> spendtrack_core::Result<spendtrack_ingest::IngestOutcome> {
    let label = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unnamed>")
        .to_string();
    let text = fs::read_to_string(path).map_err(|e| spendtrack_core::Error::Read {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    let detected;
    let profile = match forced {
        Some(profile) => profile,
        None => {
            detected = pipeline
                .detect_profile(&text, &config.source)
                .ok_or_else(|| spendtrack_core::Error::Schema {
                    file: label.clone(),
                    column: "amount".to_string(),
                })?;
            &detected
        }
    };
    tracing::debug!(file = label, source = profile.tag, "ingesting");
    pipeline.ingest_str(&text, profile, &label)
}

fn load_store(
    pipeline: &Pipeline,
    config: &Config,
    files: &[PathBuf],
    source: Option<&str>,
) -> Result<TransactionStore> {
    let report = ingest(pipeline, config, files, source)?;
    for failure in &report.failed_files {
        eprintln!("warning: {}: {}", failure.file, failure.error);
    }
    for diag in &report.skipped {
        eprintln!("warning: skipped {diag}");
    }
    let mut store = TransactionStore::new();
    store.add_batch(report.rows);
    Ok(store)
}

fn print_report(report: &BatchReport) {
    for failure in &report.failed_files {
        println!("FAILED  {}: {}", failure.file, failure.error);
    }
    for diag in &report.skipped {
        println!("skipped {diag}");
    }
    if report.noise_dropped > 0 {
        println!("Dropped {} payment/reversal row(s)", report.noise_dropped);
    }
}

fn print_budget(status: &BudgetStatus) {
    if !status.has_budget() {
        println!("{}  spend=${:.2}  (no budget set)", status.period, status.spend);
        return;
    }
    let bar_width = 20;
    let filled = (status.progress * bar_width as f64).round() as usize;
    let bar: String = "#".repeat(filled) + &"-".repeat(bar_width - filled);
    let ratio = status.ratio.unwrap_or(0.0);
    println!(
        "{}  [{}] ${:.2} / ${:.2} ({:.0}%){}",
        status.period,
        bar,
        status.spend,
        status.budget_limit,
        ratio * 100.0,
        if status.over_budget { "  OVER BUDGET" } else { "" }
    );
}
