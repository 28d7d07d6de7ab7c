use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use tally_core::{RangePreset, RecordType, Transaction, query, savings_summary};
use tally_ingest::{
    FormatRegistry, LEDGER_FILE_NAME, apply_overrides, ingest_dir, load_overrides, merge_sources,
    read_ledger, write_ledger,
};
use tally_insights::{Indicator, compute_insights, detect_subscriptions};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Merge personal-finance CSV exports and surface subscriptions and spending anomalies"
)]
struct Cli {
    /// Directory holding source CSV exports (and merged.csv once built)
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Config file with extra transfer keywords and contributions
    #[arg(long, default_value = "tally.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge every export in the data directory into merged.csv
    Merge,

    /// List detected recurring charges
    Subscriptions {
        /// Date range preset: last-month, last-3-months, last-6-months,
        /// last-12-months, ytd, all
        #[arg(long, default_value = "last-12-months")]
        range: String,
    },

    /// Month-over-baseline spending insights
    Insights {
        #[arg(long, default_value = "last-12-months")]
        range: String,
    },

    /// Yearly money summary: income, spend, savings rate
    Summary {
        /// Calendar year (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Merge => merge_command(&cli.data_dir, &cfg),
        Command::Subscriptions { range } => {
            let preset: RangePreset = range.parse()?;
            subscriptions_command(&cli.data_dir, &cfg, preset, today)
        }
        Command::Insights { range } => {
            let preset: RangePreset = range.parse()?;
            insights_command(&cli.data_dir, &cfg, preset, today)
        }
        Command::Summary { year } => {
            summary_command(&cli.data_dir, &cfg, year.unwrap_or_else(|| today.year()))
        }
    }
}

/// Load the canonical ledger: the merged file when present, otherwise a
/// fresh ingest of the source exports. Overrides are applied on top.
fn load_ledger(data_dir: &Path, cfg: &config::Config) -> Result<Vec<Transaction>> {
    let merged_path = data_dir.join(LEDGER_FILE_NAME);
    let ledger = if merged_path.exists() {
        debug!(path = %merged_path.display(), "loading merged ledger");
        read_ledger(&merged_path)?
    } else {
        debug!(dir = %data_dir.display(), "no merged ledger, ingesting sources");
        let registry = FormatRegistry::builtin();
        let batches = ingest_dir(data_dir, &registry, &cfg.transfer_keywords)?;
        merge_sources(batches)
    };
    let overrides = load_overrides(&data_dir.join("overrides.csv"))?;
    Ok(apply_overrides(ledger, &overrides))
}

/// Slice a ledger to a preset range resolved against its date bounds.
fn slice_range(ledger: &[Transaction], preset: RangePreset, today: NaiveDate) -> Vec<Transaction> {
    let Some((min_date, max_date)) = query::date_bounds(ledger) else {
        return Vec::new();
    };
    let (start, end) = tally_core::resolve(preset, today, min_date, max_date);
    query::filter_range(ledger, start, end)
}

fn merge_command(data_dir: &Path, cfg: &config::Config) -> Result<()> {
    let registry = FormatRegistry::builtin();
    let batches = ingest_dir(data_dir, &registry, &cfg.transfer_keywords)?;
    if batches.is_empty() {
        println!(
            "No CSV files found in {}. Drop your exports there and try again.",
            data_dir.display()
        );
        return Ok(());
    }

    let mut before = 0;
    for batch in &batches {
        println!("  Loaded {} rows from {}", batch.transactions.len(), batch.source);
        before += batch.transactions.len();
    }

    let merged = merge_sources(batches);
    let out = data_dir.join(LEDGER_FILE_NAME);
    write_ledger(&out, &merged).with_context(|| format!("writing {}", out.display()))?;

    println!();
    println!("Transactions before dedup: {before}");
    println!("Duplicates removed:        {}", before - merged.len());
    println!("Final transaction count:   {}", merged.len());
    println!("Saved to: {}", out.display());
    Ok(())
}

fn subscriptions_command(
    data_dir: &Path,
    cfg: &config::Config,
    preset: RangePreset,
    today: NaiveDate,
) -> Result<()> {
    let ledger = load_ledger(data_dir, cfg)?;
    if ledger.is_empty() {
        println!("No data found in {}.", data_dir.display());
        return Ok(());
    }

    let expenses = query::slice_by_type(&slice_range(&ledger, preset, today), RecordType::Expense);
    let subs = detect_subscriptions(&expenses);
    if subs.is_empty() {
        println!("No recurring charges detected in the selected range.");
        return Ok(());
    }

    let mut total_monthly = 0.0;
    for s in &subs {
        println!(
            "{:<28} {:<10} x{:<3} avg ${:>8.2}  est ${:>8.2}/mo  {} .. {}",
            s.merchant,
            format!("{:?}", s.cadence),
            s.occurrences,
            s.average_charge,
            s.estimated_monthly_cost,
            s.first_seen,
            s.last_seen
        );
        total_monthly += s.estimated_monthly_cost;
    }
    println!();
    println!(
        "{} subscriptions, estimated ${total_monthly:.2}/month",
        subs.len()
    );
    Ok(())
}

fn insights_command(
    data_dir: &Path,
    cfg: &config::Config,
    preset: RangePreset,
    today: NaiveDate,
) -> Result<()> {
    let ledger = load_ledger(data_dir, cfg)?;
    if ledger.is_empty() {
        println!("No data found in {}.", data_dir.display());
        return Ok(());
    }

    let expenses = query::slice_by_type(&slice_range(&ledger, preset, today), RecordType::Expense);
    let insights = compute_insights(&expenses);
    if insights.is_empty() {
        println!("Need at least 2 months of data in the selected range to surface insights.");
        return Ok(());
    }

    for i in &insights {
        let marker = match i.indicator {
            Indicator::Spike => "^",
            Indicator::Drop => "v",
            Indicator::Info => "*",
        };
        println!(
            "{marker} {:<34} ${:>9.0}  ({:+.0} vs avg)",
            i.headline, i.amount, i.delta
        );
    }
    Ok(())
}

fn summary_command(data_dir: &Path, cfg: &config::Config, year: i32) -> Result<()> {
    let ledger = load_ledger(data_dir, cfg)?;
    if ledger.is_empty() {
        println!("No data found in {}.", data_dir.display());
        return Ok(());
    }

    let year_slice: Vec<Transaction> = ledger
        .iter()
        .filter(|t| t.date.year() == year)
        .cloned()
        .collect();
    if year_slice.is_empty() {
        println!("No transactions in {year}.");
        return Ok(());
    }

    let months_tracked = query::distinct_months(&year_slice).len() as u32;
    let s = savings_summary(&year_slice, &cfg.contributions, months_tracked);

    println!("{year}: {months_tracked} month(s) of data");
    println!();
    println!("Take-home income:   ${:>12.2}", s.total_income);
    println!("Total spend:        ${:>12.2}", s.total_spend);
    println!("Invested transfers: ${:>12.2}", s.total_invested);
    println!(
        "Contributions:      ${:>12.2}  (pre-tax ${:.2}, after-tax ${:.2}, employer ${:.2})",
        s.pretax_contributions + s.aftertax_contributions + s.employer_match,
        s.pretax_contributions,
        s.aftertax_contributions,
        s.employer_match
    );
    println!("Total saved:        ${:>12.2}", s.total_saved);
    match s.savings_rate {
        Some(rate) => println!("Savings rate:       {:>12.1}%  of est. gross income", rate * 100.0),
        None => println!("Savings rate:       n/a (no income data loaded)"),
    }

    // Spending snapshot for the year's expense slice.
    let expenses = query::slice_by_type(&year_slice, RecordType::Expense);
    let monthly = query::monthly_totals(&expenses);
    if let Some((current, amount)) = monthly.iter().next_back() {
        let prev = monthly.get(&current.prev()).copied().unwrap_or(0.0);
        let complete: Vec<f64> = monthly
            .iter()
            .filter(|(month, _)| *month != current)
            .map(|(_, total)| *total)
            .collect();
        println!();
        println!(
            "{current}: ${amount:.2} spent ({:+.2} vs prior month)",
            amount - prev
        );
        if !complete.is_empty() {
            let recent = &complete[complete.len().saturating_sub(3)..];
            let avg = recent.iter().sum::<f64>() / recent.len() as f64;
            println!("Avg of last {} complete month(s): ${avg:.2}", recent.len());
        }
        println!("{year} spend to date: ${:.2}", query::total(&expenses));
    }
    Ok(())
}
