use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use ledger_accrual_core::ledger::Account;
use ledger_accrual_core::pipeline::{self, PipelineOutput};
use ledger_accrual_core::FiscalYear;

use super::SourceArgs;

/// Arguments for a full pipeline run
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Include schedules and per-account aggregates in the result
    #[arg(long)]
    pub full: bool,
}

/// Arguments for statement lookups
#[derive(Args)]
pub struct StatementArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Single fiscal year
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub year: Option<FiscalYear>,

    /// First year of a range (inclusive)
    #[arg(long)]
    pub from: Option<FiscalYear>,

    /// Last year of a range (inclusive)
    #[arg(long)]
    pub to: Option<FiscalYear>,
}

/// Arguments for account balance history
#[derive(Args)]
pub struct BalancesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Account name, e.g. Cash, Depr_Exp, Accounts_Receivable
    #[arg(long)]
    pub account: String,

    /// First year (defaults to the first year with postings)
    #[arg(long)]
    pub from: Option<FiscalYear>,

    /// Last year (defaults to the configured end year)
    #[arg(long)]
    pub to: Option<FiscalYear>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScheduleKind {
    Depreciation,
    Accrual,
    All,
}

/// Arguments for schedule export
#[derive(Args)]
pub struct SchedulesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Which schedule to print
    #[arg(long, value_enum, default_value = "all")]
    pub kind: ScheduleKind,
}

/// Arguments for printing the effective configuration
#[derive(Args)]
pub struct ConfigArgs {
    /// Pipeline configuration file (.yaml/.yml or .json)
    #[arg(long)]
    pub config: Option<String>,

    /// Last fiscal year to project statements for
    #[arg(long)]
    pub end_year: Option<FiscalYear>,
}

pub fn run_pipeline(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.source.load_config()?;
    let records = args.source.load_records()?;
    let output = pipeline::run_pipeline_with_metadata(&records, &config)?;

    let mut value = serde_json::to_value(&output)?;
    if !args.full {
        value["result"] = summary_view(&output.result)?;
    }
    Ok(value)
}

fn summary_view(output: &PipelineOutput) -> Result<Value, Box<dyn std::error::Error>> {
    let report = &output.report;
    Ok(json!({
        "statements": serde_json::to_value(output.statements.to_vec())?,
        "summary": {
            "depreciation_entries": report.depreciation_entries,
            "accrual_entries": report.accrual_entries,
            "postings": report.postings,
            "aggregates": report.aggregates,
            "statement_rows": report.statement_rows,
            "skipped": report.skipped.len(),
        },
        "skipped": serde_json::to_value(&report.skipped)?,
    }))
}

pub fn run_statement(args: StatementArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (store, config) = args.source.open_store()?;

    if let Some(year) = args.year {
        let row = store
            .statement(year)
            .ok_or_else(|| format!("no statement row for {}", year))?;
        return Ok(serde_json::to_value(row)?);
    }

    let statements = store.statements();
    let from = args
        .from
        .or_else(|| statements.first_year())
        .unwrap_or(config.end_year);
    let to = args.to.unwrap_or(config.end_year);
    Ok(serde_json::to_value(store.statements_between(from, to))?)
}

pub fn run_balances(args: BalancesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let account: Account = args.account.parse()?;
    let config = args.source.load_config()?;
    let records = args.source.load_records()?;
    let output = pipeline::run_pipeline(&records, &config)?;

    let aggregates = &output.aggregates;
    let from = args
        .from
        .or_else(|| aggregates.years().first().copied())
        .unwrap_or(config.end_year);
    let to = args.to.unwrap_or(config.end_year);
    if from > to {
        return Err(format!("--from {} is after --to {}", from, to).into());
    }

    Ok(serde_json::to_value(aggregates.continuous(account, from, to))?)
}

pub fn run_schedules(args: SchedulesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (store, _) = args.source.open_store()?;
    let schedules = store.schedules();

    let value = match args.kind {
        ScheduleKind::Depreciation => serde_json::to_value(&schedules.depreciation)?,
        ScheduleKind::Accrual => serde_json::to_value(&schedules.accruals)?,
        ScheduleKind::All => serde_json::to_value(schedules)?,
    };
    Ok(value)
}

pub fn run_config(args: ConfigArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = crate::input::config::load_config(args.config.as_deref())?;
    if let Some(year) = args.end_year {
        config = config.with_end_year(year);
    }
    config.validate()?;
    Ok(serde_json::to_value(config)?)
}
