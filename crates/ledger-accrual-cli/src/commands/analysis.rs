use clap::Args;
use serde_json::{json, Value};

use ledger_accrual_core::audit::{self, AuditReport};
use ledger_accrual_core::flux;
use ledger_accrual_core::FiscalYear;

use super::SourceArgs;

/// Arguments for reconciliation audits
#[derive(Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Audit a single year (defaults to every statement year)
    #[arg(long)]
    pub year: Option<FiscalYear>,
}

/// Arguments for year-over-year flux analysis
#[derive(Args)]
pub struct FluxArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Base year
    #[arg(long)]
    pub base: FiscalYear,

    /// Year compared against the base
    #[arg(long)]
    pub compare: FiscalYear,
}

pub fn run_audit(args: AuditArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (store, config) = args.source.open_store()?;
    let records = store.records();
    let statements = store.statements();
    let tolerance = config.reconciliation_tolerance;

    let report = match args.year {
        Some(year) => AuditReport {
            revenue: vec![audit::audit_revenue(records, statements, year, tolerance)],
            cash: vec![audit::audit_cash(records, statements, year, tolerance)],
        },
        None => audit::audit_all(records, statements, tolerance),
    };

    Ok(json!({
        "all_match": report.all_match(),
        "discrepancies": report.discrepancies(),
        "revenue": serde_json::to_value(&report.revenue)?,
        "cash": serde_json::to_value(&report.cash)?,
    }))
}

pub fn run_flux(args: FluxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (store, _) = args.source.open_store()?;
    let analysis = flux::flux(store.statements(), args.base, args.compare)?;
    Ok(serde_json::to_value(analysis)?)
}
