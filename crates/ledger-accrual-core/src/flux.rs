//! Year-over-year flux analysis of two statement rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::statement::{StatementField, StatementTable, YearlyStatement};
use crate::types::{FiscalYear, Money};
use crate::LedgerResult;

/// Decimal places of percentage changes (0.1234 = 12.34%).
const PCT_DP: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxLine {
    pub field: StatementField,
    pub base: Money,
    pub compare: Money,
    pub delta: Money,
    /// `delta / |base|`; None when the base is zero or the ratio overflows
    pub pct_change: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxAnalysis {
    pub base_year: FiscalYear,
    pub compare_year: FiscalYear,
    pub lines: Vec<FluxLine>,
}

impl FluxAnalysis {
    pub fn line(&self, field: StatementField) -> Option<&FluxLine> {
        self.lines.iter().find(|l| l.field == field)
    }
}

fn flux_line(field: StatementField, base: &YearlyStatement, compare: &YearlyStatement) -> FluxLine {
    let b = base.value(field);
    let c = compare.value(field);
    let delta = c.saturating_sub(b);
    let pct_change = delta.checked_div(b.abs()).map(|p| p.round_dp(PCT_DP));
    FluxLine {
        field,
        base: b,
        compare: c,
        delta,
        pct_change,
    }
}

/// Compare every statement field between two years.
pub fn flux(
    statements: &StatementTable,
    base_year: FiscalYear,
    compare_year: FiscalYear,
) -> LedgerResult<FluxAnalysis> {
    let row = |year: FiscalYear, field: &str| {
        statements.get(year).ok_or_else(|| LedgerError::InvalidInput {
            field: field.into(),
            reason: format!("no statement row for {year}"),
        })
    };
    let base = row(base_year, "base_year")?;
    let compare = row(compare_year, "compare_year")?;

    Ok(FluxAnalysis {
        base_year,
        compare_year,
        lines: StatementField::ALL
            .into_iter()
            .map(|f| flux_line(f, base, compare))
            .collect(),
    })
}
