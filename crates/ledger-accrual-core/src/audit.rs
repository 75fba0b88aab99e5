//! Reconciliation audits.
//!
//! Each audit recomputes a published figure straight from the raw records,
//! without going through schedules, postings or aggregates, and compares it
//! with the statement row. A difference at or above the tolerance is
//! reported as a discrepancy and logged; it is never an error.
//!
//! Cash is a balance, so the cash audit accumulates every movement up to
//! and including the audited year. The per-year components are reported
//! alongside for review.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::records::{PaymentMethod, RawRecords};
use crate::statement::StatementTable;
use crate::types::{fiscal_year, lagged_fiscal_year, FiscalYear, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Match,
    /// `difference` is calculated minus reported
    Discrepancy { difference: Money },
}

impl AuditStatus {
    fn compare(calculated: Money, reported: Money, tolerance: Money) -> Self {
        let difference = calculated.saturating_sub(reported);
        if difference.abs() < tolerance {
            AuditStatus::Match
        } else {
            AuditStatus::Discrepancy { difference }
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, AuditStatus::Match)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueAudit {
    pub year: FiscalYear,
    /// Σ quantity × price over the year's sales
    pub raw_revenue: Money,
    pub reported_revenue: Money,
    pub status: AuditStatus,
}

/// Cash movements recomputed from raw records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashComponents {
    pub sales_cash_in: Money,
    pub loan_in: Money,
    pub purchase_out: Money,
    pub expense_out: Money,
}

impl CashComponents {
    pub fn net(&self) -> Money {
        self.sales_cash_in
            .saturating_add(self.loan_in)
            .saturating_sub(self.purchase_out)
            .saturating_sub(self.expense_out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAudit {
    pub year: FiscalYear,
    /// Movements dated in the audited year only
    pub period: CashComponents,
    /// Movements through the end of the audited year
    pub cumulative: CashComponents,
    pub calculated_cash: Money,
    pub reported_cash: Money,
    pub status: AuditStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub revenue: Vec<RevenueAudit>,
    pub cash: Vec<CashAudit>,
}

impl AuditReport {
    pub fn all_match(&self) -> bool {
        self.revenue.iter().all(|a| a.status.is_match())
            && self.cash.iter().all(|a| a.status.is_match())
    }

    pub fn discrepancies(&self) -> usize {
        self.revenue.iter().filter(|a| !a.status.is_match()).count()
            + self.cash.iter().filter(|a| !a.status.is_match()).count()
    }
}

// ---------------------------------------------------------------------------
// Audits
// ---------------------------------------------------------------------------

/// Records whose amount is not representable were skipped by the
/// normalizer and are left out here too; sums saturate instead of panicking.
fn total(amounts: impl Iterator<Item = Money>) -> Money {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

fn settles_in(method: PaymentMethod, date: chrono::NaiveDate) -> FiscalYear {
    if method == PaymentMethod::Cash {
        fiscal_year(date)
    } else {
        lagged_fiscal_year(date)
    }
}

/// Cash components for every year accepted by `in_scope`.
fn cash_components(records: &RawRecords, in_scope: impl Fn(FiscalYear) -> bool) -> CashComponents {
    let sales_cash_in = total(
        records
            .sales
            .iter()
            .filter(|s| in_scope(settles_in(s.payment_method, s.sale_at)))
            .filter_map(|s| s.gross_amount().ok()),
    );
    let loan_in = total(
        records
            .loans
            .iter()
            .filter(|l| in_scope(fiscal_year(l.loan_at)))
            .map(|l| l.value),
    );
    let purchase_out = total(
        records
            .purchases
            .iter()
            .filter(|p| in_scope(settles_in(p.payment_method, p.purchase_at)))
            .filter_map(|p| p.total_cost().ok()),
    );
    let expense_out = total(
        records
            .payments
            .iter()
            .filter(|p| in_scope(fiscal_year(p.payment_date)))
            .map(|p| p.amount),
    );
    CashComponents {
        sales_cash_in,
        loan_in,
        purchase_out,
        expense_out,
    }
}

pub fn audit_revenue(
    records: &RawRecords,
    statements: &StatementTable,
    year: FiscalYear,
    tolerance: Money,
) -> RevenueAudit {
    let raw_revenue = total(
        records
            .sales
            .iter()
            .filter(|s| fiscal_year(s.sale_at) == year)
            .filter_map(|s| s.gross_amount().ok()),
    );
    let reported_revenue = statements.get(year).map_or(Decimal::ZERO, |r| r.revenue);
    let status = AuditStatus::compare(raw_revenue, reported_revenue, tolerance);

    match status {
        AuditStatus::Match => info!(year, %raw_revenue, "revenue reconciles"),
        AuditStatus::Discrepancy { difference } => warn!(
            year,
            %raw_revenue,
            %reported_revenue,
            %difference,
            "revenue discrepancy"
        ),
    }

    RevenueAudit {
        year,
        raw_revenue,
        reported_revenue,
        status,
    }
}

pub fn audit_cash(
    records: &RawRecords,
    statements: &StatementTable,
    year: FiscalYear,
    tolerance: Money,
) -> CashAudit {
    let period = cash_components(records, |y| y == year);
    let cumulative = cash_components(records, |y| y <= year);
    let calculated_cash = cumulative.net();
    let reported_cash = statements.get(year).map_or(Decimal::ZERO, |r| r.cash);
    let status = AuditStatus::compare(calculated_cash, reported_cash, tolerance);

    match status {
        AuditStatus::Match => info!(year, %calculated_cash, "cash reconciles"),
        AuditStatus::Discrepancy { difference } => warn!(
            year,
            %calculated_cash,
            %reported_cash,
            %difference,
            "cash discrepancy"
        ),
    }

    CashAudit {
        year,
        period,
        cumulative,
        calculated_cash,
        reported_cash,
        status,
    }
}

/// Audit revenue and cash for every year in the statement table.
pub fn audit_all(records: &RawRecords, statements: &StatementTable, tolerance: Money) -> AuditReport {
    let years: Vec<FiscalYear> = statements.rows().map(|r| r.year).collect();
    AuditReport {
        revenue: years
            .iter()
            .map(|y| audit_revenue(records, statements, *y, tolerance))
            .collect(),
        cash: years
            .iter()
            .map(|y| audit_cash(records, statements, *y, tolerance))
            .collect(),
    }
}
