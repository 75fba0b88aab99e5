//! Statement projector.
//!
//! Pivots the aggregate table into one row per fiscal year. Income
//! statement fields read annual movements; balance sheet fields read running
//! balances as of the year. `gross_ppe` is the exception: every in-service
//! asset contributes its full cost to PPE_Snapshot in each year of its
//! window, so the movement already is the year's gross book value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, info_span};

use crate::aggregate::AggregateTable;
use crate::error::LedgerError;
use crate::ledger::Account;
use crate::pipeline::Stage;
use crate::types::{round_money, FiscalYear, Money};
use crate::LedgerResult;

/// Published figures for one fiscal year, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyStatement {
    pub year: FiscalYear,
    pub revenue: Money,
    pub net_income: Money,
    pub cash: Money,
    pub accounts_receivable: Money,
    pub accounts_payable: Money,
    pub debt_remaining: Money,
    pub inventory: Money,
    pub gross_ppe: Money,
    pub net_ppe: Money,
}

impl YearlyStatement {
    /// Revenue not carried through to net income.
    pub fn total_expenses(&self) -> Money {
        self.revenue.saturating_sub(self.net_income)
    }

    pub fn value(&self, field: StatementField) -> Money {
        match field {
            StatementField::Revenue => self.revenue,
            StatementField::NetIncome => self.net_income,
            StatementField::TotalExpenses => self.total_expenses(),
            StatementField::Cash => self.cash,
            StatementField::AccountsReceivable => self.accounts_receivable,
            StatementField::AccountsPayable => self.accounts_payable,
            StatementField::DebtRemaining => self.debt_remaining,
            StatementField::Inventory => self.inventory,
            StatementField::GrossPpe => self.gross_ppe,
            StatementField::NetPpe => self.net_ppe,
        }
    }
}

/// Named figure of a statement row, including derived total expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementField {
    Revenue,
    NetIncome,
    TotalExpenses,
    Cash,
    AccountsReceivable,
    AccountsPayable,
    DebtRemaining,
    Inventory,
    GrossPpe,
    NetPpe,
}

impl StatementField {
    pub const ALL: [StatementField; 10] = [
        StatementField::Revenue,
        StatementField::NetIncome,
        StatementField::TotalExpenses,
        StatementField::Cash,
        StatementField::AccountsReceivable,
        StatementField::AccountsPayable,
        StatementField::DebtRemaining,
        StatementField::Inventory,
        StatementField::GrossPpe,
        StatementField::NetPpe,
    ];
}

/// Statement rows keyed by year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementTable {
    rows: BTreeMap<FiscalYear, YearlyStatement>,
}

/// Whether an account's annual movement is part of net income.
fn in_net_income(account: Account) -> bool {
    match account {
        Account::Revenue
        | Account::Cogs
        | Account::DeprExp
        | Account::Wage
        | Account::Utility
        | Account::Tax
        | Account::Interest
        | Account::Rent => true,
        Account::Cash
        | Account::PpeSnapshot
        | Account::AccountsReceivable
        | Account::Inventory
        | Account::LoanPrincipal
        | Account::AccountsPayable => false,
    }
}

/// Project one year. Absent account-years read as zero.
pub fn project_year(table: &AggregateTable, year: FiscalYear) -> LedgerResult<YearlyStatement> {
    let net_income = Account::ALL
        .into_iter()
        .filter(|a| in_net_income(*a))
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(table.movement(a, year)))
        .ok_or_else(|| {
            LedgerError::stage(Stage::Project, format!("net income overflows in {year}"))
        })?;
    let gross_ppe = table.movement(Account::PpeSnapshot, year);
    let net_ppe = gross_ppe
        .checked_add(table.balance_as_of(Account::DeprExp, year))
        .ok_or_else(|| LedgerError::stage(Stage::Project, format!("net PPE overflows in {year}")))?
        .max(Decimal::ZERO);

    Ok(YearlyStatement {
        year,
        revenue: round_money(table.movement(Account::Revenue, year)),
        net_income: round_money(net_income),
        cash: round_money(table.balance_as_of(Account::Cash, year)),
        accounts_receivable: round_money(table.balance_as_of(Account::AccountsReceivable, year)),
        accounts_payable: round_money(table.balance_as_of(Account::AccountsPayable, year)),
        debt_remaining: round_money(table.balance_as_of(Account::LoanPrincipal, year)),
        inventory: round_money(table.balance_as_of(Account::Inventory, year)),
        gross_ppe: round_money(gross_ppe),
        net_ppe: round_money(net_ppe),
    })
}

/// Project every year with postings, up to and including `end_year`.
pub fn project(table: &AggregateTable, end_year: FiscalYear) -> LedgerResult<StatementTable> {
    let _span = info_span!("project", end_year).entered();
    let rows = table
        .years()
        .into_iter()
        .take_while(|y| *y <= end_year)
        .map(|y| project_year(table, y).map(|row| (y, row)))
        .collect::<LedgerResult<BTreeMap<FiscalYear, YearlyStatement>>>()?;
    info!(statement_rows = rows.len(), "statements projected");
    Ok(StatementTable { rows })
}

impl StatementTable {
    pub fn get(&self, year: FiscalYear) -> Option<&YearlyStatement> {
        self.rows.get(&year)
    }

    /// Rows with `from <= year <= to`, ascending.
    pub fn range(&self, from: FiscalYear, to: FiscalYear) -> Vec<YearlyStatement> {
        if from > to {
            return Vec::new();
        }
        self.rows.range(from..=to).map(|(_, r)| *r).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &YearlyStatement> {
        self.rows.values()
    }

    pub fn to_vec(&self) -> Vec<YearlyStatement> {
        self.rows.values().copied().collect()
    }

    pub fn first_year(&self) -> Option<FiscalYear> {
        self.rows.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<FiscalYear> {
        self.rows.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<YearlyStatement> for StatementTable {
    fn from_iter<I: IntoIterator<Item = YearlyStatement>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().map(|r| (r.year, r)).collect(),
        }
    }
}
