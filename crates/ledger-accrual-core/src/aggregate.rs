//! Per-account annual movements and running balances.
//!
//! Postings are grouped by (account, year) and summed into an annual
//! movement; the running balance is a prefix sum of those movements over
//! ascending years, folded per account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, info_span};

use crate::error::LedgerError;
use crate::ledger::{Account, Posting};
use crate::pipeline::Stage;
use crate::types::{FiscalYear, Money};
use crate::LedgerResult;

/// Movement and balance of one account in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountYearAggregate {
    pub account: Account,
    pub year: FiscalYear,
    /// Sum of that year's postings
    pub annual_movement: Money,
    /// Sum of movements of every year up to and including this one
    pub running_balance: Money,
}

/// Aggregates for every account, each sorted by ascending year. Only years
/// with at least one posting are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTable {
    accounts: BTreeMap<Account, Vec<AccountYearAggregate>>,
}

/// Group and fold postings. Decimal overflow is the only failure.
pub fn aggregate(postings: &[Posting]) -> LedgerResult<AggregateTable> {
    let _span = info_span!("aggregate").entered();

    let mut movements: BTreeMap<(Account, FiscalYear), Money> = BTreeMap::new();
    for p in postings {
        let slot = movements.entry((p.account, p.year)).or_insert(Decimal::ZERO);
        *slot = slot.checked_add(p.amount).ok_or_else(|| {
            LedgerError::stage(
                Stage::Aggregate,
                format!("movement of {} in {} overflows", p.account, p.year),
            )
        })?;
    }

    // BTreeMap order is (account, year) ascending, so one pass folds each
    // account's prefix sum in year order.
    let mut accounts: BTreeMap<Account, Vec<AccountYearAggregate>> = BTreeMap::new();
    for ((account, year), annual_movement) in movements {
        let rows = accounts.entry(account).or_default();
        let prior = rows.last().map_or(Decimal::ZERO, |r| r.running_balance);
        let running_balance = prior.checked_add(annual_movement).ok_or_else(|| {
            LedgerError::stage(
                Stage::Aggregate,
                format!("running balance of {account} in {year} overflows"),
            )
        })?;
        rows.push(AccountYearAggregate {
            account,
            year,
            annual_movement,
            running_balance,
        });
    }

    let table = AggregateTable { accounts };
    info!(aggregates = table.len(), accounts = table.accounts.len(), "postings aggregated");
    Ok(table)
}

impl AggregateTable {
    /// Number of (account, year) aggregates.
    pub fn len(&self) -> usize {
        self.accounts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Every aggregate, by account then year.
    pub fn rows(&self) -> impl Iterator<Item = &AccountYearAggregate> {
        self.accounts.values().flatten()
    }

    pub fn account(&self, account: Account) -> &[AccountYearAggregate] {
        self.accounts.get(&account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Years in which any account has a posting.
    pub fn years(&self) -> BTreeSet<FiscalYear> {
        self.rows().map(|r| r.year).collect()
    }

    /// Annual movement; zero when the account has no posting that year.
    pub fn movement(&self, account: Account, year: FiscalYear) -> Money {
        let rows = self.account(account);
        rows.binary_search_by_key(&year, |r| r.year)
            .map_or(Decimal::ZERO, |i| rows[i].annual_movement)
    }

    /// Running balance at `year` or, failing that, at the latest earlier
    /// year with a posting. Zero before the first posting.
    pub fn balance_as_of(&self, account: Account, year: FiscalYear) -> Money {
        let rows = self.account(account);
        let upto = rows.partition_point(|r| r.year <= year);
        if upto == 0 {
            Decimal::ZERO
        } else {
            rows[upto - 1].running_balance
        }
    }

    /// Gap-free view of one account over `from..=to`, carrying the balance
    /// forward through years with no movement.
    pub fn continuous(
        &self,
        account: Account,
        from: FiscalYear,
        to: FiscalYear,
    ) -> Vec<AccountYearAggregate> {
        (from..=to)
            .map(|year| AccountYearAggregate {
                account,
                year,
                annual_movement: self.movement(account, year),
                running_balance: self.balance_as_of(account, year),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(year: FiscalYear, account: Account, amount: Money) -> Posting {
        Posting::new(year, account, amount)
    }

    fn sample() -> Vec<Posting> {
        vec![
            p(2022, Account::Cash, dec!(-200)),
            p(2021, Account::Cash, dec!(1000)),
            p(2021, Account::Cash, dec!(500)),
            p(2024, Account::Cash, dec!(50)),
            p(2021, Account::LoanPrincipal, dec!(500)),
            p(2023, Account::LoanPrincipal, dec!(300)),
        ]
    }

    #[test]
    fn test_movements_are_summed_per_year() {
        let table = aggregate(&sample()).unwrap();
        assert_eq!(table.movement(Account::Cash, 2021), dec!(1500));
        assert_eq!(table.movement(Account::Cash, 2022), dec!(-200));
        assert_eq!(table.movement(Account::Cash, 2023), dec!(0));
        assert_eq!(table.movement(Account::Revenue, 2021), dec!(0));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_prefix_sum_law() {
        let table = aggregate(&sample()).unwrap();
        for account in [Account::Cash, Account::LoanPrincipal] {
            let mut cumulative = Decimal::ZERO;
            for row in table.account(account) {
                cumulative += row.annual_movement;
                assert_eq!(row.running_balance, cumulative);
            }
        }
    }

    #[test]
    fn test_balance_carries_forward_through_gaps() {
        let table = aggregate(&sample()).unwrap();
        assert_eq!(table.balance_as_of(Account::Cash, 2020), dec!(0));
        assert_eq!(table.balance_as_of(Account::Cash, 2022), dec!(1300));
        assert_eq!(table.balance_as_of(Account::Cash, 2023), dec!(1300));
        assert_eq!(table.balance_as_of(Account::Cash, 2030), dec!(1350));
    }

    #[test]
    fn test_additive_account_is_non_decreasing() {
        let table = aggregate(&sample()).unwrap();
        let balances: Vec<Money> = table
            .continuous(Account::LoanPrincipal, 2021, 2024)
            .iter()
            .map(|r| r.running_balance)
            .collect();
        assert_eq!(balances, vec![dec!(500), dec!(500), dec!(800), dec!(800)]);
        assert!(balances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_years_lists_any_account() {
        let table = aggregate(&sample()).unwrap();
        assert_eq!(
            table.years().into_iter().collect::<Vec<_>>(),
            vec![2021, 2022, 2023, 2024]
        );
        assert!(aggregate(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_overflow_is_a_stage_failure() {
        let postings = vec![
            p(2021, Account::Cash, Decimal::MAX),
            p(2021, Account::Cash, Decimal::MAX),
        ];
        match aggregate(&postings) {
            Err(LedgerError::Stage { stage, .. }) => assert_eq!(stage, Stage::Aggregate),
            other => panic!("Expected Stage error, got {other:?}"),
        }
    }
}
