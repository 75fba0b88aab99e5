//! Straight-line depreciation with the half-year convention.
//!
//! An asset placed in service in year `s` with a useful life of `n` years is
//! charged half a year in `s`, a full year in each of `s+1 ..= s+n-1`, and
//! the remaining half in `s+n`. The last entry takes whatever is left of the
//! depreciable base so the window always sums to it exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{DepreciationPolicy, MAX_USEFUL_LIFE_YEARS};
use crate::error::LedgerError;
use crate::types::{FiscalYear, Money};
use crate::LedgerResult;

/// One asset's charge for one year of its depreciation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationScheduleEntry {
    /// Id of the equipment payment that bought the asset
    pub asset_id: i64,
    pub year: FiscalYear,
    /// Historical cost, repeated on every row of the window
    pub gross_value: Money,
    pub annual_depreciation_expense: Money,
}

/// Build the full window for one asset.
pub fn depreciation_window(
    asset_id: i64,
    start_year: FiscalYear,
    cost: Money,
    policy: &DepreciationPolicy,
) -> LedgerResult<Vec<DepreciationScheduleEntry>> {
    if cost <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput {
            field: "amount".into(),
            reason: format!("equipment cost must be positive, got {cost}"),
        });
    }
    if policy.salvage_value > cost {
        return Err(LedgerError::InvalidInput {
            field: "amount".into(),
            reason: format!(
                "salvage value {} exceeds equipment cost {cost}",
                policy.salvage_value
            ),
        });
    }

    let life = policy.useful_life_years;
    if life == 0 || life > MAX_USEFUL_LIFE_YEARS {
        return Err(LedgerError::InvalidInput {
            field: "useful_life_years".into(),
            reason: format!("must be between 1 and {MAX_USEFUL_LIFE_YEARS}, got {life}"),
        });
    }
    let end_year = FiscalYear::try_from(life)
        .ok()
        .and_then(|l| start_year.checked_add(l))
        .ok_or_else(|| LedgerError::InvalidInput {
            field: "payment_date".into(),
            reason: format!("window from {start_year} runs past the last representable year"),
        })?;
    let depreciable = cost
        .checked_sub(policy.salvage_value)
        .ok_or_else(|| LedgerError::InvalidInput {
            field: "amount".into(),
            reason: format!("cost {cost} less salvage {} overflows", policy.salvage_value),
        })?;
    let full_charge = depreciable / Decimal::from(life);
    let half_charge = full_charge * dec!(0.5);

    let mut entries = Vec::with_capacity(life as usize + 1);
    let mut charged = Decimal::ZERO;
    for year in start_year..=end_year {
        let charge = if year == start_year {
            half_charge
        } else if year == end_year {
            depreciable - charged
        } else {
            full_charge
        };
        charged += charge;
        entries.push(DepreciationScheduleEntry {
            asset_id,
            year,
            gross_value: cost,
            annual_depreciation_expense: charge,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_year() -> DepreciationPolicy {
        DepreciationPolicy::default()
    }

    #[test]
    fn test_half_year_convention_ten_year_life() {
        let window = depreciation_window(1, 2021, dec!(1000), &ten_year()).unwrap();
        assert_eq!(window.len(), 11);
        assert_eq!(window[0].year, 2021);
        assert_eq!(window[0].annual_depreciation_expense, dec!(50));
        for entry in &window[1..10] {
            assert_eq!(entry.annual_depreciation_expense, dec!(100));
        }
        assert_eq!(window[10].year, 2031);
        assert_eq!(window[10].annual_depreciation_expense, dec!(50));
        assert!(window.iter().all(|e| e.gross_value == dec!(1000)));
    }

    #[test]
    fn test_window_sums_to_cost_exactly() {
        for cost in [dec!(1000), dec!(31_000), dec!(12_345.67), dec!(0.03)] {
            let window = depreciation_window(9, 2020, cost, &ten_year()).unwrap();
            let total: Decimal = window.iter().map(|e| e.annual_depreciation_expense).sum();
            assert_eq!(total, cost, "window for cost {cost} sums to {total}");
        }
    }

    #[test]
    fn test_uneven_life_remainder_lands_in_final_year() {
        let policy = DepreciationPolicy {
            useful_life_years: 3,
            salvage_value: Decimal::ZERO,
        };
        let window = depreciation_window(2, 2022, dec!(1000), &policy).unwrap();
        assert_eq!(window.len(), 4);
        let total: Decimal = window.iter().map(|e| e.annual_depreciation_expense).sum();
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn test_salvage_reduces_depreciable_base() {
        let policy = DepreciationPolicy {
            useful_life_years: 10,
            salvage_value: dec!(200),
        };
        let window = depreciation_window(3, 2021, dec!(1200), &policy).unwrap();
        assert_eq!(window[0].annual_depreciation_expense, dec!(50));
        assert_eq!(window[1].annual_depreciation_expense, dec!(100));
        let total: Decimal = window.iter().map(|e| e.annual_depreciation_expense).sum();
        assert_eq!(total, dec!(1000));
        assert_eq!(window[0].gross_value, dec!(1200));
    }

    #[test]
    fn test_rejects_unbounded_life_and_year_overflow() {
        let policy = DepreciationPolicy {
            useful_life_years: 4_000_000_000,
            salvage_value: Decimal::ZERO,
        };
        assert!(depreciation_window(1, 2021, dec!(1000), &policy).is_err());
        assert!(depreciation_window(1, FiscalYear::MAX - 3, dec!(1000), &ten_year()).is_err());
    }

    #[test]
    fn test_rejects_non_positive_cost_and_excess_salvage() {
        assert!(depreciation_window(1, 2021, dec!(0), &ten_year()).is_err());
        let policy = DepreciationPolicy {
            useful_life_years: 10,
            salvage_value: dec!(5000),
        };
        assert!(depreciation_window(1, 2021, dec!(1000), &policy).is_err());
    }
}
