//! Ledger normalizer.
//!
//! Maps every raw and derived record onto zero or more postings. Each source
//! contributes through its own rule set; the rule sets write disjoint
//! postings and can run in any order.
//!
//! | Source            | Accounts                                         |
//! |-------------------|--------------------------------------------------|
//! | Sale              | Revenue, Cash (lagged on credit), AR (December credit), COGS, Inventory |
//! | Purchase          | Cash (lagged on credit), Inventory               |
//! | Loan              | Cash, Loan_Principal                             |
//! | Payment           | Cash, Loan_Principal (loan), interest/rent (opt-in) |
//! | Depreciation      | Depr_Exp, PPE_Snapshot                           |
//! | Accrual           | expense account, Accounts_Payable (in and out)   |

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::{info, info_span};

use super::account::Account;
use super::costing::UnitCostTable;
use super::posting::Posting;
use crate::config::PipelineConfig;
use crate::pipeline::Stage;
use crate::records::{Loan, Payment, PaymentMethod, PaymentType, Purchase, RawRecords, RecordSource, Sale};
use crate::report::{BatchReport, RecordOutcome};
use crate::schedule::{AccrualScheduleEntry, DepreciationScheduleEntry, Schedules};
use crate::types::{fiscal_year, lagged_fiscal_year, FiscalYear, Money};
use crate::{LedgerError, LedgerResult};

/// Normalize every source into postings. Records that cannot be posted are
/// skipped and reported.
pub fn normalize(
    records: &RawRecords,
    schedules: &Schedules,
    config: &PipelineConfig,
    report: &mut BatchReport,
) -> Vec<Posting> {
    let _span = info_span!("normalize").entered();
    let mut postings = Vec::new();

    // Purchases first: valid ones also price sales at cost.
    let mut valid_purchases = Vec::with_capacity(records.purchases.len());
    for (index, purchase) in records.purchases.iter().enumerate() {
        let outcome = match purchase.validate() {
            Ok(()) => match purchase_postings(purchase) {
                Ok(rows) => {
                    valid_purchases.push(purchase);
                    applied(&mut postings, rows)
                }
                Err(e) => skipped(e),
            },
            Err(e) => skipped(e),
        };
        report.record(Stage::Normalize, RecordSource::Purchase, index, outcome);
    }
    let costs = UnitCostTable::build(valid_purchases, config.costing_policy);

    for (index, sale) in records.sales.iter().enumerate() {
        let rows = match sale.validate().and_then(|()| sale_postings(sale)) {
            Ok(rows) => rows,
            Err(e) => {
                report.record(Stage::Normalize, RecordSource::Sale, index, skipped(e));
                continue;
            }
        };
        postings.extend(rows);
        let cost_rows = match costs.unit_cost(&sale.product_name) {
            Some(unit_cost) => cost_of_sale_postings(sale, unit_cost).map_err(|e| e.to_string()),
            None => Err(format!("no unit cost for '{}'", sale.product_name)),
        };
        match cost_rows {
            Ok(rows) => postings.extend(rows),
            Err(reason) => report.skip(
                Stage::Normalize,
                RecordSource::Sale,
                index,
                format!("cost of sale not posted: {reason}"),
            ),
        }
    }

    for (index, loan) in records.loans.iter().enumerate() {
        let outcome = match loan.validate() {
            Ok(()) => applied(&mut postings, loan_postings(loan)),
            Err(e) => skipped(e),
        };
        report.record(Stage::Normalize, RecordSource::Loan, index, outcome);
    }

    for (index, payment) in records.payments.iter().enumerate() {
        let outcome = match payment.validate() {
            Ok(()) => {
                let expense_now = config.recognize_period_costs && !config.accrues(payment);
                applied(&mut postings, payment_postings(payment, expense_now))
            }
            Err(e) => skipped(e),
        };
        report.record(Stage::Normalize, RecordSource::Payment, index, outcome);
    }

    for entry in &schedules.depreciation {
        postings.extend(depreciation_postings(entry));
    }

    for (index, entry) in schedules.accruals.iter().enumerate() {
        let outcome = match accrual_postings(entry) {
            Some(rows) => applied(&mut postings, rows),
            None => RecordOutcome::Skipped {
                reason: format!("'{}' has no expense account", entry.account),
            },
        };
        report.record(Stage::Normalize, RecordSource::AccrualSchedule, index, outcome);
    }

    report.postings = postings.len();
    info!(postings = postings.len(), "postings normalized");
    postings
}

fn applied(postings: &mut Vec<Posting>, rows: Vec<Posting>) -> RecordOutcome {
    let count = rows.len();
    postings.extend(rows);
    RecordOutcome::Applied { rows: count }
}

fn skipped(e: LedgerError) -> RecordOutcome {
    RecordOutcome::Skipped {
        reason: e.to_string(),
    }
}

/// Year cash moves for a sale or purchase settled with `method` on `date`.
fn settlement_year(method: PaymentMethod, date: chrono::NaiveDate) -> FiscalYear {
    match method {
        PaymentMethod::Cash => fiscal_year(date),
        PaymentMethod::Credit => lagged_fiscal_year(date),
    }
}

pub fn sale_postings(sale: &Sale) -> LedgerResult<Vec<Posting>> {
    let year = fiscal_year(sale.sale_at);
    let gross = sale.gross_amount()?;
    let mut rows = vec![
        Posting::new(year, Account::Revenue, gross),
        Posting::new(settlement_year(sale.payment_method, sale.sale_at), Account::Cash, gross),
    ];
    if sale.payment_method == PaymentMethod::Credit && sale.sale_at.month() == 12 {
        rows.push(Posting::new(year, Account::AccountsReceivable, gross));
    }
    Ok(rows)
}

pub fn cost_of_sale_postings(sale: &Sale, unit_cost: Money) -> LedgerResult<Vec<Posting>> {
    let year = fiscal_year(sale.sale_at);
    let cost = unit_cost
        .checked_mul(sale.quantity)
        .ok_or_else(|| LedgerError::InvalidInput {
            field: "quantity".into(),
            reason: format!("{} × unit cost {unit_cost} overflows", sale.quantity),
        })?;
    Ok(vec![
        Posting::new(year, Account::Cogs, -cost),
        Posting::new(year, Account::Inventory, -cost),
    ])
}

pub fn purchase_postings(purchase: &Purchase) -> LedgerResult<Vec<Posting>> {
    let total = purchase.total_cost()?;
    Ok(vec![
        Posting::new(
            settlement_year(purchase.payment_method, purchase.purchase_at),
            Account::Cash,
            -total,
        ),
        Posting::new(fiscal_year(purchase.purchase_at), Account::Inventory, total),
    ])
}

pub fn loan_postings(loan: &Loan) -> Vec<Posting> {
    let year = fiscal_year(loan.loan_at);
    vec![
        Posting::new(year, Account::Cash, loan.value),
        Posting::new(year, Account::LoanPrincipal, loan.value),
    ]
}

/// `expense_now` posts interest and rent to their expense account in the
/// payment year; the caller turns it off for payments the accrual schedule
/// already expenses.
pub fn payment_postings(payment: &Payment, expense_now: bool) -> Vec<Posting> {
    let year = fiscal_year(payment.payment_date);
    let mut rows = vec![Posting::new(year, Account::Cash, -payment.amount)];
    match payment.payment_type {
        PaymentType::Loan => rows.push(Posting::new(year, Account::LoanPrincipal, -payment.amount)),
        PaymentType::Interest | PaymentType::Rent if expense_now => {
            if let Some(account) = Account::for_expense(&payment.payment_type) {
                rows.push(Posting::new(year, account, -payment.amount));
            }
        }
        _ => {}
    }
    rows
}

pub fn depreciation_postings(entry: &DepreciationScheduleEntry) -> [Posting; 2] {
    [
        Posting::new(entry.year, Account::DeprExp, -entry.annual_depreciation_expense),
        Posting::new(entry.year, Account::PpeSnapshot, entry.gross_value),
    ]
}

pub fn accrual_postings(entry: &AccrualScheduleEntry) -> Option<Vec<Posting>> {
    let expense = Account::for_expense(&entry.account)?;
    let accrued = fiscal_year(entry.accrual_date);
    let paid = fiscal_year(entry.cash_payment_date);
    Some(vec![
        Posting::new(accrued, expense, -entry.amount),
        Posting::new(accrued, Account::AccountsPayable, entry.amount),
        Posting::new(paid, Account::AccountsPayable, -entry.amount),
    ])
}

/// Sum of postings for one account in one year; handy for assertions.
pub fn total_for(postings: &[Posting], account: Account, year: FiscalYear) -> Money {
    postings
        .iter()
        .filter(|p| p.account == account && p.year == year)
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::generate_schedules;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(name: &str, at: NaiveDate, qty: Decimal, price: Decimal, method: PaymentMethod) -> Sale {
        Sale {
            product_name: name.into(),
            sale_at: at,
            payment_at: None,
            quantity: qty,
            price,
            payment_method: method,
        }
    }

    fn purchase(name: &str, at: NaiveDate, qty: Decimal, unit: Decimal, method: PaymentMethod) -> Purchase {
        Purchase {
            product_name: name.into(),
            purchase_at: at,
            quantity: qty,
            amount: unit,
            payment_method: method,
        }
    }

    fn run(records: &RawRecords, config: &PipelineConfig) -> (Vec<Posting>, BatchReport) {
        let mut report = BatchReport::default();
        let schedules = generate_schedules(records, config, &mut report);
        let postings = normalize(records, &schedules, config, &mut report);
        (postings, report)
    }

    #[test]
    fn test_cash_sale_posts_revenue_and_cash_same_year() {
        let rows = sale_postings(&sale("w", date(2021, 12, 20), dec!(10), dec!(100), PaymentMethod::Cash)).unwrap();
        assert_eq!(total_for(&rows, Account::Revenue, 2021), dec!(1000));
        assert_eq!(total_for(&rows, Account::Cash, 2021), dec!(1000));
        assert_eq!(total_for(&rows, Account::AccountsReceivable, 2021), dec!(0));
    }

    #[test]
    fn test_december_credit_sale_lags_cash_and_books_receivable() {
        let rows = sale_postings(&sale("w", date(2021, 12, 5), dec!(2), dec!(50), PaymentMethod::Credit)).unwrap();
        assert_eq!(total_for(&rows, Account::Revenue, 2021), dec!(100));
        assert_eq!(total_for(&rows, Account::Cash, 2021), dec!(0));
        assert_eq!(total_for(&rows, Account::Cash, 2022), dec!(100));
        assert_eq!(total_for(&rows, Account::AccountsReceivable, 2021), dec!(100));
    }

    #[test]
    fn test_november_credit_sale_stays_in_year() {
        let rows = sale_postings(&sale("w", date(2021, 11, 30), dec!(1), dec!(70), PaymentMethod::Credit)).unwrap();
        assert_eq!(total_for(&rows, Account::Cash, 2021), dec!(70));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_credit_purchase_lags_cash_but_not_inventory() {
        let rows = purchase_postings(&purchase("w", date(2022, 12, 1), dec!(5), dec!(8), PaymentMethod::Credit)).unwrap();
        assert_eq!(total_for(&rows, Account::Cash, 2023), dec!(-40));
        assert_eq!(total_for(&rows, Account::Inventory, 2022), dec!(40));
    }

    #[test]
    fn test_loan_and_repayment() {
        let records = RawRecords {
            loans: vec![Loan {
                loan_at: date(2021, 2, 1),
                value: dec!(500),
            }],
            payments: vec![Payment {
                id: 1,
                payment_type: PaymentType::Loan,
                payment_date: date(2022, 2, 1),
                amount: dec!(100),
            }],
            ..Default::default()
        };
        let (postings, report) = run(&records, &PipelineConfig::default());
        assert!(report.is_clean());
        assert_eq!(total_for(&postings, Account::Cash, 2021), dec!(500));
        assert_eq!(total_for(&postings, Account::LoanPrincipal, 2021), dec!(500));
        assert_eq!(total_for(&postings, Account::Cash, 2022), dec!(-100));
        assert_eq!(total_for(&postings, Account::LoanPrincipal, 2022), dec!(-100));
    }

    #[test]
    fn test_cost_of_sale_uses_costing_policy() {
        let records = RawRecords {
            purchases: vec![
                purchase("w", date(2021, 1, 10), dec!(10), dec!(4), PaymentMethod::Cash),
                purchase("w", date(2021, 6, 10), dec!(30), dec!(6), PaymentMethod::Cash),
            ],
            sales: vec![sale("w", date(2021, 8, 1), dec!(4), dec!(20), PaymentMethod::Cash)],
            ..Default::default()
        };
        let (postings, _) = run(&records, &PipelineConfig::default());
        // weighted unit cost 5.5 * 4 units
        assert_eq!(total_for(&postings, Account::Cogs, 2021), dec!(-22));
        assert_eq!(total_for(&postings, Account::Inventory, 2021), dec!(220) - dec!(22));

        let config = PipelineConfig::default().with_costing_policy(crate::config::CostingPolicy::LastCost);
        let (postings, _) = run(&records, &config);
        assert_eq!(total_for(&postings, Account::Cogs, 2021), dec!(-24));
    }

    #[test]
    fn test_unmatched_sale_keeps_revenue_and_reports_cost_gap() {
        let records = RawRecords {
            sales: vec![sale("ghost", date(2021, 3, 1), dec!(1), dec!(10), PaymentMethod::Cash)],
            ..Default::default()
        };
        let (postings, report) = run(&records, &PipelineConfig::default());
        assert_eq!(total_for(&postings, Account::Revenue, 2021), dec!(10));
        assert_eq!(total_for(&postings, Account::Cogs, 2021), dec!(0));
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("ghost"));
    }

    #[test]
    fn test_accrual_postings_span_two_years() {
        let records = RawRecords {
            payments: vec![Payment {
                id: 9,
                payment_type: PaymentType::Wage,
                payment_date: date(2022, 1, 7),
                amount: dec!(300),
            }],
            ..Default::default()
        };
        let (postings, _) = run(&records, &PipelineConfig::default());
        assert_eq!(total_for(&postings, Account::Wage, 2021), dec!(-300));
        assert_eq!(total_for(&postings, Account::AccountsPayable, 2021), dec!(300));
        assert_eq!(total_for(&postings, Account::AccountsPayable, 2022), dec!(-300));
        assert_eq!(total_for(&postings, Account::Cash, 2022), dec!(-300));
    }

    #[test]
    fn test_period_costs_are_opt_in() {
        let rent = Payment {
            id: 3,
            payment_type: PaymentType::Rent,
            payment_date: date(2021, 5, 1),
            amount: dec!(900),
        };
        let literal = payment_postings(&rent, false);
        assert_eq!(total_for(&literal, Account::Rent, 2021), dec!(0));
        assert_eq!(total_for(&literal, Account::Cash, 2021), dec!(-900));

        let recognized = payment_postings(&rent, true);
        assert_eq!(total_for(&recognized, Account::Rent, 2021), dec!(-900));
        assert_eq!(total_for(&recognized, Account::Cash, 2021), dec!(-900));
    }

    #[test]
    fn test_accrued_period_cost_is_expensed_once() {
        let mut config = PipelineConfig::default().with_period_costs(true);
        config.accrual_payment_types.insert(PaymentType::Rent);
        let records = RawRecords {
            payments: vec![
                Payment {
                    id: 1,
                    payment_type: PaymentType::Rent,
                    payment_date: date(2021, 6, 1),
                    amount: dec!(900),
                },
                Payment {
                    id: 2,
                    payment_type: PaymentType::Interest,
                    payment_date: date(2021, 6, 1),
                    amount: dec!(40),
                },
                // outside the accrual years, so expensed when paid
                Payment {
                    id: 3,
                    payment_type: PaymentType::Rent,
                    payment_date: date(2020, 6, 1),
                    amount: dec!(800),
                },
            ],
            ..Default::default()
        };
        let (postings, report) = run(&records, &config);
        assert!(report.is_clean());
        assert_eq!(total_for(&postings, Account::Rent, 2021), dec!(-900));
        assert_eq!(total_for(&postings, Account::Interest, 2021), dec!(-40));
        assert_eq!(total_for(&postings, Account::Rent, 2020), dec!(-800));
        assert_eq!(total_for(&postings, Account::Cash, 2021), dec!(-940));
    }

    #[test]
    fn test_overflowing_sale_is_skipped_and_neighbour_posts() {
        let records = RawRecords {
            sales: vec![
                sale("w", date(2021, 3, 1), dec!(10), Decimal::MAX, PaymentMethod::Cash),
                sale("w", date(2021, 3, 2), dec!(1), dec!(5), PaymentMethod::Cash),
            ],
            purchases: vec![purchase("w", date(2021, 1, 1), dec!(4), dec!(2), PaymentMethod::Cash)],
            ..Default::default()
        };
        let (postings, report) = run(&records, &PipelineConfig::default());
        assert_eq!(total_for(&postings, Account::Revenue, 2021), dec!(5));
        assert_eq!(total_for(&postings, Account::Cogs, 2021), dec!(-2));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 0);
        assert_eq!(report.skipped[0].source, RecordSource::Sale);
    }

    #[test]
    fn test_unrepresentable_cost_of_sale_keeps_revenue() {
        let sale = sale("w", date(2021, 3, 1), Decimal::MAX, dec!(0), PaymentMethod::Cash);
        assert!(cost_of_sale_postings(&sale, dec!(3)).is_err());
        assert!(sale_postings(&sale).is_ok());
    }

    #[test]
    fn test_depreciation_postings() {
        let entry = DepreciationScheduleEntry {
            asset_id: 1,
            year: 2024,
            gross_value: dec!(1000),
            annual_depreciation_expense: dec!(100),
        };
        let rows = depreciation_postings(&entry);
        assert_eq!(total_for(&rows, Account::DeprExp, 2024), dec!(-100));
        assert_eq!(total_for(&rows, Account::PpeSnapshot, 2024), dec!(1000));
    }

    #[test]
    fn test_invalid_records_skipped_individually() {
        let records = RawRecords {
            sales: vec![
                sale("w", date(2021, 3, 1), dec!(-1), dec!(10), PaymentMethod::Cash),
                sale("w", date(2021, 3, 1), dec!(1), dec!(10), PaymentMethod::Cash),
            ],
            purchases: vec![purchase("w", date(2021, 1, 1), dec!(1), dec!(3), PaymentMethod::Cash)],
            payments: vec![Payment {
                id: 5,
                payment_type: PaymentType::Other("gift".into()),
                payment_date: date(2021, 5, 1),
                amount: dec!(10),
            }],
            ..Default::default()
        };
        let (postings, report) = run(&records, &PipelineConfig::default());
        assert_eq!(total_for(&postings, Account::Revenue, 2021), dec!(10));
        assert_eq!(total_for(&postings, Account::Cash, 2021), dec!(10) - dec!(3));
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].source, RecordSource::Sale);
        assert_eq!(report.skipped[1].source, RecordSource::Payment);
    }
}
