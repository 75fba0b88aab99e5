use chrono::NaiveDate;
use ledger_accrual_core::audit::{audit_all, audit_cash, audit_revenue, AuditStatus, CashComponents};
use ledger_accrual_core::records::{
    Loan, Payment, PaymentMethod, PaymentType, Purchase, RawRecords, Sale,
};
use ledger_accrual_core::statement::StatementTable;
use ledger_accrual_core::{run_pipeline, PipelineConfig};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOLERANCE: Decimal = dec!(0.01);

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Three years of trading with lagged credit sales and purchases, accrued
/// expenses, equipment, a loan and a partial repayment.
fn trading_history() -> RawRecords {
    RawRecords {
        sales: vec![
            Sale {
                product_name: "Kettle".into(),
                sale_at: date(2021, 4, 2),
                payment_at: Some(date(2021, 4, 2)),
                quantity: dec!(12),
                price: dec!(24.99),
                payment_method: PaymentMethod::Cash,
            },
            Sale {
                product_name: "Kettle".into(),
                sale_at: date(2021, 12, 18),
                payment_at: Some(date(2022, 1, 15)),
                quantity: dec!(6),
                price: dec!(26.50),
                payment_method: PaymentMethod::Credit,
            },
            Sale {
                product_name: "Toaster".into(),
                sale_at: date(2022, 8, 9),
                payment_at: None,
                quantity: dec!(3),
                price: dec!(41.25),
                payment_method: PaymentMethod::Cash,
            },
        ],
        purchases: vec![
            Purchase {
                product_name: "Kettle".into(),
                purchase_at: date(2021, 2, 1),
                quantity: dec!(30),
                amount: dec!(11.20),
                payment_method: PaymentMethod::Cash,
            },
            Purchase {
                product_name: "Toaster".into(),
                purchase_at: date(2021, 12, 5),
                quantity: dec!(10),
                amount: dec!(19.80),
                payment_method: PaymentMethod::Credit,
            },
        ],
        payments: vec![
            Payment {
                id: 1,
                payment_type: PaymentType::Equipment,
                payment_date: date(2021, 3, 1),
                amount: dec!(1200),
            },
            Payment {
                id: 2,
                payment_type: PaymentType::Wage,
                payment_date: date(2021, 7, 1),
                amount: dec!(310.40),
            },
            Payment {
                id: 3,
                payment_type: PaymentType::Utility,
                payment_date: date(2022, 1, 4),
                amount: dec!(58.13),
            },
            Payment {
                id: 4,
                payment_type: PaymentType::Rent,
                payment_date: date(2022, 5, 1),
                amount: dec!(400),
            },
            Payment {
                id: 5,
                payment_type: PaymentType::Loan,
                payment_date: date(2023, 6, 30),
                amount: dec!(250),
            },
        ],
        loans: vec![Loan {
            loan_at: date(2021, 1, 20),
            value: dec!(2000),
        }],
    }
}

#[test]
fn test_every_year_reconciles() {
    let records = trading_history();
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();
    let report = audit_all(&records, &out.statements, TOLERANCE);

    assert_eq!(report.revenue.len(), out.statements.len());
    assert_eq!(report.cash.len(), out.statements.len());
    assert!(report.all_match(), "{report:#?}");
    assert_eq!(report.discrepancies(), 0);
}

#[test]
fn test_revenue_audit_figures() {
    let records = trading_history();
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();
    let audit = audit_revenue(&records, &out.statements, 2021, TOLERANCE);

    // 12 × 24.99 + 6 × 26.50
    assert_eq!(audit.raw_revenue, dec!(458.88));
    assert_eq!(audit.reported_revenue, dec!(458.88));
    assert_eq!(audit.status, AuditStatus::Match);
}

#[test]
fn test_cash_audit_separates_period_from_cumulative() {
    let records = trading_history();
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();
    let audit = audit_cash(&records, &out.statements, 2022, TOLERANCE);

    // December 2021 credit sale and purchase settle in 2022
    assert_eq!(
        audit.period,
        CashComponents {
            sales_cash_in: dec!(282.75),
            loan_in: dec!(0),
            purchase_out: dec!(198.00),
            expense_out: dec!(458.13),
        }
    );
    assert_eq!(audit.cumulative.loan_in, dec!(2000));
    assert_eq!(audit.calculated_cash, audit.cumulative.net());
    assert_eq!(audit.status, AuditStatus::Match);
}

#[test]
fn test_tampered_statement_reports_discrepancy() {
    let records = trading_history();
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();

    let tampered: StatementTable = out
        .statements
        .rows()
        .map(|row| {
            let mut row = *row;
            if row.year == 2022 {
                row.cash += dec!(5);
            }
            row
        })
        .collect();

    let audit = audit_cash(&records, &tampered, 2022, TOLERANCE);
    assert_eq!(
        audit.status,
        AuditStatus::Discrepancy {
            difference: dec!(-5)
        }
    );
    assert!(audit_cash(&records, &tampered, 2021, TOLERANCE).status.is_match());
}

#[test]
fn test_difference_below_tolerance_passes() {
    let records = trading_history();
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();

    let nudged: StatementTable = out
        .statements
        .rows()
        .map(|row| {
            let mut row = *row;
            row.revenue += dec!(0.009);
            row
        })
        .collect();

    assert!(audit_revenue(&records, &nudged, 2021, TOLERANCE).status.is_match());
    assert!(!audit_revenue(&records, &nudged, 2021, dec!(0.005)).status.is_match());
}

#[test]
fn test_unknown_payment_type_counts_as_cash_out_in_audit_only() {
    let records = RawRecords {
        payments: vec![Payment {
            id: 9,
            payment_type: PaymentType::Other("bonus".into()),
            payment_date: date(2021, 9, 1),
            amount: dec!(80),
        }],
        loans: vec![Loan {
            loan_at: date(2021, 1, 1),
            value: dec!(100),
        }],
        ..RawRecords::default()
    };
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();
    assert_eq!(out.report.skipped.len(), 1);

    let audit = audit_cash(&records, &out.statements, 2021, TOLERANCE);
    assert_eq!(audit.reported_cash, dec!(100.00));
    assert_eq!(audit.calculated_cash, dec!(20));
    assert_eq!(
        audit.status,
        AuditStatus::Discrepancy {
            difference: dec!(-80)
        }
    );
}

#[test]
fn test_year_without_statement_compares_against_zero() {
    let records = trading_history();
    let out = run_pipeline(&records, &PipelineConfig::default()).unwrap();

    let revenue = audit_revenue(&records, &out.statements, 2019, TOLERANCE);
    let cash = audit_cash(&records, &out.statements, 2019, TOLERANCE);
    assert_eq!(revenue.reported_revenue, dec!(0));
    assert!(revenue.status.is_match());
    assert_eq!(cash.calculated_cash, dec!(0));
    assert!(cash.status.is_match());
}
