//! Expense accrual schedule.
//!
//! Recurring operating payments (wages, utilities, taxes) are paid in
//! arrears: the expense belongs to the month before the cash leaves.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::records::{Payment, PaymentType};
use crate::types::Money;
use crate::LedgerResult;

/// One accrued expense and the date it is settled in cash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualScheduleEntry {
    /// Id of the payment that settles the accrual
    pub id: i64,
    /// Expense account, named after the payment type
    pub account: PaymentType,
    pub amount: Money,
    /// First day of the month before `cash_payment_date`
    pub accrual_date: NaiveDate,
    pub cash_payment_date: NaiveDate,
}

/// First day of the month preceding `cash_payment_date`.
pub fn accrual_date_for(cash_payment_date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(cash_payment_date.year(), cash_payment_date.month(), 1)?
        .checked_sub_months(Months::new(1))
}

/// Accrue one payment. Eligibility (type and year) is decided by the caller.
pub fn accrue(payment: &Payment) -> LedgerResult<AccrualScheduleEntry> {
    if payment.amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput {
            field: "amount".into(),
            reason: format!("accrued amount must be positive, got {}", payment.amount),
        });
    }
    let accrual_date = accrual_date_for(payment.payment_date).ok_or_else(|| {
        LedgerError::InvalidInput {
            field: "payment_date".into(),
            reason: format!("no month precedes {}", payment.payment_date),
        }
    })?;

    Ok(AccrualScheduleEntry {
        id: payment.id,
        account: payment.payment_type.clone(),
        amount: payment.amount,
        accrual_date,
        cash_payment_date: payment.payment_date,
    })
}
