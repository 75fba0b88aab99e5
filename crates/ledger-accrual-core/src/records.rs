//! Raw cash-basis records.
//!
//! These are the source of truth for every derived table. The engine reads
//! them and never mutates them; validation happens per record so one bad row
//! can be skipped without rejecting its neighbours.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;
use crate::types::{Money, Quantity};
use crate::LedgerResult;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a sale or purchase was settled. Anything other than cash settles on
/// credit terms, one month after the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Cash,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(s: String) -> Self {
        PaymentMethod::from(s.as_str())
    }
}

impl From<&str> for PaymentMethod {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("cash") {
            PaymentMethod::Cash
        } else {
            PaymentMethod::Credit
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(m: PaymentMethod) -> Self {
        m.as_str().to_string()
    }
}

/// Category of an outgoing payment.
///
/// The seven named variants are the fixed set the ledger understands. A
/// category outside the set is kept as `Other` so a single foreign row does
/// not fail deserialization of a whole batch; the normalizer skips it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentType {
    Equipment,
    Interest,
    Wage,
    Utility,
    Tax,
    Loan,
    Rent,
    Other(String),
}

impl PaymentType {
    pub const FIXED: [PaymentType; 7] = [
        PaymentType::Equipment,
        PaymentType::Interest,
        PaymentType::Wage,
        PaymentType::Utility,
        PaymentType::Tax,
        PaymentType::Loan,
        PaymentType::Rent,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PaymentType::Equipment => "equipment",
            PaymentType::Interest => "interest",
            PaymentType::Wage => "wage",
            PaymentType::Utility => "utility",
            PaymentType::Tax => "tax",
            PaymentType::Loan => "loan",
            PaymentType::Rent => "rent",
            PaymentType::Other(s) => s.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PaymentType::Other(_))
    }
}

impl From<&str> for PaymentType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "equipment" => PaymentType::Equipment,
            "interest" => PaymentType::Interest,
            "wage" => PaymentType::Wage,
            "utility" => PaymentType::Utility,
            "tax" => PaymentType::Tax,
            "loan" => PaymentType::Loan,
            "rent" => PaymentType::Rent,
            _ => PaymentType::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for PaymentType {
    fn from(s: String) -> Self {
        PaymentType::from(s.as_str())
    }
}

impl From<PaymentType> for String {
    fn from(t: PaymentType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which collection a record came from, raw or derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Sale,
    Purchase,
    Payment,
    Loan,
    DepreciationSchedule,
    AccrualSchedule,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordSource::Sale => "sale",
            RecordSource::Purchase => "purchase",
            RecordSource::Payment => "payment",
            RecordSource::Loan => "loan",
            RecordSource::DepreciationSchedule => "depreciation_schedule",
            RecordSource::AccrualSchedule => "accrual_schedule",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub product_name: String,
    pub sale_at: NaiveDate,
    /// Settlement date as recorded; informational, the ledger derives cash
    /// timing from `payment_method`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_at: Option<NaiveDate>,
    pub quantity: Quantity,
    pub price: Money,
    pub payment_method: PaymentMethod,
}

impl Sale {
    /// `quantity × price`; fails when the product is not representable.
    pub fn gross_amount(&self) -> LedgerResult<Money> {
        checked_product("price", self.quantity, self.price)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        require_positive("quantity", self.quantity)?;
        require_non_negative("price", self.price)?;
        self.gross_amount().map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub product_name: String,
    pub purchase_at: NaiveDate,
    pub quantity: Quantity,
    /// Unit cost
    pub amount: Money,
    pub payment_method: PaymentMethod,
}

impl Purchase {
    pub fn total_cost(&self) -> LedgerResult<Money> {
        checked_product("amount", self.quantity, self.amount)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        require_positive("quantity", self.quantity)?;
        require_non_negative("amount", self.amount)?;
        self.total_cost().map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub payment_type: PaymentType,
    pub payment_date: NaiveDate,
    pub amount: Money,
}

impl Payment {
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.payment_type.is_known() {
            return Err(LedgerError::InvalidInput {
                field: "payment_type".into(),
                reason: format!("'{}' is outside the fixed payment type set", self.payment_type),
            });
        }
        require_non_negative("amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_at: NaiveDate,
    pub value: Money,
}

impl Loan {
    pub fn validate(&self) -> LedgerResult<()> {
        require_non_negative("value", self.value)
    }
}

/// Every raw collection the engine reads. A missing collection is an empty
/// one and contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecords {
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

impl RawRecords {
    pub fn len(&self) -> usize {
        self.sales.len() + self.purchases.len() + self.payments.len() + self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn checked_product(field: &str, quantity: Quantity, unit: Money) -> LedgerResult<Money> {
    quantity.checked_mul(unit).ok_or_else(|| LedgerError::InvalidInput {
        field: field.into(),
        reason: format!("{quantity} × {unit} overflows"),
    })
}

fn require_positive(field: &str, value: Decimal) -> LedgerResult<()> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput {
            field: field.into(),
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> LedgerResult<()> {
    if value < Decimal::ZERO {
        return Err(LedgerError::InvalidInput {
            field: field.into(),
            reason: format!("must not be negative, got {value}"),
        });
    }
    Ok(())
}
