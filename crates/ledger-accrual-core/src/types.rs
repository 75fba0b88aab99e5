use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Unit counts on sales and purchases. Fractional units are allowed.
pub type Quantity = Decimal;

/// Fiscal year (calendar year; no offset fiscal calendars are supported)
pub type FiscalYear = i32;

/// Decimal places of every published statement figure.
pub const STATEMENT_DP: u32 = 2;

/// Fiscal year an event dated `date` belongs to.
pub fn fiscal_year(date: NaiveDate) -> FiscalYear {
    date.year()
}

/// Fiscal year of `date` shifted forward by one month. Only December
/// crosses into the following year.
pub fn lagged_fiscal_year(date: NaiveDate) -> FiscalYear {
    if date.month() == 12 {
        date.year() + 1
    } else {
        date.year()
    }
}

/// Round to statement precision, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(STATEMENT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
