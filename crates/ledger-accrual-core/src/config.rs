//! Pipeline configuration.
//!
//! Every accounting policy knob lives here: the statement horizon, which
//! payments are accrued and for which years, the depreciation convention and
//! the unit-cost policy used to price sales at cost.
//!
//! ```rust,ignore
//! let mut config = PipelineConfig::default();
//! config.apply_env_overrides()?;
//! config.validate()?;
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::LedgerError;
use crate::records::{Payment, PaymentType};
use crate::types::{fiscal_year, FiscalYear, Money};
use crate::LedgerResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_END_YEAR: FiscalYear = 2023;
pub const DEFAULT_USEFUL_LIFE_YEARS: u32 = 10;
pub const MAX_USEFUL_LIFE_YEARS: u32 = 100;
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.01);

const ENV_END_YEAR: &str = "ACCRUE_END_YEAR";
const ENV_ACCRUAL_YEARS: &str = "ACCRUE_ACCRUAL_YEARS";
const ENV_COSTING_POLICY: &str = "ACCRUE_COSTING_POLICY";
const ENV_RECOGNIZE_PERIOD_COSTS: &str = "ACCRUE_RECOGNIZE_PERIOD_COSTS";

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Straight-line, half-year convention depreciation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationPolicy {
    /// Useful life in whole years
    pub useful_life_years: u32,
    /// Residual value at the end of the useful life
    pub salvage_value: Money,
}

impl Default for DepreciationPolicy {
    fn default() -> Self {
        Self {
            useful_life_years: DEFAULT_USEFUL_LIFE_YEARS,
            salvage_value: Decimal::ZERO,
        }
    }
}

/// How a sale is priced at cost when its product was bought at several unit
/// costs. Lookups span the whole dataset; this is not time-ordered layering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostingPolicy {
    /// Quantity-weighted mean unit cost over every purchase of the product
    #[default]
    WeightedAverage,
    /// Unit cost of the earliest purchase of the product
    FirstCost,
    /// Unit cost of the latest purchase of the product
    LastCost,
}

impl std::str::FromStr for CostingPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weighted_average" => Ok(CostingPolicy::WeightedAverage),
            "first_cost" => Ok(CostingPolicy::FirstCost),
            "last_cost" => Ok(CostingPolicy::LastCost),
            other => Err(LedgerError::config(
                "costing_policy",
                format!("unknown policy '{other}'"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Full configuration surface of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Last fiscal year published in the statement table
    pub end_year: FiscalYear,
    /// Fiscal years whose payments feed the accrual schedule
    pub accrual_years: BTreeSet<FiscalYear>,
    /// Payment types recognized one month before they are paid
    pub accrual_payment_types: BTreeSet<PaymentType>,
    pub depreciation: DepreciationPolicy,
    pub costing_policy: CostingPolicy,
    /// Post interest and rent payments to their expense accounts in the
    /// payment year. Off by default, leaving those accounts empty.
    pub recognize_period_costs: bool,
    /// Absolute tolerance of reconciliation audits
    pub reconciliation_tolerance: Money,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            end_year: DEFAULT_END_YEAR,
            accrual_years: [2021, 2022, 2023].into_iter().collect(),
            accrual_payment_types: [PaymentType::Wage, PaymentType::Utility, PaymentType::Tax]
                .into_iter()
                .collect(),
            depreciation: DepreciationPolicy::default(),
            costing_policy: CostingPolicy::default(),
            recognize_period_costs: false,
            reconciliation_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    /// Override fields from `ACCRUE_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> LedgerResult<()> {
        if let Ok(val) = std::env::var(ENV_END_YEAR) {
            self.end_year = val
                .trim()
                .parse()
                .map_err(|_| LedgerError::config("end_year", format!("'{val}' is not a year")))?;
        }

        if let Ok(val) = std::env::var(ENV_ACCRUAL_YEARS) {
            self.accrual_years = parse_year_list(&val)?;
        }

        if let Ok(val) = std::env::var(ENV_COSTING_POLICY) {
            self.costing_policy = val.parse()?;
        }

        if let Ok(val) = std::env::var(ENV_RECOGNIZE_PERIOD_COSTS) {
            self.recognize_period_costs = matches!(
                val.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(())
    }

    /// Reject configurations no stage could run with.
    pub fn validate(&self) -> LedgerResult<()> {
        let life = self.depreciation.useful_life_years;
        if life == 0 || life > MAX_USEFUL_LIFE_YEARS {
            return Err(LedgerError::config(
                "depreciation.useful_life_years",
                format!("must be between 1 and {MAX_USEFUL_LIFE_YEARS} years, got {life}"),
            ));
        }
        if self.depreciation.salvage_value < Decimal::ZERO {
            return Err(LedgerError::config(
                "depreciation.salvage_value",
                "must not be negative",
            ));
        }
        if self.reconciliation_tolerance < Decimal::ZERO {
            return Err(LedgerError::config(
                "reconciliation_tolerance",
                "must not be negative",
            ));
        }
        if let Some(t) = self
            .accrual_payment_types
            .iter()
            .find(|t| matches!(t, PaymentType::Equipment | PaymentType::Loan | PaymentType::Other(_)))
        {
            return Err(LedgerError::config(
                "accrual_payment_types",
                format!("'{t}' has no expense account to accrue into"),
            ));
        }
        Ok(())
    }

    /// Whether the accrual schedule expenses this payment: an eligible type
    /// paid in one of the accrual years.
    pub fn accrues(&self, payment: &Payment) -> bool {
        self.accrual_payment_types.contains(&payment.payment_type)
            && self.accrual_years.contains(&fiscal_year(payment.payment_date))
    }

    pub fn with_end_year(mut self, end_year: FiscalYear) -> Self {
        self.end_year = end_year;
        self
    }

    pub fn with_accrual_years(mut self, years: impl IntoIterator<Item = FiscalYear>) -> Self {
        self.accrual_years = years.into_iter().collect();
        self
    }

    pub fn with_costing_policy(mut self, policy: CostingPolicy) -> Self {
        self.costing_policy = policy;
        self
    }

    pub fn with_period_costs(mut self, recognize: bool) -> Self {
        self.recognize_period_costs = recognize;
        self
    }
}

/// Parse "2021,2022, 2023" into a year set.
pub fn parse_year_list(s: &str) -> LedgerResult<BTreeSet<FiscalYear>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<FiscalYear>()
                .map_err(|_| LedgerError::config("accrual_years", format!("'{p}' is not a year")))
        })
        .collect()
}
