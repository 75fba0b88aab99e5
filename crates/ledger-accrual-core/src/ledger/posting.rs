use serde::{Deserialize, Serialize};

use super::account::Account;
use crate::types::{FiscalYear, Money};

/// A signed, year-and-account-tagged amount. Increases of Cash, Loan
/// principal and Payables are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub year: FiscalYear,
    pub account: Account,
    pub amount: Money,
}

impl Posting {
    pub fn new(year: FiscalYear, account: Account, amount: Money) -> Self {
        Self {
            year,
            account,
            amount,
        }
    }
}
