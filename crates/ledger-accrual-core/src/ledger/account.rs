use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;
use crate::records::PaymentType;

/// The fixed chart of accounts postings are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Account {
    Revenue,
    Cash,
    #[serde(rename = "COGS")]
    Cogs,
    #[serde(rename = "Depr_Exp")]
    DeprExp,
    #[serde(rename = "PPE_Snapshot")]
    PpeSnapshot,
    #[serde(rename = "Accounts_Receivable")]
    AccountsReceivable,
    Inventory,
    #[serde(rename = "Loan_Principal")]
    LoanPrincipal,
    #[serde(rename = "Accounts_Payable")]
    AccountsPayable,
    #[serde(rename = "wage")]
    Wage,
    #[serde(rename = "utility")]
    Utility,
    #[serde(rename = "tax")]
    Tax,
    #[serde(rename = "interest")]
    Interest,
    #[serde(rename = "rent")]
    Rent,
}

impl Account {
    pub const ALL: [Account; 14] = [
        Account::Revenue,
        Account::Cash,
        Account::Cogs,
        Account::DeprExp,
        Account::PpeSnapshot,
        Account::AccountsReceivable,
        Account::Inventory,
        Account::LoanPrincipal,
        Account::AccountsPayable,
        Account::Wage,
        Account::Utility,
        Account::Tax,
        Account::Interest,
        Account::Rent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Revenue => "Revenue",
            Account::Cash => "Cash",
            Account::Cogs => "COGS",
            Account::DeprExp => "Depr_Exp",
            Account::PpeSnapshot => "PPE_Snapshot",
            Account::AccountsReceivable => "Accounts_Receivable",
            Account::Inventory => "Inventory",
            Account::LoanPrincipal => "Loan_Principal",
            Account::AccountsPayable => "Accounts_Payable",
            Account::Wage => "wage",
            Account::Utility => "utility",
            Account::Tax => "tax",
            Account::Interest => "interest",
            Account::Rent => "rent",
        }
    }

    /// Expense account a payment type is recognized in, if it has one.
    /// Equipment is capitalized and loan repayments reduce principal.
    pub fn for_expense(payment_type: &PaymentType) -> Option<Account> {
        match payment_type {
            PaymentType::Wage => Some(Account::Wage),
            PaymentType::Utility => Some(Account::Utility),
            PaymentType::Tax => Some(Account::Tax),
            PaymentType::Interest => Some(Account::Interest),
            PaymentType::Rent => Some(Account::Rent),
            PaymentType::Equipment | PaymentType::Loan | PaymentType::Other(_) => None,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Account {
    type Err = LedgerError;

    /// Accepts the serialized account name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Account::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LedgerError::InvalidInput {
                field: "account".into(),
                reason: format!("unknown account '{wanted}'"),
            })
    }
}
