//! The ledger: a fixed account set, signed postings, and the normalizer that
//! turns raw and derived records into postings.

pub mod account;
pub mod costing;
pub mod normalizer;
pub mod posting;

pub use account::Account;
pub use costing::UnitCostTable;
pub use normalizer::normalize;
pub use posting::Posting;
