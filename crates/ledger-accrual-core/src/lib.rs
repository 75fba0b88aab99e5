pub mod aggregate;
pub mod config;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod schedule;
pub mod statement;
pub mod store;
pub mod types;

#[cfg(feature = "audit")]
pub mod audit;

#[cfg(feature = "flux")]
pub mod flux;

pub use config::PipelineConfig;
pub use error::LedgerError;
pub use pipeline::{run_pipeline, PipelineOutput, Stage};
pub use store::LedgerStore;
pub use types::*;

/// Standard result type for all ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
