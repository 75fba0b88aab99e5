use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field} — {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Stage {stage} failed: {reason}")]
    Stage { stage: Stage, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LedgerError {
    pub(crate) fn stage(stage: Stage, reason: impl Into<String>) -> Self {
        LedgerError::Stage {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::SerializationError(e.to_string())
    }
}
