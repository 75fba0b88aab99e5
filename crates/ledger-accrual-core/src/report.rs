//! Per-record outcomes collected into a batch report.
//!
//! A record that cannot be derived is skipped, logged, and recorded here. It
//! never aborts the stage it belongs to.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::pipeline::Stage;
use crate::records::RecordSource;

/// What happened to one source record inside one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The record produced this many rows (entries or postings)
    Applied { rows: usize },
    /// The record was left out
    Skipped { reason: String },
}

/// A record that was left out, with enough context to find it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub stage: Stage,
    pub source: RecordSource,
    /// Position of the record within its source collection
    pub index: usize,
    pub reason: String,
}

/// Outcome of a whole batch, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub depreciation_entries: usize,
    pub accrual_entries: usize,
    pub postings: usize,
    pub aggregates: usize,
    pub statement_rows: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl BatchReport {
    /// Record the outcome of one source record. Skips are logged as
    /// warnings; applied rows are only counted by the caller.
    pub fn record(
        &mut self,
        stage: Stage,
        source: RecordSource,
        index: usize,
        outcome: RecordOutcome,
    ) {
        if let RecordOutcome::Skipped { reason } = outcome {
            warn!(%stage, %source, index, %reason, "record skipped");
            self.skipped.push(SkippedRecord {
                stage,
                source,
                index,
                reason,
            });
        }
    }

    pub fn skip(&mut self, stage: Stage, source: RecordSource, index: usize, reason: impl Into<String>) {
        self.record(
            stage,
            source,
            index,
            RecordOutcome::Skipped {
                reason: reason.into(),
            },
        );
    }

    pub fn skipped_in(&self, stage: Stage) -> impl Iterator<Item = &SkippedRecord> {
        self.skipped.iter().filter(move |s| s.stage == stage)
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// One line per skipped record, for the output envelope.
    pub fn warnings(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| format!("{} {} #{} skipped: {}", s.stage, s.source, s.index, s.reason))
            .collect()
    }
}
