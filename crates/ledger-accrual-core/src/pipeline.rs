//! The batch pipeline: schedules → postings → aggregates → statements.
//!
//! Stages run strictly in order; each consumes the complete output of the
//! one before it. Per-record problems are collected in the batch report and
//! never stop a stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::info;

use crate::aggregate::{aggregate, AggregateTable};
use crate::config::PipelineConfig;
use crate::ledger::normalize;
use crate::records::RawRecords;
use crate::report::BatchReport;
use crate::schedule::{generate_schedules, Schedules};
use crate::statement::{project, StatementTable};
use crate::types::{with_metadata, ComputationOutput};
use crate::LedgerResult;

/// Pipeline stage, used to attribute skips and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schedule,
    Normalize,
    Aggregate,
    Project,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Schedule => "schedule",
            Stage::Normalize => "normalize",
            Stage::Aggregate => "aggregate",
            Stage::Project => "project",
        };
        f.write_str(s)
    }
}

/// Everything one run derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub schedules: Schedules,
    pub aggregates: AggregateTable,
    pub statements: StatementTable,
    pub report: BatchReport,
}

/// Run every stage over `records`. Only invalid configuration or a
/// stage-level failure returns an error.
pub fn run_pipeline(records: &RawRecords, config: &PipelineConfig) -> LedgerResult<PipelineOutput> {
    config.validate()?;
    if records.is_empty() {
        info!("no raw records; every derived table will be empty");
    }

    let mut report = BatchReport::default();
    let schedules = generate_schedules(records, config, &mut report);
    let postings = normalize(records, &schedules, config, &mut report);
    let aggregates = aggregate(&postings)?;
    report.aggregates = aggregates.len();
    let statements = project(&aggregates, config.end_year)?;
    report.statement_rows = statements.len();

    info!(
        statement_rows = report.statement_rows,
        skipped = report.skipped.len(),
        "pipeline finished"
    );

    Ok(PipelineOutput {
        schedules,
        aggregates,
        statements,
        report,
    })
}

/// `run_pipeline` wrapped in the standard output envelope.
pub fn run_pipeline_with_metadata(
    records: &RawRecords,
    config: &PipelineConfig,
) -> LedgerResult<ComputationOutput<PipelineOutput>> {
    let start = Instant::now();
    let output = run_pipeline(records, config)?;
    let warnings = output.report.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cash-to-accrual ledger aggregation (half-year straight-line depreciation, one-month expense accrual)",
        config,
        warnings,
        elapsed,
        output,
    ))
}
