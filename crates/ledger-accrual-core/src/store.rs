//! Resource handle for raw records and the derived tables built from them.
//!
//! A run borrows the store mutably through [`RunSession`], so two runs can
//! never write the same store at once. The session stages freshly rebuilt
//! tables; they replace the committed ones only on [`RunSession::commit`].
//! Dropping a session on any other path discards what it staged.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::pipeline::run_pipeline;
use crate::records::RawRecords;
use crate::report::BatchReport;
use crate::schedule::Schedules;
use crate::statement::{StatementTable, YearlyStatement};
use crate::types::FiscalYear;
use crate::LedgerResult;

/// Tables owned and fully rebuilt by each run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTables {
    pub schedules: Schedules,
    pub statements: StatementTable,
    pub report: BatchReport,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    records: RawRecords,
    derived: DerivedTables,
    generation: u64,
}

impl LedgerStore {
    pub fn new(records: RawRecords) -> Self {
        Self {
            records,
            derived: DerivedTables::default(),
            generation: 0,
        }
    }

    pub fn records(&self) -> &RawRecords {
        &self.records
    }

    /// Open a run. The returned guard holds the only write access.
    pub fn begin_run(&mut self) -> RunSession<'_> {
        RunSession {
            store: self,
            staged: None,
        }
    }

    /// Rebuild every derived table and commit in one step.
    pub fn refresh(&mut self, config: &PipelineConfig) -> LedgerResult<&BatchReport> {
        let mut session = self.begin_run();
        session.execute(config)?;
        session.commit();
        Ok(&self.derived.report)
    }

    /// Number of committed runs.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn derived(&self) -> &DerivedTables {
        &self.derived
    }

    pub fn schedules(&self) -> &Schedules {
        &self.derived.schedules
    }

    pub fn statements(&self) -> &StatementTable {
        &self.derived.statements
    }

    pub fn statement(&self, year: FiscalYear) -> Option<&YearlyStatement> {
        self.derived.statements.get(year)
    }

    pub fn statements_between(&self, from: FiscalYear, to: FiscalYear) -> Vec<YearlyStatement> {
        self.derived.statements.range(from, to)
    }

    pub fn last_report(&self) -> &BatchReport {
        &self.derived.report
    }
}

/// Scoped write access to a [`LedgerStore`].
pub struct RunSession<'a> {
    store: &'a mut LedgerStore,
    staged: Option<DerivedTables>,
}

impl<'a> RunSession<'a> {
    pub fn records(&self) -> &RawRecords {
        &self.store.records
    }

    /// Truncate and rebuild the staged tables from the raw records.
    pub fn execute(&mut self, config: &PipelineConfig) -> LedgerResult<&BatchReport> {
        self.staged = None;
        let output = run_pipeline(&self.store.records, config)?;
        let staged = self.staged.insert(DerivedTables {
            schedules: output.schedules,
            statements: output.statements,
            report: output.report,
        });
        Ok(&staged.report)
    }

    pub fn staged(&self) -> Option<&DerivedTables> {
        self.staged.as_ref()
    }

    /// Publish the staged tables. A session that never executed commits
    /// nothing.
    pub fn commit(mut self) {
        match self.staged.take() {
            Some(tables) => {
                self.store.derived = tables;
                self.store.generation += 1;
                info!(generation = self.store.generation, "derived tables committed");
            }
            None => debug!("nothing staged; committed tables unchanged"),
        }
    }
}

impl Drop for RunSession<'_> {
    fn drop(&mut self) {
        if self.staged.is_some() {
            debug!("run session dropped before commit; staged tables discarded");
        }
    }
}
