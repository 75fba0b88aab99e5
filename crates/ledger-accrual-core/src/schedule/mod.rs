//! Derived schedules: depreciation of equipment and accrual of recurring
//! operating expenses. Both are rebuilt from the raw payments on every run.

pub mod accrual;
pub mod depreciation;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::config::PipelineConfig;
use crate::pipeline::Stage;
use crate::records::{PaymentType, RawRecords, RecordSource};
use crate::report::{BatchReport, RecordOutcome};
use crate::types::fiscal_year;

pub use accrual::AccrualScheduleEntry;
pub use depreciation::DepreciationScheduleEntry;

/// Both derived schedules of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedules {
    pub depreciation: Vec<DepreciationScheduleEntry>,
    pub accruals: Vec<AccrualScheduleEntry>,
}

/// Generate both schedules from the raw payments. Malformed payments are
/// skipped and reported; the batch always completes.
pub fn generate_schedules(
    records: &RawRecords,
    config: &PipelineConfig,
    report: &mut BatchReport,
) -> Schedules {
    let _span = info_span!("schedule").entered();
    let mut schedules = Schedules::default();

    for (index, payment) in records.payments.iter().enumerate() {
        if payment.payment_type == PaymentType::Equipment {
            let outcome = match depreciation::depreciation_window(
                payment.id,
                fiscal_year(payment.payment_date),
                payment.amount,
                &config.depreciation,
            ) {
                Ok(window) => {
                    let rows = window.len();
                    schedules.depreciation.extend(window);
                    RecordOutcome::Applied { rows }
                }
                Err(e) => RecordOutcome::Skipped {
                    reason: e.to_string(),
                },
            };
            report.record(Stage::Schedule, RecordSource::Payment, index, outcome);
            continue;
        }

        if !config.accrual_payment_types.contains(&payment.payment_type) {
            continue;
        }
        if !config.accrues(payment) {
            let year = fiscal_year(payment.payment_date);
            debug!(payment_id = payment.id, year, "payment outside accrual years");
            continue;
        }
        let outcome = match accrual::accrue(payment) {
            Ok(entry) => {
                schedules.accruals.push(entry);
                RecordOutcome::Applied { rows: 1 }
            }
            Err(e) => RecordOutcome::Skipped {
                reason: e.to_string(),
            },
        };
        report.record(Stage::Schedule, RecordSource::Payment, index, outcome);
    }

    report.depreciation_entries = schedules.depreciation.len();
    report.accrual_entries = schedules.accruals.len();
    info!(
        depreciation_entries = schedules.depreciation.len(),
        accrual_entries = schedules.accruals.len(),
        "schedules generated"
    );
    schedules
}
