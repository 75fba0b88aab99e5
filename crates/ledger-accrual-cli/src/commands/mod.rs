pub mod analysis;
pub mod pipeline;

use clap::Args;

use ledger_accrual_core::records::RawRecords;
use ledger_accrual_core::{FiscalYear, LedgerStore, PipelineConfig};

use crate::input;

/// Where raw records and configuration come from. Shared by every command
/// that runs the pipeline.
#[derive(Args)]
pub struct SourceArgs {
    /// Path to a JSON file of raw records
    #[arg(long)]
    pub input: Option<String>,

    /// Directory holding sales.csv, purchases.csv, payments.csv and loans.csv
    #[arg(long, conflicts_with = "input")]
    pub csv_dir: Option<String>,

    /// Pipeline configuration file (.yaml/.yml or .json)
    #[arg(long)]
    pub config: Option<String>,

    /// Last fiscal year to project statements for
    #[arg(long)]
    pub end_year: Option<FiscalYear>,
}

impl SourceArgs {
    pub fn load_records(&self) -> Result<RawRecords, Box<dyn std::error::Error>> {
        let records: RawRecords = if let Some(ref path) = self.input {
            input::file::read_json(path)?
        } else if let Some(ref dir) = self.csv_dir {
            input::csv_dir::read_records_dir(dir)?
        } else if let Some(data) = input::stdin::read_stdin()? {
            data
        } else {
            return Err("--input <file.json>, --csv-dir <dir> or stdin required".into());
        };
        Ok(records)
    }

    /// File, then environment, then flags. Validated before it is returned.
    pub fn load_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let mut config = input::config::load_config(self.config.as_deref())?;
        if let Some(year) = self.end_year {
            config = config.with_end_year(year);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load everything and run the pipeline once into a fresh store.
    pub fn open_store(
        &self,
    ) -> Result<(LedgerStore, PipelineConfig), Box<dyn std::error::Error>> {
        let config = self.load_config()?;
        let mut store = LedgerStore::new(self.load_records()?);
        store.refresh(&config)?;
        Ok((store, config))
    }
}
