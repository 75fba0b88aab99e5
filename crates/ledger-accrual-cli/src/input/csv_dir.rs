use ledger_accrual_core::records::{Loan, Payment, Purchase, RawRecords, Sale};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

/// Load raw records from a directory holding `sales.csv`, `purchases.csv`,
/// `payments.csv` and `loans.csv`. A missing file is an empty collection;
/// a row that does not parse is skipped with a warning.
pub fn read_records_dir(dir: &str) -> Result<RawRecords, Box<dyn std::error::Error>> {
    let root = Path::new(dir);
    if !root.is_dir() {
        return Err(format!("Not a directory: {}", root.display()).into());
    }

    let records = RawRecords {
        sales: read_rows::<Sale>(&root.join("sales.csv"))?,
        purchases: read_rows::<Purchase>(&root.join("purchases.csv"))?,
        payments: read_rows::<Payment>(&root.join("payments.csv"))?,
        loans: read_rows::<Loan>(&root.join("loans.csv"))?,
    };
    info!(records = records.len(), dir = %root.display(), "raw records loaded");
    Ok(records)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    if !path.exists() {
        warn!(file = %path.display(), "source file missing; treated as empty");
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            // header is line 1
            Err(e) => warn!(file = %path.display(), line = line + 2, error = %e, "row skipped"),
        }
    }
    Ok(rows)
}
