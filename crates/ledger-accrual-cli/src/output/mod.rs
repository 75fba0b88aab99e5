//! Renderers for command results. Every command returns a
//! `serde_json::Value`, usually a `ComputationOutput` envelope whose
//! `result` holds statement rows, balances or schedules.

pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use serde_json::Value;

use crate::OutputFormat;

/// Print a command result on stdout in the requested format. JSON is always
/// printed as is; the other formats print `(no rows)` for an empty result.
pub fn format_output(format: &OutputFormat, value: &Value) {
    if !matches!(format, OutputFormat::Json) && is_empty_result(value) {
        println!("(no rows)");
        return;
    }
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Null, an empty row list, or an envelope wrapping one of those.
fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(rows) => rows.is_empty(),
        Value::Object(map) => map.get("result").is_some_and(is_empty_result),
        _ => false,
    }
}
