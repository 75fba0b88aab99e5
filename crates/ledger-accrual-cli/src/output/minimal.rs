use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Row lists collapse to their last row (the latest year), then well-known
/// fields are tried in order of priority before falling back to the first
/// field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let target = match result_obj {
        Value::Object(map) => match map.get("statements") {
            Some(Value::Array(rows)) => rows.last().unwrap_or(result_obj),
            _ => result_obj,
        },
        Value::Array(rows) => match rows.last() {
            Some(last) => last,
            None => {
                println!("(empty)");
                return;
            }
        },
        _ => result_obj,
    };

    let priority_keys = [
        "all_match",
        "net_income",
        "running_balance",
        "annual_depreciation_expense",
        "amount",
        "end_year",
    ];

    if let Value::Object(map) = target {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(target));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
