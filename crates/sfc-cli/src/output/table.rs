use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

const SWEEP_MATRICES: [&str; 3] = ["present_value", "financing_component", "is_significant"];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) if is_sweep(res_map) => print_sweep(res_map),
        Value::Object(res_map) => print_object(res_map),
        _ => print_object(envelope),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars in a Field/Value table, then one table per nested list
/// (pv_analysis, amortization_schedule, journal_entries).
fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if is_table_like(val) || key == "warnings" {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));

    for (key, val) in map {
        if let Value::Array(arr) = val {
            if is_table_like(val) {
                println!("\n{}:", key);
                print_array_table(arr);
            }
        }
    }
}

fn is_table_like(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))))
}

fn is_sweep(map: &Map<String, Value>) -> bool {
    map.contains_key("discount_rates") && map.contains_key("license_pcts")
}

/// Rate down the side, license percentage across the top.
fn print_sweep(map: &Map<String, Value>) {
    let empty = Vec::new();
    let rates = map.get("discount_rates").and_then(Value::as_array).unwrap_or(&empty);
    let pcts = map.get("license_pcts").and_then(Value::as_array).unwrap_or(&empty);

    for name in SWEEP_MATRICES {
        let Some(Value::Array(rows)) = map.get(name) else {
            continue;
        };
        let mut builder = Builder::default();
        let mut header = vec!["rate \\ license".to_string()];
        header.extend(pcts.iter().map(format_value));
        builder.push_record(header);

        for (rate, row) in rates.iter().zip(rows) {
            let mut record = vec![format_value(rate)];
            if let Value::Array(cells) = row {
                record.extend(cells.iter().map(format_value));
            }
            builder.push_record(record);
        }
        println!("\n{}:", name);
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Array(thresholds)) = map.get("significance_threshold_rate") {
        let mut builder = Builder::default();
        builder.push_record(["license_pct", "significant_from_rate"]);
        for (pct, t) in pcts.iter().zip(thresholds) {
            builder.push_record([format_value(pct), format_value(t)]);
        }
        println!("\nsignificance_threshold_rate:");
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => match (map.get("account"), map.get("amount")) {
            (Some(account), Some(amount)) => {
                format!("{} {}", format_value(account), format_value(amount))
            }
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
    }
}
