use rust_decimal::Decimal;
use serde_json::Value;
use std::io;

use sfc_core::financing::amortization::AmortizationRow;
use sfc_core::financing::journal::LedgerLine;
use sfc_core::round_cents;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Object(map) => {
            // Two-column CSV of the headline figures; tables go to --*-csv files
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                if val.is_array() || val.is_object() {
                    continue;
                }
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(body)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn cents(amount: Decimal) -> String {
    format!("{:.2}", round_cents(amount))
}

/// Journal import layout: Date (MM/DD/YYYY), Account, Debit, Credit, Memo.
/// One row per posting; the unused side is left blank.
pub fn write_journal_csv(path: &str, lines: &[LedgerLine]) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    wtr.write_record(["Date", "Account", "Debit", "Credit", "Memo"])?;
    for line in lines {
        wtr.write_record([
            line.date.format("%m/%d/%Y").to_string(),
            line.account.name().to_string(),
            line.debit.map(cents).unwrap_or_default(),
            line.credit.map(cents).unwrap_or_default(),
            line.memo.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Monthly amortization schedule, amounts rounded to cents for display.
pub fn write_schedule_csv(
    path: &str,
    rows: &[AmortizationRow],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    wtr.write_record([
        "Month",
        "Period",
        "Date",
        "Opening Deferred Revenue",
        "Opening Contra Liability",
        "Opening Net Liability",
        "Support Revenue",
        "Interest Income",
        "Closing Deferred Revenue",
        "Closing Contra Liability",
        "Closing Net Liability",
    ])?;
    for row in rows {
        wtr.write_record([
            row.month.to_string(),
            row.period.to_string(),
            row.date.format("%Y-%m-%d").to_string(),
            cents(row.opening_deferred_revenue),
            cents(row.opening_contra_liability),
            cents(row.opening_net_liability),
            cents(row.support_revenue),
            cents(row.interest_income),
            cents(row.closing_deferred_revenue),
            cents(row.closing_contra_liability),
            cents(row.closing_net_liability),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
