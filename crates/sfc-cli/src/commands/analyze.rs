use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use sfc_core::financing::contract::{
    validate_configuration, validate_contract, AnalyzeRequest, DisplayDiscounting,
};
use sfc_core::financing::journal::ledger_lines;

use crate::input;
use crate::output::csv_out;

/// Arguments for the full financing analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file (request envelope or bare contract)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual discount rate as a decimal (overrides the input file)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// License share of the transaction price, 0 to 1 (overrides the input file)
    #[arg(long)]
    pub license_pct: Option<Decimal>,

    /// Use this fair-value transaction price instead of discounting
    #[arg(long)]
    pub override_pv: Option<Decimal>,

    /// Discount the per-period display table by exact day counts
    #[arg(long)]
    pub exact_days: bool,

    /// Write journal entries as an accounting import CSV
    #[arg(long)]
    pub journal_csv: Option<String>,

    /// Write the monthly amortization schedule as CSV
    #[arg(long)]
    pub schedule_csv: Option<String>,
}

/// Arguments for contract validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON input file (request envelope or bare contract)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual discount rate as a decimal (overrides the input file)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// License share of the transaction price (overrides the input file)
    #[arg(long)]
    pub license_pct: Option<Decimal>,
}

/// Flags win over values in the file.
fn apply_overrides(
    request: &mut AnalyzeRequest,
    discount_rate: Option<Decimal>,
    license_pct: Option<Decimal>,
) {
    if discount_rate.is_some() {
        request.discount_rate = discount_rate;
    }
    if license_pct.is_some() {
        request.license_pct = license_pct;
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = input::read_input_value(args.input.as_deref(), "financing analysis")?;
    let mut request = input::parse_request(raw)?;
    apply_overrides(&mut request, args.discount_rate, args.license_pct);
    if args.override_pv.is_some() {
        request.override_present_value = args.override_pv;
    }
    if args.exact_days {
        request.display_discounting = Some(DisplayDiscounting::ExactDays);
    }

    let output = sfc_core::analyze_contract(&request)?;
    let result = &output.result;

    if let Some(ref path) = args.journal_csv {
        csv_out::write_journal_csv(path, &ledger_lines(&result.journal_entries))?;
        tracing::info!(path = %path, entries = result.journal_entries.len(), "journal CSV written");
    }
    if let Some(ref path) = args.schedule_csv {
        csv_out::write_schedule_csv(path, &result.amortization_schedule)?;
        tracing::info!(path = %path, months = result.total_months, "schedule CSV written");
    }

    Ok(serde_json::to_value(output)?)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = input::read_input_value(args.input.as_deref(), "contract validation")?;
    let mut request = input::parse_request(raw)?;
    apply_overrides(&mut request, args.discount_rate, args.license_pct);

    let (contract, config) = request.into_parts()?;
    let mut warnings = validate_contract(&contract)?;
    warnings.extend(validate_configuration(&config)?);

    Ok(json!({
        "is_valid": true,
        "customer": contract.customer,
        "periods": contract.periods.len(),
        "stated_total": contract.stated_total(),
        "cash_received": contract.cash_received,
        "warnings": warnings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flags_override_file_values() {
        let mut request = AnalyzeRequest {
            discount_rate: Some(dec!(0.05)),
            license_pct: Some(dec!(0.3)),
            ..Default::default()
        };
        apply_overrides(&mut request, Some(dec!(0.08)), None);
        assert_eq!(request.discount_rate, Some(dec!(0.08)));
        assert_eq!(request.license_pct, Some(dec!(0.3)));
    }
}
