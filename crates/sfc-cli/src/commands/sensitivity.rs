use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use sfc_core::scenarios::sensitivity::{self, FinancingSensitivityInput, SweepRange};

use crate::input;

/// Arguments for the discount rate x license allocation sweep
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON input file (request envelope or bare contract)
    #[arg(long)]
    pub input: Option<String>,

    /// Discount rate sweep in format min:max:step (e.g. "0.02:0.10:0.01")
    #[arg(long, default_value = "0.02:0.10:0.01")]
    pub rates: String,

    /// Comma-separated license percentages (e.g. "0,0.2,0.5")
    #[arg(long, value_delimiter = ',', default_value = "0.2")]
    pub license_pcts: Vec<Decimal>,
}

fn parse_range(arg: &str) -> Result<SweepRange, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = arg.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Sweep range must be min:max:step, got '{}'", arg).into());
    }
    Ok(SweepRange {
        min: parts[0].trim().parse()?,
        max: parts[1].trim().parse()?,
        step: parts[2].trim().parse()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let discount_rates = parse_range(&args.rates)?;
    let raw = input::read_input_value(args.input.as_deref(), "sensitivity analysis")?;
    let (contract, base_config) = input::parse_request(raw)?.into_parts()?;

    let sweep_input = FinancingSensitivityInput {
        contract,
        base_config,
        discount_rates,
        license_pcts: args.license_pcts,
    };
    let output = sensitivity::sweep(&sweep_input)?;
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_range() {
        let r = parse_range("0.02:0.10:0.01").unwrap();
        assert_eq!(r.min, dec!(0.02));
        assert_eq!(r.max, dec!(0.10));
        assert_eq!(r.step, dec!(0.01));
    }

    #[test]
    fn test_parse_range_rejects_wrong_arity() {
        assert!(parse_range("rate:0.02:0.10:0.01").is_err());
        assert!(parse_range("0.02:0.10").is_err());
    }
}
