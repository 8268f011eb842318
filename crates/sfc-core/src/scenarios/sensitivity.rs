use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SfcError;
use crate::financing::contract::{validate_contract, Configuration, Contract};
use crate::financing::present_value::value_contract;
use crate::financing::significance::evaluate;
use crate::time_value::annual_to_monthly_rate;
use crate::types::*;
use crate::SfcResult;

const MAX_GRID_CELLS: usize = 10_000;

/// Inclusive sweep from `min` to `max` in increments of `step`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRange {
    pub min: Rate,
    pub max: Rate,
    pub step: Rate,
}

/// Input for a discount-rate × license-percentage sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingSensitivityInput {
    pub contract: Contract,
    /// Base case; its discount rate and license percentage mark the base cell
    #[serde(default)]
    pub base_config: Configuration,
    pub discount_rates: SweepRange,
    pub license_pcts: Vec<Rate>,
}

/// Output of the sweep. Matrix[i][j] is the figure when the discount rate is
/// `discount_rates[i]` and the license percentage is `license_pcts[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingSensitivityOutput {
    pub discount_rates: Vec<Rate>,
    pub license_pcts: Vec<Rate>,
    pub present_value: Vec<Vec<Money>>,
    pub financing_component: Vec<Vec<Money>>,
    pub financing_percentage: Vec<Vec<Rate>>,
    pub is_significant: Vec<Vec<bool>>,
    /// Lowest swept discount rate at which financing becomes significant,
    /// per license percentage
    pub significance_threshold_rate: Vec<Option<Rate>>,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values for a range from min to max with step.
fn generate_sweep_values(name: &str, range: &SweepRange) -> SfcResult<Vec<Decimal>> {
    if range.step <= Decimal::ZERO {
        return Err(SfcError::InvalidInput {
            field: name.to_string(),
            reason: "Step must be positive".into(),
        });
    }
    if range.min > range.max {
        return Err(SfcError::InvalidInput {
            field: name.to_string(),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = range.min;
    while current <= range.max {
        values.push(current);
        current += range.step;
        if values.len() > MAX_GRID_CELLS {
            return Err(SfcError::InvalidInput {
                field: name.to_string(),
                reason: format!("Sweep produces more than {MAX_GRID_CELLS} values"),
            });
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < range.max {
            values.push(range.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Sweep discount rate against license percentage, reporting the fair-value
/// price, financing component and significance at every point.
pub fn sweep(
    input: &FinancingSensitivityInput,
) -> SfcResult<ComputationOutput<FinancingSensitivityOutput>> {
    let start = Instant::now();
    let mut warnings = validate_contract(&input.contract)?;

    if input.license_pcts.is_empty() {
        return Err(SfcError::InvalidInput {
            field: "license_pcts".into(),
            reason: "At least one license percentage is required".into(),
        });
    }
    if let Some(bad) = input
        .license_pcts
        .iter()
        .find(|p| **p < Decimal::ZERO || **p > Decimal::ONE)
    {
        return Err(SfcError::InvalidInput {
            field: "license_pcts".into(),
            reason: format!("License percentage must be within [0, 1], got {bad}"),
        });
    }

    let rates = generate_sweep_values("discount_rates", &input.discount_rates)?;
    if rates.iter().any(|r| *r <= -Decimal::ONE) {
        return Err(SfcError::InvalidInput {
            field: "discount_rates".into(),
            reason: "Discount rates must be greater than -100%".into(),
        });
    }
    if rates.len() * input.license_pcts.len() > MAX_GRID_CELLS {
        return Err(SfcError::InvalidInput {
            field: "discount_rates".into(),
            reason: format!("Grid exceeds {MAX_GRID_CELLS} cells"),
        });
    }
    if input.base_config.override_present_value.is_some() {
        warnings.push("Override present value ignored in sensitivity sweep".to_string());
    }

    let rows = rates.len();
    let cols = input.license_pcts.len();
    let mut present_value = vec![vec![Decimal::ZERO; cols]; rows];
    let mut financing_component = vec![vec![Decimal::ZERO; cols]; rows];
    let mut financing_percentage = vec![vec![Decimal::ZERO; cols]; rows];
    let mut is_significant = vec![vec![false; cols]; rows];

    for (i, &rate) in rates.iter().enumerate() {
        let monthly_rate = annual_to_monthly_rate(rate);
        for (j, &license_pct) in input.license_pcts.iter().enumerate() {
            let config = Configuration {
                discount_rate: rate,
                license_pct,
                override_present_value: None,
                ..input.base_config.clone()
            };
            let valuation = value_contract(&input.contract, &config, monthly_rate)?;
            let assessment = evaluate(input.contract.cash_received, valuation.present_value)?;

            present_value[i][j] = valuation.present_value;
            financing_component[i][j] = assessment.financing_component;
            financing_percentage[i][j] = assessment.financing_percentage;
            is_significant[i][j] = assessment.is_significant;
        }
    }

    let significance_threshold_rate = (0..cols)
        .map(|j| (0..rows).find(|&i| is_significant[i][j]).map(|i| rates[i]))
        .collect();

    let base_row = closest_index(&rates, input.base_config.discount_rate);
    let base_col = closest_index(&input.license_pcts, input.base_config.license_pct);

    let output = FinancingSensitivityOutput {
        discount_rates: rates,
        license_pcts: input.license_pcts.clone(),
        present_value,
        financing_component,
        financing_percentage,
        is_significant,
        significance_threshold_rate,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Discount rate x license allocation sensitivity of the financing component",
        &serde_json::json!({
            "customer": input.contract.customer,
            "cash_received": input.contract.cash_received,
            "base_discount_rate": input.base_config.discount_rate,
            "base_license_pct": input.base_config.license_pct,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::contract::Period;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_input() -> FinancingSensitivityInput {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        FinancingSensitivityInput {
            contract: Contract {
                customer: "Acme Corp".to_string(),
                cash_received: dec!(1500000),
                payment_date: d(2026, 1, 15),
                periods: (0..5)
                    .map(|i| Period {
                        start: d(2026 + i, 1, 15),
                        end: d(2027 + i, 1, 14),
                        stated_amount: dec!(300000),
                    })
                    .collect(),
            },
            base_config: Configuration::default(),
            discount_rates: SweepRange {
                min: dec!(0.00),
                max: dec!(0.10),
                step: dec!(0.02),
            },
            license_pcts: vec![dec!(0.0), dec!(0.2), dec!(0.5)],
        }
    }

    #[test]
    fn test_grid_shape() {
        let out = sweep(&sample_input()).unwrap().result;
        assert_eq!(out.discount_rates.len(), 6);
        assert_eq!(out.present_value.len(), 6);
        assert_eq!(out.present_value[0].len(), 3);
        assert_eq!(out.base_case_position, (3, 1));
    }

    #[test]
    fn test_zero_rate_row_has_no_financing() {
        let out = sweep(&sample_input()).unwrap().result;
        for j in 0..3 {
            assert_eq!(out.present_value[0][j], dec!(1500000));
            assert_eq!(out.financing_component[0][j], Decimal::ZERO);
            assert!(!out.is_significant[0][j]);
        }
    }

    #[test]
    fn test_present_value_falls_as_rate_rises() {
        let out = sweep(&sample_input()).unwrap().result;
        for j in 0..3 {
            for i in 1..out.discount_rates.len() {
                assert!(out.present_value[i][j] < out.present_value[i - 1][j]);
            }
        }
    }

    #[test]
    fn test_higher_license_share_lowers_financing() {
        let out = sweep(&sample_input()).unwrap().result;
        let row = 3;
        assert!(out.financing_component[row][2] < out.financing_component[row][0]);
    }

    #[test]
    fn test_threshold_rate_found() {
        let out = sweep(&sample_input()).unwrap().result;
        assert!(out.significance_threshold_rate.iter().all(|t| t.is_some()));
        // Undiscounted license delays significance
        assert!(out.significance_threshold_rate[2] >= out.significance_threshold_rate[0]);
    }

    #[test]
    fn test_sweep_with_non_exact_step() {
        let range = SweepRange {
            min: dec!(0.01),
            max: dec!(0.06),
            step: dec!(0.02),
        };
        let values = generate_sweep_values("r", &range).unwrap();
        assert_eq!(values, vec![dec!(0.01), dec!(0.03), dec!(0.05), dec!(0.06)]);
    }

    #[test]
    fn test_invalid_step() {
        let mut input = sample_input();
        input.discount_rates.step = Decimal::ZERO;
        assert!(sweep(&input).is_err());
    }

    #[test]
    fn test_invalid_license_pct() {
        let mut input = sample_input();
        input.license_pcts.push(dec!(1.5));
        assert!(sweep(&input).is_err());
    }
}
