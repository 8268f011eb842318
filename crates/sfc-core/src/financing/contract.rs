//! Contract, period and configuration types plus the validation pass that
//! runs before any computation.
//!
//! Validation separates fatal problems (no periods, non-positive amounts,
//! inverted dates, rates that make the arithmetic meaningless) from advisory
//! ones (cash far above the stated total, implausible years, gaps between
//! periods). Fatal problems return an error; advisories come back as
//! warning strings that travel alongside a successful result.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SfcError;
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{Money, Rate};
use crate::SfcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_DISCOUNT_RATE: Rate = dec!(0.06);
pub const DEFAULT_LICENSE_PCT: Rate = dec!(0.20);

const CASH_EXCESS_WARNING_RATIO: Decimal = dec!(1.10);
const IMPLAUSIBLE_DISCOUNT_RATE: Rate = dec!(0.25);
const EARLIEST_PLAUSIBLE_YEAR: i32 = 2020;
const LATEST_PLAUSIBLE_YEAR: i32 = 2100;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One contractual delivery period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Nominal, undiscounted cash value attributable to the period
    pub stated_amount: Money,
}

/// A prepaid multi-year contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Customer display name
    pub customer: String,
    /// Total nominal cash collected at signing
    pub cash_received: Money,
    /// Inception date and the discounting anchor (t = 0)
    pub payment_date: NaiveDate,
    /// Ordered, contiguous delivery periods
    pub periods: Vec<Period>,
}

impl Contract {
    /// Sum of the stated period amounts.
    pub fn stated_total(&self) -> Money {
        self.periods.iter().map(|p| p.stated_amount).sum()
    }

    /// Contract term in months (each period spans one year).
    pub fn total_months(&self) -> u32 {
        self.periods.len() as u32 * MONTHS_PER_YEAR
    }
}

/// How the display-only per-period PV table measures time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayDiscounting {
    /// Period i (0-based) is discounted for i + 1 whole years
    #[default]
    IntegerYears,
    /// Exact days from the payment date to the period end, over 365.25
    ExactDays,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Annual effective discount rate
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Rate,
    /// Fraction of fair value attributed to the license deliverable
    #[serde(default = "default_license_pct")]
    pub license_pct: Rate,
    /// Use this fair-value transaction price instead of computing one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_present_value: Option<Money>,
    /// Time convention for the cosmetic per-period PV table
    #[serde(default)]
    pub display_discounting: DisplayDiscounting,
}

fn default_discount_rate() -> Rate {
    DEFAULT_DISCOUNT_RATE
}

fn default_license_pct() -> Rate {
    DEFAULT_LICENSE_PCT
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            license_pct: DEFAULT_LICENSE_PCT,
            override_present_value: None,
            display_discounting: DisplayDiscounting::default(),
        }
    }
}

impl Configuration {
    pub fn support_pct(&self) -> Rate {
        Decimal::ONE - self.license_pct
    }
}

/// Request envelope as received at a service boundary:
/// `{contract_data, discount_rate?, license_pct?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub contract_data: Option<Contract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_pct: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_present_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_discounting: Option<DisplayDiscounting>,
}

impl AnalyzeRequest {
    /// Split the envelope into a contract and a configuration, filling
    /// defaults for anything not supplied.
    pub fn into_parts(self) -> SfcResult<(Contract, Configuration)> {
        let contract = self
            .contract_data
            .ok_or_else(|| SfcError::MissingInput("contract_data".into()))?;
        let config = Configuration {
            discount_rate: self.discount_rate.unwrap_or(DEFAULT_DISCOUNT_RATE),
            license_pct: self.license_pct.unwrap_or(DEFAULT_LICENSE_PCT),
            override_present_value: self.override_present_value,
            display_discounting: self.display_discounting.unwrap_or_default(),
        };
        Ok((contract, config))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a contract. Returns advisory warnings on success.
pub fn validate_contract(contract: &Contract) -> SfcResult<Vec<String>> {
    let mut warnings = Vec::new();

    if contract.periods.is_empty() {
        return Err(SfcError::InvalidContract {
            field: "periods".into(),
            reason: "At least one period is required".into(),
        });
    }
    if contract.cash_received < Decimal::ZERO {
        return Err(SfcError::InvalidContract {
            field: "cash_received".into(),
            reason: "Cash received cannot be negative".into(),
        });
    }

    for (i, period) in contract.periods.iter().enumerate() {
        if period.stated_amount <= Decimal::ZERO {
            return Err(SfcError::InvalidContract {
                field: format!("periods[{i}].stated_amount"),
                reason: format!(
                    "Stated amount must be positive, got {}",
                    period.stated_amount
                ),
            });
        }
        if period.start > period.end {
            return Err(SfcError::InvalidContract {
                field: format!("periods[{i}]"),
                reason: format!(
                    "Period starts {} after it ends {}",
                    period.start, period.end
                ),
            });
        }

        for (label, date) in [("start", period.start), ("end", period.end)] {
            let year = date.year();
            if !(EARLIEST_PLAUSIBLE_YEAR..=LATEST_PLAUSIBLE_YEAR).contains(&year) {
                warnings.push(format!(
                    "Period {} {} date {} falls outside {}-{}; verify the contract dates",
                    i + 1,
                    label,
                    date,
                    EARLIEST_PLAUSIBLE_YEAR,
                    LATEST_PLAUSIBLE_YEAR
                ));
            }
        }
    }

    for (i, pair) in contract.periods.windows(2).enumerate() {
        let expected_start = pair[0].end + Duration::days(1);
        if pair[1].start != expected_start {
            warnings.push(format!(
                "Period {} starts {} but period {} ends {}; periods are expected to be contiguous",
                i + 2,
                pair[1].start,
                i + 1,
                pair[0].end
            ));
        }
    }

    if contract.customer.trim().is_empty() {
        warnings.push("Customer name is empty".to_string());
    }

    let stated_total = contract.stated_total();
    if contract.cash_received > stated_total * CASH_EXCESS_WARNING_RATIO {
        warnings.push(format!(
            "Cash received ({}) exceeds 110% of the stated total ({}); verify period amounts",
            contract.cash_received, stated_total
        ));
    }

    Ok(warnings)
}

/// Validate the configuration. Returns advisory warnings on success.
pub fn validate_configuration(config: &Configuration) -> SfcResult<Vec<String>> {
    let mut warnings = Vec::new();

    if config.license_pct < Decimal::ZERO || config.license_pct > Decimal::ONE {
        return Err(SfcError::DegenerateConfiguration {
            field: "license_pct".into(),
            reason: format!("License percentage must be within [0, 1], got {}", config.license_pct),
        });
    }
    if config.discount_rate <= dec!(-1) {
        return Err(SfcError::DegenerateConfiguration {
            field: "discount_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    if let Some(pv) = config.override_present_value {
        if pv <= Decimal::ZERO {
            return Err(SfcError::DegenerateConfiguration {
                field: "override_present_value".into(),
                reason: "Override present value must be positive".into(),
            });
        }
    }

    if config.discount_rate < Decimal::ZERO {
        warnings.push(format!(
            "Negative discount rate ({}) implies a financing premium",
            config.discount_rate
        ));
    } else if config.discount_rate > IMPLAUSIBLE_DISCOUNT_RATE {
        warnings.push(format!(
            "Discount rate of {} exceeds 25%; verify the customer's credit-adjusted rate",
            config.discount_rate
        ));
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn three_year_contract() -> Contract {
        Contract {
            customer: "Deka Bank".to_string(),
            cash_received: dec!(900000),
            payment_date: date(2026, 1, 15),
            periods: vec![
                Period {
                    start: date(2026, 1, 15),
                    end: date(2027, 1, 14),
                    stated_amount: dec!(300000),
                },
                Period {
                    start: date(2027, 1, 15),
                    end: date(2028, 1, 14),
                    stated_amount: dec!(300000),
                },
                Period {
                    start: date(2028, 1, 15),
                    end: date(2029, 1, 14),
                    stated_amount: dec!(300000),
                },
            ],
        }
    }

    #[test]
    fn test_valid_contract_has_no_warnings() {
        let warnings = validate_contract(&three_year_contract()).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_stated_total_and_term() {
        let contract = three_year_contract();
        assert_eq!(contract.stated_total(), dec!(900000));
        assert_eq!(contract.total_months(), 36);
    }

    #[test]
    fn test_no_periods_rejected() {
        let mut contract = three_year_contract();
        contract.periods.clear();
        let err = validate_contract(&contract).unwrap_err();
        assert!(matches!(err, SfcError::InvalidContract { ref field, .. } if field == "periods"));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut contract = three_year_contract();
        contract.periods[1].stated_amount = Decimal::ZERO;
        let err = validate_contract(&contract).unwrap_err();
        match err {
            SfcError::InvalidContract { field, .. } => {
                assert_eq!(field, "periods[1].stated_amount")
            }
            other => panic!("Expected InvalidContract, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_period_rejected() {
        let mut contract = three_year_contract();
        contract.periods[0].end = date(2025, 1, 1);
        assert!(validate_contract(&contract).is_err());
    }

    #[test]
    fn test_negative_cash_rejected() {
        let mut contract = three_year_contract();
        contract.cash_received = dec!(-1);
        assert!(validate_contract(&contract).is_err());
    }

    #[test]
    fn test_cash_excess_warns() {
        let mut contract = three_year_contract();
        contract.cash_received = dec!(1000000);
        let warnings = validate_contract(&contract).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("110%"));
    }

    #[test]
    fn test_cash_at_threshold_does_not_warn() {
        let mut contract = three_year_contract();
        contract.cash_received = dec!(990000);
        assert!(validate_contract(&contract).unwrap().is_empty());
    }

    #[test]
    fn test_implausible_years_warn() {
        let mut contract = three_year_contract();
        contract.periods[0].start = date(2019, 1, 15);
        contract.periods[2].end = date(2101, 1, 14);
        let warnings = validate_contract(&contract).unwrap();
        assert!(warnings.iter().any(|w| w.contains("2019-01-15")));
        assert!(warnings.iter().any(|w| w.contains("2101-01-14")));
    }

    #[test]
    fn test_gap_between_periods_warns() {
        let mut contract = three_year_contract();
        contract.periods[1].start = date(2027, 2, 1);
        let warnings = validate_contract(&contract).unwrap();
        assert!(warnings.iter().any(|w| w.contains("contiguous")));
    }

    #[test]
    fn test_license_pct_out_of_range() {
        let config = Configuration {
            license_pct: dec!(1.2),
            ..Default::default()
        };
        assert!(matches!(
            validate_configuration(&config),
            Err(SfcError::DegenerateConfiguration { .. })
        ));
    }

    #[test]
    fn test_discount_rate_floor() {
        let config = Configuration {
            discount_rate: dec!(-1),
            ..Default::default()
        };
        assert!(validate_configuration(&config).is_err());
    }

    #[test]
    fn test_high_discount_rate_warns() {
        let config = Configuration {
            discount_rate: dec!(0.30),
            ..Default::default()
        };
        let warnings = validate_configuration(&config).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_request_defaults() {
        let json = r#"{
            "contract_data": {
                "customer": "Acme",
                "cash_received": 300000,
                "payment_date": "2026-01-15",
                "periods": [
                    {"start": "2026-01-15", "end": "2027-01-14", "stated_amount": 300000}
                ]
            }
        }"#;
        let request: AnalyzeRequest = serde_json::from_str(json).unwrap();
        let (contract, config) = request.into_parts().unwrap();
        assert_eq!(contract.periods.len(), 1);
        assert_eq!(config.discount_rate, dec!(0.06));
        assert_eq!(config.license_pct, dec!(0.20));
        assert_eq!(config.display_discounting, DisplayDiscounting::IntegerYears);
    }

    #[test]
    fn test_request_missing_contract() {
        let request: AnalyzeRequest = serde_json::from_str(r#"{"discount_rate": 0.05}"#).unwrap();
        assert!(matches!(request.into_parts(), Err(SfcError::MissingInput(_))));
    }
}
