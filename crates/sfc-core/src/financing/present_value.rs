//! Fair-value transaction price of a prepaid license + support bundle.
//!
//! The license is delivered at inception and carried undiscounted. Support
//! is delivered uniformly over every month of the term, and each monthly
//! slice is discounted from its delivery month back to the payment date at
//! the monthly equivalent of the annual rate.
//!
//! A separate per-period table discounts each period's stated amount at the
//! annual rate. It exists for presentation only and intentionally disagrees
//! with the monthly valuation; nothing downstream reads it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financing::contract::{Configuration, Contract, DisplayDiscounting};
use crate::time_value::{discount_single, pv_level_stream};
use crate::types::{Money, Rate};
use crate::SfcResult;

const DAYS_PER_YEAR: Decimal = dec!(365.25);

/// Authoritative valuation of the contract at t = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub stated_total: Money,
    pub total_months: u32,
    pub monthly_rate: Rate,
    /// License share of the stated total, recognized undiscounted
    pub license_present_value: Money,
    /// Nominal support amount delivered each month
    pub monthly_support_stated: Money,
    pub support_present_value: Money,
    /// Fair-value transaction price
    pub present_value: Money,
    /// True when the price came from configuration rather than discounting
    pub overridden: bool,
}

/// Display-only discounting of one period at the annual rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvAnalysisRow {
    /// Period number (1-indexed)
    pub period: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub service_midpoint: NaiveDate,
    pub years_discounted: Decimal,
    pub stated_amount: Money,
    pub present_value: Money,
    pub financing_component: Money,
}

/// Value the contract: license undiscounted, support discounted monthly.
pub fn value_contract(
    contract: &Contract,
    config: &Configuration,
    monthly_rate: Rate,
) -> SfcResult<Valuation> {
    let stated_total = contract.stated_total();
    let total_months = contract.total_months();

    let license_present_value = stated_total * config.license_pct;
    let support_stated_total = stated_total * config.support_pct();
    let monthly_support_stated = support_stated_total / Decimal::from(total_months);

    let support_present_value = if monthly_rate.is_zero() {
        support_stated_total
    } else {
        pv_level_stream(monthly_rate, total_months, monthly_support_stated)?
    };

    let (present_value, overridden) = match config.override_present_value {
        Some(pv) => (pv, true),
        None => (license_present_value + support_present_value, false),
    };

    tracing::debug!(
        %stated_total,
        %license_present_value,
        %support_present_value,
        %present_value,
        total_months,
        "contract valued"
    );

    Ok(Valuation {
        stated_total,
        total_months,
        monthly_rate,
        license_present_value,
        monthly_support_stated,
        support_present_value,
        present_value,
        overridden,
    })
}

/// Per-period display table. Period i (0-based) is discounted for i + 1
/// years, or for the exact day count to its end date.
pub fn period_analysis(contract: &Contract, config: &Configuration) -> SfcResult<Vec<PvAnalysisRow>> {
    let mut rows = Vec::with_capacity(contract.periods.len());

    for (i, period) in contract.periods.iter().enumerate() {
        let years_discounted = match config.display_discounting {
            DisplayDiscounting::IntegerYears => Decimal::from(i as u32 + 1),
            DisplayDiscounting::ExactDays => {
                let days = (period.end - contract.payment_date).num_days();
                Decimal::from(days) / DAYS_PER_YEAR
            }
        };
        let present_value =
            discount_single(period.stated_amount, config.discount_rate, years_discounted)?;
        let service_midpoint = period.start + (period.end - period.start) / 2;

        rows.push(PvAnalysisRow {
            period: i as u32 + 1,
            start: period.start,
            end: period.end,
            service_midpoint,
            years_discounted,
            stated_amount: period.stated_amount,
            present_value,
            financing_component: period.stated_amount - present_value,
        });
    }

    Ok(rows)
}
