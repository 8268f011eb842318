//! End-to-end ASC 606 significant financing component analysis.
//!
//! Pipeline: validate -> value (monthly PV) -> significance test ->
//! allocate -> amortization schedule -> journal entries -> reconciliation.
//! Every stage is a pure function of the contract and configuration.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::financing::allocation::allocate;
use crate::financing::amortization::{build_schedule, AmortizationRow, ScheduleTerms};
use crate::financing::contract::{
    validate_configuration, validate_contract, AnalyzeRequest, Configuration, Contract,
};
use crate::financing::journal::{
    account_net_credit, generate_entries, Account, JournalEntry, JournalTerms,
};
use crate::financing::present_value::{period_analysis, value_contract, PvAnalysisRow};
use crate::financing::significance::evaluate;
use crate::time_value::annual_to_monthly_rate;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::SfcResult;

/// Cash that ends up neither in revenue nor in interest beyond this many
/// cents is reported as a warning.
const RECONCILIATION_TOLERANCE_CENTS: i64 = 3;

/// Journal totals tied back to cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub license_revenue: Money,
    pub support_revenue: Money,
    pub interest_income: Money,
    pub total_recognized: Money,
    pub cash_received: Money,
    /// cash_received - total_recognized, in posted cents
    pub difference: Money,
}

/// Complete analysis output. Derived once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub customer: String,
    pub stated_total: Money,
    pub cash_received: Money,
    /// Fair-value transaction price
    pub present_value: Money,
    pub license_present_value: Money,
    pub support_present_value: Money,
    pub present_value_overridden: bool,
    pub financing_component: Money,
    pub financing_percentage: Rate,
    pub is_significant: bool,
    pub license_revenue: Money,
    pub support_revenue: Money,
    pub discount_rate: Rate,
    /// Monthly equivalent of the discount rate, used for valuation
    pub monthly_rate: Rate,
    /// Implied monthly rate unwinding the financing component on the net
    /// liability
    pub unwind_rate: Rate,
    pub total_months: u32,
    pub monthly_support_revenue: Money,
    /// Display-only per-period discounting at the annual rate
    pub pv_analysis: Vec<PvAnalysisRow>,
    pub amortization_schedule: Vec<AmortizationRow>,
    pub final_period_true_up: Money,
    pub journal_entries: Vec<JournalEntry>,
    pub reconciliation: Reconciliation,
    pub warnings: Vec<String>,
}

/// Run the full analysis. Deterministic: identical inputs give identical
/// output.
pub fn analyze(contract: &Contract, config: &Configuration) -> SfcResult<AnalysisResult> {
    let mut warnings = validate_contract(contract)?;
    warnings.extend(validate_configuration(config)?);

    let monthly_rate = annual_to_monthly_rate(config.discount_rate);
    let valuation = value_contract(contract, config, monthly_rate)?;
    let assessment = evaluate(contract.cash_received, valuation.present_value)?;
    let allocation = allocate(valuation.present_value, config.license_pct);

    if assessment.is_significant {
        tracing::debug!(
            financing_percentage = %assessment.financing_percentage,
            "financing component is significant"
        );
    }
    if assessment.is_premium() {
        warnings.push(format!(
            "Present value ({}) exceeds cash received ({}); the financing component is a premium",
            round_cents(valuation.present_value),
            round_cents(contract.cash_received)
        ));
    }

    let schedule = build_schedule(&ScheduleTerms {
        payment_date: contract.payment_date,
        cash_received: contract.cash_received,
        license_revenue: allocation.license_revenue,
        support_revenue: allocation.support_revenue,
        financing_component: assessment.financing_component,
        total_months: valuation.total_months,
    })?;

    let journal_entries = generate_entries(
        &JournalTerms {
            customer: &contract.customer,
            payment_date: contract.payment_date,
            cash_received: contract.cash_received,
            financing_component: assessment.financing_component,
            license_revenue: allocation.license_revenue,
            support_revenue: allocation.support_revenue,
        },
        &schedule,
    );

    let reconciliation = reconcile(&journal_entries, contract.cash_received);
    if reconciliation.difference.abs() > Decimal::new(RECONCILIATION_TOLERANCE_CENTS, 2) {
        warnings.push(format!(
            "Recognized revenue and interest differ from cash received by {}",
            reconciliation.difference
        ));
    }

    for w in &warnings {
        tracing::warn!(customer = %contract.customer, "{w}");
    }

    let pv_analysis = period_analysis(contract, config)?;

    Ok(AnalysisResult {
        customer: contract.customer.clone(),
        stated_total: valuation.stated_total,
        cash_received: contract.cash_received,
        present_value: valuation.present_value,
        license_present_value: valuation.license_present_value,
        support_present_value: valuation.support_present_value,
        present_value_overridden: valuation.overridden,
        financing_component: assessment.financing_component,
        financing_percentage: assessment.financing_percentage,
        is_significant: assessment.is_significant,
        license_revenue: allocation.license_revenue,
        support_revenue: allocation.support_revenue,
        discount_rate: config.discount_rate,
        monthly_rate,
        unwind_rate: schedule.unwind_rate,
        total_months: valuation.total_months,
        monthly_support_revenue: allocation.monthly_support_revenue(valuation.total_months),
        pv_analysis,
        amortization_schedule: schedule.rows,
        final_period_true_up: schedule.final_period_true_up,
        journal_entries,
        reconciliation,
        warnings,
    })
}

/// Analyze a boundary request and wrap the result in the standard envelope.
pub fn analyze_contract(
    request: &AnalyzeRequest,
) -> SfcResult<ComputationOutput<AnalysisResult>> {
    let start = Instant::now();
    let (contract, config) = request.clone().into_parts()?;

    let result = analyze(&contract, &config)?;
    let warnings = result.warnings.clone();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "ASC 606 significant financing component: monthly PV, effective interest unwind",
        &config,
        warnings,
        elapsed,
        result,
    ))
}

fn reconcile(entries: &[JournalEntry], cash_received: Money) -> Reconciliation {
    let license_revenue = account_net_credit(entries, Account::LicenseRevenue);
    let support_revenue = account_net_credit(entries, Account::SupportRevenue);
    let interest_income = account_net_credit(entries, Account::InterestIncome);
    let total_recognized = license_revenue + support_revenue + interest_income;
    Reconciliation {
        license_revenue,
        support_revenue,
        interest_income,
        total_recognized,
        cash_received,
        difference: round_cents(cash_received) - total_recognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SfcError;
    use crate::financing::contract::Period;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contract(years: i32, annual: Money, cash: Money) -> Contract {
        Contract {
            customer: "Acme Corp".to_string(),
            cash_received: cash,
            payment_date: date(2026, 1, 15),
            periods: (0..years)
                .map(|i| Period {
                    start: date(2026 + i, 1, 15),
                    end: date(2027 + i, 1, 14),
                    stated_amount: annual,
                })
                .collect(),
        }
    }

    #[test]
    fn test_five_year_contract_is_significant() {
        let c = contract(5, dec!(300000), dec!(1500000));
        let r = analyze(&c, &Configuration::default()).unwrap();
        assert!(r.present_value < r.stated_total);
        assert!(r.financing_component > Decimal::ZERO);
        assert!(r.is_significant);
        // ≈ 1,338,476.43 by monthly discounting
        assert!((r.present_value - dec!(1338476.43)).abs() < dec!(0.01), "pv {}", r.present_value);
        assert_eq!(r.license_revenue + r.support_revenue, r.present_value);
    }

    #[test]
    fn test_reconciliation_ties_to_cash() {
        let c = contract(5, dec!(300000), dec!(1500000));
        let r = analyze(&c, &Configuration::default()).unwrap();
        assert!(r.reconciliation.difference.abs() <= dec!(0.03));
        assert!(r.warnings.is_empty(), "warnings: {:?}", r.warnings);
    }

    #[test]
    fn test_premium_warns() {
        let c = contract(2, dec!(300000), dec!(500000));
        let r = analyze(&c, &Configuration::default()).unwrap();
        assert!(r.financing_component < Decimal::ZERO);
        assert!(r.warnings.iter().any(|w| w.contains("premium")));
        for e in &r.journal_entries {
            assert!(e.is_balanced());
        }
    }

    #[test]
    fn test_zero_cash_is_degenerate() {
        let c = contract(1, dec!(300000), Decimal::ZERO);
        let err = analyze(&c, &Configuration::default()).unwrap_err();
        assert!(matches!(err, SfcError::DegenerateConfiguration { .. }));
    }

    #[test]
    fn test_envelope_carries_warnings() {
        let c = contract(1, dec!(300000), dec!(400000));
        let request = AnalyzeRequest {
            contract_data: Some(c),
            ..Default::default()
        };
        let out = analyze_contract(&request).unwrap();
        assert!(!out.warnings.is_empty());
        assert_eq!(out.warnings, out.result.warnings);
        assert_eq!(out.assumptions["discount_rate"], "0.06");
    }

    #[test]
    fn test_envelope_missing_contract() {
        let err = analyze_contract(&AnalyzeRequest::default()).unwrap_err();
        assert!(matches!(err, SfcError::MissingInput(_)));
        assert!(err.is_client_error());
    }
}
