//! Financing component and the 5% materiality test.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SfcError;
use crate::types::{Money, Rate};
use crate::SfcResult;

/// Financing is significant when it exceeds 5% of cash received, in either
/// direction.
pub const SIGNIFICANCE_THRESHOLD: Rate = dec!(0.05);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingAssessment {
    /// cash_received - present_value (negative for a premium)
    pub financing_component: Money,
    /// financing_component / cash_received
    pub financing_percentage: Rate,
    pub is_significant: bool,
}

/// Compute the financing component and test it for significance.
pub fn evaluate(cash_received: Money, present_value: Money) -> SfcResult<FinancingAssessment> {
    if cash_received.is_zero() {
        return Err(SfcError::DegenerateConfiguration {
            field: "cash_received".into(),
            reason: "Cash received is zero; financing percentage is undefined".into(),
        });
    }

    let financing_component = cash_received - present_value;
    let financing_percentage = financing_component / cash_received;
    let is_significant = financing_percentage.abs() > SIGNIFICANCE_THRESHOLD;

    Ok(FinancingAssessment {
        financing_component,
        financing_percentage,
        is_significant,
    })
}

impl FinancingAssessment {
    pub fn is_premium(&self) -> bool {
        self.financing_component < Decimal::ZERO
    }
}
