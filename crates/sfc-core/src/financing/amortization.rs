//! Month-by-month unwind of the deferred revenue liability.
//!
//! Two balances are carried: the gross deferred revenue (cash not yet
//! recognized as revenue or interest) and the discount on it, a
//! contra-liability holding the unearned financing component. Their
//! difference is the net carrying liability.
//!
//! Support revenue is recognized straight-line, so the opening net liability
//! falls by the same amount every month. The financing component is unwound
//! in proportion to each month's opening net liability: a constant implied
//! monthly rate `financing_component / Σ opening_net` applied to the net
//! balance. The discount is used up exactly over the term and every month's
//! interest carries the sign of the financing component.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SfcError;
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{Money, Rate};
use crate::SfcResult;

/// Opening position and terms for the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTerms {
    pub payment_date: NaiveDate,
    pub cash_received: Money,
    pub license_revenue: Money,
    pub support_revenue: Money,
    pub financing_component: Money,
    pub total_months: u32,
}

/// A single month of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Month number (1-indexed)
    pub month: u32,
    /// Contract period the month falls in (1-indexed)
    pub period: u32,
    /// Month-end posting date
    pub date: NaiveDate,
    pub opening_deferred_revenue: Money,
    pub opening_contra_liability: Money,
    pub opening_net_liability: Money,
    /// Support revenue recognized this month
    pub support_revenue: Money,
    /// Financing unwound this month
    pub interest_income: Money,
    pub closing_deferred_revenue: Money,
    pub closing_contra_liability: Money,
    pub closing_net_liability: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<AmortizationRow>,
    pub total_support_revenue: Money,
    pub total_interest_income: Money,
    /// Implied monthly rate that unwinds the financing component on the
    /// declining net liability
    pub unwind_rate: Rate,
    /// Final-month interest minus opening net × unwind rate. Decimal
    /// precision residue only.
    pub final_period_true_up: Money,
}

/// Date of month `k` counted from the payment date, clamped to month end.
pub fn month_date(payment_date: NaiveDate, month: u32) -> SfcResult<NaiveDate> {
    payment_date
        .checked_add_months(Months::new(month))
        .ok_or_else(|| {
            SfcError::DateError(format!("{payment_date} + {month} months is out of range"))
        })
}

/// Rate at which interest on the opening net liability sums to the financing
/// component. Opening net in month k is `S - (k - 1) * S / N`, so the
/// balances sum to `S * (N + 1) / 2`.
fn implied_unwind_rate(support_revenue: Money, financing_component: Money, n: u32) -> Rate {
    let weight_total = support_revenue * Decimal::from(n + 1) / Decimal::TWO;
    if weight_total.is_zero() {
        Decimal::ZERO
    } else {
        financing_component / weight_total
    }
}

/// Build the schedule. Balances are never rounded here.
pub fn build_schedule(terms: &ScheduleTerms) -> SfcResult<AmortizationSchedule> {
    let n = terms.total_months;
    if n == 0 {
        return Err(SfcError::InvalidContract {
            field: "periods".into(),
            reason: "Contract term must span at least one month".into(),
        });
    }

    let monthly_support = terms.support_revenue / Decimal::from(n);
    let unwind_rate =
        implied_unwind_rate(terms.support_revenue, terms.financing_component, n);
    // No net balance to weight by: unwind straight-line.
    let level_interest = if unwind_rate.is_zero() {
        terms.financing_component / Decimal::from(n)
    } else {
        Decimal::ZERO
    };

    let mut deferred = terms.cash_received - terms.license_revenue;
    let mut contra = terms.financing_component;
    let mut rows = Vec::with_capacity(n as usize);
    let mut final_period_true_up = Decimal::ZERO;

    for month in 1..=n {
        let opening_deferred = deferred;
        let opening_contra = contra;
        let opening_net = deferred - contra;

        let scheduled_interest = if unwind_rate.is_zero() {
            level_interest
        } else {
            opening_net * unwind_rate
        };
        // The last month absorbs Decimal division residue.
        let (support, interest) = if month == n {
            final_period_true_up = contra - scheduled_interest;
            (opening_net, contra)
        } else {
            (monthly_support, scheduled_interest)
        };

        deferred -= support + interest;
        contra -= interest;

        rows.push(AmortizationRow {
            month,
            period: (month - 1) / MONTHS_PER_YEAR + 1,
            date: month_date(terms.payment_date, month)?,
            opening_deferred_revenue: opening_deferred,
            opening_contra_liability: opening_contra,
            opening_net_liability: opening_net,
            support_revenue: support,
            interest_income: interest,
            closing_deferred_revenue: deferred,
            closing_contra_liability: contra,
            closing_net_liability: deferred - contra,
        });
    }

    let total_support_revenue: Money = rows.iter().map(|r| r.support_revenue).sum();
    let total_interest_income: Money = rows.iter().map(|r| r.interest_income).sum();

    tracing::debug!(
        months = n,
        %unwind_rate,
        %total_support_revenue,
        %total_interest_income,
        %final_period_true_up,
        "amortization schedule built"
    );

    Ok(AmortizationSchedule {
        rows,
        total_support_revenue,
        total_interest_income,
        unwind_rate,
        final_period_true_up,
    })
}
