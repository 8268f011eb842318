//! Split of the fair-value transaction price between license and support.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueAllocation {
    pub license_revenue: Money,
    pub support_revenue: Money,
}

/// Allocate `present_value` by the configured license percentage.
///
/// Support takes the remainder so the two always sum to `present_value`.
pub fn allocate(present_value: Money, license_pct: Rate) -> RevenueAllocation {
    let license_revenue = present_value * license_pct;
    let support_revenue = present_value - license_revenue;
    RevenueAllocation {
        license_revenue,
        support_revenue,
    }
}

impl RevenueAllocation {
    pub fn total(&self) -> Money {
        self.license_revenue + self.support_revenue
    }

    /// Straight-line support revenue per month of the term.
    pub fn monthly_support_revenue(&self, total_months: u32) -> Money {
        if total_months == 0 {
            return Decimal::ZERO;
        }
        self.support_revenue / Decimal::from(total_months)
    }
}
