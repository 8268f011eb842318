use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::SfcError;
use crate::types::{Money, Rate};
use crate::SfcResult;

const NEWTON_ITERATIONS: u32 = 60;
const ROOT_TOLERANCE: Decimal = dec!(0.0000000000000000000001);

/// Months per year used by the monthly compounding convention
pub const MONTHS_PER_YEAR: u32 = 12;

/// Convert an annual effective rate to the equivalent monthly effective rate.
///
/// monthly_rate = (1 + annual_rate)^(1/12) - 1
///
/// The same monthly rate is used to discount support cash flows and to
/// unwind the financing component, so valuation and amortization agree.
pub fn annual_to_monthly_rate(annual_rate: Rate) -> Rate {
    if annual_rate.is_zero() {
        return Decimal::ZERO;
    }
    nth_root(Decimal::ONE + annual_rate, MONTHS_PER_YEAR) - Decimal::ONE
}

/// Newton's method for the nth root of A.
/// x_{k+1} = ((n-1)*x_k + A / x_k^(n-1)) / n
fn nth_root(a: Decimal, n: u32) -> Decimal {
    if a <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if a == Decimal::ONE || n == 1 {
        return a;
    }
    let n_dec = Decimal::from(n);
    let n_minus_1 = n_dec - Decimal::ONE;

    let mut x = a;
    // Better initial guess for values close to 1
    if a > dec!(0.5) && a < dec!(2.0) {
        x = Decimal::ONE + (a - Decimal::ONE) / n_dec;
    }

    for _ in 0..NEWTON_ITERATIONS {
        let x_pow = compound_factor(x - Decimal::ONE, n - 1);
        if x_pow.is_zero() {
            break;
        }
        let x_new = (n_minus_1 * x + a / x_pow) / n_dec;
        if (x_new - x).abs() < ROOT_TOLERANCE {
            return x_new;
        }
        x = x_new;
    }
    x
}

/// (1 + rate)^periods by repeated multiplication.
pub fn compound_factor(rate: Rate, periods: u32) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor *= one_plus_r;
    }
    factor
}

/// Net Present Value of a series of cash flows, the first at t = 0
pub fn npv(rate: Rate, cash_flows: &[Money]) -> SfcResult<Money> {
    if rate <= dec!(-1) {
        return Err(SfcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(SfcError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Present value of a level amount received at the end of each of `nper`
/// periods (ordinary annuity), discounted at `rate` per period.
pub fn pv_level_stream(rate: Rate, nper: u32, amount: Money) -> SfcResult<Money> {
    if rate.is_zero() {
        return Ok(amount * Decimal::from(nper));
    }
    let mut flows = Vec::with_capacity(nper as usize + 1);
    flows.push(Decimal::ZERO);
    flows.extend(std::iter::repeat(amount).take(nper as usize));
    npv(rate, &flows)
}

/// Discount a single amount over a (possibly fractional) number of years at
/// an annual rate.
pub fn discount_single(amount: Money, annual_rate: Rate, years: Decimal) -> SfcResult<Money> {
    if annual_rate <= dec!(-1) {
        return Err(SfcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    if annual_rate.is_zero() || years.is_zero() {
        return Ok(amount);
    }

    let whole_years = if years.fract().is_zero() {
        years.to_u32()
    } else {
        None
    };
    let factor = match whole_years {
        Some(n) => compound_factor(annual_rate, n),
        None => (Decimal::ONE + annual_rate).powd(years),
    };

    if factor.is_zero() {
        return Err(SfcError::DivisionByZero {
            context: "single-sum discount factor".into(),
        });
    }
    Ok(amount / factor)
}
