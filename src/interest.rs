use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};

/// interest for one monthly period: balance * rate
pub fn monthly_interest(balance: Money, monthly_rate: Rate) -> Money {
    Money::from_decimal(balance.as_decimal() * monthly_rate.as_decimal())
}

/// interest over an arbitrary number of elapsed days, compounding the
/// monthly rate on an actual/30 basis: balance * ((1 + r)^(days/30) - 1)
///
/// banks sometimes embed daily compounding inside an advertised monthly
/// rate; generating the contracted table with the actual day count is
/// what makes that visible against the flat monthly table
pub fn daily_interest(balance: Money, monthly_rate: Rate, days: i64) -> Money {
    if days <= 0 {
        return Money::ZERO;
    }
    let exponent = Decimal::from(days) / dec!(30);
    let factor = (Decimal::ONE + monthly_rate.as_decimal()).powd(exponent);
    Money::from_decimal(balance.as_decimal() * (factor - Decimal::ONE))
}

/// standard annuity payment: principal * r / (1 - (1 + r)^-n)
///
/// a zero rate degrades to straight division
pub fn pmt(principal: Money, monthly_rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return principal;
    }
    let r = monthly_rate.as_decimal();
    if r.is_zero() {
        return principal / Decimal::from(periods);
    }
    let compound = (Decimal::ONE + r).powu(periods as u64);
    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;
    Money::from_decimal(numerator / denominator)
}

/// simple-interest level payment (Gauss method):
/// principal / sum(1 / (1 + r*k)) for k in 1..=n
pub fn gauss_pmt(principal: Money, monthly_rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return principal;
    }
    let r = monthly_rate.as_decimal();
    if r.is_zero() {
        return principal / Decimal::from(periods);
    }
    let mut weight_sum = Decimal::ZERO;
    for k in 1..=periods {
        weight_sum += Decimal::ONE / (Decimal::ONE + r * Decimal::from(k));
    }
    Money::from_decimal(principal.as_decimal() / weight_sum)
}

/// the simple-discounted amortization slice of a Gauss payment at
/// period k: payment / (1 + r*k); the slices sum exactly to principal
pub fn gauss_amortization(payment: Money, monthly_rate: Rate, period: u32) -> Money {
    let divisor = Decimal::ONE + monthly_rate.as_decimal() * Decimal::from(period);
    payment / divisor
}
