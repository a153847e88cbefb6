use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// working precision kept on every monetary operation; presentation
/// rounding happens only at the edges via `round_cents`
const WORKING_DP: u32 = 10;

/// Money type with 10 decimal places of working precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(WORKING_DP))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(WORKING_DP)))
    }

    /// create from integer currency units
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// presentation rounding: two places, half-up
    pub fn round_cents(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// check if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// check if strictly negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// absolute value
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// true when within tolerance of the other value
    pub fn approx_eq(&self, other: Money, tolerance: Decimal) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i64> for Money {
    fn from(i: i64) -> Self {
        Money::from_major(i)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(WORKING_DP))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(WORKING_DP);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(WORKING_DP))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(WORKING_DP);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(WORKING_DP))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(WORKING_DP))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// rate type for monthly interest rates and index factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g. 0.015 for 1.5% per month)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g. 1.5 for 1.5% per month)
    pub fn from_percentage(p: Decimal) -> Self {
        Rate(p / dec!(100))
    }

    /// get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0 * dec!(100)
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// annual equivalent of a monthly rate: (1 + r)^12 - 1
    pub fn monthly_to_annual(&self) -> Rate {
        let compounded = (Decimal::ONE + self.0).powu(12);
        Rate(compounded - Decimal::ONE)
    }

    /// monthly equivalent of an annual rate: (1 + r)^(1/12) - 1
    pub fn annual_to_monthly(&self) -> Rate {
        let exponent = Decimal::ONE / dec!(12);
        let root = (Decimal::ONE + self.0).powd(exponent);
        Rate(root - Decimal::ONE)
    }

    /// excess over another rate in percentage points
    pub fn excess_points(&self, other: Rate) -> Decimal {
        self.as_percentage() - other.as_percentage()
    }

    /// excess over another rate as a relative percentage of it
    pub fn excess_relative(&self, other: Rate) -> Decimal {
        if other.0.is_zero() {
            return Decimal::ZERO;
        }
        (self.0 / other.0 - Decimal::ONE) * dec!(100)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_precision() {
        let m = Money::from_str_exact("100.12345678901234").unwrap();
        assert_eq!(m.to_string(), "100.1234567890");
    }

    #[test]
    fn test_presentation_rounding_half_up() {
        let m = Money::from_str_exact("10.005").unwrap();
        assert_eq!(m.round_cents().to_string(), "10.01");

        let n = Money::from_str_exact("-10.005").unwrap();
        assert_eq!(n.round_cents().to_string(), "-10.01");
    }

    #[test]
    fn test_monthly_to_annual() {
        // 1% per month compounds to about 12.68% per year
        let monthly = Rate::from_percentage(dec!(1));
        let annual = monthly.monthly_to_annual();
        assert!(annual.as_percentage() > dec!(12.68));
        assert!(annual.as_percentage() < dec!(12.69));
    }

    #[test]
    fn test_annual_to_monthly_roundtrip() {
        let monthly = Rate::from_percentage(dec!(1.5));
        let back = monthly.monthly_to_annual().annual_to_monthly();
        assert!((back.as_decimal() - monthly.as_decimal()).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_excess_measures() {
        let contracted = Rate::from_percentage(dec!(3));
        let market = Rate::from_percentage(dec!(2));
        assert_eq!(contracted.excess_points(market), dec!(1));
        assert_eq!(contracted.excess_relative(market), dec!(50.00));
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [dec!(1.10), dec!(2.20), dec!(3.30)]
            .into_iter()
            .map(Money::from_decimal)
            .sum();
        assert_eq!(total, Money::from_str_exact("6.60").unwrap());
    }
}
