use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};

/// residual tolerance for the root search
const TOLERANCE: Decimal = dec!(0.00000001);
/// iteration cap; exhaustion is an explicit failure, never an
/// unconverged estimate
const MAX_ITERATIONS: u32 = 100;

/// solve for the monthly effective-cost rate r that equates the net
/// disbursement with the discounted installment stream:
///
///   net_principal = sum(installment_k / (1 + r)^k)
///
/// `net_principal` is the principal minus upfront fees, so added fees
/// raise the solved rate while the installments stay fixed. degenerate
/// cashflows (total paid at or below the amount borrowed) converge to
/// zero instead of erroring.
pub fn solve_cet(net_principal: Money, installments: &[Money], seed: Rate) -> Result<Rate> {
    if !net_principal.is_positive() {
        return Err(EngineError::InvalidInput {
            message: format!(
                "net principal must be positive to solve cet, got {net_principal}"
            ),
        });
    }
    if installments.is_empty() {
        return Err(EngineError::InvalidInput {
            message: "cannot solve cet over an empty installment stream".to_string(),
        });
    }

    let total: Money = installments.iter().copied().sum();
    if total <= net_principal {
        // no interest embedded in the stream
        return Ok(Rate::ZERO);
    }

    let target = net_principal.as_decimal();
    let mut rate = seed.as_decimal().max(dec!(0.0001));

    for _ in 0..MAX_ITERATIONS {
        let (npv, dnpv) = residual_and_derivative(rate, installments, target);

        if npv.abs() < TOLERANCE {
            return Ok(Rate::from_decimal(rate.max(Decimal::ZERO)));
        }
        if dnpv.is_zero() {
            break;
        }

        rate -= npv / dnpv;

        // keep newton inside the economically meaningful region
        if rate <= dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(10) {
            rate = dec!(10);
        }
    }

    bisect(installments, target)
}

/// npv residual and its derivative at the given rate, accumulated with
/// iterative discount factors
fn residual_and_derivative(rate: Decimal, installments: &[Money], target: Decimal) -> (Decimal, Decimal) {
    // discount factors outside this window contribute nothing but can
    // overflow decimal arithmetic on long schedules
    let floor = dec!(0.000000000001);
    let ceiling = dec!(100000000000000000000);

    let one_plus_r = Decimal::ONE + rate;
    let mut npv = -target;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (i, installment) in installments.iter().enumerate() {
        discount *= one_plus_r;
        if discount <= floor || discount >= ceiling {
            break;
        }
        let k = Decimal::from(i as u64 + 1);
        npv += installment.as_decimal() / discount;
        dnpv -= k * installment.as_decimal() / (discount * one_plus_r);
    }

    (npv, dnpv)
}

/// bisection fallback over [0, hi]; the residual is strictly
/// decreasing in the rate, so a sign change brackets the root
fn bisect(installments: &[Money], target: Decimal) -> Result<Rate> {
    let mut lo = Decimal::ZERO;
    let mut hi = dec!(1);

    // expand until the residual goes negative
    let mut expansions = 0;
    while residual(hi, installments, target) > Decimal::ZERO {
        hi *= dec!(2);
        expansions += 1;
        if expansions > 16 {
            return Err(EngineError::CetNonConvergence {
                iterations: MAX_ITERATIONS,
            });
        }
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let r = residual(mid, installments, target);

        if r.abs() < TOLERANCE {
            return Ok(Rate::from_decimal(mid));
        }
        if r > Decimal::ZERO {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Err(EngineError::CetNonConvergence {
        iterations: MAX_ITERATIONS,
    })
}

fn residual(rate: Decimal, installments: &[Money], target: Decimal) -> Decimal {
    residual_and_derivative(rate, installments, target).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interest::pmt;

    #[test]
    fn test_recovers_the_nominal_rate_without_fees() {
        // with no fees the cet equals the contracted rate
        let principal = Money::from_major(10_000);
        let rate = Rate::from_percentage(dec!(2));
        let installment = pmt(principal, rate, 24);
        let stream = vec![installment; 24];

        let cet = solve_cet(principal, &stream, Rate::from_percentage(dec!(1))).unwrap();
        assert!((cet.as_decimal() - rate.as_decimal()).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_interest_stream_converges_to_zero() {
        let principal = Money::from_major(12_000);
        let stream = vec![Money::from_major(1_000); 12];

        let cet = solve_cet(principal, &stream, Rate::from_percentage(dec!(2))).unwrap();
        assert_eq!(cet, Rate::ZERO);
    }

    #[test]
    fn test_upfront_fees_raise_the_cet() {
        let principal = Money::from_major(10_000);
        let rate = Rate::from_percentage(dec!(2));
        let installment = pmt(principal, rate, 24);
        let stream = vec![installment; 24];

        let without_fees = solve_cet(principal, &stream, rate).unwrap();
        let with_fees =
            solve_cet(principal - Money::from_major(500), &stream, rate).unwrap();
        let with_more_fees =
            solve_cet(principal - Money::from_major(1_000), &stream, rate).unwrap();

        assert!(with_fees > without_fees);
        assert!(with_more_fees > with_fees);
    }

    #[test]
    fn test_long_schedule_converges() {
        let principal = Money::from_major(300_000);
        let rate = Rate::from_percentage(dec!(0.8));
        let installment = pmt(principal, rate, 360);
        let stream = vec![installment; 360];

        let cet = solve_cet(principal, &stream, rate).unwrap();
        assert!((cet.as_decimal() - rate.as_decimal()).abs() < dec!(0.00001));
    }

    #[test]
    fn test_non_positive_principal_is_rejected() {
        let err = solve_cet(Money::ZERO, &[Money::from_major(100)], Rate::ZERO).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_empty_stream_is_rejected() {
        let err = solve_cet(Money::from_major(100), &[], Rate::ZERO).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }
}
