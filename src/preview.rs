use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{CalculationInput, LoanData};
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::{gauss_pmt, monthly_interest, pmt};
use crate::types::{AmortizationSystem, Capitalization, PaymentStatus};
use crate::validators;

/// how far above the market the contracted rate sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbuseLevel {
    /// at or below the market rate
    WithinMarket,
    /// above market but under the abuse threshold
    AboveMarket,
    /// beyond market times the threshold multiplier
    Abusive,
}

/// irregularity signals surfaced by a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IrregularityFlags {
    pub daily_capitalization_suspected: bool,
    pub abusive_insurance: bool,
    pub illegal_rate: bool,
    pub irregular_origination_fee: bool,
    pub anatocism_suspected: bool,
}

impl IrregularityFlags {
    pub fn any(&self) -> bool {
        self.daily_capitalization_suspected
            || self.abusive_insurance
            || self.illegal_rate
            || self.irregular_origination_fee
            || self.anatocism_suspected
    }
}

/// lightweight viability summary: a single installment comparison, no
/// full tables, fast enough for interactive use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub viable: bool,
    pub abuse: AbuseLevel,
    pub contracted_rate: Rate,
    pub market_rate: Rate,
    /// excess in percentage points
    pub excess_points: Decimal,
    /// excess relative to the market rate, in percent
    pub excess_relative: Decimal,
    pub original_installment: Money,
    pub recalculated_installment: Money,
    pub savings_per_installment: Money,
    pub paid_installments: u32,
    /// savings projected over the installments already paid
    pub estimated_refund: Money,
    pub estimated_refund_doubled: Money,
    pub flags: IrregularityFlags,
}

/// classify the contracted rate against market times the threshold
pub fn classify_abuse(contracted: Rate, market: Rate, threshold: Decimal) -> AbuseLevel {
    if contracted <= market {
        return AbuseLevel::WithinMarket;
    }
    if contracted.as_decimal() > market.as_decimal() * threshold {
        return AbuseLevel::Abusive;
    }
    AbuseLevel::AboveMarket
}

/// first-installment value under the given system
fn representative_installment(
    principal: Money,
    rate: Rate,
    installments: u32,
    system: AmortizationSystem,
) -> Money {
    match system {
        AmortizationSystem::Price => pmt(principal, rate, installments),
        AmortizationSystem::Gauss => gauss_pmt(principal, rate, installments),
        AmortizationSystem::Sac => {
            principal / Decimal::from(installments) + monthly_interest(principal, rate)
        }
        AmortizationSystem::Sacre => {
            let payment_rate = Decimal::ONE / Decimal::from(installments) + rate.as_decimal();
            principal * payment_rate
        }
    }
}

/// run the fast viability check over a validated input
pub fn build_preview(input: &CalculationInput) -> Result<PreviewResult> {
    input.validate()?;
    let market = input.market_rate()?;

    let original = representative_installment(
        input.principal,
        input.monthly_rate,
        input.installments,
        input.system,
    );
    let recalculated = representative_installment(
        input.principal,
        market,
        input.installments,
        input.system,
    );
    let savings = (original - recalculated).max(Money::ZERO);

    let paid_installments = input
        .payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .count() as u32;
    let estimated_refund = savings * Decimal::from(paid_installments);

    let abuse = classify_abuse(input.monthly_rate, market, input.policy.abuse_threshold);

    let daily_capitalization_suspected =
        validators::detect_daily_capitalization(input.monthly_rate, input.yearly_rate).is_some();

    let (irregular_origination_fee, abusive_insurance) = match &input.loan_data {
        LoanData::Consumer(data) => (
            validators::check_origination_fee(data.origination_fee, input.contract_date).is_some(),
            !validators::check_insurance_consent(&data.insurance).is_empty(),
        ),
        _ => (false, false),
    };

    let flags = IrregularityFlags {
        daily_capitalization_suspected,
        abusive_insurance,
        illegal_rate: abuse == AbuseLevel::Abusive,
        irregular_origination_fee,
        anatocism_suspected: daily_capitalization_suspected
            || input.capitalization == Capitalization::Daily,
    };

    Ok(PreviewResult {
        viable: abuse == AbuseLevel::Abusive || flags.any(),
        abuse,
        contracted_rate: input.monthly_rate,
        market_rate: market,
        excess_points: input.monthly_rate.excess_points(market),
        excess_relative: input.monthly_rate.excess_relative(market),
        original_installment: original,
        recalculated_installment: recalculated,
        savings_per_installment: savings,
        paid_installments,
        estimated_refund,
        estimated_refund_doubled: estimated_refund * dec!(2),
        flags,
    })
}
