use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{InsuranceItem, LateCharges};
use crate::decimal::{Money, Rate};
use crate::types::{Finding, FindingCode};

/// relative tolerance before a stated yearly rate is treated as
/// evidence of undisclosed daily compounding
pub const CAPITALIZATION_TOLERANCE: Decimal = dec!(0.015);

/// TAC/TEC origination fees are legal only up to this contract date
pub fn origination_fee_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2008, 4, 30).expect("valid cutoff date")
}

/// origination-fee legality by contract date: a non-zero fee contracted
/// strictly after the cutoff is irregular; zero fees are always legal
pub fn check_origination_fee(fee: Money, contract_date: NaiveDate) -> Option<Finding> {
    if !fee.is_positive() {
        return None;
    }
    if contract_date <= origination_fee_cutoff() {
        return None;
    }
    let finding = Finding::with_amount(
        FindingCode::IrregularOriginationFee,
        format!(
            "origination fee of {} charged on {}, after the {} cutoff",
            fee.round_cents(),
            contract_date,
            origination_fee_cutoff()
        ),
        fee,
    );
    warn!("{}", finding.description);
    Some(finding)
}

/// insurance items charged without express consent ("venda casada");
/// returns one finding per irregular item
pub fn check_insurance_consent(items: &[InsuranceItem]) -> Vec<Finding> {
    items
        .iter()
        .filter(|item| !item.consented && item.value.is_positive())
        .map(|item| {
            let finding = Finding::with_amount(
                FindingCode::InsuranceWithoutConsent,
                format!(
                    "insurance '{}' of {} charged without consent",
                    item.name,
                    item.value.round_cents()
                ),
                item.value,
            );
            warn!("{}", finding.description);
            finding
        })
        .collect()
}

/// permanencia may not be stacked with moratorium interest or penalty
/// in the same period; either side alone is legal
pub fn check_late_charge_cumulation(charges: &LateCharges) -> Option<Finding> {
    if !charges.permanencia.is_positive() {
        return None;
    }
    if !charges.moratorium_interest.is_positive() && !charges.penalty.is_positive() {
        return None;
    }
    let stacked = charges.moratorium_interest + charges.penalty;
    let finding = Finding::with_amount(
        FindingCode::LateChargeCumulation,
        format!(
            "permanencia of {} cumulated with {} in moratorium interest and penalty",
            charges.permanencia.round_cents(),
            stacked.round_cents()
        ),
        stacked,
    );
    warn!("{}", finding.description);
    Some(finding)
}

/// a stated yearly rate above the monthly rate's annual equivalent is
/// the signature of daily compounding hidden inside an advertised
/// monthly rate
pub fn detect_daily_capitalization(monthly: Rate, stated_yearly: Rate) -> Option<Finding> {
    let equivalent = monthly.monthly_to_annual().as_decimal();
    if equivalent.is_zero() {
        return None;
    }
    let ceiling = equivalent * (Decimal::ONE + CAPITALIZATION_TOLERANCE);
    if stated_yearly.as_decimal() <= ceiling {
        return None;
    }
    let finding = Finding::new(
        FindingCode::DailyCapitalizationSuspected,
        format!(
            "stated yearly rate {} exceeds the monthly equivalent {}; daily capitalization suspected",
            stated_yearly,
            Rate::from_decimal(equivalent)
        ),
    );
    warn!("{}", finding.description);
    Some(finding)
}
