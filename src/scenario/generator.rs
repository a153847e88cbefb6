use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::dates::{add_months, days_between};
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::interest::{daily_interest, gauss_amortization, gauss_pmt, monthly_interest, pmt};
use crate::scenario::table::AmortizationLine;
use crate::types::{AmortizationSystem, Capitalization, PaymentRecord, PaymentStatus};

/// manual per-installment correction for expert reports; absent fields
/// keep the computed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineOverride {
    pub number: u32,
    pub correction_factor: Option<Decimal>,
    pub insurance: Option<Money>,
    pub admin_fee: Option<Money>,
    pub total_installment: Option<Money>,
}

/// everything the shared generator needs to produce one table
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub principal: Money,
    pub rate: Rate,
    pub installments: u32,
    pub system: AmortizationSystem,
    pub capitalization: Capitalization,
    pub disbursement_date: NaiveDate,
    pub first_due_date: NaiveDate,
    /// reconciliation entries merged into the lines; read-only
    pub payments: Vec<PaymentRecord>,
    /// per-installment correction factors (index k-1); empty means no
    /// monetary correction
    pub correction_factors: Vec<Decimal>,
    /// MIP insurance rate over the corrected balance
    pub mip_rate: Rate,
    /// DFI insurance per period (rate over property value, precomputed)
    pub dfi_per_period: Money,
    /// fixed administration fee per period
    pub admin_fee: Money,
    /// interest-only periods before amortization starts
    pub grace_months: u32,
    pub overrides: Vec<LineOverride>,
}

impl ScheduleSpec {
    pub fn new(
        principal: Money,
        rate: Rate,
        installments: u32,
        disbursement_date: NaiveDate,
        first_due_date: NaiveDate,
    ) -> Self {
        Self {
            principal,
            rate,
            installments,
            system: AmortizationSystem::Price,
            capitalization: Capitalization::Monthly,
            disbursement_date,
            first_due_date,
            payments: Vec::new(),
            correction_factors: Vec::new(),
            mip_rate: Rate::ZERO,
            dfi_per_period: Money::ZERO,
            admin_fee: Money::ZERO,
            grace_months: 0,
            overrides: Vec::new(),
        }
    }

    fn record_for(&self, number: u32) -> Option<&PaymentRecord> {
        self.payments
            .iter()
            .find(|p| p.installment_number == number)
    }

    fn override_for(&self, number: u32) -> Option<&LineOverride> {
        self.overrides.iter().find(|o| o.number == number)
    }
}

/// generate a full amortization table, Momento Zero included
///
/// the running balance is threaded through the fold; each period
/// applies monetary correction first, interest on the corrected
/// balance, then the system's amortization slice and any recorded
/// extra amortization
pub fn generate_table(spec: &ScheduleSpec) -> Result<Vec<AmortizationLine>> {
    if spec.installments == 0 {
        return Err(EngineError::InvalidInput {
            message: "installment count must be positive".to_string(),
        });
    }
    if spec.grace_months >= spec.installments {
        return Err(EngineError::InvalidInput {
            message: "grace period consumes the whole term".to_string(),
        });
    }

    let amortizing = spec.installments - spec.grace_months;
    let level_payment = match spec.system {
        AmortizationSystem::Price => pmt(spec.principal, spec.rate, amortizing),
        AmortizationSystem::Gauss => gauss_pmt(spec.principal, spec.rate, amortizing),
        _ => Money::ZERO,
    };
    let sac_slice = spec.principal / Decimal::from(amortizing);

    let mut lines = Vec::with_capacity(spec.installments as usize + 1);
    lines.push(AmortizationLine::momento_zero(
        spec.disbursement_date,
        spec.principal,
    ));

    let mut balance = spec.principal;
    let mut sacre_payment = Money::ZERO;
    let mut prev_due = spec.disbursement_date;

    for number in 1..=spec.installments {
        let due_date = add_months(spec.first_due_date, number - 1);
        let record = spec.record_for(number);
        let line_override = spec.override_for(number);

        let status = record.map(|r| r.status).unwrap_or(PaymentStatus::Pending);
        let paid_amount = record.and_then(|r| r.paid_amount);
        let extra = record
            .map(|r| r.extra_amortization)
            .unwrap_or(Money::ZERO);

        if balance.is_zero() {
            // settled early by extra amortization; the schedule keeps
            // its length with inactive lines
            lines.push(AmortizationLine {
                number,
                due_date,
                opening_balance: Money::ZERO,
                correction: Money::ZERO,
                corrected_balance: Money::ZERO,
                interest: Money::ZERO,
                amortization: Money::ZERO,
                extra_amortization: Money::ZERO,
                closing_balance: Money::ZERO,
                base_installment: Money::ZERO,
                insurance: Money::ZERO,
                admin_fee: Money::ZERO,
                total_installment: Money::ZERO,
                status,
                paid_amount,
            });
            prev_due = due_date;
            continue;
        }

        let factor = line_override
            .and_then(|o| o.correction_factor)
            .or_else(|| spec.correction_factors.get(number as usize - 1).copied())
            .unwrap_or(Decimal::ONE);
        let corrected_balance = balance * factor;
        let correction = corrected_balance - balance;

        let elapsed = days_between(prev_due, due_date);
        let mut interest = match spec.capitalization {
            Capitalization::Monthly => monthly_interest(corrected_balance, spec.rate),
            Capitalization::Daily => daily_interest(corrected_balance, spec.rate, elapsed),
        };

        let in_grace = number <= spec.grace_months;
        let amort_index = number.saturating_sub(spec.grace_months);

        let (mut base_installment, mut amortization) = if in_grace {
            (interest, Money::ZERO)
        } else {
            match spec.system {
                AmortizationSystem::Price => (level_payment, level_payment - interest),
                AmortizationSystem::Sac => (sac_slice + interest, sac_slice),
                AmortizationSystem::Sacre => {
                    // payment recomputed at the start of every
                    // 12-installment block from the corrected balance
                    if (amort_index - 1) % 12 == 0 {
                        let remaining = Decimal::from(amortizing - amort_index + 1);
                        let payment_rate = Decimal::ONE / remaining + spec.rate.as_decimal();
                        sacre_payment = corrected_balance * payment_rate;
                    }
                    (sacre_payment, sacre_payment - interest)
                }
                AmortizationSystem::Gauss => {
                    let slice = gauss_amortization(level_payment, spec.rate, amort_index);
                    // simple-interest decomposition of the level payment
                    interest = level_payment - slice;
                    (level_payment, slice)
                }
            }
        };

        // never amortize past the outstanding balance
        let unclamped = amortization;
        amortization = amortization.min((corrected_balance - extra).max(Money::ZERO));
        if amortization < unclamped {
            base_installment = interest + amortization;
        }

        let insurance = line_override.and_then(|o| o.insurance).unwrap_or_else(|| {
            monthly_interest(corrected_balance, spec.mip_rate) + spec.dfi_per_period
        });
        let admin_fee = line_override
            .and_then(|o| o.admin_fee)
            .unwrap_or(spec.admin_fee);

        let mut total_installment = base_installment + insurance + admin_fee;
        if let Some(total) = line_override.and_then(|o| o.total_installment) {
            // a manual total reshapes the whole line
            total_installment = total;
            base_installment = total - insurance - admin_fee;
            amortization = base_installment - interest;
        }

        // extra amortization beyond the outstanding balance settles the
        // debt; it cannot drive the balance negative
        let mut closing_balance = (corrected_balance - amortization - extra).max(Money::ZERO);

        // fold sub-cent rounding residue into the final installment;
        // anything larger stays visible for the integrity check
        if number == spec.installments
            && !closing_balance.is_zero()
            && closing_balance.abs() <= Money::from_decimal(dec!(0.01))
        {
            amortization += closing_balance;
            base_installment += closing_balance;
            total_installment += closing_balance;
            closing_balance = Money::ZERO;
        }

        lines.push(AmortizationLine {
            number,
            due_date,
            opening_balance: balance,
            correction,
            corrected_balance,
            interest,
            amortization,
            extra_amortization: extra,
            closing_balance,
            base_installment,
            insurance,
            admin_fee,
            total_installment,
            status,
            paid_amount,
        });

        balance = closing_balance;
        prev_due = due_date;
    }

    Ok(lines)
}
