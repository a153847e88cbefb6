use chrono::NaiveDate;
use log::warn;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::PaymentStatus;

/// one row of a generated amortization table; row 0 is the synthetic
/// Momento Zero disbursement line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationLine {
    pub number: u32,
    pub due_date: NaiveDate,
    pub opening_balance: Money,
    /// monetary correction applied this period, zero when none
    pub correction: Money,
    pub corrected_balance: Money,
    pub interest: Money,
    pub amortization: Money,
    /// unscheduled amortization recorded against this installment
    pub extra_amortization: Money,
    pub closing_balance: Money,
    pub base_installment: Money,
    pub insurance: Money,
    pub admin_fee: Money,
    pub total_installment: Money,
    /// copied from the matching reconciliation entry
    pub status: PaymentStatus,
    pub paid_amount: Option<Money>,
}

impl AmortizationLine {
    /// the synthetic t0 line: balance moves from zero to the principal,
    /// every flow is zero
    pub fn momento_zero(disbursement_date: NaiveDate, principal: Money) -> Self {
        Self {
            number: 0,
            due_date: disbursement_date,
            opening_balance: Money::ZERO,
            correction: Money::ZERO,
            corrected_balance: Money::ZERO,
            interest: Money::ZERO,
            amortization: Money::ZERO,
            extra_amortization: Money::ZERO,
            closing_balance: principal,
            base_installment: Money::ZERO,
            insurance: Money::ZERO,
            admin_fee: Money::ZERO,
            total_installment: Money::ZERO,
            status: PaymentStatus::Pending,
            paid_amount: None,
        }
    }

    /// ancillary charges riding on the base installment
    pub fn charges(&self) -> Money {
        self.insurance + self.admin_fee
    }
}

/// which scenario a table represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// as billed, under the contracted terms
    Contracted,
    /// recomputed under the fair market rate
    Fair,
    /// remaining debt after netting the refund
    PostRefund,
    /// remaining debt after netting the doubled refund
    PostRefundDoubled,
}

/// aggregate totals folded from a table's lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScenarioTotals {
    pub principal: Money,
    pub correction: Money,
    pub interest: Money,
    pub insurance: Money,
    pub fees: Money,
    pub installments: Money,
    /// actually recorded payments over paid and partial lines
    pub paid: Money,
    /// refund netted into this scenario (post-refund projections only)
    pub refund: Money,
    /// closing balance of the final line; what is still owed
    pub outstanding: Money,
}

/// a named scenario table plus its aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub contract_id: Uuid,
    /// appendix code for report rendering (AP01, AP02, ...)
    pub code: String,
    pub kind: ScenarioKind,
    pub rate: Rate,
    pub lines: Vec<AmortizationLine>,
    pub totals: ScenarioTotals,
    /// set when the final balance fails to zero within tolerance; the
    /// table is still returned for review
    pub integrity_warning: Option<String>,
}

impl ScenarioTable {
    /// assemble a table from generated lines, folding totals and
    /// checking the final-balance invariant for amortizing scenarios
    pub fn from_lines(
        contract_id: Uuid,
        code: impl Into<String>,
        kind: ScenarioKind,
        rate: Rate,
        lines: Vec<AmortizationLine>,
        fully_amortizing: bool,
    ) -> Self {
        let code = code.into();
        let totals = fold_totals(&lines);

        let integrity_warning = if fully_amortizing {
            check_final_balance(&code, &lines)
        } else {
            None
        };

        Self {
            contract_id,
            code,
            kind,
            rate,
            lines,
            totals,
            integrity_warning,
        }
    }

    /// installment values excluding the Momento Zero line, for
    /// cashflow-based calculations
    pub fn installment_stream(&self) -> Vec<Money> {
        self.lines
            .iter()
            .filter(|line| line.number > 0)
            .map(|line| line.total_installment)
            .collect()
    }

    /// the highest installment number with PAID status
    pub fn last_paid_number(&self) -> Option<u32> {
        self.lines
            .iter()
            .filter(|line| line.number > 0 && line.status == PaymentStatus::Paid)
            .map(|line| line.number)
            .max()
    }

    /// closing balance after a given installment number
    pub fn balance_after(&self, number: u32) -> Option<Money> {
        self.lines
            .iter()
            .find(|line| line.number == number)
            .map(|line| line.closing_balance)
    }

    pub fn line(&self, number: u32) -> Option<&AmortizationLine> {
        self.lines.iter().find(|line| line.number == number)
    }
}

fn fold_totals(lines: &[AmortizationLine]) -> ScenarioTotals {
    let mut totals = ScenarioTotals::default();
    for line in lines {
        if line.number == 0 {
            totals.principal = line.closing_balance;
            continue;
        }
        totals.correction += line.correction;
        totals.interest += line.interest;
        totals.insurance += line.insurance;
        totals.fees += line.admin_fee;
        totals.installments += line.total_installment;
        if matches!(line.status, PaymentStatus::Paid | PaymentStatus::Partial) {
            totals.paid += line.paid_amount.unwrap_or(line.total_installment);
        }
    }
    if let Some(last) = lines.last() {
        totals.outstanding = last.closing_balance;
    }
    totals
}

/// the final line of a fully amortizing table must close within one
/// cent; a violation points at a rate-precision or date-generation
/// defect and is surfaced, not silently tolerated
fn check_final_balance(code: &str, lines: &[AmortizationLine]) -> Option<String> {
    let last = lines.iter().filter(|line| line.number > 0).next_back()?;
    if last.closing_balance.abs().approx_eq(Money::ZERO, dec!(0.01)) {
        return None;
    }
    let message = format!(
        "{}: final balance {} did not amortize to zero",
        code,
        last.closing_balance.round_cents()
    );
    warn!("{message}");
    Some(message)
}
