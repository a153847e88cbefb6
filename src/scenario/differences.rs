use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::scenario::table::ScenarioTable;
use crate::types::PaymentStatus;

/// one row of the differences table: the contracted line confronted
/// with its fair counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceLine {
    pub number: u32,
    pub due_date: NaiveDate,
    pub contracted_interest: Money,
    pub fair_interest: Money,
    pub contracted_installment: Money,
    pub fair_installment: Money,
    /// signed: positive means the borrower was overcharged
    pub difference: Money,
    /// status of the contracted line
    pub status: PaymentStatus,
    /// running refund over paid lines up to and including this one
    pub accumulated_refund: Money,
}

/// aggregates for the differences table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DifferenceTotals {
    pub contracted: Money,
    pub fair: Money,
    pub difference: Money,
    /// the indebito: differences accumulated over PAID lines only;
    /// unpaid installments have not been overpaid yet
    pub total_refund: Money,
}

/// the AP03 confrontation between contracted and fair tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceTable {
    pub contract_id: Uuid,
    pub code: String,
    pub lines: Vec<DifferenceLine>,
    pub totals: DifferenceTotals,
}

/// pairwise subtraction of two tables generated over the same term
pub fn build_differences(
    code: impl Into<String>,
    contracted: &ScenarioTable,
    fair: &ScenarioTable,
) -> Result<DifferenceTable> {
    if contracted.lines.len() != fair.lines.len() {
        return Err(EngineError::CalculationError {
            message: format!(
                "cannot confront tables of different lengths: {} vs {}",
                contracted.lines.len(),
                fair.lines.len()
            ),
        });
    }

    let mut lines = Vec::with_capacity(contracted.lines.len().saturating_sub(1));
    let mut totals = DifferenceTotals::default();
    let mut accumulated_refund = Money::ZERO;

    for (billed, recalculated) in contracted.lines.iter().zip(&fair.lines) {
        if billed.number == 0 {
            continue;
        }
        let difference = billed.total_installment - recalculated.total_installment;

        totals.contracted += billed.total_installment;
        totals.fair += recalculated.total_installment;
        totals.difference += difference;
        if billed.status == PaymentStatus::Paid {
            accumulated_refund += difference;
        }

        lines.push(DifferenceLine {
            number: billed.number,
            due_date: billed.due_date,
            contracted_interest: billed.interest,
            fair_interest: recalculated.interest,
            contracted_installment: billed.total_installment,
            fair_installment: recalculated.total_installment,
            difference,
            status: billed.status,
            accumulated_refund,
        });
    }

    totals.total_refund = accumulated_refund;

    Ok(DifferenceTable {
        contract_id: contracted.contract_id,
        code: code.into(),
        lines,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::scenario::generator::{generate_table, ScheduleSpec};
    use crate::scenario::table::ScenarioKind;
    use crate::types::{AmortizationSystem, PaymentRecord};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn paid(number: u32) -> PaymentRecord {
        PaymentRecord {
            installment_number: number,
            due_date: d(2024, number + 1, 10),
            status: PaymentStatus::Paid,
            paid_date: Some(d(2024, number + 1, 10)),
            paid_amount: None,
            extra_amortization: Money::ZERO,
        }
    }

    fn table_at(rate: Rate, payments: Vec<PaymentRecord>, kind: ScenarioKind) -> ScenarioTable {
        let mut spec = ScheduleSpec::new(
            Money::from_major(12_000),
            rate,
            10,
            d(2024, 1, 10),
            d(2024, 2, 10),
        );
        spec.system = AmortizationSystem::Price;
        spec.payments = payments;
        let lines = generate_table(&spec).unwrap();
        ScenarioTable::from_lines(
            Uuid::nil(),
            "AP",
            kind,
            rate,
            lines,
            true,
        )
    }

    #[test]
    fn test_per_line_difference_matches_the_tables() {
        let payments: Vec<_> = (1..=4).map(paid).collect();
        let contracted = table_at(
            Rate::from_percentage(dec!(3)),
            payments.clone(),
            ScenarioKind::Contracted,
        );
        let fair = table_at(
            Rate::from_percentage(dec!(1.5)),
            payments,
            ScenarioKind::Fair,
        );

        let diff = build_differences("AP03", &contracted, &fair).unwrap();
        assert_eq!(diff.lines.len(), 10);

        for line in &diff.lines {
            let billed = contracted.line(line.number).unwrap();
            let recalculated = fair.line(line.number).unwrap();
            assert_eq!(
                line.difference,
                billed.total_installment - recalculated.total_installment
            );
        }
    }

    #[test]
    fn test_refund_accumulates_over_paid_lines_only() {
        let payments: Vec<_> = (1..=4).map(paid).collect();
        let contracted = table_at(
            Rate::from_percentage(dec!(3)),
            payments.clone(),
            ScenarioKind::Contracted,
        );
        let fair = table_at(
            Rate::from_percentage(dec!(1.5)),
            payments,
            ScenarioKind::Fair,
        );

        let diff = build_differences("AP03", &contracted, &fair).unwrap();

        let paid_sum: Money = diff
            .lines
            .iter()
            .filter(|l| l.status == PaymentStatus::Paid)
            .map(|l| l.difference)
            .sum();
        assert_eq!(diff.totals.total_refund, paid_sum);

        // a future installment adds nothing to the claim
        let full_sum = diff.totals.difference;
        assert!(diff.totals.total_refund < full_sum);

        // the running column freezes after the last paid line
        assert_eq!(diff.lines[4].accumulated_refund, diff.lines[9].accumulated_refund);
    }

    #[test]
    fn test_no_paid_lines_means_no_refund() {
        let contracted = table_at(
            Rate::from_percentage(dec!(3)),
            Vec::new(),
            ScenarioKind::Contracted,
        );
        let fair = table_at(
            Rate::from_percentage(dec!(1.5)),
            Vec::new(),
            ScenarioKind::Fair,
        );

        let diff = build_differences("AP03", &contracted, &fair).unwrap();
        assert_eq!(diff.totals.total_refund, Money::ZERO);
        assert!(diff.totals.difference.is_positive());
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let contracted = table_at(
            Rate::from_percentage(dec!(3)),
            Vec::new(),
            ScenarioKind::Contracted,
        );
        let mut fair = table_at(
            Rate::from_percentage(dec!(1.5)),
            Vec::new(),
            ScenarioKind::Fair,
        );
        fair.lines.pop();

        assert!(matches!(
            build_differences("AP03", &contracted, &fair),
            Err(EngineError::CalculationError { .. })
        ));
    }
}
