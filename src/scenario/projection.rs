use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::scenario::differences::DifferenceTable;
use crate::scenario::generator::{generate_table, ScheduleSpec};
use crate::scenario::table::{AmortizationLine, ScenarioKind, ScenarioTable};

/// project the remaining debt after netting the accumulated refund
/// against the balance at the last paid installment
///
/// the refund is doubled when the statutory pay-back-double policy is
/// in force; the remaining term is re-amortized as a level payment at
/// the market rate. with no installments left the result degenerates
/// to an empty table carrying only the refund total.
pub fn build_projection(
    code: impl Into<String>,
    kind: ScenarioKind,
    contracted: &ScenarioTable,
    differences: &DifferenceTable,
    market_rate: Rate,
    double_refund: bool,
) -> Result<ScenarioTable> {
    let code = code.into();
    let refund = if double_refund {
        differences.totals.total_refund * dec!(2)
    } else {
        differences.totals.total_refund
    };

    let last_paid = contracted.last_paid_number().unwrap_or(0);
    let term = contracted
        .lines
        .iter()
        .map(|line| line.number)
        .max()
        .unwrap_or(0);
    let remaining = term - last_paid;

    let outstanding = contracted
        .balance_after(last_paid)
        .unwrap_or(contracted.totals.principal);
    let consolidated = (outstanding - refund).max(Money::ZERO);

    let consolidation_date = contracted
        .line(last_paid)
        .map(|line| line.due_date)
        .unwrap_or_else(|| {
            contracted
                .lines
                .first()
                .map(|line| line.due_date)
                .unwrap_or_default()
        });

    if remaining == 0 {
        // fully paid contract: nothing to project, only the refund
        let mut table = ScenarioTable::from_lines(
            contracted.contract_id,
            code,
            kind,
            market_rate,
            Vec::new(),
            false,
        );
        table.totals.refund = refund;
        return Ok(table);
    }

    let first_due = contracted
        .line(last_paid + 1)
        .map(|line| line.due_date)
        .unwrap_or(consolidation_date);

    let spec = ScheduleSpec::new(
        consolidated,
        market_rate,
        remaining,
        consolidation_date,
        first_due,
    );

    let lines = generate_table(&spec)?
        .into_iter()
        .map(|line| renumber(line, last_paid))
        .collect();

    let mut table = ScenarioTable::from_lines(
        contracted.contract_id,
        code,
        kind,
        market_rate,
        lines,
        consolidated.is_positive(),
    );
    table.totals.refund = refund;
    Ok(table)
}

/// keep the original contract numbering: the consolidation line takes
/// the last paid number, projected installments continue from there
fn renumber(mut line: AmortizationLine, last_paid: u32) -> AmortizationLine {
    if line.number > 0 {
        line.number += last_paid;
    } else {
        line.number = last_paid;
    }
    line
}
