use serde::{Deserialize, Serialize};

use crate::config::CalculationInput;
use crate::errors::Result;
use crate::indices::IndexProvider;
use crate::scenario::{build_projection, LineOverride, ScenarioKind};
use crate::strategies::{strategy_for, FullCalculation};

/// options for the long-form expert report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportOptions {
    /// manual per-installment corrections layered over the computed
    /// contracted table
    pub overrides: Vec<LineOverride>,
}

/// the complete appendix set for an expert report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedReport {
    pub calculation: FullCalculation,
    /// installment numbers whose lines were manually corrected
    pub applied_overrides: Vec<u32>,
}

impl DetailedReport {
    /// convert to pretty-printed json for the document pipeline
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// alternate entry point for full expert reports: runs the loan type's
/// strategy with manual overrides applied, then normalizes the
/// post-refund scenarios so every report carries both the single
/// (AP06) and the doubled (AP07) consolidation
pub fn detailed_report(
    input: &CalculationInput,
    indices: &dyn IndexProvider,
    options: &ReportOptions,
) -> Result<DetailedReport> {
    let strategy = strategy_for(input.kind());
    let mut calculation = strategy.full_with_overrides(input, indices, &options.overrides)?;

    if let Some(differences) = calculation.differences.clone() {
        let market = input.market_rate()?;
        let contracted = calculation
            .scenarios
            .iter()
            .find(|table| table.kind == ScenarioKind::Contracted)
            .cloned();

        if let Some(contracted) = contracted {
            let single = build_projection(
                "AP06",
                ScenarioKind::PostRefund,
                &contracted,
                &differences,
                market,
                false,
            )?;
            let doubled = build_projection(
                "AP07",
                ScenarioKind::PostRefundDoubled,
                &contracted,
                &differences,
                market,
                true,
            )?;

            calculation.scenarios.retain(|table| {
                !matches!(
                    table.kind,
                    ScenarioKind::PostRefund | ScenarioKind::PostRefundDoubled
                )
            });
            calculation.scenarios.push(single);
            calculation.scenarios.push(doubled);
        }
    }

    let applied_overrides = options
        .overrides
        .iter()
        .map(|o| o.number)
        .filter(|n| *n >= 1 && *n <= input.installments)
        .collect();

    Ok(DetailedReport {
        calculation,
        applied_overrides,
    })
}
