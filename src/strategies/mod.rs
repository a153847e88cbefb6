pub mod consumer;
pub mod credit_card;
pub mod real_estate;

use serde::{Deserialize, Serialize};

use crate::config::CalculationInput;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::indices::IndexProvider;
use crate::preview::PreviewResult;
use crate::scenario::{DifferenceTable, ScenarioTable};
use crate::types::{Finding, LoanKind};

pub use consumer::ConsumerStrategy;
pub use credit_card::CreditCardStrategy;
pub use real_estate::RealEstateStrategy;

/// where a reconstructed revolving debt would have been settled and
/// how much was paid beyond that point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// installment index at which cumulative fair payments clear the
    /// debt; none if the recorded payments never settle it
    pub settled_at: Option<u32>,
    /// everything paid past the settlement point: the indebito
    pub overpaid: Money,
}

/// complete calculation output: every scenario table, the differences
/// confrontation, statutory findings and audit figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullCalculation {
    pub scenarios: Vec<ScenarioTable>,
    pub differences: Option<DifferenceTable>,
    pub findings: Vec<Finding>,
    /// effective total cost of credit over the contracted cashflow
    pub cet_monthly: Option<Rate>,
    pub cet_yearly: Option<Rate>,
    /// revolving-debt settlement confrontation
    pub settlement: Option<Settlement>,
}

impl FullCalculation {
    pub fn scenario(&self, code: &str) -> Option<&ScenarioTable> {
        self.scenarios.iter().find(|table| table.code == code)
    }

    /// convert to pretty-printed json for the document pipeline
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// one calculation strategy per loan type; the set is closed and
/// exhaustively tested
pub trait LoanStrategy {
    /// fast single-installment viability check, no tables
    fn preview(&self, input: &CalculationInput) -> Result<PreviewResult>;

    /// full scenario generation for expert use
    fn full(&self, input: &CalculationInput, indices: &dyn IndexProvider)
        -> Result<FullCalculation> {
        self.full_with_overrides(input, indices, &[])
    }

    /// full calculation with manual per-installment corrections layered
    /// onto the contracted table; strategies without a fixed schedule
    /// ignore the overrides
    fn full_with_overrides(
        &self,
        input: &CalculationInput,
        indices: &dyn IndexProvider,
        overrides: &[crate::scenario::LineOverride],
    ) -> Result<FullCalculation>;
}

/// map a loan kind to its strategy instance
pub fn strategy_for(kind: LoanKind) -> Box<dyn LoanStrategy> {
    match kind {
        LoanKind::Consumer => Box::new(ConsumerStrategy),
        LoanKind::RealEstate => Box::new(RealEstateStrategy),
        LoanKind::CreditCard => Box::new(CreditCardStrategy),
    }
}

/// map a producer-side tag to a strategy; unrecognized tags fail with
/// an explicit error, never a silent default
pub fn strategy_for_tag(tag: &str) -> Result<Box<dyn LoanStrategy>> {
    Ok(strategy_for(LoanKind::from_tag(tag)?))
}

/// run the preview for the input's own loan type
pub fn preview(input: &CalculationInput) -> Result<PreviewResult> {
    strategy_for(input.kind()).preview(input)
}

/// run the full calculation for the input's own loan type
pub fn calculate(
    input: &CalculationInput,
    indices: &dyn IndexProvider,
) -> Result<FullCalculation> {
    strategy_for(input.kind()).full(input, indices)
}
