use rust_decimal::Decimal;

use crate::config::{CalculationInput, LoanData, RealEstateData};
use crate::dates::add_months;
use crate::errors::{EngineError, Result};
use crate::indices::IndexProvider;
use crate::preview::{build_preview, PreviewResult};
use crate::scenario::{
    build_differences, build_projection, generate_table, ScenarioKind, ScenarioTable,
    ScheduleSpec,
};
use crate::strategies::{FullCalculation, LoanStrategy};
use crate::types::Capitalization;
use crate::validators;

/// real-estate financing: monetary correction is applied to the
/// balance before interest each period, MIP/DFI insurance and the
/// administration fee ride on the base installment, and the two
/// post-refund scenarios consolidate the debt with the single and the
/// doubled refund
pub struct RealEstateStrategy;

impl RealEstateStrategy {
    fn data<'a>(&self, input: &'a CalculationInput) -> Result<&'a RealEstateData> {
        match &input.loan_data {
            LoanData::RealEstate(data) => Ok(data),
            _ => Err(EngineError::InvalidInput {
                message: "not a real-estate financing input".to_string(),
            }),
        }
    }

    /// one batched lookup covers the whole table; a missing series is
    /// a calculation failure, never a silent factor of one
    fn correction_factors(
        &self,
        input: &CalculationInput,
        data: &RealEstateData,
        indices: &dyn IndexProvider,
    ) -> Result<Vec<Decimal>> {
        let Some(index) = &data.correction_index else {
            return Ok(Vec::new());
        };
        let months: Vec<_> = (0..input.installments)
            .map(|k| add_months(input.first_due_date, k))
            .collect();
        indices.factors_for(index, &months)
    }

    fn spec_for(
        &self,
        input: &CalculationInput,
        data: &RealEstateData,
        factors: Vec<Decimal>,
    ) -> ScheduleSpec {
        let mut spec = ScheduleSpec::new(
            input.principal,
            input.monthly_rate,
            input.installments,
            input.contract_date,
            input.first_due_date,
        );
        spec.system = input.system;
        spec.capitalization = input.capitalization;
        spec.payments = input.payments.clone();
        spec.correction_factors = factors;
        spec.mip_rate = data.mip_rate;
        spec.dfi_per_period = data.property_value * data.dfi_rate.as_decimal();
        spec.admin_fee = data.admin_fee;
        spec.grace_months = data.grace_months;
        spec
    }
}

impl LoanStrategy for RealEstateStrategy {
    fn preview(&self, input: &CalculationInput) -> Result<PreviewResult> {
        self.data(input)?;
        build_preview(input)
    }

    fn full_with_overrides(
        &self,
        input: &CalculationInput,
        indices: &dyn IndexProvider,
        overrides: &[crate::scenario::LineOverride],
    ) -> Result<FullCalculation> {
        input.validate()?;
        let data = self.data(input)?;
        let market = input.market_rate()?;

        let mut findings = Vec::new();
        if let Some(finding) =
            validators::detect_daily_capitalization(input.monthly_rate, input.yearly_rate)
        {
            findings.push(finding);
        }

        let factors = self.correction_factors(input, data, indices)?;
        // a corrected balance legitimately leaves a residue at term end,
        // so the zero-close invariant only binds uncorrected tables
        let closes_at_zero =
            factors.is_empty() && input.capitalization == Capitalization::Monthly;

        // AP01: the financing as billed, with any manual corrections
        let mut contracted_spec = self.spec_for(input, data, factors.clone());
        contracted_spec.overrides = overrides.to_vec();
        let contracted = ScenarioTable::from_lines(
            input.contract_id,
            "AP01",
            ScenarioKind::Contracted,
            input.monthly_rate,
            generate_table(&contracted_spec)?,
            closes_at_zero,
        );

        // AP05: market rate, monthly capitalization; correction and
        // charges are lawful and stay
        let mut fair_spec = self.spec_for(input, data, factors.clone());
        fair_spec.rate = market;
        fair_spec.capitalization = Capitalization::Monthly;
        let fair = ScenarioTable::from_lines(
            input.contract_id,
            "AP05",
            ScenarioKind::Fair,
            market,
            generate_table(&fair_spec)?,
            factors.is_empty(),
        );

        let differences = build_differences("AP03", &contracted, &fair)?;

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

        Ok(FullCalculation {
            scenarios: vec![contracted, fair, single, doubled],
            differences: Some(differences),
            findings,
            cet_monthly: None,
            cet_yearly: None,
            settlement: None,
        })
    }
}
