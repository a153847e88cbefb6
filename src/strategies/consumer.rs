use crate::cet::solve_cet;
use crate::config::{CalculationInput, ConsumerData, LoanData};
use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::indices::IndexProvider;
use crate::preview::{build_preview, PreviewResult};
use crate::scenario::{
    build_differences, build_projection, generate_table, ScenarioKind, ScenarioTable,
    ScheduleSpec,
};
use crate::strategies::{FullCalculation, LoanStrategy};
use crate::types::{Capitalization, Finding};
use crate::validators;

/// unsecured personal and vehicle loans: statutory validators run as a
/// side effect of the full calculation, and the contracted cashflow is
/// audited with a CET solve
pub struct ConsumerStrategy;

impl ConsumerStrategy {
    fn data<'a>(&self, input: &'a CalculationInput) -> Result<&'a ConsumerData> {
        match &input.loan_data {
            LoanData::Consumer(data) => Ok(data),
            _ => Err(EngineError::InvalidInput {
                message: "not a consumer loan input".to_string(),
            }),
        }
    }

    /// findings are logged and attached to the result, never raised
    fn run_validators(&self, input: &CalculationInput, data: &ConsumerData) -> Vec<Finding> {
        let mut findings = Vec::new();
        if let Some(finding) =
            validators::check_origination_fee(data.origination_fee, input.contract_date)
        {
            findings.push(finding);
        }
        findings.extend(validators::check_insurance_consent(&data.insurance));
        if let Some(charges) = &data.late_charges {
            if let Some(finding) = validators::check_late_charge_cumulation(charges) {
                findings.push(finding);
            }
        }
        if let Some(finding) =
            validators::detect_daily_capitalization(input.monthly_rate, input.yearly_rate)
        {
            findings.push(finding);
        }
        findings
    }
}

impl LoanStrategy for ConsumerStrategy {
    fn preview(&self, input: &CalculationInput) -> Result<PreviewResult> {
        self.data(input)?;
        build_preview(input)
    }

    fn full_with_overrides(
        &self,
        input: &CalculationInput,
        _indices: &dyn IndexProvider,
        overrides: &[crate::scenario::LineOverride],
    ) -> Result<FullCalculation> {
        input.validate()?;
        let data = self.data(input)?;
        let market = input.market_rate()?;

        let findings = self.run_validators(input, data);

        // AP01: the contract as billed, with any manual corrections
        let mut contracted_spec = ScheduleSpec::new(
            input.principal,
            input.monthly_rate,
            input.installments,
            input.contract_date,
            input.first_due_date,
        );
        contracted_spec.system = input.system;
        contracted_spec.capitalization = input.capitalization;
        contracted_spec.payments = input.payments.clone();
        contracted_spec.overrides = overrides.to_vec();
        let contracted = ScenarioTable::from_lines(
            input.contract_id,
            "AP01",
            ScenarioKind::Contracted,
            input.monthly_rate,
            generate_table(&contracted_spec)?,
            input.capitalization == Capitalization::Monthly,
        );

        // AP02: the same schedule purged of the disputed rate and of
        // any daily compounding
        let disputed: Money = findings.iter().filter_map(|f| f.amount).sum();
        let fair_principal = if input.policy.exclude_irregular_charges {
            (input.principal - disputed).max(Money::ZERO)
        } else {
            input.principal
        };
        let mut fair_spec = ScheduleSpec::new(
            fair_principal,
            market,
            input.installments,
            input.contract_date,
            input.first_due_date,
        );
        fair_spec.system = input.system;
        fair_spec.capitalization = Capitalization::Monthly;
        fair_spec.payments = input.payments.clone();
        let fair = ScenarioTable::from_lines(
            input.contract_id,
            "AP02",
            ScenarioKind::Fair,
            market,
            generate_table(&fair_spec)?,
            true,
        );

        let differences = build_differences("AP03", &contracted, &fair)?;

        let projection = build_projection(
            "AP04",
            if input.policy.double_refund {
                ScenarioKind::PostRefundDoubled
            } else {
                ScenarioKind::PostRefund
            },
            &contracted,
            &differences,
            market,
            input.policy.double_refund,
        )?;

        // CET audit: upfront charges come out of the disbursed amount
        let upfront = data.origination_fee
            + data.other_fees
            + data.insurance.iter().map(|i| i.value).sum::<Money>();
        let net_principal = input.principal - upfront;
        let (cet_monthly, cet_yearly) = if net_principal.is_positive() {
            let cet = solve_cet(
                net_principal,
                &contracted.installment_stream(),
                input.monthly_rate,
            )?;
            (Some(cet), Some(cet.monthly_to_annual()))
        } else {
            (None, None)
        };

        Ok(FullCalculation {
            scenarios: vec![contracted, fair, projection],
            differences: Some(differences),
            findings,
            cet_monthly,
            cet_yearly,
            settlement: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InsuranceItem, LateCharges, PolicyFlags};
    use crate::decimal::Rate;
    use crate::indices::MemoryIndexProvider;
    use crate::types::{
        AmortizationSystem, FindingCode, PaymentRecord, PaymentStatus,
    };
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn paid(number: u32) -> PaymentRecord {
        let due = crate::dates::add_months(d(2023, 9, 5), number - 1);
        PaymentRecord {
            installment_number: number,
            due_date: due,
            status: PaymentStatus::Paid,
            paid_date: Some(due),
            paid_amount: None,
            extra_amortization: Money::ZERO,
        }
    }

    fn vehicle_input() -> CalculationInput {
        CalculationInput::builder()
            .principal(Money::from_major(30_000))
            .installments(48)
            .monthly_rate(Rate::from_percentage(dec!(2.5)))
            .market_monthly_rate(Rate::from_percentage(dec!(1.6)))
            .system(AmortizationSystem::Price)
            .contract_date(d(2023, 8, 5))
            .first_due_date(d(2023, 9, 5))
            .loan_data(LoanData::Consumer(ConsumerData {
                origination_fee: Money::from_major(900),
                other_fees: Money::from_major(150),
                insurance: vec![InsuranceItem {
                    name: "prestamista".to_string(),
                    value: Money::from_major(1_200),
                    consented: false,
                }],
                late_charges: Some(LateCharges {
                    permanencia: Money::from_major(80),
                    moratorium_interest: Money::from_major(35),
                    penalty: Money::ZERO,
                }),
            }))
            .payments((1..=12).map(paid).collect())
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_emits_all_appendices() {
        let result = ConsumerStrategy
            .full(&vehicle_input(), &MemoryIndexProvider::new())
            .unwrap();

        assert!(result.scenario("AP01").is_some());
        assert!(result.scenario("AP02").is_some());
        assert!(result.scenario("AP04").is_some());
        assert_eq!(result.differences.as_ref().unwrap().code, "AP03");
        assert!(result.settlement.is_none());
    }

    #[test]
    fn test_validators_attach_findings_without_raising() {
        let result = ConsumerStrategy
            .full(&vehicle_input(), &MemoryIndexProvider::new())
            .unwrap();

        let codes: Vec<_> = result.findings.iter().map(|f| f.code).collect();
        assert!(codes.contains(&FindingCode::IrregularOriginationFee));
        assert!(codes.contains(&FindingCode::InsuranceWithoutConsent));
        assert!(codes.contains(&FindingCode::LateChargeCumulation));
    }

    #[test]
    fn test_cet_exceeds_nominal_rate_with_upfront_fees() {
        let result = ConsumerStrategy
            .full(&vehicle_input(), &MemoryIndexProvider::new())
            .unwrap();

        let cet = result.cet_monthly.unwrap();
        assert!(cet > Rate::from_percentage(dec!(2.5)));
        assert_eq!(result.cet_yearly.unwrap(), cet.monthly_to_annual());
    }

    #[test]
    fn test_fair_table_runs_at_market_rate_with_monthly_capitalization() {
        let mut input = vehicle_input();
        input.capitalization = Capitalization::Daily;
        let result = ConsumerStrategy
            .full(&input, &MemoryIndexProvider::new())
            .unwrap();

        let contracted = result.scenario("AP01").unwrap();
        let fair = result.scenario("AP02").unwrap();
        assert_eq!(fair.rate, Rate::from_percentage(dec!(1.6)));
        // the fair installment is cheaper line by line
        for (billed, recalculated) in contracted.lines[1..].iter().zip(&fair.lines[1..]) {
            assert!(billed.total_installment > recalculated.total_installment);
        }
    }

    #[test]
    fn test_excluding_irregular_charges_reduces_fair_principal() {
        let mut input = vehicle_input();
        input.policy = PolicyFlags {
            exclude_irregular_charges: true,
            ..PolicyFlags::default()
        };
        let result = ConsumerStrategy
            .full(&input, &MemoryIndexProvider::new())
            .unwrap();

        // irregular fee 900 + non-consented insurance 1200 + stacked
        // late charge 35 come out of the fair opening balance
        let fair = result.scenario("AP02").unwrap();
        assert_eq!(
            fair.totals.principal,
            Money::from_major(30_000) - Money::from_major(2_135)
        );
    }

    #[test]
    fn test_refund_covers_paid_lines_only() {
        let result = ConsumerStrategy
            .full(&vehicle_input(), &MemoryIndexProvider::new())
            .unwrap();

        let differences = result.differences.unwrap();
        let paid_diffs: Money = differences
            .lines
            .iter()
            .filter(|l| l.status == PaymentStatus::Paid)
            .map(|l| l.difference)
            .sum();
        assert_eq!(differences.totals.total_refund, paid_diffs);
        assert!(paid_diffs.is_positive());
    }

    #[test]
    fn test_wrong_payload_is_rejected() {
        let mut input = vehicle_input();
        input.loan_data = LoanData::CreditCard(crate::config::CreditCardData {
            horizon_months: 12,
        });
        let err = ConsumerStrategy
            .full(&input, &MemoryIndexProvider::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_missing_market_rate_fails_fast() {
        let mut input = vehicle_input();
        input.market_monthly_rate = None;
        let err = ConsumerStrategy
            .full(&input, &MemoryIndexProvider::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingMarketRate));
    }
}
