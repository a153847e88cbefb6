use crate::config::{CalculationInput, CreditCardData, LoanData};
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::indices::IndexProvider;
use crate::interest::monthly_interest;
use crate::preview::{build_preview, PreviewResult};
use crate::scenario::{
    generate_table, AmortizationLine, ScenarioKind, ScenarioTable, ScheduleSpec,
};
use crate::strategies::{FullCalculation, LoanStrategy, Settlement};
use crate::types::{AmortizationSystem, PaymentStatus};
use crate::validators;

/// revolving credit-card debt has no fixed schedule, so the strategy
/// first reconstructs the debt as a structured loan at the fair
/// (consignado) rate over a fixed horizon, then confronts the actually
/// recorded payments against that reconstruction to find the point at
/// which the debt would have been settled; everything paid beyond that
/// point is the indebito
pub struct CreditCardStrategy;

impl CreditCardStrategy {
    fn data<'a>(&self, input: &'a CalculationInput) -> Result<&'a CreditCardData> {
        match &input.loan_data {
            LoanData::CreditCard(data) => Ok(data),
            _ => Err(EngineError::InvalidInput {
                message: "not a credit-card input".to_string(),
            }),
        }
    }

    /// thread the recorded payments through the fair-rate balance; the
    /// settlement point is the first period where the balance reaches
    /// zero
    fn confront_payments(
        &self,
        input: &CalculationInput,
        market: Rate,
        horizon: u32,
    ) -> (Vec<AmortizationLine>, Settlement) {
        let last_recorded = input
            .payments
            .iter()
            .map(|p| p.installment_number)
            .max()
            .unwrap_or(0);
        let periods = horizon.max(last_recorded);

        let mut lines =
            vec![AmortizationLine::momento_zero(input.contract_date, input.principal)];
        let mut balance = input.principal;
        let mut settled_at = None;
        let mut overpaid = Money::ZERO;

        for number in 1..=periods {
            let record = input.payment_record(number);
            let due_date = record
                .map(|r| r.due_date)
                .unwrap_or_else(|| crate::dates::add_months(input.first_due_date, number - 1));
            let payment = record.and_then(|r| r.paid_amount).unwrap_or(Money::ZERO);
            let status = record.map(|r| r.status).unwrap_or(PaymentStatus::Pending);

            if balance.is_zero() {
                // debt already settled: the whole payment is indebito
                overpaid += payment;
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
                    paid_amount: record.and_then(|r| r.paid_amount),
                });
                continue;
            }

            let interest = monthly_interest(balance, market);
            let owed = balance + interest;
            let mut closing = owed - payment;

            if closing <= Money::ZERO {
                // this payment settles the reconstructed debt; the
                // excess over what was owed is already indebito
                overpaid += -closing.min(Money::ZERO);
                closing = Money::ZERO;
                settled_at = Some(number);
            }

            let amortization = payment - interest;
            lines.push(AmortizationLine {
                number,
                due_date,
                opening_balance: balance,
                correction: Money::ZERO,
                corrected_balance: balance,
                interest,
                amortization: amortization.min(balance),
                extra_amortization: Money::ZERO,
                closing_balance: closing,
                base_installment: payment,
                insurance: Money::ZERO,
                admin_fee: Money::ZERO,
                total_installment: payment,
                status,
                paid_amount: record.and_then(|r| r.paid_amount),
            });

            balance = closing;
        }

        (lines, Settlement { settled_at, overpaid })
    }
}

impl LoanStrategy for CreditCardStrategy {
    fn preview(&self, input: &CalculationInput) -> Result<PreviewResult> {
        self.data(input)?;
        build_preview(input)
    }

    fn full_with_overrides(
        &self,
        input: &CalculationInput,
        _indices: &dyn IndexProvider,
        // revolving debt has no scheduled installments to correct
        _overrides: &[crate::scenario::LineOverride],
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

        // AP02: what a fair structured loan over the current balance
        // would look like
        let mut fair_spec = ScheduleSpec::new(
            input.principal,
            market,
            data.horizon_months,
            input.contract_date,
            input.first_due_date,
        );
        fair_spec.system = AmortizationSystem::Price;
        let fair = ScenarioTable::from_lines(
            input.contract_id,
            "AP02",
            ScenarioKind::Fair,
            market,
            generate_table(&fair_spec)?,
            true,
        );

        // AP01: the recorded payments confronted with the fair-rate
        // balance
        let (lines, settlement) = self.confront_payments(input, market, data.horizon_months);
        let contracted = ScenarioTable::from_lines(
            input.contract_id,
            "AP01",
            ScenarioKind::Contracted,
            input.monthly_rate,
            lines,
            false,
        );

        Ok(FullCalculation {
            scenarios: vec![contracted, fair],
            differences: None,
            findings,
            cet_monthly: None,
            cet_yearly: None,
            settlement: Some(settlement),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::MemoryIndexProvider;
    use crate::types::PaymentRecord;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn payment(number: u32, amount: Money) -> PaymentRecord {
        let due = crate::dates::add_months(d(2024, 2, 20), number - 1);
        PaymentRecord {
            installment_number: number,
            due_date: due,
            status: PaymentStatus::Paid,
            paid_date: Some(due),
            paid_amount: Some(amount),
            extra_amortization: Money::ZERO,
        }
    }

    fn card_input(payments: Vec<PaymentRecord>) -> CalculationInput {
        CalculationInput::builder()
            .principal(Money::from_major(5_000))
            .installments(12)
            // the revolving rate actually charged
            .monthly_rate(Rate::from_percentage(dec!(12)))
            // fair consignado benchmark
            .market_monthly_rate(Rate::from_percentage(dec!(2)))
            .contract_date(d(2024, 1, 20))
            .first_due_date(d(2024, 2, 20))
            .loan_data(LoanData::CreditCard(CreditCardData { horizon_months: 12 }))
            .payments(payments)
            .build()
            .unwrap()
    }

    #[test]
    fn test_reconstruction_is_a_level_payment_loan() {
        let input = card_input(Vec::new());
        let result = CreditCardStrategy
            .full(&input, &MemoryIndexProvider::new())
            .unwrap();

        let fair = result.scenario("AP02").unwrap();
        assert_eq!(fair.rate, Rate::from_percentage(dec!(2)));
        assert_eq!(fair.lines.len(), 13);
        assert_eq!(fair.lines.last().unwrap().closing_balance, Money::ZERO);
        assert!(fair.integrity_warning.is_none());
    }

    #[test]
    fn test_settlement_point_is_detected() {
        // 5,000 at 2% fair rate: three payments of 2,000 settle the
        // debt inside the third period
        let payments = vec![
            payment(1, Money::from_major(2_000)),
            payment(2, Money::from_major(2_000)),
            payment(3, Money::from_major(2_000)),
        ];
        let result = CreditCardStrategy
            .full(&card_input(payments), &MemoryIndexProvider::new())
            .unwrap();

        let settlement = result.settlement.unwrap();
        assert_eq!(settlement.settled_at, Some(3));
        // balance walk: 5000 -> 3100 -> 1162 -> settled with excess
        // 2000 - 1185.24 = 814.76
        assert!(settlement
            .overpaid
            .approx_eq(Money::from_str_exact("814.76").unwrap(), dec!(0.01)));
    }

    #[test]
    fn test_payments_beyond_settlement_are_indebito() {
        let payments = vec![
            payment(1, Money::from_major(2_000)),
            payment(2, Money::from_major(2_000)),
            payment(3, Money::from_major(2_000)),
            payment(4, Money::from_major(2_000)),
            payment(5, Money::from_major(500)),
        ];
        let result = CreditCardStrategy
            .full(&card_input(payments), &MemoryIndexProvider::new())
            .unwrap();

        let settlement = result.settlement.unwrap();
        assert_eq!(settlement.settled_at, Some(3));
        // the settlement excess plus everything recorded afterwards
        assert!(settlement
            .overpaid
            .approx_eq(Money::from_str_exact("3314.76").unwrap(), dec!(0.01)));
    }

    #[test]
    fn test_insufficient_payments_never_settle() {
        // 100 per month does not even cover the 2% interest
        let payments = vec![
            payment(1, Money::from_major(100)),
            payment(2, Money::from_major(100)),
        ];
        let result = CreditCardStrategy
            .full(&card_input(payments), &MemoryIndexProvider::new())
            .unwrap();

        let settlement = result.settlement.as_ref().unwrap();
        assert_eq!(settlement.settled_at, None);
        assert_eq!(settlement.overpaid, Money::ZERO);

        // the confronted balance grows when payments trail interest
        let contracted = result.scenario("AP01").unwrap();
        assert!(
            contracted.line(2).unwrap().closing_balance
                > contracted.line(1).unwrap().closing_balance
        );
    }

    #[test]
    fn test_confrontation_covers_payments_past_the_horizon() {
        let mut payments: Vec<_> = (1..=12)
            .map(|n| payment(n, Money::from_major(400)))
            .collect();
        payments.push(payment(14, Money::from_major(400)));
        let result = CreditCardStrategy
            .full(&card_input(payments), &MemoryIndexProvider::new())
            .unwrap();

        let contracted = result.scenario("AP01").unwrap();
        assert_eq!(contracted.lines.last().unwrap().number, 14);
    }

    #[test]
    fn test_wrong_payload_is_rejected() {
        let mut input = card_input(Vec::new());
        input.loan_data = LoanData::Consumer(crate::config::ConsumerData::default());
        let err = CreditCardStrategy
            .full(&input, &MemoryIndexProvider::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }
}
