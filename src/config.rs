use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::indices::CorrectionIndex;
use crate::types::{AmortizationSystem, Capitalization, LoanKind, PaymentRecord};

/// immutable calculation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInput {
    pub contract_id: Uuid,
    /// principal financed
    pub principal: Money,
    /// total installment count
    pub installments: u32,
    /// contracted monthly rate
    pub monthly_rate: Rate,
    /// contracted yearly rate, used only for capitalization-mismatch
    /// detection
    pub yearly_rate: Rate,
    /// fair market monthly rate, supplied externally
    pub market_monthly_rate: Option<Rate>,
    pub system: AmortizationSystem,
    pub capitalization: Capitalization,
    pub contract_date: NaiveDate,
    pub first_due_date: NaiveDate,
    pub loan_data: LoanData,
    /// reconciliation entries keyed by installment number; read-only
    pub payments: Vec<PaymentRecord>,
    pub policy: PolicyFlags,
}

/// loan-type-specific payload; each variant carries only the fields
/// its strategy consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoanData {
    Consumer(ConsumerData),
    RealEstate(RealEstateData),
    CreditCard(CreditCardData),
}

impl LoanData {
    pub fn kind(&self) -> LoanKind {
        match self {
            LoanData::Consumer(_) => LoanKind::Consumer,
            LoanData::RealEstate(_) => LoanKind::RealEstate,
            LoanData::CreditCard(_) => LoanKind::CreditCard,
        }
    }
}

/// unsecured/vehicle loan specifics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumerData {
    /// TAC/TEC origination fee financed into the contract
    pub origination_fee: Money,
    /// other upfront tariffs (registration, third-party services)
    pub other_fees: Money,
    pub insurance: Vec<InsuranceItem>,
    pub late_charges: Option<LateCharges>,
}

/// real-estate financing specifics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateData {
    pub property_value: Money,
    /// monetary-correction index applied to the balance before interest
    pub correction_index: Option<CorrectionIndex>,
    /// MIP insurance as a monthly rate over the corrected balance
    pub mip_rate: Rate,
    /// DFI insurance as a monthly rate over the property value
    pub dfi_rate: Rate,
    /// fixed monthly administration fee (TCA)
    pub admin_fee: Money,
    /// interest-only months before amortization starts
    pub grace_months: u32,
}

/// revolving credit-card debt specifics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCardData {
    /// horizon of the reconstructed structured loan, in months
    pub horizon_months: u32,
}

/// an insurance line item with its consent flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceItem {
    pub name: String,
    pub value: Money,
    /// whether the borrower expressly consented to the charge
    pub consented: bool,
}

/// late-payment charges observed in the same period
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LateCharges {
    /// comissao de permanencia
    pub permanencia: Money,
    pub moratorium_interest: Money,
    pub penalty: Money,
}

/// policy flags steering scenario generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyFlags {
    /// reduce the fair-table opening balance by disputed charges
    pub exclude_irregular_charges: bool,
    /// statutory doubled refund of what was wrongly charged
    pub double_refund: bool,
    /// contracted rate above market * multiplier classifies as abusive
    pub abuse_threshold: Decimal,
}

impl Default for PolicyFlags {
    fn default() -> Self {
        Self {
            exclude_irregular_charges: false,
            double_refund: false,
            abuse_threshold: dec!(1.5),
        }
    }
}

impl CalculationInput {
    pub fn builder() -> CalculationInputBuilder {
        CalculationInputBuilder::new()
    }

    pub fn kind(&self) -> LoanKind {
        self.loan_data.kind()
    }

    /// market rate or an explicit error; strategies never substitute a
    /// silent default
    pub fn market_rate(&self) -> Result<Rate> {
        self.market_monthly_rate.ok_or(EngineError::MissingMarketRate)
    }

    /// reconciliation entry for an installment number, when recorded
    pub fn payment_record(&self, number: u32) -> Option<&PaymentRecord> {
        self.payments
            .iter()
            .find(|p| p.installment_number == number)
    }

    /// reject malformed requests before any table generation begins
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(EngineError::InvalidInput {
                message: format!("principal must be positive, got {}", self.principal),
            });
        }
        if self.installments == 0 {
            return Err(EngineError::InvalidInput {
                message: "installment count must be positive".to_string(),
            });
        }
        if self.monthly_rate.as_decimal().is_sign_negative() {
            return Err(EngineError::InvalidInput {
                message: format!("monthly rate must not be negative, got {}", self.monthly_rate),
            });
        }
        if self.yearly_rate.as_decimal().is_sign_negative() {
            return Err(EngineError::InvalidInput {
                message: format!("yearly rate must not be negative, got {}", self.yearly_rate),
            });
        }
        if let Some(market) = self.market_monthly_rate {
            if market.as_decimal().is_sign_negative() {
                return Err(EngineError::InvalidInput {
                    message: format!("market rate must not be negative, got {market}"),
                });
            }
        }
        if self.first_due_date <= self.contract_date {
            return Err(EngineError::InvalidDate {
                message: format!(
                    "first due date {} must come after contract date {}",
                    self.first_due_date, self.contract_date
                ),
            });
        }
        if self.policy.abuse_threshold < Decimal::ONE {
            return Err(EngineError::InvalidInput {
                message: format!(
                    "abuse threshold must be at least 1, got {}",
                    self.policy.abuse_threshold
                ),
            });
        }
        match &self.loan_data {
            LoanData::CreditCard(data) if data.horizon_months == 0 => {
                Err(EngineError::InvalidInput {
                    message: "credit-card simulation horizon must be positive".to_string(),
                })
            }
            LoanData::RealEstate(data) if data.grace_months >= self.installments => {
                Err(EngineError::InvalidInput {
                    message: format!(
                        "grace period of {} months consumes the whole {}-installment term",
                        data.grace_months, self.installments
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

/// builder for calculation inputs
pub struct CalculationInputBuilder {
    contract_id: Option<Uuid>,
    principal: Option<Money>,
    installments: Option<u32>,
    monthly_rate: Option<Rate>,
    yearly_rate: Option<Rate>,
    market_monthly_rate: Option<Rate>,
    system: AmortizationSystem,
    capitalization: Capitalization,
    contract_date: Option<NaiveDate>,
    first_due_date: Option<NaiveDate>,
    loan_data: Option<LoanData>,
    payments: Vec<PaymentRecord>,
    policy: PolicyFlags,
}

impl CalculationInputBuilder {
    pub fn new() -> Self {
        Self {
            contract_id: None,
            principal: None,
            installments: None,
            monthly_rate: None,
            yearly_rate: None,
            market_monthly_rate: None,
            system: AmortizationSystem::Price,
            capitalization: Capitalization::Monthly,
            contract_date: None,
            first_due_date: None,
            loan_data: None,
            payments: Vec::new(),
            policy: PolicyFlags::default(),
        }
    }

    pub fn contract_id(mut self, id: Uuid) -> Self {
        self.contract_id = Some(id);
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn installments(mut self, count: u32) -> Self {
        self.installments = Some(count);
        self
    }

    pub fn monthly_rate(mut self, rate: Rate) -> Self {
        self.monthly_rate = Some(rate);
        self
    }

    pub fn yearly_rate(mut self, rate: Rate) -> Self {
        self.yearly_rate = Some(rate);
        self
    }

    pub fn market_monthly_rate(mut self, rate: Rate) -> Self {
        self.market_monthly_rate = Some(rate);
        self
    }

    pub fn system(mut self, system: AmortizationSystem) -> Self {
        self.system = system;
        self
    }

    pub fn capitalization(mut self, capitalization: Capitalization) -> Self {
        self.capitalization = capitalization;
        self
    }

    pub fn contract_date(mut self, date: NaiveDate) -> Self {
        self.contract_date = Some(date);
        self
    }

    pub fn first_due_date(mut self, date: NaiveDate) -> Self {
        self.first_due_date = Some(date);
        self
    }

    pub fn loan_data(mut self, data: LoanData) -> Self {
        self.loan_data = Some(data);
        self
    }

    pub fn payments(mut self, payments: Vec<PaymentRecord>) -> Self {
        self.payments = payments;
        self
    }

    pub fn policy(mut self, policy: PolicyFlags) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<CalculationInput> {
        let missing = |field: &str| EngineError::InvalidInput {
            message: format!("{field} is required"),
        };

        let monthly_rate = self.monthly_rate.ok_or_else(|| missing("monthly_rate"))?;
        let input = CalculationInput {
            contract_id: self.contract_id.unwrap_or_else(Uuid::new_v4),
            principal: self.principal.ok_or_else(|| missing("principal"))?,
            installments: self.installments.ok_or_else(|| missing("installments"))?,
            monthly_rate,
            // absent a stated yearly rate, assume plain monthly compounding
            yearly_rate: self.yearly_rate.unwrap_or_else(|| monthly_rate.monthly_to_annual()),
            market_monthly_rate: self.market_monthly_rate,
            system: self.system,
            capitalization: self.capitalization,
            contract_date: self.contract_date.ok_or_else(|| missing("contract_date"))?,
            first_due_date: self.first_due_date.ok_or_else(|| missing("first_due_date"))?,
            loan_data: self.loan_data.ok_or_else(|| missing("loan_data"))?,
            payments: self.payments,
            policy: self.policy,
        };
        input.validate()?;
        Ok(input)
    }
}

impl Default for CalculationInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}
