use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::EngineError;

/// amortization system for the contracted schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationSystem {
    /// French system: constant installment, shifting composition
    Price,
    /// constant amortization: fixed principal slice, declining installment
    Sac,
    /// SAC variant with yearly recomputed payment and growing amortization
    Sacre,
    /// simple-interest level payment (Gauss method)
    Gauss,
}

/// how the contracted rate capitalizes between due dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capitalization {
    /// flat monthly rate regardless of elapsed days
    Monthly,
    /// rate compounded over the actual days between due dates
    Daily,
}

/// recorded state of a scheduled installment, supplied by the
/// reconciliation provider; the engine only reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// scheduled, nothing recorded yet
    Pending,
    /// fully paid
    Paid,
    /// partially paid
    Partial,
    /// due date passed with no payment
    Late,
}

/// loan type tag selecting the calculation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanKind {
    /// unsecured personal or vehicle loan
    Consumer,
    /// real-estate financing with monetary correction
    RealEstate,
    /// revolving credit-card debt
    CreditCard,
}

impl LoanKind {
    /// parse a producer-side tag; unrecognized tags are an explicit
    /// error, never a silent default
    pub fn from_tag(tag: &str) -> Result<Self, EngineError> {
        match tag {
            "consumer" | "vehicle" => Ok(LoanKind::Consumer),
            "real-estate" => Ok(LoanKind::RealEstate),
            "credit-card" => Ok(LoanKind::CreditCard),
            other => Err(EngineError::UnknownLoanType {
                tag: other.to_string(),
            }),
        }
    }
}

/// what actually happened to one scheduled installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Money>,
    /// unscheduled amortization recorded against this installment;
    /// reduces the carried balance for subsequent periods
    pub extra_amortization: Money,
}

impl PaymentRecord {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// statutory irregularity code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingCode {
    /// TAC/TEC origination fee charged after the statutory cutoff
    IrregularOriginationFee,
    /// insurance charged without the borrower's consent
    InsuranceWithoutConsent,
    /// permanencia stacked with moratorium interest or penalty
    LateChargeCumulation,
    /// stated yearly rate exceeds the monthly rate's annual equivalent
    DailyCapitalizationSuspected,
}

/// a statutory finding attached to a calculation result; findings are
/// data, never errors, and must not be dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub code: FindingCode,
    pub description: String,
    /// disputed amount, when the finding has one
    pub amount: Option<Money>,
}

impl Finding {
    pub fn new(code: FindingCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            amount: None,
        }
    }

    pub fn with_amount(code: FindingCode, description: impl Into<String>, amount: Money) -> Self {
        Self {
            code,
            description: description.into(),
            amount: Some(amount),
        }
    }
}
