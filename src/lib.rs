pub mod cet;
pub mod config;
pub mod dates;
pub mod decimal;
pub mod errors;
pub mod indices;
pub mod interest;
pub mod preview;
pub mod report;
pub mod scenario;
pub mod strategies;
pub mod types;
pub mod validators;

// re-export key types
pub use cet::solve_cet;
pub use config::{
    CalculationInput, CalculationInputBuilder, ConsumerData, CreditCardData, InsuranceItem,
    LateCharges, LoanData, PolicyFlags, RealEstateData,
};
pub use decimal::{Money, Rate};
pub use errors::{EngineError, Result};
pub use indices::{CorrectionIndex, IndexProvider, MemoryIndexProvider};
pub use preview::{build_preview, AbuseLevel, IrregularityFlags, PreviewResult};
pub use report::{detailed_report, DetailedReport, ReportOptions};
pub use scenario::{
    AmortizationLine, DifferenceLine, DifferenceTable, DifferenceTotals, LineOverride,
    ScenarioKind, ScenarioTable, ScenarioTotals,
};
pub use strategies::{
    calculate, preview, strategy_for, strategy_for_tag, FullCalculation, LoanStrategy,
    Settlement,
};
pub use types::{
    AmortizationSystem, Capitalization, Finding, FindingCode, LoanKind, PaymentRecord,
    PaymentStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
