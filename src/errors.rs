use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("market rate required but not supplied")]
    MissingMarketRate,

    #[error("cet solver did not converge after {iterations} iterations")]
    CetNonConvergence {
        iterations: u32,
    },

    #[error("no rate available for index {index} in period {period}")]
    IndexUnavailable {
        index: String,
        period: NaiveDate,
    },

    #[error("unknown loan type: {tag}")]
    UnknownLoanType {
        tag: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
