use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::month_of;
use crate::errors::{EngineError, Result};

/// monetary-correction index series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionIndex {
    Tr,
    Ipca,
    Inpc,
    IgpM,
    /// a named benchmark series outside the standard four
    Series(String),
}

impl fmt::Display for CorrectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionIndex::Tr => write!(f, "TR"),
            CorrectionIndex::Ipca => write!(f, "IPCA"),
            CorrectionIndex::Inpc => write!(f, "INPC"),
            CorrectionIndex::IgpM => write!(f, "IGP-M"),
            CorrectionIndex::Series(name) => write!(f, "{name}"),
        }
    }
}

/// historical rate lookup consumed by the real-estate strategy
///
/// the applicable factor for a reference month is a multiplier on the
/// outstanding balance (e.g. 1.001195 for +0.1195%); providers fall
/// back to the most recent available period when the exact month is
/// absent, and report "no data at all" as an error, never a silent
/// factor of one
pub trait IndexProvider {
    /// correction factor for the month containing `period`
    fn factor_for(&self, index: &CorrectionIndex, period: NaiveDate) -> Result<Decimal>;

    /// batched lookup for an entire table generation; one call per
    /// table keeps a remote implementation to a single round trip
    fn factors_for(&self, index: &CorrectionIndex, periods: &[NaiveDate]) -> Result<Vec<Decimal>> {
        periods
            .iter()
            .map(|period| self.factor_for(index, *period))
            .collect()
    }
}

/// in-memory provider backed by a month-keyed series; used in tests
/// and for manually supplied expert tables
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexProvider {
    series: BTreeMap<(String, NaiveDate), Decimal>,
}

impl MemoryIndexProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// record the factor for the month containing `period`
    pub fn insert(&mut self, index: CorrectionIndex, period: NaiveDate, factor: Decimal) {
        self.series
            .insert((index.to_string(), month_of(period)), factor);
    }
}

impl IndexProvider for MemoryIndexProvider {
    fn factor_for(&self, index: &CorrectionIndex, period: NaiveDate) -> Result<Decimal> {
        let key = index.to_string();
        let month = month_of(period);

        if let Some(factor) = self.series.get(&(key.clone(), month)) {
            return Ok(*factor);
        }

        // fall back to the most recent earlier period of the same series
        let earlier = self
            .series
            .range((key.clone(), NaiveDate::MIN)..(key.clone(), month))
            .next_back();

        match earlier {
            Some((_, factor)) => Ok(*factor),
            None => Err(EngineError::IndexUnavailable {
                index: key,
                period: month,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_exact_month_lookup() {
        let mut provider = MemoryIndexProvider::new();
        provider.insert(CorrectionIndex::Tr, d(2024, 1, 1), dec!(1.001195));

        let factor = provider.factor_for(&CorrectionIndex::Tr, d(2024, 1, 20)).unwrap();
        assert_eq!(factor, dec!(1.001195));
    }

    #[test]
    fn test_falls_back_to_most_recent_period() {
        let mut provider = MemoryIndexProvider::new();
        provider.insert(CorrectionIndex::Ipca, d(2024, 1, 1), dec!(1.0042));
        provider.insert(CorrectionIndex::Ipca, d(2024, 2, 1), dec!(1.0083));

        // april has no data, february is the most recent available
        let factor = provider.factor_for(&CorrectionIndex::Ipca, d(2024, 4, 15)).unwrap();
        assert_eq!(factor, dec!(1.0083));
    }

    #[test]
    fn test_no_data_is_an_error_not_a_silent_one() {
        let provider = MemoryIndexProvider::new();
        let err = provider.factor_for(&CorrectionIndex::Tr, d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, EngineError::IndexUnavailable { .. }));
    }

    #[test]
    fn test_series_are_independent() {
        let mut provider = MemoryIndexProvider::new();
        provider.insert(CorrectionIndex::Tr, d(2024, 1, 1), dec!(1.0012));

        let err = provider.factor_for(&CorrectionIndex::Ipca, d(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, EngineError::IndexUnavailable { .. }));
    }

    #[test]
    fn test_batched_lookup_preserves_order() {
        let mut provider = MemoryIndexProvider::new();
        provider.insert(CorrectionIndex::Tr, d(2024, 1, 1), dec!(1.001));
        provider.insert(CorrectionIndex::Tr, d(2024, 2, 1), dec!(1.002));

        let factors = provider
            .factors_for(&CorrectionIndex::Tr, &[d(2024, 2, 10), d(2024, 1, 10)])
            .unwrap();
        assert_eq!(factors, vec![dec!(1.002), dec!(1.001)]);
    }
}
