//! Confidence calculation.
//!
//! `confidence = completeness × data_quality × methodology_reliability`, clamped
//! to [0, 1]. Data quality starts at 1.0, loses fixed deltas for stale or
//! inconsistent data, and is scaled by the share of supporting records that
//! carry complete sub-fields.

use chrono::{Months, NaiveDate};

use crate::types::Financials;
use crate::ScoringError;

/// Funding older than this many months before the snapshot date is stale.
pub const STALE_FUNDING_MONTHS: u32 = 12;

/// Penalty for stale source data.
pub const STALENESS_PENALTY: f64 = 0.2;

/// Penalty for internally inconsistent data (e.g. burn above cash).
pub const INCONSISTENCY_PENALTY: f64 = 0.1;

/// Penalty for missing supporting context (e.g. no comparables).
pub const MISSING_CONTEXT_PENALTY: f64 = 0.1;

/// Share of supporting records with complete sub-fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordCoverage {
    pub complete: usize,
    pub total: usize,
}

impl RecordCoverage {
    pub fn new(complete: usize, total: usize) -> Self {
        Self { complete, total }
    }

    /// Count records matching `is_complete`.
    pub fn of<T>(records: &[T], is_complete: impl Fn(&T) -> bool) -> Self {
        Self {
            complete: records.iter().filter(|record| is_complete(record)).count(),
            total: records.len(),
        }
    }

    /// complete / total; 1.0 when there are no records to judge.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.complete as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }
}

/// Pillar-selected inputs to the data-quality heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualitySignals {
    pub stale: bool,
    pub inconsistent: bool,
    pub missing_context: bool,
    pub coverage: Option<RecordCoverage>,
}

/// Pure confidence arithmetic shared by pillars and the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceCalculator;

impl ConfidenceCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Data quality in [0, 1].
    pub fn data_quality(&self, signals: &QualitySignals) -> f64 {
        let mut quality: f64 = 1.0;

        if signals.stale {
            quality -= STALENESS_PENALTY;
        }
        if signals.inconsistent {
            quality -= INCONSISTENCY_PENALTY;
        }
        if signals.missing_context {
            quality -= MISSING_CONTEXT_PENALTY;
        }
        if let Some(coverage) = signals.coverage {
            quality *= coverage.fraction();
        }

        quality.clamp(0.0, 1.0)
    }

    /// Combine the three confidence inputs. Each input is clamped first, then the product.
    pub fn combine(&self, completeness: f64, data_quality: f64, methodology_reliability: f64) -> f64 {
        let product = completeness.clamp(0.0, 1.0)
            * data_quality.clamp(0.0, 1.0)
            * methodology_reliability.clamp(0.0, 1.0);
        product.clamp(0.0, 1.0)
    }

    /// Weight-normalized mean of `(weight, confidence)` pairs.
    pub fn weighted(&self, pairs: &[(f64, f64)]) -> Result<f64, ScoringError> {
        let total_weight: f64 = pairs.iter().map(|(weight, _)| weight).sum();
        if !(total_weight > 0.0) {
            return Err(ScoringError::CalculationError(
                "cannot average confidence over a zero total weight".to_string(),
            ));
        }

        let weighted_sum: f64 = pairs
            .iter()
            .map(|(weight, confidence)| weight * confidence.clamp(0.0, 1.0))
            .sum();

        Ok((weighted_sum / total_weight).clamp(0.0, 1.0))
    }
}

/// Whether the latest funding round is older than [`STALE_FUNDING_MONTHS`] before `as_of`.
///
/// A company with no funding history has no fresh funding data, so it counts as stale.
pub fn funding_is_stale(financials: &Financials, as_of: NaiveDate) -> bool {
    let Some(latest) = financials.latest_funding_date() else {
        return true;
    };
    match as_of.checked_sub_months(Months::new(STALE_FUNDING_MONTHS)) {
        Some(cutoff) => latest < cutoff,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FundingRound;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clean_data_has_full_quality() {
        let calc = ConfidenceCalculator::new();
        assert_eq!(calc.data_quality(&QualitySignals::default()), 1.0);
    }

    #[test]
    fn test_penalties_stack() {
        let calc = ConfidenceCalculator::new();
        let signals = QualitySignals {
            stale: true,
            inconsistent: true,
            missing_context: false,
            coverage: None,
        };
        assert!((calc.data_quality(&signals) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_coverage_scales_multiplicatively() {
        let calc = ConfidenceCalculator::new();
        let signals = QualitySignals {
            stale: true,
            coverage: Some(RecordCoverage::new(1, 2)),
            ..QualitySignals::default()
        };
        // (1.0 - 0.2) * 0.5
        assert!((calc.data_quality(&signals) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_coverage_is_neutral() {
        assert_eq!(RecordCoverage::new(0, 0).fraction(), 1.0);
    }

    #[test]
    fn test_combine_is_bounded() {
        let calc = ConfidenceCalculator::new();
        assert_eq!(calc.combine(1.5, 2.0, 1.0), 1.0);
        assert_eq!(calc.combine(-0.5, 1.0, 1.0), 0.0);
        assert!((calc.combine(0.8, 0.9, 0.8) - 0.576).abs() < 1e-12);
    }

    #[test]
    fn test_lower_completeness_never_raises_confidence() {
        let calc = ConfidenceCalculator::new();
        let mut previous = f64::INFINITY;
        for step in (0..=10).rev() {
            let completeness = step as f64 / 10.0;
            let confidence = calc.combine(completeness, 0.9, 0.75);
            assert!(confidence <= previous);
            previous = confidence;
        }
    }

    #[test]
    fn test_weighted_mean_respects_weights() {
        let calc = ConfidenceCalculator::new();
        // A low-weight pillar with poor confidence must not dominate.
        let confidence = calc.weighted(&[(0.9, 0.8), (0.1, 0.2)]).unwrap();
        assert!((confidence - 0.74).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean_rejects_zero_weight() {
        let calc = ConfidenceCalculator::new();
        assert!(matches!(
            calc.weighted(&[(0.0, 0.5)]),
            Err(ScoringError::CalculationError(_))
        ));
    }

    #[test]
    fn test_funding_staleness() {
        let as_of = date(2025, 6, 30);
        let mut financials = Financials {
            funding_history: vec![FundingRound {
                round_type: "Series A".to_string(),
                amount: 40.0,
                date: date(2024, 3, 1),
                investors: vec![],
            }],
            ..Financials::default()
        };
        assert!(funding_is_stale(&financials, as_of));

        financials.funding_history[0].date = date(2024, 9, 1);
        assert!(!funding_is_stale(&financials, as_of));

        financials.funding_history.clear();
        assert!(funding_is_stale(&financials, as_of));
    }
}
