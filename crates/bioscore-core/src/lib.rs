//! # bioscore-core
//!
//! Deterministic multi-pillar readiness scoring for biotech companies.
//!
//! This crate provides the core evaluation logic for bioscore, answering:
//! - How ready is this company for a partnership or an IPO?
//! - Which dimensions drive that judgment?
//! - How much should the judgment be trusted?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same snapshot, context and timestamp always produce the same result
//! 2. **Bounded**: Every pillar score is in [0, 5], every confidence in [0, 1]
//! 3. **Traceable**: Every factor carries a rationale; every pillar can explain its arithmetic
//! 4. **Parallel-safe**: Pillars score independently over shared immutable inputs
//!
//! ## Example
//!
//! ```rust,ignore
//! use bioscore_core::{evaluate, CompanyData, MarketContext, ScoringConfig, Snapshot};
//!
//! let company = CompanyData::from_yaml_file("company.yaml")?;
//! let context = MarketContext::from_yaml_file("market.yaml")?;
//! let result = evaluate(&company, &context, &ScoringConfig::default())?;
//!
//! println!("{}: {:.2}/5 ({})", result.company_name, result.overall_score, result.readiness.label());
//! ```

pub mod confidence;
pub mod engine;
pub mod fixtures;
pub mod heuristics;
pub mod pillars;
pub mod snapshot;
pub mod types;
pub mod validation;
pub mod weighting;

// Re-export main types at crate root
pub use confidence::{ConfidenceCalculator, QualitySignals, RecordCoverage};
pub use engine::ScoringEngine;
pub use pillars::{
    default_pillars, CapitalIntensityPillar, MarketPotentialPillar, PillarConfig,
    PillarOverrides, PillarScorer, PipelinePillar, RegulatoryRiskPillar,
};
pub use snapshot::{Snapshot, SnapshotError};
pub use types::{
    CompanyData, DevelopmentStage, MarketContext, PillarContribution, PillarId, PillarInfo,
    PillarScore, ReadinessTier, ScoreExplanation, ScoringConfig, ScoringFactor, ScoringResult,
    ValidationCode, ValidationError, ValidationResult, ValidationSeverity, ValidationWarning,
    WeightConfig, WeightedScore,
};
pub use validation::ValidationService;
pub use weighting::WeightingEngine;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during scoring
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid input data: {}", describe_errors(.errors))]
    InvalidData { errors: Vec<ValidationError> },

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Calculation failed: {0}")]
    CalculationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ScoringError {
    /// Error for a failed validation.
    ///
    /// A lone missing-field error becomes `MissingRequiredField`; anything else
    /// keeps every error in `InvalidData`.
    pub fn from_validation(result: ValidationResult) -> Self {
        match result.errors.as_slice() {
            [only] if only.code == ValidationCode::MissingField => {
                ScoringError::MissingRequiredField(only.field.clone())
            }
            _ => ScoringError::InvalidData {
                errors: result.errors,
            },
        }
    }
}

fn describe_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Evaluate a company with the stock pillars.
///
/// # Determinism
///
/// This function uses the current system time for `evaluated_at`.
/// For fully deterministic results (golden tests, audits), use [`evaluate_at`].
pub fn evaluate(
    data: &CompanyData,
    context: &MarketContext,
    config: &ScoringConfig,
) -> Result<ScoringResult, ScoringError> {
    evaluate_at(data, context, config, Utc::now())
}

/// Evaluate a company with the stock pillars and an explicit timestamp.
///
/// This function is fully deterministic: same inputs always produce same output.
pub fn evaluate_at(
    data: &CompanyData,
    context: &MarketContext,
    config: &ScoringConfig,
    evaluated_at: DateTime<Utc>,
) -> Result<ScoringResult, ScoringError> {
    ScoringEngine::new().evaluate_company_at(data, context, config, evaluated_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lone_missing_field_maps_to_missing_required_field() {
        let result = ValidationResult::new(
            vec![ValidationError {
                field: "market.addressable_market".to_string(),
                message: "Required field is missing".to_string(),
                severity: ValidationSeverity::Critical,
                code: ValidationCode::MissingField,
            }],
            vec![],
            0.5,
        );
        assert_eq!(
            ScoringError::from_validation(result),
            ScoringError::MissingRequiredField("market.addressable_market".to_string())
        );
    }

    #[test]
    fn test_mixed_errors_map_to_invalid_data() {
        let errors = vec![
            ValidationError {
                field: "basic_info.stage".to_string(),
                message: "Required field is missing".to_string(),
                severity: ValidationSeverity::Critical,
                code: ValidationCode::MissingField,
            },
            ValidationError {
                field: "financials.runway".to_string(),
                message: "Runway cannot be negative, got -1".to_string(),
                severity: ValidationSeverity::Error,
                code: ValidationCode::OutOfRange,
            },
        ];
        let error = ScoringError::from_validation(ValidationResult::new(errors, vec![], 0.5));
        assert!(matches!(&error, ScoringError::InvalidData { errors } if errors.len() == 2));
        assert_eq!(
            error.to_string(),
            "Invalid input data: basic_info.stage (Required field is missing); \
             financials.runway (Runway cannot be negative, got -1)"
        );
    }
}

/// Cross-pillar tests over the full evaluation path
#[cfg(test)]
mod cross_pillar_tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn context() -> MarketContext {
        MarketContext::from_yaml(fixtures::MARKET_CONTEXT).unwrap()
    }

    fn companies() -> Vec<CompanyData> {
        [
            fixtures::EFFICIENT_PRECLINICAL_COMPANY,
            fixtures::CLINICAL_COMPANY,
        ]
        .iter()
        .map(|yaml| CompanyData::from_yaml(yaml).unwrap())
        .collect()
    }

    #[test]
    fn test_identical_inputs_give_identical_json() {
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let config = ScoringConfig::default();

        let first = evaluate_at(&data, &context(), &config, fixed_time()).unwrap();
        let second = evaluate_at(&data, &context(), &config, fixed_time()).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_scores_and_confidences_are_bounded() {
        for data in companies() {
            let result = evaluate_at(&data, &context(), &ScoringConfig::default(), fixed_time()).unwrap();
            for score in result.pillar_scores.values() {
                assert!((0.0..=5.0).contains(&score.raw_score));
                assert!((0.0..=1.0).contains(&score.confidence));
                for factor in &score.factors {
                    assert!((0.0..=5.0).contains(&factor.score));
                    assert!((0.0..=1.0).contains(&factor.weight));
                }
            }
            assert!((0.0..=1.0).contains(&result.overall_confidence));
        }
    }

    #[test]
    fn test_overall_lies_between_pillar_extremes() {
        let weightings = [
            WeightConfig::default(),
            WeightConfig::new([(PillarId::CapitalIntensity, 9.0), (PillarId::MarketPotential, 1.0)]),
            WeightConfig::new([
                (PillarId::PipelineStrength, 0.5),
                (PillarId::RegulatoryRisk, 0.5),
            ]),
        ];

        for data in companies() {
            for weights in &weightings {
                let config = ScoringConfig {
                    weights: weights.clone(),
                };
                let result = evaluate_at(&data, &context(), &config, fixed_time()).unwrap();
                let raw: Vec<f64> = result.pillar_scores.values().map(|s| s.raw_score).collect();
                let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

                assert!(result.overall_score >= min - 1e-9);
                assert!(result.overall_score <= max + 1e-9);
            }
        }
    }

    #[test]
    fn test_removing_fields_never_raises_confidence() {
        let engine = ScoringEngine::new();
        let mut data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let regulatory = engine.scorer(PillarId::RegulatoryRisk).unwrap();

        let mut previous = regulatory.calculate_score(&data, &context()).unwrap().confidence;

        data.regulatory.timeline.expected_approval = None;
        let confidence = regulatory.calculate_score(&data, &context()).unwrap().confidence;
        assert!(confidence <= previous);
        previous = confidence;

        data.regulatory.pathway = None;
        let confidence = regulatory.calculate_score(&data, &context()).unwrap().confidence;
        assert!(confidence <= previous);
        previous = confidence;

        data.basic_info.therapeutic_areas.clear();
        let confidence = regulatory.calculate_score(&data, &context()).unwrap().confidence;
        assert!(confidence <= previous);
    }

    #[test]
    fn test_zero_burn_company_is_rejected() {
        let data = CompanyData::from_yaml(fixtures::ZERO_BURN_COMPANY).unwrap();
        let result = evaluate_at(&data, &context(), &ScoringConfig::default(), fixed_time());

        match result {
            Err(ScoringError::InvalidData { errors }) => {
                let burn = errors
                    .iter()
                    .find(|e| e.field == "financials.burn_rate")
                    .unwrap();
                assert_eq!(burn.severity, ValidationSeverity::Critical);
            }
            other => panic!("expected InvalidData, got {:?}", other),
        }
    }

    #[test]
    fn test_clinical_company_outcome() {
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let result = evaluate_at(&data, &context(), &ScoringConfig::default(), fixed_time()).unwrap();

        // 0.25 × 2.96 + 0.25 × 3.865 + 0.20 × 3.68 + 0.30 × 4.05
        assert!((result.overall_score - 3.65725).abs() < 1e-9);
        assert_eq!(result.readiness, ReadinessTier::PartnershipReady);
        assert!(result
            .warnings
            .contains(&"Multiple overdue milestones suggest execution delays".to_string()));
    }

    #[test]
    fn test_efficient_preclinical_outcome() {
        let data = CompanyData::from_yaml(fixtures::EFFICIENT_PRECLINICAL_COMPANY).unwrap();
        let result = evaluate_at(&data, &context(), &ScoringConfig::default(), fixed_time()).unwrap();

        let capital = &result.pillar_scores[&PillarId::CapitalIntensity];
        assert!((capital.raw_score - 4.5).abs() < 1e-9);
        assert_eq!(result.readiness, ReadinessTier::PartnershipReady);
        assert!(result
            .warnings
            .contains(&"Single-asset pipeline concentrates development risk".to_string()));
    }

    #[test]
    fn test_result_json_shape() {
        let data = CompanyData::from_yaml(fixtures::EFFICIENT_PRECLINICAL_COMPANY).unwrap();
        let result = evaluate_at(&data, &context(), &ScoringConfig::default(), fixed_time()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["readiness"], "partnership_ready");
        assert!(json["pillar_scores"]["capital_intensity"]["factors"].is_array());
        assert_eq!(json["evaluated_at"], "2025-07-01T12:00:00Z");
    }
}
