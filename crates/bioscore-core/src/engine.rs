//! Scoring engine: validates, runs the configured pillars and combines them.
//!
//! The engine applies a fixed sequence:
//! 1. Validate the weight configuration (before any pillar runs)
//! 2. Validate the company data against every configured pillar
//! 3. Score each configured pillar
//! 4. Weighted overall score and weighted confidence
//! 5. Deduplicate warnings and classify readiness
//!
//! Any failure aborts the evaluation. There is no partial result.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::confidence::ConfidenceCalculator;
use crate::pillars::{default_pillars, PillarOverrides, PillarScorer};
use crate::types::{
    CompanyData, MarketContext, PillarId, PillarScore, ReadinessTier, ScoreExplanation,
    ScoringConfig, ScoringResult, ValidationResult, WeightConfig, WeightedScore,
};
use crate::validation::ValidationService;
use crate::weighting::WeightingEngine;
use crate::ScoringError;

/// Runs pillars and aggregates their scores.
pub struct ScoringEngine {
    scorers: BTreeMap<PillarId, Arc<dyn PillarScorer>>,
    weighting: WeightingEngine,
    confidence: ConfidenceCalculator,
    validation: ValidationService,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngine {
    /// Below this overall confidence the readiness tier is `InsufficientData`,
    /// whatever the score.
    pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;

    /// Engine with the four stock pillars.
    pub fn new() -> Self {
        Self::with_overrides(&BTreeMap::new())
    }

    /// Engine with the four stock pillars and per-pillar overrides.
    pub fn with_overrides(overrides: &BTreeMap<PillarId, PillarOverrides>) -> Self {
        Self::with_scorers(default_pillars(overrides))
    }

    /// Engine with exactly these scorers. A later scorer replaces an earlier one
    /// for the same pillar.
    pub fn with_scorers(scorers: Vec<Arc<dyn PillarScorer>>) -> Self {
        let mut engine = Self {
            scorers: BTreeMap::new(),
            weighting: WeightingEngine::new(),
            confidence: ConfidenceCalculator::new(),
            validation: ValidationService::new(),
        };
        for scorer in scorers {
            engine.register(scorer);
        }
        engine
    }

    /// Register a scorer, replacing any existing one for its pillar.
    pub fn register(&mut self, scorer: Arc<dyn PillarScorer>) {
        self.scorers.insert(scorer.pillar_id(), scorer);
    }

    pub fn scorer(&self, pillar: PillarId) -> Option<&Arc<dyn PillarScorer>> {
        self.scorers.get(&pillar)
    }

    /// Registered scorers in pillar order.
    pub fn scorers(&self) -> impl Iterator<Item = &Arc<dyn PillarScorer>> {
        self.scorers.values()
    }

    /// Check the weights and resolve a scorer for every configured pillar.
    pub fn prepare(&self, config: &ScoringConfig) -> Result<Vec<Arc<dyn PillarScorer>>, ScoringError> {
        let check = self.weighting.validate_weights(&config.weights);
        if !check.is_valid {
            let reasons = check
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ScoringError::ConfigurationError(reasons));
        }

        config
            .weights
            .pillars()
            .map(|pillar| {
                self.scorers.get(&pillar).cloned().ok_or_else(|| {
                    ScoringError::ConfigurationError(format!(
                        "no scorer registered for {}",
                        pillar.name()
                    ))
                })
            })
            .collect()
    }

    /// Validate company data against every registered pillar.
    pub fn validate_input_data(&self, data: &CompanyData) -> ValidationResult {
        let scorers: Vec<_> = self.scorers.values().cloned().collect();
        self.validation.validate_input_data(data, &scorers)
    }

    /// Validate company data against `scorers`, failing on any error.
    pub fn check_input(
        &self,
        data: &CompanyData,
        scorers: &[Arc<dyn PillarScorer>],
    ) -> Result<ValidationResult, ScoringError> {
        let validation = self.validation.validate_input_data(data, scorers);
        if validation.is_valid {
            Ok(validation)
        } else {
            tracing::debug!(
                company = %data.basic_info.name,
                errors = validation.errors.len(),
                "company data rejected"
            );
            Err(ScoringError::from_validation(validation))
        }
    }

    /// Evaluate a company, stamping the result with the current time.
    ///
    /// For reproducible output use [`ScoringEngine::evaluate_company_at`].
    pub fn evaluate_company(
        &self,
        data: &CompanyData,
        context: &MarketContext,
        config: &ScoringConfig,
    ) -> Result<ScoringResult, ScoringError> {
        self.evaluate_company_at(data, context, config, Utc::now())
    }

    /// Evaluate a company with an explicit timestamp.
    ///
    /// This function is fully deterministic: same inputs always produce same output.
    pub fn evaluate_company_at(
        &self,
        data: &CompanyData,
        context: &MarketContext,
        config: &ScoringConfig,
        evaluated_at: DateTime<Utc>,
    ) -> Result<ScoringResult, ScoringError> {
        let scorers = self.prepare(config)?;
        self.check_input(data, &scorers)?;

        tracing::debug!(
            company = %data.basic_info.name,
            pillars = scorers.len(),
            "scoring company"
        );

        let mut scores = BTreeMap::new();
        for scorer in &scorers {
            let score = scorer.calculate_score(data, context)?;
            scores.insert(score.pillar, score);
        }

        self.assemble(data, config, scores, evaluated_at)
    }

    /// Combine finished pillar scores into the final result.
    pub fn assemble(
        &self,
        data: &CompanyData,
        config: &ScoringConfig,
        scores: BTreeMap<PillarId, PillarScore>,
        evaluated_at: DateTime<Utc>,
    ) -> Result<ScoringResult, ScoringError> {
        let weighted = self.calculate_weighted_score(&scores, &config.weights)?;
        let overall_confidence = self.calculate_confidence(&scores, &config.weights)?;
        let readiness = Self::classify(weighted.overall, overall_confidence);

        let mut warnings: Vec<String> = Vec::new();
        for score in scores.values() {
            for warning in &score.warnings {
                if !warnings.contains(warning) {
                    warnings.push(warning.clone());
                }
            }
        }

        tracing::debug!(
            company = %data.basic_info.name,
            overall_score = weighted.overall,
            overall_confidence,
            readiness = ?readiness,
            "company scored"
        );

        Ok(ScoringResult {
            company_name: data.basic_info.name.clone(),
            overall_score: weighted.overall,
            overall_confidence,
            readiness,
            pillar_scores: scores,
            contributions: weighted.contributions,
            warnings,
            evaluated_at,
        })
    }

    pub fn calculate_weighted_score(
        &self,
        scores: &BTreeMap<PillarId, PillarScore>,
        weights: &WeightConfig,
    ) -> Result<WeightedScore, ScoringError> {
        self.weighting.apply_weights(scores, weights)
    }

    /// Weight-normalized mean of pillar confidences.
    pub fn calculate_confidence(
        &self,
        scores: &BTreeMap<PillarId, PillarScore>,
        weights: &WeightConfig,
    ) -> Result<f64, ScoringError> {
        let normalized = self.weighting.normalize_weights(weights)?;
        let pairs = normalized
            .iter()
            .map(|(pillar, weight)| {
                scores
                    .get(&pillar)
                    .map(|score| (weight, score.confidence))
                    .ok_or_else(|| {
                        ScoringError::CalculationError(format!(
                            "no score for weighted pillar {}",
                            pillar.name()
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.confidence.weighted(&pairs)
    }

    /// Readiness tier for an overall score and confidence.
    pub fn classify(overall_score: f64, overall_confidence: f64) -> ReadinessTier {
        if overall_confidence < Self::LOW_CONFIDENCE_THRESHOLD {
            ReadinessTier::InsufficientData
        } else if overall_score >= 4.0 {
            ReadinessTier::IpoReady
        } else if overall_score >= 3.0 {
            ReadinessTier::PartnershipReady
        } else if overall_score >= 2.0 {
            ReadinessTier::Developing
        } else {
            ReadinessTier::EarlyStage
        }
    }

    /// Narrative for a score produced by one of this engine's pillars.
    pub fn explain(&self, score: &PillarScore) -> Option<ScoreExplanation> {
        self.scorers
            .get(&score.pillar)
            .map(|scorer| scorer.explain_score(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::pillars::CapitalIntensityPillar;
    use crate::pillars::PillarConfig;
    use crate::snapshot::Snapshot;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap()
    }

    fn context() -> MarketContext {
        MarketContext::from_yaml(fixtures::MARKET_CONTEXT).unwrap()
    }

    #[test]
    fn test_evaluates_all_default_pillars() {
        let engine = ScoringEngine::new();
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let result = engine
            .evaluate_company_at(&data, &context(), &ScoringConfig::default(), fixed_time())
            .unwrap();

        assert_eq!(result.company_name, "Corvane Oncology");
        assert_eq!(result.pillar_scores.len(), 4);
        assert_eq!(result.contributions.len(), 4);
        assert_eq!(result.evaluated_at, fixed_time());
        assert!(result.overall_score > 0.0 && result.overall_score <= 5.0);
    }

    #[test]
    fn test_invalid_weights_fail_before_scoring() {
        let engine = ScoringEngine::new();
        // Zero burn would fail validation; the configuration error must win.
        let data = CompanyData::from_yaml(fixtures::ZERO_BURN_COMPANY).unwrap();
        let config = ScoringConfig {
            weights: WeightConfig::new([(PillarId::CapitalIntensity, -1.0)]),
        };

        let result = engine.evaluate_company_at(&data, &context(), &config, fixed_time());
        assert!(matches!(result, Err(ScoringError::ConfigurationError(_))));
    }

    #[test]
    fn test_unregistered_pillar_is_configuration_error() {
        let engine = ScoringEngine::with_scorers(vec![Arc::new(CapitalIntensityPillar::new(
            PillarConfig::for_pillar(PillarId::CapitalIntensity),
        ))]);
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();

        let result =
            engine.evaluate_company_at(&data, &context(), &ScoringConfig::default(), fixed_time());
        match result {
            Err(ScoringError::ConfigurationError(message)) => {
                assert!(message.contains("Market Potential"));
            }
            other => panic!("expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_subset_configuration_runs_only_configured_pillars() {
        let engine = ScoringEngine::new();
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let config = ScoringConfig {
            weights: WeightConfig::new([(PillarId::RegulatoryRisk, 1.0)]),
        };

        let result = engine
            .evaluate_company_at(&data, &context(), &config, fixed_time())
            .unwrap();
        assert_eq!(result.pillar_scores.len(), 1);
        let regulatory = &result.pillar_scores[&PillarId::RegulatoryRisk];
        assert!((result.overall_score - regulatory.raw_score).abs() < 1e-9);
        assert!((result.overall_confidence - regulatory.confidence).abs() < 1e-9);
    }

    #[test]
    fn test_zero_burn_fails_with_invalid_data() {
        let engine = ScoringEngine::new();
        let data = CompanyData::from_yaml(fixtures::ZERO_BURN_COMPANY).unwrap();

        let result =
            engine.evaluate_company_at(&data, &context(), &ScoringConfig::default(), fixed_time());
        match result {
            Err(ScoringError::InvalidData { errors }) => {
                assert!(errors.iter().any(|e| e.field == "financials.burn_rate"));
            }
            other => panic!("expected InvalidData, got {:?}", other),
        }
    }

    #[test]
    fn test_warnings_are_deduplicated_in_pillar_order() {
        let engine = ScoringEngine::new();
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let result = engine
            .evaluate_company_at(&data, &context(), &ScoringConfig::default(), fixed_time())
            .unwrap();

        let mut expected: Vec<String> = Vec::new();
        for score in result.pillar_scores.values() {
            for warning in &score.warnings {
                if !expected.contains(warning) {
                    expected.push(warning.clone());
                }
            }
        }
        assert_eq!(result.warnings, expected);
        assert_eq!(
            result.warnings[0],
            "Short funding runway may require immediate capital raising"
        );
    }

    #[test]
    fn test_validate_input_data_covers_all_pillars() {
        let engine = ScoringEngine::new();
        let mut data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        data.market.addressable_market = None;
        data.financials.burn_rate = Some(-2.0);

        let validation = engine.validate_input_data(&data);
        assert!(!validation.is_valid);
        let fields: Vec<&str> = validation.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["financials.burn_rate", "market.addressable_market"]);
    }

    #[test]
    fn test_readiness_tiers() {
        assert_eq!(ScoringEngine::classify(4.2, 0.8), ReadinessTier::IpoReady);
        assert_eq!(ScoringEngine::classify(3.0, 0.8), ReadinessTier::PartnershipReady);
        assert_eq!(ScoringEngine::classify(2.5, 0.4), ReadinessTier::Developing);
        assert_eq!(ScoringEngine::classify(1.0, 0.9), ReadinessTier::EarlyStage);
        assert_eq!(ScoringEngine::classify(4.9, 0.39), ReadinessTier::InsufficientData);
    }

    #[test]
    fn test_explain_uses_registered_scorer() {
        let engine = ScoringEngine::new();
        let data = CompanyData::from_yaml(fixtures::EFFICIENT_PRECLINICAL_COMPANY).unwrap();
        let result = engine
            .evaluate_company_at(&data, &context(), &ScoringConfig::default(), fixed_time())
            .unwrap();

        let score = &result.pillar_scores[&PillarId::CapitalIntensity];
        let explanation = engine.explain(score).unwrap();
        assert_eq!(explanation.pillar, PillarId::CapitalIntensity);
        assert_eq!(
            explanation.calculation,
            "0.30 × 4.70 + 0.30 × 4.50 + 0.20 × 4.20 + 0.20 × 4.50 = 4.50"
        );
    }
}
