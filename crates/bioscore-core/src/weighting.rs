//! Weighting engine: weight normalization and the weighted overall score.

use std::collections::BTreeMap;

use crate::types::{
    PillarContribution, PillarId, PillarScore, ValidationCode, ValidationResult, WeightConfig,
    WeightedScore,
};
use crate::validation::ValidationBuilder;
use crate::ScoringError;

/// Applies pillar weights to pillar scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightingEngine;

impl WeightingEngine {
    /// A normalized weight above this dominates the overall score.
    pub const DOMINANCE_THRESHOLD: f64 = 0.5;

    pub fn new() -> Self {
        Self
    }

    /// Scale weights to sum to 1.0.
    pub fn normalize_weights(&self, weights: &WeightConfig) -> Result<WeightConfig, ScoringError> {
        if weights.is_empty() {
            return Err(ScoringError::ConfigurationError(
                "weight configuration is empty".to_string(),
            ));
        }

        for (pillar, weight) in weights.iter() {
            if !weight.is_finite() {
                return Err(ScoringError::ConfigurationError(format!(
                    "weight for {} is not a finite number",
                    pillar.name()
                )));
            }
            if weight < 0.0 {
                return Err(ScoringError::ConfigurationError(format!(
                    "weight for {} is negative ({})",
                    pillar.name(),
                    weight
                )));
            }
        }

        let Some(shares) = shares(weights) else {
            return Err(ScoringError::ConfigurationError(
                "weights sum to zero".to_string(),
            ));
        };

        Ok(WeightConfig::new(shares))
    }

    /// Combine pillar scores into one weighted score on the pillar scale.
    ///
    /// A scored pillar with no weight contributes nothing. A weighted pillar with
    /// no score is a calculation error.
    pub fn apply_weights(
        &self,
        scores: &BTreeMap<PillarId, PillarScore>,
        weights: &WeightConfig,
    ) -> Result<WeightedScore, ScoringError> {
        let normalized = self.normalize_weights(weights)?;

        let mut contributions = Vec::with_capacity(normalized.len());
        for (pillar, weight) in normalized.iter() {
            let score = scores.get(&pillar).ok_or_else(|| {
                ScoringError::CalculationError(format!(
                    "no score for weighted pillar {}",
                    pillar.name()
                ))
            })?;
            contributions.push(PillarContribution {
                pillar,
                weight,
                raw_score: score.raw_score,
                contribution: weight * score.raw_score,
            });
        }

        let overall: f64 = contributions.iter().map(|c| c.contribution).sum();

        Ok(WeightedScore {
            overall: overall.clamp(0.0, 5.0),
            contributions,
        })
    }

    /// Report every problem with a weight configuration without failing.
    pub fn validate_weights(&self, weights: &WeightConfig) -> ValidationResult {
        let mut builder = ValidationBuilder::new();

        if weights.is_empty() {
            builder.critical("weights", ValidationCode::MissingField, "No pillar weights configured");
        }

        for (pillar, weight) in weights.iter() {
            let field = format!("weights.{}", pillar_key(pillar));
            if !weight.is_finite() {
                builder.error(&field, ValidationCode::Malformed, "Weight is not a finite number");
            } else if weight < 0.0 {
                builder.error(
                    &field,
                    ValidationCode::OutOfRange,
                    format!("Weight must be non-negative, got {}", weight),
                );
            }
        }

        if !builder.has_errors() && !weights.is_empty() {
            match shares(weights) {
                None => {
                    builder.error("weights", ValidationCode::OutOfRange, "Weights sum to zero");
                }
                Some(shares) => {
                    for (pillar, normalized) in shares {
                        if normalized > Self::DOMINANCE_THRESHOLD {
                            builder.warn(
                                &format!("weights.{}", pillar_key(pillar)),
                                format!(
                                    "{} carries {:.0}% of the overall score",
                                    pillar.name(),
                                    normalized * 100.0
                                ),
                            );
                        }
                    }
                }
            }
        }

        let missing: Vec<&str> = PillarId::ALL
            .iter()
            .filter(|pillar| weights.get(**pillar).is_none())
            .map(|pillar| pillar.name())
            .collect();
        if !missing.is_empty() && !weights.is_empty() {
            builder.warn(
                "weights",
                format!("Not all pillars are weighted; missing: {}", missing.join(", ")),
            );
        }

        let configured = PillarId::ALL
            .iter()
            .filter(|pillar| weights.get(**pillar).is_some())
            .count();
        builder.finish(configured as f64 / PillarId::ALL.len() as f64)
    }
}

/// Each weight's share of the total, or None when the weights sum to zero.
///
/// Weights are scaled by the largest one first, so the sum stays finite for
/// any finite, non-negative input.
fn shares(weights: &WeightConfig) -> Option<Vec<(PillarId, f64)>> {
    let largest = weights.iter().map(|(_, weight)| weight).fold(0.0, f64::max);
    if !(largest > 0.0) {
        return None;
    }
    let total: f64 = weights.iter().map(|(_, weight)| weight / largest).sum();
    Some(
        weights
            .iter()
            .map(|(pillar, weight)| (pillar, weight / largest / total))
            .collect(),
    )
}

fn pillar_key(pillar: PillarId) -> &'static str {
    match pillar {
        PillarId::CapitalIntensity => "capital_intensity",
        PillarId::MarketPotential => "market_potential",
        PillarId::PipelineStrength => "pipeline_strength",
        PillarId::RegulatoryRisk => "regulatory_risk",
    }
}
