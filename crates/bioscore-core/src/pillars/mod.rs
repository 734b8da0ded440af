//! The four assessment pillars.
//!
//! Each pillar answers one readiness question and scores independently.
//! Pillars never see each other's scores; the engine combines them.
//!
//! ## Pillar Independence
//!
//! - Pillars read only the company snapshot and the shared market context
//! - No shared mutable state between pillars
//! - Factor order is fixed per pillar, so output is deterministic

mod capital_intensity;
mod market_potential;
mod pipeline_strength;
mod regulatory_risk;

pub use capital_intensity::CapitalIntensityPillar;
pub use market_potential::MarketPotentialPillar;
pub use pipeline_strength::PipelinePillar;
pub use regulatory_risk::RegulatoryRiskPillar;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::confidence::{ConfidenceCalculator, QualitySignals};
use crate::types::{
    CompanyData, FactorExplanation, MarketContext, PillarId, PillarInfo, PillarScore,
    ScoreExplanation, ScoringFactor, ValidationResult,
};
use crate::validation;
use crate::ScoringError;

/// Trait implemented by all pillars.
///
/// Implementations hold only immutable configuration, so one instance can
/// score many companies from many threads.
pub trait PillarScorer: Send + Sync {
    fn pillar_id(&self) -> PillarId;

    fn pillar_info(&self) -> PillarInfo;

    /// Dotted field paths this pillar needs. Drives completeness.
    fn required_fields(&self) -> &'static [&'static str];

    /// Pillar-specific checks. Errors block scoring; warnings do not.
    fn validate_data(&self, data: &CompanyData) -> ValidationResult;

    /// Score the company on this pillar.
    ///
    /// Fails with [`ScoringError::InvalidData`] when `validate_data` reports any error.
    fn calculate_score(
        &self,
        data: &CompanyData,
        context: &MarketContext,
    ) -> Result<PillarScore, ScoringError>;

    /// Narrative breakdown of a score this pillar produced.
    fn explain_score(&self, score: &PillarScore) -> ScoreExplanation {
        explain(score, &self.pillar_info())
    }
}

/// Per-pillar constants supplied at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarConfig {
    /// How much the methodology itself is trusted, in [0, 1]
    pub methodology_reliability: f64,

    /// Confidence below this adds a low-confidence warning
    pub low_confidence_threshold: f64,

    /// Completeness below this adds an incomplete-data warning
    pub low_completeness_threshold: f64,
}

impl PillarConfig {
    pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;
    pub const LOW_COMPLETENESS_THRESHOLD: f64 = 0.7;

    pub fn with_reliability(methodology_reliability: f64) -> Self {
        Self {
            methodology_reliability,
            low_confidence_threshold: Self::LOW_CONFIDENCE_THRESHOLD,
            low_completeness_threshold: Self::LOW_COMPLETENESS_THRESHOLD,
        }
    }

    /// Stock configuration for a pillar.
    pub fn for_pillar(pillar: PillarId) -> Self {
        let reliability = match pillar {
            PillarId::CapitalIntensity => 0.80,
            PillarId::MarketPotential => 0.70,
            PillarId::PipelineStrength => 0.75,
            PillarId::RegulatoryRisk => 0.75,
        };
        Self::with_reliability(reliability)
    }

    /// Replace whichever values `overrides` sets.
    pub fn apply(self, overrides: &PillarOverrides) -> Self {
        Self {
            methodology_reliability: overrides
                .methodology_reliability
                .unwrap_or(self.methodology_reliability),
            low_confidence_threshold: overrides
                .low_confidence_threshold
                .unwrap_or(self.low_confidence_threshold),
            low_completeness_threshold: overrides
                .low_completeness_threshold
                .unwrap_or(self.low_completeness_threshold),
        }
    }
}

/// Partial [`PillarConfig`] as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarOverrides {
    pub methodology_reliability: Option<f64>,
    pub low_confidence_threshold: Option<f64>,
    pub low_completeness_threshold: Option<f64>,
}

/// One scorer per pillar, in pillar order, with `overrides` applied.
pub fn default_pillars(overrides: &BTreeMap<PillarId, PillarOverrides>) -> Vec<Arc<dyn PillarScorer>> {
    let config = |pillar: PillarId| {
        let base = PillarConfig::for_pillar(pillar);
        match overrides.get(&pillar) {
            Some(o) => base.apply(o),
            None => base,
        }
    };

    vec![
        Arc::new(CapitalIntensityPillar::new(config(PillarId::CapitalIntensity))),
        Arc::new(MarketPotentialPillar::new(config(PillarId::MarketPotential))),
        Arc::new(PipelinePillar::new(config(PillarId::PipelineStrength))),
        Arc::new(RegulatoryRiskPillar::new(config(PillarId::RegulatoryRisk))),
    ]
}

/// Builds one factor from a base score and a list of adjustments.
pub(crate) struct FactorBuilder {
    name: &'static str,
    weight: f64,
    score: f64,
    notes: Vec<String>,
}

impl FactorBuilder {
    pub(crate) fn new(name: &'static str, weight: f64, base: f64, note: impl Into<String>) -> Self {
        Self {
            name,
            weight,
            score: base,
            notes: vec![note.into()],
        }
    }

    /// Add `delta` to the score when `condition` holds.
    pub(crate) fn adjust(mut self, condition: bool, delta: f64, note: impl Into<String>) -> Self {
        if condition {
            self.score += delta;
            self.notes.push(format!("{} ({:+.1})", note.into(), delta));
        }
        self
    }

    /// Add context to the rationale without moving the score.
    pub(crate) fn note(mut self, note: Option<String>) -> Self {
        self.notes.extend(note);
        self
    }

    pub(crate) fn build(self) -> ScoringFactor {
        ScoringFactor::new(self.name, self.weight, self.score, self.notes.join("; "))
    }
}

/// Σ weight·score, clamped to [0, 5].
pub fn combine_factors(factors: &[ScoringFactor]) -> f64 {
    factors
        .iter()
        .map(ScoringFactor::contribution)
        .sum::<f64>()
        .clamp(0.0, 5.0)
}

/// Warnings every pillar emits for weak confidence or thin data.
pub fn generic_warnings(
    pillar: PillarId,
    config: &PillarConfig,
    confidence: f64,
    completeness: f64,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if confidence < config.low_confidence_threshold {
        warnings.push(format!(
            "Low confidence in {} assessment ({:.0}%)",
            pillar.name(),
            confidence * 100.0
        ));
    }
    if completeness < config.low_completeness_threshold {
        warnings.push(format!(
            "Incomplete data for {} ({:.0}% of required fields present)",
            pillar.name(),
            completeness * 100.0
        ));
    }
    warnings
}

/// Turn a failed validation into the matching error.
pub(crate) fn ensure_valid(result: ValidationResult) -> Result<ValidationResult, ScoringError> {
    if result.is_valid {
        Ok(result)
    } else {
        Err(ScoringError::from_validation(result))
    }
}

/// What a pillar computed, before the shared confidence and warning steps.
pub(crate) struct Assessment {
    pub factors: Vec<ScoringFactor>,
    pub red_flags: Vec<String>,
    pub quality: QualitySignals,
}

/// Shared tail of every `calculate_score`.
pub(crate) fn finish(
    pillar: PillarId,
    config: &PillarConfig,
    data: &CompanyData,
    required_fields: &[&str],
    assessment: Assessment,
) -> PillarScore {
    let calculator = ConfidenceCalculator::new();
    let completeness = validation::completeness(data, required_fields);
    let quality = calculator.data_quality(&assessment.quality);
    let confidence = calculator.combine(completeness, quality, config.methodology_reliability);
    let raw_score = combine_factors(&assessment.factors);

    let mut warnings = assessment.red_flags;
    warnings.extend(generic_warnings(pillar, config, confidence, completeness));

    let explanation = summarize(pillar, raw_score, confidence, &assessment.factors);

    tracing::debug!(
        pillar = ?pillar,
        raw_score,
        confidence,
        completeness,
        data_quality = quality,
        "pillar scored"
    );

    PillarScore {
        pillar,
        raw_score,
        confidence,
        factors: assessment.factors,
        warnings,
        explanation,
    }
}

fn summarize(pillar: PillarId, raw_score: f64, confidence: f64, factors: &[ScoringFactor]) -> String {
    let mut summary = format!(
        "{} scored {:.2}/5 with {:.0}% confidence",
        pillar.name(),
        raw_score,
        confidence * 100.0
    );

    // First factor wins ties, keeping the text stable.
    let strongest = factors
        .iter()
        .fold(None::<&ScoringFactor>, |best, f| match best {
            Some(b) if b.score >= f.score => Some(b),
            _ => Some(f),
        });
    let weakest = factors
        .iter()
        .fold(None::<&ScoringFactor>, |worst, f| match worst {
            Some(w) if w.score <= f.score => Some(w),
            _ => Some(f),
        });

    if let (Some(strong), Some(weak)) = (strongest, weakest) {
        summary.push_str(&format!(
            "; strongest factor: {} ({:.1}), weakest factor: {} ({:.1})",
            strong.name, strong.score, weak.name, weak.score
        ));
    }
    summary
}

/// Deterministic narrative for a pillar score.
pub fn explain(score: &PillarScore, info: &PillarInfo) -> ScoreExplanation {
    let factors = score
        .factors
        .iter()
        .map(|factor| FactorExplanation {
            name: factor.name.clone(),
            weight: factor.weight,
            score: factor.score,
            contribution: factor.contribution(),
            rationale: factor.rationale.clone(),
        })
        .collect::<Vec<_>>();

    let terms = score
        .factors
        .iter()
        .map(|factor| format!("{:.2} × {:.2}", factor.weight, factor.score))
        .collect::<Vec<_>>()
        .join(" + ");
    let sum: f64 = score.factors.iter().map(ScoringFactor::contribution).sum();
    let mut calculation = format!("{} = {:.2}", terms, sum);
    if (sum - score.raw_score).abs() > 1e-9 {
        calculation.push_str(&format!(" (clamped to {:.2})", score.raw_score));
    }

    let level = match score.confidence {
        c if c >= 0.8 => "high",
        c if c >= 0.6 => "moderate",
        c if c >= 0.4 => "low",
        _ => "very low",
    };
    let confidence_note = format!(
        "Confidence is {} ({:.0}%), bounded by data completeness, data quality and a methodology reliability of {:.0}%",
        level,
        score.confidence * 100.0,
        info.methodology_reliability * 100.0
    );

    ScoreExplanation {
        pillar: score.pillar,
        summary: score.explanation.clone(),
        factors,
        calculation,
        confidence_note,
    }
}
