//! Core types for bioscore evaluation.
//!
//! Company snapshots and market context flow into the pillars; scoring factors,
//! pillar scores and the final scoring result flow out. Every output record is
//! created once per evaluation and never mutated afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Company snapshot
// ============================================================================

/// Development stage of a company or program.
///
/// Ordered from earliest to latest so stages can be compared directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    Discovery,
    Preclinical,
    Phase1,
    Phase2,
    Phase3,
    Filed,
    Approved,
}

impl DevelopmentStage {
    /// Whether the stage involves human trials (Phase 1 or later).
    pub fn is_clinical(&self) -> bool {
        *self >= DevelopmentStage::Phase1
    }

    pub fn label(&self) -> &'static str {
        match self {
            DevelopmentStage::Discovery => "discovery",
            DevelopmentStage::Preclinical => "preclinical",
            DevelopmentStage::Phase1 => "Phase 1",
            DevelopmentStage::Phase2 => "Phase 2",
            DevelopmentStage::Phase3 => "Phase 3",
            DevelopmentStage::Filed => "filed",
            DevelopmentStage::Approved => "approved",
        }
    }
}

/// Snapshot of one company at evaluation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyData {
    pub basic_info: BasicInfo,

    #[serde(default)]
    pub financials: Financials,

    #[serde(default)]
    pub pipeline: Pipeline,

    #[serde(default)]
    pub regulatory: Regulatory,

    #[serde(default)]
    pub market: Market,
}

/// Identity and positioning of the company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BasicInfo {
    pub name: String,

    /// Most advanced development stage across the company
    #[serde(default)]
    pub stage: Option<DevelopmentStage>,

    #[serde(default)]
    pub therapeutic_areas: Vec<String>,

    #[serde(default)]
    pub founded_year: Option<i32>,

    #[serde(default)]
    pub employee_count: Option<u32>,

    #[serde(default)]
    pub headquarters: Option<String>,
}

/// Financial position. Monetary amounts are in USD millions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Financials {
    /// Monthly net cash burn
    #[serde(default)]
    pub burn_rate: Option<f64>,

    #[serde(default)]
    pub cash_position: Option<f64>,

    /// Funding runway in months
    #[serde(default)]
    pub runway: Option<f64>,

    #[serde(default)]
    pub funding_history: Vec<FundingRound>,
}

impl Financials {
    /// Runway in months: the reported value, else cash divided by burn.
    pub fn runway_months(&self) -> Option<f64> {
        match (self.runway, self.cash_position, self.burn_rate) {
            (Some(runway), _, _) => Some(runway),
            (None, Some(cash), Some(burn)) if burn > 0.0 => Some(cash / burn),
            _ => None,
        }
    }

    /// Date of the most recent funding round.
    pub fn latest_funding_date(&self) -> Option<NaiveDate> {
        self.funding_history.iter().map(|round| round.date).max()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundingRound {
    /// e.g. "Seed", "Series A"
    pub round_type: String,

    pub amount: f64,

    pub date: NaiveDate,

    #[serde(default)]
    pub investors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Pipeline {
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl Pipeline {
    /// Stage of the most advanced program.
    pub fn lead_stage(&self) -> Option<DevelopmentStage> {
        self.programs.iter().map(|program| program.stage).max()
    }
}

/// A single development program (asset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub name: String,

    #[serde(default)]
    pub mechanism: String,

    #[serde(default)]
    pub indication: String,

    pub stage: DevelopmentStage,

    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub description: String,

    #[serde(default)]
    pub target_date: Option<NaiveDate>,

    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Regulatory {
    #[serde(default)]
    pub clinical_trials: Vec<ClinicalTrial>,

    #[serde(default)]
    pub pathway: Option<RegulatoryPathway>,

    #[serde(default)]
    pub timeline: RegulatoryTimeline,
}

impl Regulatory {
    pub fn trials_in_phase(&self, phase: TrialPhase) -> usize {
        self.clinical_trials
            .iter()
            .filter(|trial| trial.phase == phase)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalTrial {
    /// Registry identifier, e.g. "NCT01234567"
    pub id: String,

    pub phase: TrialPhase,

    #[serde(default)]
    pub status: TrialStatus,

    #[serde(default)]
    pub indication: Option<String>,

    #[serde(default)]
    pub enrollment: Option<u32>,

    #[serde(default)]
    pub primary_endpoint: Option<String>,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Planned,
    Recruiting,
    #[default]
    Active,
    Completed,
    Suspended,
    Terminated,
}

impl TrialStatus {
    /// Suspended or terminated trials.
    pub fn is_setback(&self) -> bool {
        matches!(self, TrialStatus::Suspended | TrialStatus::Terminated)
    }
}

/// FDA regulatory pathway or expedited program.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryPathway {
    Standard,
    Accelerated,
    Breakthrough,
    FastTrack,
    PriorityReview,
    Orphan,
    /// 505(b)(2)
    Abbreviated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RegulatoryTimeline {
    #[serde(default)]
    pub expected_submission: Option<NaiveDate>,

    #[serde(default)]
    pub expected_approval: Option<NaiveDate>,
}

/// Market data. Market size is in USD billions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Market {
    #[serde(default)]
    pub addressable_market: Option<f64>,

    #[serde(default)]
    pub target_population: Option<u64>,

    #[serde(default)]
    pub competitors: Vec<String>,
}

// ============================================================================
// Market context
// ============================================================================

/// Benchmark and market data shared read-only by every pillar in an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketContext {
    /// Snapshot date. All date-relative heuristics measure from here.
    pub as_of: NaiveDate,

    #[serde(default)]
    pub benchmarks: Benchmarks,

    #[serde(default)]
    pub conditions: MarketConditions,

    #[serde(default)]
    pub comparables: Vec<ComparableCompany>,

    /// Free-form industry metrics (BTreeMap for deterministic iteration)
    #[serde(default)]
    pub industry_metrics: BTreeMap<String, f64>,
}

impl MarketContext {
    /// Context with neutral conditions and no comparables.
    pub fn neutral(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            benchmarks: Benchmarks::default(),
            conditions: MarketConditions::default(),
            comparables: Vec::new(),
            industry_metrics: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Benchmarks {
    /// Sector median monthly burn (USD M)
    #[serde(default)]
    pub median_burn_rate: Option<f64>,

    #[serde(default)]
    pub median_runway_months: Option<f64>,

    /// Sector median valuation (USD M)
    #[serde(default)]
    pub median_valuation: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketConditions {
    #[serde(default)]
    pub sentiment: MarketSentiment,

    #[serde(default)]
    pub ipo_window_open: bool,

    /// Trailing change of the biotech index, in percent
    #[serde(default)]
    pub biotech_index_change_pct: f64,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            sentiment: MarketSentiment::Neutral,
            ipo_window_open: false,
            biotech_index_change_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketSentiment {
    Bull,
    #[default]
    Neutral,
    Bear,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparableCompany {
    pub name: String,

    pub stage: DevelopmentStage,

    #[serde(default)]
    pub therapeutic_areas: Vec<String>,

    /// Valuation in USD M
    #[serde(default)]
    pub valuation: Option<f64>,
}

// ============================================================================
// Pillars and scores
// ============================================================================

/// The four assessment pillars.
///
/// Ordered alphabetically for deterministic iteration in BTreeMap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PillarId {
    CapitalIntensity,
    MarketPotential,
    PipelineStrength,
    RegulatoryRisk,
}

impl PillarId {
    /// Every pillar, in iteration order.
    pub const ALL: [PillarId; 4] = [
        PillarId::CapitalIntensity,
        PillarId::MarketPotential,
        PillarId::PipelineStrength,
        PillarId::RegulatoryRisk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PillarId::CapitalIntensity => "Capital Intensity",
            PillarId::MarketPotential => "Market Potential",
            PillarId::PipelineStrength => "Pipeline Strength",
            PillarId::RegulatoryRisk => "Regulatory Risk",
        }
    }

    /// The readiness question this pillar answers.
    pub fn question(&self) -> &'static str {
        match self {
            PillarId::CapitalIntensity => "How much capital must be raised to reach the next value inflection?",
            PillarId::MarketPotential => "Is there a large, reachable market for the lead assets?",
            PillarId::PipelineStrength => "Is the pipeline deep, mature and executing on plan?",
            PillarId::RegulatoryRisk => "How likely and how fast is the path to approval?",
        }
    }
}

/// One weighted sub-judgment inside a pillar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringFactor {
    pub name: String,

    /// Declared weight in [0, 1]
    pub weight: f64,

    /// Score in [0, 5], higher is more favorable
    pub score: f64,

    pub rationale: String,
}

impl ScoringFactor {
    /// Create a factor, clamping weight to [0, 1] and score to [0, 5].
    pub fn new(name: impl Into<String>, weight: f64, score: f64, rationale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: weight.clamp(0.0, 1.0),
            score: score.clamp(0.0, 5.0),
            rationale: rationale.into(),
        }
    }

    /// weight × score
    pub fn contribution(&self) -> f64 {
        self.weight * self.score
    }
}

/// Result of scoring one pillar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PillarScore {
    pub pillar: PillarId,

    /// Weighted factor combination, clamped to [0, 5]
    pub raw_score: f64,

    /// Confidence in [0, 1]
    pub confidence: f64,

    pub factors: Vec<ScoringFactor>,

    #[serde(default)]
    pub warnings: Vec<String>,

    pub explanation: String,
}

/// Descriptive metadata for a pillar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PillarInfo {
    pub id: PillarId,
    pub name: String,
    pub description: String,
    pub methodology_reliability: f64,
}

/// Narrative breakdown of a pillar score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreExplanation {
    pub pillar: PillarId,
    pub summary: String,
    pub factors: Vec<FactorExplanation>,

    /// The combination arithmetic, e.g. "0.30 × 4.70 + 0.70 × 4.50 = 4.56"
    pub calculation: String,

    pub confidence_note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorExplanation {
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub contribution: f64,
    pub rationale: String,
}

// ============================================================================
// Validation
// ============================================================================

/// Severity of a blocking validation error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Critical,
    Error,
}

/// What kind of problem a validation error describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    MissingField,
    OutOfRange,
    Inconsistent,
    Malformed,
}

/// A blocking problem with the input data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// Dotted field path, e.g. "financials.burn_rate"
    pub field: String,
    pub message: String,
    pub severity: ValidationSeverity,
    pub code: ValidationCode,
}

/// An advisory problem. Never blocks scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    /// True iff `errors` is empty
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,

    /// Fraction of expected fields present and well-formed, in [0, 1]
    pub completeness: f64,
}

impl ValidationResult {
    pub fn new(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>, completeness: f64) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            completeness: completeness.clamp(0.0, 1.0),
        }
    }

    /// Fold another result's errors and warnings into this one, skipping exact duplicates.
    ///
    /// Completeness is left untouched; callers compute it over the combined field set.
    pub fn absorb(&mut self, other: ValidationResult) {
        for error in other.errors {
            if !self.errors.contains(&error) {
                self.errors.push(error);
            }
        }
        for warning in other.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        self.is_valid = self.errors.is_empty();
    }
}

// ============================================================================
// Configuration and results
// ============================================================================

/// Pillar weights. Non-negative; normalized to sum to 1.0 before use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeightConfig(pub BTreeMap<PillarId, f64>);

impl WeightConfig {
    pub fn new(weights: impl IntoIterator<Item = (PillarId, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    pub fn get(&self, pillar: PillarId) -> Option<f64> {
        self.0.get(&pillar).copied()
    }

    pub fn pillars(&self) -> impl Iterator<Item = PillarId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PillarId, f64)> + '_ {
        self.0.iter().map(|(pillar, weight)| (*pillar, *weight))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::new([
            (PillarId::CapitalIntensity, 0.25),
            (PillarId::MarketPotential, 0.25),
            (PillarId::PipelineStrength, 0.20),
            (PillarId::RegulatoryRisk, 0.30),
        ])
    }
}

/// Per-evaluation configuration supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: WeightConfig,
}

/// One pillar's share of the overall score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PillarContribution {
    pub pillar: PillarId,

    /// Normalized weight
    pub weight: f64,

    pub raw_score: f64,

    /// weight × raw_score
    pub contribution: f64,
}

/// Output of the weighting engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedScore {
    /// Σ contributions, on the same [0, 5] scale as the pillars
    pub overall: f64,
    pub contributions: Vec<PillarContribution>,
}

/// Coarse readiness classification of a scored company.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTier {
    IpoReady,
    PartnershipReady,
    Developing,
    EarlyStage,
    /// Confidence too low to classify
    InsufficientData,
}

impl ReadinessTier {
    pub fn label(&self) -> &'static str {
        match self {
            ReadinessTier::IpoReady => "IPO ready",
            ReadinessTier::PartnershipReady => "Partnership ready",
            ReadinessTier::Developing => "Developing",
            ReadinessTier::EarlyStage => "Early stage",
            ReadinessTier::InsufficientData => "Insufficient data",
        }
    }
}

/// Final output of one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringResult {
    pub company_name: String,

    /// Weighted overall score in [0, 5]
    pub overall_score: f64,

    /// Weight-normalized mean of pillar confidences
    pub overall_confidence: f64,

    pub readiness: ReadinessTier,

    pub pillar_scores: BTreeMap<PillarId, PillarScore>,

    pub contributions: Vec<PillarContribution>,

    /// Pillar warnings, deduplicated by exact text
    #[serde(default)]
    pub warnings: Vec<String>,

    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(DevelopmentStage::Preclinical < DevelopmentStage::Phase1);
        assert!(DevelopmentStage::Phase3 < DevelopmentStage::Approved);
        assert!(!DevelopmentStage::Preclinical.is_clinical());
        assert!(DevelopmentStage::Phase1.is_clinical());
    }

    #[test]
    fn test_stage_serde_names() {
        let stage: DevelopmentStage = serde_json::from_str("\"phase3\"").unwrap();
        assert_eq!(stage, DevelopmentStage::Phase3);
        let pathway: RegulatoryPathway = serde_json::from_str("\"fast_track\"").unwrap();
        assert_eq!(pathway, RegulatoryPathway::FastTrack);
    }

    #[test]
    fn test_scoring_factor_clamps() {
        let factor = ScoringFactor::new("Test", 1.4, 5.7, "over the top");
        assert_eq!(factor.weight, 1.0);
        assert_eq!(factor.score, 5.0);

        let factor = ScoringFactor::new("Test", -0.1, -2.0, "below the floor");
        assert_eq!(factor.weight, 0.0);
        assert_eq!(factor.score, 0.0);
    }

    #[test]
    fn test_runway_derived_from_cash_and_burn() {
        let financials = Financials {
            burn_rate: Some(2.0),
            cash_position: Some(30.0),
            runway: None,
            funding_history: vec![],
        };
        assert_eq!(financials.runway_months(), Some(15.0));

        let reported = Financials {
            runway: Some(9.0),
            ..financials
        };
        assert_eq!(reported.runway_months(), Some(9.0));
    }

    #[test]
    fn test_validation_result_absorb_dedupes() {
        let error = ValidationError {
            field: "basic_info.stage".to_string(),
            message: "Required field is missing".to_string(),
            severity: ValidationSeverity::Critical,
            code: ValidationCode::MissingField,
        };
        let mut result = ValidationResult::new(vec![error.clone()], vec![], 0.5);
        result.absorb(ValidationResult::new(vec![error], vec![], 1.0));

        assert_eq!(result.errors.len(), 1);
        assert!(!result.is_valid);
        assert_eq!(result.completeness, 0.5);
    }

    #[test]
    fn test_default_weights_cover_all_pillars() {
        let weights = WeightConfig::default();
        assert_eq!(weights.pillars().collect::<Vec<_>>(), PillarId::ALL.to_vec());
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_config_serializes_as_map() {
        let weights = WeightConfig::new([(PillarId::RegulatoryRisk, 2.0)]);
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, r#"{"regulatory_risk":2.0}"#);
    }
}
