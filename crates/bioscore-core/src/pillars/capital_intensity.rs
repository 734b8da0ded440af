//! Capital Intensity Pillar
//!
//! **Question**: How much capital must be raised to reach the next value inflection?
//!
//! Higher scores mean lower capital needs relative to resources.
//!
//! ## Factors
//!
//! | Factor | Weight | Driver |
//! |--------|--------|--------|
//! | Development Cost | 0.30 | Stage, indication complexity, program count |
//! | Capital Efficiency | 0.30 | Monthly burn per program |
//! | Regulatory Cost | 0.20 | Pathway, Phase 3 exposure, trial count |
//! | Funding Runway | 0.20 | Months of cash at current burn |
//!
//! Sector benchmarks from the market context are quoted in the rationale. Without
//! any burn or runway benchmark the pillar's data quality takes the missing-context
//! penalty.

use crate::confidence::{funding_is_stale, QualitySignals, RecordCoverage};
use crate::heuristics::{trial_is_complete, BucketTable, LookupTable, COMPLEXITY_KEYWORDS};
use crate::types::{
    Benchmarks, CompanyData, DevelopmentStage, MarketContext, PillarId, PillarInfo, PillarScore,
    RegulatoryPathway, ScoringFactor, TrialPhase, ValidationCode, ValidationResult,
};
use crate::validation::{self, ValidationBuilder};
use crate::ScoringError;

use super::{ensure_valid, finish, Assessment, FactorBuilder, PillarConfig, PillarScorer};

const REQUIRED_FIELDS: &[&str] = &[
    "basic_info.stage",
    "financials.burn_rate",
    "financials.cash_position",
    "financials.runway",
    "financials.funding_history",
    "pipeline.programs",
];

const DEVELOPMENT_COST_BY_STAGE: LookupTable<DevelopmentStage> = LookupTable::new(
    &[
        (DevelopmentStage::Discovery, 4.5),
        (DevelopmentStage::Preclinical, 4.5),
        (DevelopmentStage::Phase1, 4.0),
        (DevelopmentStage::Phase2, 3.5),
        (DevelopmentStage::Phase3, 2.5),
        (DevelopmentStage::Filed, 3.0),
        (DevelopmentStage::Approved, 3.5),
    ],
    3.0,
);

/// Monthly burn per program, USD M.
const BURN_PER_PROGRAM: BucketTable = BucketTable::new(
    0.0,
    &[(2.0, 4.5), (5.0, 4.0), (10.0, 3.0), (20.0, 2.0)],
    1.5,
);

const REGULATORY_COST_BY_PATHWAY: LookupTable<RegulatoryPathway> = LookupTable::new(
    &[
        (RegulatoryPathway::Abbreviated, 4.2),
        (RegulatoryPathway::Orphan, 4.0),
        (RegulatoryPathway::Breakthrough, 4.0),
        (RegulatoryPathway::Accelerated, 3.8),
        (RegulatoryPathway::FastTrack, 3.7),
        (RegulatoryPathway::PriorityReview, 3.5),
        (RegulatoryPathway::Standard, 3.0),
    ],
    3.0,
);

/// Runway in months.
const RUNWAY: BucketTable = BucketTable::new(
    0.0,
    &[(6.0, 1.0), (12.0, 2.0), (18.0, 3.0), (24.0, 4.0)],
    4.5,
);

const UNKNOWN_RUNWAY_SCORE: f64 = 2.0;
const SHORT_RUNWAY_MONTHS: f64 = 12.0;
const INEFFICIENT_BURN_PER_PROGRAM: f64 = 20.0;

/// The Capital Intensity pillar.
pub struct CapitalIntensityPillar {
    config: PillarConfig,
}

impl CapitalIntensityPillar {
    pub fn new(config: PillarConfig) -> Self {
        Self { config }
    }

    fn development_cost(&self, data: &CompanyData) -> ScoringFactor {
        let stage = data.basic_info.stage;
        let base = DEVELOPMENT_COST_BY_STAGE.get_or_default(stage);
        let programs = data.pipeline.programs.len();
        let complex_area = COMPLEXITY_KEYWORDS
            .find_in(data.basic_info.therapeutic_areas.iter().map(String::as_str));

        FactorBuilder::new(
            "Development Cost",
            0.30,
            base,
            format!("{} stage base {:.1}", stage_label(stage), base),
        )
        .adjust(
            complex_area.is_some(),
            -0.3,
            format!("Complex therapeutic area ({})", complex_area.unwrap_or_default()),
        )
        .adjust(programs == 1, 0.2, "Focused single-program spend")
        .adjust(programs > 5, -0.3, format!("Broad pipeline of {} programs", programs))
        .build()
    }

    fn capital_efficiency(&self, burn: f64, burn_per_program: f64, benchmarks: &Benchmarks) -> ScoringFactor {
        let peer = benchmarks
            .median_burn_rate
            .filter(|median| *median > 0.0)
            .map(|median| {
                format!(
                    "Company burn is {:.1}x the sector median of ${:.1}M",
                    burn / median,
                    median
                )
            });

        FactorBuilder::new(
            "Capital Efficiency",
            0.30,
            BURN_PER_PROGRAM.score(burn_per_program),
            format!(
                "Burn of ${:.1}M per program per month falls in {}",
                burn_per_program,
                BURN_PER_PROGRAM.label(burn_per_program)
            ),
        )
        .note(peer)
        .build()
    }

    fn regulatory_cost(&self, data: &CompanyData) -> ScoringFactor {
        let pathway = data.regulatory.pathway;
        let base = REGULATORY_COST_BY_PATHWAY.get_or_default(pathway);
        let phase3_trials = data.regulatory.trials_in_phase(TrialPhase::Phase3);
        let trials = data.regulatory.clinical_trials.len();

        FactorBuilder::new(
            "Regulatory Cost",
            0.20,
            base,
            format!("{} pathway base {:.1}", pathway_label(pathway), base),
        )
        .adjust(
            phase3_trials >= 2,
            -0.5,
            format!("{} concurrent Phase 3 trials", phase3_trials),
        )
        .adjust(trials > 5, -0.3, format!("{} active trial programs", trials))
        .build()
    }

    fn funding_runway(&self, runway: Option<f64>, benchmarks: &Benchmarks) -> ScoringFactor {
        let peer = benchmarks
            .median_runway_months
            .map(|median| format!("Sector median runway is {:.1} months", median));

        match runway {
            Some(months) => FactorBuilder::new(
                "Funding Runway",
                0.20,
                RUNWAY.score(months),
                format!("{:.1} months of runway falls in {}", months, RUNWAY.label(months)),
            ),
            None => FactorBuilder::new(
                "Funding Runway",
                0.20,
                UNKNOWN_RUNWAY_SCORE,
                "Runway unknown",
            ),
        }
        .note(peer)
        .build()
    }
}

impl PillarScorer for CapitalIntensityPillar {
    fn pillar_id(&self) -> PillarId {
        PillarId::CapitalIntensity
    }

    fn pillar_info(&self) -> PillarInfo {
        PillarInfo {
            id: PillarId::CapitalIntensity,
            name: PillarId::CapitalIntensity.name().to_string(),
            description: "Capital required to reach the next value inflection, judged from development \
                          stage, burn efficiency, regulatory cost and funding runway"
                .to_string(),
            methodology_reliability: self.config.methodology_reliability,
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn validate_data(&self, data: &CompanyData) -> ValidationResult {
        let mut builder = ValidationBuilder::new();
        let financials = &data.financials;

        match financials.burn_rate {
            None => {
                builder.missing("financials.burn_rate");
            }
            Some(burn) if !burn.is_finite() => {
                builder.critical(
                    "financials.burn_rate",
                    ValidationCode::Malformed,
                    "Burn rate is not a finite number",
                );
            }
            Some(burn) if !(burn > 0.0) => {
                builder.critical(
                    "financials.burn_rate",
                    ValidationCode::OutOfRange,
                    format!("Burn rate must be positive, got {}", burn),
                );
            }
            Some(_) => {}
        }

        match financials.cash_position {
            Some(cash) if !cash.is_finite() => {
                builder.error(
                    "financials.cash_position",
                    ValidationCode::Malformed,
                    "Cash position is not a finite number",
                );
            }
            Some(cash) if cash < 0.0 => {
                builder.error(
                    "financials.cash_position",
                    ValidationCode::OutOfRange,
                    format!("Cash position cannot be negative, got {}", cash),
                );
            }
            Some(_) => {}
            None => {
                builder.warn("financials.cash_position", "Cash position not reported");
            }
        }

        match financials.runway {
            Some(runway) if !runway.is_finite() => {
                builder.error(
                    "financials.runway",
                    ValidationCode::Malformed,
                    "Runway is not a finite number",
                );
            }
            Some(runway) if runway < 0.0 => {
                builder.error(
                    "financials.runway",
                    ValidationCode::OutOfRange,
                    format!("Runway cannot be negative, got {}", runway),
                );
            }
            Some(_) => {}
            None => {
                builder.warn(
                    "financials.runway",
                    "Runway not reported; derived from cash position and burn rate",
                );
            }
        }

        if data.pipeline.programs.is_empty() {
            builder.warn("pipeline.programs", "No development programs listed");
        }
        if financials.funding_history.is_empty() {
            builder.warn("financials.funding_history", "No funding history reported");
        }

        builder.finish(validation::completeness(data, REQUIRED_FIELDS))
    }

    fn calculate_score(
        &self,
        data: &CompanyData,
        context: &MarketContext,
    ) -> Result<PillarScore, ScoringError> {
        ensure_valid(self.validate_data(data))?;

        let financials = &data.financials;
        let burn = financials
            .burn_rate
            .ok_or_else(|| ScoringError::MissingRequiredField("financials.burn_rate".to_string()))?;
        let burn_per_program = burn / data.pipeline.programs.len().max(1) as f64;
        let runway = financials.runway_months();
        let burn_exceeds_cash = financials.cash_position.is_some_and(|cash| burn > cash);

        let factors = vec![
            self.development_cost(data),
            self.capital_efficiency(burn, burn_per_program, &context.benchmarks),
            self.regulatory_cost(data),
            self.funding_runway(runway, &context.benchmarks),
        ];

        let mut red_flags = Vec::new();
        if runway.is_some_and(|months| months < SHORT_RUNWAY_MONTHS) {
            red_flags.push("Short funding runway may require immediate capital raising".to_string());
        }
        if data.regulatory.trials_in_phase(TrialPhase::Phase3) >= 2 {
            red_flags.push("Multiple Phase 3 trials significantly increase capital requirements".to_string());
        }
        if burn_exceeds_cash {
            red_flags.push("Monthly burn rate exceeds current cash position".to_string());
        }
        if burn_per_program >= INEFFICIENT_BURN_PER_PROGRAM {
            red_flags.push("High burn per program indicates capital inefficiency".to_string());
        }

        let quality = QualitySignals {
            stale: funding_is_stale(financials, context.as_of),
            inconsistent: burn_exceeds_cash,
            missing_context: context.benchmarks.median_burn_rate.is_none()
                && context.benchmarks.median_runway_months.is_none(),
            coverage: Some(RecordCoverage::of(
                &data.regulatory.clinical_trials,
                trial_is_complete,
            )),
        };

        Ok(finish(
            PillarId::CapitalIntensity,
            &self.config,
            data,
            REQUIRED_FIELDS,
            Assessment {
                factors,
                red_flags,
                quality,
            },
        ))
    }
}

fn stage_label(stage: Option<DevelopmentStage>) -> &'static str {
    stage.map(|s| s.label()).unwrap_or("Unknown")
}

fn pathway_label(pathway: Option<RegulatoryPathway>) -> &'static str {
    match pathway {
        Some(RegulatoryPathway::Standard) => "Standard",
        Some(RegulatoryPathway::Accelerated) => "Accelerated approval",
        Some(RegulatoryPathway::Breakthrough) => "Breakthrough",
        Some(RegulatoryPathway::FastTrack) => "Fast track",
        Some(RegulatoryPathway::PriorityReview) => "Priority review",
        Some(RegulatoryPathway::Orphan) => "Orphan",
        Some(RegulatoryPathway::Abbreviated) => "505(b)(2)",
        None => "No declared",
    }
}
