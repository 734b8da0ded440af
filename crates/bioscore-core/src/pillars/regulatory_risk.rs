//! Regulatory Risk Pillar
//!
//! **Question**: How likely and how fast is the path to approval?
//!
//! Higher scores mean lower regulatory risk.
//!
//! ## Factors
//!
//! | Factor | Weight | Driver |
//! |--------|--------|--------|
//! | Pathway Advantage | 0.30 | Declared FDA pathway or expedited program |
//! | Clinical Validation | 0.30 | Stage, completed and failed trials |
//! | Indication Complexity | 0.20 | Complex areas, novel modalities |
//! | Timeline Risk | 0.20 | Months from snapshot date to expected approval |

use crate::confidence::{QualitySignals, RecordCoverage};
use crate::heuristics::{
    is_valid_trial_id, trial_is_complete, BucketTable, LookupTable, COMPLEXITY_KEYWORDS,
    NOVEL_MODALITY_KEYWORDS,
};
use crate::types::{
    CompanyData, DevelopmentStage, MarketContext, PillarId, PillarInfo, PillarScore,
    RegulatoryPathway, ScoringFactor, TrialStatus, ValidationCode, ValidationResult,
};
use crate::validation::{self, ValidationBuilder};
use crate::ScoringError;

use super::{ensure_valid, finish, Assessment, FactorBuilder, PillarConfig, PillarScorer};

const REQUIRED_FIELDS: &[&str] = &[
    "basic_info.stage",
    "basic_info.therapeutic_areas",
    "regulatory.pathway",
    "regulatory.clinical_trials",
    "regulatory.timeline.expected_approval",
];

const PATHWAY_ADVANTAGE: LookupTable<RegulatoryPathway> = LookupTable::new(
    &[
        (RegulatoryPathway::Breakthrough, 4.5),
        (RegulatoryPathway::Abbreviated, 4.3),
        (RegulatoryPathway::Accelerated, 4.2),
        (RegulatoryPathway::Orphan, 4.2),
        (RegulatoryPathway::FastTrack, 4.0),
        (RegulatoryPathway::PriorityReview, 4.0),
        (RegulatoryPathway::Standard, 3.0),
    ],
    2.5,
);

/// How much clinical evidence a development stage represents.
pub(crate) const CLINICAL_VALIDATION_BY_STAGE: LookupTable<DevelopmentStage> = LookupTable::new(
    &[
        (DevelopmentStage::Discovery, 1.5),
        (DevelopmentStage::Preclinical, 2.0),
        (DevelopmentStage::Phase1, 2.5),
        (DevelopmentStage::Phase2, 3.0),
        (DevelopmentStage::Phase3, 3.8),
        (DevelopmentStage::Filed, 4.3),
        (DevelopmentStage::Approved, 5.0),
    ],
    1.5,
);

const INDICATION_COMPLEXITY_BASE: f64 = 4.0;

/// Months until expected approval.
const TIME_TO_APPROVAL: BucketTable = BucketTable::new(
    0.0,
    &[(12.0, 4.5), (24.0, 4.0), (48.0, 3.0), (84.0, 2.0)],
    1.5,
);

const UNKNOWN_TIMELINE_SCORE: f64 = 2.5;
const DAYS_PER_MONTH: f64 = 30.44;

/// The Regulatory Risk pillar.
pub struct RegulatoryRiskPillar {
    config: PillarConfig,
}

impl RegulatoryRiskPillar {
    pub fn new(config: PillarConfig) -> Self {
        Self { config }
    }

    fn pathway_advantage(&self, data: &CompanyData) -> ScoringFactor {
        let pathway = data.regulatory.pathway;
        let score = PATHWAY_ADVANTAGE.get_or_default(pathway);
        let note = match pathway {
            Some(p) => format!("{:?} pathway scores {:.1}", p, score),
            None => format!("No expedited pathway declared, scores {:.1}", score),
        };
        FactorBuilder::new("Pathway Advantage", 0.30, score, note).build()
    }

    fn clinical_validation(&self, data: &CompanyData) -> ScoringFactor {
        let stage = data.basic_info.stage;
        let base = CLINICAL_VALIDATION_BY_STAGE.get_or_default(stage);
        let trials = &data.regulatory.clinical_trials;
        let completed = trials.iter().any(|t| t.status == TrialStatus::Completed);
        let setback = trials.iter().any(|t| t.status.is_setback());

        FactorBuilder::new(
            "Clinical Validation",
            0.30,
            base,
            format!(
                "{} stage base {:.1}",
                stage.map(|s| s.label()).unwrap_or("Unknown"),
                base
            ),
        )
        .adjust(completed, 0.2, "Completed trial on record")
        .adjust(setback, -0.3, "Suspended or terminated trial")
        .build()
    }

    fn indication_complexity(&self, data: &CompanyData) -> ScoringFactor {
        let complex_area = COMPLEXITY_KEYWORDS
            .find_in(data.basic_info.therapeutic_areas.iter().map(String::as_str));
        let novel_modality = NOVEL_MODALITY_KEYWORDS.find_in(
            data.pipeline
                .programs
                .iter()
                .map(|program| program.mechanism.as_str()),
        );

        FactorBuilder::new(
            "Indication Complexity",
            0.20,
            INDICATION_COMPLEXITY_BASE,
            format!("Base {:.1}", INDICATION_COMPLEXITY_BASE),
        )
        .adjust(
            complex_area.is_some(),
            -0.5,
            format!("Complex therapeutic area ({})", complex_area.unwrap_or_default()),
        )
        .adjust(
            novel_modality.is_some(),
            -0.3,
            format!("Novel modality ({})", novel_modality.unwrap_or_default()),
        )
        .build()
    }

    fn timeline_risk(&self, months_to_approval: Option<f64>) -> ScoringFactor {
        match months_to_approval {
            Some(months) => FactorBuilder::new(
                "Timeline Risk",
                0.20,
                TIME_TO_APPROVAL.score(months),
                format!(
                    "{:.1} months to expected approval falls in {}",
                    months,
                    TIME_TO_APPROVAL.label(months)
                ),
            ),
            None => FactorBuilder::new(
                "Timeline Risk",
                0.20,
                UNKNOWN_TIMELINE_SCORE,
                "No expected approval date",
            ),
        }
        .build()
    }
}

impl PillarScorer for RegulatoryRiskPillar {
    fn pillar_id(&self) -> PillarId {
        PillarId::RegulatoryRisk
    }

    fn pillar_info(&self) -> PillarInfo {
        PillarInfo {
            id: PillarId::RegulatoryRisk,
            name: PillarId::RegulatoryRisk.name().to_string(),
            description: "Likelihood and speed of approval from pathway, clinical evidence, \
                          indication complexity and expected timeline"
                .to_string(),
            methodology_reliability: self.config.methodology_reliability,
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn validate_data(&self, data: &CompanyData) -> ValidationResult {
        let mut builder = ValidationBuilder::new();
        let regulatory = &data.regulatory;

        for (i, trial) in regulatory.clinical_trials.iter().enumerate() {
            if trial.enrollment == Some(0) {
                builder.error(
                    &format!("regulatory.clinical_trials[{}].enrollment", i),
                    ValidationCode::OutOfRange,
                    format!("Trial {} reports zero enrollment", trial.id),
                );
            }
            if !is_valid_trial_id(&trial.id) {
                builder.warn(
                    &format!("regulatory.clinical_trials[{}].id", i),
                    format!("Trial identifier '{}' is not a ClinicalTrials.gov id", trial.id),
                );
            }
        }

        if let (Some(submission), Some(approval)) = (
            regulatory.timeline.expected_submission,
            regulatory.timeline.expected_approval,
        ) {
            if approval < submission {
                builder.error(
                    "regulatory.timeline",
                    ValidationCode::Inconsistent,
                    format!(
                        "Expected approval ({}) precedes expected submission ({})",
                        approval, submission
                    ),
                );
            }
        }

        let clinical = data.basic_info.stage.is_some_and(|s| s.is_clinical());
        if clinical && regulatory.clinical_trials.is_empty() {
            builder.warn(
                "regulatory.clinical_trials",
                "Clinical-stage company lists no clinical trials",
            );
        }
        if regulatory.pathway.is_none() {
            builder.warn("regulatory.pathway", "No regulatory pathway declared");
        }

        builder.finish(validation::completeness(data, REQUIRED_FIELDS))
    }

    fn calculate_score(
        &self,
        data: &CompanyData,
        context: &MarketContext,
    ) -> Result<PillarScore, ScoringError> {
        ensure_valid(self.validate_data(data))?;

        let approval = data.regulatory.timeline.expected_approval;
        let months_to_approval = approval.map(|date| {
            ((date - context.as_of).num_days() as f64 / DAYS_PER_MONTH).max(0.0)
        });

        let factors = vec![
            self.pathway_advantage(data),
            self.clinical_validation(data),
            self.indication_complexity(data),
            self.timeline_risk(months_to_approval),
        ];

        let trials = &data.regulatory.clinical_trials;
        let stage = data.basic_info.stage;
        let complex_area = COMPLEXITY_KEYWORDS
            .find_in(data.basic_info.therapeutic_areas.iter().map(String::as_str))
            .is_some();

        let mut red_flags = Vec::new();
        if trials.iter().any(|t| t.status.is_setback()) {
            red_flags.push("Terminated or suspended trials signal regulatory setbacks".to_string());
        }
        if data.regulatory.pathway == Some(RegulatoryPathway::Standard) && complex_area {
            red_flags.push(
                "Standard pathway for complex indication may extend review timelines".to_string(),
            );
        }
        if approval.is_some_and(|date| date < context.as_of)
            && stage != Some(DevelopmentStage::Approved)
        {
            red_flags.push("Expected approval date has already passed".to_string());
        }

        let untested_clinical = stage.is_some_and(|s| s.is_clinical()) && trials.is_empty();
        let quality = QualitySignals {
            stale: false,
            inconsistent: false,
            missing_context: untested_clinical,
            coverage: Some(RecordCoverage::of(trials, trial_is_complete)),
        };

        Ok(finish(
            PillarId::RegulatoryRisk,
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
