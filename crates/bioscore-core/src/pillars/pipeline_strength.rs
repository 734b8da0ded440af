//! Pipeline Strength Pillar
//!
//! **Question**: Is the pipeline deep, mature and executing on plan?

use std::collections::BTreeSet;

use crate::confidence::{QualitySignals, RecordCoverage};
use crate::heuristics::BucketTable;
use crate::types::{
    CompanyData, DevelopmentStage, MarketContext, PillarId, PillarInfo, PillarScore, Program, ScoringFactor,
    ValidationCode, ValidationResult,
};
use crate::validation::{self, ValidationBuilder};
use crate::ScoringError;

use super::regulatory_risk::CLINICAL_VALIDATION_BY_STAGE;
use super::{ensure_valid, finish, Assessment, FactorBuilder, PillarConfig, PillarScorer};

const REQUIRED_FIELDS: &[&str] = &["pipeline.programs", "basic_info.stage"];

/// Number of programs. Very broad pipelines score slightly lower than focused ones.
const DEPTH: BucketTable = BucketTable::new(
    0.0,
    &[(1.0, 1.0), (2.0, 2.5), (4.0, 3.5), (8.0, 4.5)],
    4.0,
);

/// Completed share of due milestones.
const MILESTONE_COMPLETION: BucketTable = BucketTable::new(
    0.0,
    &[(0.25, 1.5), (0.5, 2.5), (0.75, 3.5), (0.9, 4.2)],
    4.8,
);

const NO_PROGRAMS_MATURITY: f64 = 1.0;
const DIVERSITY_BASE: f64 = 3.0;
const NOTHING_DUE_SCORE: f64 = 3.0;

/// Industry metric holding the historical success rate out of a clinical stage.
fn success_rate_metric(stage: DevelopmentStage) -> Option<&'static str> {
    match stage {
        DevelopmentStage::Phase1 => Some("median_phase1_success_rate"),
        DevelopmentStage::Phase2 => Some("median_phase2_success_rate"),
        DevelopmentStage::Phase3 => Some("median_phase3_success_rate"),
        _ => None,
    }
}

/// The Pipeline Strength pillar.
pub struct PipelinePillar {
    config: PillarConfig,
}

/// Milestone tally as of the snapshot date.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MilestoneTally {
    due: usize,
    completed: usize,
}

impl MilestoneTally {
    fn overdue(&self) -> usize {
        self.due - self.completed
    }
}

impl PipelinePillar {
    pub fn new(config: PillarConfig) -> Self {
        Self { config }
    }

    fn tally_milestones(&self, programs: &[Program], context: &MarketContext) -> MilestoneTally {
        let due: Vec<bool> = programs
            .iter()
            .flat_map(|program| &program.milestones)
            .filter(|milestone| milestone.target_date.is_some_and(|date| date <= context.as_of))
            .map(|milestone| milestone.completed)
            .collect();

        MilestoneTally {
            due: due.len(),
            completed: due.iter().filter(|done| **done).count(),
        }
    }

    fn pipeline_depth(&self, programs: &[Program]) -> ScoringFactor {
        let count = programs.len() as f64;
        FactorBuilder::new(
            "Pipeline Depth",
            0.30,
            DEPTH.score(count),
            format!("{} programs fall in {}", programs.len(), DEPTH.label(count)),
        )
        .build()
    }

    fn lead_asset_maturity(&self, data: &CompanyData, context: &MarketContext) -> ScoringFactor {
        match data.pipeline.lead_stage() {
            Some(stage) => {
                let score = CLINICAL_VALIDATION_BY_STAGE.get(stage);
                let success_rate = success_rate_metric(stage)
                    .and_then(|key| context.industry_metrics.get(key))
                    .map(|rate| {
                        format!(
                            "Industry success rate from {} is {:.0}%",
                            stage.label(),
                            rate * 100.0
                        )
                    });
                FactorBuilder::new(
                    "Lead Asset Maturity",
                    0.35,
                    score,
                    format!("Lead program at {} scores {:.1}", stage.label(), score),
                )
                .note(success_rate)
            }
            None => FactorBuilder::new(
                "Lead Asset Maturity",
                0.35,
                NO_PROGRAMS_MATURITY,
                "No programs",
            ),
        }
        .build()
    }

    fn mechanism_diversity(&self, programs: &[Program]) -> ScoringFactor {
        let distinct: BTreeSet<String> = programs
            .iter()
            .map(|program| program.mechanism.trim().to_lowercase())
            .filter(|mechanism| !mechanism.is_empty())
            .collect();
        let ratio = if programs.is_empty() {
            0.0
        } else {
            distinct.len() as f64 / programs.len() as f64
        };

        FactorBuilder::new(
            "Mechanism Diversity",
            0.15,
            DIVERSITY_BASE,
            format!(
                "{} distinct mechanisms across {} programs",
                distinct.len(),
                programs.len()
            ),
        )
        .adjust(ratio >= 0.75, 1.0, "Highly diversified mechanisms")
        .adjust(
            (0.5..0.75).contains(&ratio),
            0.5,
            "Moderately diversified mechanisms",
        )
        .adjust(
            distinct.len() == 1 && programs.len() >= 3,
            -0.5,
            "Single mechanism across the pipeline",
        )
        .build()
    }

    fn milestone_execution(&self, tally: MilestoneTally) -> ScoringFactor {
        if tally.due == 0 {
            return FactorBuilder::new(
                "Milestone Execution",
                0.20,
                NOTHING_DUE_SCORE,
                "No milestones due yet",
            )
            .build();
        }

        let rate = tally.completed as f64 / tally.due as f64;
        FactorBuilder::new(
            "Milestone Execution",
            0.20,
            MILESTONE_COMPLETION.score(rate),
            format!(
                "{} of {} due milestones completed ({:.0}%)",
                tally.completed,
                tally.due,
                rate * 100.0
            ),
        )
        .build()
    }
}

fn program_is_complete(program: &Program) -> bool {
    !program.mechanism.trim().is_empty()
        && !program.indication.trim().is_empty()
        && !program.milestones.is_empty()
}

impl PillarScorer for PipelinePillar {
    fn pillar_id(&self) -> PillarId {
        PillarId::PipelineStrength
    }

    fn pillar_info(&self) -> PillarInfo {
        PillarInfo {
            id: PillarId::PipelineStrength,
            name: PillarId::PipelineStrength.name().to_string(),
            description: "Depth, maturity, diversification and execution track record of the \
                          development pipeline"
                .to_string(),
            methodology_reliability: self.config.methodology_reliability,
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn validate_data(&self, data: &CompanyData) -> ValidationResult {
        let mut builder = ValidationBuilder::new();
        let programs = &data.pipeline.programs;

        if programs.is_empty() {
            builder.warn("pipeline.programs", "No development programs listed");
        }

        for (i, program) in programs.iter().enumerate() {
            if program.mechanism.trim().is_empty() {
                builder.warn(
                    &format!("pipeline.programs[{}].mechanism", i),
                    format!("Program {} has no mechanism of action", program.name),
                );
            }
            if program.indication.trim().is_empty() {
                builder.warn(
                    &format!("pipeline.programs[{}].indication", i),
                    format!("Program {} has no indication", program.name),
                );
            }
            if let Some(company_stage) = data.basic_info.stage {
                if program.stage > company_stage {
                    builder.error(
                        &format!("pipeline.programs[{}].stage", i),
                        ValidationCode::Inconsistent,
                        format!(
                            "Program {} is at {}, beyond the company stage of {}",
                            program.name,
                            program.stage.label(),
                            company_stage.label()
                        ),
                    );
                }
            }
        }

        builder.finish(validation::completeness(data, REQUIRED_FIELDS))
    }

    fn calculate_score(
        &self,
        data: &CompanyData,
        context: &MarketContext,
    ) -> Result<PillarScore, ScoringError> {
        ensure_valid(self.validate_data(data))?;

        let programs = &data.pipeline.programs;
        let tally = self.tally_milestones(programs, context);

        let factors = vec![
            self.pipeline_depth(programs),
            self.lead_asset_maturity(data, context),
            self.mechanism_diversity(programs),
            self.milestone_execution(tally),
        ];

        let mut red_flags = Vec::new();
        if programs.len() == 1 {
            red_flags.push("Single-asset pipeline concentrates development risk".to_string());
        }
        if tally.overdue() >= 2 {
            red_flags.push("Multiple overdue milestones suggest execution delays".to_string());
        }

        let quality = QualitySignals {
            coverage: Some(RecordCoverage::of(programs, program_is_complete)),
            ..QualitySignals::default()
        };

        Ok(finish(
            PillarId::PipelineStrength,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::snapshot::Snapshot;
    use crate::types::DevelopmentStage;

    fn pillar() -> PipelinePillar {
        PipelinePillar::new(PillarConfig::for_pillar(PillarId::PipelineStrength))
    }

    fn context() -> MarketContext {
        MarketContext::from_yaml(fixtures::MARKET_CONTEXT).unwrap()
    }

    fn factor<'a>(score: &'a PillarScore, name: &str) -> &'a ScoringFactor {
        score.factors.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_clinical_pipeline() {
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let score = pillar().calculate_score(&data, &context()).unwrap();

        assert_eq!(factor(&score, "Pipeline Depth").score, 3.5);
        assert_eq!(factor(&score, "Lead Asset Maturity").score, 3.8);
        assert_eq!(factor(&score, "Mechanism Diversity").score, 4.0);
        // Two of four due milestones completed
        assert_eq!(factor(&score, "Milestone Execution").score, 3.5);
        assert!((score.raw_score - 3.68).abs() < 1e-9);
        assert_eq!(
            score.warnings,
            vec!["Multiple overdue milestones suggest execution delays".to_string()]
        );
    }

    #[test]
    fn test_lead_maturity_quotes_industry_success_rate() {
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        let mut context = context();

        let score = pillar().calculate_score(&data, &context).unwrap();
        assert_eq!(
            factor(&score, "Lead Asset Maturity").rationale,
            "Lead program at Phase 3 scores 3.8"
        );

        context
            .industry_metrics
            .insert("median_phase3_success_rate".to_string(), 0.58);
        let score = pillar().calculate_score(&data, &context).unwrap();
        assert_eq!(
            factor(&score, "Lead Asset Maturity").rationale,
            "Lead program at Phase 3 scores 3.8; Industry success rate from Phase 3 is 58%"
        );
        assert_eq!(factor(&score, "Lead Asset Maturity").score, 3.8);
    }

    #[test]
    fn test_single_asset_pipeline() {
        let data = CompanyData::from_yaml(fixtures::EFFICIENT_PRECLINICAL_COMPANY).unwrap();
        let score = pillar().calculate_score(&data, &context()).unwrap();

        assert_eq!(factor(&score, "Pipeline Depth").score, 2.5);
        assert_eq!(factor(&score, "Milestone Execution").score, 4.8);
        assert!(score
            .warnings
            .contains(&"Single-asset pipeline concentrates development risk".to_string()));
    }

    #[test]
    fn test_single_mechanism_platform() {
        let mut data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        for program in &mut data.pipeline.programs {
            program.mechanism = "KRAS G12C inhibitor".to_string();
        }

        let score = pillar().calculate_score(&data, &context()).unwrap();
        assert_eq!(factor(&score, "Mechanism Diversity").score, 2.5);
    }

    #[test]
    fn test_empty_pipeline() {
        let mut data = CompanyData::from_yaml(fixtures::EFFICIENT_PRECLINICAL_COMPANY).unwrap();
        data.pipeline.programs.clear();

        let validation = pillar().validate_data(&data);
        assert!(validation.is_valid);
        assert_eq!(validation.completeness, 0.5);

        let score = pillar().calculate_score(&data, &context()).unwrap();
        assert_eq!(factor(&score, "Pipeline Depth").score, 1.0);
        assert_eq!(factor(&score, "Lead Asset Maturity").score, 1.0);
        assert_eq!(factor(&score, "Milestone Execution").score, 3.0);
        assert!(score
            .warnings
            .iter()
            .any(|w| w.starts_with("Incomplete data for Pipeline Strength")));
    }

    #[test]
    fn test_program_ahead_of_company_is_error() {
        let mut data = CompanyData::from_yaml(fixtures::EFFICIENT_PRECLINICAL_COMPANY).unwrap();
        data.pipeline.programs[0].stage = DevelopmentStage::Phase2;

        let validation = pillar().validate_data(&data);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors[0].field, "pipeline.programs[0].stage");
    }

    #[test]
    fn test_incomplete_programs_reduce_confidence() {
        let mut data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        data.pipeline.programs[2].indication = String::new();

        let validation = pillar().validate_data(&data);
        assert_eq!(validation.warnings.len(), 1);

        let score = pillar().calculate_score(&data, &context()).unwrap();
        assert!((score.confidence - 0.75 * (2.0 / 3.0)).abs() < 1e-9);
    }
}
