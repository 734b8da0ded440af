//! Input validation and completeness.
//!
//! Field paths are dotted snake_case paths into [`CompanyData`]. A field counts as
//! present when it is set, non-empty, and (for numbers) finite.

use std::sync::Arc;

use crate::pillars::PillarScorer;
use crate::types::{
    CompanyData, ValidationCode, ValidationError, ValidationResult, ValidationSeverity,
    ValidationWarning,
};

/// Fields every evaluation needs regardless of which pillars run.
pub const ENGINE_REQUIRED_FIELDS: &[&str] = &["basic_info.name", "basic_info.stage"];

/// Whether `path` is set and well-formed in `data`.
///
/// Unknown paths are reported as absent.
pub fn field_present(data: &CompanyData, path: &str) -> bool {
    let finite = |value: Option<f64>| value.is_some_and(f64::is_finite);

    match path {
        "basic_info.name" => !data.basic_info.name.trim().is_empty(),
        "basic_info.stage" => data.basic_info.stage.is_some(),
        "basic_info.therapeutic_areas" => data
            .basic_info
            .therapeutic_areas
            .iter()
            .any(|area| !area.trim().is_empty()),
        "basic_info.founded_year" => data.basic_info.founded_year.is_some(),
        "basic_info.employee_count" => data.basic_info.employee_count.is_some(),
        "basic_info.headquarters" => data
            .basic_info
            .headquarters
            .as_deref()
            .is_some_and(|hq| !hq.trim().is_empty()),

        "financials.burn_rate" => finite(data.financials.burn_rate),
        "financials.cash_position" => finite(data.financials.cash_position),
        "financials.runway" => finite(data.financials.runway),
        "financials.funding_history" => !data.financials.funding_history.is_empty(),

        "pipeline.programs" => !data.pipeline.programs.is_empty(),

        "regulatory.pathway" => data.regulatory.pathway.is_some(),
        "regulatory.clinical_trials" => !data.regulatory.clinical_trials.is_empty(),
        "regulatory.timeline.expected_submission" => {
            data.regulatory.timeline.expected_submission.is_some()
        }
        "regulatory.timeline.expected_approval" => {
            data.regulatory.timeline.expected_approval.is_some()
        }

        "market.addressable_market" => finite(data.market.addressable_market),
        "market.target_population" => data.market.target_population.is_some(),
        "market.competitors" => !data.market.competitors.is_empty(),

        _ => false,
    }
}

/// Fraction of `fields` present in `data`. An empty field list is fully complete.
pub fn completeness(data: &CompanyData, fields: &[&str]) -> f64 {
    if fields.is_empty() {
        return 1.0;
    }
    let present = fields
        .iter()
        .filter(|field| field_present(data, field))
        .count();
    present as f64 / fields.len() as f64
}

/// Accumulates validation findings for one check pass.
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn critical(&mut self, field: &str, code: ValidationCode, message: impl Into<String>) -> &mut Self {
        self.push(field, code, ValidationSeverity::Critical, message)
    }

    pub fn error(&mut self, field: &str, code: ValidationCode, message: impl Into<String>) -> &mut Self {
        self.push(field, code, ValidationSeverity::Error, message)
    }

    /// Critical missing-field error with the standard message.
    pub fn missing(&mut self, field: &str) -> &mut Self {
        self.critical(field, ValidationCode::MissingField, "Required field is missing")
    }

    pub fn warn(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self, completeness: f64) -> ValidationResult {
        ValidationResult::new(self.errors, self.warnings, completeness)
    }

    fn push(
        &mut self,
        field: &str,
        code: ValidationCode,
        severity: ValidationSeverity,
        message: impl Into<String>,
    ) -> &mut Self {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
            severity,
            code,
        });
        self
    }
}

/// Engine-level validation across all configured pillars.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Checks that do not belong to any single pillar.
    pub fn check_company(&self, data: &CompanyData) -> ValidationResult {
        let mut builder = ValidationBuilder::new();

        if !field_present(data, "basic_info.name") {
            builder.missing("basic_info.name");
        }
        if !field_present(data, "basic_info.stage") {
            builder.missing("basic_info.stage");
        }

        builder.finish(completeness(data, ENGINE_REQUIRED_FIELDS))
    }

    /// Run the engine checks plus every scorer's own validation.
    ///
    /// Errors and warnings keep first-seen order with exact duplicates dropped.
    /// Completeness is measured over the union of every required field.
    pub fn validate_input_data(
        &self,
        data: &CompanyData,
        scorers: &[Arc<dyn PillarScorer>],
    ) -> ValidationResult {
        let mut result = self.check_company(data);

        let mut fields: Vec<&'static str> = ENGINE_REQUIRED_FIELDS.to_vec();
        for scorer in scorers {
            result.absorb(scorer.validate_data(data));
            for field in scorer.required_fields() {
                if !fields.contains(field) {
                    fields.push(field);
                }
            }
        }

        result.completeness = completeness(data, &fields);
        tracing::debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            completeness = result.completeness,
            "validated company data"
        );
        result
    }
}
