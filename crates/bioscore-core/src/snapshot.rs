//! Snapshot loading from YAML/JSON.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::{CompanyData, MarketContext, ScoringConfig};

/// Errors that can occur when loading snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Types that load from YAML or JSON documents.
pub trait Snapshot: DeserializeOwned {
    fn from_yaml(yaml: &str) -> Result<Self, SnapshotError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load by extension: `.json` is JSON, anything else is YAML.
    fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }
}

impl Snapshot for CompanyData {}
impl Snapshot for MarketContext {}
impl Snapshot for ScoringConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::types::{DevelopmentStage, MarketSentiment, PillarId, TrialStatus};
    use chrono::NaiveDate;

    #[test]
    fn test_company_from_yaml() {
        let data = CompanyData::from_yaml(fixtures::CLINICAL_COMPANY).unwrap();
        assert_eq!(data.basic_info.name, "Corvane Oncology");
        assert_eq!(data.basic_info.stage, Some(DevelopmentStage::Phase3));
        assert_eq!(data.pipeline.programs.len(), 3);
        assert_eq!(data.regulatory.clinical_trials[0].status, TrialStatus::Completed);
    }

    #[test]
    fn test_minimal_company_uses_defaults() {
        let data = CompanyData::from_yaml("basic_info:\n  name: Stub Bio\n").unwrap();
        assert!(data.basic_info.stage.is_none());
        assert!(data.financials.burn_rate.is_none());
        assert!(data.pipeline.programs.is_empty());
    }

    #[test]
    fn test_context_from_yaml() {
        let context = MarketContext::from_yaml(fixtures::MARKET_CONTEXT).unwrap();
        assert_eq!(context.as_of, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
        assert_eq!(context.conditions.sentiment, MarketSentiment::Neutral);
        assert_eq!(context.comparables.len(), 3);
    }

    #[test]
    fn test_company_from_json() {
        let json = r#"{
            "basic_info": {"name": "Json Bio", "stage": "phase1"},
            "financials": {"burn_rate": 2.5}
        }"#;
        let data = CompanyData::from_json(json).unwrap();
        assert_eq!(data.financials.burn_rate, Some(2.5));
    }

    #[test]
    fn test_scoring_config_from_yaml() {
        let config = ScoringConfig::from_yaml(fixtures::BALANCED_WEIGHTS).unwrap();
        assert_eq!(config.weights.len(), 4);
        assert_eq!(config.weights.get(PillarId::CapitalIntensity), Some(0.25));
    }

    #[test]
    fn test_unknown_stage_is_yaml_error() {
        let result = CompanyData::from_yaml("basic_info:\n  name: X\n  stage: phase9\n");
        assert!(matches!(result, Err(SnapshotError::Yaml(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = CompanyData::from_path("/definitely/not/here.yaml");
        assert!(matches!(result, Err(SnapshotError::Io(_))));
    }
}
