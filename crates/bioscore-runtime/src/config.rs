//! Configuration for bioscore-runtime.

use bioscore_core::{PillarId, PillarOverrides, ScoringConfig, ScoringEngine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Pillar weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Per-pillar constant overrides (BTreeMap for deterministic iteration)
    #[serde(default)]
    pub pillars: BTreeMap<PillarId, PillarOverrides>,

    /// Timeout configuration
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Fan-out configuration
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Determinism configuration
    #[serde(default)]
    pub determinism: DeterminismConfig,
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.json` is JSON, anything else is YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Engine with this configuration's pillar overrides.
    pub fn engine(&self) -> ScoringEngine {
        ScoringEngine::with_overrides(&self.pillars)
    }

    /// Check values serde cannot check. Weights are checked by the engine.
    fn validate(&self) -> Result<(), ConfigError> {
        for (pillar, overrides) in &self.pillars {
            let values = [
                ("methodology_reliability", overrides.methodology_reliability),
                ("low_confidence_threshold", overrides.low_confidence_threshold),
                ("low_completeness_threshold", overrides.low_completeness_threshold),
            ];
            for (name, value) in values {
                if let Some(value) = value {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ConfigError::Invalid(format!(
                            "{} for {} must be in [0, 1], got {}",
                            name,
                            pillar.name(),
                            value
                        )));
                    }
                }
            }
        }

        if self.timeouts.enabled && self.timeouts.evaluation.is_zero() {
            return Err(ConfigError::Invalid(
                "evaluation timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Whether the evaluation timeout applies
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whole-evaluation timeout
    #[serde(with = "humantime_serde", default = "default_evaluation_timeout")]
    pub evaluation: Duration,
}

fn default_true() -> bool {
    true
}

fn default_evaluation_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation: default_evaluation_timeout(),
        }
    }
}

/// Fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Score pillars as concurrent tasks; otherwise score them in order on the caller's task
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Determinism configuration.
///
/// For golden tests, audits, and reproducibility, set `evaluated_at` to a fixed timestamp:
///
/// ```yaml
/// determinism:
///   evaluated_at: "2025-07-01T00:00:00Z"
/// ```
///
/// When `evaluated_at` is None (default), the current system time is used.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeterminismConfig {
    /// Fixed timestamp for evaluation.
    ///
    /// Format: ISO 8601 (e.g., "2025-07-01T00:00:00Z")
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

// Custom serialization for Duration using humantime format
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
