//! # bioscore-runtime
//!
//! Async orchestration for bioscore evaluations.
//!
//! The core engine scores pillars one after another. This crate fans the
//! configured pillars out onto tokio tasks, gathers them back in pillar order,
//! and hands them to the same deterministic assembly step, so a parallel run and
//! a sequential run with the same `evaluated_at` produce identical results.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bioscore_core::{CompanyData, MarketContext, Snapshot};
//! use bioscore_runtime::{RuntimeConfig, RuntimeOrchestrator};
//!
//! let config = RuntimeConfig::from_path("bioscore.yaml")?;
//! let orchestrator = RuntimeOrchestrator::new(config);
//! let company = Arc::new(CompanyData::from_yaml_file("company.yaml")?);
//! let context = Arc::new(MarketContext::from_yaml_file("market.yaml")?);
//!
//! let runtime = orchestrator.evaluate(company, context).await?;
//! println!("{:.2}", runtime.result.overall_score);
//! ```

pub mod config;
pub mod orchestrator;

pub use config::{ConcurrencyConfig, ConfigError, DeterminismConfig, RuntimeConfig, TimeoutConfig};
pub use orchestrator::{RuntimeError, RuntimeOrchestrator, RuntimeResult};
