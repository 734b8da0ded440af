//! bioscore CLI
//!
//! Command-line interface for biotech readiness scoring.
//!
//! ## Usage
//!
//! ```bash
//! # Score a company against a market snapshot
//! bioscore evaluate --company company.yaml --context market.yaml
//!
//! # JSON output with a fixed timestamp
//! bioscore evaluate --company company.yaml --context market.yaml --format json \
//!     --evaluated-at 2025-07-01T00:00:00Z
//!
//! # Check a weight configuration
//! bioscore weights validate weights.yaml
//!
//! # Describe the pillars
//! bioscore pillars list
//! ```
//!
//! ## Exit Codes
//!
//! - 0: Scored
//! - 1: Weight configuration invalid (`weights validate`)
//! - 2: Company data invalid
//! - 3: Error

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bioscore_core::{
    CompanyData, MarketContext, ScoringConfig, ScoringEngine, ScoringError, ScoringResult,
    Snapshot, ValidationError, WeightingEngine,
};
use bioscore_runtime::{RuntimeConfig, RuntimeError, RuntimeOrchestrator};

/// bioscore: readiness scoring for biotech companies
#[derive(Parser)]
#[command(name = "bioscore")]
#[command(version)]
#[command(about = "Score biotech companies for partnership and IPO readiness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a company snapshot
    Evaluate {
        /// Path to the company snapshot (YAML or JSON)
        #[arg(short, long)]
        company: PathBuf,

        /// Path to the market context (YAML or JSON). Neutral conditions if omitted.
        #[arg(long)]
        context: Option<PathBuf>,

        /// Path to the runtime configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Show the factor breakdown of every pillar
        #[arg(long)]
        explain: bool,

        /// Explicit timestamp for deterministic evaluation (ISO 8601 / RFC 3339).
        /// Example: --evaluated-at 2025-07-01T00:00:00Z
        #[arg(long, value_parser = parse_datetime)]
        evaluated_at: Option<DateTime<Utc>>,
    },

    /// Weight configuration commands
    Weights {
        #[command(subcommand)]
        action: WeightsAction,
    },

    /// Pillar commands
    Pillars {
        #[command(subcommand)]
        action: PillarsAction,
    },
}

#[derive(Subcommand)]
enum WeightsAction {
    /// Validate a weight configuration file
    Validate {
        /// Path to the scoring configuration
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum PillarsAction {
    /// List the pillars and the fields each one needs
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Parse ISO 8601 / RFC 3339 datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid datetime format: {}. Expected ISO 8601/RFC 3339 (e.g., 2025-07-01T00:00:00Z)", e))
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    match run() {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            company,
            context,
            config,
            format,
            explain,
            evaluated_at,
        } => evaluate_command(company, context, config, format, explain, evaluated_at),

        Commands::Weights { action } => match action {
            WeightsAction::Validate { path } => validate_weights(path),
        },

        Commands::Pillars { action } => match action {
            PillarsAction::List => list_pillars(),
        },
    }
}

fn evaluate_command(
    company_path: PathBuf,
    context_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    format: OutputFormat,
    explain: bool,
    evaluated_at: Option<DateTime<Utc>>,
) -> Result<ExitCode> {
    let company = CompanyData::from_path(&company_path)
        .with_context(|| format!("Failed to load company from {:?}", company_path))?;

    let mut config = match &config_path {
        Some(path) => RuntimeConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => RuntimeConfig::default(),
    };
    if evaluated_at.is_some() {
        config.determinism.evaluated_at = evaluated_at;
    }

    let context = match &context_path {
        Some(path) => MarketContext::from_path(path)
            .with_context(|| format!("Failed to load market context from {:?}", path))?,
        None => {
            let as_of = config
                .determinism
                .evaluated_at
                .unwrap_or_else(Utc::now)
                .date_naive();
            MarketContext::neutral(as_of)
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let orchestrator = RuntimeOrchestrator::new(config);

    let outcome = runtime.block_on(orchestrator.evaluate(Arc::new(company), Arc::new(context)));

    let result = match outcome {
        Ok(runtime_result) => runtime_result.result,
        Err(RuntimeError::Scoring(ScoringError::InvalidData { errors })) => {
            print_invalid_data(&errors);
            return Ok(ExitCode::from(2));
        }
        Err(RuntimeError::Scoring(ScoringError::MissingRequiredField(field))) => {
            eprintln!("Invalid company data:");
            eprintln!("  - {}: Required field is missing", field);
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e).context("Evaluation failed"),
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            print_text_result(&result, orchestrator.engine(), explain);
        }
    }

    Ok(ExitCode::from(0))
}

fn print_invalid_data(errors: &[ValidationError]) {
    eprintln!("Invalid company data:");
    for error in errors {
        eprintln!(
            "  - {} [{:?}]: {}",
            error.field, error.severity, error.message
        );
    }
}

fn print_text_result(result: &ScoringResult, engine: &ScoringEngine, explain: bool) {
    println!("{}", result.company_name);
    println!();
    println!("Readiness: {}", result.readiness.label());
    println!("Overall score: {:.2} / 5", result.overall_score);
    println!("Confidence: {:.0}%", result.overall_confidence * 100.0);
    println!();

    println!("Pillars:");
    for contribution in &result.contributions {
        let confidence = result
            .pillar_scores
            .get(&contribution.pillar)
            .map(|score| score.confidence)
            .unwrap_or_default();
        println!(
            "  {:<18} {:.2}  (weight {:.0}%, confidence {:.0}%)",
            contribution.pillar.name(),
            contribution.raw_score,
            contribution.weight * 100.0,
            confidence * 100.0
        );
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    if explain {
        println!();
        println!("--- Pillar Breakdown ---");

        for score in result.pillar_scores.values() {
            let Some(explanation) = engine.explain(score) else {
                continue;
            };
            println!();
            println!("{}", explanation.summary);
            for factor in &explanation.factors {
                println!(
                    "  - {} ({:.0}%): {:.1} - {}",
                    factor.name,
                    factor.weight * 100.0,
                    factor.score,
                    factor.rationale
                );
            }
            println!("  = {}", explanation.calculation);
            println!("  {}", explanation.confidence_note);
        }
    }
}

fn validate_weights(path: PathBuf) -> Result<ExitCode> {
    let config = ScoringConfig::from_path(&path)
        .with_context(|| format!("Failed to load weights from {:?}", path))?;

    let validation = WeightingEngine::new().validate_weights(&config.weights);

    if validation.is_valid {
        println!("Weights are valid");
        if let Ok(normalized) = WeightingEngine::new().normalize_weights(&config.weights) {
            println!();
            for (pillar, weight) in normalized.iter() {
                println!("  {:<18} {:.1}%", pillar.name(), weight * 100.0);
            }
        }
    } else {
        eprintln!("Weight validation failed:");
        for error in &validation.errors {
            eprintln!("  - {}: {}", error.field, error.message);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &validation.warnings {
            println!("  - {}: {}", warning.field, warning.message);
        }
    }

    println!();
    println!("Pillar coverage: {:.0}%", validation.completeness * 100.0);

    Ok(if validation.is_valid {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    })
}

fn list_pillars() -> Result<ExitCode> {
    let engine = ScoringEngine::new();

    for scorer in engine.scorers() {
        let info = scorer.pillar_info();
        println!("{} ({:?})", info.name, info.id);
        println!("  {}", info.id.question());
        println!("  {}", info.description);
        println!(
            "  Methodology reliability: {:.0}%",
            info.methodology_reliability * 100.0
        );
        println!("  Required fields:");
        for field in scorer.required_fields() {
            println!("    - {}", field);
        }
        println!();
    }

    Ok(ExitCode::from(0))
}
