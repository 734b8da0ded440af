//! Runtime orchestrator for concurrent pillar scoring.
//!
//! The orchestrator implements:
//! - Parallel fan-out: one tokio task per configured pillar
//! - Fan-in into pillar order, then the engine's deterministic assembly
//! - Cancel-on-first-failure: the first failing pillar aborts the rest
//! - An optional caller-side timeout over the whole evaluation

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;

use bioscore_core::{
    CompanyData, MarketContext, PillarId, PillarScore, PillarScorer, ScoringError, ScoringEngine,
    ScoringResult,
};
use chrono::Utc;

use crate::config::RuntimeConfig;

/// Errors from the runtime orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Pillar task failed: {0}")]
    TaskFailed(String),
}

/// Result from runtime evaluation.
#[derive(Debug)]
pub struct RuntimeResult {
    /// The scoring result
    pub result: ScoringResult,

    /// Wall-clock time spent, including validation and assembly
    pub elapsed: Duration,

    /// Whether pillars ran as concurrent tasks
    pub parallel: bool,
}

/// The runtime orchestrator manages concurrent pillar scoring.
///
/// # Architecture
/// - Fan-out: every configured pillar runs on its own task over `Arc`-shared inputs
/// - Fan-in: scores are keyed by pillar, so completion order never shows in the result
/// - The engine validates before fan-out and assembles after fan-in
pub struct RuntimeOrchestrator {
    engine: Arc<ScoringEngine>,
    config: RuntimeConfig,
}

impl RuntimeOrchestrator {
    /// Orchestrator with the stock pillars and the configuration's overrides.
    pub fn new(config: RuntimeConfig) -> Self {
        let engine = Arc::new(config.engine());
        Self { engine, config }
    }

    /// Orchestrator over a caller-built engine.
    pub fn with_engine(engine: Arc<ScoringEngine>, config: RuntimeConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Evaluate one company.
    ///
    /// # Execution Flow
    /// 1. Check weights and resolve scorers
    /// 2. Validate the company against every configured pillar
    /// 3. Fan-out: score pillars
    /// 4. Fan-in: weighted score, confidence, warnings, readiness
    pub async fn evaluate(
        &self,
        data: Arc<CompanyData>,
        context: Arc<MarketContext>,
    ) -> Result<RuntimeResult, RuntimeError> {
        let started = Instant::now();
        let timeouts = &self.config.timeouts;

        let result = if timeouts.enabled {
            match tokio::time::timeout(timeouts.evaluation, self.run(data, context)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!(timeout = ?timeouts.evaluation, "evaluation timed out");
                    return Err(RuntimeError::Timeout(timeouts.evaluation));
                }
            }
        } else {
            self.run(data, context).await?
        };

        Ok(RuntimeResult {
            result,
            elapsed: started.elapsed(),
            parallel: self.config.concurrency.parallel,
        })
    }

    /// Evaluate several companies against one shared context, one after another.
    ///
    /// Each company still fans out over its pillars. A failure affects only that company.
    pub async fn evaluate_batch(
        &self,
        companies: Vec<Arc<CompanyData>>,
        context: Arc<MarketContext>,
    ) -> Vec<Result<RuntimeResult, RuntimeError>> {
        let mut results = Vec::with_capacity(companies.len());
        for data in companies {
            let name = data.basic_info.name.clone();
            let result = self.evaluate(data, Arc::clone(&context)).await;
            if let Err(e) = &result {
                tracing::warn!(company = %name, error = %e, "batch evaluation failed");
            }
            results.push(result);
        }
        results
    }

    async fn run(
        &self,
        data: Arc<CompanyData>,
        context: Arc<MarketContext>,
    ) -> Result<ScoringResult, RuntimeError> {
        let scoring = &self.config.scoring;
        let scorers = self.engine.prepare(scoring)?;
        self.engine.check_input(&data, &scorers)?;

        let scores = if self.config.concurrency.parallel {
            self.fan_out(scorers, Arc::clone(&data), context).await?
        } else {
            let mut scores = BTreeMap::new();
            for scorer in &scorers {
                let score = scorer.calculate_score(&data, &context)?;
                scores.insert(score.pillar, score);
            }
            scores
        };

        let evaluated_at = self.config.determinism.evaluated_at.unwrap_or_else(Utc::now);
        Ok(self.engine.assemble(&data, scoring, scores, evaluated_at)?)
    }

    /// Score every pillar on its own task. The first failure aborts the others.
    async fn fan_out(
        &self,
        scorers: Vec<Arc<dyn PillarScorer>>,
        data: Arc<CompanyData>,
        context: Arc<MarketContext>,
    ) -> Result<BTreeMap<PillarId, PillarScore>, RuntimeError> {
        let mut tasks = JoinSet::new();
        for scorer in scorers {
            let data = Arc::clone(&data);
            let context = Arc::clone(&context);
            tasks.spawn(async move {
                let pillar = scorer.pillar_id();
                scorer
                    .calculate_score(&data, &context)
                    .map_err(|error| (pillar, error))
            });
        }

        let mut scores = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(score)) => {
                    tracing::debug!(pillar = ?score.pillar, "pillar task finished");
                    scores.insert(score.pillar, score);
                }
                Ok(Err((pillar, error))) => {
                    tracing::warn!(
                        pillar = ?pillar,
                        error = %error,
                        remaining = tasks.len(),
                        "pillar failed, aborting remaining pillars"
                    );
                    tasks.abort_all();
                    return Err(RuntimeError::Scoring(error));
                }
                Err(join_error) => {
                    tracing::warn!(error = %join_error, "pillar task did not complete");
                    tasks.abort_all();
                    return Err(RuntimeError::TaskFailed(join_error.to_string()));
                }
            }
        }

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioscore_core::{
        default_pillars, fixtures, PillarConfig, PillarInfo, PipelinePillar, ScoringConfig,
        Snapshot, ValidationResult, WeightConfig,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use chrono::{DateTime, TimeZone};
    use std::collections::BTreeMap;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn deterministic_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.determinism.evaluated_at = Some(fixed_time());
        config
    }

    fn company(yaml: &str) -> Arc<CompanyData> {
        Arc::new(CompanyData::from_yaml(yaml).unwrap())
    }

    fn context() -> Arc<MarketContext> {
        Arc::new(MarketContext::from_yaml(fixtures::MARKET_CONTEXT).unwrap())
    }

    /// Replaces the market pillar with one that fails or stalls.
    struct MisbehavingPillar {
        delay: Option<Duration>,
    }

    impl PillarScorer for MisbehavingPillar {
        fn pillar_id(&self) -> PillarId {
            PillarId::MarketPotential
        }

        fn pillar_info(&self) -> PillarInfo {
            PillarInfo {
                id: PillarId::MarketPotential,
                name: "Misbehaving".to_string(),
                description: String::new(),
                methodology_reliability: 0.5,
            }
        }

        fn required_fields(&self) -> &'static [&'static str] {
            &[]
        }

        fn validate_data(&self, _data: &CompanyData) -> ValidationResult {
            ValidationResult::new(vec![], vec![], 1.0)
        }

        fn calculate_score(
            &self,
            _data: &CompanyData,
            _context: &MarketContext,
        ) -> Result<PillarScore, ScoringError> {
            match self.delay {
                Some(delay) => {
                    std::thread::sleep(delay);
                    Err(ScoringError::CalculationError("stalled".to_string()))
                }
                None => Err(ScoringError::CalculationError("market feed unavailable".to_string())),
            }
        }
    }

    /// Pipeline pillar that takes `delay` and records when it finishes.
    struct SlowPillar {
        delay: Duration,
        finished: Arc<AtomicBool>,
        inner: PipelinePillar,
    }

    impl PillarScorer for SlowPillar {
        fn pillar_id(&self) -> PillarId {
            self.inner.pillar_id()
        }

        fn pillar_info(&self) -> PillarInfo {
            self.inner.pillar_info()
        }

        fn required_fields(&self) -> &'static [&'static str] {
            self.inner.required_fields()
        }

        fn validate_data(&self, data: &CompanyData) -> ValidationResult {
            self.inner.validate_data(data)
        }

        fn calculate_score(
            &self,
            data: &CompanyData,
            context: &MarketContext,
        ) -> Result<PillarScore, ScoringError> {
            std::thread::sleep(self.delay);
            let score = self.inner.calculate_score(data, context);
            self.finished.store(true, Ordering::SeqCst);
            score
        }
    }

    fn engine_with(pillar: MisbehavingPillar) -> Arc<ScoringEngine> {
        let mut scorers = default_pillars(&BTreeMap::new());
        scorers.push(Arc::new(pillar));
        Arc::new(ScoringEngine::with_scorers(scorers))
    }

    #[tokio::test]
    async fn test_parallel_matches_core_engine() {
        let orchestrator = RuntimeOrchestrator::new(deterministic_config());
        let data = company(fixtures::CLINICAL_COMPANY);

        let runtime = orchestrator
            .evaluate(Arc::clone(&data), context())
            .await
            .unwrap();
        assert!(runtime.parallel);

        let core = ScoringEngine::new()
            .evaluate_company_at(&data, &context(), &ScoringConfig::default(), fixed_time())
            .unwrap();

        assert_eq!(
            serde_json::to_string(&runtime.result).unwrap(),
            serde_json::to_string(&core).unwrap()
        );
    }

    #[tokio::test]
    async fn test_sequential_mode_matches_parallel() {
        let parallel = RuntimeOrchestrator::new(deterministic_config());
        let mut config = deterministic_config();
        config.concurrency.parallel = false;
        let sequential = RuntimeOrchestrator::new(config);

        let data = company(fixtures::EFFICIENT_PRECLINICAL_COMPANY);
        let a = parallel.evaluate(Arc::clone(&data), context()).await.unwrap();
        let b = sequential.evaluate(data, context()).await.unwrap();

        assert!(!b.parallel);
        assert_eq!(a.result, b.result);
    }

    #[tokio::test]
    async fn test_invalid_data_fails_before_fan_out() {
        let orchestrator = RuntimeOrchestrator::new(deterministic_config());
        let result = orchestrator
            .evaluate(company(fixtures::ZERO_BURN_COMPANY), context())
            .await;

        assert!(matches!(
            result,
            Err(RuntimeError::Scoring(ScoringError::InvalidData { .. }))
        ));
    }

    #[tokio::test]
    async fn test_first_pillar_failure_is_returned() {
        let orchestrator = RuntimeOrchestrator::with_engine(
            engine_with(MisbehavingPillar { delay: None }),
            deterministic_config(),
        );

        let result = orchestrator
            .evaluate(company(fixtures::CLINICAL_COMPANY), context())
            .await;
        match result {
            Err(RuntimeError::Scoring(ScoringError::CalculationError(message))) => {
                assert_eq!(message, "market feed unavailable");
            }
            other => panic!("expected CalculationError, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failure_does_not_wait_for_siblings() {
        let delay = Duration::from_millis(400);
        let finished = Arc::new(AtomicBool::new(false));
        let mut scorers = default_pillars(&BTreeMap::new());
        scorers.push(Arc::new(MisbehavingPillar { delay: None }));
        scorers.push(Arc::new(SlowPillar {
            delay,
            finished: Arc::clone(&finished),
            inner: PipelinePillar::new(PillarConfig::for_pillar(PillarId::PipelineStrength)),
        }));
        let orchestrator = RuntimeOrchestrator::with_engine(
            Arc::new(ScoringEngine::with_scorers(scorers)),
            deterministic_config(),
        );

        let started = Instant::now();
        let result = orchestrator
            .evaluate(company(fixtures::CLINICAL_COMPANY), context())
            .await;

        assert!(matches!(
            result,
            Err(RuntimeError::Scoring(ScoringError::CalculationError(_)))
        ));
        assert!(started.elapsed() < delay);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_evaluation_timeout() {
        let mut config = deterministic_config();
        config.timeouts.evaluation = Duration::from_millis(50);
        let orchestrator = RuntimeOrchestrator::with_engine(
            engine_with(MisbehavingPillar {
                delay: Some(Duration::from_millis(500)),
            }),
            config,
        );

        let result = orchestrator
            .evaluate(company(fixtures::CLINICAL_COMPANY), context())
            .await;
        assert!(matches!(result, Err(RuntimeError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_unconfigured_scorer_is_configuration_error() {
        let engine = Arc::new(ScoringEngine::with_scorers(vec![]));
        let orchestrator = RuntimeOrchestrator::with_engine(engine, deterministic_config());

        let result = orchestrator
            .evaluate(company(fixtures::CLINICAL_COMPANY), context())
            .await;
        assert!(matches!(
            result,
            Err(RuntimeError::Scoring(ScoringError::ConfigurationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let mut config = deterministic_config();
        config.scoring.weights = WeightConfig::new([
            (PillarId::CapitalIntensity, 0.5),
            (PillarId::PipelineStrength, 0.5),
        ]);
        let orchestrator = RuntimeOrchestrator::new(config);

        let results = orchestrator
            .evaluate_batch(
                vec![
                    company(fixtures::CLINICAL_COMPANY),
                    company(fixtures::ZERO_BURN_COMPANY),
                    company(fixtures::EFFICIENT_PRECLINICAL_COMPANY),
                ],
                context(),
            )
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        let third = results[2].as_ref().unwrap();
        assert_eq!(third.result.company_name, "Lumen Therapeutics");
        assert_eq!(third.result.pillar_scores.len(), 2);
    }
}
