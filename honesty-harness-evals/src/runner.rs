//! Multi-trial evaluation runner.

use crate::case::Case;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{Evaluator, PairEvaluator, ScoreResult};
use crate::provider::Provider;
use crate::report::EvaluationReport;
use crate::result::{CaseResult, TrialOutput, TrialRecord};
use crate::rules::Expected;
use crate::suite::EvalSuite;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Default number of trials per case.
pub const DEFAULT_TRIALS: u32 = 5;
/// Default lower flaky threshold (exclusive).
pub const DEFAULT_FLAKY_LOW: f64 = 0.2;
/// Default upper flaky threshold (exclusive).
pub const DEFAULT_FLAKY_HIGH: f64 = 0.8;

/// Options for running evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Trials per case.
    pub trials: u32,
    /// A pass rate must be above this to count as flaky.
    pub flaky_low: f64,
    /// A pass rate must be below this to count as flaky.
    pub flaky_high: f64,
    /// Maximum cases in flight. 1 runs the suite strictly sequentially.
    pub concurrency: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            flaky_low: DEFAULT_FLAKY_LOW,
            flaky_high: DEFAULT_FLAKY_HIGH,
            concurrency: 1,
        }
    }
}

impl EvalOptions {
    /// Create new options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set trials per case.
    pub fn trials(mut self, n: u32) -> Self {
        self.trials = n;
        self
    }

    /// Set the flaky thresholds.
    pub fn flaky_thresholds(mut self, low: f64, high: f64) -> Self {
        self.flaky_low = low;
        self.flaky_high = high;
        self
    }

    /// Set concurrency.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Reject thresholds outside `[0, 1]` or in the wrong order.
    pub fn validate(&self) -> EvalResult<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.flaky_low) || !in_range(self.flaky_high) {
            return Err(EvalError::invalid_options(format!(
                "flaky thresholds must lie in [0, 1], got {} and {}",
                self.flaky_low, self.flaky_high
            )));
        }
        if self.flaky_low > self.flaky_high {
            return Err(EvalError::invalid_options(format!(
                "flaky_low ({}) is greater than flaky_high ({})",
                self.flaky_low, self.flaky_high
            )));
        }
        Ok(())
    }
}

/// Evaluation runner.
#[derive(Debug, Clone, Default)]
pub struct EvalRunner {
    options: EvalOptions,
}

impl EvalRunner {
    /// Create a new runner with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set options.
    pub fn options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn current_options(&self) -> &EvalOptions {
        &self.options
    }

    /// Run one case for the configured number of trials.
    pub async fn run_case<P: Provider + ?Sized>(&self, case: &Case, provider: &P) -> CaseResult {
        run_case(
            case,
            provider,
            self.options.trials,
            self.options.flaky_low,
            self.options.flaky_high,
        )
        .await
    }

    /// Run a loaded suite and name the report after it.
    pub async fn run<P: Provider + ?Sized>(
        &self,
        suite: &EvalSuite,
        provider: &P,
    ) -> EvalResult<EvaluationReport> {
        let report = self.run_suite(&suite.cases, provider).await?;
        Ok(match &suite.name {
            Some(name) => report.with_name(name.clone()),
            None => report,
        })
    }

    /// Run every case and aggregate the results.
    ///
    /// Results are always in suite order, whatever the concurrency.
    pub async fn run_suite<P: Provider + ?Sized>(
        &self,
        cases: &[Case],
        provider: &P,
    ) -> EvalResult<EvaluationReport> {
        self.options.validate()?;

        info!(
            cases = cases.len(),
            trials = self.options.trials,
            concurrency = self.options.concurrency,
            provider = provider.name(),
            "Starting suite run"
        );

        let results = if self.options.concurrency <= 1 {
            let mut results = Vec::with_capacity(cases.len());
            for case in cases {
                results.push(self.run_case(case, provider).await);
            }
            results
        } else {
            let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
            let tasks: Vec<_> = cases
                .iter()
                .map(|case| {
                    let sem = semaphore.clone();
                    async move {
                        let _permit = sem.acquire().await.ok();
                        self.run_case(case, provider).await
                    }
                })
                .collect();
            futures::future::join_all(tasks).await
        };

        let report = EvaluationReport::new(results)
            .with_options(self.options.clone())
            .with_provider(provider.name());

        info!(
            run_id = %report.run_id,
            total_cases = report.summary.total_cases,
            overall_pass_rate = report.summary.overall_pass_rate,
            flaky_cases = report.summary.flaky_cases,
            "Suite run finished"
        );

        Ok(report)
    }
}

/// Run one case `trials` times against `provider`.
///
/// Trials run sequentially. A provider error or panic fails that trial
/// with a `Provider error:` reason instead of aborting the run.
pub async fn run_case<P: Provider + ?Sized>(
    case: &Case,
    provider: &P,
    trials: u32,
    flaky_low: f64,
    flaky_high: f64,
) -> CaseResult {
    if case.is_ambiguous() {
        warn!(case = %case.id, "Case has both a prompt and a metamorphic block; using metamorphic");
    }

    let mut records = Vec::with_capacity(trials as usize);
    for index in 0..trials {
        let record = run_trial(case, provider, index).await;
        debug!(
            case = %case.id,
            trial = index,
            passed = record.score.passed,
            elapsed_ms = record.elapsed.as_millis() as u64,
            "Trial finished"
        );
        records.push(record);
    }

    let result = CaseResult::from_trials(case, records, flaky_low, flaky_high);
    info!(
        case = %result.id,
        pass_rate = result.pass_rate,
        flaky = result.flaky,
        "Case finished"
    );
    result
}

async fn run_trial<P: Provider + ?Sized>(case: &Case, provider: &P, index: u32) -> TrialRecord {
    let start = Instant::now();

    let (score, output, elapsed) = match &case.metamorphic {
        Some(meta) => {
            let a = invoke(provider, &meta.a_prompt).await;
            let b = if a.is_ok() {
                invoke(provider, &meta.b_prompt).await
            } else {
                Ok(String::new())
            };
            let elapsed = start.elapsed();

            match (a, b) {
                (Ok(a), Ok(b)) => {
                    let score = meta.expectation.evaluate_pair(&a, &b);
                    (score, TrialOutput::Pair { a, b }, elapsed)
                }
                (Ok(a), Err(fault)) => (
                    ScoreResult::fail(fault),
                    TrialOutput::Pair { a, b: String::new() },
                    elapsed,
                ),
                (Err(fault), _) => (
                    ScoreResult::fail(fault),
                    TrialOutput::Pair {
                        a: String::new(),
                        b: String::new(),
                    },
                    elapsed,
                ),
            }
        }
        None => {
            let prompt = case.prompt.as_deref().unwrap_or_default();
            let out = invoke(provider, prompt).await;
            let elapsed = start.elapsed();

            match out {
                Ok(text) => {
                    let score = match &case.expected {
                        Some(expected) => expected.evaluate(&text),
                        None => Expected::default().evaluate(&text),
                    };
                    (score, TrialOutput::Single(text), elapsed)
                }
                Err(fault) => (
                    ScoreResult::fail(fault),
                    TrialOutput::Single(String::new()),
                    elapsed,
                ),
            }
        }
    };

    TrialRecord {
        index,
        score,
        output,
        elapsed,
    }
}

/// Call the provider inside a fault boundary.
async fn invoke<P: Provider + ?Sized>(provider: &P, prompt: &str) -> Result<String, String> {
    match AssertUnwindSafe(provider.generate(prompt)).catch_unwind().await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!(provider = provider.name(), error = %e, "Provider call failed");
            Err(format!("Provider error: {:#}", e))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(provider = provider.name(), panic = %message, "Provider call panicked");
            Err(format!("Provider error: panicked: {}", message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
