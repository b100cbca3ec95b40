//! Per-case results.

use crate::case::Case;
use crate::evaluator::ScoreResult;
use crate::metrics::{elapsed_secs, rate, rounded_rate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum number of failing trials whose full detail is kept per case.
pub const MAX_FAILED_TRIAL_DETAILS: usize = 3;

/// Raw provider output of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrialOutput {
    /// Output of a standard case.
    Single(String),
    /// Outputs of a metamorphic case.
    Pair {
        /// Output for the first prompt.
        a: String,
        /// Output for the second prompt.
        b: String,
    },
}

impl fmt::Display for TrialOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(text) => write!(f, "{}", text),
            Self::Pair { a, b } => write!(f, "A: {} | B: {}", a, b),
        }
    }
}

/// One executed trial, before it is folded into a [`CaseResult`].
#[derive(Debug, Clone)]
pub struct TrialRecord {
    /// Trial index, starting at 0.
    pub index: u32,
    /// Verdict for this trial.
    pub score: ScoreResult,
    /// Raw output.
    pub output: TrialOutput,
    /// Wall time spent in the provider.
    pub elapsed: Duration,
}

/// Detail kept for a failing trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTrial {
    /// Trial index, starting at 0.
    pub trial: u32,
    /// Why it failed.
    pub reasons: Vec<String>,
    /// Raw output.
    pub output: TrialOutput,
}

/// Result of running one case for N trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case id.
    pub id: String,
    /// Case category.
    pub category: String,
    /// Case severity.
    pub severity: i64,
    /// Trials executed.
    pub trials: u32,
    /// Trials that passed.
    pub pass_count: u32,
    /// `pass_count / trials`, 3 decimal places.
    pub pass_rate: f64,
    /// Same value as `pass_rate`, kept for record compatibility.
    pub reproducibility: f64,
    /// Pass rate strictly between the flaky thresholds.
    pub flaky: bool,
    /// Every trial passed.
    pub stable_pass: bool,
    /// No trial passed.
    pub stable_failure: bool,
    /// Seconds per trial, 4 decimal places.
    pub elapsed_s: Vec<f64>,
    /// Verdict per trial.
    #[serde(default)]
    pub trial_passes: Vec<bool>,
    /// Case notes.
    #[serde(default)]
    pub notes: String,
    /// First failing trials, at most [`MAX_FAILED_TRIAL_DETAILS`].
    pub failed_trials: Vec<FailedTrial>,
}

impl CaseResult {
    /// Fold trial records into a result.
    ///
    /// `flaky` uses the open interval `(flaky_low, flaky_high)` on the
    /// unrounded pass rate. With zero trials the pass rate is 0.0.
    pub fn from_trials(
        case: &Case,
        records: Vec<TrialRecord>,
        flaky_low: f64,
        flaky_high: f64,
    ) -> Self {
        let trials = records.len() as u32;
        let pass_count = records.iter().filter(|r| r.score.passed).count() as u32;
        let raw_rate = rate(pass_count.into(), trials.into());
        let pass_rate = rounded_rate(pass_count.into(), trials.into());

        let elapsed_s = records.iter().map(|r| elapsed_secs(r.elapsed)).collect();
        let trial_passes = records.iter().map(|r| r.score.passed).collect();

        let failed_trials = records
            .into_iter()
            .filter(|r| !r.score.passed)
            .take(MAX_FAILED_TRIAL_DETAILS)
            .map(|r| FailedTrial {
                trial: r.index,
                reasons: r.score.reasons,
                output: r.output,
            })
            .collect();

        Self {
            id: case.id.clone(),
            category: case.category.clone(),
            severity: case.severity,
            trials,
            pass_count,
            pass_rate,
            reproducibility: pass_rate,
            flaky: flaky_low < raw_rate && raw_rate < flaky_high,
            stable_pass: raw_rate == 1.0,
            stable_failure: raw_rate == 0.0,
            elapsed_s,
            trial_passes,
            notes: case.notes.clone(),
            failed_trials,
        }
    }

    /// Check if the case passed every trial.
    pub fn is_perfect(&self) -> bool {
        self.pass_rate >= 1.0
    }

    /// Stability label for reports.
    pub fn stability(&self) -> &'static str {
        if self.flaky {
            "flaky"
        } else if self.stable_pass {
            "stable-pass"
        } else if self.stable_failure {
            "stable-fail"
        } else {
            "mostly-consistent"
        }
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.stable_pass {
            "✅"
        } else if self.flaky {
            "⚠️"
        } else {
            "❌"
        };

        writeln!(
            f,
            "{} {} [{}] {}/{} ({:.1}%) {}",
            status,
            self.id,
            self.category,
            self.pass_count,
            self.trials,
            self.pass_rate * 100.0,
            self.stability()
        )?;

        for failed in &self.failed_trials {
            writeln!(f, "    trial {}: {}", failed.trial, failed.reasons.join("; "))?;
        }

        Ok(())
    }
}
