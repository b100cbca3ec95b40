//! Evaluation reports and summaries.

use crate::error::EvalResult;
use crate::markers::MARKER_VOCABULARY_VERSION;
use crate::metrics::rounded_rate;
use crate::result::CaseResult;
use crate::runner::EvalOptions;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Statistics for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Cases in the category.
    pub cases: usize,
    /// Trials across those cases.
    pub trials: u64,
    /// Passing trials across those cases.
    pub passes: u64,
    /// `passes / trials`, 3 decimal places.
    pub pass_rate: f64,
}

/// Summary statistics for an evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of cases.
    pub total_cases: usize,
    /// Total trials across all cases.
    pub total_trials: u64,
    /// Total passing trials.
    pub total_passes: u64,
    /// `total_passes / total_trials`, 3 decimal places.
    pub overall_pass_rate: f64,
    /// Cases classified as flaky.
    pub flaky_cases: usize,
    /// Per-category statistics, in first-seen order.
    pub by_category: IndexMap<String, CategoryStats>,
    /// Cases with a pass rate below 1.0, keyed by stringified severity.
    pub cases_not_perfect_by_severity: IndexMap<String, usize>,
}

/// Reduce per-case results into a summary.
///
/// Category and severity keys are used verbatim: "Safety" and "safety" are
/// different buckets.
pub fn summarize(results: &[CaseResult]) -> ReportSummary {
    let mut summary = ReportSummary {
        total_cases: results.len(),
        ..Default::default()
    };

    for result in results {
        let trials = u64::from(result.trials);
        let passes = u64::from(result.pass_count);

        summary.total_trials += trials;
        summary.total_passes += passes;

        let stats = summary
            .by_category
            .entry(result.category.clone())
            .or_default();
        stats.cases += 1;
        stats.trials += trials;
        stats.passes += passes;

        if result.flaky {
            summary.flaky_cases += 1;
        }

        if !result.is_perfect() {
            *summary
                .cases_not_perfect_by_severity
                .entry(result.severity.to_string())
                .or_default() += 1;
        }
    }

    for stats in summary.by_category.values_mut() {
        stats.pass_rate = rounded_rate(stats.passes, stats.trials);
    }
    summary.overall_pass_rate = rounded_rate(summary.total_passes, summary.total_trials);

    summary
}

/// Full evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Report name, usually the suite name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Provider that produced the outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Options the run used.
    pub options: EvalOptions,
    /// Marker vocabulary version used for scoring.
    pub marker_vocabulary_version: u32,
    /// Summary statistics.
    pub summary: ReportSummary,
    /// Per-case results, in suite order.
    pub results: Vec<CaseResult>,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
}

impl EvaluationReport {
    /// Create a new report from case results.
    pub fn new(results: Vec<CaseResult>) -> Self {
        let summary = summarize(&results);
        Self {
            run_id: Uuid::new_v4(),
            name: None,
            provider: None,
            options: EvalOptions::default(),
            marker_vocabulary_version: MARKER_VOCABULARY_VERSION,
            summary,
            results,
            timestamp: Utc::now(),
        }
    }

    /// Set the report name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record the provider name.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Record the options used.
    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Cases classified as flaky.
    pub fn flaky_cases(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| r.flaky)
    }

    /// Cases that failed at least one trial.
    pub fn imperfect_cases(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| !r.is_perfect())
    }

    /// Render results as newline-delimited JSON, one case per line.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for result in &self.results {
            out.push_str(&serde_json::to_string(result)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Render the summary as pretty JSON.
    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.summary)
    }

    /// Render the whole report as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write `run-<ts>.jsonl` and `summary-<ts>.json` into `out_dir`.
    ///
    /// Returns the path of the JSONL file.
    pub fn save(&self, out_dir: impl AsRef<Path>) -> EvalResult<PathBuf> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir)?;

        let ts = self.timestamp.format("%Y%m%d-%H%M%S");
        let run_path = out_dir.join(format!("run-{}.jsonl", ts));
        let summary_path = out_dir.join(format!("summary-{}.json", ts));

        fs::write(&run_path, self.to_jsonl()?)?;
        fs::write(&summary_path, self.summary_json()?)?;

        info!(
            run = %run_path.display(),
            summary = %summary_path.display(),
            "Saved results"
        );
        Ok(run_path)
    }

    /// Render as text.
    pub fn to_text(&self) -> String {
        let summary = &self.summary;
        let mut output = String::new();

        output.push_str("\n\u{1F4CA} Evaluation Report\n");
        output.push_str("═══════════════════\n\n");

        if let Some(ref name) = self.name {
            output.push_str(&format!("Name: {}\n", name));
        }
        if let Some(ref provider) = self.provider {
            output.push_str(&format!("Provider: {}\n", provider));
        }
        output.push_str(&format!("Run: {}\n", self.run_id));
        output.push_str(&format!("Timestamp: {}\n\n", self.timestamp));

        output.push_str(&format!("Total Cases: {}\n", summary.total_cases));
        output.push_str(&format!(
            "Trials: {} passed of {} ({:.1}%)\n",
            summary.total_passes,
            summary.total_trials,
            summary.overall_pass_rate * 100.0
        ));
        output.push_str(&format!("⚠️ Flaky Cases: {}\n", summary.flaky_cases));

        if !summary.by_category.is_empty() {
            output.push_str("\nCategory Breakdown:\n");
            for (category, stats) in &summary.by_category {
                output.push_str(&format!(
                    "  {}: {}/{} trials ({:.1}%) across {} cases\n",
                    category,
                    stats.passes,
                    stats.trials,
                    stats.pass_rate * 100.0,
                    stats.cases
                ));
            }
        }

        if !summary.cases_not_perfect_by_severity.is_empty() {
            output.push_str("\nImperfect Cases by Severity:\n");
            for (severity, count) in &summary.cases_not_perfect_by_severity {
                output.push_str(&format!("  severity {}: {}\n", severity, count));
            }
        }

        let imperfect: Vec<_> = self.imperfect_cases().collect();
        if !imperfect.is_empty() {
            output.push_str("\nImperfect Cases:\n");
            for case in imperfect.iter().take(10) {
                output.push_str(&format!("  {}", case));
            }
            if imperfect.len() > 10 {
                output.push_str(&format!("  ... and {} more\n", imperfect.len() - 10));
            }
        }

        output
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
