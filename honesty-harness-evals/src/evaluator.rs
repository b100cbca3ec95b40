//! Score results and scoring traits.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Verdict of one scoring call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Whether every check passed.
    pub passed: bool,
    /// Failure explanations in evaluation order. Empty iff passed.
    pub reasons: Vec<String>,
    /// Parsed structured output, set only by schema-shape scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<Map<String, Value>>,
}

impl ScoreResult {
    /// Create a pass result.
    pub fn pass() -> Self {
        Self {
            passed: true,
            reasons: Vec::new(),
            extracted: None,
        }
    }

    /// Create a fail result with one reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reasons: vec![reason.into()],
            extracted: None,
        }
    }

    /// Build a result from collected reasons; passes iff there are none.
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            passed: reasons.is_empty(),
            reasons,
            extracted: None,
        }
    }

    /// Attach the parsed structured output.
    pub fn with_extracted(mut self, extracted: Map<String, Value>) -> Self {
        self.extracted = Some(extracted);
        self
    }

    /// Record a failure.
    pub fn push_failure(&mut self, reason: impl Into<String>) {
        self.passed = false;
        self.reasons.push(reason.into());
    }

    /// Fold another result into this one (AND of verdicts, reasons appended).
    pub fn absorb(&mut self, other: ScoreResult) {
        self.passed &= other.passed;
        self.reasons.extend(other.reasons);
    }

    /// Check if passed.
    pub fn is_pass(&self) -> bool {
        self.passed
    }

    /// Check if failed.
    pub fn is_fail(&self) -> bool {
        !self.passed
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            write!(f, "✅ PASS")
        } else {
            write!(f, "❌ FAIL: {}", self.reasons.join("; "))
        }
    }
}

/// Scores a single output.
pub trait Evaluator {
    /// Evaluator name, used in logs.
    fn name(&self) -> &str;

    /// Score one output.
    fn evaluate(&self, output: &str) -> ScoreResult;
}

/// Scores a relationship between two outputs of related prompts.
pub trait PairEvaluator {
    /// Evaluator name, used in logs.
    fn name(&self) -> &str;

    /// Score the pair.
    fn evaluate_pair(&self, a: &str, b: &str) -> ScoreResult;
}
