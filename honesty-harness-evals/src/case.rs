//! Evaluation case definitions.

use crate::rules::{Expected, MetamorphicExpectation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single evaluation test case.
///
/// A case is either a standard case (`prompt` + `expected`) or a metamorphic
/// case (`metamorphic`). A case with neither scores an empty output against
/// an empty rule set and passes trivially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Identifier, unique within a suite.
    pub id: String,
    /// Free-form grouping such as "calibration" or "safety".
    pub category: String,
    /// Consequence of failure; higher is worse.
    pub severity: i64,
    /// Prompt for a standard case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Rules for the standard case's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
    /// Paired prompts for a metamorphic case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metamorphic: Option<Metamorphic>,
    /// Annotation, never evaluated.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Case {
    /// Create a case with no prompt or rules.
    pub fn new(id: impl Into<String>, category: impl Into<String>, severity: i64) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            severity,
            prompt: None,
            expected: None,
            metamorphic: None,
            notes: String::new(),
        }
    }

    /// Set the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the expected rules.
    pub fn with_expected(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Make this a metamorphic case.
    pub fn with_metamorphic(mut self, metamorphic: Metamorphic) -> Self {
        self.metamorphic = Some(metamorphic);
        self
    }

    /// Set the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Check if this is a metamorphic case.
    pub fn is_metamorphic(&self) -> bool {
        self.metamorphic.is_some()
    }

    /// Check if a prompt is also set on a metamorphic case. The prompt is
    /// ignored in that situation.
    pub fn is_ambiguous(&self) -> bool {
        self.metamorphic.is_some() && (self.prompt.is_some() || self.expected.is_some())
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_metamorphic() {
            "metamorphic"
        } else {
            "standard"
        };
        write!(
            f,
            "{} [{}] severity={} ({})",
            self.id, self.category, self.severity, kind
        )
    }
}

/// Two related prompts and the relationship their outputs must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metamorphic {
    /// First prompt variant.
    pub a_prompt: String,
    /// Second prompt variant.
    pub b_prompt: String,
    /// Relationship checked across both outputs.
    #[serde(default)]
    pub expectation: MetamorphicExpectation,
}

impl Metamorphic {
    /// Create a pair with no expectations.
    pub fn new(a_prompt: impl Into<String>, b_prompt: impl Into<String>) -> Self {
        Self {
            a_prompt: a_prompt.into(),
            b_prompt: b_prompt.into(),
            expectation: MetamorphicExpectation::default(),
        }
    }

    /// Set the expectation.
    pub fn with_expectation(mut self, expectation: MetamorphicExpectation) -> Self {
        self.expectation = expectation;
        self
    }
}
