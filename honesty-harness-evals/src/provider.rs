//! Text-generation providers.
//!
//! The runner only depends on [`Provider`]. Real model clients implement it
//! outside this crate; [`MockProvider`] and [`FunctionProvider`] cover local
//! smoke runs and tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Anything that turns a prompt into text.
///
/// Implementations must be `Send + Sync`: a runner with case-level
/// concurrency shares one provider across in-flight cases.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, used in logs and reports.
    fn name(&self) -> &str {
        "provider"
    }

    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).generate(prompt).await
    }
}

/// Response returned by [`MockProvider`] when no canned needle matches.
pub const MOCK_DEFAULT_RESPONSE: &str =
    "I can't access external updates directly. If you paste the text here, I can help summarize it.";

/// A no-keys provider for local smoke runs.
///
/// Canned responses are checked in insertion order; the first needle found
/// in the prompt (case-sensitive) wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockProvider {
    /// Needle to response.
    #[serde(default)]
    pub canned: IndexMap<String, String>,
}

impl MockProvider {
    /// Create a mock with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned response.
    pub fn with_response(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.canned.insert(needle.into(), response.into());
        self
    }

    /// Load canned responses from a YAML or JSON mapping.
    pub fn from_yaml_str(content: &str) -> crate::EvalResult<Self> {
        let canned: IndexMap<String, String> = serde_yaml::from_str(content)?;
        Ok(Self { canned })
    }

    /// Pick the response for a prompt.
    pub fn respond(&self, prompt: &str) -> &str {
        self.canned
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.as_str())
            .unwrap_or(MOCK_DEFAULT_RESPONSE)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.respond(prompt).to_string())
    }
}

/// Function-based provider.
pub struct FunctionProvider<F> {
    name: String,
    func: F,
}

impl<F> FunctionProvider<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    /// Create a new function-based provider.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Provider for FunctionProvider<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        (self.func)(prompt)
    }
}
