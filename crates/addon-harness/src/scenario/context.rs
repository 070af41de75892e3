use crate::infra::AiProvider;
use crate::scenario::error::ScenarioError;

/// State threaded from one step to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioContext {
    pub ai_provider: AiProvider,
    /// Base URL of the fixture server as seen by the service.
    pub fixture_base_url: String,
    /// Set by the encrypt step and required by every catalog request after it.
    pub config_id: Option<String>,
}

impl ScenarioContext {
    pub fn new(ai_provider: AiProvider, fixture_base_url: impl Into<String>) -> Self {
        Self {
            ai_provider,
            fixture_base_url: fixture_base_url.into(),
            config_id: None,
        }
    }

    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    pub fn require_config_id(&self, step: &'static str) -> Result<&str, ScenarioError> {
        self.config_id
            .as_deref()
            .ok_or(ScenarioError::MissingConfigId { step })
    }

    pub fn openai_compat_base_url(&self) -> String {
        format!("{}/v1", self.fixture_base_url.trim_end_matches('/'))
    }
}
