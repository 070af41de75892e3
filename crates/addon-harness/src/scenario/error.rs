use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("[{step}] request to {url} failed: {source}")]
    Http {
        step: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("[{step}] cannot build a request URL from {base}")]
    InvalidUrl { step: &'static str, base: String },
    #[error("[{step}] {url} answered {status}: {body}")]
    UnexpectedStatus {
        step: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("[{step}] {url} did not return JSON: {body}")]
    NonJson {
        step: &'static str,
        url: String,
        body: String,
    },
    #[error("[{step}] expected {expectation}, observed {observed}")]
    Assertion {
        step: &'static str,
        expectation: String,
        observed: String,
    },
    #[error("[{step}] no configuration id; encrypt-config must run first")]
    MissingConfigId { step: &'static str },
}

impl ScenarioError {
    pub fn step(&self) -> &'static str {
        match self {
            ScenarioError::Http { step, .. }
            | ScenarioError::InvalidUrl { step, .. }
            | ScenarioError::UnexpectedStatus { step, .. }
            | ScenarioError::NonJson { step, .. }
            | ScenarioError::Assertion { step, .. }
            | ScenarioError::MissingConfigId { step } => step,
        }
    }
}
