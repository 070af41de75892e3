//! Ordered HTTP scenarios against the service under test.

mod client;
mod context;
mod error;
pub mod expect;
mod steps;

#[cfg(test)]
pub(crate) mod fake_service;

use std::time::Duration;
use std::time::Instant;

use tracing::info;

pub use client::ServiceClient;
pub use client::ServiceResponse;
pub use context::ScenarioContext;
pub use error::ScenarioError;
pub use steps::Credentials;
pub use steps::EncryptRequest;
pub use steps::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    pub context: ScenarioContext,
}

impl ScenarioReport {
    pub fn total(&self) -> Duration {
        self.outcomes.iter().map(|o| o.elapsed).sum()
    }
}

/// Runs steps one at a time and stops at the first failure.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    client: ServiceClient,
    steps: Vec<Step>,
}

impl ScenarioRunner {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            steps: Step::ALL.to_vec(),
        }
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    pub async fn run(&self, mut context: ScenarioContext) -> Result<ScenarioReport, ScenarioError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().copied().enumerate() {
            info!(
                step = step.name(),
                index = index + 1,
                total = self.steps.len(),
                description = step.description(),
                "Running scenario step"
            );
            let started = Instant::now();
            context = step.run(&self.client, context).await?;
            let elapsed = started.elapsed();
            info!(
                step = step.name(),
                elapsed_ms = elapsed.as_millis(),
                "Step passed"
            );
            outcomes.push(StepOutcome { step, elapsed });
        }
        Ok(ScenarioReport { outcomes, context })
    }
}
