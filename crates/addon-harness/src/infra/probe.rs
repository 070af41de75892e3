//! HTTP readiness polling.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{url} was not ready within {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },
    #[error("{name} exited unexpectedly ({status})")]
    ChildExited { name: String, status: ExitStatus },
}

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: reqwest::Client,
    interval: Duration,
}

/// Client for loopback traffic; proxy settings from the environment are ignored.
pub fn loopback_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(loopback_client())
    }
}

impl ReadinessProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// GETs `url` until it answers 2xx. Returns how long that took.
    pub async fn wait_until_ready(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Duration, ProbeError> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, self.client.get(url).send()).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    let elapsed = started.elapsed();
                    info!(url, attempt, elapsed_ms = elapsed.as_millis(), "Ready");
                    return Ok(elapsed);
                }
                Ok(Ok(response)) => {
                    let status = response.status().as_u16();
                    debug!(url, attempt, status, "Not ready yet");
                }
                Ok(Err(err)) => {
                    debug!(url, attempt, error = %err, "Not reachable yet");
                }
                Err(_) => break,
            }

            if Instant::now() + self.interval >= deadline {
                tokio::time::sleep_until(deadline).await;
                break;
            }
            tokio::time::sleep(self.interval).await;
        }

        Err(ProbeError::Timeout {
            url: url.to_string(),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture_server::FixtureServerConfig;
    use crate::fixture_server::start_fixture_server;

    fn unused_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_ready_against_fixture_server() {
        let server = start_fixture_server(FixtureServerConfig::with_port(0))
            .await
            .unwrap();
        let url = format!("{}/3/configuration?api_key=mock", server.base_url());
        let elapsed = ReadinessProbe::default()
            .wait_until_ready(&url, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(elapsed < Duration::from_secs(5));
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_polling_until_timeout() {
        let server = start_fixture_server(FixtureServerConfig::with_port(0))
            .await
            .unwrap();
        let url = format!("{}/3/configuration?api_key=bad", server.base_url());
        let result = ReadinessProbe::default()
            .with_interval(Duration::from_millis(20))
            .wait_until_ready(&url, Duration::from_millis(200))
            .await;
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_times_out() {
        let url = format!("http://127.0.0.1:{}/configure", unused_port());
        let started = std::time::Instant::now();
        let result = ReadinessProbe::default()
            .wait_until_ready(&url, Duration::from_millis(600))
            .await;
        match result {
            Err(ProbeError::Timeout { url: reported, timeout }) => {
                assert_eq!(reported, url);
                assert_eq!(timeout, Duration::from_millis(600));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_millis(600));
    }
}
