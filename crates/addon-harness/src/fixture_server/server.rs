use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use super::config::FixtureServerConfig;
use super::error::FixtureServerError;
use super::router::build_router;

const SERVER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// A running fixture server. Dropping the handle closes the shutdown channel,
/// which stops the server without waiting for in-flight requests.
pub struct FixtureServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<watch::Sender<bool>>,
    join: Option<JoinHandle<Result<(), FixtureServerError>>>,
}

impl FixtureServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub async fn shutdown(mut self) -> Result<(), FixtureServerError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        let Some(mut join) = self.join.take() else {
            return Ok(());
        };
        match tokio::time::timeout(SERVER_SHUTDOWN_TIMEOUT, &mut join).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    timeout_ms = SERVER_SHUTDOWN_TIMEOUT.as_millis(),
                    "Fixture server shutdown timed out; aborting"
                );
                join.abort();
                Ok(())
            }
        }
    }
}

pub async fn start_fixture_server(
    config: FixtureServerConfig,
) -> Result<FixtureServerHandle, FixtureServerError> {
    let (listener, local_addr) = bind_listener(config.listen())?;
    let listener = TcpListener::from_std(listener).map_err(|e| FixtureServerError::Io {
        operation: "create async listener",
        source: e,
    })?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let app = build_router();
    info!(url = %format!("http://{local_addr}"), "Fixture server listening");

    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
            .map_err(|e| FixtureServerError::Io {
                operation: "serve",
                source: e,
            })
    });

    Ok(FixtureServerHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}

fn bind_listener(
    addr: SocketAddr,
) -> Result<(std::net::TcpListener, SocketAddr), FixtureServerError> {
    if !addr.ip().is_loopback() {
        return Err(FixtureServerError::InvalidListen {
            message: format!("refusing to bind non-loopback address {addr}"),
        });
    }

    let listener = std::net::TcpListener::bind(addr).map_err(|e| FixtureServerError::Io {
        operation: "bind",
        source: e,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|e| FixtureServerError::Io {
            operation: "set non-blocking",
            source: e,
        })?;
    let local_addr = listener.local_addr().map_err(|e| FixtureServerError::Io {
        operation: "read local address",
        source: e,
    })?;
    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use serde_json::json;

    async fn start() -> FixtureServerHandle {
        start_fixture_server(FixtureServerConfig::with_port(0))
            .await
            .unwrap()
    }

    #[test]
    fn test_bind_refuses_non_loopback() {
        let result = bind_listener("0.0.0.0:0".parse().unwrap());
        assert!(matches!(
            result,
            Err(FixtureServerError::InvalidListen { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_over_http_sets_json_headers() {
        let server = start().await;
        let url = format!("{}/3/search/movie?query=The%20Matrix", server.base_url());
        let response = reqwest::get(&url).await.unwrap();

        assert_eq!(response.status(), 200);
        let content_type = response.headers()["content-type"]
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("application/json"));
        let content_length: usize = response.headers()["content-length"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let body = response.bytes().await.unwrap();
        assert_eq!(content_length, body.len());

        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["results"][0]["id"], 603);
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_chat_completion_over_http() {
        let server = start().await;
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/v1/chat/completions", server.base_url()))
            .json(&json!({
                "model": "mock-model",
                "messages": [{
                    "role": "system",
                    "content": "You are a series recommendation expert."
                }]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let value: Value = response.json().await.unwrap();
        let content = value["choices"][0]["message"]["content"].as_str().unwrap();
        assert_eq!(content.lines().count(), 5);
        assert!(content.lines().all(|line| line.starts_with("series|")));
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_chat_body_is_accepted() {
        let server = start().await;
        let response = reqwest::Client::new()
            .post(format!("{}/v1/chat/completions", server.base_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_500_and_listener_survives() {
        let server = start().await;
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/v1/chat/completions", server.base_url()))
            .body("{broken")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let value: Value = response.json().await.unwrap();
        assert!(value["error"].is_string());

        let url = format!("{}/3/configuration?api_key=mock", server.base_url());
        let response = client
            .get(url)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_auth_failure_and_unknown_route() {
        let server = start().await;
        let response = reqwest::get(format!("{}/3/configuration?api_key=bad", server.base_url()))
            .await
            .unwrap();
        assert_eq!(response.status(), 401);

        let response = reqwest::get(format!("{}/nope", server.base_url()))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let value: Value = response.json().await.unwrap();
        assert_eq!(value["path"], "/nope");
        server.shutdown().await.unwrap();
    }
}
