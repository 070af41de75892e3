//! In-process stand-in for the addon service.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::task::JoinHandle;
use url::Url;

use crate::scenario::client::ServiceClient;

pub const CONFIG_ID: &str = "cfg-fake-123";

/// Canned bodies per endpoint; the default set satisfies every step.
#[derive(Debug, Clone)]
pub struct Responses {
    pub validate_rejecting: Value,
    pub validate_accepting: Value,
    pub encrypt: Value,
    pub catalog: Value,
    pub meta: Value,
}

impl Default for Responses {
    fn default() -> Self {
        Self {
            validate_rejecting: json!({
                "tmdb": true,
                "openaiCompat": false,
                "errors": { "openaiCompat": "Extra headers must be valid JSON" }
            }),
            validate_accepting: json!({ "tmdb": true, "openaiCompat": true, "errors": {} }),
            encrypt: json!({ "encryptedConfig": CONFIG_ID }),
            catalog: json!({
                "metas": [{ "id": "tt0133093", "type": "movie", "name": "The Matrix" }]
            }),
            meta: json!({
                "meta": {
                    "id": "tt0133093",
                    "type": "movie",
                    "videos": [{ "id": "tt1375666", "title": "Inception" }]
                }
            }),
        }
    }
}

pub struct FakeService {
    base_url: Url,
    join: JoinHandle<()>,
}

impl FakeService {
    pub fn client(&self) -> ServiceClient {
        ServiceClient::new(crate::infra::loopback_client(), self.base_url.clone())
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.join.abort();
    }
}

pub async fn start(responses: Responses) -> FakeService {
    start_on(0, responses).await
}

/// Serves `responses` on a fixed loopback port; `0` picks a free one.
pub async fn start_on(port: u16, responses: Responses) -> FakeService {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(responses);
    let join = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    FakeService {
        base_url: Url::parse(&format!("http://{addr}")).unwrap(),
        join,
    }
}

pub fn router(responses: Responses) -> Router {
    Router::new()
        .route("/configure", get(|| async { "configure" }))
        .route("/validate", post(validate))
        .route("/encrypt", post(encrypt))
        .route(
            "/aisearch/:config/catalog/:kind/:catalog/:extra",
            get(catalog),
        )
        .route("/aisearch/:config/meta/:kind/:id", get(meta))
        .with_state(Arc::new(responses))
}

async fn validate(
    State(responses): State<Arc<Responses>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if body.get("OpenAICompatExtraHeaders").is_some() {
        return Json(responses.validate_rejecting.clone());
    }
    if body["TmdbApiKey"] != "mock" {
        return Json(json!({ "tmdb": false, "errors": { "tmdb": "Invalid key" } }));
    }
    Json(responses.validate_accepting.clone())
}

async fn encrypt(
    State(responses): State<Arc<Responses>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !body["TmdbApiKey"].is_string() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(responses.encrypt.clone()))
}

async fn catalog(
    State(responses): State<Arc<Responses>>,
    Path((config, _kind, _catalog, extra)): Path<(String, String, String, String)>,
) -> Result<Json<Value>, StatusCode> {
    if config != CONFIG_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    if !(extra.starts_with("search=") && extra.ends_with(".json")) {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(responses.catalog.clone()))
}

async fn meta(
    State(responses): State<Arc<Responses>>,
    Path((config, _kind, _id)): Path<(String, String, String)>,
) -> Result<Json<Value>, StatusCode> {
    if config != CONFIG_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(responses.meta.clone()))
}
