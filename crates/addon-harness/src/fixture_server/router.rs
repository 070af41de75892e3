use std::collections::BTreeMap;

use addon_harness_fixtures::FixtureMethod;
use addon_harness_fixtures::FixtureRequest;
use addon_harness_fixtures::respond_to;
use axum::Json;
use axum::Router;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use bytes::Bytes;
use tower_http::trace::TraceLayer;
use tracing::debug;
use tracing::warn;

/// Every request lands in one handler; route matching belongs to the catalog.
pub fn build_router() -> Router {
    Router::new()
        .fallback(fixture_handler)
        .layer(TraceLayer::new_for_http())
}

async fn fixture_handler(method: Method, uri: Uri, body: Bytes) -> Response {
    let request = to_fixture_request(&method, &uri, body);
    let response = respond_to(&request);
    debug!(
        method = %method,
        path = %request.path,
        status = response.status,
        "Served fixture"
    );
    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        warn!(
            status = response.status,
            "Catalog produced an invalid status code"
        );
        StatusCode::INTERNAL_SERVER_ERROR
    });
    (status, Json(response.body)).into_response()
}

fn to_fixture_request(method: &Method, uri: &Uri, body: Bytes) -> FixtureRequest {
    let query = uri.query().unwrap_or_default();
    let pairs = url::form_urlencoded::parse(query.as_bytes()).into_owned();
    FixtureRequest {
        method: FixtureMethod::parse(method.as_str()),
        path: uri.path().to_string(),
        query: BTreeMap::new(),
        body: body.to_vec(),
    }
    .with_query_pairs(pairs)
}
