use serde_json::Value;
use serde_json::json;

use crate::chat;
use crate::entity::Entity;
use crate::entity::MediaId;
use crate::entity::MediaKind;
use crate::error::CatalogError;
use crate::request::FixtureRequest;
use crate::request::FixtureResponse;
use crate::route::Route;
use crate::route::RouteMatch;

const REJECTED_API_KEY: &str = "bad";
const IMAGE_BASE_URL: &str = "http://image.tmdb.org/t/p/";
const SECURE_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Maps `request` to its canned response, stamping chat completions with the current time.
pub fn respond_to(request: &FixtureRequest) -> FixtureResponse {
    respond_to_at(request, chrono::Utc::now().timestamp())
}

/// Same as [`respond_to`] with an explicit `created` timestamp.
pub fn respond_to_at(request: &FixtureRequest, created: i64) -> FixtureResponse {
    let route = match Route::parse(&request.method, &request.path) {
        RouteMatch::Matched(route) => route,
        RouteMatch::NotFound => return not_found(&request.path),
    };
    match dispatch(route, request, created) {
        Ok(response) => response,
        Err(err) => FixtureResponse::with_status(err.status(), json!({ "error": err.to_string() })),
    }
}

fn dispatch(
    route: Route,
    request: &FixtureRequest,
    created: i64,
) -> Result<FixtureResponse, CatalogError> {
    let response = match route {
        Route::ChatCompletions => FixtureResponse::ok(chat::complete(&request.body, created)?),
        Route::Configuration => configuration(request.query_param("api_key")),
        Route::Search(kind) => search(kind, request.query_param("query").unwrap_or_default()),
        Route::Details { kind, id } => {
            FixtureResponse::ok(Entity::details(kind, id).details_json())
        }
        Route::Find { external_id } => find(&external_id),
    };
    Ok(response)
}

fn configuration(api_key: Option<&str>) -> FixtureResponse {
    let authorized = api_key
        .map(str::trim)
        .is_some_and(|key| !key.is_empty() && key != REJECTED_API_KEY);
    if !authorized {
        return FixtureResponse::with_status(
            401,
            json!({
                "status_code": 7,
                "status_message": "Invalid API key: You must be granted a valid key.",
                "success": false,
            }),
        );
    }
    FixtureResponse::ok(json!({
        "images": {
            "base_url": IMAGE_BASE_URL,
            "secure_base_url": SECURE_IMAGE_BASE_URL,
            "backdrop_sizes": ["w300", "w780", "w1280", "original"],
            "logo_sizes": ["w45", "w92", "w154", "w185", "w300", "w500", "original"],
            "poster_sizes": ["w92", "w154", "w185", "w342", "w500", "w780", "original"],
            "profile_sizes": ["w45", "w185", "h632", "original"],
            "still_sizes": ["w92", "w185", "w300", "original"],
        },
        "change_keys": ["adult", "genres", "images", "title", "videos"],
    }))
}

fn search(kind: MediaKind, query: &str) -> FixtureResponse {
    let results: Vec<Value> = Entity::search(kind, query)
        .iter()
        .map(Entity::summary_json)
        .collect();
    FixtureResponse::ok(json!({
        "page": 1,
        "total_pages": 1,
        "total_results": results.len(),
        "results": results,
    }))
}

// `external_source` is accepted but not consulted; both lists are always filled.
fn find(external_id: &str) -> FixtureResponse {
    let movie =
        Entity::details(MediaKind::Movie, MediaId::Number(603)).with_external_id(external_id);
    let series =
        Entity::details(MediaKind::Series, MediaId::Number(1396)).with_external_id(external_id);
    FixtureResponse::ok(json!({
        "movie_results": [movie.summary_json()],
        "tv_results": [series.summary_json()],
        "person_results": [],
        "tv_episode_results": [],
        "tv_season_results": [],
    }))
}

fn not_found(path: &str) -> FixtureResponse {
    FixtureResponse::with_status(404, json!({ "error": "Not found", "path": path }))
}
