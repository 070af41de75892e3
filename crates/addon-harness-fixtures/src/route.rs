//! Explicit route patterns for the fixture surface.

use crate::entity::MediaId;
use crate::entity::MediaKind;
use crate::request::FixtureMethod;

const CHAT_COMPLETIONS: &str = "/v1/chat/completions";
const METADATA_PREFIX: &str = "/3/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ChatCompletions,
    Configuration,
    Search(MediaKind),
    Details { kind: MediaKind, id: MediaId },
    Find { external_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Matched(Route),
    NotFound,
}

impl Route {
    pub fn parse(method: &FixtureMethod, path: &str) -> RouteMatch {
        let route = match method {
            FixtureMethod::Post if path == CHAT_COMPLETIONS => Some(Route::ChatCompletions),
            FixtureMethod::Get => path
                .strip_prefix(METADATA_PREFIX)
                .and_then(parse_metadata_path),
            _ => None,
        };
        match route {
            Some(route) => RouteMatch::Matched(route),
            None => RouteMatch::NotFound,
        }
    }
}

fn parse_metadata_path(rest: &str) -> Option<Route> {
    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        ["configuration"] => Some(Route::Configuration),
        ["search", "movie"] => Some(Route::Search(MediaKind::Movie)),
        ["search", "tv"] => Some(Route::Search(MediaKind::Series)),
        ["movie", id] => parse_numeric_id(id).map(|id| Route::Details {
            kind: MediaKind::Movie,
            id,
        }),
        ["tv", id] => parse_numeric_id(id).map(|id| Route::Details {
            kind: MediaKind::Series,
            id,
        }),
        ["find", external_id] if is_external_id(external_id) => Some(Route::Find {
            external_id: (*external_id).to_string(),
        }),
        _ => None,
    }
}

fn parse_numeric_id(segment: &str) -> Option<MediaId> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(MediaId::from_digits(segment))
}

/// Two ASCII letters followed by at least one digit, e.g. `tt0133093`.
fn is_external_id(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() > 2
        && bytes[..2].iter().all(u8::is_ascii_alphabetic)
        && bytes[2..].iter().all(u8::is_ascii_digit)
}
