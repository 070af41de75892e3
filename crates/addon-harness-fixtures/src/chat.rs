//! OpenAI-compatible chat completion fixture.

use serde::Serialize;
use serde_json::Value;

use crate::error::CatalogError;

/// Prompt substring that switches the reply to series recommendations.
pub const SERIES_MARKER: &str = "series recommendation expert";

const DEFAULT_MODEL: &str = "mock-model";
const COMPLETION_ID: &str = "chatcmpl-fixture";

const MOVIE_RECOMMENDATIONS: [(&str, u16); 5] = [
    ("The Matrix", 1999),
    ("Inception", 2010),
    ("Interstellar", 2014),
    ("The Dark Knight", 2008),
    ("Blade Runner 2049", 2017),
];

const SERIES_RECOMMENDATIONS: [(&str, u16); 5] = [
    ("Breaking Bad", 2008),
    ("Better Call Saul", 2015),
    ("The Wire", 2002),
    ("Game of Thrones", 2011),
    ("Stranger Things", 2016),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecommendationKind {
    Movie,
    Series,
}

impl RecommendationKind {
    fn classify(prompt: &str) -> Self {
        if prompt.to_lowercase().contains(SERIES_MARKER) {
            RecommendationKind::Series
        } else {
            RecommendationKind::Movie
        }
    }

    fn label(self) -> &'static str {
        match self {
            RecommendationKind::Movie => "movie",
            RecommendationKind::Series => "series",
        }
    }

    fn records(self) -> &'static [(&'static str, u16)] {
        match self {
            RecommendationKind::Movie => &MOVIE_RECOMMENDATIONS,
            RecommendationKind::Series => &SERIES_RECOMMENDATIONS,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletion {
    id: &'static str,
    object: &'static str,
    created: i64,
    model: String,
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Debug, Serialize)]
struct Choice {
    index: u32,
    message: Message,
    finish_reason: &'static str,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

pub(crate) fn complete(body: &[u8], created: i64) -> Result<Value, CatalogError> {
    let request = parse_body(body)?;
    let prompt = first_message_content(&request).unwrap_or_default();
    let kind = RecommendationKind::classify(prompt);
    let model = request
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MODEL)
        .to_string();

    let completion = ChatCompletion {
        id: COMPLETION_ID,
        object: "chat.completion",
        created,
        model,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: "assistant",
                content: recommendation_lines(kind),
            },
            finish_reason: "stop",
        }],
        usage: Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
        },
    };
    Ok(serde_json::to_value(completion)?)
}

fn parse_body(body: &[u8]) -> Result<Value, CatalogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_slice(body)?)
}

fn first_message_content(request: &Value) -> Option<&str> {
    request
        .get("messages")?
        .as_array()?
        .first()?
        .get("content")?
        .as_str()
}

fn recommendation_lines(kind: RecommendationKind) -> String {
    kind.records()
        .iter()
        .map(|(title, year)| format!("{}|{}|{}", kind.label(), title, year))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: &Value) -> &str {
        value["choices"][0]["message"]["content"].as_str().unwrap()
    }

    #[test]
    fn test_series_marker_selects_series_branch() {
        let body = json!({
            "model": "gpt-test",
            "messages": [{ "role": "system", "content": "You are a Series Recommendation Expert." }]
        });
        let value = complete(body.to_string().as_bytes(), 7).unwrap();
        let lines: Vec<&str> = content(&value).lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|line| line.starts_with("series|")));
        assert_eq!(value["model"], "gpt-test");
        assert_eq!(value["created"], 7);
    }

    #[test]
    fn test_empty_body_defaults_to_movies() {
        let value = complete(b"", 0).unwrap();
        let lines: Vec<&str> = content(&value).lines().collect();
        assert_eq!(lines[0], "movie|The Matrix|1999");
        assert_eq!(lines.len(), 5);
        assert_eq!(value["model"], DEFAULT_MODEL);
    }

    #[test]
    fn test_non_string_content_defaults_to_movies() {
        let body = json!({ "messages": [{ "content": [{ "type": "text" }] }] });
        let value = complete(body.to_string().as_bytes(), 0).unwrap();
        assert!(content(&value).starts_with("movie|"));
    }

    #[test]
    fn test_marker_only_read_from_first_message() {
        let body = json!({
            "messages": [
                { "content": "recommend something" },
                { "content": "series recommendation expert" }
            ]
        });
        let value = complete(body.to_string().as_bytes(), 0).unwrap();
        assert!(content(&value).starts_with("movie|"));
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        let result = complete(b"{\"messages\": [", 0);
        assert!(matches!(result, Err(CatalogError::MalformedBody(_))));
    }
}
