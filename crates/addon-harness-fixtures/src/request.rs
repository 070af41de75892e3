use std::collections::BTreeMap;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureMethod {
    Get,
    Post,
    Other(String),
}

impl FixtureMethod {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => FixtureMethod::Get,
            "POST" => FixtureMethod::Post,
            other => FixtureMethod::Other(other.to_string()),
        }
    }
}

/// One inbound request, already split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRequest {
    pub method: FixtureMethod,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl FixtureRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: FixtureMethod::Get,
            path: path.into(),
            query: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: FixtureMethod::Post,
            path: path.into(),
            query: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Builds the query map from decoded pairs; the first occurrence of a key wins.
    pub fn with_query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.query.entry(key.into()).or_insert_with(|| value.into());
        }
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureResponse {
    pub status: u16,
    pub body: Value,
}

impl FixtureResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}
