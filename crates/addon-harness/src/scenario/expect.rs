//! Presence checks on nested response fields.
//!
//! Every helper either returns the typed value or an assertion error that
//! carries the observed JSON, so a failure reads on its own.

use serde_json::Value;

use crate::scenario::error::ScenarioError;

const OBSERVED_LIMIT: usize = 400;

/// Follows a dotted path such as `meta.videos`.
pub fn field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

pub fn ensure(
    step: &'static str,
    condition: bool,
    expectation: impl Into<String>,
    observed: &Value,
) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(failure(step, expectation, observed))
    }
}

pub fn bool_field(step: &'static str, value: &Value, path: &str) -> Result<bool, ScenarioError> {
    field(value, path)
        .and_then(Value::as_bool)
        .ok_or_else(|| failure(step, format!("`{path}` to be a boolean"), value))
}

pub fn non_empty_str<'a>(
    step: &'static str,
    value: &'a Value,
    path: &str,
) -> Result<&'a str, ScenarioError> {
    field(value, path)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| failure(step, format!("`{path}` to be a non-empty string"), value))
}

pub fn non_empty_array<'a>(
    step: &'static str,
    value: &'a Value,
    path: &str,
) -> Result<&'a Vec<Value>, ScenarioError> {
    field(value, path)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| failure(step, format!("`{path}` to be a non-empty array"), value))
}

pub fn failure(
    step: &'static str,
    expectation: impl Into<String>,
    observed: &Value,
) -> ScenarioError {
    ScenarioError::Assertion {
        step,
        expectation: expectation.into(),
        observed: truncate(observed.to_string()),
    }
}

fn truncate(mut text: String) -> String {
    if text.len() <= OBSERVED_LIMIT {
        return text;
    }
    let mut cut = OBSERVED_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("...");
    text
}
