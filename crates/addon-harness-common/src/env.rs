//! Environment variable parsing with logged fallbacks.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Returns the trimmed value of `key`, or `None` when unset or blank.
pub fn env_string(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_env_u16(key: &str, default: u16) -> u16 {
    parse_env(key, default)
}

pub fn parse_env_u64(key: &str, default: u64) -> u64 {
    parse_env(key, default)
}

fn parse_env<T: FromStr + Copy>(key: &str, default: T) -> T {
    let Some(value) = env_string(key) else {
        return default;
    };
    match value.parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}
