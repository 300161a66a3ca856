//! Environment variable loading utilities
//!
//! Config values can be overridden from the environment with a common prefix,
//! e.g. `COSTLENS_ANOMALY_WINDOW_DAYS=14`. Unset or unparseable variables keep
//! the current value.

use std::env;
use std::str::FromStr;

/// Load an environment variable with type conversion and default
pub fn load_env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable value for {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// Load an environment variable as an `Option<T>`
pub fn load_env_optional<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Load a comma separated list, keeping `default` when unset or empty
pub fn load_env_list(key: &str, default: &[String]) -> Vec<String> {
    let items: Vec<String> = env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if items.is_empty() {
        default.to_vec()
    } else {
        items
    }
}

/// Builder for loading multiple environment variables with consistent prefix
#[derive(Debug)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a new environment loader with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    /// Load a parsed value with default
    pub fn load_parsed<T>(&self, suffix: &str, default: T) -> T
    where
        T: FromStr,
    {
        load_env_parsed(&self.key(suffix), default)
    }

    /// Load an optional value
    pub fn load_optional<T>(&self, suffix: &str) -> Option<T>
    where
        T: FromStr,
    {
        load_env_optional(&self.key(suffix))
    }

    /// Load a comma separated list
    pub fn load_list(&self, suffix: &str, default: &[String]) -> Vec<String> {
        load_env_list(&self.key(suffix), default)
    }
}
