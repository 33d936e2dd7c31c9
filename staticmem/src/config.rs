//! Store configuration
//!
//! Configuration is plain data: build it in code, deserialize it from JSON,
//! or read it from `STATICMEM_*` environment variables.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default protocol name of the stream adapter
pub const DEFAULT_SCHEME: &str = "staticmem";

/// Lower bound of the random handle range
pub const DEFAULT_RANDOM_MIN: u64 = 1_000_000;

/// Upper bound of the random handle range
pub const DEFAULT_RANDOM_MAX: u64 = 9_999_999;

/// How new handles are generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum HandlePolicy {
    /// Monotonic counter starting at 1; handles are never reused
    #[default]
    Sequential,
    /// Random values in `min..=max`; freed handles may come back
    Random {
        #[serde(default = "default_random_min")]
        min: u64,
        #[serde(default = "default_random_max")]
        max: u64,
    },
}

fn default_random_min() -> u64 {
    DEFAULT_RANDOM_MIN
}

fn default_random_max() -> u64 {
    DEFAULT_RANDOM_MAX
}

impl HandlePolicy {
    /// Random policy over the default range
    #[must_use]
    pub fn random() -> Self {
        Self::Random {
            min: DEFAULT_RANDOM_MIN,
            max: DEFAULT_RANDOM_MAX,
        }
    }

    /// # Errors
    /// `Error::Config` if a random range is empty.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Sequential => Ok(()),
            Self::Random { min, max } if min > max => Err(Error::Config(format!(
                "random handle range is empty: min {min} > max {max}"
            ))),
            Self::Random { .. } => Ok(()),
        }
    }
}

/// Configuration of a `MemStore`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub handle_policy: HandlePolicy,
}

impl StoreConfig {
    /// Parse a JSON document such as
    /// `{"handle_policy": {"policy": "random", "min": 10, "max": 99}}`.
    ///
    /// # Errors
    /// `Error::Config` on malformed JSON or an invalid policy.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| Error::Config(format!("failed to parse store config JSON: {e}")))?;
        config.handle_policy.validate()?;
        Ok(config)
    }

    /// Read the configuration from the process environment.
    ///
    /// - `STATICMEM_HANDLE_POLICY`: `sequential` (default) or `random`
    /// - `STATICMEM_HANDLE_MIN`, `STATICMEM_HANDLE_MAX`: random range bounds
    ///
    /// # Errors
    /// `Error::Config` on unknown policy names or unparsable bounds.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    /// See `from_env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let policy = lookup("STATICMEM_HANDLE_POLICY");
        let handle_policy = match policy.as_deref().map(str::trim) {
            None | Some("" | "sequential") => HandlePolicy::Sequential,
            Some("random") => HandlePolicy::Random {
                min: parse_bound(&lookup, "STATICMEM_HANDLE_MIN", DEFAULT_RANDOM_MIN)?,
                max: parse_bound(&lookup, "STATICMEM_HANDLE_MAX", DEFAULT_RANDOM_MAX)?,
            },
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown handle policy '{other}', expected 'sequential' or 'random'"
                )))
            }
        };
        handle_policy.validate()?;
        Ok(Self { handle_policy })
    }
}

fn parse_bound(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key}='{value}': {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_sequential() {
        assert_eq!(StoreConfig::default().handle_policy, HandlePolicy::Sequential);
        let config = StoreConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config.handle_policy, HandlePolicy::Sequential);
    }

    #[test]
    fn test_env_random_with_bounds() {
        let config = StoreConfig::from_lookup(lookup_in(&[
            ("STATICMEM_HANDLE_POLICY", "random"),
            ("STATICMEM_HANDLE_MIN", "100"),
            ("STATICMEM_HANDLE_MAX", "199"),
        ]))
        .unwrap();
        assert_eq!(
            config.handle_policy,
            HandlePolicy::Random { min: 100, max: 199 }
        );
    }

    #[test]
    fn test_env_random_defaults_to_original_range() {
        let config =
            StoreConfig::from_lookup(lookup_in(&[("STATICMEM_HANDLE_POLICY", "random")])).unwrap();
        assert_eq!(config.handle_policy, HandlePolicy::random());
    }

    #[test]
    fn test_env_rejects_unknown_policy() {
        let result = StoreConfig::from_lookup(lookup_in(&[("STATICMEM_HANDLE_POLICY", "lottery")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_rejects_bad_bound() {
        let result = StoreConfig::from_lookup(lookup_in(&[
            ("STATICMEM_HANDLE_POLICY", "random"),
            ("STATICMEM_HANDLE_MIN", "ten"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_json_config() {
        let config = StoreConfig::from_json(
            br#"{"handle_policy": {"policy": "random", "min": 10, "max": 99}}"#,
        )
        .unwrap();
        assert_eq!(config.handle_policy, HandlePolicy::Random { min: 10, max: 99 });

        let config = StoreConfig::from_json(b"{}").unwrap();
        assert_eq!(config.handle_policy, HandlePolicy::Sequential);
    }

    #[test]
    fn test_json_rejects_empty_range() {
        let result = StoreConfig::from_json(
            br#"{"handle_policy": {"policy": "random", "min": 5, "max": 4}}"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
