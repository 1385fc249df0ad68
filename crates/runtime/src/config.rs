//! Runtime configuration structures and loaders.

use std::env;
use std::path::PathBuf;

use arena_core::CombatConfig;

/// Configuration shared by the orchestrator, the event bus and the loaders.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    /// Tuning used when no `config_path` is set.
    pub combat: CombatConfig,
    /// TOML file overriding `combat`.
    pub config_path: Option<PathBuf>,
    /// RON file with archetype template overrides.
    pub templates_path: Option<PathBuf>,
    /// Arena seed mixed into every random draw.
    pub seed: u64,
    /// Capacity of each topic channel of the event bus.
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            config_path: None,
            templates_path: None,
            seed: 0,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
        }
    }
}

impl RuntimeConfig {
    pub const DEFAULT_EVENT_BUFFER: usize = 256;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARENA_CONFIG` - Combat tuning TOML file (default: built-in tuning)
    /// - `ARENA_TEMPLATES` - Archetype template RON file (default: built-ins)
    /// - `ARENA_SEED` - Arena seed (default: 0)
    /// - `ARENA_EVENT_BUFFER` - Event channel capacity per topic (default: 256)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        config.config_path = lookup("ARENA_CONFIG").map(PathBuf::from);
        config.templates_path = lookup("ARENA_TEMPLATES").map(PathBuf::from);

        if let Some(seed) = parse(&lookup, "ARENA_SEED") {
            config.seed = seed;
        }
        let capacity: Option<usize> = parse(&lookup, "ARENA_EVENT_BUFFER");
        if let Some(capacity) = capacity {
            config.event_buffer_size = capacity.max(1);
        }

        config
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        assert_eq!(RuntimeConfig::from_lookup(lookup(&[])), RuntimeConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("ARENA_CONFIG", "data/config.toml"),
            ("ARENA_SEED", "42"),
            ("ARENA_EVENT_BUFFER", "0"),
        ]));
        assert_eq!(config.config_path, Some(PathBuf::from("data/config.toml")));
        assert_eq!(config.templates_path, None);
        assert_eq!(config.seed, 42);
        assert_eq!(config.event_buffer_size, 1);
    }

    #[test]
    fn garbage_values_are_ignored() {
        let config = RuntimeConfig::from_lookup(lookup(&[("ARENA_SEED", "forty-two")]));
        assert_eq!(config.seed, 0);
    }
}
