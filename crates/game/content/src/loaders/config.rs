//! Combat configuration loader.

use std::path::Path;

use arena_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing fields keep their [`CombatConfig::default`] values.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        let wander = (config.toxin_wander_min_ms, config.toxin_wander_max_ms);
        if wander.0 > wander.1 {
            anyhow::bail!(
                "toxin wander window is inverted: {}ms > {}ms",
                wander.0,
                wander.1
            );
        }
        if config.status.tick_interval_ms == 0 {
            anyhow::bail!("status tick interval must be positive");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arena_core::BuildupSource;

    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let config = ConfigLoader::parse(
            r#"
knockback_hold_ms = 600

[status]
stun_duration_ms = 350

[buildup_sources]
explosion = 1.5
"#,
        )
        .expect("parses");

        assert_eq!(config.knockback_hold_ms, 600);
        assert_eq!(config.status.stun_duration_ms, 350);
        assert_eq!(config.status.ignite_duration_ms, 2_000);
        assert_eq!(config.buildup_sources.scale(BuildupSource::Explosion), 1.5);
        assert_eq!(config.buildup_sources.scale(BuildupSource::Weapon), 1.0);
        assert_eq!(config.toxin_wander_min_ms, 300);
    }

    #[test]
    fn inverted_wander_window_is_rejected() {
        let result = ConfigLoader::parse("toxin_wander_min_ms = 900\ntoxin_wander_max_ms = 100\n");
        assert!(result.is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "summon_stat_scale = 0.5").expect("write");
        let config = ConfigLoader::load(file.path()).expect("loads");
        assert_eq!(config.summon_stat_scale, 0.5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = ConfigLoader::load(&dir.path().join("absent.toml")).expect_err("missing");
        assert!(error.to_string().contains("Failed to read file"));
    }
}
