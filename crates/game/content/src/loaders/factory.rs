//! Content factory for building oracles from data files.

use std::path::{Path, PathBuf};

use arena_core::CombatConfig;

use crate::loaders::{ArchetypeLoader, ConfigLoader, LoadResult};
use crate::registry::TemplateRegistry;

/// Content factory that loads all arena content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── archetypes.ron
/// ```
///
/// Either file may be absent; defaults are used in its place.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub const CONFIG_FILE: &'static str = "config.toml";
    pub const ARCHETYPES_FILE: &'static str = "archetypes.ron";

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load combat configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join(Self::CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load archetype templates from `archetypes.ron`.
    pub fn load_templates(&self) -> LoadResult<TemplateRegistry> {
        let path = self.data_dir.join(Self::ARCHETYPES_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no archetype file, using built-ins");
            return Ok(TemplateRegistry::new());
        }
        ArchetypeLoader::load(&path)
    }

    /// Load everything the engine needs.
    pub fn load_all(&self) -> LoadResult<(CombatConfig, TemplateRegistry)> {
        Ok((self.load_config()?, self.load_templates()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (config, templates) = ContentFactory::new(dir.path()).load_all().expect("loads");
        assert_eq!(config, CombatConfig::default());
        assert!(templates.is_empty());
    }

    #[test]
    fn bundled_data_directory_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let (config, templates) = ContentFactory::new(dir).load_all().expect("bundled content");
        assert_eq!(config.status.stun_duration_ms, 200);
        assert!(!templates.is_empty());
    }
}
