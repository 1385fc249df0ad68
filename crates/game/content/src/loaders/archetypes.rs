//! Archetype template loader.

use std::path::Path;

use arena_core::{AgentTemplate, Archetype, OracleError};

use crate::loaders::{LoadResult, read_file};
use crate::registry::TemplateRegistry;

/// Loader for archetype stat templates from RON files.
pub struct ArchetypeLoader;

impl ArchetypeLoader {
    /// Load archetype templates from a RON file.
    ///
    /// RON format: `Vec<(String, AgentTemplate)>`, keyed by the archetype's
    /// snake_case name. Archetypes left out keep their built-in template.
    pub fn load(path: &Path) -> LoadResult<TemplateRegistry> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<TemplateRegistry> {
        let raw: Vec<(String, AgentTemplate)> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse archetype RON: {}", e))?;

        let mut registry = TemplateRegistry::new();
        for (name, template) in raw {
            let archetype: Archetype = name
                .parse()
                .map_err(|_| OracleError::UnknownArchetype(name.clone()))?;
            if registry.insert(archetype, template)?.is_some() {
                tracing::warn!(archetype = %name, "archetype listed twice, keeping the last entry");
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use arena_core::TemplateOracle;

    use super::*;

    const SAMPLE: &str = r#"[
    ("brawler", (
        max_health: 3000,
        move_speed: 160.0,
        damage: 16,
        projectile_speed: 520.0,
        engage_range: 300.0,
        melee_range: 70.0,
    )),
]"#;

    #[test]
    fn listed_archetypes_override_builtins() {
        let registry = ArchetypeLoader::parse(SAMPLE).expect("parses");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.template(Archetype::Brawler).max_health, 3_000);
        assert_eq!(
            registry.template(Archetype::Turret),
            AgentTemplate::builtin(Archetype::Turret)
        );
    }

    #[test]
    fn unknown_archetype_names_fail() {
        let content = SAMPLE.replace("brawler", "dragon");
        let error = ArchetypeLoader::parse(&content).expect_err("unknown name");
        assert!(error.to_string().contains("dragon"));
    }

    #[test]
    fn invalid_templates_fail() {
        let content = SAMPLE.replace("move_speed: 160.0", "move_speed: -1.0");
        let error = ArchetypeLoader::parse(&content).expect_err("negative speed");
        assert!(error.to_string().contains("move_speed"));
    }
}
