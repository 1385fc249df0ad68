//! Template oracle backed by loaded content.

use std::collections::BTreeMap;

use arena_core::{AgentTemplate, Archetype, OracleError, TemplateOracle};

/// Archetype templates with built-in fallbacks.
///
/// Archetypes without an entry use [`AgentTemplate::builtin`], so a content
/// file only needs to list what it retunes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateRegistry {
    overrides: BTreeMap<Archetype, AgentTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `template` for `archetype`, replacing any earlier entry.
    ///
    /// # Errors
    ///
    /// The template fails [`AgentTemplate::validate`].
    pub fn insert(
        &mut self,
        archetype: Archetype,
        template: AgentTemplate,
    ) -> Result<Option<AgentTemplate>, OracleError> {
        template.validate(archetype)?;
        Ok(self.overrides.insert(archetype, template))
    }

    /// Whether `archetype` has a content-supplied template.
    pub fn is_overridden(&self, archetype: Archetype) -> bool {
        self.overrides.contains_key(&archetype)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl TemplateOracle for TemplateRegistry {
    fn template(&self, archetype: Archetype) -> AgentTemplate {
        self.overrides
            .get(&archetype)
            .copied()
            .unwrap_or_else(|| AgentTemplate::builtin(archetype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_archetypes_fall_back_to_builtins() {
        let mut registry = TemplateRegistry::new();
        let mut sniper = AgentTemplate::builtin(Archetype::Sniper);
        sniper.engage_range = 900.0;
        registry.insert(Archetype::Sniper, sniper).expect("valid");

        assert_eq!(registry.template(Archetype::Sniper).engage_range, 900.0);
        assert_eq!(
            registry.template(Archetype::Melee),
            AgentTemplate::builtin(Archetype::Melee)
        );
        assert!(registry.is_overridden(Archetype::Sniper));
        assert!(!registry.is_overridden(Archetype::Melee));
    }

    #[test]
    fn invalid_templates_are_rejected() {
        let mut registry = TemplateRegistry::new();
        let mut broken = AgentTemplate::builtin(Archetype::Drone);
        broken.max_health = 0;
        assert!(matches!(
            registry.insert(Archetype::Drone, broken),
            Err(OracleError::InvalidTemplate {
                field: "max_health",
                ..
            })
        ));
        assert!(registry.is_empty());
    }
}
