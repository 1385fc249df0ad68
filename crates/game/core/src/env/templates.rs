//! Archetype stat templates consumed by the spawn path.

use crate::env::OracleError;
use crate::state::Archetype;

/// Base stats of one archetype before stat scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentTemplate {
    pub max_health: u32,
    /// Units per second.
    pub move_speed: f32,
    /// Damage of one attack (shot, strike, detonation, heal).
    pub damage: u32,
    /// Units per second.
    pub projectile_speed: f32,
    /// Distance at which the agent starts attacking.
    pub engage_range: f32,
    /// Reach of melee strikes and trigger radius of mines.
    pub melee_range: f32,
}

impl AgentTemplate {
    /// Built-in tuning used when no content file overrides it.
    pub const fn builtin(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Melee => Self::new(120, 140.0, 18, 0.0, 60.0, 60.0),
            Archetype::Ranged => Self::new(80, 110.0, 8, 420.0, 380.0, 0.0),
            Archetype::Sniper => Self::new(70, 90.0, 45, 1_400.0, 760.0, 0.0),
            Archetype::Turret => Self::new(150, 0.0, 6, 480.0, 420.0, 0.0),
            Archetype::Mine => Self::new(1, 0.0, 35, 0.0, 0.0, 60.0),
            Archetype::Drone => Self::new(25, 160.0, 5, 460.0, 340.0, 0.0),
            Archetype::Healer => Self::new(60, 120.0, 40, 0.0, 0.0, 0.0),
            Archetype::Dummy => Self::new(1_000, 0.0, 0, 0.0, 0.0, 0.0),
            Archetype::Brawler => Self::new(2_400, 150.0, 14, 520.0, 300.0, 70.0),
            Archetype::HeavyGunner => Self::new(3_200, 80.0, 7, 600.0, 450.0, 0.0),
            Archetype::EvasiveCaster => Self::new(2_000, 130.0, 10, 380.0, 420.0, 0.0),
        }
    }

    /// Rejects templates that would break the spawn path or the tick math.
    pub fn validate(&self, archetype: Archetype) -> Result<(), OracleError> {
        let invalid = |field, reason| OracleError::InvalidTemplate {
            archetype,
            field,
            reason,
        };
        if self.max_health == 0 {
            return Err(invalid("max_health", "must be positive"));
        }
        let distances = [
            ("move_speed", self.move_speed),
            ("projectile_speed", self.projectile_speed),
            ("engage_range", self.engage_range),
            ("melee_range", self.melee_range),
        ];
        for (field, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be finite and non-negative"));
            }
        }
        Ok(())
    }

    const fn new(
        max_health: u32,
        move_speed: f32,
        damage: u32,
        projectile_speed: f32,
        engage_range: f32,
        melee_range: f32,
    ) -> Self {
        Self {
            max_health,
            move_speed,
            damage,
            projectile_speed,
            engage_range,
            melee_range,
        }
    }
}

/// Source of archetype templates (content files, built-ins).
pub trait TemplateOracle: Send + Sync {
    fn template(&self, archetype: Archetype) -> AgentTemplate;
}

/// Template oracle backed by [`AgentTemplate::builtin`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinTemplates;

impl TemplateOracle for BuiltinTemplates {
    fn template(&self, archetype: Archetype) -> AgentTemplate {
        AgentTemplate::builtin(archetype)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn builtin_templates_are_valid() {
        for archetype in Archetype::iter() {
            assert_eq!(AgentTemplate::builtin(archetype).validate(archetype), Ok(()));
        }
    }

    #[test]
    fn negative_speed_is_rejected() {
        let mut template = AgentTemplate::builtin(Archetype::Ranged);
        template.move_speed = -1.0;
        assert!(matches!(
            template.validate(Archetype::Ranged),
            Err(OracleError::InvalidTemplate {
                field: "move_speed",
                ..
            })
        ));
    }
}
