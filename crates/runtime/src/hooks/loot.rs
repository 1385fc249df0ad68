//! Loot requests for fallen agents.

use arena_core::{Archetype, CombatEvent, Vec2};

use super::{FrameHook, HookContext, HookCriticality, HookOutput};

/// Loot drop requested from the loot collaborator.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LootDrop {
    pub archetype: Archetype,
    pub position: Vec2,
}

/// Requests loot where an agent died.
///
/// Support entities (mines, drones, healers) and training dummies drop
/// nothing; despawned agents never drop loot.
#[derive(Debug, Clone, Copy, Default)]
pub struct LootHook;

impl FrameHook for LootHook {
    fn name(&self) -> &'static str {
        "loot"
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Optional
    }

    fn should_trigger(&self, ctx: &HookContext<'_>) -> bool {
        match ctx.event {
            CombatEvent::AgentDied { archetype, .. } => drops_loot(*archetype),
            _ => false,
        }
    }

    fn run(&self, ctx: &HookContext<'_>) -> Result<Vec<HookOutput>, String> {
        match *ctx.event {
            CombatEvent::AgentDied {
                archetype,
                position,
                ..
            } => Ok(vec![HookOutput::Loot(LootDrop {
                archetype,
                position,
            })]),
            _ => Ok(Vec::new()),
        }
    }
}

fn drops_loot(archetype: Archetype) -> bool {
    !archetype.is_support() && !archetype.is_training()
}

#[cfg(test)]
mod tests {
    use arena_core::{AgentId, Timestamp, World};

    use super::*;

    fn died(archetype: Archetype) -> CombatEvent {
        CombatEvent::AgentDied {
            agent: AgentId::new(3, 1),
            archetype,
            position: Vec2::new(12.0, -4.0),
        }
    }

    #[test]
    fn regular_and_boss_deaths_drop_loot() {
        let world = World::new();
        for archetype in [Archetype::Melee, Archetype::Turret, Archetype::Brawler] {
            let event = died(archetype);
            let ctx = HookContext::new(&event, &world, 7, Timestamp::from_millis(350));
            assert!(LootHook.should_trigger(&ctx));
            assert_eq!(
                LootHook.run(&ctx),
                Ok(vec![HookOutput::Loot(LootDrop {
                    archetype,
                    position: Vec2::new(12.0, -4.0),
                })])
            );
        }
    }

    #[test]
    fn support_and_training_deaths_drop_nothing() {
        let world = World::new();
        for archetype in [
            Archetype::Mine,
            Archetype::Drone,
            Archetype::Healer,
            Archetype::Dummy,
        ] {
            let event = died(archetype);
            let ctx = HookContext::new(&event, &world, 7, Timestamp::ZERO);
            assert!(!LootHook.should_trigger(&ctx), "{archetype:?}");
        }

        let event = CombatEvent::Despawned {
            agent: AgentId::new(0, 0),
            archetype: Archetype::Melee,
        };
        let ctx = HookContext::new(&event, &world, 7, Timestamp::ZERO);
        assert!(!LootHook.should_trigger(&ctx));
    }
}
