//! Spawning, damage, death and despawn.
//!
//! Owners track children as weak [`ChildRef`]s. Killing or despawning an
//! agent removes its whole child tree in the same call; support agents whose
//! owner vanished some other way expire on their next tick.

use crate::behavior::{PhaseCtx, enter};
use crate::env::CombatEnv;
use crate::state::{
    AbilityRuntime, Agent, AgentId, Archetype, ChildRef, Command, CombatEvent, Effect, Life,
    StateOwner, TargetId, Timestamp, Vec2, World,
};

use super::{CombatEngine, EngineError};

/// Request to create one agent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnRequest {
    pub archetype: Archetype,
    pub position: Vec2,
    /// Multiplier on template health and damage.
    pub stat_scale: f32,
    pub owner: Option<AgentId>,
    /// Explicit target; the player oracle's default target otherwise.
    pub target: Option<TargetId>,
}

impl SpawnRequest {
    pub fn new(archetype: Archetype, position: Vec2) -> Self {
        Self {
            archetype,
            position,
            stat_scale: 1.0,
            owner: None,
            target: None,
        }
    }

    pub fn scaled(mut self, stat_scale: f32) -> Self {
        self.stat_scale = stat_scale;
        self
    }

    pub fn owned_by(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn targeting(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }
}

/// What a damage call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The agent does not exist or is already dying.
    Stale,
    Damaged { dealt: u32, remaining: u32 },
    /// Training dummy: damage was recorded instead of applied.
    Recorded { total: u64 },
    /// Health reached zero; on-death cleanup has already run.
    Killed,
}

impl CombatEngine {
    /// Creates an agent and enters its primary table.
    ///
    /// # Errors
    ///
    /// The owner no longer resolves, or it already tracks the maximum number
    /// of children.
    pub fn spawn(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        request: SpawnRequest,
        now: Timestamp,
    ) -> Result<AgentId, EngineError> {
        let SpawnRequest {
            archetype,
            position,
            stat_scale,
            owner,
            target,
        } = request;

        if let Some(owner) = owner {
            let parent = world
                .agents
                .get(owner)
                .filter(|parent| parent.is_alive())
                .ok_or(EngineError::UnknownAgent(owner))?;
            if parent.children.is_full() {
                return Err(EngineError::ChildCapacity { owner, archetype });
            }
        }

        let template = env.templates.template(archetype);
        let profile = self.library.profile(archetype);
        let target = target.or_else(|| env.players.default_target());

        let id = world.insert(|id| {
            let mut agent = Agent::new(id, archetype, &template, position, stat_scale, now);
            agent.owner = owner;
            if let Some(target) = target {
                let last_known = env.players.position(target).unwrap_or(position);
                agent = agent.with_target(target, last_known);
            }
            agent.abilities = profile
                .abilities
                .iter()
                .map(|def| AbilityRuntime::new(def.spec.id, now.after(def.spec.warmup_ms)))
                .collect();
            agent.blackboard.orbit = id.index as f32 * 2.4;
            agent
        });

        let World {
            agents,
            outbox,
            commands,
            ..
        } = &mut *world;
        if let Some(mut agent) = agents.check_out(id) {
            let state = agent.primary;
            let mut ctx = PhaseCtx::new(
                &mut agent,
                StateOwner::Primary,
                state,
                env,
                agents,
                outbox,
                commands,
                now,
            );
            enter(&mut ctx, profile.primary.entry(), now);
            agent.primary = ctx.finish().state;
            if agents.check_in(id, agent).is_err() {
                tracing::warn!(agent = %id, "spawned agent vanished while entering its table");
            }
        }

        if let Some(owner) = owner
            && let Some(parent) = world.agents.get_mut(owner)
        {
            // Capacity was checked above and nothing ran in between.
            let _ = parent.children.try_push(ChildRef { id, archetype });
        }

        world.outbox.push_event(CombatEvent::Spawned {
            agent: id,
            archetype,
            owner,
        });
        tracing::debug!(agent = %id, archetype = archetype.as_str(), ?owner, at = %now, "agent spawned");
        Ok(id)
    }

    /// Applies `amount` of damage. Lethal damage runs on-death cleanup before
    /// returning.
    pub fn apply_damage(
        &self,
        world: &mut World,
        id: AgentId,
        amount: u32,
        now: Timestamp,
    ) -> DamageOutcome {
        let Some(agent) = world.agents.get_mut(id).filter(|agent| agent.is_alive()) else {
            return DamageOutcome::Stale;
        };
        if agent.archetype.is_training() {
            agent.recorded_damage += u64::from(amount);
            return DamageOutcome::Recorded {
                total: agent.recorded_damage,
            };
        }

        let dealt = agent.health.drain(amount);
        if !agent.health.is_depleted() {
            return DamageOutcome::Damaged {
                dealt,
                remaining: agent.health.current,
            };
        }
        agent.life = Life::Dead;
        self.kill(world, id, now);
        DamageOutcome::Killed
    }

    /// Removes an agent without it dying. Its children go with it.
    pub fn despawn(&self, world: &mut World, id: AgentId, now: Timestamp) -> bool {
        if !world.agents.contains(id) {
            return false;
        }
        self.remove_tree(world, id, now, false);
        true
    }

    fn kill(&self, world: &mut World, id: AgentId, now: Timestamp) {
        self.remove_tree(world, id, now, true);
    }

    /// Removes `root` and every agent it transitively owns.
    fn remove_tree(&self, world: &mut World, root: AgentId, now: Timestamp, died: bool) {
        let mut pending = vec![(root, died)];
        while let Some((id, died)) = pending.pop() {
            let Some(agent) = world.agents.remove(id) else {
                continue;
            };
            pending.extend(agent.children.iter().map(|child| (child.id, false)));

            if agent.telegraph_owner().is_some() {
                world
                    .outbox
                    .push_effect(Effect::ClearTelegraph { agent: id });
            }
            if let Some(owner) = agent.owner
                && let Some(parent) = world.agents.get_mut(owner)
            {
                parent.children.retain(|child| child.id != id);
            }

            let archetype = agent.archetype;
            if died {
                world.outbox.push_event(CombatEvent::AgentDied {
                    agent: id,
                    archetype,
                    position: agent.position,
                });
                tracing::debug!(agent = %id, archetype = archetype.as_str(), at = %now, "agent died");
            } else {
                world
                    .outbox
                    .push_event(CombatEvent::Despawned { agent: id, archetype });
                tracing::debug!(agent = %id, archetype = archetype.as_str(), at = %now, "agent despawned");
            }
        }
    }

    /// Applies spawn/heal requests queued by the agent that just ticked.
    pub(super) fn apply_commands(&self, world: &mut World, env: &CombatEnv<'_>, now: Timestamp) {
        let queued = std::mem::take(&mut world.commands);
        for command in queued {
            match command {
                Command::Spawn {
                    archetype,
                    position,
                    stat_scale,
                    owner,
                } => {
                    let target = owner
                        .and_then(|owner| world.agents.get(owner))
                        .and_then(|parent| parent.target)
                        .map(|target| target.id);
                    let request = SpawnRequest {
                        archetype,
                        position,
                        stat_scale: stat_scale * env.config.summon_stat_scale,
                        owner,
                        target,
                    };
                    if let Err(error) = self.spawn(world, env, request, now) {
                        tracing::debug!(%error, archetype = archetype.as_str(), "summon dropped");
                    }
                }
                Command::Heal { target, amount } => {
                    if let Some(agent) = world.agents.get_mut(target).filter(|a| a.is_alive()) {
                        let healed = agent.health.restore(amount);
                        tracing::trace!(agent = %target, healed, "healed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{BuiltinTemplates, FixedArena, PcgRng};

    fn setup() -> (FixedArena, CombatConfig) {
        (
            FixedArena::with_player(Vec2::new(300.0, 0.0)),
            CombatConfig::default(),
        )
    }

    #[test]
    fn killing_an_owner_removes_its_children() {
        let (arena, config) = setup();
        let env = CombatEnv::new(&arena, &arena, &BuiltinTemplates, &PcgRng, &config);
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        let boss = engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Brawler, Vec2::ZERO),
                Timestamp::ZERO,
            )
            .expect("boss");
        let mine = engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Mine, Vec2::ZERO).owned_by(boss),
                Timestamp::ZERO,
            )
            .expect("mine");
        assert_eq!(
            world.agent(boss).map(|agent| agent.live_children(Archetype::Mine)),
            Some(1)
        );
        world.drain_outbox();

        let outcome = engine.apply_damage(&mut world, boss, u32::MAX, Timestamp::from_millis(5));
        assert_eq!(outcome, DamageOutcome::Killed);
        assert!(!world.contains(boss));
        assert!(!world.contains(mine));

        let events = world.drain_outbox().events;
        assert!(events.iter().any(|event| matches!(
            event,
            CombatEvent::AgentDied { agent, .. } if *agent == boss
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            CombatEvent::Despawned { agent, .. } if *agent == mine
        )));
    }

    #[test]
    fn dummy_records_damage() {
        let (arena, config) = setup();
        let env = CombatEnv::new(&arena, &arena, &BuiltinTemplates, &PcgRng, &config);
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        let dummy = engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Dummy, Vec2::ZERO),
                Timestamp::ZERO,
            )
            .expect("dummy");

        engine.apply_damage(&mut world, dummy, 40, Timestamp::ZERO);
        let outcome = engine.apply_damage(&mut world, dummy, 2_000, Timestamp::ZERO);
        assert_eq!(outcome, DamageOutcome::Recorded { total: 2_040 });
        let agent = world.agent(dummy).expect("dummy survives");
        assert_eq!(agent.health.current, agent.health.max);
    }

    #[test]
    fn spawn_under_a_missing_owner_fails() {
        let (arena, config) = setup();
        let env = CombatEnv::new(&arena, &arena, &BuiltinTemplates, &PcgRng, &config);
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        let ghost = AgentId::new(7, 3);
        let result = engine.spawn(
            &mut world,
            &env,
            SpawnRequest::new(Archetype::Drone, Vec2::ZERO).owned_by(ghost),
            Timestamp::ZERO,
        );
        assert_eq!(result, Err(EngineError::UnknownAgent(ghost)));
        assert!(world.is_empty());
    }

    #[test]
    fn stale_ids_are_ignored() {
        let (arena, config) = setup();
        let env = CombatEnv::new(&arena, &arena, &BuiltinTemplates, &PcgRng, &config);
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        let id = engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Melee, Vec2::ZERO),
                Timestamp::ZERO,
            )
            .expect("melee");
        assert!(engine.despawn(&mut world, id, Timestamp::ZERO));
        assert!(!engine.despawn(&mut world, id, Timestamp::ZERO));
        assert_eq!(
            engine.apply_damage(&mut world, id, 10, Timestamp::ZERO),
            DamageOutcome::Stale
        );
    }
}
