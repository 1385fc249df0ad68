//! Frame loop and external entry points of the combat engine.
//!
//! The [`CombatEngine`] is the only writer of a [`World`]. Each
//! [`tick`](CombatEngine::tick) runs one frame in a fixed order:
//!
//! 1. status tick for every agent (damage-over-time, lethal ticks resolve
//!    immediately)
//! 2. deferred interrupt delivery, FIFO
//! 3. per agent, in spawn order: stale-owner check, sensor, primary machine,
//!    ability machines, velocity resolution; its spawn/heal requests are
//!    applied before the next agent runs
//!
//! so a same-frame stun or kill always suppresses the attack it interrupts.
//! Agents spawned during a frame first tick on the next one.

mod error;
mod lifecycle;
mod steering;

pub use error::EngineError;
pub use lifecycle::{DamageOutcome, SpawnRequest};

use crate::ability::{AbilityScheduler, AbilityTick};
use crate::behavior::{PhaseCtx, PhaseLibrary, delay, step};
use crate::config::BuildupSource;
use crate::env::CombatEnv;
use crate::interrupt::{Interrupt, InterruptBus, InterruptOutcome};
use crate::state::{
    AgentId, CombatEvent, Life, StateOwner, StatusKind, Timestamp, Vec2, World,
};
use crate::status::{self, BuildupOutcome};

/// Per-frame counters returned by [`CombatEngine::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickSummary {
    pub frame: u64,
    /// Agents whose machines advanced this frame.
    pub agents_ticked: usize,
    /// Deferred interrupts delivered in step 2.
    pub interrupts_delivered: usize,
    /// Agents that died from status damage in step 1.
    pub status_kills: usize,
}

/// Authoritative driver of every agent's behaviour.
#[derive(Clone, Debug)]
pub struct CombatEngine {
    library: PhaseLibrary,
}

impl CombatEngine {
    /// Engine over the built-in phase tables.
    ///
    /// # Errors
    ///
    /// Authoring defects in the built-in tables.
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self::with_library(PhaseLibrary::standard()?))
    }

    pub fn with_library(library: PhaseLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &PhaseLibrary {
        &self.library
    }

    pub fn interrupts(&self) -> InterruptBus<'_> {
        InterruptBus::new(&self.library)
    }

    /// Runs one frame at `now`.
    pub fn tick(&self, world: &mut World, env: &CombatEnv<'_>, now: Timestamp) -> TickSummary {
        let dt = world.last_tick.map_or(0, |last| now.since(last));
        world.last_tick = Some(now);
        world.frame += 1;
        let mut summary = TickSummary {
            frame: world.frame,
            ..TickSummary::default()
        };

        let ids = world.agents.ids();

        for &id in &ids {
            let Some(agent) = world.agents.get_mut(id) else {
                continue;
            };
            if !agent.is_alive() {
                continue;
            }
            let damage = status::tick(&mut agent.status, env.config, now);
            if damage.total() > 0
                && self.apply_damage(world, id, damage.total(), now) == DamageOutcome::Killed
            {
                summary.status_kills += 1;
            }
        }

        let bus = self.interrupts();
        while let Some((id, interrupt)) = world.deferred.pop_front() {
            bus.raise(world, env, id, interrupt, now);
            summary.interrupts_delivered += 1;
        }

        for &id in &ids {
            if self.tick_agent(world, env, id, dt, now) {
                summary.agents_ticked += 1;
            }
            self.apply_commands(world, env, now);
        }

        tracing::trace!(frame = summary.frame, at = %now, agents = world.agents.len(), "frame ticked");
        summary
    }

    /// Advances one agent's machines. Returns whether the agent ran.
    fn tick_agent(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        id: AgentId,
        dt: u64,
        now: Timestamp,
    ) -> bool {
        let Some(agent) = world.agents.get(id) else {
            return false;
        };
        if let Some(owner) = agent.owner
            && agent.archetype.is_support()
            && !world.agents.contains(owner)
        {
            tracing::debug!(agent = %id, owner = %owner, "owner gone, expiring support agent");
            self.despawn(world, id, now);
            return false;
        }

        let World {
            agents,
            outbox,
            commands,
            ..
        } = &mut *world;
        let Some(mut agent) = agents.check_out(id) else {
            return false;
        };
        agent.children.retain(|child| agents.contains(child.id));
        let profile = self.library.profile(agent.archetype);

        if let Some(sensor) = profile.sensor {
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
            sensor(&mut ctx);
        }

        let stunned = agent.status.is_stunned(now);
        let mut primary_steer = None;
        let mut raised = None;

        if stunned || profile.primary_suppressed(&agent) {
            delay(&mut agent.primary, dt);
        } else {
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
            step(&mut ctx, &profile.primary);
            let output = ctx.finish();
            agent.primary = output.state;
            primary_steer = output.steer;
            raised = output.raised;
        }

        let mut ability_tick = AbilityTick::default();
        if agent.is_alive() {
            if stunned {
                for slot in agent.abilities.iter_mut().filter(|slot| !slot.is_idle()) {
                    delay(&mut slot.machine, dt);
                }
            } else {
                ability_tick =
                    AbilityScheduler::tick(&mut agent, profile, env, agents, outbox, commands, now);
            }
        }

        if agent.is_alive() {
            // Primary interrupt first, then ability ones in slot order.
            let bus = InterruptBus::new(&self.library);
            for interrupt in raised.into_iter().chain(ability_tick.raised) {
                bus.deliver(&mut agent, env, agents, outbox, commands, interrupt, now);
            }
            steering::resolve(
                &mut agent,
                profile,
                env,
                agents,
                outbox,
                commands,
                primary_steer,
                &ability_tick.steers,
                now,
            );
        } else {
            agent.steering.resolved = Vec2::ZERO;
        }

        let life = agent.life;
        if let Err(agent) = agents.check_in(id, agent) {
            tracing::warn!(agent = %agent.id, "agent slot vanished during its tick");
            return true;
        }
        if life == Life::Expired {
            self.despawn(world, id, now);
        }
        true
    }

    // ========================================================================
    // External entry points
    // ========================================================================

    /// Raises `interrupt` on agent `id` synchronously.
    pub fn raise(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        id: AgentId,
        interrupt: Interrupt,
        now: Timestamp,
    ) -> InterruptOutcome {
        self.interrupts().raise(world, env, id, interrupt, now)
    }

    /// Adds status buildup scaled by its source.
    ///
    /// A stun trigger zeroes the agent's velocity and raises the stun
    /// interrupt before returning.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_buildup(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        id: AgentId,
        kind: StatusKind,
        amount: f32,
        source: BuildupSource,
        now: Timestamp,
    ) -> Option<BuildupOutcome> {
        let scaled = amount * env.config.buildup_sources.scale(source);
        let agent = world.agents.get_mut(id).filter(|agent| agent.is_alive())?;
        let outcome = status::apply_buildup(&mut agent.status, kind, scaled, env.config, now);

        if let BuildupOutcome::Triggered { active_until } = outcome {
            if kind == StatusKind::Stun {
                agent.steering.resolved = Vec2::ZERO;
                agent.steering.desired = Vec2::ZERO;
            }
            world
                .outbox
                .push_event(CombatEvent::StatusTriggered { agent: id, kind });
            tracing::debug!(agent = %id, kind = kind.as_str(), until = %active_until, "status triggered");
            if kind == StatusKind::Stun {
                self.raise(world, env, id, Interrupt::Stun, now);
            }
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{BuiltinTemplates, FixedArena, PcgRng};
    use crate::state::Archetype;

    struct Fixture {
        arena: FixedArena,
        templates: BuiltinTemplates,
        rng: PcgRng,
        config: CombatConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                arena: FixedArena::with_player(Vec2::new(500.0, 0.0)),
                templates: BuiltinTemplates,
                rng: PcgRng,
                config: CombatConfig::default(),
            }
        }

        fn env(&self) -> CombatEnv<'_> {
            CombatEnv::new(
                &self.arena,
                &self.arena,
                &self.templates,
                &self.rng,
                &self.config,
            )
        }
    }

    #[test]
    fn first_tick_has_no_elapsed_time() {
        let fixture = Fixture::new();
        let env = fixture.env();
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Ranged, Vec2::ZERO),
                Timestamp::ZERO,
            )
            .expect("spawn");

        let summary = engine.tick(&mut world, &env, Timestamp::from_millis(40));
        assert_eq!(summary.frame, 1);
        assert_eq!(summary.agents_ticked, 1);
        assert_eq!(world.last_tick(), Some(Timestamp::from_millis(40)));
    }

    #[test]
    fn ignite_kills_a_weak_agent_in_the_status_step() {
        let fixture = Fixture::new();
        let env = fixture.env();
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        let id = engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Drone, Vec2::ZERO),
                Timestamp::ZERO,
            )
            .expect("spawn");

        let outcome = engine.apply_buildup(
            &mut world,
            &env,
            id,
            StatusKind::Ignite,
            10.0,
            BuildupSource::Weapon,
            Timestamp::ZERO,
        );
        assert!(outcome.is_some_and(|outcome| outcome.triggered()));

        let mut kills = 0;
        for frame in 1..=20 {
            kills += engine
                .tick(&mut world, &env, Timestamp::from_millis(frame * 100))
                .status_kills;
        }
        assert_eq!(kills, 1);
        assert!(!world.contains(id));
    }

    #[test]
    fn buildup_is_scaled_by_source() {
        let mut fixture = Fixture::new();
        fixture.config.buildup_sources.explosion = 2.0;
        let env = fixture.env();
        let engine = CombatEngine::new().expect("engine");
        let mut world = World::new();
        let id = engine
            .spawn(
                &mut world,
                &env,
                SpawnRequest::new(Archetype::Melee, Vec2::ZERO),
                Timestamp::ZERO,
            )
            .expect("spawn");

        let outcome = engine.apply_buildup(
            &mut world,
            &env,
            id,
            StatusKind::Toxin,
            3.0,
            BuildupSource::Explosion,
            Timestamp::ZERO,
        );
        assert_eq!(outcome, Some(BuildupOutcome::Accumulated { buildup: 6.0 }));
    }
}
