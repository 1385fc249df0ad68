//! Ability readiness gating and sub-machine scheduling.
//!
//! # Rules
//!
//! - Cooldowns are absolute and set when an ability *begins*; nothing else
//!   ever writes them, so interrupts cannot refund or restart them
//! - Exclusive abilities need the movement lock free and no other exclusive
//!   ability running; at most one begins per tick
//! - Beginning an exclusive ability pre-empts the primary cycle back to idle

use arrayvec::ArrayVec;

use crate::behavior::{
    ArchetypeProfile, PhaseCtx, PhaseSpec, PhaseTable, PhaseTag, StepOutcome, TableError,
    TableKind, enter, step,
};
use crate::config::CombatConfig;
use crate::env::CombatEnv;
use crate::interrupt::Interrupt;
use crate::state::{
    AbilityId, AbilityStage, Agent, Arena, Command, CombatEvent, Outbox, StateOwner, Timestamp,
    Vec2,
};

/// Tick-local condition an ability needs besides being ready.
pub type AbilityTrigger = fn(&mut PhaseCtx<'_>) -> bool;

/// Static description of one ability.
#[derive(Clone, Copy, Debug)]
pub struct AbilitySpec {
    pub id: AbilityId,
    pub cooldown_ms: u32,
    /// Delay after spawn before the first use.
    pub warmup_ms: u32,
    /// Exclusive abilities claim the movement lock and shut out each other.
    pub exclusive: bool,
    pub trigger: AbilityTrigger,
    pub phases: &'static [PhaseSpec],
}

impl AbilitySpec {
    pub const fn new(
        id: AbilityId,
        cooldown_ms: u32,
        trigger: AbilityTrigger,
        phases: &'static [PhaseSpec],
    ) -> Self {
        Self {
            id,
            cooldown_ms,
            warmup_ms: 0,
            exclusive: true,
            trigger,
            phases,
        }
    }

    pub const fn warmup(mut self, ms: u32) -> Self {
        self.warmup_ms = ms;
        self
    }

    /// Runs alongside whatever holds the lock and never claims it.
    pub const fn shared(mut self) -> Self {
        self.exclusive = false;
        self
    }
}

/// An ability with its validated table.
#[derive(Clone, Copy, Debug)]
pub struct AbilityDef {
    pub spec: AbilitySpec,
    pub table: PhaseTable,
}

impl AbilityDef {
    /// # Errors
    ///
    /// Table defects, or an exclusive ability whose entry does not claim the lock.
    pub fn build(spec: AbilitySpec) -> Result<Self, TableError> {
        let table = PhaseTable::new(spec.id.as_str(), TableKind::Ability, spec.phases)?;
        if spec.exclusive && !table.entry().movement.claims_lock() {
            return Err(TableError::UnlockedExclusive {
                table: table.name(),
            });
        }
        Ok(Self { spec, table })
    }

    pub fn stage_of(&self, tag: PhaseTag) -> AbilityStage {
        if tag == PhaseTag::Idle {
            return AbilityStage::Idle;
        }
        self.table
            .phase(tag)
            .map_or(AbilityStage::Idle, |spec| spec.stage)
    }
}

/// Leftovers of an ability tick the engine still has to apply.
#[derive(Clone, Debug, Default)]
pub(crate) struct AbilityTick {
    /// Velocities requested by running abilities this tick.
    pub(crate) steers: ArrayVec<(AbilityId, Vec2), { CombatConfig::MAX_ABILITIES }>,
    /// Interrupts raised by ability phases, in slot order.
    pub(crate) raised: ArrayVec<Interrupt, { CombatConfig::MAX_ABILITIES }>,
    pub(crate) began: Option<AbilityId>,
}

impl AbilityTick {
    fn raise(&mut self, interrupt: Interrupt) {
        if self.raised.try_push(interrupt).is_err() {
            tracing::warn!(kind = <&'static str>::from(interrupt.kind()), "ability interrupt dropped");
        }
    }
}

/// Per-agent ability gate and sub-machine driver.
pub struct AbilityScheduler;

impl AbilityScheduler {
    /// Cooldown and exclusivity gate, without the ability's own trigger.
    pub fn is_ready(
        agent: &Agent,
        profile: &ArchetypeProfile,
        id: AbilityId,
        now: Timestamp,
    ) -> bool {
        let (Some(slot), Some(def)) = (agent.ability(id), profile.ability(id)) else {
            return false;
        };
        if !agent.is_alive()
            || !slot.is_idle()
            || !slot.cooled_down(now)
            || agent.status.is_stunned(now)
        {
            return false;
        }
        if !def.spec.exclusive {
            return true;
        }
        agent.lock_holder().is_none()
            && !agent.abilities.iter().any(|other| {
                other.id != id
                    && !other.is_idle()
                    && profile.ability(other.id).is_some_and(|d| d.spec.exclusive)
            })
    }

    /// Advances running abilities, then begins at most one ready one.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn tick(
        agent: &mut Agent,
        profile: &ArchetypeProfile,
        env: &CombatEnv<'_>,
        peers: &Arena<Agent>,
        outbox: &mut Outbox,
        commands: &mut Vec<Command>,
        now: Timestamp,
    ) -> AbilityTick {
        let mut tick = AbilityTick::default();

        for index in 0..agent.abilities.len() {
            let slot = agent.abilities[index];
            if slot.is_idle() {
                continue;
            }
            let Some(def) = profile.ability(slot.id) else {
                continue;
            };
            let mut ctx = PhaseCtx::new(
                agent,
                StateOwner::Ability(slot.id),
                slot.machine,
                env,
                peers,
                outbox,
                commands,
                now,
            );
            let stepped = step(&mut ctx, &def.table);
            let output = ctx.finish();
            if let Some(runtime) = agent.ability_mut(slot.id) {
                runtime.machine = output.state;
                runtime.stage = match stepped {
                    StepOutcome::Finished => AbilityStage::Idle,
                    StepOutcome::Running => def.stage_of(output.state.tag),
                };
            }
            if let Some(velocity) = output.steer {
                tick.steers.push((slot.id, velocity));
            }
            if let Some(interrupt) = output.raised {
                tick.raise(interrupt);
            }
            if !agent.is_alive() {
                return tick;
            }
        }

        for index in 0..agent.abilities.len() {
            let id = agent.abilities[index].id;
            let Some(def) = profile.ability(id) else {
                continue;
            };
            if !Self::is_ready(agent, profile, id, now) {
                continue;
            }
            let state = agent.abilities[index].machine;
            let mut check = PhaseCtx::new(
                agent,
                StateOwner::Ability(id),
                state,
                env,
                peers,
                outbox,
                commands,
                now,
            );
            if !(def.spec.trigger)(&mut check) {
                continue;
            }
            drop(check);

            if let Some(interrupt) =
                Self::begin(agent, profile, def.spec.id, env, peers, outbox, commands, now)
            {
                tick.raise(interrupt);
            }
            tick.began = Some(id);
            break;
        }
        tick
    }

    #[allow(clippy::too_many_arguments)]
    fn begin(
        agent: &mut Agent,
        profile: &ArchetypeProfile,
        id: AbilityId,
        env: &CombatEnv<'_>,
        peers: &Arena<Agent>,
        outbox: &mut Outbox,
        commands: &mut Vec<Command>,
        now: Timestamp,
    ) -> Option<Interrupt> {
        let def = profile.ability(id)?;

        if def.spec.exclusive {
            let state = agent.primary;
            let mut primary = PhaseCtx::new(
                agent,
                StateOwner::Primary,
                state,
                env,
                peers,
                outbox,
                commands,
                now,
            );
            primary.agent.release_lock(StateOwner::Primary);
            primary.clear_telegraph();
            enter(&mut primary, profile.primary.entry(), now);
            agent.primary = primary.finish().state;
        }

        let slot = agent.ability_mut(id)?;
        slot.cooldown_until = now.after(def.spec.cooldown_ms);
        let state = slot.machine;

        let mut ctx = PhaseCtx::new(
            agent,
            StateOwner::Ability(id),
            state,
            env,
            peers,
            outbox,
            commands,
            now,
        );
        enter(&mut ctx, def.table.entry(), now);
        let output = ctx.finish();
        let state = output.state;
        if let Some(slot) = agent.ability_mut(id) {
            slot.machine = state;
            slot.stage = def.stage_of(state.tag);
        }

        outbox.push_event(CombatEvent::AbilityBegan {
            agent: agent.id,
            ability: id,
        });
        tracing::debug!(agent = %agent.id, ability = id.as_str(), at = %now, "ability began");
        output.raised
    }
}
