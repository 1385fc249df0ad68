//! Synchronous interrupt delivery.
//!
//! [`InterruptBus::raise`] applies the target's current interrupt policies
//! before it returns; there is no queue between the caller and the agent, so
//! two interrupts raised for the same agent are always handled in call order.
//! Collaborators that observe hits while the world is borrowed use
//! [`World::defer_interrupt`](crate::state::World::defer_interrupt) instead,
//! which the engine drains in its interrupt step.

use strum::IntoStaticStr;

use crate::behavior::{InterruptResponse, PhaseCtx, PhaseLibrary, PhaseTag, abort};
use crate::env::CombatEnv;
use crate::state::{
    AbilityId, Agent, AgentId, Arena, Command, CombatEvent, Impulse, Outbox, StateOwner,
    Timestamp, Vec2, World,
};

/// External combat event that may truncate in-flight behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interrupt {
    Stun,
    /// Push with the given initial velocity that decays over the hold window.
    Knockback { velocity: Vec2 },
    /// A melee strike hit a raised shield.
    ShieldBlock,
}

impl Interrupt {
    pub fn kind(&self) -> InterruptKind {
        match self {
            Interrupt::Stun => InterruptKind::Stun,
            Interrupt::Knockback { .. } => InterruptKind::Knockback,
            Interrupt::ShieldBlock => InterruptKind::ShieldBlock,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum InterruptKind {
    Stun,
    Knockback,
    ShieldBlock,
}

/// What an interrupt did to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// The agent no longer exists or is already dying.
    Stale,
    /// Every running machine ignored it.
    Ignored,
    /// No phase changed, but the knockback impulse was applied.
    Displaced,
    /// At least one machine aborted. Reports the controlling one.
    Aborted {
        from: PhaseTag,
        to: PhaseTag,
        ability: Option<AbilityId>,
    },
}

/// Delivers interrupts into agents' active phases.
#[derive(Clone, Copy, Debug)]
pub struct InterruptBus<'l> {
    library: &'l PhaseLibrary,
}

impl<'l> InterruptBus<'l> {
    pub fn new(library: &'l PhaseLibrary) -> Self {
        Self { library }
    }

    /// Applies `interrupt` to agent `id` immediately.
    pub fn raise(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        id: AgentId,
        interrupt: Interrupt,
        now: Timestamp,
    ) -> InterruptOutcome {
        let World {
            agents,
            outbox,
            commands,
            ..
        } = world;
        let Some(mut agent) = agents.check_out(id) else {
            return InterruptOutcome::Stale;
        };
        let outcome = if agent.is_alive() {
            self.deliver(&mut agent, env, agents, outbox, commands, interrupt, now)
        } else {
            InterruptOutcome::Stale
        };
        if agents.check_in(id, agent).is_err() {
            tracing::warn!(agent = %id, "agent removed while receiving an interrupt");
        }
        outcome
    }

    /// Delivery into an agent that is already exclusively borrowed.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn deliver(
        &self,
        agent: &mut Agent,
        env: &CombatEnv<'_>,
        peers: &Arena<Agent>,
        outbox: &mut Outbox,
        commands: &mut Vec<Command>,
        interrupt: Interrupt,
        now: Timestamp,
    ) -> InterruptOutcome {
        let profile = self.library.profile(agent.archetype);
        let kind = interrupt.kind();
        let controller = profile.controller(agent);
        let controller_response = profile
            .phase_of(agent, controller)
            .map_or(InterruptResponse::Ignore, |spec| spec.interrupts.response(kind));

        let mut outcome = InterruptOutcome::Ignored;
        if let Interrupt::Knockback { velocity } = interrupt
            && controller_response != InterruptResponse::Ignore
        {
            agent.clear_lock();
            agent.steering.impulse = Some(Impulse {
                velocity,
                started_at: now,
                until: now.after(env.config.knockback_hold_ms),
            });
            outcome = InterruptOutcome::Displaced;
        }

        let mut aborted: Option<(StateOwner, PhaseTag, PhaseTag)> = None;

        for index in 0..agent.abilities.len() {
            let slot = agent.abilities[index];
            if slot.is_idle() {
                continue;
            }
            let Some(def) = profile.ability(slot.id) else {
                continue;
            };
            let Some(response) = def
                .table
                .phase(slot.machine.tag)
                .map(|spec| spec.interrupts.response(kind))
            else {
                continue;
            };
            let owner = StateOwner::Ability(slot.id);
            let mut ctx =
                PhaseCtx::new(agent, owner, slot.machine, env, peers, outbox, commands, now);
            let moved = abort(&mut ctx, &def.table, response);
            let state = ctx.finish().state;
            if let Some(runtime) = agent.ability_mut(slot.id) {
                runtime.machine = state;
                runtime.stage = def.stage_of(state.tag);
            }
            if let Some((from, to)) = moved
                && (aborted.is_none() || owner == controller)
            {
                aborted = Some((owner, from, to));
            }
        }

        let primary_response = profile
            .primary
            .phase(agent.primary.tag)
            .map_or(InterruptResponse::Ignore, |spec| spec.interrupts.response(kind));
        let state = agent.primary;
        let mut ctx = PhaseCtx::new(
            agent,
            StateOwner::Primary,
            state,
            env,
            peers,
            outbox,
            commands,
            now,
        );
        let moved = abort(&mut ctx, &profile.primary, primary_response);
        agent.primary = ctx.finish().state;
        if let Some((from, to)) = moved
            && (aborted.is_none() || controller == StateOwner::Primary)
        {
            aborted = Some((StateOwner::Primary, from, to));
        }

        if let Some((owner, from, to)) = aborted {
            let ability = match owner {
                StateOwner::Ability(id) => Some(id),
                StateOwner::Primary => None,
            };
            outbox.push_event(CombatEvent::Interrupted {
                agent: agent.id,
                from,
                to,
                ability,
            });
            tracing::debug!(
                agent = %agent.id,
                kind = <&'static str>::from(kind),
                from = from.as_str(),
                to = to.as_str(),
                ?ability,
                "interrupt aborted phase"
            );
            outcome = InterruptOutcome::Aborted { from, to, ability };
        }
        outcome
    }
}
