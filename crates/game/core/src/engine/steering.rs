//! Final velocity of an agent for the physics collaborator.
//!
//! Precedence, highest first:
//!
//! 1. stun: zero
//! 2. knockback impulse while it lasts
//! 3. toxin on a mobile ranged archetype: wander heading re-rolled on a
//!    random period, even while the controlling phase is `Frozen` or
//!    `Scripted` (a sniper drifts off its sight line mid-aim)
//! 4. what the machines asked for, shaped by the controlling phase's
//!    [`Movement`]

use crate::behavior::{ArchetypeProfile, Movement, PhaseCtx};
use crate::env::CombatEnv;
use crate::state::{
    AbilityId, Agent, Arena, Command, Outbox, StateOwner, StatusKind, Timestamp, Vec2, Wander,
};

const WANDER_SEED_CONTEXT: u32 = 0x7a11;

#[allow(clippy::too_many_arguments)]
pub(super) fn resolve(
    agent: &mut Agent,
    profile: &ArchetypeProfile,
    env: &CombatEnv<'_>,
    peers: &Arena<Agent>,
    outbox: &mut Outbox,
    commands: &mut Vec<Command>,
    primary_steer: Option<Vec2>,
    ability_steers: &[(AbilityId, Vec2)],
    now: Timestamp,
) {
    let controller = profile.controller(agent);
    let movement = profile
        .phase_of(agent, controller)
        .map_or(Movement::Free, |spec| spec.movement);
    let scripted = match controller {
        StateOwner::Primary => primary_steer,
        StateOwner::Ability(id) => steer_of(ability_steers, id),
    };
    let overlay = ability_steers
        .iter()
        .find(|(id, _)| StateOwner::Ability(*id) != controller)
        .map(|(_, velocity)| *velocity);

    let desired = match movement {
        Movement::Free => match overlay.or(scripted) {
            Some(velocity) => velocity,
            None => locomote(agent, profile, env, peers, outbox, commands, now),
        },
        Movement::Penalty(factor) => match overlay {
            Some(velocity) => velocity,
            None => locomote(agent, profile, env, peers, outbox, commands, now) * factor,
        },
        Movement::Hold => overlay.unwrap_or(Vec2::ZERO),
        Movement::Frozen => Vec2::ZERO,
        Movement::Scripted => scripted.unwrap_or(Vec2::ZERO),
    };
    agent.steering.desired = desired;

    if agent.status.is_stunned(now) {
        agent.steering.resolved = Vec2::ZERO;
        return;
    }

    if let Some(impulse) = agent.steering.impulse {
        match impulse.velocity_at(now) {
            Some(velocity) => {
                agent.steering.resolved = velocity;
                return;
            }
            None => agent.steering.impulse = None,
        }
    }

    // Overrides every movement mode, Frozen and Scripted phases included.
    let scrambled = agent.status.is_active(StatusKind::Toxin, now)
        && agent.archetype.is_ranged()
        && !agent.archetype.is_stationary();
    if !scrambled {
        agent.steering.wander = None;
        agent.steering.resolved = desired;
        return;
    }

    let wander = match agent.steering.wander {
        Some(wander) if now < wander.change_at => wander,
        _ => {
            let seed = env.seed_for(now, agent.id, WANDER_SEED_CONTEXT);
            let heading = Vec2::from_angle(env.rng.angle(seed));
            let period = env.rng.range(
                seed.rotate_left(17),
                env.config.toxin_wander_min_ms,
                env.config.toxin_wander_max_ms,
            );
            Wander {
                heading,
                change_at: now.after(period),
            }
        }
    };
    agent.steering.wander = Some(wander);
    agent.steering.resolved = wander.heading * agent.stats.move_speed;
}

fn locomote(
    agent: &mut Agent,
    profile: &ArchetypeProfile,
    env: &CombatEnv<'_>,
    peers: &Arena<Agent>,
    outbox: &mut Outbox,
    commands: &mut Vec<Command>,
    now: Timestamp,
) -> Vec2 {
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
    (profile.locomotion)(&mut ctx)
}

fn steer_of(steers: &[(AbilityId, Vec2)], id: AbilityId) -> Option<Vec2> {
    steers
        .iter()
        .find(|(owner, _)| *owner == id)
        .map(|(_, velocity)| *velocity)
}
