//! Evasive caster: keeps its distance and punishes crowding.
//!
//! Primary cycle fires pellet fans; every fourth volley is a ring of homing
//! orbs followed by a lockout.
//!
//! Abilities, in priority order: teleport once the target has crowded it
//! for a while (arriving with ranged minions), phase bombs that shadow the
//! target, and a drone summon capped at three.

use std::f32::consts::TAU;

use super::{ahead, below_cap, fan, has_target, room_for};
use crate::ability::AbilitySpec;
use crate::behavior::archetypes::{kite, lock_aim};
use crate::behavior::{Blueprint, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing};
use crate::state::{
    AbilityId, AbilityStage, Agent, Archetype, Effect, HazardKind, ProjectileFlags,
    ProjectileKind, TelegraphShape, Vec2,
};

// ===== primary cycle =====
pub const VOLLEY_MS: u32 = 1_500;
pub const PELLETS: u32 = 5;
pub const PELLET_SPREAD: f32 = 0.5;
/// Every n-th volley is followed by the orb special.
pub const SPECIAL_EVERY: u32 = 4;
pub const SPECIAL_MS: u32 = 1_000;
pub const ORBS: u32 = 6;
pub const LOCKOUT_MS: u32 = 2_500;

// ===== teleport =====
pub const TELEPORT_COOLDOWN_MS: u32 = 8_000;
/// The target counts as crowding inside this radius.
pub const CROWD_RADIUS: f32 = 160.0;
/// How long the target must crowd before the caster teleports.
pub const CROWD_MS: u64 = 1_000;
pub const BLINK_MS: u32 = 400;
pub const ARRIVE_MS: u32 = 300;
pub const TELEPORT_RECOVER_MS: u32 = 300;
pub const TELEPORT_DISTANCE: f32 = 380.0;
/// Candidate sites tried around the target before falling back.
pub const TELEPORT_CANDIDATES: u32 = 8;
/// Sites with another agent this close are rejected.
pub const TELEPORT_CLEARANCE: f32 = 60.0;
pub const MINIONS_PER_TELEPORT: u32 = 2;
pub const MINION_CAP: usize = 4;
pub const MINION_STAT_SCALE: f32 = 0.6;

// ===== phase bombs =====
pub const BOMBS_COOLDOWN_MS: u32 = 14_000;
pub const BOMBS_WARMUP_MS: u32 = 4_000;
pub const BOMBS_CHANNEL_MS: u32 = 800;
pub const BARRAGE_MS: u32 = 2_400;
pub const BOMB_GAP_MS: u32 = 400;
pub const BOMB_FUSE_MS: u32 = 900;
pub const BOMB_RADIUS: f32 = 70.0;
pub const BOMBS_RECOVER_MS: u32 = 600;

// ===== drone summon =====
pub const DRONES_COOLDOWN_MS: u32 = 20_000;
pub const DRONES_WARMUP_MS: u32 = 8_000;
pub const DRONE_CAP: usize = 3;
pub const DRONES_CHANNEL_MS: u32 = 1_000;
pub const RELEASE_MS: u32 = 300;
pub const DRONES_RECOVER_MS: u32 = 400;

const CYCLE: &[PhaseTag] = &[PhaseTag::Volley, PhaseTag::Special];

static PRIMARY: [PhaseSpec; 4] = [
    PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(0)).then(PhaseTag::Volley),
    PhaseSpec::new(PhaseTag::Volley, Timing::Fixed(VOLLEY_MS))
        .on_enter(pellet_fan)
        .branch(CYCLE, next_cycle),
    PhaseSpec::new(PhaseTag::Special, Timing::Fixed(SPECIAL_MS))
        .movement(Movement::Hold)
        .telegraph(TelegraphShape::Circle { radius: 90.0 })
        .on_enter(orb_ring)
        .then(PhaseTag::Lockout),
    PhaseSpec::new(PhaseTag::Lockout, Timing::Fixed(LOCKOUT_MS)).then(PhaseTag::Volley),
];

static TELEPORT: [PhaseSpec; 3] = [
    PhaseSpec::new(PhaseTag::Blink, Timing::Fixed(BLINK_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 50.0 })
        .on_enter(choose_site)
        .then(PhaseTag::Arrive),
    PhaseSpec::new(PhaseTag::Arrive, Timing::Fixed(ARRIVE_MS))
        .movement(Movement::Frozen)
        .on_enter(arrive)
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(TELEPORT_RECOVER_MS))
        .stage(AbilityStage::Recovering)
        .then(PhaseTag::Idle),
];

static PHASE_BOMBS: [PhaseSpec; 3] = [
    PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(BOMBS_CHANNEL_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 60.0 })
        .on_enter(lock_aim)
        .then(PhaseTag::Barrage),
    PhaseSpec::new(PhaseTag::Barrage, Timing::Fixed(BARRAGE_MS))
        .movement(Movement::Hold)
        .on_tick(drop_bombs)
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(BOMBS_RECOVER_MS))
        .stage(AbilityStage::Recovering)
        .then(PhaseTag::Idle),
];

static DRONE_SUMMON: [PhaseSpec; 3] = [
    PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(DRONES_CHANNEL_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 60.0 })
        .then(PhaseTag::Release),
    PhaseSpec::new(PhaseTag::Release, Timing::Fixed(RELEASE_MS))
        .movement(Movement::Frozen)
        .on_enter(release_drones)
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(DRONES_RECOVER_MS))
        .stage(AbilityStage::Recovering)
        .then(PhaseTag::Idle),
];

static ABILITIES: [AbilitySpec; 3] = [
    AbilitySpec::new(
        AbilityId::Teleport,
        TELEPORT_COOLDOWN_MS,
        crowded,
        &TELEPORT,
    ),
    AbilitySpec::new(
        AbilityId::PhaseBombs,
        BOMBS_COOLDOWN_MS,
        has_target,
        &PHASE_BOMBS,
    )
    .warmup(BOMBS_WARMUP_MS),
    AbilitySpec::new(
        AbilityId::DroneSummon,
        DRONES_COOLDOWN_MS,
        drone_slot_free,
        &DRONE_SUMMON,
    )
    .warmup(DRONES_WARMUP_MS),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::EvasiveCaster,
        primary: &PRIMARY,
        abilities: &ABILITIES,
        locomotion: kite,
        sensor: Some(watch_crowding),
    }
}

// ============================================================================
// Primary cycle
// ============================================================================

fn next_cycle(agent: &Agent) -> usize {
    usize::from(agent.blackboard.volleys % SPECIAL_EVERY == 0)
}

fn pellet_fan(ctx: &mut PhaseCtx<'_>) {
    ctx.agent.blackboard.volleys += 1;
    let aim = ctx.aim_at_target();
    for angle in fan(aim, PELLET_SPREAD, PELLETS) {
        ctx.fire(ProjectileKind::Pellet, angle, ProjectileFlags::BLOCKABLE);
    }
}

fn orb_ring(ctx: &mut PhaseCtx<'_>) {
    let aim = ctx.aim_at_target();
    for k in 0..ORBS {
        let angle = aim + TAU * k as f32 / ORBS as f32;
        ctx.fire_scaled(
            ProjectileKind::HomingOrb,
            angle,
            1.5,
            0.5,
            ProjectileFlags::HOMING,
        );
    }
}

// ============================================================================
// Teleport
// ============================================================================

/// Tracks how long the target has stayed inside the crowd radius.
fn watch_crowding(ctx: &mut PhaseCtx<'_>) {
    let near = ctx
        .target_distance()
        .is_some_and(|distance| distance <= CROWD_RADIUS);
    let now = ctx.now;
    let blackboard = &mut ctx.agent.blackboard;
    blackboard.near_since = match blackboard.near_since {
        Some(since) if near => Some(since),
        None if near => Some(now),
        _ => None,
    };
}

fn crowded(ctx: &mut PhaseCtx<'_>) -> bool {
    ctx.agent
        .blackboard
        .near_since
        .is_some_and(|since| ctx.now.since(since) >= CROWD_MS)
}

/// First candidate around the target with sight of it and nobody standing
/// there; falls back to straight away from the target.
fn choose_site(ctx: &mut PhaseCtx<'_>) {
    let origin = ctx.position();
    let Some(target) = ctx.target() else {
        ctx.agent.blackboard.anchor = Some(origin);
        return;
    };
    let base = ctx.random_unit(0) * TAU;
    let site = (0..TELEPORT_CANDIDATES)
        .map(|k| base + TAU * k as f32 / TELEPORT_CANDIDATES as f32)
        .map(|angle| target + Vec2::from_angle(angle) * TELEPORT_DISTANCE)
        .find(|&candidate| {
            ctx.env.spatial.line_of_sight(candidate, target)
                && ctx
                    .env
                    .spatial
                    .entities_within_radius(candidate, TELEPORT_CLEARANCE)
                    .is_empty()
        })
        .unwrap_or_else(|| target + (origin - target).normalized() * TELEPORT_DISTANCE);
    ctx.agent.blackboard.anchor = Some(site);
}

fn arrive(ctx: &mut PhaseCtx<'_>) {
    let agent = ctx.id();
    let site = ctx.agent.blackboard.anchor.take().unwrap_or_else(|| ctx.position());
    ctx.effect(Effect::Teleport { agent, to: site });
    ctx.agent.position = site;
    ctx.agent.blackboard.near_since = None;

    let spawns = room_for(ctx, Archetype::Ranged, MINION_CAP).min(MINIONS_PER_TELEPORT as usize);
    let aim = ctx.aim_at_target();
    for i in 0..spawns {
        let side = if i % 2 == 0 { 1.0 } else { -1.0 };
        let position = ahead(ctx, aim + side * std::f32::consts::FRAC_PI_2, 70.0);
        ctx.spawn(Archetype::Ranged, position, MINION_STAT_SCALE);
    }
}

// ============================================================================
// Phase bombs
// ============================================================================

fn drop_bombs(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    for _ in 0..ctx.cadence(0, BOMB_GAP_MS, BARRAGE_MS / BOMB_GAP_MS) {
        let Some(position) = ctx.target() else {
            break;
        };
        let follow = ctx.agent.target.map(|target| target.id);
        let source = ctx.id();
        let damage = ctx.agent.stats.damage * 2;
        ctx.effect(Effect::Hazard {
            source,
            kind: HazardKind::PhaseBomb,
            position,
            follow,
            radius: BOMB_RADIUS,
            damage,
            fuse_ms: BOMB_FUSE_MS,
        });
    }
    PhaseFlow::Stay
}

// ============================================================================
// Drone summon
// ============================================================================

fn drone_slot_free(ctx: &mut PhaseCtx<'_>) -> bool {
    below_cap(ctx, Archetype::Drone, DRONE_CAP)
}

fn release_drones(ctx: &mut PhaseCtx<'_>) {
    let count = room_for(ctx, Archetype::Drone, DRONE_CAP);
    for k in 0..count {
        let angle = TAU * k as f32 / DRONE_CAP as f32;
        let position = ahead(ctx, angle, 60.0);
        ctx.spawn(Archetype::Drone, position, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::ArchetypeProfile;

    #[test]
    fn tables_validate() {
        let profile = ArchetypeProfile::build(blueprint()).expect("caster tables");
        let order: Vec<AbilityId> = profile.abilities.iter().map(|def| def.spec.id).collect();
        assert_eq!(
            order,
            vec![
                AbilityId::Teleport,
                AbilityId::PhaseBombs,
                AbilityId::DroneSummon
            ]
        );
        assert!(profile.sensor.is_some());
    }

    #[test]
    fn fourth_volley_branches_to_special() {
        let template = crate::env::AgentTemplate::builtin(Archetype::EvasiveCaster);
        let mut agent = Agent::new(
            crate::state::AgentId::new(0, 0),
            Archetype::EvasiveCaster,
            &template,
            Vec2::ZERO,
            1.0,
            crate::state::Timestamp::ZERO,
        );
        agent.blackboard.volleys = 3;
        assert_eq!(next_cycle(&agent), 0);
        agent.blackboard.volleys = 4;
        assert_eq!(next_cycle(&agent), 1);
    }
}
