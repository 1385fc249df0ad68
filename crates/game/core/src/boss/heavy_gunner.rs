//! Heavy gunner: slow, tanky, area denial.
//!
//! Primary cycle spins up a machine gun and fires sweeping bursts; every
//! third burst is followed by a three-wave grenade fan.
//!
//! Abilities, in priority order: bombardment (channel, then a marker and a
//! rain of area damage running alongside the primary cycle) and a turret
//! summon capped at two live turrets.

use std::f32::consts::FRAC_PI_2;

use super::{ahead, below_cap, fan, has_target};
use crate::ability::AbilitySpec;
use crate::behavior::archetypes::{kite, lock_aim, track_aim};
use crate::behavior::{
    Blueprint, InterruptResponse, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing,
};
use crate::state::{
    AbilityId, AbilityStage, Agent, Archetype, Effect, ProjectileFlags, ProjectileKind,
    TelegraphShape, Vec2,
};

// ===== primary cycle =====
pub const SPINUP_MS: u32 = 700;
pub const BURST_MS: u32 = 1_500;
pub const BURST_SHOTS: u32 = 15;
pub const SHOT_GAP_MS: u32 = 100;
/// Total angular jitter of one machine-gun round, in radians.
pub const BURST_SPREAD: f32 = 0.3;
pub const COOLDOWN_MS: u32 = 900;
/// A grenade fan follows every n-th burst.
pub const GRENADE_EVERY: u32 = 3;
pub const FAN_MS: u32 = 1_200;
pub const FAN_WAVES: u32 = 3;
pub const FAN_WAVE_GAP_MS: u32 = 400;
pub const FAN_GRENADES: u32 = 5;
pub const FAN_SPREAD: f32 = std::f32::consts::FRAC_PI_3;
pub const RECOVER_MS: u32 = 800;

// ===== bombardment =====
pub const BOMBARDMENT_COOLDOWN_MS: u32 = 18_000;
pub const BOMBARDMENT_WARMUP_MS: u32 = 6_000;
pub const BOMBARDMENT_CHANNEL_MS: u32 = 1_000;
pub const MARKER_MS: u32 = 800;
pub const RAIN_MS: u32 = 3_000;
pub const RAIN_GAP_MS: u32 = 200;
pub const RAIN_SCATTER: f32 = 120.0;
pub const RAIN_RADIUS: f32 = 50.0;
pub const MARKER_RADIUS: f32 = 160.0;
/// Marker placement leads to where the target was this long ago.
pub const MARKER_LAG_MS: u32 = 500;

// ===== turret summon =====
pub const TURRET_COOLDOWN_MS: u32 = 25_000;
pub const TURRET_WARMUP_MS: u32 = 10_000;
pub const TURRET_CAP: usize = 2;
pub const TURRET_CHANNEL_MS: u32 = 1_200;
pub const DEPLOY_MS: u32 = 400;
pub const TURRET_RECOVER_MS: u32 = 600;
pub const TURRET_OFFSET: f32 = 80.0;

const CYCLE: &[PhaseTag] = &[PhaseTag::Spinup, PhaseTag::GrenadeFan];

static PRIMARY: [PhaseSpec; 6] = [
    PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(0)).then(PhaseTag::Spinup),
    PhaseSpec::new(PhaseTag::Spinup, Timing::Fixed(SPINUP_MS))
        .movement(Movement::Hold)
        .telegraph(TelegraphShape::Arc {
            radius: 300.0,
            spread: 0.6,
        })
        .on_enter(lock_aim)
        .on_tick(track_aim)
        .then(PhaseTag::Burst),
    PhaseSpec::new(PhaseTag::Burst, Timing::Fixed(BURST_MS))
        .movement(Movement::Penalty(0.25))
        .on_tick(machine_gun)
        .on_exit(count_volley)
        .then(PhaseTag::Cooldown),
    PhaseSpec::new(PhaseTag::Cooldown, Timing::Fixed(COOLDOWN_MS)).branch(CYCLE, next_cycle),
    PhaseSpec::new(PhaseTag::GrenadeFan, Timing::Fixed(FAN_MS))
        .movement(Movement::Hold)
        .on_tick(grenades)
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(RECOVER_MS)).then(PhaseTag::Spinup),
];

const STEADY: InterruptResponse = InterruptResponse::Ignore;

static BOMBARDMENT: [PhaseSpec; 3] = [
    PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(BOMBARDMENT_CHANNEL_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 60.0 })
        .then(PhaseTag::Marker),
    PhaseSpec::new(PhaseTag::Marker, Timing::Fixed(MARKER_MS))
        .concurrent()
        .on_enter(place_marker)
        .on_stun(STEADY)
        .on_knockback(STEADY)
        .then(PhaseTag::Rain),
    PhaseSpec::new(PhaseTag::Rain, Timing::Fixed(RAIN_MS))
        .concurrent()
        .on_tick(rain)
        .on_stun(STEADY)
        .on_knockback(STEADY)
        .on_exit(forget_anchor)
        .then(PhaseTag::Idle),
];

static TURRET_SUMMON: [PhaseSpec; 3] = [
    PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(TURRET_CHANNEL_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 70.0 })
        .then(PhaseTag::Deploy),
    PhaseSpec::new(PhaseTag::Deploy, Timing::Fixed(DEPLOY_MS))
        .movement(Movement::Frozen)
        .on_enter(deploy)
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(TURRET_RECOVER_MS))
        .stage(AbilityStage::Recovering)
        .then(PhaseTag::Idle),
];

static ABILITIES: [AbilitySpec; 2] = [
    AbilitySpec::new(
        AbilityId::Bombardment,
        BOMBARDMENT_COOLDOWN_MS,
        has_target,
        &BOMBARDMENT,
    )
    .warmup(BOMBARDMENT_WARMUP_MS),
    AbilitySpec::new(
        AbilityId::TurretSummon,
        TURRET_COOLDOWN_MS,
        turret_slot_free,
        &TURRET_SUMMON,
    )
    .warmup(TURRET_WARMUP_MS),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::HeavyGunner,
        primary: &PRIMARY,
        abilities: &ABILITIES,
        locomotion: kite,
        sensor: None,
    }
}

// ============================================================================
// Primary cycle
// ============================================================================

fn next_cycle(agent: &Agent) -> usize {
    usize::from(agent.blackboard.volleys % GRENADE_EVERY == 0)
}

fn machine_gun(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    for shot in 0..ctx.cadence(0, SHOT_GAP_MS, BURST_SHOTS) {
        let aim = ctx.aim_at_target();
        let jitter = (ctx.random_unit(shot) - 0.5) * BURST_SPREAD;
        ctx.fire(ProjectileKind::Bullet, aim + jitter, ProjectileFlags::BLOCKABLE);
    }
    PhaseFlow::Stay
}

fn count_volley(ctx: &mut PhaseCtx<'_>) {
    ctx.agent.blackboard.volleys += 1;
}

fn grenades(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    for _ in 0..ctx.cadence(0, FAN_WAVE_GAP_MS, FAN_WAVES) {
        let aim = ctx.aim_at_target();
        for angle in fan(aim, FAN_SPREAD, FAN_GRENADES) {
            ctx.fire_scaled(
                ProjectileKind::Grenade,
                angle,
                2.0,
                0.6,
                ProjectileFlags::EXPLOSIVE,
            );
        }
    }
    PhaseFlow::Stay
}

// ============================================================================
// Bombardment
// ============================================================================

fn place_marker(ctx: &mut PhaseCtx<'_>) {
    let center = ctx
        .lagged_target(MARKER_LAG_MS)
        .unwrap_or_else(|| ctx.position());
    ctx.agent.blackboard.anchor = Some(center);
    let agent = ctx.id();
    ctx.effect(Effect::PlaceMarker {
        agent,
        position: center,
        radius: MARKER_RADIUS,
        duration_ms: MARKER_MS + RAIN_MS,
    });
}

fn rain(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    let Some(anchor) = ctx.agent.blackboard.anchor else {
        return PhaseFlow::Stay;
    };
    for drop in 0..ctx.cadence(0, RAIN_GAP_MS, RAIN_MS / RAIN_GAP_MS) {
        let angle = ctx.random_unit(drop * 2) * std::f32::consts::TAU;
        let reach = ctx.random_unit(drop * 2 + 1) * RAIN_SCATTER;
        let source = ctx.id();
        let damage = ctx.agent.stats.damage;
        ctx.effect(Effect::AreaDamage {
            source,
            center: anchor + Vec2::from_angle(angle) * reach,
            radius: RAIN_RADIUS,
            damage,
        });
    }
    PhaseFlow::Stay
}

fn forget_anchor(ctx: &mut PhaseCtx<'_>) {
    ctx.agent.blackboard.anchor = None;
}

// ============================================================================
// Turret summon
// ============================================================================

fn turret_slot_free(ctx: &mut PhaseCtx<'_>) -> bool {
    below_cap(ctx, Archetype::Turret, TURRET_CAP) && has_target(ctx)
}

fn deploy(ctx: &mut PhaseCtx<'_>) {
    let aim = ctx.aim_at_target();
    let side = if ctx.agent.live_children(Archetype::Turret) % 2 == 0 {
        FRAC_PI_2
    } else {
        -FRAC_PI_2
    };
    let position = ahead(ctx, aim + side, TURRET_OFFSET);
    ctx.spawn(Archetype::Turret, position, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::ArchetypeProfile;

    #[test]
    fn tables_validate() {
        let profile = ArchetypeProfile::build(blueprint()).expect("heavy gunner tables");
        assert_eq!(profile.abilities.len(), 2);
        let rain = profile.abilities[0]
            .table
            .phase(PhaseTag::Rain)
            .expect("rain phase");
        assert!(!rain.suppress_primary);
    }
}
