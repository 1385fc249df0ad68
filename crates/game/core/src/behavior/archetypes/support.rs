//! Support entities spawned by bosses, plus the training dummy.
//!
//! Mines, drones and healers hold a weak owner id. The engine expires them
//! when the owner stops resolving; nothing here needs to check for it.

use super::{advance_when_in_range, orbit_owner, stand};
use crate::behavior::{
    Blueprint, InterruptResponse, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing,
};
use crate::state::{
    Archetype, Effect, Life, ProjectileFlags, ProjectileKind, TelegraphShape,
};

// ============================================================================
// Mine
// ============================================================================

pub const MINE_ARM_MS: u32 = 600;
/// Armed mines detonate on their own after this long.
pub const MINE_LIFETIME_MS: u32 = 8_000;

const UNMOVED: InterruptResponse = InterruptResponse::Ignore;

static MINE: [PhaseSpec; 4] = [
    PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(0))
        .movement(Movement::Hold)
        .on_stun(UNMOVED)
        .on_knockback(UNMOVED)
        .then(PhaseTag::Arming),
    PhaseSpec::new(PhaseTag::Arming, Timing::Fixed(MINE_ARM_MS))
        .movement(Movement::Hold)
        .on_stun(UNMOVED)
        .on_knockback(UNMOVED)
        .then(PhaseTag::Armed),
    PhaseSpec::new(
        PhaseTag::Armed,
        Timing::UntilCondition {
            min_ms: 0,
            max_ms: Some(MINE_LIFETIME_MS),
        },
    )
    .movement(Movement::Hold)
    .on_tick(proximity)
    .on_stun(UNMOVED)
    .on_knockback(UNMOVED)
    .then(PhaseTag::Detonate),
    PhaseSpec::new(PhaseTag::Detonate, Timing::Fixed(0))
        .movement(Movement::Hold)
        .on_enter(detonate)
        .on_stun(UNMOVED)
        .on_knockback(UNMOVED)
        .then(PhaseTag::Idle),
];

pub fn mine() -> Blueprint {
    Blueprint {
        archetype: Archetype::Mine,
        primary: &MINE,
        abilities: &[],
        locomotion: stand,
        sensor: None,
    }
}

fn proximity(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    match ctx.target_distance() {
        Some(distance) if distance <= ctx.agent.stats.melee_range => PhaseFlow::Advance,
        _ => PhaseFlow::Stay,
    }
}

fn detonate(ctx: &mut PhaseCtx<'_>) {
    let source = ctx.id();
    let center = ctx.position();
    let radius = ctx.agent.stats.melee_range * 1.5;
    let damage = ctx.agent.stats.damage;
    ctx.effect(Effect::AreaDamage {
        source,
        center,
        radius,
        damage,
    });
    ctx.agent.life = Life::Expired;
}

// ============================================================================
// Drone
// ============================================================================

pub const DRONE_IDLE_MIN_MS: u32 = 900;
pub const DRONE_FIRE_MS: u32 = 100;

static DRONE: [PhaseSpec; 2] = [
    PhaseSpec::new(
        PhaseTag::Idle,
        Timing::UntilCondition {
            min_ms: DRONE_IDLE_MIN_MS,
            max_ms: None,
        },
    )
    .on_tick(advance_when_in_range)
    .then(PhaseTag::Fire),
    PhaseSpec::new(PhaseTag::Fire, Timing::Fixed(DRONE_FIRE_MS))
        .on_enter(zap)
        .then(PhaseTag::Idle),
];

pub fn drone() -> Blueprint {
    Blueprint {
        archetype: Archetype::Drone,
        primary: &DRONE,
        abilities: &[],
        locomotion: orbit_owner,
        sensor: None,
    }
}

fn zap(ctx: &mut PhaseCtx<'_>) {
    let aim = ctx.aim_at_target();
    ctx.fire(ProjectileKind::Bullet, aim, ProjectileFlags::empty());
}

// ============================================================================
// Healer
// ============================================================================

pub const HEALER_IDLE_MIN_MS: u32 = 1_500;
pub const HEALER_CHANNEL_MS: u32 = 1_200;

static HEALER: [PhaseSpec; 3] = [
    PhaseSpec::new(
        PhaseTag::Idle,
        Timing::UntilCondition {
            min_ms: HEALER_IDLE_MIN_MS,
            max_ms: None,
        },
    )
    .on_tick(owner_hurt)
    .then(PhaseTag::Channel),
    PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(HEALER_CHANNEL_MS))
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 40.0 })
        .then(PhaseTag::Mend),
    PhaseSpec::new(PhaseTag::Mend, Timing::Fixed(0))
        .on_enter(mend)
        .then(PhaseTag::Idle),
];

pub fn healer() -> Blueprint {
    Blueprint {
        archetype: Archetype::Healer,
        primary: &HEALER,
        abilities: &[],
        locomotion: orbit_owner,
        sensor: None,
    }
}

fn owner_hurt(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    match ctx.owner_agent() {
        Some(owner) if owner.health.current < owner.health.max => PhaseFlow::Advance,
        _ => PhaseFlow::Stay,
    }
}

fn mend(ctx: &mut PhaseCtx<'_>) {
    if let Some(owner) = ctx.agent.owner {
        let amount = ctx.agent.stats.damage;
        ctx.heal(owner, amount);
    }
}

// ============================================================================
// Training dummy
// ============================================================================

static DUMMY: [PhaseSpec; 1] = [PhaseSpec::new(
    PhaseTag::Idle,
    Timing::UntilCondition {
        min_ms: 0,
        max_ms: None,
    },
)
.movement(Movement::Hold)
.on_knockback(UNMOVED)];

pub fn dummy() -> Blueprint {
    Blueprint {
        archetype: Archetype::Dummy,
        primary: &DUMMY,
        abilities: &[],
        locomotion: stand,
        sensor: None,
    }
}
