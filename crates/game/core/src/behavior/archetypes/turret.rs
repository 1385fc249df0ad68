//! Stationary turret summoned by the heavy gunner.
//!
//! Same cycle as the ranged gunner with a longer burst; knockback never
//! moves it.

use super::{advance_when_in_range, lock_aim, stand, track_aim};
use crate::behavior::{
    Blueprint, InterruptResponse, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing,
};
use crate::state::{Archetype, ProjectileFlags, ProjectileKind};

pub const AIM_MS: u32 = 400;
pub const BURST_SHOTS: u32 = 5;
pub const BURST_GAP_MS: u32 = 100;
pub const COOLDOWN_MS: u32 = 1_500;

const STILL: InterruptResponse = InterruptResponse::Ignore;

static PHASES: [PhaseSpec; 4] = [
    PhaseSpec::new(
        PhaseTag::Idle,
        Timing::UntilCondition {
            min_ms: 300,
            max_ms: None,
        },
    )
    .movement(Movement::Hold)
    .on_tick(advance_when_in_range)
    .on_knockback(STILL)
    .then(PhaseTag::Aiming),
    PhaseSpec::new(PhaseTag::Aiming, Timing::Fixed(AIM_MS))
        .movement(Movement::Hold)
        .on_enter(lock_aim)
        .on_tick(track_aim)
        .on_knockback(STILL)
        .then(PhaseTag::Firing),
    PhaseSpec::new(PhaseTag::Firing, Timing::Fixed(BURST_SHOTS * BURST_GAP_MS))
        .movement(Movement::Hold)
        .on_tick(burst)
        .on_knockback(STILL)
        .then(PhaseTag::Cooldown),
    PhaseSpec::new(PhaseTag::Cooldown, Timing::Fixed(COOLDOWN_MS))
        .movement(Movement::Hold)
        .on_knockback(STILL)
        .then(PhaseTag::Idle),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::Turret,
        primary: &PHASES,
        abilities: &[],
        locomotion: stand,
        sensor: None,
    }
}

fn burst(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    for _ in 0..ctx.cadence(0, BURST_GAP_MS, BURST_SHOTS) {
        let aim = ctx.aim_at_target();
        ctx.fire(ProjectileKind::Bullet, aim, ProjectileFlags::BLOCKABLE);
    }
    PhaseFlow::Stay
}
