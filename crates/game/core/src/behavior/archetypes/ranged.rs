//! Ranged gunner: `idle → aiming → firing (burst) → cooldown → idle`.

use super::{advance_when_in_range, kite, lock_aim, track_aim};
use crate::behavior::{Blueprint, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing};
use crate::state::{Archetype, ProjectileFlags, ProjectileKind};

pub const IDLE_MIN_MS: u32 = 500;
pub const AIM_MS: u32 = 700;
pub const BURST_SHOTS: u32 = 3;
pub const BURST_GAP_MS: u32 = 180;
pub const FIRING_MS: u32 = BURST_SHOTS * BURST_GAP_MS;
pub const COOLDOWN_MIN_MS: u32 = 1_200;
pub const COOLDOWN_MAX_MS: u32 = 1_800;

static PHASES: [PhaseSpec; 4] = [
    PhaseSpec::new(
        PhaseTag::Idle,
        Timing::UntilCondition {
            min_ms: IDLE_MIN_MS,
            max_ms: None,
        },
    )
    .on_tick(advance_when_in_range)
    .then(PhaseTag::Aiming),
    PhaseSpec::new(PhaseTag::Aiming, Timing::Fixed(AIM_MS))
        .movement(Movement::Hold)
        .on_enter(lock_aim)
        .on_tick(track_aim)
        .then(PhaseTag::Firing),
    PhaseSpec::new(PhaseTag::Firing, Timing::Fixed(FIRING_MS))
        .movement(Movement::Hold)
        .on_tick(burst)
        .then(PhaseTag::Cooldown),
    PhaseSpec::new(
        PhaseTag::Cooldown,
        Timing::Random {
            min_ms: COOLDOWN_MIN_MS,
            max_ms: COOLDOWN_MAX_MS,
        },
    )
    .then(PhaseTag::Idle),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::Ranged,
        primary: &PHASES,
        abilities: &[],
        locomotion: kite,
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
