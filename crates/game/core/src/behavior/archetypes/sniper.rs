//! Sniper: `idle → aiming (long, frozen, telegraphed) → fire → cooldown`.

use super::{advance_when_in_range, kite, lock_aim, track_aim};
use crate::behavior::{
    Blueprint, InterruptResponse, Movement, PhaseCtx, PhaseSpec, PhaseTag, Timing,
};
use crate::state::{Archetype, ProjectileFlags, ProjectileKind, TelegraphShape};

pub const IDLE_MIN_MS: u32 = 800;
pub const AIM_MS: u32 = 2_000;
pub const FIRE_MS: u32 = 150;
pub const COOLDOWN_MS: u32 = 2_500;

const SIGHT_LINE: TelegraphShape = TelegraphShape::Line {
    length: 900.0,
    width: 3.0,
};

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
        .movement(Movement::Frozen)
        .telegraph(SIGHT_LINE)
        .on_enter(lock_aim)
        .on_tick(track_aim)
        .on_knockback(InterruptResponse::AbortToIdle)
        .then(PhaseTag::Fire),
    PhaseSpec::new(PhaseTag::Fire, Timing::Fixed(FIRE_MS))
        .movement(Movement::Hold)
        .on_enter(shoot)
        .then(PhaseTag::Cooldown),
    PhaseSpec::new(PhaseTag::Cooldown, Timing::Fixed(COOLDOWN_MS)).then(PhaseTag::Idle),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::Sniper,
        primary: &PHASES,
        abilities: &[],
        locomotion: kite,
        sensor: None,
    }
}

fn shoot(ctx: &mut PhaseCtx<'_>) {
    let aim = ctx.agent.blackboard.aim;
    ctx.fire(ProjectileKind::SniperRound, aim, ProjectileFlags::PIERCING);
}
