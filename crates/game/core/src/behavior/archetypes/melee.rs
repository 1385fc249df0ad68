//! Melee grunt: `idle → windup → sweep → recover → idle`.

use super::{chase, lock_aim};
use crate::behavior::{
    Blueprint, InterruptResponse, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing,
};
use crate::state::{Archetype, TelegraphShape};

pub const WINDUP_MS: u32 = 600;
pub const SWEEP_MS: u32 = 300;
/// Delay of the single damage tick inside the sweep.
pub const STRIKE_AT_MS: u32 = 120;
pub const RECOVER_MS: u32 = 700;

const SWING: TelegraphShape = TelegraphShape::Arc {
    radius: 90.0,
    spread: 1.4,
};

static PHASES: [PhaseSpec; 4] = [
    PhaseSpec::new(
        PhaseTag::Idle,
        Timing::UntilCondition {
            min_ms: 0,
            max_ms: None,
        },
    )
    .on_tick(close_in)
    .then(PhaseTag::Windup),
    PhaseSpec::new(PhaseTag::Windup, Timing::Fixed(WINDUP_MS))
        .movement(Movement::Frozen)
        .telegraph(SWING)
        .on_enter(lock_aim)
        .on_knockback(InterruptResponse::AbortToIdle)
        .then(PhaseTag::Sweep),
    PhaseSpec::new(PhaseTag::Sweep, Timing::Fixed(SWEEP_MS))
        .movement(Movement::Frozen)
        .on_tick(sweep)
        .on_knockback(InterruptResponse::AbortTo(PhaseTag::Recover))
        .on_shield_block(InterruptResponse::AbortTo(PhaseTag::Recover))
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(RECOVER_MS))
        .movement(Movement::Penalty(0.35))
        .then(PhaseTag::Idle),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::Melee,
        primary: &PHASES,
        abilities: &[],
        locomotion: chase,
        sensor: None,
    }
}

fn close_in(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    match ctx.target_distance() {
        Some(distance) if distance <= ctx.agent.stats.melee_range => PhaseFlow::Advance,
        _ => PhaseFlow::Stay,
    }
}

fn sweep(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    if ctx.cadence(STRIKE_AT_MS, 1, 1) > 0 {
        let (aim, reach) = (ctx.agent.blackboard.aim, ctx.agent.stats.melee_range * 1.5);
        ctx.strike(aim, reach);
    }
    PhaseFlow::Stay
}
