//! Phase tables of the regular enemies and support entities.
//!
//! Boss tables live in [`crate::boss`]. Shared locomotion and range checks
//! are collected here so every table reads the same way.
pub mod melee;
pub mod ranged;
pub mod sniper;
pub mod support;
pub mod turret;

use crate::behavior::{PhaseCtx, PhaseFlow};
use crate::state::Vec2;

/// Heads straight for the target, stopping inside melee range.
pub fn chase(ctx: &mut PhaseCtx<'_>) -> Vec2 {
    let Some(target) = ctx.target() else {
        return Vec2::ZERO;
    };
    let offset = target - ctx.position();
    if offset.length() <= ctx.agent.stats.melee_range * 0.8 {
        return Vec2::ZERO;
    }
    offset.normalized() * ctx.agent.stats.move_speed
}

/// Keeps the target near the edge of engage range, strafing when there.
pub fn kite(ctx: &mut PhaseCtx<'_>) -> Vec2 {
    let Some(target) = ctx.target() else {
        return Vec2::ZERO;
    };
    let stats = ctx.agent.stats;
    let offset = target - ctx.position();
    let distance = offset.length();
    let preferred = stats.engage_range * 0.8;
    let heading = offset.normalized();

    if distance < preferred * 0.7 {
        heading * -stats.move_speed
    } else if distance > stats.engage_range {
        heading * stats.move_speed
    } else {
        let side = if ctx.agent.id.index % 2 == 0 { 1.0 } else { -1.0 };
        heading.perpendicular() * (stats.move_speed * 0.5 * side)
    }
}

pub fn stand(_ctx: &mut PhaseCtx<'_>) -> Vec2 {
    Vec2::ZERO
}

/// Circles the owner; stands still once the owner is gone.
pub fn orbit_owner(ctx: &mut PhaseCtx<'_>) -> Vec2 {
    const RADIUS: f32 = 90.0;
    const ANGULAR_RATE: f32 = 0.0015;

    let Some(owner) = ctx.owner_agent().map(|owner| owner.position) else {
        return Vec2::ZERO;
    };
    let angle = ctx.agent.blackboard.orbit + ctx.now.as_millis() as f32 * ANGULAR_RATE;
    let slot = owner + Vec2::from_angle(angle) * RADIUS;
    let offset = slot - ctx.position();
    let speed = ctx.agent.stats.move_speed;
    if offset.length() <= speed * 0.05 {
        return Vec2::ZERO;
    }
    offset.normalized() * speed
}

/// Target inside engage range with a clear line of sight.
pub fn target_in_range(ctx: &mut PhaseCtx<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    ctx.position().distance(target) <= ctx.agent.stats.engage_range && ctx.line_of_sight(target)
}

pub fn advance_when_in_range(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    if target_in_range(ctx) {
        PhaseFlow::Advance
    } else {
        PhaseFlow::Stay
    }
}

/// Locks the aim onto the target.
pub fn lock_aim(ctx: &mut PhaseCtx<'_>) {
    ctx.aim_at_target();
}

pub fn track_aim(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    ctx.aim_at_target();
    PhaseFlow::Stay
}
