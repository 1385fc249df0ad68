//! Boss orchestration.
//!
//! A boss is a regular agent whose profile carries a primary attack cycle
//! plus a prioritised list of abilities. Orchestration is entirely
//! table-driven:
//!
//! - the primary cycle runs whenever no ability suppresses it
//! - every tick the [`AbilityScheduler`](crate::ability::AbilityScheduler)
//!   begins at most one ready ability, in the order listed here
//! - exclusive abilities claim the movement lock and pre-empt the primary
//!   back to its entry; shared abilities overlay a velocity and nothing else
//!
//! Each submodule exposes the boss's tunables as constants and a
//! [`Blueprint`](crate::behavior::Blueprint) built from static tables.

pub mod brawler;
pub mod evasive_caster;
pub mod heavy_gunner;

use crate::behavior::PhaseCtx;
use crate::state::{Archetype, Vec2};

/// Hard limit on how many children of one kind a boss keeps alive.
pub(crate) fn below_cap(ctx: &PhaseCtx<'_>, archetype: Archetype, cap: usize) -> bool {
    ctx.agent.live_children(archetype) < cap
}

/// How many more children of `archetype` fit under `cap`.
pub(crate) fn room_for(ctx: &PhaseCtx<'_>, archetype: Archetype, cap: usize) -> usize {
    cap.saturating_sub(ctx.agent.live_children(archetype))
}

pub(crate) fn has_target(ctx: &mut PhaseCtx<'_>) -> bool {
    ctx.target().is_some()
}

/// Spreads `count` angles evenly across `spread` radians around `center`.
pub(crate) fn fan(center: f32, spread: f32, count: u32) -> impl Iterator<Item = f32> {
    let step = if count > 1 {
        spread / (count - 1) as f32
    } else {
        0.0
    };
    let start = if count > 1 { center - spread / 2.0 } else { center };
    (0..count).map(move |i| start + step * i as f32)
}

/// Point `distance` away from the agent along `angle`.
pub(crate) fn ahead(ctx: &PhaseCtx<'_>, angle: f32, distance: f32) -> Vec2 {
    ctx.position() + Vec2::from_angle(angle) * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_is_centered_and_inclusive() {
        let angles: Vec<f32> = fan(1.0, 0.4, 5).collect();
        assert_eq!(angles.len(), 5);
        assert!((angles[0] - 0.8).abs() < 1e-5);
        assert!((angles[2] - 1.0).abs() < 1e-5);
        assert!((angles[4] - 1.2).abs() < 1e-5);
    }

    #[test]
    fn fan_of_one_points_at_center() {
        let angles: Vec<f32> = fan(0.3, 1.0, 1).collect();
        assert_eq!(angles, vec![0.3]);
    }
}
