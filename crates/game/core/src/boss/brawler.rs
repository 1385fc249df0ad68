//! Brawler: a gunner that closes the gap.
//!
//! Primary cycle shoots four-shot bursts at a lagged target position; every
//! fourth cycle is a long aim into a twelve-shot burst and a lockout.
//!
//! ```text
//! idle ─┬─> aim ──────> burst ──────> cooldown ─┐
//!       └─> aim_long ─> burst_long ─> lockout ──┤
//!        ^──────────── branch on cycle count ───┘
//! ```
//!
//! Abilities, in priority order: heal-summon at health thresholds, the
//! assault combo (windup, dash in, one strike, dash out dropping mines) and
//! a shared perpendicular dodge.

use std::f32::consts::{FRAC_PI_2, PI};

use super::{ahead, below_cap, has_target, room_for};
use crate::ability::AbilitySpec;
use crate::behavior::archetypes::{chase, lock_aim};
use crate::behavior::{
    Blueprint, InterruptResponse, Movement, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTag, Timing,
};
use crate::state::{
    AbilityId, AbilityStage, Agent, Archetype, Latches, ProjectileFlags, ProjectileKind,
    TelegraphShape, Vec2,
};

// ===== primary cycle =====
pub const AIM_MS: u32 = 1_000;
pub const BURST_MS: u32 = 1_000;
pub const BURST_SHOTS: u32 = 4;
pub const SHOT_GAP_MS: u32 = 250;
pub const COOLDOWN_MS: u32 = 1_500;
pub const AIM_LONG_MS: u32 = 1_500;
pub const BURST_LONG_MS: u32 = 3_000;
pub const BURST_LONG_SHOTS: u32 = 12;
pub const LOCKOUT_MS: u32 = 3_000;
/// Every n-th cycle is the long variant.
pub const LONG_CYCLE_EVERY: u32 = 4;
/// Shots lead to where the target was this long ago.
pub const AIM_LAG_MS: u32 = 300;

// ===== heal summon =====
pub const HEAL_THRESHOLD_1: f32 = 0.66;
pub const HEAL_THRESHOLD_2: f32 = 0.33;
pub const HEALER_CAP: usize = 2;
pub const CALL_MS: u32 = 800;
pub const SUMMON_MS: u32 = 1_200;
pub const SUMMON_DELAY_MS: u32 = 1_000;
pub const HEAL_SUMMON_COOLDOWN_MS: u32 = 1_000;

// ===== assault combo =====
pub const ASSAULT_COOLDOWN_MS: u32 = 20_000;
pub const ASSAULT_WARMUP_MS: u32 = 4_000;
pub const ASSAULT_RANGE: f32 = 450.0;
pub const ASSAULT_WINDUP_MS: u32 = 2_000;
pub const DASH_IN_MAX_MS: u32 = 1_000;
pub const DASH_IN_SPEED_SCALE: f32 = 4.0;
pub const MELEE_MS: u32 = 250;
pub const DASH_OUT_MS: u32 = 900;
pub const DASH_OUT_SPEED_SCALE: f32 = 3.0;
pub const MINES: u32 = 3;
pub const FIRST_MINE_MS: u32 = 150;
pub const MINE_GAP_MS: u32 = 300;
pub const ASSAULT_RECOVER_MS: u32 = 2_000;

// ===== perpendicular dash =====
pub const DODGE_COOLDOWN_MS: u32 = 3_000;
pub const DODGE_MS: u32 = 350;
pub const DODGE_SPEED_SCALE: f32 = 3.0;

const AIM_LINE: TelegraphShape = TelegraphShape::Line {
    length: 600.0,
    width: 6.0,
};
const CYCLE: &[PhaseTag] = &[PhaseTag::Aim, PhaseTag::AimLong];

static PRIMARY: [PhaseSpec; 7] = [
    PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(0)).branch(CYCLE, next_cycle),
    PhaseSpec::new(PhaseTag::Aim, Timing::Fixed(AIM_MS))
        .movement(Movement::Hold)
        .telegraph(AIM_LINE)
        .on_enter(begin_cycle)
        .on_tick(track_lagged)
        .then(PhaseTag::Burst),
    PhaseSpec::new(PhaseTag::Burst, Timing::Fixed(BURST_MS))
        .movement(Movement::Hold)
        .on_tick(burst)
        .then(PhaseTag::Cooldown),
    PhaseSpec::new(PhaseTag::Cooldown, Timing::Fixed(COOLDOWN_MS)).branch(CYCLE, next_cycle),
    PhaseSpec::new(PhaseTag::AimLong, Timing::Fixed(AIM_LONG_MS))
        .movement(Movement::Hold)
        .telegraph(AIM_LINE)
        .on_enter(begin_cycle)
        .on_tick(track_lagged)
        .then(PhaseTag::BurstLong),
    PhaseSpec::new(PhaseTag::BurstLong, Timing::Fixed(BURST_LONG_MS))
        .movement(Movement::Hold)
        .on_tick(long_burst)
        .then(PhaseTag::Lockout),
    PhaseSpec::new(PhaseTag::Lockout, Timing::Fixed(LOCKOUT_MS)).branch(CYCLE, next_cycle),
];

static HEAL_SUMMON: [PhaseSpec; 2] = [
    PhaseSpec::new(PhaseTag::Call, Timing::Fixed(CALL_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Circle { radius: 80.0 })
        .on_enter(latch_threshold)
        .then(PhaseTag::Summon),
    PhaseSpec::new(PhaseTag::Summon, Timing::Fixed(SUMMON_MS))
        .movement(Movement::Frozen)
        .on_tick(summon_healers)
        .then(PhaseTag::Idle),
];

const UNSTOPPABLE: InterruptResponse = InterruptResponse::Ignore;

static ASSAULT: [PhaseSpec; 5] = [
    PhaseSpec::new(PhaseTag::Windup, Timing::Fixed(ASSAULT_WINDUP_MS))
        .stage(AbilityStage::Channeling)
        .movement(Movement::Frozen)
        .telegraph(TelegraphShape::Arc {
            radius: 140.0,
            spread: 1.0,
        })
        .on_enter(lock_aim)
        .on_knockback(UNSTOPPABLE)
        .then(PhaseTag::DashIn),
    PhaseSpec::new(
        PhaseTag::DashIn,
        Timing::UntilCondition {
            min_ms: 0,
            max_ms: Some(DASH_IN_MAX_MS),
        },
    )
    .movement(Movement::Scripted)
    .on_tick(dash_in)
    .on_knockback(UNSTOPPABLE)
    .then(PhaseTag::Melee),
    PhaseSpec::new(PhaseTag::Melee, Timing::Fixed(MELEE_MS))
        .movement(Movement::Frozen)
        .on_enter(slam)
        .on_knockback(UNSTOPPABLE)
        .on_shield_block(InterruptResponse::AbortTo(PhaseTag::DashOut))
        .then(PhaseTag::DashOut),
    PhaseSpec::new(PhaseTag::DashOut, Timing::Fixed(DASH_OUT_MS))
        .movement(Movement::Scripted)
        .on_enter(turn_away)
        .on_tick(dash_out)
        .on_knockback(UNSTOPPABLE)
        .then(PhaseTag::Recover),
    PhaseSpec::new(PhaseTag::Recover, Timing::Fixed(ASSAULT_RECOVER_MS))
        .stage(AbilityStage::Recovering)
        .then(PhaseTag::Idle),
];

static DODGE: [PhaseSpec; 1] = [PhaseSpec::new(PhaseTag::Dash, Timing::Fixed(DODGE_MS))
    .concurrent()
    .on_enter(pick_side)
    .on_tick(dodge)
    .then(PhaseTag::Idle)];

static ABILITIES: [AbilitySpec; 3] = [
    AbilitySpec::new(
        AbilityId::HealSummon,
        HEAL_SUMMON_COOLDOWN_MS,
        needs_healers,
        &HEAL_SUMMON,
    ),
    AbilitySpec::new(
        AbilityId::AssaultCombo,
        ASSAULT_COOLDOWN_MS,
        target_close,
        &ASSAULT,
    )
    .warmup(ASSAULT_WARMUP_MS),
    AbilitySpec::new(
        AbilityId::PerpendicularDash,
        DODGE_COOLDOWN_MS,
        free_to_dodge,
        &DODGE,
    )
    .warmup(DODGE_COOLDOWN_MS)
    .shared(),
];

pub fn blueprint() -> Blueprint {
    Blueprint {
        archetype: Archetype::Brawler,
        primary: &PRIMARY,
        abilities: &ABILITIES,
        locomotion: chase,
        sensor: None,
    }
}

// ============================================================================
// Primary cycle
// ============================================================================

fn next_cycle(agent: &Agent) -> usize {
    usize::from((agent.blackboard.cycles + 1) % LONG_CYCLE_EVERY == 0)
}

fn begin_cycle(ctx: &mut PhaseCtx<'_>) {
    ctx.agent.blackboard.cycles += 1;
    aim_lagged(ctx);
}

fn aim_lagged(ctx: &mut PhaseCtx<'_>) -> f32 {
    match ctx.lagged_target(AIM_LAG_MS) {
        Some(point) => ctx.aim_at(point),
        None => ctx.agent.blackboard.aim,
    }
}

fn track_lagged(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    aim_lagged(ctx);
    PhaseFlow::Stay
}

fn burst(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    for _ in 0..ctx.cadence(0, SHOT_GAP_MS, BURST_SHOTS) {
        let aim = aim_lagged(ctx);
        ctx.fire(ProjectileKind::Bullet, aim, ProjectileFlags::BLOCKABLE);
    }
    PhaseFlow::Stay
}

fn long_burst(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    for _ in 0..ctx.cadence(0, SHOT_GAP_MS, BURST_LONG_SHOTS) {
        let aim = aim_lagged(ctx);
        ctx.fire(ProjectileKind::Bullet, aim, ProjectileFlags::BLOCKABLE);
    }
    PhaseFlow::Stay
}

// ============================================================================
// Heal summon
// ============================================================================

fn needs_healers(ctx: &mut PhaseCtx<'_>) -> bool {
    let fraction = ctx.agent.health.fraction();
    let latches = ctx.agent.blackboard.latches;
    let crossed = (fraction <= HEAL_THRESHOLD_1 && !latches.contains(Latches::HEAL_THRESHOLD_1))
        || (fraction <= HEAL_THRESHOLD_2 && !latches.contains(Latches::HEAL_THRESHOLD_2));
    crossed && below_cap(ctx, Archetype::Healer, HEALER_CAP)
}

fn latch_threshold(ctx: &mut PhaseCtx<'_>) {
    let fraction = ctx.agent.health.fraction();
    let latches = &mut ctx.agent.blackboard.latches;
    if fraction <= HEAL_THRESHOLD_1 {
        latches.insert(Latches::HEAL_THRESHOLD_1);
    }
    if fraction <= HEAL_THRESHOLD_2 {
        latches.insert(Latches::HEAL_THRESHOLD_2);
    }
}

fn summon_healers(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    if ctx.cadence(SUMMON_DELAY_MS, 1, 1) > 0 {
        for i in 0..room_for(ctx, Archetype::Healer, HEALER_CAP) {
            let position = ahead(ctx, PI * i as f32, 80.0);
            ctx.spawn(Archetype::Healer, position, 1.0);
        }
    }
    PhaseFlow::Stay
}

// ============================================================================
// Assault combo
// ============================================================================

fn target_close(ctx: &mut PhaseCtx<'_>) -> bool {
    ctx.target_distance()
        .is_some_and(|distance| distance <= ASSAULT_RANGE)
}

fn dash_in(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    let Some(target) = ctx.target() else {
        return PhaseFlow::Advance;
    };
    ctx.aim_at(target);
    let offset = target - ctx.position();
    if offset.length() <= ctx.agent.stats.melee_range {
        return PhaseFlow::Advance;
    }
    let speed = ctx.agent.stats.move_speed * DASH_IN_SPEED_SCALE;
    ctx.steer(offset.normalized() * speed);
    PhaseFlow::Stay
}

fn slam(ctx: &mut PhaseCtx<'_>) {
    let aim = ctx.aim_at_target();
    let reach = ctx.agent.stats.melee_range * 1.5;
    ctx.strike(aim, reach);
}

fn turn_away(ctx: &mut PhaseCtx<'_>) {
    let away = ctx.agent.blackboard.aim + PI;
    ctx.agent.blackboard.heading = Vec2::from_angle(away);
}

fn dash_out(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    let speed = ctx.agent.stats.move_speed * DASH_OUT_SPEED_SCALE;
    let heading = ctx.agent.blackboard.heading;
    ctx.steer(heading * speed);
    for _ in 0..ctx.cadence(FIRST_MINE_MS, MINE_GAP_MS, MINES) {
        let position = ctx.position();
        ctx.spawn(Archetype::Mine, position, 1.0);
    }
    PhaseFlow::Stay
}

// ============================================================================
// Perpendicular dash
// ============================================================================

fn free_to_dodge(ctx: &mut PhaseCtx<'_>) -> bool {
    ctx.agent.lock_holder().is_none() && has_target(ctx)
}

fn pick_side(ctx: &mut PhaseCtx<'_>) {
    let toward = ctx.aim_at_target();
    let side = if ctx.coin(0) { FRAC_PI_2 } else { -FRAC_PI_2 };
    ctx.agent.blackboard.heading = Vec2::from_angle(toward + side);
}

fn dodge(ctx: &mut PhaseCtx<'_>) -> PhaseFlow {
    let speed = ctx.agent.stats.move_speed * DODGE_SPEED_SCALE;
    let heading = ctx.agent.blackboard.heading;
    ctx.steer(heading * speed);
    PhaseFlow::Stay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::ArchetypeProfile;
    use crate::state::{AgentId, Timestamp};

    #[test]
    fn tables_validate() {
        let profile = ArchetypeProfile::build(blueprint()).expect("brawler tables");
        assert_eq!(profile.abilities.len(), 3);
        assert_eq!(profile.abilities[0].spec.id, AbilityId::HealSummon);
        assert!(!profile.abilities[2].spec.exclusive);
    }

    #[test]
    fn every_fourth_cycle_is_long() {
        let profile = ArchetypeProfile::build(blueprint()).expect("brawler tables");
        let template = crate::env::AgentTemplate::builtin(Archetype::Brawler);
        let mut agent = Agent::new(
            AgentId::new(0, 0),
            Archetype::Brawler,
            &template,
            Vec2::ZERO,
            1.0,
            Timestamp::ZERO,
        );
        let idle = profile.primary.entry();
        let picks: Vec<PhaseTag> = (0..8)
            .map(|_| {
                let tag = idle.next.resolve(&agent);
                agent.blackboard.cycles += 1;
                tag
            })
            .collect();
        assert_eq!(picks[3], PhaseTag::AimLong);
        assert_eq!(picks[7], PhaseTag::AimLong);
        assert_eq!(
            picks.iter().filter(|tag| **tag == PhaseTag::Aim).count(),
            6
        );
    }
}
