//! Status-effect accumulation and periodic ticking.
//!
//! # Rules
//!
//! - Buildup clamps to `0..=BUILDUP_MAX`; reaching the max triggers the
//!   effect and resets buildup to exactly zero in the same call
//! - A trigger opens (or refreshes) an activity window of the configured
//!   duration
//! - Damage-over-time runs at a fixed sub-rate and carries the fractional
//!   remainder, so low rates still deal damage
//!
//! These functions only mutate the [`StatusTracks`] of one agent. Applying
//! damage, raising the stun interrupt and emitting events is the engine's job.

use crate::config::{CombatConfig, StatusConfig};
use crate::state::{BUILDUP_MAX, StatusKind, StatusTrack, StatusTracks, Timestamp};

/// Result of adding buildup to one track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BuildupOutcome {
    /// Buildup changed but stayed below the trigger threshold.
    Accumulated { buildup: f32 },
    /// Threshold reached: the effect is active until `active_until`.
    Triggered { active_until: Timestamp },
}

impl BuildupOutcome {
    pub fn triggered(&self) -> bool {
        matches!(self, BuildupOutcome::Triggered { .. })
    }
}

fn duration_ms(config: &StatusConfig, kind: StatusKind) -> u32 {
    match kind {
        StatusKind::Ignite => config.ignite_duration_ms,
        StatusKind::Toxin => config.toxin_duration_ms,
        StatusKind::Stun => config.stun_duration_ms,
    }
}

fn damage_per_second(config: &StatusConfig, kind: StatusKind) -> f32 {
    match kind {
        StatusKind::Ignite => config.ignite_dps,
        StatusKind::Toxin => config.toxin_dps,
        StatusKind::Stun => 0.0,
    }
}

/// Adds `amount` of buildup to one track at `now`.
///
/// Non-finite amounts are ignored. Negative amounts drain buildup and never
/// push it below zero.
pub fn apply_buildup(
    tracks: &mut StatusTracks,
    kind: StatusKind,
    amount: f32,
    config: &CombatConfig,
    now: Timestamp,
) -> BuildupOutcome {
    let track = tracks.get_mut(kind);
    if !amount.is_finite() {
        return BuildupOutcome::Accumulated {
            buildup: track.buildup,
        };
    }

    let buildup = (track.buildup + amount).clamp(0.0, BUILDUP_MAX);
    if buildup < BUILDUP_MAX {
        track.buildup = buildup;
        return BuildupOutcome::Accumulated { buildup };
    }

    trigger(track, &config.status, kind, now)
}

fn trigger(
    track: &mut StatusTrack,
    config: &StatusConfig,
    kind: StatusKind,
    now: Timestamp,
) -> BuildupOutcome {
    let was_active = track.is_active(now);
    let active_until = now.after(duration_ms(config, kind));
    track.buildup = 0.0;
    track.active_until = Some(active_until);
    if !was_active {
        track.next_tick_at = now.after(config.tick_interval_ms.max(1));
        track.carry = 0.0;
    }
    BuildupOutcome::Triggered { active_until }
}

/// Whole damage points produced by one status tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusDamage {
    pub ignite: u32,
    pub toxin: u32,
}

impl StatusDamage {
    pub fn total(&self) -> u32 {
        self.ignite.saturating_add(self.toxin)
    }
}

/// Runs every damage sub-tick due by `now`.
///
/// Sub-ticks fall on `trigger + k * interval` up to and including the end of
/// the window. At most [`CombatConfig::MAX_STATUS_SUBTICKS`] are processed per
/// call; older backlog is dropped.
pub fn tick(tracks: &mut StatusTracks, config: &CombatConfig, now: Timestamp) -> StatusDamage {
    StatusDamage {
        ignite: tick_track(tracks.get_mut(StatusKind::Ignite), &config.status, StatusKind::Ignite, now),
        toxin: tick_track(tracks.get_mut(StatusKind::Toxin), &config.status, StatusKind::Toxin, now),
    }
}

fn tick_track(
    track: &mut StatusTrack,
    config: &StatusConfig,
    kind: StatusKind,
    now: Timestamp,
) -> u32 {
    let Some(until) = track.active_until else {
        return 0;
    };
    let interval = config.tick_interval_ms.max(1);
    let per_tick = damage_per_second(config, kind) * interval as f32 / 1_000.0;

    let mut subticks = 0;
    while track.next_tick_at <= now && track.next_tick_at <= until {
        if subticks == CombatConfig::MAX_STATUS_SUBTICKS {
            tracing::debug!(?kind, "status backlog dropped");
            track.next_tick_at = now.after(interval);
            break;
        }
        track.carry += per_tick;
        track.next_tick_at = track.next_tick_at.after(interval);
        subticks += 1;
    }

    let whole = track.carry.floor();
    track.carry -= whole;
    whole as u32
}

/// Active-until instant of one track, if currently active.
pub fn active_until(tracks: &StatusTracks, kind: StatusKind, now: Timestamp) -> Option<Timestamp> {
    let track = tracks.get(kind);
    track.active_until.filter(|_| track.is_active(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CombatConfig {
        CombatConfig::default()
    }

    #[test]
    fn buildup_clamps_and_resets_on_trigger() {
        let mut tracks = StatusTracks::default();
        let config = config();

        assert_eq!(
            apply_buildup(&mut tracks, StatusKind::Ignite, 6.0, &config, Timestamp(0)),
            BuildupOutcome::Accumulated { buildup: 6.0 }
        );
        let outcome = apply_buildup(&mut tracks, StatusKind::Ignite, 7.5, &config, Timestamp(40));

        assert_eq!(
            outcome,
            BuildupOutcome::Triggered {
                active_until: Timestamp(2_040)
            }
        );
        assert_eq!(tracks.buildup(StatusKind::Ignite), 0.0);
        assert!(tracks.is_active(StatusKind::Ignite, Timestamp(2_039)));
        assert!(!tracks.is_active(StatusKind::Ignite, Timestamp(2_040)));
    }

    #[test]
    fn negative_and_non_finite_amounts_stay_in_bounds() {
        let mut tracks = StatusTracks::default();
        let config = config();

        apply_buildup(&mut tracks, StatusKind::Toxin, -3.0, &config, Timestamp(0));
        assert_eq!(tracks.buildup(StatusKind::Toxin), 0.0);
        apply_buildup(&mut tracks, StatusKind::Toxin, f32::NAN, &config, Timestamp(0));
        assert_eq!(tracks.buildup(StatusKind::Toxin), 0.0);
        apply_buildup(&mut tracks, StatusKind::Toxin, f32::INFINITY, &config, Timestamp(0));
        assert_eq!(tracks.buildup(StatusKind::Toxin), 0.0);
    }

    #[test]
    fn stun_window_is_short() {
        let mut tracks = StatusTracks::default();
        let outcome = apply_buildup(&mut tracks, StatusKind::Stun, 10.0, &config(), Timestamp(500));
        assert_eq!(
            outcome,
            BuildupOutcome::Triggered {
                active_until: Timestamp(700)
            }
        );
    }

    #[test]
    fn ignite_deals_full_window_damage() {
        let mut tracks = StatusTracks::default();
        let config = config();
        apply_buildup(&mut tracks, StatusKind::Ignite, 10.0, &config, Timestamp(0));

        let mut dealt = 0;
        for frame in 1..=150 {
            dealt += tick(&mut tracks, &config, Timestamp(frame * 16)).ignite;
        }

        // 30 dps over a 2 s window.
        assert_eq!(dealt, 60);
    }

    #[test]
    fn toxin_carries_fractional_damage() {
        let mut tracks = StatusTracks::default();
        let config = config();
        apply_buildup(&mut tracks, StatusKind::Toxin, 10.0, &config, Timestamp(0));

        // 0.3 per sub-tick: nothing whole after three sub-ticks, one point after four.
        assert_eq!(tick(&mut tracks, &config, Timestamp(300)).toxin, 0);
        assert_eq!(tick(&mut tracks, &config, Timestamp(400)).toxin, 1);

        let rest: u32 = (5..=20)
            .map(|step| tick(&mut tracks, &config, Timestamp(step * 100)).toxin)
            .sum();
        assert_eq!(1 + rest, 6);
    }

    #[test]
    fn retrigger_refreshes_window_without_resetting_cadence() {
        let mut tracks = StatusTracks::default();
        let config = config();
        apply_buildup(&mut tracks, StatusKind::Ignite, 10.0, &config, Timestamp(0));
        tick(&mut tracks, &config, Timestamp(150));
        let next = tracks.get(StatusKind::Ignite).next_tick_at;

        apply_buildup(&mut tracks, StatusKind::Ignite, 10.0, &config, Timestamp(150));

        assert_eq!(tracks.get(StatusKind::Ignite).next_tick_at, next);
        assert_eq!(
            active_until(&tracks, StatusKind::Ignite, Timestamp(150)),
            Some(Timestamp(2_150))
        );
    }
}
