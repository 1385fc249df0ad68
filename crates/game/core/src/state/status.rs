//! Per-agent status accumulators.
//!
//! Every agent carries one track per [`StatusKind`]. Tracks are independent:
//! an agent may be ignited, poisoned and stunned at the same time. The rules
//! that mutate them live in [`crate::status`].

use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::state::Timestamp;

/// Upper bound of every buildup accumulator.
pub const BUILDUP_MAX: f32 = 10.0;

/// Kinds of accumulating status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    /// Fire damage over time.
    Ignite,
    /// Poison damage over time; scrambles ranged movement.
    Toxin,
    /// Short hard crowd control; aborts aims and channels.
    Stun,
}

impl StatusKind {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Accumulator and activity window for one status kind.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct StatusTrack {
    /// Current buildup in `0.0..=BUILDUP_MAX`. Reset to exactly zero on trigger.
    pub buildup: f32,
    /// End of the active window, if the effect has ever triggered.
    pub active_until: Option<Timestamp>,
    /// Next 10 Hz damage sub-tick.
    pub next_tick_at: Timestamp,
    /// Fractional damage carried between sub-ticks.
    pub carry: f32,
}

impl StatusTrack {
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }
}

/// The full set of status tracks for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct StatusTracks {
    tracks: [StatusTrack; StatusKind::COUNT],
}

impl StatusTracks {
    pub fn get(&self, kind: StatusKind) -> &StatusTrack {
        &self.tracks[kind.index()]
    }

    pub fn get_mut(&mut self, kind: StatusKind) -> &mut StatusTrack {
        &mut self.tracks[kind.index()]
    }

    pub fn is_active(&self, kind: StatusKind, now: Timestamp) -> bool {
        self.get(kind).is_active(now)
    }

    pub fn buildup(&self, kind: StatusKind) -> f32 {
        self.get(kind).buildup
    }

    pub fn is_stunned(&self, now: Timestamp) -> bool {
        self.is_active(StatusKind::Stun, now)
    }
}
