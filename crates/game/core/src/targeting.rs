//! Target acquisition and time-lagged aiming.
//!
//! Agents only ever hold a weak [`TargetRef`]. Every resolution goes through
//! the [`PlayerOracle`]; a target that no longer resolves is replaced with the
//! oracle's default target, and a cloaked target is swapped for its decoy.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::env::PlayerOracle;
use crate::state::{Agent, TargetRef, Timestamp, Vec2};

/// Fixed-size ring buffer of recent `(timestamp, position)` samples.
///
/// Maintained by the player/movement collaborator; the engine only samples it
/// through [`PlayerOracle::position_at`].
#[derive(Clone, Debug, Default)]
pub struct PositionHistory {
    samples: ArrayVec<(Timestamp, Vec2), { CombatConfig::HISTORY_CAPACITY }>,
    /// Index of the oldest sample once the buffer is full.
    head: usize,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Records a sample, overwriting the oldest one when full.
    pub fn record(&mut self, at: Timestamp, position: Vec2) {
        if self.samples.is_full() {
            self.samples[self.head] = (at, position);
            self.head = (self.head + 1) % self.samples.len();
        } else {
            self.samples.push((at, position));
        }
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<(Timestamp, Vec2)> {
        if self.samples.is_empty() {
            return None;
        }
        let newest = if self.samples.is_full() {
            (self.head + self.samples.len() - 1) % self.samples.len()
        } else {
            self.samples.len() - 1
        };
        Some(self.samples[newest])
    }

    /// Sample whose timestamp is nearest `at`. Ties prefer the older sample.
    pub fn sample_nearest(&self, at: Timestamp) -> Option<Vec2> {
        self.samples
            .iter()
            .min_by_key(|(stamp, _)| (stamp.as_millis().abs_diff(at.as_millis()), *stamp))
            .map(|(_, position)| *position)
    }
}

/// Resolves agent targets against the player collaborator.
pub struct TargetResolver;

impl TargetResolver {
    /// Current aim point of the agent's target.
    ///
    /// Re-acquires the default target when the cached one is stale and
    /// refreshes `last_known` on success. Returns `None` only when no target
    /// exists at all.
    pub fn resolve(agent: &mut Agent, players: &dyn PlayerOracle) -> Option<Vec2> {
        let target = Self::acquire(agent, players)?;
        if players.is_cloaked(target.id) {
            return Some(players.decoy(target.id).unwrap_or(target.last_known));
        }
        let position = players.position(target.id)?;
        if let Some(cached) = agent.target.as_mut() {
            cached.last_known = position;
        }
        Some(position)
    }

    /// Where the target was `lag_ms` ago, sampled from its position history.
    ///
    /// Falls back to [`TargetResolver::resolve`] when no history exists or the
    /// target is cloaked.
    pub fn resolve_lagged(
        agent: &mut Agent,
        players: &dyn PlayerOracle,
        now: Timestamp,
        lag_ms: u32,
    ) -> Option<Vec2> {
        let current = Self::resolve(agent, players)?;
        let Some(target) = agent.target else {
            return Some(current);
        };
        if players.is_cloaked(target.id) {
            return Some(current);
        }
        Some(
            players
                .position_at(target.id, now.before(lag_ms))
                .unwrap_or(current),
        )
    }

    fn acquire(agent: &mut Agent, players: &dyn PlayerOracle) -> Option<TargetRef> {
        if let Some(target) = agent.target
            && players.position(target.id).is_some()
        {
            return Some(target);
        }

        let stale = agent.target.take();
        let id = players.default_target()?;
        let position = players.position(id)?;
        if let Some(stale) = stale {
            tracing::debug!(agent = %agent.id, stale = %stale.id, target = %id, "re-acquired target");
        }
        let target = TargetRef {
            id,
            last_known: position,
        };
        agent.target = Some(target);
        Some(target)
    }
}
