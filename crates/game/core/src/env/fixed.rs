//! In-memory spatial and player collaborator for tests and headless runs.
//!
//! Interior mutability lets callers move targets and obstacles between
//! frames while a [`CombatEnv`](super::CombatEnv) borrows the arena.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::env::{PlayerOracle, SpatialOracle};
use crate::state::{AgentId, TargetId, Timestamp, Vec2};
use crate::targeting::PositionHistory;

#[derive(Clone, Debug)]
struct PlayerRecord {
    id: TargetId,
    position: Vec2,
    history: PositionHistory,
    cloaked: bool,
    decoy: Option<Vec2>,
    shielded: bool,
}

/// Circular obstacle blocking line of sight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pillar {
    pub center: Vec2,
    pub radius: f32,
}

impl Pillar {
    fn blocks(&self, from: Vec2, to: Vec2) -> bool {
        let segment = to - from;
        let length_sq = segment.x * segment.x + segment.y * segment.y;
        let t = if length_sq <= f32::EPSILON {
            0.0
        } else {
            let rel = self.center - from;
            ((rel.x * segment.x + rel.y * segment.y) / length_sq).clamp(0.0, 1.0)
        };
        let closest = from + segment * t;
        closest.distance(self.center) < self.radius
    }
}

#[derive(Debug, Default)]
struct Inner {
    players: Vec<PlayerRecord>,
    default_target: Option<TargetId>,
    pillars: Vec<Pillar>,
    occupants: Vec<(AgentId, Vec2)>,
}

/// In-memory arena implementing [`SpatialOracle`] and [`PlayerOracle`].
#[derive(Debug, Default)]
pub struct FixedArena {
    inner: RwLock<Inner>,
}

impl FixedArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena with a single player at `position` who is the default target.
    pub fn with_player(position: Vec2) -> Self {
        let arena = Self::new();
        arena.add_player(TargetId::PLAYER, position);
        arena
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a player. The first one added becomes the default target.
    pub fn add_player(&self, id: TargetId, position: Vec2) {
        let mut inner = self.write();
        let mut history = PositionHistory::new();
        history.record(Timestamp::ZERO, position);
        inner.players.push(PlayerRecord {
            id,
            position,
            history,
            cloaked: false,
            decoy: None,
            shielded: false,
        });
        if inner.default_target.is_none() {
            inner.default_target = Some(id);
        }
    }

    pub fn remove_player(&self, id: TargetId) {
        let mut inner = self.write();
        inner.players.retain(|player| player.id != id);
        if inner.default_target == Some(id) {
            inner.default_target = inner.players.first().map(|player| player.id);
        }
    }

    /// Moves a player and records the sample in its position history.
    pub fn move_player(&self, id: TargetId, position: Vec2, at: Timestamp) {
        let mut inner = self.write();
        if let Some(player) = inner.players.iter_mut().find(|player| player.id == id) {
            player.position = position;
            player.history.record(at, position);
        }
    }

    pub fn set_cloak(&self, id: TargetId, cloaked: bool, decoy: Option<Vec2>) {
        let mut inner = self.write();
        if let Some(player) = inner.players.iter_mut().find(|player| player.id == id) {
            player.cloaked = cloaked;
            player.decoy = decoy;
        }
    }

    pub fn set_shield(&self, id: TargetId, shielded: bool) {
        let mut inner = self.write();
        if let Some(player) = inner.players.iter_mut().find(|player| player.id == id) {
            player.shielded = shielded;
        }
    }

    pub fn add_pillar(&self, center: Vec2, radius: f32) {
        self.write().pillars.push(Pillar { center, radius });
    }

    /// Replaces the set of agent positions answered by radius queries.
    pub fn set_occupants(&self, occupants: impl IntoIterator<Item = (AgentId, Vec2)>) {
        let mut inner = self.write();
        inner.occupants.clear();
        inner.occupants.extend(occupants);
    }

    pub fn player_position(&self, id: TargetId) -> Option<Vec2> {
        self.read()
            .players
            .iter()
            .find(|player| player.id == id)
            .map(|player| player.position)
    }
}

impl SpatialOracle for FixedArena {
    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        !self.read().pillars.iter().any(|pillar| pillar.blocks(from, to))
    }

    fn entities_within_radius(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        self.read()
            .occupants
            .iter()
            .filter(|(_, position)| position.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl PlayerOracle for FixedArena {
    fn default_target(&self) -> Option<TargetId> {
        self.read().default_target
    }

    fn position(&self, id: TargetId) -> Option<Vec2> {
        self.player_position(id)
    }

    fn position_at(&self, id: TargetId, at: Timestamp) -> Option<Vec2> {
        self.read()
            .players
            .iter()
            .find(|player| player.id == id)
            .and_then(|player| player.history.sample_nearest(at))
    }

    fn is_cloaked(&self, id: TargetId) -> bool {
        self.read()
            .players
            .iter()
            .any(|player| player.id == id && player.cloaked)
    }

    fn decoy(&self, id: TargetId) -> Option<Vec2> {
        self.read()
            .players
            .iter()
            .find(|player| player.id == id)
            .and_then(|player| player.decoy)
    }

    fn is_shielded(&self, id: TargetId) -> bool {
        self.read()
            .players
            .iter()
            .any(|player| player.id == id && player.shielded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pillar_blocks_line_of_sight_only_when_crossed() {
        let arena = FixedArena::new();
        arena.add_pillar(Vec2::new(50.0, 0.0), 10.0);

        assert!(!arena.line_of_sight(Vec2::ZERO, Vec2::new(100.0, 0.0)));
        assert!(arena.line_of_sight(Vec2::ZERO, Vec2::new(0.0, 100.0)));
    }

    #[test]
    fn removing_default_target_falls_back_to_next_player() {
        let arena = FixedArena::with_player(Vec2::ZERO);
        arena.add_player(TargetId(2), Vec2::new(5.0, 5.0));

        arena.remove_player(TargetId::PLAYER);

        assert_eq!(arena.default_target(), Some(TargetId(2)));
        assert_eq!(arena.position(TargetId::PLAYER), None);
    }

    #[test]
    fn lagged_sample_comes_from_history() {
        let arena = FixedArena::with_player(Vec2::ZERO);
        arena.move_player(TargetId::PLAYER, Vec2::new(100.0, 0.0), Timestamp(300));
        arena.move_player(TargetId::PLAYER, Vec2::new(200.0, 0.0), Timestamp(600));

        assert_eq!(
            arena.position_at(TargetId::PLAYER, Timestamp(320)),
            Some(Vec2::new(100.0, 0.0))
        );
        assert_eq!(arena.position(TargetId::PLAYER), Some(Vec2::new(200.0, 0.0)));
    }
}
