//! Traits describing the collaborators the engine reads from.
//!
//! Oracles expose spatial queries, player/target state, archetype templates
//! and randomness. The [`CombatEnv`] aggregate bundles them so the engine can
//! access everything it needs without coupling to concrete implementations.
mod error;
pub mod fixed;
mod rng;
mod templates;

pub use error::OracleError;
pub use fixed::FixedArena;
pub use rng::{PcgRng, RngOracle, compute_seed};
pub use templates::{AgentTemplate, BuiltinTemplates, TemplateOracle};

use crate::config::CombatConfig;
use crate::state::{AgentId, TargetId, Timestamp, Vec2};

/// Physics/spatial collaborator.
///
/// Queries must be bounded by the entities inside the requested radius;
/// the engine never scans the whole arena itself.
pub trait SpatialOracle: Send + Sync {
    fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        a.distance(b)
    }

    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool;

    fn entities_within_radius(&self, center: Vec2, radius: f32) -> Vec<AgentId>;
}

/// Player/movement collaborator: the things agents target.
pub trait PlayerOracle: Send + Sync {
    /// Target newly spawned agents acquire, and stale targets fall back to.
    fn default_target(&self) -> Option<TargetId>;

    /// Current position, or `None` if the target no longer exists.
    fn position(&self, id: TargetId) -> Option<Vec2>;

    /// Position-history sample recorded nearest to `at`.
    fn position_at(&self, id: TargetId, at: Timestamp) -> Option<Vec2>;

    fn is_cloaked(&self, id: TargetId) -> bool;

    /// Decoy agents aim at while the real target is cloaked.
    fn decoy(&self, id: TargetId) -> Option<Vec2>;

    /// Whether a melee strike against the target is blocked by a shield.
    fn is_shielded(&self, id: TargetId) -> bool;
}

/// Read-only collaborators and tuning for one engine call.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub spatial: &'a dyn SpatialOracle,
    pub players: &'a dyn PlayerOracle,
    pub templates: &'a dyn TemplateOracle,
    pub rng: &'a dyn RngOracle,
    pub config: &'a CombatConfig,
    /// Arena seed mixed into every random draw.
    pub seed: u64,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        spatial: &'a dyn SpatialOracle,
        players: &'a dyn PlayerOracle,
        templates: &'a dyn TemplateOracle,
        rng: &'a dyn RngOracle,
        config: &'a CombatConfig,
    ) -> Self {
        Self {
            spatial,
            players,
            templates,
            rng,
            config,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Deterministic seed for one random draw.
    pub fn seed_for(&self, now: Timestamp, agent: AgentId, context: u32) -> u64 {
        compute_seed(self.seed, now, agent, context)
    }
}

impl std::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("config", self.config)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
