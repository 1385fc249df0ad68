/// Combat configuration constants and tunable parameters.
///
/// Runtime-tunable values are plain fields so they can be loaded from TOML;
/// capacities used as type parameters are associated constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub status: StatusConfig,
    /// Knockback impulses pre-empt state-machine velocity for this long.
    pub knockback_hold_ms: u32,
    /// Toxin re-rolls a ranged agent's heading every `min..=max` ms.
    pub toxin_wander_min_ms: u32,
    pub toxin_wander_max_ms: u32,
    /// Global multiplier applied to summoned agents' stats.
    pub summon_stat_scale: f32,
    /// Per-source scaling of incoming buildup.
    pub buildup_sources: BuildupSourceScales,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_ABILITIES: usize = 4;
    /// Children (mines, drones, turrets, healers) tracked per owner.
    pub const MAX_CHILDREN: usize = 16;
    /// Samples kept in a target's position history.
    pub const HISTORY_CAPACITY: usize = 64;
    /// Bound on chained zero-length phase transitions within one tick.
    pub const MAX_TRANSITIONS_PER_TICK: usize = 8;
    /// Bound on status sub-ticks processed in one call.
    pub const MAX_STATUS_SUBTICKS: u32 = 64;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_KNOCKBACK_HOLD_MS: u32 = 1_000;

    pub fn new() -> Self {
        Self {
            status: StatusConfig::default(),
            knockback_hold_ms: Self::DEFAULT_KNOCKBACK_HOLD_MS,
            toxin_wander_min_ms: 300,
            toxin_wander_max_ms: 700,
            summon_stat_scale: 1.0,
            buildup_sources: BuildupSourceScales::default(),
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Status-effect timings and damage rates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatusConfig {
    pub ignite_duration_ms: u32,
    pub toxin_duration_ms: u32,
    pub stun_duration_ms: u32,
    pub ignite_dps: f32,
    pub toxin_dps: f32,
    /// Damage sub-tick period (10 Hz).
    pub tick_interval_ms: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            ignite_duration_ms: 2_000,
            toxin_duration_ms: 2_000,
            stun_duration_ms: 200,
            ignite_dps: 30.0,
            toxin_dps: 3.0,
            tick_interval_ms: 100,
        }
    }
}

/// Origin of an incoming buildup amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BuildupSource {
    #[default]
    Weapon,
    Ability,
    Environment,
    Explosion,
}

/// Multipliers applied to buildup by source. `1.0` everywhere by default.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildupSourceScales {
    pub weapon: f32,
    pub ability: f32,
    pub environment: f32,
    pub explosion: f32,
}

impl BuildupSourceScales {
    pub fn scale(&self, source: BuildupSource) -> f32 {
        match source {
            BuildupSource::Weapon => self.weapon,
            BuildupSource::Ability => self.ability,
            BuildupSource::Environment => self.environment,
            BuildupSource::Explosion => self.explosion,
        }
    }
}

impl Default for BuildupSourceScales {
    fn default() -> Self {
        Self {
            weapon: 1.0,
            ability: 1.0,
            environment: 1.0,
            explosion: 1.0,
        }
    }
}
