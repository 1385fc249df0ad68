//! Ability runtime records.
//!
//! # Design
//!
//! - Cooldowns are absolute timestamps set when an ability *begins*
//! - Each ability owns a [`MachineState`] driven by its own phase table
//! - The stage (`channeling → active → recovering → idle`) is derived from
//!   the phase the ability is in, and exposed read-only for HUD/telegraphs

use arrayvec::ArrayVec;
use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::behavior::{MachineState, PhaseTag};
use crate::config::CombatConfig;
use crate::state::Timestamp;

/// Closed set of abilities available to boss archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AbilityId {
    // Brawler
    PerpendicularDash,
    AssaultCombo,
    HealSummon,
    // Heavy gunner
    Bombardment,
    TurretSummon,
    // Evasive caster
    Teleport,
    PhaseBombs,
    DroneSummon,
}

impl AbilityId {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Coarse lifecycle stage of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AbilityStage {
    #[default]
    Idle,
    /// Frozen and telegraphed; holds the movement lock.
    Channeling,
    /// Attacking or spawning.
    Active,
    /// Movement allowed, primary cycle still suppressed.
    Recovering,
}

/// Runtime state of one ability slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityRuntime {
    pub id: AbilityId,
    /// The ability may not begin again before this instant.
    pub cooldown_until: Timestamp,
    pub stage: AbilityStage,
    pub machine: MachineState,
}

impl AbilityRuntime {
    /// Creates an idle slot that becomes ready at `ready_at`.
    pub fn new(id: AbilityId, ready_at: Timestamp) -> Self {
        Self {
            id,
            cooldown_until: ready_at,
            stage: AbilityStage::Idle,
            machine: MachineState::idle(ready_at),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.stage == AbilityStage::Idle
    }

    pub fn cooled_down(&self, now: Timestamp) -> bool {
        now >= self.cooldown_until
    }

    pub fn phase(&self) -> PhaseTag {
        self.machine.tag
    }
}

/// Ability slots of one agent.
pub type AbilitySlots = ArrayVec<AbilityRuntime, { CombatConfig::MAX_ABILITIES }>;
