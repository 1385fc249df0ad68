//! The per-entity agent record.

use arrayvec::ArrayVec;
use bitflags::bitflags;
use strum::{EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::behavior::MachineState;
use crate::config::CombatConfig;
use crate::env::AgentTemplate;
use crate::state::{
    AbilityId, AbilityRuntime, AbilitySlots, AbilityStage, AgentId, Health, StatusTracks,
    TargetId, Timestamp, Vec2,
};

/// Closed set of agent archetypes.
///
/// Resolved once at spawn; the engine indexes its phase library with it and
/// never re-inspects flags per tick.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
    PartialOrd,
    Ord,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum Archetype {
    // ========================================================================
    // Regular enemies
    // ========================================================================
    Melee,
    Ranged,
    Sniper,
    Turret,

    // ========================================================================
    // Support entities spawned by other agents
    // ========================================================================
    Mine,
    Drone,
    Healer,

    // ========================================================================
    // Training
    // ========================================================================
    /// Records damage instead of losing health; never acts.
    Dummy,

    // ========================================================================
    // Bosses
    // ========================================================================
    Brawler,
    HeavyGunner,
    EvasiveCaster,
}

impl Archetype {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub const fn is_boss(self) -> bool {
        matches!(
            self,
            Archetype::Brawler | Archetype::HeavyGunner | Archetype::EvasiveCaster
        )
    }

    pub const fn is_training(self) -> bool {
        matches!(self, Archetype::Dummy)
    }

    /// Support entities are cleaned up with their owner and drop no loot.
    pub const fn is_support(self) -> bool {
        matches!(self, Archetype::Mine | Archetype::Drone | Archetype::Healer)
    }

    /// Archetypes whose movement toxin scrambles.
    pub const fn is_ranged(self) -> bool {
        matches!(
            self,
            Archetype::Ranged | Archetype::Sniper | Archetype::EvasiveCaster
        )
    }

    /// Archetypes that never move on their own.
    pub const fn is_stationary(self) -> bool {
        matches!(self, Archetype::Turret | Archetype::Mine | Archetype::Dummy)
    }
}

/// Which state machine of an agent owns a resource (movement lock, telegraph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateOwner {
    Primary,
    Ability(AbilityId),
}

/// Lifecycle of an agent inside a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Life {
    #[default]
    Alive,
    /// Health reached zero; on-death hooks run and the agent is removed.
    Dead,
    /// Removed without dying (self-destruct, owner gone, detonated).
    Expired,
}

/// Combat stats resolved from the archetype template at spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentStats {
    pub move_speed: f32,
    pub damage: u32,
    pub projectile_speed: f32,
    pub engage_range: f32,
    pub melee_range: f32,
}

impl AgentStats {
    pub fn from_template(template: &AgentTemplate, stat_scale: f32) -> Self {
        Self {
            move_speed: template.move_speed,
            damage: ((template.damage as f32) * stat_scale).round().max(0.0) as u32,
            projectile_speed: template.projectile_speed,
            engage_range: template.engage_range,
            melee_range: template.melee_range,
        }
    }
}

/// Weak reference to the agent's current target.
///
/// Holds only the id plus the last position it resolved to; never ownership.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetRef {
    pub id: TargetId,
    pub last_known: Vec2,
}

/// Weak reference to a child entity spawned by this agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildRef {
    pub id: AgentId,
    pub archetype: Archetype,
}

/// Decaying external velocity installed by a knockback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impulse {
    pub velocity: Vec2,
    pub started_at: Timestamp,
    pub until: Timestamp,
}

impl Impulse {
    /// Velocity contribution at `now`, decaying linearly to zero at `until`.
    pub fn velocity_at(&self, now: Timestamp) -> Option<Vec2> {
        if now >= self.until {
            return None;
        }
        let span = self.until.since(self.started_at).max(1) as f32;
        let left = self.until.since(now) as f32;
        Some(self.velocity * (left / span))
    }
}

/// Randomised heading used while toxin scrambles ranged movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wander {
    pub heading: Vec2,
    pub change_at: Timestamp,
}

/// Movement intent and overrides for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Steering {
    /// Velocity requested by the state machines this frame.
    pub desired: Vec2,
    /// Knockback velocity that pre-empts `desired` while it lasts.
    pub impulse: Option<Impulse>,
    /// Toxin wander heading.
    pub wander: Option<Wander>,
    /// Final velocity handed to the physics collaborator.
    pub resolved: Vec2,
}

bitflags! {
    /// One-shot latches remembered across cycles.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Latches: u8 {
        /// Heal-summon used at the first health threshold.
        const HEAL_THRESHOLD_1 = 1 << 0;
        /// Heal-summon used at the second health threshold.
        const HEAL_THRESHOLD_2 = 1 << 1;
    }
}

/// Scratch memory shared by an agent's phase hooks.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Blackboard {
    /// Primary cycles started.
    pub cycles: u32,
    /// Machine-gun bursts or pellet volleys fired.
    pub volleys: u32,
    /// Aim angle locked by the current attack.
    pub aim: f32,
    /// Point an ability is working around (marker, dash-out goal, teleport site).
    pub anchor: Option<Vec2>,
    /// Unit heading of the current scripted dash.
    pub heading: Vec2,
    /// Since when the target has stayed inside the caster's teleport radius.
    pub near_since: Option<Timestamp>,
    pub latches: Latches,
    /// Orbit angle of drones/healers around their owner.
    pub orbit: f32,
}

/// An AI-controlled entity.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    pub archetype: Archetype,
    pub stats: AgentStats,
    /// Last position reported by the physics collaborator.
    pub position: Vec2,
    pub health: Health,
    /// Damage absorbed by training dummies.
    pub recorded_damage: u64,
    pub status: StatusTracks,
    pub primary: MachineState,
    pub abilities: AbilitySlots,
    pub target: Option<TargetRef>,
    pub owner: Option<AgentId>,
    pub children: ArrayVec<ChildRef, { CombatConfig::MAX_CHILDREN }>,
    pub steering: Steering,
    pub blackboard: Blackboard,
    pub life: Life,
    pub spawned_at: Timestamp,
    pub(crate) movement_lock: Option<StateOwner>,
    pub(crate) telegraph: Option<StateOwner>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        archetype: Archetype,
        template: &AgentTemplate,
        position: Vec2,
        stat_scale: f32,
        now: Timestamp,
    ) -> Self {
        let max_health = ((template.max_health as f32) * stat_scale).round().max(1.0) as u32;
        Self {
            id,
            archetype,
            stats: AgentStats::from_template(template, stat_scale),
            position,
            health: Health::full(max_health),
            recorded_damage: 0,
            status: StatusTracks::default(),
            primary: MachineState::idle(now),
            abilities: AbilitySlots::new(),
            target: None,
            owner: None,
            children: ArrayVec::new(),
            steering: Steering::default(),
            blackboard: Blackboard::default(),
            life: Life::Alive,
            spawned_at: now,
            movement_lock: None,
            telegraph: None,
        }
    }

    pub fn with_owner(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_target(mut self, id: TargetId, last_known: Vec2) -> Self {
        self.target = Some(TargetRef { id, last_known });
        self
    }

    pub fn is_alive(&self) -> bool {
        self.life == Life::Alive
    }

    /// State machine currently owning movement/attack decisions.
    pub fn lock_holder(&self) -> Option<StateOwner> {
        self.movement_lock
    }

    /// Number of state machines holding the movement lock (0 or 1).
    pub fn lock_holder_count(&self) -> usize {
        usize::from(self.movement_lock.is_some())
    }

    pub fn telegraph_owner(&self) -> Option<StateOwner> {
        self.telegraph
    }

    pub fn ability(&self, id: AbilityId) -> Option<&AbilityRuntime> {
        self.abilities.iter().find(|slot| slot.id == id)
    }

    pub fn ability_mut(&mut self, id: AbilityId) -> Option<&mut AbilityRuntime> {
        self.abilities.iter_mut().find(|slot| slot.id == id)
    }

    pub fn ability_stage(&self, id: AbilityId) -> Option<AbilityStage> {
        self.ability(id).map(|slot| slot.stage)
    }

    pub fn live_children(&self, archetype: Archetype) -> usize {
        self.children
            .iter()
            .filter(|child| child.archetype == archetype)
            .count()
    }

    /// Claims the movement lock for `owner` if nobody else holds it.
    pub(crate) fn claim_lock(&mut self, owner: StateOwner) -> bool {
        match self.movement_lock {
            None => {
                self.movement_lock = Some(owner);
                true
            }
            Some(holder) => holder == owner,
        }
    }

    /// Releases the lock if `owner` holds it.
    pub(crate) fn release_lock(&mut self, owner: StateOwner) -> bool {
        if self.movement_lock == Some(owner) {
            self.movement_lock = None;
            true
        } else {
            false
        }
    }

    /// Unconditionally clears the lock, returning the previous holder.
    pub(crate) fn clear_lock(&mut self) -> Option<StateOwner> {
        self.movement_lock.take()
    }
}
