//! Fire-and-forget requests and observable events produced by the engine.
//!
//! Rendering, projectile simulation and area-damage resolution belong to
//! external collaborators. The engine only appends [`Effect`]s here in the
//! order they were produced; the runtime drains them after each frame.

use bitflags::bitflags;

use crate::state::{AbilityId, AgentId, Archetype, PhaseTag, StatusKind, TargetId, Vec2};

bitflags! {
    /// Behaviour flags forwarded to the projectile collaborator.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ProjectileFlags: u8 {
        /// Steers toward the target after launch.
        const HOMING = 1 << 0;
        /// Passes through the first entity hit.
        const PIERCING = 1 << 1;
        /// Explodes on impact or at the end of its flight.
        const EXPLOSIVE = 1 << 2;
        /// Can be deflected by a raised shield.
        const BLOCKABLE = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProjectileKind {
    Bullet,
    Pellet,
    SniperRound,
    Grenade,
    HomingOrb,
}

/// Request to spawn one projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectileSpec {
    pub owner: AgentId,
    pub origin: Vec2,
    pub angle: f32,
    pub kind: ProjectileKind,
    pub damage: u32,
    pub speed: f32,
    pub flags: ProjectileFlags,
}

/// Shape of an attack telegraph.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TelegraphShape {
    /// Aim line along the agent's facing.
    Line { length: f32, width: f32 },
    /// Cone in front of the agent.
    Arc { radius: f32, spread: f32 },
    /// Circle around the agent.
    Circle { radius: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HazardKind {
    /// Bomb that follows a target until its fuse runs out.
    PhaseBomb,
}

/// Side effect handed to the projectile/VFX/physics collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    SpawnProjectile(ProjectileSpec),
    PlayTelegraph {
        agent: AgentId,
        shape: TelegraphShape,
        angle: f32,
        duration_ms: u32,
    },
    ClearTelegraph {
        agent: AgentId,
    },
    /// Single melee damage tick in a cone.
    MeleeStrike {
        agent: AgentId,
        origin: Vec2,
        angle: f32,
        reach: f32,
        damage: u32,
    },
    /// Instant area damage (bombardment rain, mine detonation).
    AreaDamage {
        source: AgentId,
        center: Vec2,
        radius: f32,
        damage: u32,
    },
    /// Delayed hazard placed in the world.
    Hazard {
        source: AgentId,
        kind: HazardKind,
        position: Vec2,
        follow: Option<TargetId>,
        radius: f32,
        damage: u32,
        fuse_ms: u32,
    },
    /// Ground marker announcing incoming area damage.
    PlaceMarker {
        agent: AgentId,
        position: Vec2,
        radius: f32,
        duration_ms: u32,
    },
    /// Instant relocation request for the physics collaborator.
    Teleport {
        agent: AgentId,
        to: Vec2,
    },
}

/// Observable combat events (HUD, audio, analytics, loot).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    Spawned {
        agent: AgentId,
        archetype: Archetype,
        owner: Option<AgentId>,
    },
    /// Health reached zero.
    AgentDied {
        agent: AgentId,
        archetype: Archetype,
        position: Vec2,
    },
    /// Removed without dying (self-destruct, owner gone, despawn request).
    Despawned {
        agent: AgentId,
        archetype: Archetype,
    },
    StatusTriggered {
        agent: AgentId,
        kind: StatusKind,
    },
    AbilityBegan {
        agent: AgentId,
        ability: AbilityId,
    },
    /// An interrupt aborted a phase.
    Interrupted {
        agent: AgentId,
        from: PhaseTag,
        to: PhaseTag,
        ability: Option<AbilityId>,
    },
}

/// Internal follow-up requests applied by the engine after an agent's tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Spawn {
        archetype: Archetype,
        position: Vec2,
        stat_scale: f32,
        owner: Option<AgentId>,
    },
    Heal {
        target: AgentId,
        amount: u32,
    },
}

/// Per-world output buffer.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    pub effects: Vec<Effect>,
    pub events: Vec<CombatEvent>,
}

impl Outbox {
    pub fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn push_event(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.events.is_empty()
    }

    /// Takes everything produced so far, leaving the outbox empty.
    pub fn drain(&mut self) -> Outbox {
        std::mem::take(self)
    }
}
