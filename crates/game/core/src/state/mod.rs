//! Agent records and the world that owns them.
//!
//! [`World`] is the single authoritative store mutated by the engine tick.
//! Cross-agent links are [`AgentId`]s resolved through the [`Arena`], so
//! destroying either side of a link can never dangle the other.
mod ability;
mod agent;
mod arena;
mod common;
mod outbox;
mod status;

use std::collections::VecDeque;

pub use ability::{AbilityId, AbilityRuntime, AbilitySlots, AbilityStage};
pub use agent::{
    Agent, AgentStats, Archetype, Blackboard, ChildRef, Impulse, Latches, Life, StateOwner,
    Steering, TargetRef, Wander,
};
pub use arena::Arena;
pub use common::{AgentId, Deadline, Health, TargetId, Timestamp, Vec2};
pub use outbox::{
    CombatEvent, Command, Effect, HazardKind, Outbox, ProjectileFlags, ProjectileKind,
    ProjectileSpec, TelegraphShape,
};
pub use status::{BUILDUP_MAX, StatusKind, StatusTrack, StatusTracks};

pub use crate::behavior::PhaseTag;
use crate::interrupt::Interrupt;

/// All agents of one arena plus the engine's output buffer.
#[derive(Debug, Default)]
pub struct World {
    pub(crate) agents: Arena<Agent>,
    pub(crate) outbox: Outbox,
    pub(crate) deferred: VecDeque<(AgentId, Interrupt)>,
    /// Spawn/heal requests waiting to be applied by the engine.
    pub(crate) commands: Vec<Command>,
    pub(crate) frame: u64,
    pub(crate) last_tick: Option<Timestamp>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Time of the last engine tick.
    pub fn last_tick(&self) -> Option<Timestamp> {
        self.last_tick
    }

    /// Current primary phase of an agent, for HUD and telegraph display.
    pub fn current_primary_state(&self, id: AgentId) -> Option<PhaseTag> {
        self.agent(id).map(|agent| agent.primary.tag)
    }

    /// Current stage of one ability of an agent.
    pub fn current_ability_state(&self, id: AgentId, ability: AbilityId) -> Option<AbilityStage> {
        self.agent(id).and_then(|agent| agent.ability_stage(ability))
    }

    pub fn lock_holder(&self, id: AgentId) -> Option<StateOwner> {
        self.agent(id).and_then(Agent::lock_holder)
    }

    /// Updates the cached position reported by the physics collaborator.
    pub fn sync_position(&mut self, id: AgentId, position: Vec2) -> bool {
        match self.agents.get_mut(id) {
            Some(agent) => {
                agent.position = position;
                true
            }
            None => false,
        }
    }

    /// Velocity the physics collaborator should apply this frame.
    pub fn velocity(&self, id: AgentId) -> Option<Vec2> {
        self.agent(id).map(|agent| agent.steering.resolved)
    }

    /// Queues an interrupt for delivery in the next frame's interrupt step.
    ///
    /// For collaborators that observe hits while the world is borrowed
    /// elsewhere. Callers holding the world should prefer the synchronous
    /// [`InterruptBus::raise`](crate::interrupt::InterruptBus::raise).
    pub fn defer_interrupt(&mut self, id: AgentId, interrupt: Interrupt) {
        self.deferred.push_back((id, interrupt));
    }

    pub fn pending_interrupts(&self) -> usize {
        self.deferred.len()
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Takes all effects and events produced since the last drain.
    pub fn drain_outbox(&mut self) -> Outbox {
        self.outbox.drain()
    }

    pub(crate) fn insert(&mut self, build: impl FnOnce(AgentId) -> Agent) -> AgentId {
        self.agents.insert_with(build)
    }
}
