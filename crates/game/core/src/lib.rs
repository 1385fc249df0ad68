//! Deterministic combat behaviour for arena agents.
//!
//! `arena-core` owns the per-agent behaviour engine: status effects, phase
//! tables and their state machines, ability scheduling, target resolution
//! and boss orchestration. Physics, rendering and content loading live in
//! collaborators reached through the oracles in [`env`]. All state mutation
//! flows through [`engine::CombatEngine`], and supporting crates depend on
//! the types re-exported here.
pub mod ability;
pub mod behavior;
pub mod boss;
pub mod clock;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod interrupt;
pub mod state;
pub mod status;
pub mod targeting;

pub use ability::{AbilityDef, AbilityScheduler, AbilitySpec, AbilityTrigger};
pub use behavior::{
    ArchetypeProfile, InterruptPolicy, InterruptResponse, MachineState, Movement, PhaseLibrary,
    PhaseSpec, PhaseTable, PhaseTag, TableError, Timing,
};
pub use clock::{Clock, ManualClock};
pub use config::{BuildupSource, BuildupSourceScales, CombatConfig, StatusConfig};
pub use engine::{CombatEngine, DamageOutcome, EngineError, SpawnRequest, TickSummary};
pub use env::{
    AgentTemplate, BuiltinTemplates, CombatEnv, FixedArena, OracleError, PcgRng, PlayerOracle,
    RngOracle, SpatialOracle, TemplateOracle,
};
pub use error::{ErrorSeverity, GameError};
pub use interrupt::{Interrupt, InterruptBus, InterruptKind, InterruptOutcome};
pub use state::{
    AbilityId, AbilityStage, Agent, AgentId, Archetype, BUILDUP_MAX, CombatEvent, Command, Deadline, Effect,
    Health, Life, Outbox, StateOwner, StatusKind, TargetId, Timestamp, Vec2, World,
};
pub use status::BuildupOutcome;
pub use targeting::{PositionHistory, TargetResolver};
