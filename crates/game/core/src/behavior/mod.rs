//! Generic phase engine and the per-archetype phase tables it runs.
//!
//! # Architecture
//!
//! - [`PhaseSpec`]: one named behaviour period (timing, movement, telegraph,
//!   hooks, interrupt policy, successor)
//! - [`PhaseTable`]: a validated, static list of phases for one machine
//! - [`MachineState`]: the `Copy` cursor an agent stores per machine
//! - [`PhaseCtx`]: what hooks see while a machine runs
//! - [`PhaseLibrary`]: every archetype's primary table and ability book,
//!   built and validated once at engine construction
//!
//! All archetype behaviour is data in the tables; the engine only advances
//! deadlines, runs hooks and applies interrupt policies.
pub mod archetypes;
mod context;
mod library;
mod machine;
mod table;

use strum::IntoStaticStr;

pub use context::PhaseCtx;
pub use library::{ArchetypeProfile, Blueprint, Locomotion, PhaseLibrary};
pub use machine::MachineState;
pub(crate) use machine::{StepOutcome, abort, delay, enter, step};
pub use table::{
    BranchPick, InterruptPolicy, InterruptResponse, Movement, Next, PhaseFlow, PhaseHook,
    PhaseSpec, PhaseTable, PhaseTickHook, TableError, TableKind, Timing,
};

/// Closed set of phase names shared by every table.
///
/// `Idle` is the entry of every primary table and the implicit resting state
/// of every ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PhaseTag {
    #[default]
    Idle,

    // Generic enemy cycles
    Windup,
    Sweep,
    Recover,
    Aiming,
    Firing,
    Cooldown,
    Fire,

    // Support entities
    Arming,
    Armed,
    Detonate,
    Channel,
    Mend,

    // Boss primaries
    Aim,
    AimLong,
    Burst,
    BurstLong,
    Lockout,
    Spinup,
    GrenadeFan,
    Volley,
    Special,

    // Boss abilities
    Dash,
    DashIn,
    Melee,
    DashOut,
    Call,
    Summon,
    Marker,
    Rain,
    Deploy,
    Blink,
    Arrive,
    Barrage,
    Release,
}

impl PhaseTag {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
