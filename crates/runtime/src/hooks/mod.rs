//! Frame hook system for reacting to combat events.
//!
//! After each frame the runtime hands every drained [`CombatEvent`] to the
//! registered hooks in priority order. A hook that triggers returns
//! [`HookOutput`]s: loot requests are reported to the caller, spawn
//! requests are applied through the engine before the next frame.
//!
//! # Architecture
//!
//! - Hooks are registered on the [`RuntimeBuilder`](crate::RuntimeBuilder)
//!   and sorted by priority
//! - `should_trigger()` is evaluated for every event; only triggered hooks run
//! - Failures are handled according to [`HookCriticality`]

mod context;
mod loot;
mod registry;

pub use context::HookContext;
pub use loot::{LootDrop, LootHook};
pub use registry::{FnHook, HookRegistry};

use arena_core::SpawnRequest;

/// Defines the criticality level of a hook for error handling.
///
/// - Critical hooks must succeed or the frame fails
/// - Important hooks log errors but allow continuation
/// - Optional hooks can fail silently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCriticality {
    /// Hook failure fails the whole frame.
    Critical,

    /// Hook failure is logged as an error; the frame continues.
    ///
    /// This is the default level.
    Important,

    /// Hook failure is logged at debug level and otherwise ignored.
    ///
    /// Use for cosmetic reactions (announcer lines, achievement counters).
    Optional,
}

/// Request produced by a triggered hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HookOutput {
    /// Drop loot; forwarded to the caller in the frame report.
    Loot(LootDrop),
    /// Spawn an agent before the next frame.
    Spawn(SpawnRequest),
}

/// Hook evaluated for every combat event drained after a frame.
///
/// # Execution Order
///
/// Hooks are sorted by priority (lower values execute first):
/// - Negative priorities: hooks other hooks depend on
/// - Zero: default priority for most hooks
/// - Positive priorities: optional or cosmetic hooks
pub trait FrameHook: Send + Sync {
    /// Returns a human-readable name for this hook (used in logging).
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    /// Determines whether this hook reacts to the event in `ctx`.
    fn should_trigger(&self, ctx: &HookContext<'_>) -> bool;

    /// Runs the hook. Only called when [`should_trigger`](Self::should_trigger)
    /// returned true.
    fn run(&self, ctx: &HookContext<'_>) -> Result<Vec<HookOutput>, String>;
}
