//! Context provided to hooks during evaluation.

use arena_core::{CombatEvent, Timestamp, World};

/// Read-only view handed to each hook.
///
/// The event has already been applied: a dead agent is no longer in
/// `world`, so death hooks read what they need from the event itself.
#[derive(Clone, Copy)]
pub struct HookContext<'a> {
    /// The event being dispatched
    pub event: &'a CombatEvent,

    /// World state after the frame that produced the event
    pub world: &'a World,

    pub frame: u64,
    pub now: Timestamp,
}

impl<'a> HookContext<'a> {
    pub fn new(event: &'a CombatEvent, world: &'a World, frame: u64, now: Timestamp) -> Self {
        Self {
            event,
            world,
            frame,
            now,
        }
    }
}
