//! Forwarding of engine effects to the projectile/VFX/physics collaborators.

use std::sync::{Arc, Mutex};

use arena_core::Effect;

/// Receives every effect produced by a frame, in production order.
pub trait EffectsSink: Send + Sync {
    fn apply(&self, frame: u64, effects: &[Effect]);
}

/// Discards every effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EffectsSink for NullSink {
    fn apply(&self, _frame: u64, _effects: &[Effect]) {}
}

/// Keeps every effect in memory, tagged with its frame.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// runtime and inspect another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    recorded: Arc<Mutex<Vec<(u64, Effect)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes everything recorded so far.
    pub fn take(&self) -> Vec<(u64, Effect)> {
        match self.recorded.lock() {
            Ok(mut recorded) => std::mem::take(&mut *recorded),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.recorded.lock().map_or(0, |recorded| recorded.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EffectsSink for RecordingSink {
    fn apply(&self, frame: u64, effects: &[Effect]) {
        if effects.is_empty() {
            return;
        }
        let mut recorded = match self.recorded.lock() {
            Ok(recorded) => recorded,
            Err(poisoned) => poisoned.into_inner(),
        };
        recorded.extend(effects.iter().map(|effect| (frame, *effect)));
    }
}

impl<S: EffectsSink + ?Sized> EffectsSink for Arc<S> {
    fn apply(&self, frame: u64, effects: &[Effect]) {
        (**self).apply(frame, effects);
    }
}
