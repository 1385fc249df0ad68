//! Counters for the final summary.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use arena_core::{CombatEvent, Effect};
use arena_runtime::{EffectsSink, Event, LootDrop};
use serde::Serialize;

/// Effect counts per kind, shared with the runtime as its sink.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    effects: Arc<Mutex<BTreeMap<&'static str, usize>>>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> BTreeMap<&'static str, usize> {
        self.effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EffectsSink for Tally {
    fn apply(&self, _frame: u64, effects: &[Effect]) {
        let mut counts = self.effects.lock().unwrap_or_else(PoisonError::into_inner);
        for effect in effects {
            *counts.entry(effect_kind(effect)).or_default() += 1;
        }
    }
}

fn effect_kind(effect: &Effect) -> &'static str {
    match effect {
        Effect::SpawnProjectile(_) => "spawn_projectile",
        Effect::PlayTelegraph { .. } => "play_telegraph",
        Effect::ClearTelegraph { .. } => "clear_telegraph",
        Effect::MeleeStrike { .. } => "melee_strike",
        Effect::AreaDamage { .. } => "area_damage",
        Effect::Hazard { .. } => "hazard",
        Effect::PlaceMarker { .. } => "place_marker",
        Effect::Teleport { .. } => "teleport",
    }
}

/// Printed as JSON when the run ends.
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub seed: u64,
    pub frames: u64,
    pub simulated_ms: u64,
    pub agents_alive: usize,
    pub spawned: usize,
    pub deaths: usize,
    pub despawns: usize,
    pub status_triggers: usize,
    pub abilities_begun: usize,
    pub interrupts: usize,
    pub loot: Vec<LootDrop>,
    pub effects: BTreeMap<&'static str, usize>,
}

impl Summary {
    pub fn record(&mut self, event: &Event) {
        match event.event {
            CombatEvent::Spawned { .. } => self.spawned += 1,
            CombatEvent::AgentDied { .. } => self.deaths += 1,
            CombatEvent::Despawned { .. } => self.despawns += 1,
            CombatEvent::StatusTriggered { .. } => self.status_triggers += 1,
            CombatEvent::AbilityBegan { .. } => self.abilities_begun += 1,
            CombatEvent::Interrupted { .. } => self.interrupts += 1,
        }
    }
}
