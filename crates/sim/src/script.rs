//! Scripted arena: every archetype fighting a strafing target.

use std::sync::Arc;

use anyhow::Result;
use arena_core::{
    AgentId, Archetype, BuildupSource, CombatEvent, FixedArena, Interrupt, SpawnRequest,
    StatusKind, TargetId, Timestamp, Vec2,
};
use arena_runtime::{Event, Runtime, Topic};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::tally::{Summary, Tally};

const IGNITE_EVERY_MS: u64 = 1_000;
const TOXIN_EVERY_MS: u64 = 1_500;
const STUN_EVERY_MS: u64 = 2_500;
const KNOCKBACK_EVERY_MS: u64 = 3_000;
const DAMAGE_EVERY_MS: u64 = 700;

const LINEUP: [Archetype; 8] = [
    Archetype::Melee,
    Archetype::Ranged,
    Archetype::Sniper,
    Archetype::Turret,
    Archetype::Dummy,
    Archetype::Brawler,
    Archetype::HeavyGunner,
    Archetype::EvasiveCaster,
];

pub struct Script {
    arena: Arc<FixedArena>,
    frame_ms: u64,
    frames: u64,
    orbit_radius: f32,
    roster: Vec<AgentId>,
    /// Rotates the victim of each scripted hit.
    cursor: usize,
}

impl Script {
    pub fn new(config: &SimConfig) -> Self {
        let arena = FixedArena::with_player(Vec2::new(config.orbit_radius, 0.0));
        arena.add_pillar(Vec2::new(0.0, 180.0), 40.0);
        Self {
            arena: Arc::new(arena),
            frame_ms: config.frame_ms,
            frames: config.frames(),
            orbit_radius: config.orbit_radius,
            roster: Vec::new(),
            cursor: 0,
        }
    }

    pub fn arena(&self) -> Arc<FixedArena> {
        Arc::clone(&self.arena)
    }

    /// Spawns the line-up on a ring inside the target's orbit.
    pub fn populate(&mut self, runtime: &mut Runtime) -> Result<()> {
        let step = std::f32::consts::TAU / LINEUP.len() as f32;
        for (slot, archetype) in LINEUP.into_iter().enumerate() {
            let position = Vec2::from_angle(step * slot as f32) * (self.orbit_radius * 0.5);
            let id = runtime.spawn(SpawnRequest::new(archetype, position))?;
            self.roster.push(id);
        }
        info!(agents = self.roster.len(), "arena populated");
        Ok(())
    }

    pub fn run(&mut self, runtime: &mut Runtime, tally: &Tally) -> Result<Summary> {
        let mut lifecycle = runtime.subscribe(Topic::Lifecycle);
        let mut combat = runtime.subscribe(Topic::Combat);
        let mut summary = Summary {
            seed: runtime.seed(),
            ..Summary::default()
        };

        for _ in 0..self.frames {
            self.strafe(runtime.now());
            let report = runtime.frame(self.frame_ms)?;
            self.integrate(runtime);
            self.provoke(runtime, report.at);

            for event in &report.events {
                summary.record(event);
            }
            summary.loot.extend(report.loot);
            summary.frames = report.frame;
            summary.simulated_ms = report.at.as_millis();

            for event in drain(&mut lifecycle) {
                log_lifecycle(&event);
            }
            for event in drain(&mut combat) {
                debug!(frame = event.frame, event = ?event.event, "combat");
            }
        }

        summary.agents_alive = runtime.agents_alive();
        summary.effects = tally.effects();
        info!(
            frames = summary.frames,
            alive = summary.agents_alive,
            deaths = summary.deaths,
            "simulation finished"
        );
        Ok(summary)
    }

    /// Moves the target along its circle.
    fn strafe(&self, now: Timestamp) {
        let angle = now.as_millis() as f32 * 0.0006;
        let position = Vec2::from_angle(angle) * self.orbit_radius;
        self.arena.move_player(TargetId::PLAYER, position, now);
    }

    /// Applies the engine's velocities, standing in for the physics collaborator.
    fn integrate(&self, runtime: &mut Runtime) {
        let dt = self.frame_ms as f32 / 1_000.0;
        let moved: Vec<(AgentId, Vec2)> = runtime
            .world()
            .agents()
            .map(|(id, agent)| (id, agent.position + agent.steering.resolved * dt))
            .collect();
        for (id, position) in &moved {
            // The id was read from the world this frame.
            let _ = runtime.sync_position(*id, *position);
        }
        self.arena.set_occupants(moved);
    }

    /// Scripted hits from the target: status buildup, knockbacks, damage.
    fn provoke(&mut self, runtime: &mut Runtime, now: Timestamp) {
        self.roster.retain(|id| runtime.world().contains(*id));
        let Some(victim) = self.next_victim() else {
            return;
        };
        let t = now.as_millis();

        if t % IGNITE_EVERY_MS == 0 {
            runtime.buildup(victim, StatusKind::Ignite, 4.0, BuildupSource::Weapon);
        }
        if t % TOXIN_EVERY_MS == 0 {
            runtime.buildup(victim, StatusKind::Toxin, 5.0, BuildupSource::Environment);
        }
        if t % STUN_EVERY_MS == 0 {
            runtime.buildup(victim, StatusKind::Stun, 10.0, BuildupSource::Ability);
        }
        if t % KNOCKBACK_EVERY_MS == 0 {
            if let Some(agent) = runtime.world().agent(victim) {
                let away = (agent.position - self.target_position(now)).normalized();
                runtime.defer_interrupt(
                    victim,
                    Interrupt::Knockback {
                        velocity: away * 450.0,
                    },
                );
            }
        }
        if t % DAMAGE_EVERY_MS == 0 {
            runtime.damage(victim, 45);
        }
    }

    fn next_victim(&mut self) -> Option<AgentId> {
        if self.roster.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.roster.len();
        Some(self.roster[self.cursor])
    }

    fn target_position(&self, now: Timestamp) -> Vec2 {
        self.arena
            .player_position(TargetId::PLAYER)
            .unwrap_or_else(|| Vec2::from_angle(now.as_millis() as f32 * 0.0006) * self.orbit_radius)
    }
}

/// Takes every event already waiting on a subscription.
fn drain(receiver: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "event subscriber lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
        }
    }
}

fn log_lifecycle(event: &Event) {
    match event.event {
        CombatEvent::AgentDied {
            agent, archetype, ..
        } => info!(frame = event.frame, %agent, archetype = archetype.as_str(), "agent died"),
        CombatEvent::Despawned { agent, archetype } => {
            info!(frame = event.frame, %agent, archetype = archetype.as_str(), "agent despawned")
        }
        CombatEvent::Spawned {
            agent,
            archetype,
            owner,
        } => debug!(frame = event.frame, %agent, archetype = archetype.as_str(), ?owner, "agent spawned"),
        _ => {}
    }
}
