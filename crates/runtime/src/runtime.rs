//! High-level runtime orchestrator.
//!
//! The runtime owns the world, the engine and the collaborators of one
//! arena, and exposes a builder-based API for clients to drive it frame by
//! frame. Everything a frame produces leaves through three exits: effects
//! go to the [`EffectsSink`], events are published on the [`EventBus`], and
//! hook outputs come back in the [`FrameReport`].

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arena_content::{ArchetypeLoader, ConfigLoader};
use arena_core::{
    AgentId, BuildupOutcome, BuildupSource, BuiltinTemplates, Clock, CombatConfig, CombatEngine,
    CombatEnv, DamageOutcome, FixedArena, Interrupt, InterruptOutcome, ManualClock, PcgRng,
    PlayerOracle, SpatialOracle, SpawnRequest, StatusKind, TemplateOracle, Timestamp, Vec2, World,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::hooks::{HookContext, HookOutput, HookRegistry, LootDrop};
use crate::sink::{EffectsSink, NullSink};

/// What one call to [`Runtime::frame`] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub at: Timestamp,
    pub agents_alive: usize,
    /// Effects forwarded to the sink.
    pub effects: usize,
    /// Events published on the bus, in production order.
    pub events: Vec<Event>,
    /// Loot requested by hooks.
    pub loot: Vec<LootDrop>,
    /// Wall-clock time spent in the frame.
    pub elapsed: Duration,
}

/// Authoritative frame loop of one arena.
pub struct Runtime {
    engine: CombatEngine,
    world: World,
    clock: ManualClock,
    spatial: Arc<dyn SpatialOracle>,
    players: Arc<dyn PlayerOracle>,
    templates: Box<dyn TemplateOracle>,
    rng: PcgRng,
    combat: CombatConfig,
    seed: u64,
    hooks: HookRegistry,
    sink: Box<dyn EffectsSink>,
    bus: EventBus,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Splits the runtime into the read-only environment and the parts the
    /// engine mutates.
    fn parts(&mut self) -> (CombatEnv<'_>, &mut World, &CombatEngine) {
        let env = CombatEnv::new(
            &*self.spatial,
            &*self.players,
            &*self.templates,
            &self.rng,
            &self.combat,
        )
        .with_seed(self.seed);
        (env, &mut self.world, &self.engine)
    }

    /// Advances the clock by `dt_ms` and runs one frame.
    ///
    /// # Errors
    ///
    /// A critical hook failed. The frame itself has already been applied to
    /// the world; its events are not published.
    pub fn frame(&mut self, dt_ms: u64) -> Result<FrameReport> {
        let started = Instant::now();
        let now = self.clock.advance(dt_ms);

        let (env, world, engine) = self.parts();
        let summary = engine.tick(world, &env, now);
        let outbox = self.world.drain_outbox();
        self.sink.apply(summary.frame, &outbox.effects);

        let mut loot = Vec::new();
        let mut spawns = Vec::new();
        for event in &outbox.events {
            let ctx = HookContext::new(event, &self.world, summary.frame, now);
            for output in self.hooks.execute(&ctx)? {
                match output {
                    HookOutput::Loot(drop) => loot.push(drop),
                    HookOutput::Spawn(request) => spawns.push(request),
                }
            }
        }

        let events: Vec<Event> = outbox
            .events
            .into_iter()
            .map(|event| Event {
                frame: summary.frame,
                at: now,
                event,
            })
            .collect();
        for event in &events {
            self.bus.publish(event.clone());
        }

        for request in spawns {
            if let Err(error) = self.spawn(request) {
                warn!(
                    target: "runtime",
                    archetype = request.archetype.as_str(),
                    %error,
                    "hook spawn rejected"
                );
            }
        }

        let report = FrameReport {
            frame: summary.frame,
            at: now,
            agents_alive: self.agents_alive(),
            effects: outbox.effects.len(),
            events,
            loot,
            elapsed: started.elapsed(),
        };
        debug!(
            target: "runtime",
            frame = report.frame,
            at = %report.at,
            agents = report.agents_alive,
            effects = report.effects,
            events = report.events.len(),
            interrupts = summary.interrupts_delivered,
            "frame complete"
        );
        Ok(report)
    }

    /// Spawns an agent at the current time.
    ///
    /// Its `Spawned` event is reported by the next frame.
    pub fn spawn(&mut self, request: SpawnRequest) -> Result<AgentId> {
        let now = self.clock.now();
        let (env, world, engine) = self.parts();
        let id = engine.spawn(world, &env, request, now)?;
        debug!(target: "runtime", agent = %id, archetype = request.archetype.as_str(), "spawned");
        Ok(id)
    }

    /// Raises an interrupt synchronously.
    pub fn raise(&mut self, id: AgentId, interrupt: Interrupt) -> InterruptOutcome {
        let now = self.clock.now();
        let (env, world, engine) = self.parts();
        engine.raise(world, &env, id, interrupt, now)
    }

    /// Queues an interrupt for the next frame's interrupt step.
    pub fn defer_interrupt(&mut self, id: AgentId, interrupt: Interrupt) {
        self.world.defer_interrupt(id, interrupt);
    }

    pub fn damage(&mut self, id: AgentId, amount: u32) -> DamageOutcome {
        let now = self.clock.now();
        self.engine.apply_damage(&mut self.world, id, amount, now)
    }

    pub fn buildup(
        &mut self,
        id: AgentId,
        kind: StatusKind,
        amount: f32,
        source: BuildupSource,
    ) -> Option<BuildupOutcome> {
        let now = self.clock.now();
        let (env, world, engine) = self.parts();
        engine.apply_buildup(world, &env, id, kind, amount, source, now)
    }

    /// Removes an agent and its children without them dying.
    pub fn despawn(&mut self, id: AgentId) -> Result<()> {
        let now = self.clock.now();
        if self.engine.despawn(&mut self.world, id, now) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownAgent(id))
        }
    }

    /// Records the position reported by the physics collaborator.
    pub fn sync_position(&mut self, id: AgentId, position: Vec2) -> Result<()> {
        if self.world.sync_position(id, position) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownAgent(id))
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn combat_config(&self) -> &CombatConfig {
        &self.combat
    }

    pub fn agents_alive(&self) -> usize {
        self.world
            .agents()
            .filter(|(_, agent)| agent.is_alive())
            .count()
    }

    /// Subscribe to one topic of the event bus
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }

    /// Cloneable handle to the event bus.
    pub fn events(&self) -> EventBus {
        self.bus.clone()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("now", &self.clock.now())
            .field("agents", &self.world.len())
            .field("seed", &self.seed)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    spatial: Option<Arc<dyn SpatialOracle>>,
    players: Option<Arc<dyn PlayerOracle>>,
    templates: Option<Box<dyn TemplateOracle>>,
    hooks: Option<HookRegistry>,
    sink: Option<Box<dyn EffectsSink>>,
    engine: Option<CombatEngine>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            spatial: None,
            players: None,
            templates: None,
            hooks: None,
            sink: None,
            engine: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use one in-memory arena as both the spatial and the player oracle.
    pub fn arena(self, arena: Arc<FixedArena>) -> Self {
        let spatial: Arc<dyn SpatialOracle> = Arc::clone(&arena) as Arc<dyn SpatialOracle>;
        self.spatial(spatial).players(arena)
    }

    /// Set required spatial oracle
    pub fn spatial(mut self, spatial: Arc<dyn SpatialOracle>) -> Self {
        self.spatial = Some(spatial);
        self
    }

    /// Set required player oracle
    pub fn players(mut self, players: Arc<dyn PlayerOracle>) -> Self {
        self.players = Some(players);
        self
    }

    /// Set the template oracle.
    ///
    /// Takes precedence over `templates_path`. Built-in templates are used
    /// when neither is given.
    pub fn templates(mut self, templates: impl TemplateOracle + 'static) -> Self {
        self.templates = Some(Box::new(templates));
        self
    }

    /// Set custom frame hooks.
    ///
    /// If not provided, the default hooks (Loot) are used.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Set the effects sink. Effects are discarded when none is given.
    pub fn sink(mut self, sink: impl EffectsSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Use a prebuilt engine instead of the built-in phase library.
    pub fn engine(mut self, engine: CombatEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the runtime.
    ///
    /// # Errors
    ///
    /// A required collaborator is missing, a content file fails to load, or
    /// the built-in phase library fails validation.
    pub fn build(self) -> Result<Runtime> {
        let spatial = self
            .spatial
            .ok_or(RuntimeError::MissingCollaborator("spatial"))?;
        let players = self
            .players
            .ok_or(RuntimeError::MissingCollaborator("player"))?;

        let combat = match &self.config.config_path {
            Some(path) => load_config(path)?,
            None => self.config.combat.clone(),
        };
        let templates = match (self.templates, &self.config.templates_path) {
            (Some(templates), _) => templates,
            (None, Some(path)) => load_templates(path)?,
            (None, None) => Box::new(BuiltinTemplates),
        };
        let engine = match self.engine {
            Some(engine) => engine,
            None => CombatEngine::new()?,
        };
        let hooks = self.hooks.unwrap_or_default();

        info!(
            target: "runtime",
            seed = self.config.seed,
            hooks = hooks.len(),
            event_buffer = self.config.event_buffer_size,
            "runtime ready"
        );

        Ok(Runtime {
            engine,
            world: World::new(),
            clock: ManualClock::new(),
            spatial,
            players,
            templates,
            rng: PcgRng,
            combat,
            seed: self.config.seed,
            hooks,
            sink: self.sink.unwrap_or_else(|| Box::new(NullSink)),
            bus: EventBus::with_capacity(self.config.event_buffer_size),
        })
    }
}

fn load_config(path: &Path) -> Result<CombatConfig> {
    let config = ConfigLoader::load(path).map_err(RuntimeError::Content)?;
    info!(target: "runtime", path = %path.display(), "combat config loaded");
    Ok(config)
}

fn load_templates(path: &Path) -> Result<Box<dyn TemplateOracle>> {
    let registry = ArchetypeLoader::load(path).map_err(RuntimeError::Content)?;
    info!(
        target: "runtime",
        path = %path.display(),
        overrides = registry.len(),
        "archetype templates loaded"
    );
    Ok(Box::new(registry))
}

#[cfg(test)]
mod tests {
    use arena_core::Archetype;

    use super::*;

    #[test]
    fn building_without_collaborators_fails() {
        let error = Runtime::builder().build().expect_err("no spatial oracle");
        assert!(matches!(error, RuntimeError::MissingCollaborator("spatial")));
    }

    #[test]
    fn facades_report_unknown_agents() {
        let arena = Arc::new(FixedArena::with_player(Vec2::new(300.0, 0.0)));
        let mut runtime = Runtime::builder().arena(arena).build().expect("build");
        let id = runtime
            .spawn(SpawnRequest::new(Archetype::Melee, Vec2::ZERO))
            .expect("spawn");

        runtime.despawn(id).expect("first despawn");
        assert!(matches!(
            runtime.despawn(id),
            Err(RuntimeError::UnknownAgent(stale)) if stale == id
        ));
        assert!(runtime.sync_position(id, Vec2::ZERO).is_err());
        assert_eq!(runtime.damage(id, 10), DamageOutcome::Stale);
    }
}
