#![allow(dead_code)]

use arena_core::{
    AgentId, Archetype, BuildupOutcome, BuildupSource, BuiltinTemplates, CombatConfig, CombatEngine,
    CombatEnv, DamageOutcome, FixedArena, Interrupt, InterruptOutcome, PcgRng, SpawnRequest, StatusKind,
    TickSummary, Timestamp, Vec2, World,
};

pub const FRAME_MS: u64 = 50;
const SEED: u64 = 0x5eed;

/// Engine, world and collaborators for one scripted fight.
pub struct Harness {
    pub arena: FixedArena,
    pub templates: BuiltinTemplates,
    pub rng: PcgRng,
    pub config: CombatConfig,
    pub engine: CombatEngine,
    pub world: World,
    pub now: Timestamp,
}

impl Harness {
    pub fn with_player_at(position: Vec2) -> Self {
        Self {
            arena: FixedArena::with_player(position),
            templates: BuiltinTemplates,
            rng: PcgRng,
            config: CombatConfig::default(),
            engine: CombatEngine::new().expect("built-in tables validate"),
            world: World::new(),
            now: Timestamp::ZERO,
        }
    }

    fn split(&mut self) -> (CombatEnv<'_>, &mut World, &CombatEngine) {
        let env = CombatEnv::new(
            &self.arena,
            &self.arena,
            &self.templates,
            &self.rng,
            &self.config,
        )
        .with_seed(SEED);
        (env, &mut self.world, &self.engine)
    }

    pub fn spawn(&mut self, archetype: Archetype, position: Vec2) -> AgentId {
        let now = self.now;
        let (env, world, engine) = self.split();
        engine
            .spawn(world, &env, SpawnRequest::new(archetype, position), now)
            .expect("spawn")
    }

    /// Ticks at the current time without advancing it.
    pub fn tick(&mut self) -> TickSummary {
        let now = self.now;
        let (env, world, engine) = self.split();
        engine.tick(world, &env, now)
    }

    /// Advances one frame and ticks.
    pub fn frame(&mut self) -> TickSummary {
        self.now = self.now + FRAME_MS;
        self.tick()
    }

    /// Runs frames up to and including `until`, calling `observe` after each.
    pub fn run_until(&mut self, until: u64, mut observe: impl FnMut(&mut Self)) {
        while self.now.as_millis() + FRAME_MS <= until {
            self.frame();
            observe(self);
        }
    }

    pub fn raise(&mut self, id: AgentId, interrupt: Interrupt) -> InterruptOutcome {
        let now = self.now;
        let (env, world, engine) = self.split();
        engine.raise(world, &env, id, interrupt, now)
    }

    pub fn buildup(&mut self, id: AgentId, kind: StatusKind, amount: f32) -> Option<BuildupOutcome> {
        let now = self.now;
        let (env, world, engine) = self.split();
        engine.apply_buildup(world, &env, id, kind, amount, BuildupSource::Weapon, now)
    }

    pub fn damage(&mut self, id: AgentId, amount: u32) -> DamageOutcome {
        self.engine.apply_damage(&mut self.world, id, amount, self.now)
    }
}
