//! What phase hooks can see and do.

use crate::behavior::MachineState;
use crate::env::CombatEnv;
use crate::interrupt::Interrupt;
use crate::state::{
    AbilityId, Agent, AgentId, Arena, Archetype, Command, CombatEvent, Effect, Outbox,
    ProjectileFlags, ProjectileKind, ProjectileSpec, StateOwner, TelegraphShape, Timestamp, Vec2,
};
use crate::targeting::TargetResolver;

/// Execution context handed to every phase hook.
///
/// The agent is exclusively borrowed for the duration of its own tick; other
/// agents are reachable read-only through `peers` by id and resolve to `None`
/// once gone.
pub struct PhaseCtx<'a> {
    pub agent: &'a mut Agent,
    /// Cursor of the machine being run. Written back by the engine.
    pub state: MachineState,
    pub owner: StateOwner,
    pub env: &'a CombatEnv<'a>,
    pub peers: &'a Arena<Agent>,
    pub now: Timestamp,
    outbox: &'a mut Outbox,
    commands: &'a mut Vec<Command>,
    steer: Option<Vec2>,
    raised: Option<Interrupt>,
}

/// Everything a hook run leaves behind besides direct agent mutation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CtxOutput {
    pub(crate) state: MachineState,
    pub(crate) steer: Option<Vec2>,
    pub(crate) raised: Option<Interrupt>,
}

impl<'a> PhaseCtx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        agent: &'a mut Agent,
        owner: StateOwner,
        state: MachineState,
        env: &'a CombatEnv<'a>,
        peers: &'a Arena<Agent>,
        outbox: &'a mut Outbox,
        commands: &'a mut Vec<Command>,
        now: Timestamp,
    ) -> Self {
        Self {
            agent,
            state,
            owner,
            env,
            peers,
            now,
            outbox,
            commands,
            steer: None,
            raised: None,
        }
    }

    pub(crate) fn finish(self) -> CtxOutput {
        CtxOutput {
            state: self.state,
            steer: self.steer,
            raised: self.raised,
        }
    }

    pub fn id(&self) -> AgentId {
        self.agent.id
    }

    pub fn position(&self) -> Vec2 {
        self.agent.position
    }

    /// Milliseconds spent in the current phase.
    pub fn elapsed(&self) -> u64 {
        self.state.elapsed(self.now)
    }

    pub fn ability(&self) -> Option<AbilityId> {
        match self.owner {
            StateOwner::Ability(id) => Some(id),
            StateOwner::Primary => None,
        }
    }

    // ========================================================================
    // Targeting
    // ========================================================================

    /// Live (or decoy) target position.
    pub fn target(&mut self) -> Option<Vec2> {
        TargetResolver::resolve(self.agent, self.env.players)
    }

    /// Target position `lag_ms` in the past.
    pub fn lagged_target(&mut self, lag_ms: u32) -> Option<Vec2> {
        TargetResolver::resolve_lagged(self.agent, self.env.players, self.now, lag_ms)
    }

    pub fn target_distance(&mut self) -> Option<f32> {
        let position = self.agent.position;
        self.target()
            .map(|target| self.env.spatial.distance(position, target))
    }

    pub fn line_of_sight(&self, to: Vec2) -> bool {
        self.env.spatial.line_of_sight(self.agent.position, to)
    }

    /// Locks the aim angle onto `point` and returns it.
    pub fn aim_at(&mut self, point: Vec2) -> f32 {
        let angle = self.agent.position.angle_to(point);
        self.agent.blackboard.aim = angle;
        angle
    }

    /// Locks the aim onto the live target, keeping the previous aim if none.
    pub fn aim_at_target(&mut self) -> f32 {
        match self.target() {
            Some(target) => self.aim_at(target),
            None => self.agent.blackboard.aim,
        }
    }

    pub fn owner_agent(&self) -> Option<&Agent> {
        self.agent.owner.and_then(|owner| self.peers.get(owner))
    }

    // ========================================================================
    // Timing and randomness
    // ========================================================================

    /// Number of newly due events of a schedule `first_ms + k * gap_ms`
    /// (`k < total`) measured from phase entry. Advances the sub-counter.
    pub fn cadence(&mut self, first_ms: u32, gap_ms: u32, total: u32) -> u32 {
        let elapsed = self.elapsed();
        let due = if elapsed < u64::from(first_ms) {
            0
        } else {
            let since_first = elapsed - u64::from(first_ms);
            let steps = since_first / u64::from(gap_ms.max(1)) + 1;
            steps.min(u64::from(total)) as u32
        };
        let fresh = due.saturating_sub(self.state.sub);
        self.state.sub = self.state.sub.max(due);
        fresh
    }

    /// Deterministic seed for one draw, distinct per machine and context.
    pub fn seed(&self, context: u32) -> u64 {
        let salt = match self.owner {
            StateOwner::Primary => 0,
            StateOwner::Ability(id) => (id as u32 + 1) << 16,
        };
        self.env
            .seed_for(self.now, self.agent.id, context ^ salt ^ self.state.sub.wrapping_mul(31))
    }

    pub fn random_range(&self, context: u32, min: u32, max: u32) -> u32 {
        self.env.rng.range(self.seed(context), min, max)
    }

    pub fn random_unit(&self, context: u32) -> f32 {
        self.env.rng.unit(self.seed(context))
    }

    pub fn coin(&self, context: u32) -> bool {
        self.env.rng.coin(self.seed(context))
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Requests a projectile with the agent's base damage and speed.
    pub fn fire(&mut self, kind: ProjectileKind, angle: f32, flags: ProjectileFlags) {
        self.fire_scaled(kind, angle, 1.0, 1.0, flags);
    }

    pub fn fire_scaled(
        &mut self,
        kind: ProjectileKind,
        angle: f32,
        damage_scale: f32,
        speed_scale: f32,
        flags: ProjectileFlags,
    ) {
        let stats = self.agent.stats;
        self.outbox.push_effect(Effect::SpawnProjectile(ProjectileSpec {
            owner: self.agent.id,
            origin: self.agent.position,
            angle,
            kind,
            damage: (stats.damage as f32 * damage_scale).round().max(0.0) as u32,
            speed: stats.projectile_speed * speed_scale,
            flags,
        }));
    }

    /// Single melee damage tick. A shielded target within reach blocks it and
    /// raises a shield-block interrupt on this agent instead.
    pub fn strike(&mut self, angle: f32, reach: f32) -> bool {
        let position = self.agent.position;
        if let Some(target) = self.agent.target
            && self.env.players.is_shielded(target.id)
            && target.last_known.distance(position) <= reach
        {
            self.raised = Some(Interrupt::ShieldBlock);
            return false;
        }
        self.outbox.push_effect(Effect::MeleeStrike {
            agent: self.agent.id,
            origin: position,
            angle,
            reach,
            damage: self.agent.stats.damage,
        });
        true
    }

    pub fn effect(&mut self, effect: Effect) {
        self.outbox.push_effect(effect);
    }

    pub fn event(&mut self, event: CombatEvent) {
        self.outbox.push_event(event);
    }

    /// Requests a child agent owned by this one.
    pub fn spawn(&mut self, archetype: Archetype, position: Vec2, stat_scale: f32) {
        self.commands.push(Command::Spawn {
            archetype,
            position,
            stat_scale,
            owner: Some(self.agent.id),
        });
    }

    pub fn heal(&mut self, target: AgentId, amount: u32) {
        self.commands.push(Command::Heal { target, amount });
    }

    /// Velocity for scripted phases and overlays.
    pub fn steer(&mut self, velocity: Vec2) {
        self.steer = Some(velocity);
    }

    pub fn steered(&self) -> Option<Vec2> {
        self.steer
    }

    // ========================================================================
    // Telegraphs
    // ========================================================================

    pub(crate) fn play_telegraph(&mut self, shape: TelegraphShape, duration_ms: u32) {
        self.agent.telegraph = Some(self.owner);
        self.outbox.push_effect(Effect::PlayTelegraph {
            agent: self.agent.id,
            shape,
            angle: self.agent.blackboard.aim,
            duration_ms,
        });
    }

    /// Forgets a telegraph that ran its natural course.
    pub(crate) fn finish_telegraph(&mut self) {
        if self.agent.telegraph == Some(self.owner) {
            self.agent.telegraph = None;
        }
    }

    /// Tells the collaborator to clear a telegraph cut short.
    pub(crate) fn clear_telegraph(&mut self) {
        if self.agent.telegraph == Some(self.owner) {
            self.agent.telegraph = None;
            self.outbox.push_effect(Effect::ClearTelegraph {
                agent: self.agent.id,
            });
        }
    }
}
