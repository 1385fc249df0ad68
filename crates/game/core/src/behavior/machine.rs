//! Deadline-driven phase advancement.
//!
//! A machine only ever moves forward when its deadline passes or a
//! conditional phase asks to leave; the only other way out of a phase is
//! [`abort`], which the interrupt bus calls. Transitions caused by a passed
//! deadline are back-dated to that deadline, so a late frame never stretches
//! a cycle and chained zero-length phases resolve within one tick.

use crate::behavior::{
    InterruptResponse, PhaseCtx, PhaseFlow, PhaseSpec, PhaseTable, PhaseTag, TableKind, Timing,
};
use crate::config::CombatConfig;
use crate::state::{Deadline, Timestamp};

/// Cursor of one state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineState {
    pub tag: PhaseTag,
    pub entered_at: Timestamp,
    /// `None` for open-ended conditional phases and idle abilities.
    pub deadline: Option<Deadline>,
    /// Sub-step counter (shots fired, waves dropped) owned by the phase.
    pub sub: u32,
}

impl MachineState {
    pub const fn idle(now: Timestamp) -> Self {
        Self {
            tag: PhaseTag::Idle,
            entered_at: now,
            deadline: None,
            sub: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.tag == PhaseTag::Idle
    }

    pub fn elapsed(&self, now: Timestamp) -> u64 {
        now.since(self.entered_at)
    }
}

/// Whether an ability machine is still running after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Running,
    Finished,
}

/// Shifts a paused machine forward so the paused time does not count.
pub(crate) fn delay(state: &mut MachineState, ms: u64) {
    if ms == 0 {
        return;
    }
    state.entered_at = state.entered_at + ms;
    state.deadline = state.deadline.map(|deadline| Deadline::at(deadline.timestamp() + ms));
}

/// Enters `spec` as if at `at`.
pub(crate) fn enter(ctx: &mut PhaseCtx<'_>, spec: &'static PhaseSpec, at: Timestamp) {
    let duration = match spec.timing {
        Timing::Fixed(ms) => Some(ms),
        Timing::Random { min_ms, max_ms } => {
            let seed = ctx.seed(spec.tag as u32);
            Some(ctx.env.rng.range(seed, min_ms, max_ms))
        }
        Timing::UntilCondition { max_ms, .. } => max_ms,
    };
    ctx.state = MachineState {
        tag: spec.tag,
        entered_at: at,
        deadline: duration.map(|ms| Deadline::after(at, ms)),
        sub: 0,
    };

    if spec.movement.claims_lock() {
        if !ctx.agent.claim_lock(ctx.owner) {
            tracing::debug!(agent = %ctx.agent.id, phase = spec.tag.as_str(), "movement lock contended");
        }
    } else {
        ctx.agent.release_lock(ctx.owner);
    }

    if let Some(hook) = spec.on_enter {
        hook(ctx);
    }
    if let Some(shape) = spec.telegraph {
        let duration_ms = duration.unwrap_or_else(|| spec.timing.min_ms());
        ctx.play_telegraph(shape, duration_ms);
    }

    tracing::trace!(
        agent = %ctx.agent.id,
        owner = ?ctx.owner,
        phase = spec.tag.as_str(),
        at = %at,
        "phase entered"
    );
}

/// Advances a running machine up to `ctx.now`.
pub(crate) fn step(ctx: &mut PhaseCtx<'_>, table: &PhaseTable) -> StepOutcome {
    for _ in 0..CombatConfig::MAX_TRANSITIONS_PER_TICK {
        let Some(spec) = table.phase(ctx.state.tag) else {
            if table.kind() == TableKind::Ability {
                return StepOutcome::Finished;
            }
            tracing::warn!(agent = %ctx.agent.id, table = table.name(), phase = ?ctx.state.tag, "phase missing from table, restarting");
            let now = ctx.now;
            enter(ctx, table.entry(), now);
            return StepOutcome::Running;
        };

        if spec.movement.claims_lock() {
            ctx.agent.claim_lock(ctx.owner);
        }
        let flow = spec.on_tick.map_or(PhaseFlow::Stay, |hook| hook(ctx));
        if !ctx.agent.is_alive() {
            return StepOutcome::Running;
        }

        let due = ctx.state.deadline.filter(|deadline| deadline.is_due(ctx.now));
        let early = flow == PhaseFlow::Advance
            && spec.timing.is_conditional()
            && ctx.state.elapsed(ctx.now) >= u64::from(spec.timing.min_ms());
        let at = match (due, early) {
            (Some(deadline), _) => deadline.timestamp(),
            (None, true) => ctx.now,
            (None, false) => return StepOutcome::Running,
        };

        if let Some(hook) = spec.on_exit {
            hook(ctx);
        }
        ctx.finish_telegraph();

        let next = spec.next.resolve(ctx.agent);
        if table.kind() == TableKind::Ability && next == PhaseTag::Idle {
            ctx.agent.release_lock(ctx.owner);
            ctx.state = MachineState::idle(at);
            tracing::trace!(agent = %ctx.agent.id, owner = ?ctx.owner, "ability finished");
            return StepOutcome::Finished;
        }
        let next_spec = table.phase(next).unwrap_or_else(|| table.entry());
        enter(ctx, next_spec, at);
    }

    tracing::debug!(agent = %ctx.agent.id, table = table.name(), "transition budget exhausted");
    StepOutcome::Running
}

/// Applies an aborting response. Returns `(from, to)` if the machine moved.
///
/// The aborted phase's exit hook does not run; its lock is released and its
/// telegraph cleared through the collaborator.
pub(crate) fn abort(
    ctx: &mut PhaseCtx<'_>,
    table: &PhaseTable,
    response: InterruptResponse,
) -> Option<(PhaseTag, PhaseTag)> {
    let from = ctx.state.tag;
    let to = match response {
        InterruptResponse::AbortToIdle => PhaseTag::Idle,
        InterruptResponse::AbortTo(tag) => tag,
        InterruptResponse::Ignore | InterruptResponse::Displace => return None,
    };
    if from == PhaseTag::Idle {
        return None;
    }

    ctx.agent.release_lock(ctx.owner);
    ctx.clear_telegraph();

    let now = ctx.now;
    match (table.kind(), table.phase(to)) {
        (TableKind::Ability, _) if to == PhaseTag::Idle => ctx.state = MachineState::idle(now),
        (_, Some(spec)) => enter(ctx, spec, now),
        (_, None) => enter(ctx, table.entry(), now),
    }
    Some((from, to))
}
