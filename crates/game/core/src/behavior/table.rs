//! Static phase descriptions and load-time table validation.

use crate::behavior::{PhaseCtx, PhaseTag};
use crate::error::{ErrorSeverity, GameError};
use crate::interrupt::InterruptKind;
use crate::state::{AbilityStage, Agent, TelegraphShape};

/// Hook run when a phase is entered or exited.
pub type PhaseHook = fn(&mut PhaseCtx<'_>);

/// Hook run every tick while the phase is current.
pub type PhaseTickHook = fn(&mut PhaseCtx<'_>) -> PhaseFlow;

/// Chooses one of a branch's options from the agent's blackboard.
pub type BranchPick = fn(&Agent) -> usize;

/// What a tick hook asks of the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PhaseFlow {
    #[default]
    Stay,
    /// Leave early. Honored only by conditional phases past their minimum.
    Advance,
}

/// How long a phase lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timing {
    Fixed(u32),
    /// Duration rolled uniformly in `min_ms..=max_ms` on entry.
    Random { min_ms: u32, max_ms: u32 },
    /// Leaves when the tick hook returns [`PhaseFlow::Advance`] after
    /// `min_ms`, or at `max_ms` if one is set.
    UntilCondition { min_ms: u32, max_ms: Option<u32> },
}

impl Timing {
    pub const fn min_ms(self) -> u32 {
        match self {
            Timing::Fixed(ms) => ms,
            Timing::Random { min_ms, .. } | Timing::UntilCondition { min_ms, .. } => min_ms,
        }
    }

    pub const fn is_conditional(self) -> bool {
        matches!(self, Timing::UntilCondition { .. })
    }

    fn is_valid(self) -> bool {
        match self {
            Timing::Fixed(_) => true,
            Timing::Random { min_ms, max_ms } => max_ms >= min_ms,
            Timing::UntilCondition { min_ms, max_ms } => max_ms.is_none_or(|max| max >= min_ms),
        }
    }
}

/// Movement rule of a phase for the machine controlling the agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Movement {
    /// Archetype locomotion (chase, kite, orbit).
    Free,
    /// Locomotion scaled by the factor.
    Penalty(f32),
    /// Standing still without claiming the lock.
    Hold,
    /// Standing still; claims the movement lock.
    Frozen,
    /// Velocity set by the phase's own hooks; claims the movement lock.
    Scripted,
}

impl Movement {
    pub const fn claims_lock(self) -> bool {
        matches!(self, Movement::Frozen | Movement::Scripted)
    }
}

/// Successor of a phase.
#[derive(Clone, Copy, Debug)]
pub enum Next {
    Tag(PhaseTag),
    Branch {
        options: &'static [PhaseTag],
        pick: BranchPick,
    },
}

impl Next {
    /// Resolves the successor for `agent`. Out-of-range picks clamp to the last option.
    pub fn resolve(&self, agent: &Agent) -> PhaseTag {
        match *self {
            Next::Tag(tag) => tag,
            Next::Branch { options, pick } => {
                let index = pick(agent).min(options.len().saturating_sub(1));
                options.get(index).copied().unwrap_or_default()
            }
        }
    }

    fn targets(&self) -> &[PhaseTag] {
        match self {
            Next::Tag(tag) => std::slice::from_ref(tag),
            Next::Branch { options, .. } => options,
        }
    }
}

/// Reaction of a phase to one interrupt kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptResponse {
    /// State, lock and velocity stay untouched.
    Ignore,
    /// Phase continues; the lock is cleared and a knockback impulse applies.
    Displace,
    /// Abort to the named phase of the same table.
    AbortTo(PhaseTag),
    /// Abort to idle. Ability cooldowns are not refunded.
    AbortToIdle,
}

impl InterruptResponse {
    pub const fn aborts(self) -> bool {
        matches!(
            self,
            InterruptResponse::AbortTo(_) | InterruptResponse::AbortToIdle
        )
    }
}

/// Per-kind interrupt responses of one phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptPolicy {
    pub stun: InterruptResponse,
    pub knockback: InterruptResponse,
    pub shield_block: InterruptResponse,
}

impl InterruptPolicy {
    /// Stun aborts to idle, knockback displaces, shield blocks are ignored.
    pub const DEFAULT: Self = Self {
        stun: InterruptResponse::AbortToIdle,
        knockback: InterruptResponse::Displace,
        shield_block: InterruptResponse::Ignore,
    };

    pub const fn response(&self, kind: InterruptKind) -> InterruptResponse {
        match kind {
            InterruptKind::Stun => self.stun,
            InterruptKind::Knockback => self.knockback,
            InterruptKind::ShieldBlock => self.shield_block,
        }
    }
}

impl Default for InterruptPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One named behaviour period.
#[derive(Clone, Copy, Debug)]
pub struct PhaseSpec {
    pub tag: PhaseTag,
    /// Ability stage reported while an ability sits in this phase.
    pub stage: AbilityStage,
    pub timing: Timing,
    pub movement: Movement,
    /// Played on entry for the phase's nominal duration.
    pub telegraph: Option<TelegraphShape>,
    pub next: Next,
    pub on_enter: Option<PhaseHook>,
    pub on_tick: Option<PhaseTickHook>,
    pub on_exit: Option<PhaseHook>,
    pub interrupts: InterruptPolicy,
    /// Ability phases only: whether the primary cycle is paused meanwhile.
    pub suppress_primary: bool,
}

impl PhaseSpec {
    pub const fn new(tag: PhaseTag, timing: Timing) -> Self {
        Self {
            tag,
            stage: AbilityStage::Active,
            timing,
            movement: Movement::Free,
            telegraph: None,
            next: Next::Tag(PhaseTag::Idle),
            on_enter: None,
            on_tick: None,
            on_exit: None,
            interrupts: InterruptPolicy::DEFAULT,
            suppress_primary: true,
        }
    }

    pub const fn stage(mut self, stage: AbilityStage) -> Self {
        self.stage = stage;
        self
    }

    pub const fn movement(mut self, movement: Movement) -> Self {
        self.movement = movement;
        self
    }

    pub const fn telegraph(mut self, shape: TelegraphShape) -> Self {
        self.telegraph = Some(shape);
        self
    }

    pub const fn then(mut self, tag: PhaseTag) -> Self {
        self.next = Next::Tag(tag);
        self
    }

    pub const fn branch(mut self, options: &'static [PhaseTag], pick: BranchPick) -> Self {
        self.next = Next::Branch { options, pick };
        self
    }

    pub const fn on_enter(mut self, hook: PhaseHook) -> Self {
        self.on_enter = Some(hook);
        self
    }

    pub const fn on_tick(mut self, hook: PhaseTickHook) -> Self {
        self.on_tick = Some(hook);
        self
    }

    pub const fn on_exit(mut self, hook: PhaseHook) -> Self {
        self.on_exit = Some(hook);
        self
    }

    pub const fn on_stun(mut self, response: InterruptResponse) -> Self {
        self.interrupts.stun = response;
        self
    }

    pub const fn on_knockback(mut self, response: InterruptResponse) -> Self {
        self.interrupts.knockback = response;
        self
    }

    pub const fn on_shield_block(mut self, response: InterruptResponse) -> Self {
        self.interrupts.shield_block = response;
        self
    }

    /// Ability phase during which the primary cycle keeps running.
    pub const fn concurrent(mut self) -> Self {
        self.suppress_primary = false;
        self
    }
}

/// Which kind of machine a table drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    /// Loops forever; the first phase must be `Idle`.
    Primary,
    /// Starts at its first phase; `Idle` is implicit and ends the ability.
    Ability,
}

/// Authoring defects detected while building a [`PhaseTable`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("table '{table}': phase {from:?} names undefined phase {to:?}")]
    InvalidTransition {
        table: &'static str,
        from: PhaseTag,
        to: PhaseTag,
    },

    #[error("table '{table}' has no valid entry phase")]
    MissingEntry { table: &'static str },

    #[error("table '{table}' defines phase {tag:?} twice")]
    DuplicatePhase { table: &'static str, tag: PhaseTag },

    #[error("table '{table}': phase {tag:?} has an invalid duration")]
    InvalidDuration { table: &'static str, tag: PhaseTag },

    #[error("table '{table}': phase {tag:?} branches to nothing")]
    EmptyBranch { table: &'static str, tag: PhaseTag },

    #[error("table '{table}': phase {tag:?} holds the movement lock but ignores stun")]
    UninterruptibleLock { table: &'static str, tag: PhaseTag },

    #[error("ability table '{table}' is exclusive but its entry does not claim the lock")]
    UnlockedExclusive { table: &'static str },

    #[error("archetype '{archetype}' declares more abilities than an agent can hold")]
    TooManyAbilities { archetype: &'static str },

    #[error("no blueprint registered for archetype '{archetype}'")]
    MissingArchetype { archetype: &'static str },
}

impl GameError for TableError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            TableError::InvalidTransition { .. } => "TABLE_INVALID_TRANSITION",
            TableError::MissingEntry { .. } => "TABLE_MISSING_ENTRY",
            TableError::DuplicatePhase { .. } => "TABLE_DUPLICATE_PHASE",
            TableError::InvalidDuration { .. } => "TABLE_INVALID_DURATION",
            TableError::EmptyBranch { .. } => "TABLE_EMPTY_BRANCH",
            TableError::UninterruptibleLock { .. } => "TABLE_UNINTERRUPTIBLE_LOCK",
            TableError::UnlockedExclusive { .. } => "TABLE_UNLOCKED_EXCLUSIVE",
            TableError::TooManyAbilities { .. } => "TABLE_TOO_MANY_ABILITIES",
            TableError::MissingArchetype { .. } => "TABLE_MISSING_ARCHETYPE",
        }
    }
}

/// A validated static phase table.
#[derive(Clone, Copy, Debug)]
pub struct PhaseTable {
    name: &'static str,
    kind: TableKind,
    phases: &'static [PhaseSpec],
}

impl PhaseTable {
    /// Validates `phases` and wraps them.
    ///
    /// # Errors
    ///
    /// Any [`TableError`] describing the first defect found.
    pub fn new(
        name: &'static str,
        kind: TableKind,
        phases: &'static [PhaseSpec],
    ) -> Result<Self, TableError> {
        let table = Self { name, kind, phases };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), TableError> {
        let table = self.name;
        let entry = self.phases.first().ok_or(TableError::MissingEntry { table })?;
        match self.kind {
            TableKind::Primary if entry.tag != PhaseTag::Idle => {
                return Err(TableError::MissingEntry { table });
            }
            TableKind::Ability if self.phases.iter().any(|p| p.tag == PhaseTag::Idle) => {
                return Err(TableError::MissingEntry { table });
            }
            _ => {}
        }

        for (index, phase) in self.phases.iter().enumerate() {
            if self.phases[..index].iter().any(|p| p.tag == phase.tag) {
                return Err(TableError::DuplicatePhase {
                    table,
                    tag: phase.tag,
                });
            }
            if !phase.timing.is_valid() {
                return Err(TableError::InvalidDuration {
                    table,
                    tag: phase.tag,
                });
            }
            if let Movement::Penalty(factor) = phase.movement
                && !(0.0..=1.0).contains(&factor)
            {
                return Err(TableError::InvalidDuration {
                    table,
                    tag: phase.tag,
                });
            }
            if phase.movement.claims_lock() && !phase.interrupts.stun.aborts() {
                return Err(TableError::UninterruptibleLock {
                    table,
                    tag: phase.tag,
                });
            }
            let targets = phase.next.targets();
            if targets.is_empty() {
                return Err(TableError::EmptyBranch {
                    table,
                    tag: phase.tag,
                });
            }
            let fallbacks = [
                phase.interrupts.stun,
                phase.interrupts.knockback,
                phase.interrupts.shield_block,
            ]
            .into_iter()
            .filter_map(|response| match response {
                InterruptResponse::AbortTo(tag) => Some(tag),
                _ => None,
            });
            for to in targets.iter().copied().chain(fallbacks) {
                if !self.resolves(to) {
                    return Err(TableError::InvalidTransition {
                        table,
                        from: phase.tag,
                        to,
                    });
                }
            }
        }
        Ok(())
    }

    fn resolves(&self, tag: PhaseTag) -> bool {
        (self.kind == TableKind::Ability && tag == PhaseTag::Idle) || self.phase(tag).is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn phases(&self) -> &'static [PhaseSpec] {
        self.phases
    }

    /// First phase: `Idle` for primaries, the opening phase for abilities.
    pub fn entry(&self) -> &'static PhaseSpec {
        // Validation guarantees a first phase.
        &self.phases[0]
    }

    pub fn phase(&self, tag: PhaseTag) -> Option<&'static PhaseSpec> {
        self.phases.iter().find(|phase| phase.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static LOOP: [PhaseSpec; 2] = [
        PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(100)).then(PhaseTag::Windup),
        PhaseSpec::new(PhaseTag::Windup, Timing::Fixed(300)).movement(Movement::Frozen),
    ];

    static DANGLING: [PhaseSpec; 1] =
        [PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(100)).then(PhaseTag::Sweep)];

    static BAD_FALLBACK: [PhaseSpec; 2] = [
        PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(100)).then(PhaseTag::Aiming),
        PhaseSpec::new(PhaseTag::Aiming, Timing::Fixed(100))
            .on_knockback(InterruptResponse::AbortTo(PhaseTag::Recover)),
    ];

    static NO_IDLE: [PhaseSpec; 1] = [PhaseSpec::new(PhaseTag::Aiming, Timing::Fixed(100))];

    static DUPLICATE: [PhaseSpec; 2] = [
        PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(100)),
        PhaseSpec::new(PhaseTag::Idle, Timing::Fixed(100)),
    ];

    static INVERTED: [PhaseSpec; 1] = [PhaseSpec::new(
        PhaseTag::Idle,
        Timing::Random {
            min_ms: 500,
            max_ms: 100,
        },
    )];

    static STUBBORN_LOCK: [PhaseSpec; 1] = [PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(100))
        .movement(Movement::Frozen)
        .on_stun(InterruptResponse::Ignore)];

    static ABILITY: [PhaseSpec; 2] = [
        PhaseSpec::new(PhaseTag::Channel, Timing::Fixed(100))
            .movement(Movement::Frozen)
            .then(PhaseTag::Release),
        PhaseSpec::new(PhaseTag::Release, Timing::Fixed(100)),
    ];

    #[test]
    fn valid_primary_table_builds() {
        let table = PhaseTable::new("loop", TableKind::Primary, &LOOP).expect("valid table");
        assert_eq!(table.entry().tag, PhaseTag::Idle);
        assert!(table.phase(PhaseTag::Windup).is_some());
    }

    #[test]
    fn undefined_successor_fails_at_load() {
        assert_eq!(
            PhaseTable::new("dangling", TableKind::Primary, &DANGLING).unwrap_err(),
            TableError::InvalidTransition {
                table: "dangling",
                from: PhaseTag::Idle,
                to: PhaseTag::Sweep,
            }
        );
    }

    #[test]
    fn undefined_fallback_fails_at_load() {
        assert!(matches!(
            PhaseTable::new("fallback", TableKind::Primary, &BAD_FALLBACK),
            Err(TableError::InvalidTransition {
                to: PhaseTag::Recover,
                ..
            })
        ));
    }

    #[test]
    fn primary_without_idle_entry_is_rejected() {
        assert_eq!(
            PhaseTable::new("no_idle", TableKind::Primary, &NO_IDLE).unwrap_err(),
            TableError::MissingEntry { table: "no_idle" }
        );
    }

    #[test]
    fn structural_defects_are_rejected() {
        assert!(matches!(
            PhaseTable::new("dup", TableKind::Primary, &DUPLICATE),
            Err(TableError::DuplicatePhase { .. })
        ));
        assert!(matches!(
            PhaseTable::new("inverted", TableKind::Primary, &INVERTED),
            Err(TableError::InvalidDuration { .. })
        ));
        assert!(matches!(
            PhaseTable::new("stubborn", TableKind::Ability, &STUBBORN_LOCK),
            Err(TableError::UninterruptibleLock { .. })
        ));
    }

    #[test]
    fn ability_tables_may_end_in_implicit_idle() {
        let table = PhaseTable::new("ability", TableKind::Ability, &ABILITY).expect("valid");
        assert_eq!(table.entry().tag, PhaseTag::Channel);
        assert_eq!(table.kind(), TableKind::Ability);
    }
}
