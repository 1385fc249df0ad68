//! Hook registry for managing and executing frame hooks.

use std::sync::Arc;

use arena_core::CombatEvent;
use tracing::{debug, error};

use super::{FrameHook, HookContext, HookCriticality, HookOutput, LootHook};
use crate::error::{Result, RuntimeError};

type HookFn = dyn Fn(&HookContext<'_>) -> std::result::Result<Vec<HookOutput>, String> + Send + Sync;
type FilterFn = dyn Fn(&CombatEvent) -> bool + Send + Sync;

/// Hook assembled from closures.
pub struct FnHook {
    name: &'static str,
    priority: i32,
    criticality: HookCriticality,
    filter: Box<FilterFn>,
    run: Box<HookFn>,
}

impl FnHook {
    pub fn new<F, R>(name: &'static str, filter: F, run: R) -> Self
    where
        F: Fn(&CombatEvent) -> bool + Send + Sync + 'static,
        R: Fn(&HookContext<'_>) -> std::result::Result<Vec<HookOutput>, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name,
            priority: 0,
            criticality: HookCriticality::Important,
            filter: Box::new(filter),
            run: Box::new(run),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_criticality(mut self, criticality: HookCriticality) -> Self {
        self.criticality = criticality;
        self
    }
}

impl FrameHook for FnHook {
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn criticality(&self) -> HookCriticality {
        self.criticality
    }

    fn should_trigger(&self, ctx: &HookContext<'_>) -> bool {
        (self.filter)(ctx.event)
    }

    fn run(&self, ctx: &HookContext<'_>) -> std::result::Result<Vec<HookOutput>, String> {
        (self.run)(ctx)
    }
}

impl std::fmt::Debug for FnHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHook")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("criticality", &self.criticality)
            .finish_non_exhaustive()
    }
}

/// Registry that manages and executes frame hooks.
///
/// Hooks run in priority order (lower first); hooks with equal priority
/// keep their registration order.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn FrameHook>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Creates a registry with the default set of hooks.
    ///
    /// Default hooks include:
    /// - LootHook: requests loot where a regular enemy or boss died
    pub fn default_hooks() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LootHook));
        registry
    }

    pub fn register(&mut self, hook: Arc<dyn FrameHook>) {
        self.hooks.push(hook);
        // Stable sort keeps registration order within a priority.
        self.hooks.sort_by_key(|hook| hook.priority());
    }

    /// Registers a closure run for every [`CombatEvent::AgentDied`].
    pub fn on_agent_death<R>(&mut self, name: &'static str, run: R)
    where
        R: Fn(&HookContext<'_>) -> std::result::Result<Vec<HookOutput>, String>
            + Send
            + Sync
            + 'static,
    {
        let filter = |event: &CombatEvent| matches!(event, CombatEvent::AgentDied { .. });
        self.register(Arc::new(FnHook::new(name, filter, run)));
    }

    /// Registers a closure run for every [`CombatEvent::StatusTriggered`].
    pub fn on_status_triggered<R>(&mut self, name: &'static str, run: R)
    where
        R: Fn(&HookContext<'_>) -> std::result::Result<Vec<HookOutput>, String>
            + Send
            + Sync
            + 'static,
    {
        let filter = |event: &CombatEvent| matches!(event, CombatEvent::StatusTriggered { .. });
        self.register(Arc::new(FnHook::new(name, filter, run)));
    }

    /// Executes every triggered hook for one event.
    ///
    /// # Error Handling
    ///
    /// Hook failures are handled based on criticality level:
    /// - `Critical`: Returns error immediately, failing the frame
    /// - `Important`: Logs error and continues to next hook (default)
    /// - `Optional`: Logs at debug level and continues silently
    pub fn execute(&self, ctx: &HookContext<'_>) -> Result<Vec<HookOutput>> {
        let mut outputs = Vec::new();
        for hook in &self.hooks {
            if !hook.should_trigger(ctx) {
                continue;
            }
            match hook.run(ctx) {
                Ok(produced) => outputs.extend(produced),
                Err(reason) => Self::handle_hook_error(hook.as_ref(), reason)?,
            }
        }
        Ok(outputs)
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Returns an iterator over hook names and priorities (for debugging).
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.hooks.iter().map(|hook| (hook.name(), hook.priority()))
    }

    fn handle_hook_error(hook: &dyn FrameHook, reason: String) -> Result<()> {
        match hook.criticality() {
            HookCriticality::Critical => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "critical",
                    error = %reason,
                    "Critical hook failed, aborting frame"
                );
                Err(RuntimeError::Hook {
                    hook: hook.name(),
                    reason,
                })
            }
            HookCriticality::Important => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "important",
                    error = %reason,
                    "Hook failed, continuing"
                );
                Ok(())
            }
            HookCriticality::Optional => {
                debug!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "optional",
                    error = %reason,
                    "Optional hook failed"
                );
                Ok(())
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::default_hooks()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|hook| hook.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use arena_core::{AgentId, Archetype, StatusKind, Timestamp, World};

    use super::*;

    fn status_event() -> CombatEvent {
        CombatEvent::StatusTriggered {
            agent: AgentId::new(0, 0),
            kind: StatusKind::Ignite,
        }
    }

    #[test]
    fn hooks_run_in_priority_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        for (name, priority) in [("late", 10), ("early", -10), ("default", 0)] {
            let order = Arc::clone(&order);
            let hook = FnHook::new(name, |_| true, move |_| {
                order.lock().map_err(|e| e.to_string())?.push(name);
                Ok(Vec::new())
            })
            .with_priority(priority);
            registry.register(Arc::new(hook));
        }

        let event = status_event();
        let world = World::new();
        registry
            .execute(&HookContext::new(&event, &world, 0, Timestamp::ZERO))
            .expect("no hook fails");
        assert_eq!(*order.lock().expect("lock"), vec!["early", "default", "late"]);
    }

    #[test]
    fn only_critical_failures_fail_the_frame() {
        let event = status_event();
        let world = World::new();
        let ctx = HookContext::new(&event, &world, 0, Timestamp::ZERO);

        let mut lenient = HookRegistry::new();
        lenient.on_status_triggered("flaky", |_| Err("boom".into()));
        lenient.register(Arc::new(
            FnHook::new("cosmetic", |_| true, |_| Err("nope".into()))
                .with_criticality(HookCriticality::Optional),
        ));
        assert_eq!(lenient.execute(&ctx).expect("continues"), Vec::new());

        let mut strict = HookRegistry::new();
        strict.register(Arc::new(
            FnHook::new("ledger", |_| true, |_| Err("ledger offline".into()))
                .with_criticality(HookCriticality::Critical),
        ));
        match strict.execute(&ctx) {
            Err(RuntimeError::Hook { hook, reason }) => {
                assert_eq!(hook, "ledger");
                assert_eq!(reason, "ledger offline");
            }
            other => panic!("expected hook failure, got {other:?}"),
        }
    }

    #[test]
    fn death_closures_ignore_other_events() {
        let mut registry = HookRegistry::new();
        registry.on_agent_death("count", |_| {
            Ok(vec![HookOutput::Spawn(arena_core::SpawnRequest::new(
                Archetype::Melee,
                arena_core::Vec2::ZERO,
            ))])
        });

        let world = World::new();
        let status = status_event();
        let ctx = HookContext::new(&status, &world, 0, Timestamp::ZERO);
        assert!(registry.execute(&ctx).expect("ok").is_empty());

        let died = CombatEvent::AgentDied {
            agent: AgentId::new(0, 0),
            archetype: Archetype::Ranged,
            position: arena_core::Vec2::ZERO,
        };
        let ctx = HookContext::new(&died, &world, 0, Timestamp::ZERO);
        assert_eq!(registry.execute(&ctx).expect("ok").len(), 1);
    }
}
