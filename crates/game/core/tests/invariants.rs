//! Properties that must hold under arbitrary interrupt and buildup traffic.

mod common;

use arena_core::{
    AbilityId, AbilityStage, AgentId, Archetype, BUILDUP_MAX, BuildupOutcome, CombatEvent,
    Interrupt, InterruptOutcome, PhaseTag, StateOwner, StatusKind, TargetId, Timestamp, Vec2,
};
use common::Harness;

/// xorshift64; enough to scramble interrupt traffic reproducibly.
struct Scrambler(u64);

impl Scrambler {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn assert_lock_consistent(harness: &Harness) {
    for (id, agent) in harness.world.agents() {
        assert!(agent.lock_holder_count() <= 1);
        if let Some(StateOwner::Ability(ability)) = agent.lock_holder() {
            let running = agent.ability(ability).is_some_and(|slot| !slot.is_idle());
            assert!(running, "{id} lock held by idle ability {ability:?}");
        }
    }
}

#[test]
fn movement_lock_has_one_holder_under_interrupt_storms() {
    let mut harness = Harness::with_player_at(Vec2::new(350.0, 0.0));
    let mut agents: Vec<AgentId> = [
        (Archetype::Brawler, Vec2::ZERO),
        (Archetype::HeavyGunner, Vec2::new(120.0, 40.0)),
        (Archetype::EvasiveCaster, Vec2::new(-150.0, 60.0)),
        (Archetype::Sniper, Vec2::new(0.0, 200.0)),
        (Archetype::Melee, Vec2::new(0.0, -120.0)),
    ]
    .into_iter()
    .map(|(archetype, position)| harness.spawn(archetype, position))
    .collect();
    harness.tick();

    let mut scrambler = Scrambler(0x9e37_79b9_7f4a_7c15);
    for frame in 0..1_200u64 {
        let angle = frame as f32 * 0.01;
        let player = Vec2::from_angle(angle) * 350.0;
        harness
            .arena
            .move_player(TargetId::PLAYER, player, harness.now);

        agents.retain(|id| harness.world.contains(*id));
        if !agents.is_empty() && scrambler.below(3) == 0 {
            let id = agents[scrambler.below(agents.len() as u64) as usize];
            match scrambler.below(4) {
                0 => {
                    harness.raise(id, Interrupt::Stun);
                }
                1 => {
                    let velocity = Vec2::from_angle(scrambler.below(628) as f32 / 100.0) * 400.0;
                    harness.raise(id, Interrupt::Knockback { velocity });
                }
                2 => {
                    harness.raise(id, Interrupt::ShieldBlock);
                }
                _ => {
                    harness.buildup(id, StatusKind::Stun, scrambler.below(6) as f32);
                }
            }
            assert_lock_consistent(&harness);
        }

        harness.frame();
        assert_lock_consistent(&harness);
        harness.world.drain_outbox();
    }
}

#[test]
fn repeated_stun_is_idempotent_on_state() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    let ranged = harness.spawn(Archetype::Ranged, Vec2::ZERO);
    harness.tick();
    harness.run_until(600, |_| {});
    assert_eq!(
        harness.world.current_primary_state(ranged),
        Some(PhaseTag::Aiming)
    );
    harness.world.drain_outbox();

    let first = harness.buildup(ranged, StatusKind::Stun, BUILDUP_MAX);
    assert_eq!(
        first,
        Some(BuildupOutcome::Triggered {
            active_until: Timestamp::from_millis(800)
        })
    );
    assert_eq!(harness.raise(ranged, Interrupt::Stun), InterruptOutcome::Ignored);

    harness.frame();
    let second = harness.buildup(ranged, StatusKind::Stun, BUILDUP_MAX);
    assert_eq!(
        second,
        Some(BuildupOutcome::Triggered {
            active_until: Timestamp::from_millis(850)
        })
    );
    assert_eq!(
        harness.world.current_primary_state(ranged),
        Some(PhaseTag::Idle)
    );

    let events = harness.world.drain_outbox().events;
    let triggers = events
        .iter()
        .filter(|event| matches!(event, CombatEvent::StatusTriggered { kind: StatusKind::Stun, .. }))
        .count();
    let aborts = events
        .iter()
        .filter(|event| matches!(event, CombatEvent::Interrupted { .. }))
        .count();
    assert_eq!(triggers, 2);
    assert_eq!(aborts, 1);
}

#[test]
fn interrupted_ability_keeps_its_cooldown() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);
    harness.tick();
    harness.run_until(4_500, |_| {});
    assert_eq!(
        harness.world.current_ability_state(boss, AbilityId::AssaultCombo),
        Some(AbilityStage::Channeling)
    );

    harness.buildup(boss, StatusKind::Stun, BUILDUP_MAX);
    assert_eq!(
        harness.world.current_ability_state(boss, AbilityId::AssaultCombo),
        Some(AbilityStage::Idle)
    );
    assert_eq!(harness.world.lock_holder(boss), None);

    for _ in 0..100 {
        harness.frame();
        let agent = harness.world.agent(boss).expect("brawler alive");
        let slot = agent.ability(AbilityId::AssaultCombo).expect("assault slot");
        assert_eq!(slot.cooldown_until, Timestamp::from_millis(24_000));
        assert!(slot.is_idle());
    }
}

#[test]
fn buildup_stays_in_bounds_for_any_input() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    let melee = harness.spawn(Archetype::Melee, Vec2::ZERO);
    let amounts = [
        3.0,
        -20.0,
        f32::NAN,
        f32::INFINITY,
        f32::NEG_INFINITY,
        9.99,
        0.02,
        -0.5,
        7.0,
        1e9,
        0.0,
        4.0,
        6.0,
    ];

    for kind in [StatusKind::Ignite, StatusKind::Toxin, StatusKind::Stun] {
        for amount in amounts {
            harness.buildup(melee, kind, amount);
            let agent = harness.world.agent(melee).expect("melee alive");
            let buildup = agent.status.buildup(kind);
            assert!((0.0..BUILDUP_MAX).contains(&buildup), "{kind:?} at {buildup}");
        }
    }

    let agent = harness.world.agent(melee).expect("melee alive");
    assert_eq!(agent.status.buildup(StatusKind::Toxin), 0.0);
    assert!(agent.status.is_active(StatusKind::Toxin, harness.now));
}
