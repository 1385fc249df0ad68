//! End-to-end behaviour timelines driven frame by frame.

mod common;

use arena_core::{
    AbilityId, AbilityScheduler, AbilityStage, AgentId, Archetype, BuildupOutcome, CombatEvent, Effect,
    Interrupt, InterruptOutcome, PhaseTag, StateOwner, StatusKind, TargetId, Timestamp, Vec2,
};
use arena_core::behavior::archetypes::melee;
use arena_core::boss::brawler;
use common::Harness;

fn ms(value: u64) -> Timestamp {
    Timestamp::from_millis(value)
}

/// Records every primary phase change as `(tag, entered_at)`.
fn primary_timeline(
    harness: &mut Harness,
    id: AgentId,
    until: u64,
) -> Vec<(PhaseTag, Timestamp)> {
    fn push(harness: &Harness, id: AgentId, timeline: &mut Vec<(PhaseTag, Timestamp)>) {
        if let Some(agent) = harness.world.agent(id) {
            let entry = (agent.primary.tag, agent.primary.entered_at);
            if timeline.last() != Some(&entry) {
                timeline.push(entry);
            }
        }
    }

    let mut timeline = Vec::new();
    harness.tick();
    push(harness, id, &mut timeline);
    harness.run_until(until, |harness| push(harness, id, &mut timeline));
    timeline
}

/// Collects the times at which the assault combo began.
fn collect_assaults(harness: &mut Harness, began: &mut Vec<Timestamp>) {
    let now = harness.now;
    for event in harness.world.drain_outbox().events {
        if let CombatEvent::AbilityBegan {
            ability: AbilityId::AssaultCombo,
            ..
        } = event
        {
            began.push(now);
        }
    }
}

#[test]
fn brawler_long_variant_runs_once_and_cycle_five_starts_on_time() {
    // Far enough away that the assault combo never triggers.
    let mut harness = Harness::with_player_at(Vec2::new(2_000.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);

    let timeline = primary_timeline(&mut harness, boss, 18_000);

    let long_aims: Vec<_> = timeline
        .iter()
        .filter(|(tag, _)| *tag == PhaseTag::AimLong)
        .collect();
    assert_eq!(long_aims, vec![&(PhaseTag::AimLong, ms(10_500))]);
    assert!(timeline.contains(&(PhaseTag::BurstLong, ms(12_000))));
    assert!(timeline.contains(&(PhaseTag::Lockout, ms(15_000))));
    assert_eq!(timeline.last(), Some(&(PhaseTag::Aim, ms(18_000))));

    let agent = harness.world.agent(boss).expect("brawler alive");
    assert_eq!(agent.blackboard.cycles, 5);
}

#[test]
fn brawler_short_cycles_are_back_dated_to_their_deadlines() {
    let mut harness = Harness::with_player_at(Vec2::new(2_000.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);

    let timeline = primary_timeline(&mut harness, boss, 7_000);
    let aims: Vec<Timestamp> = timeline
        .iter()
        .filter(|(tag, _)| *tag == PhaseTag::Aim)
        .map(|(_, at)| *at)
        .collect();
    assert_eq!(aims, vec![ms(0), ms(3_500), ms(7_000)]);
}

#[test]
fn stun_during_aiming_forces_idle_in_the_same_call() {
    let mut harness = Harness::with_player_at(Vec2::new(400.0, 0.0));
    let sniper = harness.spawn(Archetype::Sniper, Vec2::ZERO);
    harness.tick();
    harness.run_until(1_000, |_| {});
    assert_eq!(
        harness.world.current_primary_state(sniper),
        Some(PhaseTag::Aiming)
    );

    let outcome = harness.buildup(sniper, StatusKind::Stun, 10.0);
    assert_eq!(
        outcome,
        Some(BuildupOutcome::Triggered {
            active_until: ms(1_200)
        })
    );
    assert_eq!(
        harness.world.current_primary_state(sniper),
        Some(PhaseTag::Idle)
    );
    assert_eq!(harness.world.velocity(sniper), Some(Vec2::ZERO));
    assert_eq!(harness.world.lock_holder(sniper), None);

    let mut reentered = None;
    harness.run_until(3_000, |harness| {
        if reentered.is_none()
            && harness.world.current_primary_state(sniper) == Some(PhaseTag::Aiming)
        {
            reentered = Some(harness.now);
        }
    });
    let reentered = reentered.expect("aiming is re-entered after the stun");
    assert!(reentered >= ms(1_200));
}

#[test]
fn toxin_scrambles_ranged_movement_without_touching_deadlines() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    let ranged = harness.spawn(Archetype::Ranged, Vec2::ZERO);
    harness.tick();
    let triggered = harness.buildup(ranged, StatusKind::Toxin, 10.0);
    assert!(triggered.is_some_and(|outcome| outcome.triggered()));

    let mut periods = Vec::new();
    let mut last_change = None;
    let mut timeline = Vec::new();
    harness.run_until(1_900, |harness| {
        let agent = harness.world.agent(ranged).expect("ranged alive");
        let wander = agent.steering.wander.expect("wandering while poisoned");
        if last_change != Some(wander.change_at) {
            periods.push(wander.change_at.since(harness.now));
            last_change = Some(wander.change_at);
        }
        let speed = agent.steering.resolved.length();
        assert!((speed - agent.stats.move_speed).abs() < 1e-3);

        let entry = (agent.primary.tag, agent.primary.entered_at);
        if timeline.last() != Some(&entry) {
            timeline.push(entry);
        }
    });

    assert!(periods.len() >= 2, "heading re-rolled {} times", periods.len());
    assert!(periods.iter().all(|period| (300..=700).contains(period)));
    assert!(timeline.contains(&(PhaseTag::Aiming, ms(500))));
    assert!(timeline.contains(&(PhaseTag::Firing, ms(1_200))));

    harness.run_until(2_100, |_| {});
    let agent = harness.world.agent(ranged).expect("ranged alive");
    assert!(agent.steering.wander.is_none());
}

#[test]
fn assault_cooldown_runs_from_the_moment_it_began() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);
    let profile = harness.engine.library().profile(Archetype::Brawler).clone();

    let mut began = Vec::new();
    harness.tick();
    collect_assaults(&mut harness, &mut began);
    harness.run_until(10_500, |harness| collect_assaults(harness, &mut began));
    assert_eq!(began, vec![ms(4_000)]);

    let agent = harness.world.agent(boss).expect("brawler alive");
    let slot = agent.ability(AbilityId::AssaultCombo).expect("assault slot");
    assert_eq!(slot.stage, AbilityStage::Idle);
    assert_eq!(slot.cooldown_until, ms(24_000));

    harness.run_until(23_950, |harness| collect_assaults(harness, &mut began));
    assert_eq!(began, vec![ms(4_000)]);
    let agent = harness.world.agent(boss).expect("brawler alive");
    assert!(!AbilityScheduler::is_ready(
        agent,
        &profile,
        AbilityId::AssaultCombo,
        harness.now
    ));

    harness.run_until(24_500, |harness| collect_assaults(harness, &mut began));
    assert_eq!(began, vec![ms(4_000), ms(24_000)]);
}

#[test]
fn knockback_is_ignored_during_the_dash_in() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);
    harness.tick();
    harness.run_until(6_050, |_| {});

    let agent = harness.world.agent(boss).expect("brawler alive");
    let slot = agent.ability(AbilityId::AssaultCombo).expect("assault slot");
    assert_eq!(slot.phase(), PhaseTag::DashIn);
    assert_eq!(
        agent.lock_holder(),
        Some(StateOwner::Ability(AbilityId::AssaultCombo))
    );
    let entered_at = slot.machine.entered_at;

    let outcome = harness.raise(
        boss,
        Interrupt::Knockback {
            velocity: Vec2::new(0.0, 900.0),
        },
    );
    assert_eq!(outcome, InterruptOutcome::Ignored);

    let agent = harness.world.agent(boss).expect("brawler alive");
    let slot = agent.ability(AbilityId::AssaultCombo).expect("assault slot");
    assert_eq!(slot.phase(), PhaseTag::DashIn);
    assert_eq!(slot.machine.entered_at, entered_at);
    assert!(agent.steering.impulse.is_none());
    assert_eq!(
        agent.lock_holder(),
        Some(StateOwner::Ability(AbilityId::AssaultCombo))
    );

    harness.frame();
    let velocity = harness.world.velocity(boss).expect("brawler alive");
    assert!(velocity.x > 0.0);
    assert!(velocity.y.abs() < 1e-3);
}

#[test]
fn knockback_aborts_sniper_aiming_and_clears_its_telegraph() {
    let mut harness = Harness::with_player_at(Vec2::new(400.0, 0.0));
    let sniper = harness.spawn(Archetype::Sniper, Vec2::ZERO);
    harness.tick();
    harness.run_until(1_000, |_| {});

    let agent = harness.world.agent(sniper).expect("sniper alive");
    assert_eq!(agent.primary.tag, PhaseTag::Aiming);
    assert_eq!(agent.telegraph_owner(), Some(StateOwner::Primary));
    harness.world.drain_outbox();

    let outcome = harness.raise(
        sniper,
        Interrupt::Knockback {
            velocity: Vec2::new(-300.0, 0.0),
        },
    );
    assert_eq!(
        outcome,
        InterruptOutcome::Aborted {
            from: PhaseTag::Aiming,
            to: PhaseTag::Idle,
            ability: None,
        }
    );

    let agent = harness.world.agent(sniper).expect("sniper alive");
    assert_eq!(agent.primary.tag, PhaseTag::Idle);
    assert_eq!(agent.telegraph_owner(), None);
    assert_eq!(agent.lock_holder(), None);
    assert!(agent.steering.impulse.is_some());

    let outbox = harness.world.drain_outbox();
    assert!(outbox.effects.contains(&Effect::ClearTelegraph { agent: sniper }));
    assert!(outbox.events.iter().any(|event| matches!(
        event,
        CombatEvent::Interrupted { agent, from: PhaseTag::Aiming, .. } if *agent == sniper
    )));

    harness.frame();
    let velocity = harness.world.velocity(sniper).expect("sniper alive");
    assert!(velocity.x < 0.0);
}

/// Drives a melee agent standing next to a player through one swing.
fn melee_swing(shielded: bool) -> (Vec<(PhaseTag, Timestamp)>, Vec<Effect>, Vec<CombatEvent>) {
    let mut harness = Harness::with_player_at(Vec2::new(30.0, 0.0));
    harness.arena.set_shield(TargetId::PLAYER, shielded);
    let grunt = harness.spawn(Archetype::Melee, Vec2::ZERO);

    let mut effects = Vec::new();
    let mut events = Vec::new();
    let mut timeline = Vec::new();
    harness.tick();
    harness.run_until(1_600, |harness| {
        let outbox = harness.world.drain_outbox();
        effects.extend(outbox.effects);
        events.extend(outbox.events);
        if let Some(agent) = harness.world.agent(grunt) {
            let entry = (agent.primary.tag, agent.primary.entered_at);
            if timeline.last() != Some(&entry) {
                timeline.push(entry);
            }
        }
    });
    (timeline, effects, events)
}

fn entered(timeline: &[(PhaseTag, Timestamp)], tag: PhaseTag) -> Timestamp {
    timeline
        .iter()
        .find(|(entry, _)| *entry == tag)
        .map(|(_, at)| *at)
        .unwrap_or_else(|| panic!("{tag:?} never entered: {timeline:?}"))
}

#[test]
fn shielded_target_cuts_the_sweep_short_without_a_strike() {
    let (timeline, effects, events) = melee_swing(true);

    let sweep = entered(&timeline, PhaseTag::Sweep);
    let recover = entered(&timeline, PhaseTag::Recover);
    assert!(recover > sweep);
    assert!(
        recover.since(sweep) < u64::from(melee::SWEEP_MS),
        "recover at {recover} should cut the sweep entered at {sweep} short"
    );

    assert!(
        !effects
            .iter()
            .any(|effect| matches!(effect, Effect::MeleeStrike { .. })),
        "a blocked sweep must not strike"
    );
    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::Interrupted {
            from: PhaseTag::Sweep,
            to: PhaseTag::Recover,
            ability: None,
            ..
        }
    )));
}

#[test]
fn unshielded_target_takes_the_strike_and_the_sweep_runs_out() {
    let (timeline, effects, _) = melee_swing(false);

    let sweep = entered(&timeline, PhaseTag::Sweep);
    let recover = entered(&timeline, PhaseTag::Recover);
    assert_eq!(recover.since(sweep), u64::from(melee::SWEEP_MS));
    assert_eq!(
        effects
            .iter()
            .filter(|effect| matches!(effect, Effect::MeleeStrike { .. }))
            .count(),
        1
    );
}

/// Progress of the heal-summon ability while frames run.
#[derive(Default)]
struct SummonWatch {
    began: usize,
    summon_entered: Option<Timestamp>,
    first_healer: Option<Timestamp>,
    most_healers: usize,
}

impl SummonWatch {
    fn observe(&mut self, harness: &mut Harness, boss: AgentId) {
        for event in harness.world.drain_outbox().events {
            if let CombatEvent::AbilityBegan {
                ability: AbilityId::HealSummon,
                ..
            } = event
            {
                self.began += 1;
            }
        }
        let Some(agent) = harness.world.agent(boss) else {
            return;
        };
        if let Some(slot) = agent.ability(AbilityId::HealSummon)
            && slot.machine.tag == PhaseTag::Summon
            && self.summon_entered.is_none()
        {
            self.summon_entered = Some(slot.machine.entered_at);
        }
        let healers = agent.live_children(Archetype::Healer);
        if healers > 0 && self.first_healer.is_none() {
            self.first_healer = Some(harness.now);
        }
        self.most_healers = self.most_healers.max(healers);
    }
}

/// Damages `id` down to `fraction` of its maximum health.
fn wound_to(harness: &mut Harness, id: AgentId, fraction: f32) {
    let health = harness.world.agent(id).expect("agent alive").health;
    let floor = (health.max as f32 * fraction) as u32;
    harness.damage(id, health.current.saturating_sub(floor));
}

#[test]
fn brawler_heal_summon_fires_once_per_threshold_and_respects_the_cap() {
    let mut harness = Harness::with_player_at(Vec2::new(10_000.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);
    harness.tick();
    harness.run_until(500, |_| {});
    harness.world.drain_outbox();

    // First threshold.
    wound_to(&mut harness, boss, 0.6);
    let mut first = SummonWatch::default();
    harness.run_until(5_000, |harness| first.observe(harness, boss));

    assert_eq!(first.began, 1);
    assert_eq!(first.most_healers, brawler::HEALER_CAP);
    let summon_entered = first.summon_entered.expect("summon phase entered");
    let first_healer = first.first_healer.expect("healers arrived");
    assert!(first_healer.since(summon_entered) >= u64::from(brawler::SUMMON_DELAY_MS));

    // Above the second threshold nothing re-arms the summon.
    let mut idle = SummonWatch::default();
    harness.run_until(9_000, |harness| idle.observe(harness, boss));
    assert_eq!(idle.began, 0);
    let agent = harness.world.agent(boss).expect("brawler alive");
    assert_eq!(agent.live_children(Archetype::Healer), brawler::HEALER_CAP);

    // Second threshold with one healer lost tops the pack back up to the cap.
    let lost = agent
        .children
        .iter()
        .find(|child| child.archetype == Archetype::Healer)
        .map(|child| child.id)
        .expect("a healer to lose");
    harness.damage(lost, u32::MAX);
    wound_to(&mut harness, boss, 0.3);
    let mut second = SummonWatch::default();
    harness.run_until(14_000, |harness| second.observe(harness, boss));

    assert_eq!(second.began, 1);
    assert_eq!(second.most_healers, brawler::HEALER_CAP);
    let agent = harness.world.agent(boss).expect("brawler alive");
    assert_eq!(agent.live_children(Archetype::Healer), brawler::HEALER_CAP);
}

#[test]
fn brawler_at_the_healer_cap_skips_the_second_threshold() {
    let mut harness = Harness::with_player_at(Vec2::new(10_000.0, 0.0));
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);
    harness.tick();
    harness.run_until(500, |_| {});

    wound_to(&mut harness, boss, 0.6);
    harness.run_until(5_000, |_| {});
    harness.world.drain_outbox();

    wound_to(&mut harness, boss, 0.3);
    let mut watch = SummonWatch::default();
    harness.run_until(9_000, |harness| watch.observe(harness, boss));
    assert_eq!(watch.began, 0);
    assert_eq!(watch.most_healers, brawler::HEALER_CAP);
}

#[test]
fn shield_block_raised_inside_an_ability_aborts_the_assault_strike() {
    let mut harness = Harness::with_player_at(Vec2::new(300.0, 0.0));
    harness.arena.set_shield(TargetId::PLAYER, true);
    let boss = harness.spawn(Archetype::Brawler, Vec2::ZERO);

    let mut effects = Vec::new();
    let mut events = Vec::new();
    harness.tick();
    harness.run_until(7_000, |harness| {
        let outbox = harness.world.drain_outbox();
        effects.extend(outbox.effects);
        events.extend(outbox.events);
    });

    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::Interrupted {
            from: PhaseTag::Melee,
            to: PhaseTag::DashOut,
            ability: Some(AbilityId::AssaultCombo),
            ..
        }
    )));
    assert!(
        !effects
            .iter()
            .any(|effect| matches!(effect, Effect::MeleeStrike { agent, .. } if *agent == boss))
    );
}

#[test]
fn toxin_moves_a_sniper_that_is_frozen_mid_aim() {
    let mut harness = Harness::with_player_at(Vec2::new(400.0, 0.0));
    let sniper = harness.spawn(Archetype::Sniper, Vec2::ZERO);
    harness.tick();
    harness.run_until(1_000, |_| {});
    let agent = harness.world.agent(sniper).expect("sniper alive");
    assert_eq!(agent.primary.tag, PhaseTag::Aiming);
    assert_eq!(agent.steering.resolved, Vec2::ZERO);

    let triggered = harness.buildup(sniper, StatusKind::Toxin, 10.0);
    assert!(triggered.is_some_and(|outcome| outcome.triggered()));
    harness.frame();

    let agent = harness.world.agent(sniper).expect("sniper alive");
    assert_eq!(agent.primary.tag, PhaseTag::Aiming);
    assert!(agent.steering.wander.is_some());
    let speed = agent.steering.resolved.length();
    assert!((speed - agent.stats.move_speed).abs() < 1e-3);
}
