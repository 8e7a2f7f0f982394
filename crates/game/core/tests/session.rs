mod common;

use combat_core::{ActionError, CombatConfig, CombatSession, LogKind, Position, Side, TargetSpec, UnitId, UnitSpec};

use common::{duel, duel_builder};

const LEFT: UnitId = UnitId(1);
const RIGHT: UnitId = UnitId(2);

#[test]
fn physical_hit_is_mitigated_by_defense() {
    let mut session = duel("knight", "squire");
    assert_eq!(session.next_turn(), Some(LEFT));

    let report = session
        .perform_action(LEFT, "power_strike", TargetSpec::Unit(RIGHT))
        .unwrap();

    // 15 base, 5 / 105 mitigated, floored
    assert_eq!(report.damage, 14.0);
    assert_eq!(session.state().unit(RIGHT).unwrap().stats.hp, 86.0);
}

#[test]
fn true_damage_skips_mitigation() {
    let mut session = duel("knight", "squire");
    session.next_turn();

    let report = session.perform_action(LEFT, "smite", TargetSpec::Unit(RIGHT)).unwrap();
    assert_eq!(report.damage, 15.0);
}

#[test]
fn faster_unit_acts_first() {
    let mut session = duel("knight", "squire");
    assert_eq!(session.next_turn(), Some(LEFT));
    assert_eq!(session.state().unit(RIGHT).unwrap().runtime.initiative, 50.0);
    assert!(session.logs().iter().any(|e| e.kind == LogKind::TurnStart));
}

#[test]
fn exclusive_status_replaces_its_rival() {
    let mut session = duel_builder("slowed_squire", "squire")
        .config(CombatConfig::default().with_turn_order(false))
        .build()
        .unwrap();
    assert!(session.state().unit(LEFT).unwrap().has_status("slow"));

    session.perform_action(LEFT, "hasten", TargetSpec::SelfCast).unwrap();

    let statuses: Vec<&str> = session.state().unit(LEFT).unwrap().status_ids().collect();
    assert_eq!(statuses, vec!["haste"]);
}

#[test]
fn stacked_burn_ticks_at_the_holders_turn_end() {
    let mut session = duel("knight", "squire");
    assert_eq!(session.next_turn(), Some(LEFT));
    for _ in 0..5 {
        session.perform_action(LEFT, "ignite", TargetSpec::Unit(RIGHT)).unwrap();
    }
    let burn = session.state().unit(RIGHT).unwrap().status("burn").unwrap().clone();
    assert_eq!(burn.stacks, 5);
    assert_eq!(burn.value, 10.0);

    let mut guard = 0;
    while session.next_turn() != Some(RIGHT) {
        guard += 1;
        assert!(guard < 10, "the squire never got a turn");
    }
    assert_eq!(session.state().unit(RIGHT).unwrap().stats.hp, 100.0);

    session.end_turn();
    assert_eq!(session.state().unit(RIGHT).unwrap().stats.hp, 50.0);
    assert!(session.logs().iter().any(|e| e.kind == LogKind::StatusTick));
}

/// The knight opens, optionally casting `opener` on the squire, then both
/// sides pass. Returns who got each turn, the opening one included.
fn passive_schedule(opener: Option<&str>, turns: usize) -> (CombatSession, Vec<UnitId>) {
    let mut session = duel("knight", "squire");
    let mut order = vec![session.next_turn().unwrap()];
    if let Some(skill) = opener {
        session.perform_action(LEFT, skill, TargetSpec::Unit(RIGHT)).unwrap();
    }
    while order.len() < turns {
        order.push(session.next_turn().unwrap());
    }
    (session, order)
}

fn lost_turns(session: &CombatSession) -> usize {
    session
        .logs()
        .iter()
        .filter(|e| e.kind == LogKind::Info && e.text.contains("loses its turn"))
        .count()
}

#[test]
fn unhindered_squire_gets_every_other_round() {
    let (session, order) = passive_schedule(None, 7);
    assert_eq!(order, vec![LEFT, LEFT, RIGHT, LEFT, LEFT, RIGHT, LEFT]);
    assert_eq!(lost_turns(&session), 0);
}

#[test]
fn one_turn_stun_costs_exactly_one_turn() {
    let (session, order) = passive_schedule(Some("bash"), 6);
    // the squire's first slot goes by, the next one is played
    assert_eq!(order, vec![LEFT, LEFT, LEFT, LEFT, RIGHT, LEFT]);
    assert_eq!(lost_turns(&session), 1);

    let squire = session.state().unit(RIGHT).unwrap();
    assert!(!squire.has_status("stun"));
    assert!(squire.can_act());
}

#[test]
fn stun_is_not_worn_off_by_the_other_sides_turns() {
    let mut session = duel("knight", "squire");
    session.next_turn();
    session.perform_action(LEFT, "bash", TargetSpec::Unit(RIGHT)).unwrap();
    session.end_turn();

    assert_eq!(session.state().unit(RIGHT).unwrap().status("stun").unwrap().duration, 1);
    assert_eq!(session.next_turn(), Some(LEFT));
    session.end_turn();
    assert_eq!(session.state().unit(RIGHT).unwrap().status("stun").unwrap().duration, 1);
}

#[test]
fn two_turn_stun_costs_two_turns() {
    let (session, order) = passive_schedule(Some("heavy_bash"), 7);
    assert_eq!(order, vec![LEFT, LEFT, LEFT, LEFT, LEFT, LEFT, RIGHT]);
    assert_eq!(lost_turns(&session), 2);
    assert!(!session.state().unit(RIGHT).unwrap().has_status("stun"));
}

#[test]
fn freeze_holds_like_a_stun() {
    let (session, order) = passive_schedule(Some("chill"), 6);
    assert_eq!(order, vec![LEFT, LEFT, LEFT, LEFT, RIGHT, LEFT]);
    assert_eq!(lost_turns(&session), 1);
    assert!(!session.state().unit(RIGHT).unwrap().has_status("freeze"));
}

#[test]
fn sleep_runs_out_over_skipped_turns() {
    let (session, order) = passive_schedule(Some("lullaby"), 7);
    assert_eq!(order, vec![LEFT, LEFT, LEFT, LEFT, LEFT, LEFT, RIGHT]);
    assert_eq!(lost_turns(&session), 2);
    assert!(!session.state().unit(RIGHT).unwrap().has_status("sleep"));
}

#[test]
fn damage_wakes_a_sleeper_before_its_turn() {
    let mut session = duel("knight", "squire");
    session.next_turn();
    session.perform_action(LEFT, "lullaby", TargetSpec::Unit(RIGHT)).unwrap();
    assert!(!session.state().unit(RIGHT).unwrap().can_act());

    assert_eq!(session.next_turn(), Some(LEFT));
    session.perform_action(LEFT, "strike", TargetSpec::Unit(RIGHT)).unwrap();
    let squire = session.state().unit(RIGHT).unwrap();
    assert!(!squire.has_status("sleep"));
    assert!(squire.can_act());

    assert_eq!(session.next_turn(), Some(RIGHT));
    assert_eq!(lost_turns(&session), 0);
}

#[test]
fn rejected_requests_change_nothing() {
    let mut session = combat_core::CombatSession::builder(common::registries())
        .unit(UnitSpec::new("knight", Side::Player, Position::new(0, 0)))
        .unit(UnitSpec::new("squire", Side::Opponent, Position::new(3, 0)))
        .build()
        .unwrap();
    session.next_turn();
    let before = session.state().clone();

    let err = session
        .perform_action(LEFT, "strike", TargetSpec::Unit(RIGHT))
        .unwrap_err();
    assert_eq!(err, ActionError::OutOfRange { distance: 3, range: 1 });
    assert_eq!(session.state(), &before);

    assert_eq!(
        session
            .perform_action(RIGHT, "strike", TargetSpec::Unit(LEFT))
            .unwrap_err(),
        ActionError::NotActorsTurn(RIGHT)
    );
}

#[test]
fn a_fight_runs_to_completion() {
    let mut session = duel("knight", "squire");
    let mut turns = 0;
    while let Some(actor) = session.next_turn() {
        turns += 1;
        assert!(turns < 100, "fight did not end");
        let target = if actor == LEFT { RIGHT } else { LEFT };
        session.perform_action(actor, "strike", TargetSpec::Unit(target)).unwrap();
    }

    assert_eq!(session.winner(), Some(Side::Player));
    assert_eq!(session.state().graveyard.len(), 1);
    assert!(session.logs().iter().any(|e| e.kind == LogKind::Kill));
}
