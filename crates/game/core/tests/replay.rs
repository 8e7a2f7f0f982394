#![cfg(feature = "serde")]

mod common;

use combat_core::replay::compare_snapshots;
use combat_core::{CombatSession, CombatSnapshot, LogKind, SnapshotManager, SnapshotQuery, TargetSpec, UnitId};

use common::{duel, duel_builder};

/// Both sides strike each other until one falls, capturing after every turn.
fn scripted_fight(mut session: CombatSession, manager: &mut SnapshotManager) -> CombatSession {
    let mut turns = 0;
    while let Some(actor) = session.next_turn() {
        turns += 1;
        assert!(turns < 200, "fight did not end");
        let target = if actor == UnitId(1) { UnitId(2) } else { UnitId(1) };
        session
            .perform_action(actor, "strike", TargetSpec::Unit(target))
            .unwrap();
        manager.capture(session.state());
    }
    session
}

#[test]
fn identical_seeds_replay_identically() {
    let mut first_history = SnapshotManager::new();
    let mut second_history = SnapshotManager::new();
    let first = scripted_fight(duel_builder("duelist", "duelist").seed(99).build().unwrap(), &mut first_history);
    let second = scripted_fight(duel_builder("duelist", "duelist").seed(99).build().unwrap(), &mut second_history);

    assert!(first.state().rng_cursor > 0);
    assert_eq!(
        hex::encode(first.snapshot().digest().unwrap()),
        hex::encode(second.snapshot().digest().unwrap())
    );
    assert_eq!(first_history.len(), second_history.len());
    for (a, b) in first_history.iter().zip(second_history.iter()) {
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }
}

#[test]
fn restoring_an_old_snapshot_replays_the_same_future() {
    let mut history = SnapshotManager::new();
    let finished = scripted_fight(duel("duelist", "duelist"), &mut history);

    let checkpoint = history.iter().nth(1).unwrap().clone();
    let mut replay = duel("duelist", "duelist");
    replay.restore(&checkpoint);

    let mut ignored = SnapshotManager::new();
    let replayed = scripted_fight(replay, &mut ignored);
    assert_eq!(replayed.snapshot().digest().unwrap(), finished.snapshot().digest().unwrap());
}

#[test]
fn history_supports_undo_queries_and_diffs() {
    let mut history = SnapshotManager::with_capacity(3);
    let session = scripted_fight(duel("knight", "squire"), &mut history);
    assert_eq!(history.len(), 3);
    assert_eq!(history.current().unwrap().turn, session.state().turn);

    let last_id = history.current().unwrap().id;
    let previous = history.undo().unwrap().clone();
    assert!(previous.id < last_id);

    let diff = history.compare(previous.id, last_id).unwrap();
    assert!(!diff.is_empty());
    assert_eq!(history.redo().unwrap().id, last_id);

    let kills = history.search(&SnapshotQuery::new().with_event(LogKind::Kill));
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].id, last_id);

    let analytics = history.analytics();
    assert_eq!(analytics.get(UnitId(1)).unwrap().kills, 1);
    assert_eq!(analytics.top_damage_dealer(), Some(UnitId(1)));
    assert!(analytics.skill_uses("strike") > 0);
}

#[test]
fn snapshots_survive_a_trip_through_disk() {
    let mut history = SnapshotManager::new();
    let session = scripted_fight(duel("knight", "squire"), &mut history);
    let snapshot = session.snapshot();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fight.json");
    snapshot.save(&path).unwrap();
    let loaded = CombatSnapshot::load(&path).unwrap();

    assert_eq!(loaded, snapshot);
    assert!(compare_snapshots(&snapshot, &loaded).is_empty());
    assert_eq!(loaded.to_state(), *session.state());
}
