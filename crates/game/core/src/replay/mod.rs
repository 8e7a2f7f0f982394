//! Bounded snapshot history with undo/redo, queries and analytics.
//!
//! A [`SnapshotManager`] is a linear history with a cursor. Creating a
//! snapshot while the cursor sits behind the newest entry discards the
//! entries ahead of it, the same way an editor drops its redo stack.
pub mod analytics;
pub mod diff;
pub mod snapshot;

pub use analytics::{CombatAnalytics, SourceStats};
pub use diff::{SnapshotDiff, UnitDiff, compare_snapshots};
pub use snapshot::{CombatSnapshot, SNAPSHOT_SCHEMA_VERSION, SnapshotError};

use std::collections::VecDeque;
use std::ops::RangeBounds;

use crate::config::CombatConfig;
use crate::state::{CombatLogEvent, CombatState, Grid, LogKind, Unit, UnitId};

/// Filter for [`SnapshotManager::search`]. Unset fields match everything.
#[derive(Clone, Debug, Default)]
pub struct SnapshotQuery {
    pub min_turn: Option<u32>,
    pub max_turn: Option<u32>,
    pub active_unit: Option<UnitId>,
    /// The unit must be alive in the snapshot.
    pub living_unit: Option<UnitId>,
    /// At least one event of this kind must appear in the snapshot's log.
    pub log_kind: Option<LogKind>,
}

impl SnapshotQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(mut self, min: u32, max: u32) -> Self {
        self.min_turn = Some(min);
        self.max_turn = Some(max);
        self
    }

    pub fn active(mut self, unit: UnitId) -> Self {
        self.active_unit = Some(unit);
        self
    }

    pub fn with_living(mut self, unit: UnitId) -> Self {
        self.living_unit = Some(unit);
        self
    }

    pub fn with_event(mut self, kind: LogKind) -> Self {
        self.log_kind = Some(kind);
        self
    }

    pub fn matches(&self, snapshot: &CombatSnapshot) -> bool {
        self.min_turn.is_none_or(|min| snapshot.turn >= min)
            && self.max_turn.is_none_or(|max| snapshot.turn <= max)
            && self.active_unit.is_none_or(|id| snapshot.active_unit == Some(id))
            && self.living_unit.is_none_or(|id| snapshot.unit(id).is_some())
            && self
                .log_kind
                .is_none_or(|kind| snapshot.logs.iter().any(|e| e.kind == kind))
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotManager {
    history: VecDeque<CombatSnapshot>,
    capacity: usize,
    cursor: Option<usize>,
    next_id: u64,
}

impl Default for SnapshotManager {
    fn default() -> Self {
        Self::with_capacity(CombatConfig::DEFAULT_SNAPSHOT_CAPACITY)
    }
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            cursor: None,
            next_id: 1,
        }
    }

    pub fn create_snapshot(
        &mut self,
        units: &[Unit],
        graveyard: &[Unit],
        grid: &Grid,
        logs: &[CombatLogEvent],
        active_unit: Option<UnitId>,
        turn: u32,
    ) -> &CombatSnapshot {
        let snapshot = CombatSnapshot::new(self.next_id, units, graveyard, grid, logs, active_unit, turn);
        self.push(snapshot)
    }

    /// Captures the whole state, including the RNG position.
    pub fn capture(&mut self, state: &CombatState) -> &CombatSnapshot {
        let snapshot = CombatSnapshot::capture(self.next_id, state);
        self.push(snapshot)
    }

    fn push(&mut self, snapshot: CombatSnapshot) -> &CombatSnapshot {
        if let Some(cursor) = self.cursor {
            self.history.truncate(cursor + 1);
        }
        self.history.push_back(snapshot);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.next_id += 1;
        let last = self.history.len() - 1;
        self.cursor = Some(last);

        let snapshot = &self.history[last];
        tracing::debug!(
            target: "combat::replay",
            id = snapshot.id,
            turn = snapshot.turn,
            stored = self.history.len(),
            "snapshot created"
        );
        snapshot
    }

    /// Steps the cursor back. `None` at the oldest entry (the cursor stays put).
    pub fn undo(&mut self) -> Option<&CombatSnapshot> {
        let cursor = self.cursor?.checked_sub(1)?;
        self.cursor = Some(cursor);
        self.history.get(cursor)
    }

    /// Steps the cursor forward. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&CombatSnapshot> {
        let cursor = self.cursor? + 1;
        if cursor >= self.history.len() {
            return None;
        }
        self.cursor = Some(cursor);
        self.history.get(cursor)
    }

    pub fn current(&self) -> Option<&CombatSnapshot> {
        self.history.get(self.cursor?)
    }

    pub fn get(&self, id: u64) -> Option<&CombatSnapshot> {
        self.history.iter().find(|s| s.id == id)
    }

    /// Snapshots whose turn falls in `turns`, oldest first.
    pub fn range(&self, turns: impl RangeBounds<u32>) -> Vec<&CombatSnapshot> {
        self.history.iter().filter(|s| turns.contains(&s.turn)).collect()
    }

    pub fn search(&self, query: &SnapshotQuery) -> Vec<&CombatSnapshot> {
        self.history.iter().filter(|s| query.matches(s)).collect()
    }

    /// Diff between two stored snapshots, `None` if either id is unknown.
    pub fn compare(&self, from: u64, to: u64) -> Option<SnapshotDiff> {
        Some(compare_snapshots(self.get(from)?, self.get(to)?))
    }

    /// Aggregates over the log of the snapshot under the cursor.
    pub fn analytics(&self) -> CombatAnalytics {
        self.current()
            .map(|s| CombatAnalytics::from_events(&s.logs))
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatSnapshot> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.cursor = None;
    }
}
