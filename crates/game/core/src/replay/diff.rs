//! Structural comparison of two snapshots.

use std::collections::BTreeSet;

use crate::state::{Position, Unit, UnitId};

use super::snapshot::CombatSnapshot;

/// How one unit present in both snapshots changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitDiff {
    pub id: UnitId,
    /// `(before, after)` when HP changed.
    pub hp: Option<(f64, f64)>,
    pub position: Option<(Position, Position)>,
    pub initiative: Option<(f64, f64)>,
    pub gained_statuses: Vec<String>,
    pub lost_statuses: Vec<String>,
}

impl UnitDiff {
    fn between(before: &Unit, after: &Unit) -> Option<Self> {
        let changed = |a: f64, b: f64| (a != b).then_some((a, b));
        let before_statuses: BTreeSet<&str> = before.status_ids().collect();
        let after_statuses: BTreeSet<&str> = after.status_ids().collect();

        let diff = UnitDiff {
            id: after.id,
            hp: changed(before.stats.hp, after.stats.hp),
            position: (before.position != after.position).then_some((before.position, after.position)),
            initiative: changed(before.runtime.initiative, after.runtime.initiative),
            gained_statuses: after_statuses
                .difference(&before_statuses)
                .map(|s| (*s).to_owned())
                .collect(),
            lost_statuses: before_statuses
                .difference(&after_statuses)
                .map(|s| (*s).to_owned())
                .collect(),
        };
        let unchanged = diff.hp.is_none()
            && diff.position.is_none()
            && diff.initiative.is_none()
            && diff.gained_statuses.is_empty()
            && diff.lost_statuses.is_empty();
        (!unchanged).then_some(diff)
    }
}

/// What happened between two captures.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotDiff {
    pub from: u64,
    pub to: u64,
    pub turns_elapsed: i64,
    /// Living in `to` but not in `from` (summons, revives).
    pub appeared: Vec<UnitId>,
    /// Living in `from` but not in `to` (deaths, expired summons).
    pub disappeared: Vec<UnitId>,
    pub changed: Vec<UnitDiff>,
    /// Log events recorded after `from` was taken.
    pub new_events: usize,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.disappeared.is_empty() && self.changed.is_empty() && self.new_events == 0
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitDiff> {
        self.changed.iter().find(|d| d.id == id)
    }
}

pub fn compare_snapshots(from: &CombatSnapshot, to: &CombatSnapshot) -> SnapshotDiff {
    let appeared = to
        .units
        .iter()
        .filter(|u| from.unit(u.id).is_none())
        .map(|u| u.id)
        .collect();
    let disappeared = from
        .units
        .iter()
        .filter(|u| to.unit(u.id).is_none())
        .map(|u| u.id)
        .collect();
    let changed = from
        .units
        .iter()
        .filter_map(|before| to.unit(before.id).and_then(|after| UnitDiff::between(before, after)))
        .collect();

    SnapshotDiff {
        from: from.id,
        to: to.id,
        turns_elapsed: i64::from(to.turn) - i64::from(from.turn),
        appeared,
        disappeared,
        changed,
        new_events: to.logs.len().saturating_sub(from.logs.len()),
    }
}
