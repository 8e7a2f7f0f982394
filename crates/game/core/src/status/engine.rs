//! Status resolution on a single unit.
//!
//! Every function mutates the holder's status list in place and returns the
//! resulting [`StatusEvent`]s in order. Triggers are reported as data
//! ([`FiredTrigger`]); the interpreter looks up and runs their op lists, so
//! this module never executes ops itself.

use crate::env::StatusRegistry;
use crate::state::{PERMANENT, StatusInstance, Unit, UnitId};

use super::definition::{StackingPolicy, StatusCategory, StatusDefinition, TriggerEvent};

/// Request to apply a status.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusApplication {
    pub status_id: String,
    pub duration: i32,
    pub source: UnitId,
    pub value: f64,
    pub stacks: u32,
}

impl StatusApplication {
    pub fn new(status_id: impl Into<String>, duration: i32, source: UnitId) -> Self {
        Self {
            status_id: status_id.into(),
            duration,
            source,
            value: 0.0,
            stacks: 1,
        }
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn stacks(mut self, stacks: u32) -> Self {
        self.stacks = stacks;
        self
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RemovalReason {
    Expired,
    Cleansed,
    /// Displaced by a mutually exclusive status.
    Replaced,
    Removed,
    Transferred,
    Converted,
    /// Broken by incoming damage.
    Broken,
}

/// A trigger table entry that fired; the op list lives in the definition.
#[derive(Clone, Debug, PartialEq)]
pub struct FiredTrigger {
    pub event: TriggerEvent,
    pub holder: UnitId,
    pub source: UnitId,
    pub status_id: String,
    pub stacks: u32,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatusEvent {
    Applied {
        holder: UnitId,
        instance: StatusInstance,
    },
    /// An existing instance absorbed a re-application.
    Merged {
        holder: UnitId,
        status_id: String,
        stacks: u32,
        duration: i32,
    },
    Removed {
        holder: UnitId,
        instance: StatusInstance,
        reason: RemovalReason,
    },
    Triggered(FiredTrigger),
}

/// Which instances a cleanse removes. Persistent statuses are never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanseFilter {
    pub category: Option<StatusCategory>,
    pub status_id: Option<String>,
    pub limit: Option<u32>,
}

impl CleanseFilter {
    pub fn debuffs() -> Self {
        Self {
            category: Some(StatusCategory::Debuff),
            ..Self::default()
        }
    }

    fn matches(&self, instance: &StatusInstance, def: Option<&StatusDefinition>) -> bool {
        if def.is_some_and(|d| d.persistent) {
            return false;
        }
        let category_ok = self
            .category
            .is_none_or(|c| def.is_some_and(|d| d.category == c));
        let id_ok = self
            .status_id
            .as_deref()
            .is_none_or(|id| instance.status_id == id);
        category_ok && id_ok
    }
}

fn fired(
    event: TriggerEvent,
    holder: UnitId,
    instance: &StatusInstance,
    def: &StatusDefinition,
) -> Option<StatusEvent> {
    def.trigger(event).map(|_| {
        StatusEvent::Triggered(FiredTrigger {
            event,
            holder,
            source: instance.source,
            status_id: instance.status_id.clone(),
            stacks: instance.stacks,
            value: instance.value,
        })
    })
}

fn merge_duration(old: i32, new: i32) -> i32 {
    if old == PERMANENT || new == PERMANENT {
        PERMANENT
    } else {
        old.max(new)
    }
}

fn conflicts(def: &StatusDefinition, existing: &str, registry: &StatusRegistry) -> bool {
    if existing == def.id {
        return false;
    }
    match registry.get(existing) {
        Some(other) => def.excludes(other),
        None => def.exclusive_with.iter().any(|id| id == existing),
    }
}

fn remove_instance(
    unit: &mut Unit,
    registry: &StatusRegistry,
    instance_id: u32,
    reason: RemovalReason,
    events: &mut Vec<StatusEvent>,
) -> Option<StatusInstance> {
    let index = unit
        .statuses
        .iter()
        .position(|s| s.instance_id == instance_id)?;
    let instance = unit.statuses.remove(index);
    tracing::debug!(
        target: "combat::status",
        unit = %unit.id,
        status = %instance.status_id,
        %reason,
        "status removed"
    );
    if let Some(def) = registry.get(&instance.status_id) {
        events.extend(fired(TriggerEvent::OnRemove, unit.id, &instance, def));
    }
    events.push(StatusEvent::Removed {
        holder: unit.id,
        instance: instance.clone(),
        reason,
    });
    Some(instance)
}

/// Applies a status, resolving exclusivity before stacking.
///
/// An unknown id is a logged no-op.
pub fn apply(unit: &mut Unit, registry: &StatusRegistry, app: StatusApplication) -> Vec<StatusEvent> {
    let Some(def) = registry.get(&app.status_id) else {
        tracing::warn!(
            target: "combat::status",
            unit = %unit.id,
            status = %app.status_id,
            "unknown status id, application ignored"
        );
        return Vec::new();
    };

    let mut events = Vec::new();

    let displaced: Vec<u32> = unit
        .statuses
        .iter()
        .filter(|inst| conflicts(def, &inst.status_id, registry))
        .map(|inst| inst.instance_id)
        .collect();
    for instance_id in displaced {
        remove_instance(unit, registry, instance_id, RemovalReason::Replaced, &mut events);
    }

    let holder = unit.id;
    if let Some(existing) = unit.statuses.iter_mut().find(|s| s.status_id == def.id) {
        match def.stacking {
            StackingPolicy::Stacks { .. } => {
                existing.stacks = (existing.stacks + app.stacks.max(1)).min(def.stacking.max_stacks());
                existing.duration = merge_duration(existing.duration, app.duration);
            }
            StackingPolicy::ExtendDuration => {
                existing.duration = if existing.is_permanent() || app.duration == PERMANENT {
                    PERMANENT
                } else {
                    existing.duration + app.duration
                };
            }
            StackingPolicy::None => {
                existing.duration = merge_duration(existing.duration, app.duration);
            }
        }
        existing.value = app.value;
        existing.source = app.source;
        tracing::debug!(
            target: "combat::status",
            unit = %holder,
            status = %def.id,
            stacks = existing.stacks,
            duration = existing.duration,
            "status merged"
        );
        events.push(StatusEvent::Merged {
            holder,
            status_id: def.id.clone(),
            stacks: existing.stacks,
            duration: existing.duration,
        });
        return events;
    }

    let instance = StatusInstance {
        instance_id: unit.runtime.allocate_status_instance(),
        status_id: def.id.clone(),
        duration: app.duration,
        stacks: app.stacks.clamp(1, def.stacking.max_stacks()),
        source: app.source,
        value: app.value,
    };
    tracing::debug!(
        target: "combat::status",
        unit = %holder,
        status = %def.id,
        duration = instance.duration,
        "status applied"
    );
    unit.statuses.push(instance.clone());
    let on_apply = fired(TriggerEvent::OnApply, holder, &instance, def);
    events.push(StatusEvent::Applied { holder, instance });
    events.extend(on_apply);
    events
}

pub fn remove(unit: &mut Unit, registry: &StatusRegistry, instance_id: u32) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    remove_instance(unit, registry, instance_id, RemovalReason::Removed, &mut events);
    events
}

/// Removes every instance of `status_id`.
pub fn remove_status(unit: &mut Unit, registry: &StatusRegistry, status_id: &str) -> Vec<StatusEvent> {
    let ids: Vec<u32> = unit
        .statuses
        .iter()
        .filter(|s| s.status_id == status_id)
        .map(|s| s.instance_id)
        .collect();
    let mut events = Vec::new();
    for id in ids {
        remove_instance(unit, registry, id, RemovalReason::Removed, &mut events);
    }
    events
}

pub fn cleanse(unit: &mut Unit, registry: &StatusRegistry, filter: &CleanseFilter) -> Vec<StatusEvent> {
    let limit = filter.limit.map_or(usize::MAX, |n| n as usize);
    let ids: Vec<u32> = unit
        .statuses
        .iter()
        .filter(|s| filter.matches(s, registry.get(&s.status_id)))
        .take(limit)
        .map(|s| s.instance_id)
        .collect();
    let mut events = Vec::new();
    for id in ids {
        remove_instance(unit, registry, id, RemovalReason::Cleansed, &mut events);
    }
    events
}

/// Turn-end countdown: fires `OnTick`, decrements, expires.
pub fn tick(unit: &mut Unit, registry: &StatusRegistry) -> Vec<StatusEvent> {
    tick_where(unit, registry, |_| true)
}

/// Counts down only the statuses whose definition passes `select`.
pub fn tick_where(
    unit: &mut Unit,
    registry: &StatusRegistry,
    select: impl Fn(&StatusDefinition) -> bool,
) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    let holder = unit.id;

    for instance in &unit.statuses {
        if let Some(def) = registry.get(&instance.status_id)
            && select(def)
        {
            events.extend(fired(TriggerEvent::OnTick, holder, instance, def));
        }
    }

    let mut expired = Vec::new();
    for instance in &mut unit.statuses {
        let def = registry.get(&instance.status_id);
        if def.is_some_and(|d| d.persistent || !select(d)) || instance.is_permanent() {
            continue;
        }
        instance.duration -= 1;
        if instance.duration <= 0 {
            expired.push(instance.instance_id);
        }
    }
    for id in expired {
        remove_instance(unit, registry, id, RemovalReason::Expired, &mut events);
    }
    events
}

/// Fires `event` for every active instance that has a trigger for it.
pub fn fire(unit: &Unit, registry: &StatusRegistry, event: TriggerEvent) -> Vec<StatusEvent> {
    unit.statuses
        .iter()
        .filter_map(|instance| {
            registry
                .get(&instance.status_id)
                .and_then(|def| fired(event, unit.id, instance, def))
        })
        .collect()
}

/// Removes statuses that end when the holder is damaged.
pub fn break_on_damage(unit: &mut Unit, registry: &StatusRegistry) -> Vec<StatusEvent> {
    let ids: Vec<u32> = unit
        .statuses
        .iter()
        .filter(|s| registry.get(&s.status_id).is_some_and(|d| d.break_on_damage))
        .map(|s| s.instance_id)
        .collect();
    let mut events = Vec::new();
    for id in ids {
        remove_instance(unit, registry, id, RemovalReason::Broken, &mut events);
    }
    events
}

/// Moves up to `count` non-persistent instances of `category` from `from` to `to`.
pub fn transfer(
    from: &mut Unit,
    to: &mut Unit,
    registry: &StatusRegistry,
    category: StatusCategory,
    count: u32,
) -> Vec<StatusEvent> {
    let filter = CleanseFilter {
        category: Some(category),
        status_id: None,
        limit: Some(count),
    };
    let ids: Vec<u32> = from
        .statuses
        .iter()
        .filter(|s| filter.matches(s, registry.get(&s.status_id)))
        .take(count as usize)
        .map(|s| s.instance_id)
        .collect();

    let mut events = Vec::new();
    for id in ids {
        if let Some(moved) = remove_instance(from, registry, id, RemovalReason::Transferred, &mut events) {
            let app = StatusApplication {
                status_id: moved.status_id,
                duration: moved.duration,
                source: moved.source,
                value: moved.value,
                stacks: moved.stacks,
            };
            events.extend(apply(to, registry, app));
        }
    }
    events
}

/// Replaces up to `count` instances of `from` category with `into`.
pub fn convert(
    unit: &mut Unit,
    registry: &StatusRegistry,
    from: StatusCategory,
    into: StatusApplication,
    count: u32,
) -> Vec<StatusEvent> {
    let filter = CleanseFilter {
        category: Some(from),
        status_id: None,
        limit: Some(count),
    };
    let ids: Vec<u32> = unit
        .statuses
        .iter()
        .filter(|s| s.status_id != into.status_id && filter.matches(s, registry.get(&s.status_id)))
        .take(count as usize)
        .map(|s| s.instance_id)
        .collect();

    let mut events = Vec::new();
    for id in ids {
        if remove_instance(unit, registry, id, RemovalReason::Converted, &mut events).is_some() {
            events.extend(apply(unit, registry, into.clone()));
        }
    }
    events
}
