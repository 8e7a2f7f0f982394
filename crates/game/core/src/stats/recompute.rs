//! Current-stat derivation.
//!
//! `recompute` is the only code that writes non-pool fields of
//! `Unit::stats`, `Unit::current_resistances` and `UnitRuntime::disabled`.

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::env::{ModuleRegistry, StatusRegistry};
use crate::state::{DisableFlags, Unit, UnitId};
use crate::status::{AuraInfluence, aura_influences};

use super::block::StatKind;
use super::bonus::{BonusStack, StatBounds};

/// Rebuilds `unit`'s current stats, resistances and disable flags.
///
/// Sources, in collection order: equipped modules, the unit's own statuses
/// (scaled by stacks; aura statuses are skipped here and reach the holder
/// through `auras`), then aura influences. Pools carry over and are clamped.
pub fn recompute(
    unit: &mut Unit,
    statuses: &StatusRegistry,
    modules: &ModuleRegistry,
    auras: &[AuraInfluence],
) {
    let mut stacks: BTreeMap<StatKind, BonusStack> = BTreeMap::new();
    let mut resistances = unit.resistances.clone();
    let mut disabled = DisableFlags::empty();

    for module in unit.modules.iter().filter_map(|id| modules.get(id)) {
        for modifier in &module.stat_modifiers {
            stacks.entry(modifier.stat).or_default().add(modifier.bonus);
        }
    }

    for instance in &unit.statuses {
        let Some(def) = statuses.get(&instance.status_id) else {
            continue;
        };
        disabled |= def.disables;
        if def.is_aura() {
            continue;
        }
        for modifier in &def.stat_modifiers {
            stacks
                .entry(modifier.stat)
                .or_default()
                .add_stacked(modifier.bonus, instance.stacks);
        }
        for (damage_type, delta) in &def.resistance_modifiers {
            resistances.add_raw(*damage_type, delta * f64::from(instance.stacks.max(1)));
        }
    }

    for influence in auras {
        let Some(def) = statuses.get(&influence.status_id) else {
            continue;
        };
        for modifier in &def.stat_modifiers {
            stacks
                .entry(modifier.stat)
                .or_default()
                .add_stacked(modifier.bonus, influence.stacks);
        }
        for (damage_type, delta) in &def.resistance_modifiers {
            resistances.add_raw(*damage_type, delta * f64::from(influence.stacks.max(1)));
        }
    }

    let previous = unit.stats.clone();
    let empty = BonusStack::new();
    for kind in StatKind::iter().filter(|k| !k.is_pool()) {
        let stack = stacks.get(&kind).unwrap_or(&empty);
        let value = stack.apply(unit.base.get(kind), StatBounds::for_stat(kind));
        unit.stats.set(kind, value);
    }

    let stats = &mut unit.stats;
    stats.hp = previous.hp.clamp(0.0, stats.max_hp);
    stats.shield = previous.shield.max(0.0);
    stats.barrier = previous.barrier.max(0.0);

    resistances.clamp_all();
    unit.current_resistances = resistances;
    unit.runtime.disabled = disabled;
}

/// Recomputes every unit in `units`, projecting auras from the same slice.
pub fn recompute_all(units: &mut [Unit], statuses: &StatusRegistry, modules: &ModuleRegistry) {
    let influences = aura_influences(units, statuses);
    for unit in units.iter_mut() {
        let auras = influences.get(&unit.id).map(Vec::as_slice).unwrap_or(&[]);
        recompute(unit, statuses, modules, auras);
    }
}

/// Recomputes only `ids`, still projecting auras from the whole roster.
pub fn recompute_units(
    units: &mut [Unit],
    ids: impl IntoIterator<Item = UnitId>,
    statuses: &StatusRegistry,
    modules: &ModuleRegistry,
) {
    let influences = aura_influences(units, statuses);
    for id in ids {
        if let Some(unit) = units.iter_mut().find(|u| u.id == id) {
            let auras = influences.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            recompute(unit, statuses, modules, auras);
        }
    }
}
