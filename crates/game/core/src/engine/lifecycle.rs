//! Turn start and turn end bookkeeping for the active unit.

use crate::action::{OpContext, OpRunner, revert_transform};
use crate::env::{CombatEnv, PassiveHook};
use crate::state::{CombatState, DelayedEffect, LogEntry, LogKind, UnitId};
use crate::stats::recompute_all;
use crate::status::{self, TriggerEvent};

use super::turns::{age_holds, reset_initiative};

/// Opens `unit`'s turn.
///
/// Restores action points, clears per-turn flags, runs delayed effects
/// that come due, then `OnTurnStart` triggers and module passives.
pub fn start_turn(state: &mut CombatState, env: &CombatEnv<'_>, unit: UnitId) {
    state.turn += 1;
    state.active_unit = Some(unit);

    let due = {
        let Some(active) = state.unit_mut(unit) else {
            return;
        };
        let runtime = &mut active.runtime;
        runtime.action_points = env.config.action_points;
        runtime.turn_acted = false;
        runtime.turn_moved = false;

        for effect in &mut runtime.delayed {
            effect.turns_left = effect.turns_left.saturating_sub(1);
        }
        let (due, pending): (Vec<DelayedEffect>, Vec<DelayedEffect>) =
            runtime.delayed.drain(..).partition(|e| e.turns_left == 0);
        runtime.delayed = pending;
        due
    };

    tracing::debug!(target: "combat::turns", %unit, turn = state.turn, "turn started");
    state.record(LogEntry::new(LogKind::TurnStart, format!("turn {} begins for {unit}", state.turn)).source(unit));

    let mut runner = OpRunner::new(state, *env, unit);
    for effect in due {
        tracing::debug!(target: "combat::turns", %unit, ops = effect.ops.len(), "delayed effect resolves");
        let mut ctx = OpContext::for_units(unit, effect.targets, 0)
            .with_position(effect.position)
            .with_skill(effect.skill);
        runner.run_ops(&effect.ops, &mut ctx);
    }
    runner.fire(unit, TriggerEvent::OnTurnStart, 0, None);
    runner.run_passives(unit, PassiveHook::TurnStart);
    runner.finish();

    recompute_all(&mut state.units, env.statuses(), env.modules());
    state.sweep_dead();
}

/// Closes `unit`'s turn.
///
/// Fires `OnTurnEnd`, ticks statuses, counts down cooldowns and temporary
/// lifetimes, and resets initiative when the unit never acted.
pub fn end_turn(state: &mut CombatState, env: &CombatEnv<'_>, unit: UnitId) {
    let statuses = env.statuses();
    let mut runner = OpRunner::new(state, *env, unit);
    runner.fire(unit, TriggerEvent::OnTurnEnd, 0, None);
    let events = match runner.state.unit_mut(unit) {
        Some(active) => status::tick(active, statuses),
        None => Vec::new(),
    };
    runner.run_status_events(events, 0, None);
    runner.finish();

    let mut expired_summon = false;
    if let Some(active) = state.unit_mut(unit) {
        active.runtime.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });

        if let Some(summon) = &mut active.runtime.summon
            && let Some(turns) = &mut summon.turns_left
        {
            *turns = turns.saturating_sub(1);
            expired_summon = *turns == 0;
        }

        let transform_done = active.runtime.transform.as_mut().is_some_and(|transform| {
            transform.turns_left = transform.turns_left.saturating_sub(1);
            transform.turns_left == 0
        });
        let reverted = transform_done && revert_transform(active);

        if !active.runtime.turn_acted {
            reset_initiative(active, env.config.base_threshold, 0.0);
        }

        if reverted {
            state.record(
                LogEntry::new(LogKind::Transform, format!("{unit} returns to its own form"))
                    .source(unit)
                    .target(unit),
            );
        }
    }

    if expired_summon && state.despawn(unit).is_some() {
        tracing::debug!(target: "combat::turns", %unit, "summon expired");
        state.record(LogEntry::new(LogKind::Info, format!("{unit} fades away")).source(unit));
    }

    state.record(LogEntry::new(LogKind::TurnEnd, format!("turn {} ends for {unit}", state.turn)).source(unit));
    recompute_all(&mut state.units, env.statuses(), env.modules());
    state.sweep_dead();
    state.active_unit = None;
    tracing::debug!(target: "combat::turns", %unit, turn = state.turn, "turn ended");
}

/// Consumes the turn of a unit whose slot came due while it was stunned,
/// frozen or asleep.
///
/// Only the holds count down; every other status, cooldown and lifetime
/// waits for a turn the unit actually plays. The turn counter is untouched.
pub fn skip_turn(state: &mut CombatState, env: &CombatEnv<'_>, unit: UnitId) {
    let statuses = env.statuses();
    state.record(LogEntry::new(LogKind::Info, format!("{unit} loses its turn")).source(unit));
    let mut runner = OpRunner::new(state, *env, unit);
    let events = match runner.state.unit_mut(unit) {
        Some(held) => {
            reset_initiative(held, env.config.base_threshold, 0.0);
            age_holds(held, statuses)
        }
        None => Vec::new(),
    };
    runner.run_status_events(events, 0, None);
    runner.finish();

    recompute_all(&mut state.units, env.statuses(), env.modules());
    state.sweep_dead();
    tracing::debug!(target: "combat::turns", %unit, "turn lost to a hold");
}

/// Used when no unit can be scheduled: ages the holds of every stuck unit
/// by one turn. Returns `false` when no timed hold was left to age.
pub fn expire_controls(state: &mut CombatState, env: &CombatEnv<'_>) -> bool {
    let statuses = env.statuses();
    let stuck: Vec<UnitId> = state
        .units
        .iter()
        .filter(|u| u.is_alive() && u.runtime.disabled.is_incapacitated())
        .filter(|u| {
            // permanent holds never expire, so they cannot unblock the schedule
            u.statuses.iter().any(|s| {
                !s.is_permanent()
                    && statuses
                        .get(&s.status_id)
                        .is_some_and(|d| !d.persistent && d.disables.is_incapacitated())
            })
        })
        .map(|u| u.id)
        .collect();
    if stuck.is_empty() {
        return false;
    }

    for id in &stuck {
        let mut runner = OpRunner::new(state, *env, *id);
        let events = match runner.state.unit_mut(*id) {
            Some(unit) => age_holds(unit, statuses),
            None => Vec::new(),
        };
        runner.run_status_events(events, 0, None);
        runner.finish();
    }
    tracing::debug!(target: "combat::turns", stuck = stuck.len(), "no unit ready, holds aged");
    recompute_all(&mut state.units, env.statuses(), env.modules());
    state.sweep_dead();
    true
}
