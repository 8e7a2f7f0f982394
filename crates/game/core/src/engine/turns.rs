//! Continuous-time initiative scheduling.
//!
//! Every unit counts its `initiative` down towards zero at its effective
//! speed. The scheduler jumps straight to the moment the first unit reaches
//! zero instead of stepping through ticks, so a selection costs one pass
//! over the roster.

use crate::config::CombatConfig;
use crate::env::{RngOracle, RollContext, StatusRegistry};
use crate::state::{CombatState, DisableFlags, Unit, UnitId};
use crate::status;

/// The unit picked by [`select_next`] and how far time advanced to get there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ready {
    pub unit: UnitId,
    /// Simulated ticks elapsed during this selection (0 when overdue).
    pub ticks: f64,
    /// The slot came due while the unit was stunned, frozen or asleep. The
    /// turn is lost instead of played.
    pub held: bool,
}

/// `spd` scaled by every speed-affecting status, floored at 0.
///
/// Each instance contributes its multiplier once, regardless of stacks.
pub fn effective_speed(unit: &Unit, statuses: &StatusRegistry) -> f64 {
    let multiplier: f64 = unit
        .statuses
        .iter()
        .filter_map(|s| statuses.get(&s.status_id))
        .map(|def| def.initiative_multiplier)
        .product();
    (unit.stats.spd * multiplier).max(0.0)
}

fn is_held(unit: &Unit) -> bool {
    unit.runtime.disabled.is_incapacitated()
}

/// Some unit can still take a turn of its own: free to act, and either due
/// already or moving towards zero.
fn anyone_can_progress(units: &[Unit], statuses: &StatusRegistry) -> bool {
    units.iter().any(|u| {
        u.is_alive() && !is_held(u) && (u.runtime.initiative <= 0.0 || effective_speed(u, statuses) > 0.0)
    })
}

/// The most overdue living unit with initiative at or below `limit`.
///
/// Held units count: their slot still comes due and is then skipped.
/// Ties fall to higher speed, then to the lower id.
fn overdue<'a>(units: &'a [Unit], statuses: &StatusRegistry, limit: f64) -> Option<&'a Unit> {
    units
        .iter()
        .filter(|u| u.is_alive() && u.runtime.initiative <= limit)
        .min_by(|a, b| {
            a.runtime
                .initiative
                .total_cmp(&b.runtime.initiative)
                .then_with(|| effective_speed(b, statuses).total_cmp(&effective_speed(a, statuses)))
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// Picks the next unit whose slot comes due, advancing initiative as needed.
///
/// Stunned, frozen and sleeping units keep counting down; when their slot
/// comes due it is returned with `held` set so the caller can skip it.
/// Returns `None` when no unit free to act can ever get a turn: every unit
/// is dead, held, or stalled at zero speed above zero initiative.
pub fn select_next(units: &mut [Unit], statuses: &StatusRegistry, config: &CombatConfig) -> Option<Ready> {
    if !anyone_can_progress(units, statuses) {
        return None;
    }
    if let Some(unit) = overdue(units, statuses, 0.0) {
        return Some(Ready {
            unit: unit.id,
            ticks: 0.0,
            held: is_held(unit),
        });
    }

    let ticks = units
        .iter()
        .filter(|u| u.is_alive())
        .filter_map(|u| {
            let speed = effective_speed(u, statuses);
            (speed > 0.0).then(|| u.runtime.initiative / speed)
        })
        .min_by(f64::total_cmp)?;

    for unit in units.iter_mut().filter(|u| u.is_alive()) {
        let speed = effective_speed(unit, statuses);
        unit.runtime.initiative -= speed * ticks;
    }

    // the advanced values may miss zero by floating error
    let unit = overdue(units, statuses, config.initiative_epsilon)?;
    let ready = Ready {
        unit: unit.id,
        ticks,
        held: is_held(unit),
    };
    tracing::trace!(target: "combat::turns", unit = %ready.unit, ticks, held = ready.held, "initiative advanced");
    Some(ready)
}

/// Puts a unit back at the end of the countdown after it acted.
pub fn reset_initiative(unit: &mut Unit, threshold: f64, extra_delay: f64) {
    unit.runtime.initiative += threshold + extra_delay;
}

/// Counts down the holds (stun, freeze, sleep) of a unit whose turn is lost.
pub(crate) fn age_holds(unit: &mut Unit, statuses: &StatusRegistry) -> Vec<status::StatusEvent> {
    status::tick_where(unit, statuses, |def| def.disables.is_incapacitated())
}

/// Predicts the next `n` actors without touching the live roster.
///
/// Each predicted actor is assumed to act and reset with no extra delay.
/// Held slots are skipped the way the session skips them, so a stunned
/// unit reappears once its holds run out.
pub fn turn_order(units: &[Unit], statuses: &StatusRegistry, config: &CombatConfig, n: usize) -> Vec<UnitId> {
    let mut preview = units.to_vec();
    let mut order = Vec::with_capacity(n);
    while order.len() < n {
        let Some(ready) = select_next(&mut preview, statuses, config) else {
            break;
        };
        let Some(unit) = preview.iter_mut().find(|u| u.id == ready.unit) else {
            break;
        };
        reset_initiative(unit, config.base_threshold, 0.0);
        if ready.held {
            let _ = age_holds(unit, statuses);
            unit.runtime.disabled = unit
                .statuses
                .iter()
                .filter_map(|s| statuses.get(&s.status_id))
                .fold(DisableFlags::empty(), |flags, def| flags | def.disables);
            continue;
        }
        order.push(ready.unit);
    }
    order
}

/// Starting initiative for `unit`: the threshold plus optional jitter.
///
/// The RNG is only consulted when jitter is enabled, so sessions without it
/// keep their draw sequence untouched.
pub fn initial_initiative(state: &mut CombatState, rng: &dyn RngOracle, config: &CombatConfig, unit: UnitId) -> f64 {
    if config.initiative_jitter <= 0.0 {
        return config.base_threshold;
    }
    let roll = state.roll(rng, unit, RollContext::Initiative);
    config.base_threshold + roll * config.initiative_jitter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{FixedRng, PcgRng};
    use crate::state::{Grid, PERMANENT, Position};
    use crate::stats::recompute_all;
    use crate::status::{StatusApplication, apply};
    use crate::testing::{sample_modules, sample_statuses, unit_at};

    fn runner(id: u32, spd: f64) -> Unit {
        let mut unit = unit_at(UnitId(id), Position::new(id as i32, 0));
        unit.base.spd = spd;
        unit.stats.spd = spd;
        unit.runtime.initiative = 100.0;
        unit
    }

    #[test]
    fn faster_unit_reaches_zero_first() {
        let statuses = sample_statuses();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 20.0), runner(2, 10.0)];

        let ready = select_next(&mut units, &statuses, &config).unwrap();
        assert_eq!(ready.unit, UnitId(1));
        assert_eq!(ready.ticks, 5.0);
        assert!(units[0].runtime.initiative.abs() < 1e-9);
        assert_eq!(units[1].runtime.initiative, 50.0);
    }

    #[test]
    fn most_overdue_wins_then_higher_speed() {
        let statuses = sample_statuses();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 10.0), runner(2, 10.0), runner(3, 30.0)];
        units[0].runtime.initiative = -5.0;
        units[1].runtime.initiative = -12.0;
        units[2].runtime.initiative = -12.0;

        let ready = select_next(&mut units, &statuses, &config).unwrap();
        assert_eq!(
            ready,
            Ready {
                unit: UnitId(3),
                ticks: 0.0,
                held: false
            }
        );
        // overdue selection never advances time
        assert_eq!(units[0].runtime.initiative, -5.0);
    }

    #[test]
    fn held_units_keep_their_slot_but_lose_it() {
        let statuses = sample_statuses();
        let modules = sample_modules();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 50.0), runner(2, 10.0)];
        apply(&mut units[0], &statuses, StatusApplication::new("stun", 1, UnitId(2)));
        recompute_all(&mut units, &statuses, &modules);

        let ready = select_next(&mut units, &statuses, &config).unwrap();
        assert_eq!(ready.unit, UnitId(1));
        assert!(ready.held);
        assert_eq!(ready.ticks, 2.0);
        assert_eq!(units[1].runtime.initiative, 80.0);
    }

    #[test]
    fn nobody_ready_when_every_living_unit_is_held() {
        let statuses = sample_statuses();
        let modules = sample_modules();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 10.0), runner(2, 10.0)];
        for unit in &mut units {
            apply(unit, &statuses, StatusApplication::new("freeze", 2, UnitId(1)));
        }
        recompute_all(&mut units, &statuses, &modules);
        let before = units.clone();

        assert_eq!(select_next(&mut units, &statuses, &config), None);
        assert_eq!(units, before);
    }

    #[test]
    fn step_one_only_takes_units_at_or_below_zero() {
        let statuses = sample_statuses();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 10.0), runner(2, 10.0)];
        units[0].runtime.initiative = 0.0005;
        units[1].runtime.initiative = 50.0;

        // within epsilon but above zero: time still advances to reach it
        let ready = select_next(&mut units, &statuses, &config).unwrap();
        assert_eq!(ready.unit, UnitId(1));
        assert!(ready.ticks > 0.0);
        assert!(units[1].runtime.initiative < 50.0);
    }

    #[test]
    fn nobody_ready_when_all_disabled_or_stalled() {
        let statuses = sample_statuses();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 0.0)];
        assert_eq!(select_next(&mut units, &statuses, &config), None);

        let mut dead = vec![runner(2, 10.0)];
        dead[0].stats.hp = 0.0;
        assert_eq!(select_next(&mut dead, &statuses, &config), None);
    }

    #[test]
    fn haste_and_slow_scale_speed() {
        let statuses = sample_statuses();
        let mut hasted = runner(1, 10.0);
        apply(&mut hasted, &statuses, StatusApplication::new("haste", PERMANENT, UnitId(1)));
        assert_eq!(effective_speed(&hasted, &statuses), 15.0);

        let mut slowed = runner(2, 10.0);
        apply(&mut slowed, &statuses, StatusApplication::new("slow", PERMANENT, UnitId(2)));
        assert_eq!(effective_speed(&slowed, &statuses), 5.0);

        slowed.stats.spd = -4.0;
        assert_eq!(effective_speed(&slowed, &statuses), 0.0);
    }

    #[test]
    fn reset_adds_threshold_and_delay() {
        let mut unit = runner(1, 10.0);
        unit.runtime.initiative = -3.0;
        reset_initiative(&mut unit, 100.0, 25.0);
        assert_eq!(unit.runtime.initiative, 122.0);
    }

    #[test]
    fn turn_order_is_a_pure_preview() {
        let statuses = sample_statuses();
        let config = CombatConfig::default();
        let units = vec![runner(1, 20.0), runner(2, 10.0)];
        let before = units.clone();

        let order = turn_order(&units, &statuses, &config, 4);
        // the second round is a tie at zero that the faster unit wins
        assert_eq!(order, vec![UnitId(1), UnitId(1), UnitId(2), UnitId(1)]);
        assert_eq!(units, before);
    }

    #[test]
    fn turn_order_skips_the_slot_a_stun_costs() {
        let statuses = sample_statuses();
        let modules = sample_modules();
        let config = CombatConfig::default();
        let mut units = vec![runner(1, 20.0), runner(2, 10.0)];
        let free = turn_order(&units, &statuses, &config, 4);
        assert_eq!(free, vec![UnitId(1), UnitId(1), UnitId(2), UnitId(1)]);

        apply(&mut units[1], &statuses, StatusApplication::new("stun", 1, UnitId(1)));
        recompute_all(&mut units, &statuses, &modules);
        let stunned = turn_order(&units, &statuses, &config, 4);
        assert_eq!(stunned, vec![UnitId(1), UnitId(1), UnitId(1), UnitId(1)]);
        assert_eq!(turn_order(&units, &statuses, &config, 5)[4], UnitId(2));
        assert!(units[1].has_status("stun"));
    }

    #[test]
    fn jitter_draws_only_when_enabled() {
        let mut state = CombatState::new(Grid::new(2, 2), 9);
        let plain = CombatConfig::default();
        assert_eq!(initial_initiative(&mut state, &PcgRng, &plain, UnitId(1)), 100.0);
        assert_eq!(state.rng_cursor, 0);

        let jittered = CombatConfig::default().with_initiative_jitter(10.0);
        let value = initial_initiative(&mut state, &PcgRng, &jittered, UnitId(1));
        assert!((100.0..110.0).contains(&value));
        assert_eq!(state.rng_cursor, 1);
        assert_eq!(initial_initiative(&mut state, &FixedRng(0), &jittered, UnitId(1)), 100.0);
    }
}
