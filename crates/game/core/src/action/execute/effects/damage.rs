//! `Damage` and the hit resolution shared with `Leap`.

use crate::action::error::OpError;
use crate::action::execute::{DamageRecord, OpContext, OpRunner};
use crate::action::formula::{FormulaInputs, Magnitude, evaluate};
use crate::combat::{CritRoll, DamageInput, DamageModifier, DamageType, absorb, compute_damage};
use crate::env::RollContext;
use crate::state::{LogEntry, LogKind, UnitId};
use crate::status;

/// Parameters of one damage op.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Hit<'a> {
    pub power: &'a Magnitude,
    pub damage_type: DamageType,
    pub modifiers: &'a [DamageModifier],
    pub force_crit: bool,
    /// Skip evasion, crit and the pipeline.
    pub raw: bool,
}

impl<'a> Hit<'a> {
    pub fn new(power: &'a Magnitude, damage_type: DamageType) -> Self {
        Self {
            power,
            damage_type,
            modifiers: &[],
            force_crit: false,
            raw: false,
        }
    }
}

impl OpRunner<'_, '_> {
    pub(crate) fn op_damage(
        &mut self,
        ctx: &mut OpContext,
        hit: Hit<'_>,
        target_self: bool,
    ) -> Result<(), OpError> {
        for target in ctx.target_set(target_self) {
            self.strike(ctx, target, hit);
        }
        Ok(())
    }

    /// Resolves one hit against `target` and returns the damage dealt.
    ///
    /// Dead or missing targets take nothing. Evasion and crit draw from the
    /// RNG only when the relevant chance is positive.
    pub(crate) fn strike(&mut self, ctx: &mut OpContext, target: UnitId, hit: Hit<'_>) -> f64 {
        let (evasion, crit_chance) = match (self.state.unit(target), self.state.find(ctx.source)) {
            (Some(defender), Some(attacker)) if defender.is_alive() => {
                (defender.stats.eva, attacker.stats.crit)
            }
            _ => return 0.0,
        };

        if !hit.raw && !hit.force_crit && evasion > 0.0 {
            let roll = self.state.roll(self.env.rng, ctx.source, RollContext::Evasion);
            if roll < evasion {
                tracing::debug!(target: "combat::damage", source = %ctx.source, %target, "evaded");
                self.state.record(
                    LogEntry::new(LogKind::Miss, format!("{target} evades {}", ctx.source))
                        .source(ctx.source)
                        .target(target)
                        .skill(ctx.skill.as_deref()),
                );
                return 0.0;
            }
        }

        let crit = if hit.raw {
            CritRoll::Never
        } else if hit.force_crit {
            CritRoll::Forced
        } else if crit_chance > 0.0 {
            CritRoll::Roll(self.state.roll(self.env.rng, ctx.source, RollContext::Crit))
        } else {
            CritRoll::Never
        };

        let (amount, is_crit) = {
            let (Some(attacker), Some(defender)) = (self.state.find(ctx.source), self.state.unit(target))
            else {
                return 0.0;
            };
            let inputs = FormulaInputs {
                source: attacker,
                target: Some(defender),
                status: ctx.status.as_ref(),
                damage_dealt: ctx.damage_dealt,
            };
            if hit.raw {
                (evaluate(hit.power, &inputs).floor(), false)
            } else {
                let (power, is_flat) = hit.power.damage_power(&inputs);
                let skill = ctx.skill.as_deref().and_then(|id| self.env.skills().get(id));
                let breakdown = compute_damage(&DamageInput {
                    attacker,
                    defender,
                    power,
                    damage_type: hit.damage_type,
                    is_flat,
                    skill,
                    distance: attacker.position.distance(defender.position),
                    modifiers: hit.modifiers,
                    crit,
                    combo_step: self.env.config.combo_step,
                    mitigation_cap: self.env.config.mitigation_cap,
                });
                (breakdown.amount, breakdown.is_crit)
            }
        };

        let Some(defender) = self.state.unit_mut(target) else {
            return 0.0;
        };
        let absorption = absorb(&mut defender.stats, amount, hit.damage_type);
        let killed = !defender.is_alive();

        tracing::debug!(
            target: "combat::damage",
            source = %ctx.source,
            %target,
            amount,
            absorbed = absorption.absorbed,
            crit = is_crit,
            "hit"
        );
        if is_crit {
            self.out.crits += 1;
            self.state.record(
                LogEntry::new(LogKind::Crit, format!("critical hit on {target}"))
                    .source(ctx.source)
                    .target(target)
                    .skill(ctx.skill.as_deref()),
            );
        }
        self.state.record(
            LogEntry::new(
                LogKind::Damage,
                format!("{} deals {amount} {} damage to {target}", ctx.source, hit.damage_type),
            )
            .source(ctx.source)
            .target(target)
            .value(amount)
            .skill(ctx.skill.as_deref()),
        );

        self.out.damage.push(DamageRecord {
            source: ctx.source,
            target,
            amount,
            damage_type: hit.damage_type,
            crit: is_crit,
        });
        ctx.damage_dealt += amount;
        self.mark(target);

        if killed {
            tracing::debug!(target: "combat::damage", unit = %target, killer = %ctx.source, "unit killed");
            self.out.kills.push(target);
            self.state.record(
                LogEntry::new(LogKind::Kill, format!("{} defeats {target}", ctx.source))
                    .source(ctx.source)
                    .target(target)
                    .skill(ctx.skill.as_deref()),
            );
        } else if amount > 0.0 {
            let statuses = self.env.statuses();
            if let Some(defender) = self.state.unit_mut(target) {
                let events = status::break_on_damage(defender, statuses);
                self.run_status_events(events, ctx.depth, None);
            }
        }
        amount
    }
}

#[cfg(test)]
mod tests {
    use crate::action::execute::{OpContext, OpRunner};
    use crate::action::{Magnitude, Op};
    use crate::combat::DamageType;
    use crate::env::FixedRng;
    use crate::state::{LogKind, PERMANENT, Position, Side, UnitId};
    use crate::status::StatusApplication;
    use crate::testing::TestWorld;

    fn duel() -> TestWorld {
        let mut world = TestWorld::new(6, 6);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(1, 0));
        world
    }

    #[test]
    fn scaled_damage_goes_through_the_pipeline() {
        let mut world = duel();
        world.state.unit_mut(UnitId(2)).unwrap().stats.def = 5.0;
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::damage(Magnitude::Scaled(1.5), DamageType::Physical)], &mut ctx);
        let out = runner.finish();

        // 15 base, 15 * 5/105 mitigated
        assert_eq!(out.total_damage(), 14.0);
        assert_eq!(world.state.unit(UnitId(2)).unwrap().stats.hp, 86.0);
        assert_eq!(ctx.damage_dealt, 14.0);
    }

    #[test]
    fn raw_damage_skips_mitigation_but_not_absorption() {
        let mut world = duel();
        {
            let target = world.state.unit_mut(UnitId(2)).unwrap();
            target.stats.def = 500.0;
            target.stats.barrier = 4.0;
        }
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::raw_damage(Magnitude::Flat(10.0), DamageType::Fire)], &mut ctx);

        let target = world.state.unit(UnitId(2)).unwrap();
        assert_eq!(target.stats.barrier, 0.0);
        assert_eq!(target.stats.hp, 94.0);
    }

    #[test]
    fn guaranteed_evasion_logs_a_miss() {
        let mut world = duel();
        world.rng = FixedRng(0);
        world.state.unit_mut(UnitId(2)).unwrap().stats.eva = 0.5;
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::damage(Magnitude::Flat(30.0), DamageType::True)], &mut ctx);
        let out = runner.finish();

        assert!(out.damage.is_empty());
        assert_eq!(world.state.unit(UnitId(2)).unwrap().stats.hp, 100.0);
        assert!(world.state.log.events().iter().any(|e| e.kind == LogKind::Miss));
    }

    #[test]
    fn lethal_hit_records_a_kill() {
        let mut world = duel();
        world.state.unit_mut(UnitId(2)).unwrap().stats.hp = 5.0;
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(
            &[
                Op::damage(Magnitude::Flat(30.0), DamageType::True),
                Op::damage(Magnitude::Flat(30.0), DamageType::True),
            ],
            &mut ctx,
        );
        let out = runner.finish();

        assert_eq!(out.kills, vec![UnitId(2)]);
        // second hit finds a dead target
        assert_eq!(out.damage.len(), 1);
        assert_eq!(out.damage[0].amount, 30.0);
    }

    #[test]
    fn damage_wakes_sleeping_targets() {
        let mut world = duel();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        runner.apply_status_to(UnitId(2), StatusApplication::new("sleep", PERMANENT, UnitId(1)), 0);
        assert!(runner.state.unit(UnitId(2)).unwrap().runtime.disabled.is_incapacitated());

        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::damage(Magnitude::Flat(1.0), DamageType::True)], &mut ctx);

        let target = world.state.unit(UnitId(2)).unwrap();
        assert!(!target.has_status("sleep"));
        assert!(target.runtime.disabled.is_empty());
    }

    #[test]
    fn previous_damage_feeds_later_ops() {
        let mut world = duel();
        world.state.unit_mut(UnitId(1)).unwrap().stats.hp = 50.0;
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(
            &[
                Op::damage(Magnitude::Flat(20.0), DamageType::True),
                Op::self_heal(Magnitude::PreviousDamage(0.5)),
            ],
            &mut ctx,
        );
        assert_eq!(world.state.unit(UnitId(1)).unwrap().stats.hp, 60.0);
    }
}
