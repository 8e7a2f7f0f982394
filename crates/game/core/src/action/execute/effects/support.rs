//! Restorative ops: `Heal`, `Shield`, `Revive`.

use crate::action::error::OpError;
use crate::action::execute::{OpContext, OpRunner};
use crate::action::formula::Magnitude;
use crate::action::op::ShieldPool;
use crate::state::{LogEntry, LogKind, UnitId, UnitRuntime};

use super::spawn::revert_transform;

impl OpRunner<'_, '_> {
    /// Restores up to `amount` HP on a living unit; returns what was healed.
    pub(crate) fn restore_hp(
        &mut self,
        source: UnitId,
        target: UnitId,
        amount: f64,
        skill: Option<&str>,
    ) -> f64 {
        let Some(unit) = self.state.unit_mut(target).filter(|u| u.is_alive()) else {
            return 0.0;
        };
        let healed = amount.min(unit.stats.max_hp - unit.stats.hp).max(0.0);
        unit.stats.hp += healed;
        self.out.healing += healed;
        self.mark(target);
        self.state.record(
            LogEntry::new(LogKind::Heal, format!("{source} restores {healed} HP to {target}"))
                .source(source)
                .target(target)
                .value(healed)
                .skill(skill),
        );
        healed
    }

    pub(crate) fn op_heal(
        &mut self,
        ctx: &mut OpContext,
        amount: &Magnitude,
        target_self: bool,
    ) -> Result<(), OpError> {
        for target in ctx.target_set(target_self) {
            let value = self.magnitude(ctx, amount, Some(target)).floor();
            self.restore_hp(ctx.source, target, value, ctx.skill.as_deref());
        }
        Ok(())
    }

    pub(crate) fn op_shield(
        &mut self,
        ctx: &mut OpContext,
        amount: &Magnitude,
        pool: ShieldPool,
        target_self: bool,
    ) -> Result<(), OpError> {
        for target in ctx.target_set(target_self) {
            let value = self.magnitude(ctx, amount, Some(target)).floor();
            let Some(unit) = self.state.unit_mut(target).filter(|u| u.is_alive()) else {
                continue;
            };
            match pool {
                ShieldPool::Shield => unit.stats.shield += value,
                ShieldPool::Barrier => unit.stats.barrier += value,
            }
            self.mark(target);
            self.state.record(
                LogEntry::new(LogKind::Shield, format!("{target} gains {value} {pool}"))
                    .source(ctx.source)
                    .target(target)
                    .value(value)
                    .skill(ctx.skill.as_deref()),
            );
        }
        Ok(())
    }

    /// Returns the most recently fallen ally of the user to the target tile.
    pub(crate) fn op_revive(&mut self, ctx: &mut OpContext, hp_ratio: f64) -> Result<(), OpError> {
        let position = ctx.position.ok_or(OpError::NoPosition)?;
        let side = self
            .state
            .unit(ctx.source)
            .map(|u| u.side)
            .ok_or(OpError::NoTarget)?;
        self.state.grid.check_free(position)?;
        let index = self
            .state
            .graveyard
            .iter()
            .rposition(|u| u.side == side)
            .ok_or(OpError::NoFallenAlly)?;

        let mut unit = self.state.graveyard.remove(index);
        revert_transform(&mut unit);
        unit.statuses.clear();
        unit.runtime = UnitRuntime {
            initiative: self.env.config.base_threshold,
            next_status_instance: unit.runtime.next_status_instance,
            ..UnitRuntime::default()
        };
        unit.position = position;
        unit.stats.shield = 0.0;
        unit.stats.barrier = 0.0;
        unit.stats.hp = (unit.stats.max_hp * hp_ratio).floor().max(1.0);
        let id = unit.id;
        let hp = unit.stats.hp;

        self.state.spawn(unit)?;
        self.refresh();
        tracing::debug!(target: "combat::action", unit = %id, hp, "unit revived");
        self.state.record(
            LogEntry::new(LogKind::Revive, format!("{} revives {id}", ctx.source))
                .source(ctx.source)
                .target(id)
                .value(hp)
                .skill(ctx.skill.as_deref()),
        );
        self.mark(id);
        ctx.targets = vec![id];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::action::error::OpError;
    use crate::action::execute::{OpContext, OpRunner};
    use crate::action::op::ShieldPool;
    use crate::action::{Magnitude, Op};
    use crate::state::{LogKind, Position, Side, UnitId};
    use crate::testing::TestWorld;

    #[test]
    fn heal_is_capped_at_max_hp() {
        let mut world = TestWorld::new(4, 4);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.state.unit_mut(UnitId(1)).unwrap().stats.hp = 90.0;
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(1)], 0);
        runner.run_ops(&[Op::heal(Magnitude::Flat(25.0))], &mut ctx);
        let out = runner.finish();
        assert_eq!(out.healing, 10.0);
        assert_eq!(world.state.unit(UnitId(1)).unwrap().stats.hp, 100.0);
    }

    #[test]
    fn shield_fills_the_requested_pool() {
        let mut world = TestWorld::new(4, 4);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(1)], 0);
        runner.run_ops(
            &[
                Op::Shield {
                    amount: Magnitude::SourceMaxHp(0.2),
                    pool: ShieldPool::Shield,
                    target_self: true,
                },
                Op::Shield {
                    amount: Magnitude::Flat(7.0),
                    pool: ShieldPool::Barrier,
                    target_self: true,
                },
            ],
            &mut ctx,
        );
        let unit = world.state.unit(UnitId(1)).unwrap();
        assert_eq!(unit.stats.shield, 20.0);
        assert_eq!(unit.stats.barrier, 7.0);
    }

    #[test]
    fn revive_returns_the_latest_fallen_ally() {
        let mut world = TestWorld::new(6, 6);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Player, Position::new(1, 0));
        world.add(UnitId(3), Side::Player, Position::new(2, 0));
        world.add(UnitId(4), Side::Opponent, Position::new(3, 0));
        for id in [2, 3, 4] {
            world.state.unit_mut(UnitId(id)).unwrap().stats.hp = 0.0;
        }
        world.state.sweep_dead();

        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), Vec::new(), 0).with_position(Some(Position::new(0, 1)));
        runner.run_ops(&[Op::Revive { hp_ratio: 0.25 }], &mut ctx);
        assert!(runner.finish().failures.is_empty());

        let revived = world.state.unit(UnitId(3)).unwrap();
        assert_eq!(revived.stats.hp, 25.0);
        assert_eq!(revived.position, Position::new(0, 1));
        assert_eq!(world.state.graveyard.len(), 2);
        assert!(world.state.log.events().iter().any(|e| e.kind == LogKind::Revive));
    }

    #[test]
    fn revive_without_fallen_allies_fails() {
        let mut world = TestWorld::new(4, 4);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), Vec::new(), 0).with_position(Some(Position::new(1, 1)));
        runner.run_ops(&[Op::Revive { hp_ratio: 0.5 }], &mut ctx);
        assert_eq!(runner.finish().failures[0].error, OpError::NoFallenAlly);
    }
}
