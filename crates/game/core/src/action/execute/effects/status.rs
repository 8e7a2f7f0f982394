//! Status ops: `ApplyStatus`, `Cleanse`, `Transfer`, `Convert`.

use crate::action::error::OpError;
use crate::action::execute::{OpContext, OpRunner};
use crate::action::formula::Magnitude;
use crate::action::op::TransferDirection;
use crate::env::RollContext;
use crate::status::{self, CleanseFilter, StatusApplication, StatusCategory};

impl OpRunner<'_, '_> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_apply_status(
        &mut self,
        ctx: &mut OpContext,
        status_id: &str,
        duration: i32,
        value: &Magnitude,
        stacks: u32,
        target_self: bool,
        chance: Option<f64>,
    ) -> Result<(), OpError> {
        if !self.env.statuses().contains(status_id) {
            return Err(OpError::UnknownStatus(status_id.to_owned()));
        }
        for target in ctx.target_set(target_self) {
            if !self.is_alive(target) {
                continue;
            }
            if let Some(chance) = chance
                && chance < 1.0
            {
                let roll = if chance > 0.0 {
                    self.state.roll(self.env.rng, ctx.source, RollContext::StatusChance)
                } else {
                    1.0
                };
                if roll >= chance {
                    tracing::debug!(
                        target: "combat::status",
                        unit = %target,
                        status = status_id,
                        chance,
                        "status application failed its roll"
                    );
                    continue;
                }
            }
            let payload = self.magnitude(ctx, value, Some(target));
            let app = StatusApplication::new(status_id, duration, ctx.source)
                .value(payload)
                .stacks(stacks);
            self.apply_status_to(target, app, ctx.depth);
        }
        Ok(())
    }

    pub(crate) fn op_cleanse(
        &mut self,
        ctx: &mut OpContext,
        category: Option<StatusCategory>,
        status_id: Option<&str>,
        count: Option<u32>,
        target_self: bool,
    ) -> Result<(), OpError> {
        let filter = CleanseFilter {
            category,
            status_id: status_id.map(str::to_owned),
            limit: count,
        };
        let statuses = self.env.statuses();
        for target in ctx.target_set(target_self) {
            let Some(unit) = self.state.unit_mut(target).filter(|u| u.is_alive()) else {
                continue;
            };
            let events = status::cleanse(unit, statuses, &filter);
            self.run_status_events(events, ctx.depth, None);
        }
        Ok(())
    }

    pub(crate) fn op_transfer(
        &mut self,
        ctx: &mut OpContext,
        category: StatusCategory,
        count: u32,
        direction: TransferDirection,
    ) -> Result<(), OpError> {
        let statuses = self.env.statuses();
        for target in ctx.targets.clone() {
            if !self.is_alive(target) {
                continue;
            }
            let Some((user, other)) = self.state.pair_mut(ctx.source, target) else {
                continue;
            };
            let events = match direction {
                TransferDirection::ToTarget => status::transfer(user, other, statuses, category, count),
                TransferDirection::FromTarget => status::transfer(other, user, statuses, category, count),
            };
            self.mark(ctx.source);
            self.mark(target);
            self.run_status_events(events, ctx.depth, None);
        }
        Ok(())
    }

    pub(crate) fn op_convert(
        &mut self,
        ctx: &mut OpContext,
        from: StatusCategory,
        into: &str,
        duration: i32,
        count: u32,
    ) -> Result<(), OpError> {
        let statuses = self.env.statuses();
        if !statuses.contains(into) {
            return Err(OpError::UnknownStatus(into.to_owned()));
        }
        for target in ctx.targets.clone() {
            let Some(unit) = self.state.unit_mut(target).filter(|u| u.is_alive()) else {
                continue;
            };
            let app = StatusApplication::new(into, duration, ctx.source);
            let events = status::convert(unit, statuses, from, app, count);
            self.run_status_events(events, ctx.depth, None);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::action::error::OpError;
    use crate::action::execute::{OpContext, OpRunner};
    use crate::action::op::TransferDirection;
    use crate::action::{Magnitude, Op};
    use crate::env::FixedRng;
    use crate::state::{LogKind, Position, Side, UnitId};
    use crate::status::StatusCategory;
    use crate::testing::TestWorld;

    fn pair() -> TestWorld {
        let mut world = TestWorld::new(6, 6);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(1, 0));
        world
    }

    #[test]
    fn apply_status_evaluates_its_payload_and_recomputes() {
        let mut world = pair();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(
            &[
                Op::apply_status_with("burn", 3, Magnitude::Scaled(0.5)),
                Op::apply_status("haste", 2),
            ],
            &mut ctx,
        );

        let target = world.state.unit(UnitId(2)).unwrap();
        assert_eq!(target.status("burn").unwrap().value, 5.0);
        assert_eq!(target.status("burn").unwrap().source, UnitId(1));
        assert!(target.has_status("haste"));
        assert!(world.state.log.events().iter().any(|e| e.kind == LogKind::StatusApply));
    }

    #[test]
    fn unknown_status_fails_the_op_but_not_the_list() {
        let mut world = pair();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(
            &[
                Op::apply_status("missing", 2),
                Op::apply_status("poison", 2),
            ],
            &mut ctx,
        );
        let out = runner.finish();
        assert_eq!(out.failures[0].op, "apply_status");
        assert_eq!(out.failures[0].error, OpError::UnknownStatus("missing".into()));
        assert!(world.state.unit(UnitId(2)).unwrap().has_status("poison"));
        assert!(world.state.log.events().iter().any(|e| e.kind == LogKind::OpFailed));
    }

    #[test]
    fn status_chance_uses_the_rng() {
        let mut world = pair();
        let op = Op::ApplyStatus {
            status: "stun".into(),
            duration: 1,
            value: Magnitude::default(),
            stacks: 1,
            target_self: false,
            chance: Some(0.5),
        };
        {
            let (state, env) = world.split();
            let mut runner = OpRunner::new(state, env, UnitId(1));
            let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
            runner.run_ops(std::slice::from_ref(&op), &mut ctx);
        }
        assert!(!world.state.unit(UnitId(2)).unwrap().has_status("stun"));
        assert_eq!(world.state.rng_cursor, 1);

        world.rng = FixedRng(0);
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(std::slice::from_ref(&op), &mut ctx);
        assert!(world.state.unit(UnitId(2)).unwrap().has_status("stun"));
    }

    #[test]
    fn cleanse_and_transfer_move_debuffs() {
        let mut world = pair();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut own = OpContext::for_units(UnitId(1), vec![UnitId(1)], 0);
        runner.run_ops(&[Op::apply_status("poison", 3), Op::apply_status("slow", 3)], &mut own);

        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(
            &[Op::Transfer {
                category: StatusCategory::Debuff,
                count: 1,
                direction: TransferDirection::ToTarget,
            }],
            &mut ctx,
        );
        runner.run_ops(
            &[Op::Cleanse {
                category: Some(StatusCategory::Debuff),
                status: None,
                count: None,
                target_self: true,
            }],
            &mut ctx,
        );

        let user = world.state.unit(UnitId(1)).unwrap();
        let target = world.state.unit(UnitId(2)).unwrap();
        assert!(user.statuses.is_empty());
        assert!(target.has_status("poison"));
        assert!(!target.has_status("slow"));
    }

    #[test]
    fn convert_turns_debuffs_into_a_buff() {
        let mut world = pair();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(
            &[
                Op::apply_status("burn", 3),
                Op::apply_status("poison", 3),
                Op::Convert {
                    from: StatusCategory::Debuff,
                    into: "regen".into(),
                    duration: 2,
                    count: 2,
                },
            ],
            &mut ctx,
        );
        let target = world.state.unit(UnitId(2)).unwrap();
        assert_eq!(target.status_ids().collect::<Vec<_>>(), vec!["regen"]);
        assert_eq!(target.status("regen").unwrap().duration, 4);
    }
}
