//! Forced movement: `Push`, `Pull`, `Swap`.

use crate::action::error::OpError;
use crate::action::execute::{OpContext, OpRunner};
use crate::state::{LogEntry, LogKind, Position, UnitId};
use crate::status::TriggerEvent;

impl OpRunner<'_, '_> {
    fn displaced_targets(&self, ctx: &OpContext) -> Option<(Position, Vec<(UnitId, Position)>)> {
        let origin = self.state.unit(ctx.source)?.position;
        let targets = ctx
            .targets
            .iter()
            .filter(|id| **id != ctx.source)
            .filter_map(|id| self.state.unit(*id))
            .filter(|u| u.is_alive())
            .map(|u| (u.id, u.position))
            .collect();
        Some((origin, targets))
    }

    pub(crate) fn op_push(&mut self, ctx: &mut OpContext, distance: u32) -> Result<(), OpError> {
        let (origin, targets) = self.displaced_targets(ctx).ok_or(OpError::NoTarget)?;
        for (target, position) in targets {
            self.slide(target, origin.cardinal_toward(position), distance, ctx.depth)?;
        }
        Ok(())
    }

    /// Pulled units stop next to the user, whose tile is never free.
    pub(crate) fn op_pull(&mut self, ctx: &mut OpContext, distance: u32) -> Result<(), OpError> {
        let (origin, targets) = self.displaced_targets(ctx).ok_or(OpError::NoTarget)?;
        for (target, position) in targets {
            self.slide(target, position.cardinal_toward(origin), distance, ctx.depth)?;
        }
        Ok(())
    }

    pub(crate) fn op_swap(&mut self, ctx: &mut OpContext) -> Result<(), OpError> {
        let other = ctx
            .primary
            .filter(|id| *id != ctx.source && self.is_alive(*id))
            .ok_or(OpError::NoTarget)?;
        let a = self
            .state
            .unit(ctx.source)
            .map(|u| u.position)
            .ok_or(OpError::NoTarget)?;
        let b = self
            .state
            .unit(other)
            .map(|u| u.position)
            .ok_or(OpError::NoTarget)?;

        self.state.grid.swap(a, b)?;
        if let Some((user, target)) = self.state.pair_mut(ctx.source, other) {
            user.position = b;
            target.position = a;
        }
        for (unit, from, to) in [(ctx.source, a, b), (other, b, a)] {
            self.state.record(
                LogEntry::new(LogKind::Move, format!("{unit} swaps {from} -> {to}"))
                    .source(unit)
                    .value(f64::from(from.distance(to))),
            );
            self.mark(unit);
        }
        self.fire(ctx.source, TriggerEvent::OnMove, ctx.depth, None);
        self.fire(other, TriggerEvent::OnMove, ctx.depth, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::action::execute::{OpContext, OpRunner};
    use crate::action::Op;
    use crate::state::{Position, Side, UnitId};
    use crate::testing::TestWorld;

    fn line_up() -> TestWorld {
        let mut world = TestWorld::new(8, 3);
        world.add(UnitId(1), Side::Player, Position::new(1, 1));
        world.add(UnitId(2), Side::Opponent, Position::new(3, 1));
        world
    }

    #[test]
    fn push_slides_away_from_the_user() {
        let mut world = line_up();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::Push { distance: 2 }], &mut ctx);
        assert_eq!(world.state.unit(UnitId(2)).unwrap().position, Position::new(5, 1));
    }

    #[test]
    fn push_stops_at_the_board_edge() {
        let mut world = line_up();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::Push { distance: 10 }], &mut ctx);
        assert_eq!(world.state.unit(UnitId(2)).unwrap().position, Position::new(7, 1));
    }

    #[test]
    fn pull_stops_adjacent_to_the_user() {
        let mut world = line_up();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::Pull { distance: 5 }], &mut ctx);
        assert_eq!(world.state.unit(UnitId(2)).unwrap().position, Position::new(2, 1));
    }

    #[test]
    fn swap_exchanges_tiles() {
        let mut world = line_up();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(2)], 0);
        runner.run_ops(&[Op::Swap], &mut ctx);
        assert!(runner.finish().failures.is_empty());

        assert_eq!(world.state.unit(UnitId(1)).unwrap().position, Position::new(3, 1));
        assert_eq!(world.state.unit(UnitId(2)).unwrap().position, Position::new(1, 1));
        assert_eq!(world.state.grid.occupant(Position::new(1, 1)), Some(UnitId(2)));
    }
}
