//! Self-movement ops: `Move`, `Dash`, `Teleport`, `Leap`.

use crate::action::error::OpError;
use crate::action::execute::{OpContext, OpRunner, shapes};
use crate::action::targeting::TargetFilter;
use crate::state::{LogEntry, LogKind, Position, UnitId};
use crate::status::TriggerEvent;

use super::damage::Hit;

impl OpRunner<'_, '_> {
    /// Moves `unit` to `to` and fires its `OnMove` triggers.
    pub(crate) fn relocate(&mut self, unit: UnitId, to: Position, depth: u32) -> Result<(), OpError> {
        let from = self
            .state
            .unit(unit)
            .map(|u| u.position)
            .ok_or(OpError::NoTarget)?;
        if from == to {
            return Ok(());
        }
        self.state.grid.relocate(unit, from, to)?;
        if let Some(moved) = self.state.unit_mut(unit) {
            moved.position = to;
        }
        tracing::debug!(target: "combat::move", %unit, %from, %to, "unit moved");
        self.state.record(
            LogEntry::new(LogKind::Move, format!("{unit} moves {from} -> {to}"))
                .source(unit)
                .value(f64::from(from.distance(to))),
        );
        self.mark(unit);
        self.fire(unit, TriggerEvent::OnMove, depth, None);
        Ok(())
    }

    /// Steps `unit` up to `distance` tiles along `direction`, stopping before
    /// the first tile that is not free. Returns the tiles travelled.
    pub(crate) fn slide(
        &mut self,
        unit: UnitId,
        direction: (i32, i32),
        distance: u32,
        depth: u32,
    ) -> Result<u32, OpError> {
        let Some(start) = self.state.unit(unit).map(|u| u.position) else {
            return Ok(0);
        };
        if direction == (0, 0) {
            return Ok(0);
        }
        let mut end = start;
        let mut travelled = 0;
        while travelled < distance {
            let next = end.offset(direction.0, direction.1);
            if !self.state.grid.is_free(next) {
                break;
            }
            end = next;
            travelled += 1;
        }
        if travelled > 0 {
            self.relocate(unit, end, depth)?;
        }
        Ok(travelled)
    }

    pub(crate) fn op_move(&mut self, ctx: &mut OpContext) -> Result<(), OpError> {
        let destination = ctx.position.ok_or(OpError::NoPosition)?;
        let user = self.state.unit(ctx.source).ok_or(OpError::NoTarget)?;
        if user.position == destination {
            return Ok(());
        }
        self.state.grid.check_free(destination)?;
        if !self.env.movement.can_reach(user, &self.state.grid, destination) {
            return Err(OpError::Unreachable(destination));
        }
        self.relocate(ctx.source, destination, ctx.depth)
    }

    pub(crate) fn op_dash(&mut self, ctx: &mut OpContext, distance: u32) -> Result<(), OpError> {
        let toward = ctx.position.ok_or(OpError::NoPosition)?;
        let from = self
            .state
            .unit(ctx.source)
            .map(|u| u.position)
            .ok_or(OpError::NoTarget)?;
        self.slide(ctx.source, from.cardinal_toward(toward), distance, ctx.depth)?;
        Ok(())
    }

    pub(crate) fn op_teleport(&mut self, ctx: &mut OpContext) -> Result<(), OpError> {
        let destination = ctx.position.ok_or(OpError::NoPosition)?;
        if self.state.unit(ctx.source).is_some_and(|u| u.position == destination) {
            return Ok(());
        }
        self.state.grid.check_free(destination)?;
        self.relocate(ctx.source, destination, ctx.depth)
    }

    /// Teleports, then strikes every enemy within `radius` of the landing
    /// tile. The struck units become the target set.
    pub(crate) fn op_leap(&mut self, ctx: &mut OpContext, hit: Hit<'_>, radius: u32) -> Result<(), OpError> {
        self.op_teleport(ctx)?;
        let user = self.state.unit(ctx.source).ok_or(OpError::NoTarget)?;
        let landing = user.position;
        let victims = shapes::in_radius(&self.state.units, user, landing, radius, TargetFilter::Enemy);
        ctx.targets = victims.clone();
        for target in victims {
            self.strike(ctx, target, hit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::action::error::OpError;
    use crate::action::execute::{OpContext, OpRunner};
    use crate::action::{Magnitude, Op};
    use crate::combat::DamageType;
    use crate::state::{LogKind, Position, Side, Terrain, UnitId};
    use crate::testing::TestWorld;

    fn ctx_at(source: u32, x: i32, y: i32) -> OpContext {
        OpContext::for_units(UnitId(source), Vec::new(), 0).with_position(Some(Position::new(x, y)))
    }

    #[test]
    fn move_respects_the_movement_oracle() {
        let mut world = TestWorld::new(8, 8);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));

        let mut far = ctx_at(1, 6, 6);
        runner.run_ops(&[Op::Move], &mut far);
        let mut near = ctx_at(1, 2, 1);
        runner.run_ops(&[Op::Move], &mut near);
        let out = runner.finish();

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].error, OpError::Unreachable(Position::new(6, 6)));
        assert_eq!(world.state.unit(UnitId(1)).unwrap().position, Position::new(2, 1));
        assert_eq!(world.state.grid.occupant(Position::new(2, 1)), Some(UnitId(1)));
        assert!(world.state.grid.is_free(Position::ORIGIN));
        assert!(world.state.log.events().iter().any(|e| e.kind == LogKind::Move));
    }

    #[test]
    fn dash_stops_at_walls() {
        let mut world = TestWorld::new(8, 1);
        world.state.grid.set_terrain(Position::new(3, 0), Terrain::Wall).unwrap();
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = ctx_at(1, 7, 0);
        runner.run_ops(&[Op::Dash { distance: 5 }], &mut ctx);
        assert_eq!(world.state.unit(UnitId(1)).unwrap().position, Position::new(2, 0));
    }

    #[test]
    fn teleport_fails_onto_occupied_tiles() {
        let mut world = TestWorld::new(8, 8);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(5, 5));
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = ctx_at(1, 5, 5);
        runner.run_ops(&[Op::Teleport], &mut ctx);
        let out = runner.finish();
        assert_eq!(out.failures[0].error, OpError::Blocked(Position::new(5, 5)));
        assert_eq!(world.state.unit(UnitId(1)).unwrap().position, Position::ORIGIN);
    }

    #[test]
    fn leap_damages_enemies_around_the_landing_tile() {
        let mut world = TestWorld::new(8, 8);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(5, 4));
        world.add(UnitId(3), Side::Opponent, Position::new(7, 7));
        world.add(UnitId(4), Side::Player, Position::new(4, 5));
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = ctx_at(1, 4, 4);
        runner.run_ops(
            &[Op::Leap {
                power: Magnitude::Flat(12.0),
                damage_type: DamageType::True,
                radius: 1,
            }],
            &mut ctx,
        );
        let out = runner.finish();
        assert_eq!(ctx.targets, vec![UnitId(2)]);
        assert_eq!(out.hit_units(), vec![UnitId(2)]);
        assert_eq!(world.state.unit(UnitId(2)).unwrap().stats.hp, 88.0);
        assert_eq!(world.state.unit(UnitId(4)).unwrap().stats.hp, 100.0);
    }
}
