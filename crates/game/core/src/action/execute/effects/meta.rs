//! Shape and control-flow ops.

use crate::action::condition::Condition;
use crate::action::error::OpError;
use crate::action::execute::{ChainRequest, OpContext, OpRunner, resolve_reaction_target, shapes};
use crate::action::op::Op;
use crate::action::skill::ReactionTarget;
use crate::action::targeting::TargetFilter;
use crate::state::{DelayedEffect, LogEntry, LogKind, Position};

impl OpRunner<'_, '_> {
    /// Centre of area shapes: the target tile, or the primary target's tile.
    fn shape_center(&self, ctx: &OpContext) -> Result<Position, OpError> {
        ctx.position
            .or_else(|| ctx.primary.and_then(|id| self.state.unit(id)).map(|u| u.position))
            .ok_or(OpError::NoPosition)
    }

    pub(crate) fn op_aoe(
        &mut self,
        ctx: &mut OpContext,
        radius: u32,
        filter: Option<TargetFilter>,
    ) -> Result<(), OpError> {
        let center = self.shape_center(ctx)?;
        let user = self.state.find(ctx.source).ok_or(OpError::NoTarget)?;
        ctx.targets = shapes::in_radius(&self.state.units, user, center, radius, filter.unwrap_or(ctx.filter));
        Ok(())
    }

    pub(crate) fn op_line(&mut self, ctx: &mut OpContext, length: u32, width: u32) -> Result<(), OpError> {
        let toward = self.shape_center(ctx)?;
        let user = self.state.find(ctx.source).ok_or(OpError::NoTarget)?;
        ctx.targets = shapes::line(&self.state.units, user, toward, length, width, ctx.filter);
        Ok(())
    }

    pub(crate) fn op_cone(&mut self, ctx: &mut OpContext, length: u32, angle: u32) -> Result<(), OpError> {
        let toward = self.shape_center(ctx)?;
        let user = self.state.find(ctx.source).ok_or(OpError::NoTarget)?;
        ctx.targets = shapes::cone(&self.state.units, user, toward, length, angle, ctx.filter);
        Ok(())
    }

    pub(crate) fn op_chain(&mut self, ctx: &mut OpContext, max_targets: u32, jump: u32) -> Result<(), OpError> {
        let first = ctx.primary.ok_or(OpError::NoTarget)?;
        let user = self.state.find(ctx.source).ok_or(OpError::NoTarget)?;
        ctx.targets = shapes::chain(&self.state.units, user, first, max_targets, jump, ctx.filter);
        Ok(())
    }

    /// Queues `skill` as a chain reaction of the current action.
    pub(crate) fn op_trigger(
        &mut self,
        ctx: &mut OpContext,
        skill: &str,
        target: ReactionTarget,
    ) -> Result<(), OpError> {
        if !self.env.skills().contains(skill) {
            return Err(OpError::UnknownSkill(skill.to_owned()));
        }
        let target = resolve_reaction_target(self.state, ctx.source, ctx.primary, target)
            .ok_or(OpError::NoTarget)?;
        tracing::debug!(target: "combat::chain", unit = %ctx.source, skill, ?target, "chain requested");
        self.out.chain_requests.push(ChainRequest {
            source: ctx.source,
            skill: skill.to_owned(),
            target,
        });
        Ok(())
    }

    /// Parks `ops` on the user; they run at its turn start `turns` turns on.
    pub(crate) fn op_delayed(&mut self, ctx: &mut OpContext, turns: u32, ops: &[Op]) -> Result<(), OpError> {
        let user = self.state.unit_mut(ctx.source).ok_or(OpError::NoTarget)?;
        let turns = turns.max(1);
        user.runtime.delayed.push(DelayedEffect {
            turns_left: turns,
            skill: ctx.skill.clone(),
            targets: ctx.targets.clone(),
            position: ctx.position,
            ops: ops.to_vec(),
        });
        self.state.record(
            LogEntry::new(LogKind::Info, format!("{} schedules an effect in {turns} turns", ctx.source))
                .source(ctx.source)
                .value(f64::from(turns))
                .skill(ctx.skill.as_deref()),
        );
        Ok(())
    }

    pub(crate) fn op_conditional(
        &mut self,
        ctx: &mut OpContext,
        condition: &Condition,
        then: &[Op],
        otherwise: &[Op],
    ) -> Result<(), OpError> {
        let holds = {
            let source = self.state.find(ctx.source).ok_or(OpError::NoTarget)?;
            let target = ctx
                .primary
                .or_else(|| ctx.targets.first().copied())
                .and_then(|id| self.state.find(id));
            condition.evaluate(source, target)
        };
        let branch = if holds { then } else { otherwise };
        self.run_ops(branch, ctx);
        Ok(())
    }
}
