//! `Summon` and `Transform`.

use crate::action::error::OpError;
use crate::action::execute::{OpContext, OpRunner};
use crate::engine::roster;
use crate::state::{LogEntry, LogKind, SummonState, TransformState, Unit};

/// Restores a transformed unit's own template data. Returns whether the
/// unit was transformed.
pub fn revert_transform(unit: &mut Unit) -> bool {
    let Some(transform) = unit.runtime.transform.take() else {
        return false;
    };
    unit.type_tag = transform.original_type_tag;
    unit.base = transform.original_base;
    unit.resistances = transform.original_resistances;
    unit.skills = transform.original_skills;
    tracing::debug!(target: "combat::action", unit = %unit.id, from = %transform.into, "transform reverted");
    true
}

impl OpRunner<'_, '_> {
    /// Creates a unit on the user's side from `template`.
    ///
    /// The summon lands on the target tile when it is free, otherwise on the
    /// first free tile next to the user.
    pub(crate) fn op_summon(
        &mut self,
        ctx: &mut OpContext,
        template_id: &str,
        level: Option<u32>,
        duration: Option<u32>,
    ) -> Result<(), OpError> {
        let template = self
            .env
            .templates()
            .get(template_id)
            .ok_or_else(|| OpError::UnknownTemplate(template_id.to_owned()))?;
        let owner = self.state.unit(ctx.source).ok_or(OpError::NoTarget)?;
        let side = owner.side;
        let level = level.unwrap_or(owner.level);
        let grid = &self.state.grid;
        let position = ctx
            .position
            .filter(|p| grid.is_free(*p))
            .or_else(|| grid.neighbours(owner.position).into_iter().find(|p| grid.is_free(*p)))
            .ok_or(OpError::NoPosition)?;

        let id = roster::instantiate(self.state, &self.env, template, side, level, position)?;
        if let Some(summon) = self.state.unit_mut(id) {
            summon.runtime.summon = Some(SummonState {
                owner: ctx.source,
                turns_left: duration,
            });
        }
        tracing::debug!(
            target: "combat::action",
            owner = %ctx.source,
            unit = %id,
            template = template_id,
            %position,
            "unit summoned"
        );
        self.state.record(
            LogEntry::new(LogKind::Summon, format!("{} summons {template_id} as {id}", ctx.source))
                .source(ctx.source)
                .target(id)
                .skill(ctx.skill.as_deref()),
        );
        self.mark(id);
        ctx.targets = vec![id];
        Ok(())
    }

    /// Swaps each target's template data for `template_id` for `duration`
    /// of its own turns. Repeated transforms keep the first originals.
    pub(crate) fn op_transform(
        &mut self,
        ctx: &mut OpContext,
        template_id: &str,
        duration: u32,
    ) -> Result<(), OpError> {
        let template = self
            .env
            .templates()
            .get(template_id)
            .ok_or_else(|| OpError::UnknownTemplate(template_id.to_owned()))?;
        let growth = self.env.config.level_growth;

        for target in ctx.targets.clone() {
            let Some(unit) = self.state.unit_mut(target).filter(|u| u.is_alive()) else {
                continue;
            };
            let state = match unit.runtime.transform.take() {
                Some(previous) => TransformState {
                    into: template_id.to_owned(),
                    turns_left: duration,
                    ..previous
                },
                None => TransformState {
                    into: template_id.to_owned(),
                    turns_left: duration,
                    original_type_tag: unit.type_tag.clone(),
                    original_base: unit.base.clone(),
                    original_resistances: unit.resistances.clone(),
                    original_skills: unit.skills.clone(),
                },
            };
            unit.runtime.transform = Some(state);
            unit.type_tag = template.type_tag.clone();
            unit.base = template.base.scaled_for_level(unit.level, growth);
            unit.resistances = template.resistances.iter().map(|(k, v)| (*k, *v)).collect();
            unit.skills = template.skills.clone();

            self.state.record(
                LogEntry::new(LogKind::Transform, format!("{target} transforms into {template_id}"))
                    .source(ctx.source)
                    .target(target)
                    .value(f64::from(duration))
                    .skill(ctx.skill.as_deref()),
            );
            self.mark(target);
        }
        self.refresh();
        Ok(())
    }
}
