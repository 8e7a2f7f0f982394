//! Op interpreter.
//!
//! [`OpRunner`] executes op lists against the live [`CombatState`]. It is the
//! only code that turns declarative content (skills, status triggers, module
//! passives, delayed effects) into state changes.
//!
//! ## Error handling
//!
//! A failing op never aborts its list. The fault is recorded as an `OpFailed`
//! log event and an [`OpFailure`], and the next op runs. Request-level
//! rejections happen earlier, in [`validate_skill_execution`].
//!
//! ## Status events
//!
//! Every status mutation returns [`StatusEvent`]s. The runner logs them,
//! recomputes stats, and runs fired triggers as nested op lists one level
//! deeper, up to `CombatConfig::max_trigger_depth`.

mod context;
mod effects;
pub mod shapes;
mod validation;

use std::collections::BTreeSet;

use crate::action::error::OpError;
use crate::action::formula::{FormulaInputs, Magnitude, StatusPayload, evaluate};
use crate::action::op::Op;
use crate::action::skill::{ReactionTarget, Skill};
use crate::action::targeting::{ResolvedTarget, TargetSpec};
use crate::combat::DamageType;
use crate::env::{CombatEnv, PassiveHook};
use crate::state::{CombatState, LogEntry, LogKind, UnitId};
use crate::stats::recompute_all;
use crate::status::{self, FiredTrigger, StatusEvent, StatusApplication, TriggerEvent};

pub use context::OpContext;
pub use validation::{ValidationMode, validate_move, validate_skill_execution};

pub use effects::revert_transform;

use effects::Hit;

// ============================================================================
// Execution results
// ============================================================================

/// One resolved hit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRecord {
    pub source: UnitId,
    pub target: UnitId,
    pub amount: f64,
    pub damage_type: DamageType,
    pub crit: bool,
}

/// A follow-up action queued by a `Trigger` op.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainRequest {
    pub source: UnitId,
    pub skill: String,
    pub target: TargetSpec,
}

/// An op that failed without aborting its list.
#[derive(Clone, Debug, PartialEq)]
pub struct OpFailure {
    pub op: &'static str,
    pub error: OpError,
}

/// Everything one interpreter run produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkillExecution {
    pub source: UnitId,
    pub skill: Option<String>,
    pub primary: Option<UnitId>,
    /// Target set after the last shape op.
    pub targets: Vec<UnitId>,
    pub damage: Vec<DamageRecord>,
    pub kills: Vec<UnitId>,
    pub crits: u32,
    pub healing: f64,
    pub chain_requests: Vec<ChainRequest>,
    /// Units whose state changed and need a recompute.
    pub affected: BTreeSet<UnitId>,
    pub failures: Vec<OpFailure>,
    pub initiative_delay: f64,
}

impl SkillExecution {
    pub fn damage_dealt_by(&self, source: UnitId) -> f64 {
        self.damage
            .iter()
            .filter(|d| d.source == source)
            .map(|d| d.amount)
            .sum()
    }

    pub fn total_damage(&self) -> f64 {
        self.damage.iter().map(|d| d.amount).sum()
    }

    /// Distinct units that took a hit, in first-hit order.
    pub fn hit_units(&self) -> Vec<UnitId> {
        let mut seen = Vec::new();
        for record in &self.damage {
            if !seen.contains(&record.target) {
                seen.push(record.target);
            }
        }
        seen
    }
}

/// Resolves where a reaction is aimed, or `None` when nothing fits.
pub fn resolve_reaction_target(
    state: &CombatState,
    source: UnitId,
    primary: Option<UnitId>,
    target: ReactionTarget,
) -> Option<TargetSpec> {
    match target {
        ReactionTarget::PrimaryTarget => primary
            .filter(|id| state.unit(*id).is_some_and(|u| u.is_alive()))
            .map(TargetSpec::Unit),
        ReactionTarget::SelfCast => Some(TargetSpec::SelfCast),
        ReactionTarget::NearestEnemy => {
            let user = state.unit(source)?;
            shapes::nearest_enemy(&state.units, user).map(TargetSpec::Unit)
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Executes ops on behalf of one acting unit.
pub struct OpRunner<'s, 'e> {
    pub(crate) state: &'s mut CombatState,
    env: CombatEnv<'e>,
    out: SkillExecution,
}

impl<'s, 'e> OpRunner<'s, 'e> {
    pub fn new(state: &'s mut CombatState, env: CombatEnv<'e>, source: UnitId) -> Self {
        Self {
            state,
            env,
            out: SkillExecution {
                source,
                ..SkillExecution::default()
            },
        }
    }

    pub fn execution(&self) -> &SkillExecution {
        &self.out
    }

    pub fn finish(self) -> SkillExecution {
        self.out
    }

    /// Runs a validated skill: logs it, pays for it, runs its ops, starts
    /// its cooldown. Reactions are free and leave cooldowns alone.
    pub fn execute_skill(&mut self, skill: &Skill, target: ResolvedTarget, mode: ValidationMode) {
        let source = self.out.source;
        let mut entry = LogEntry::new(LogKind::SkillUse, format!("{source} uses {}", skill.id))
            .source(source)
            .skill(Some(&skill.id));
        if let Some(primary) = target.primary {
            entry = entry.target(primary);
        }
        self.state.record(entry);
        tracing::debug!(
            target: "combat::action",
            unit = %source,
            skill = %skill.id,
            ?mode,
            "executing skill"
        );

        if mode == ValidationMode::Normal
            && let Some(user) = self.state.unit_mut(source)
        {
            user.runtime.action_points = user.runtime.action_points.saturating_sub(skill.cost);
        }

        self.out.skill = Some(skill.id.clone());
        self.out.primary = target.primary;
        self.out.affected.insert(source);

        let mut ctx = OpContext::for_skill(source, skill, target);
        self.run_ops(&skill.ops, &mut ctx);

        if mode == ValidationMode::Normal
            && skill.cooldown > 0
            && let Some(user) = self.state.unit_mut(source)
        {
            user.runtime.cooldowns.insert(skill.id.clone(), skill.cooldown);
        }

        self.out.targets = ctx.targets;
        self.out.initiative_delay = skill.initiative_delay;
    }

    /// Runs the module passives of `source` registered for `hook`.
    pub fn run_passives(&mut self, source: UnitId, hook: PassiveHook) {
        let Some(unit) = self.state.unit(source) else {
            return;
        };
        let position = unit.position;
        let modules = self.env.modules();
        let lists: Vec<&'e [Op]> = unit
            .modules
            .iter()
            .filter_map(|id| modules.get(id))
            .flat_map(|module| module.passives_for(hook))
            .map(|passive| passive.ops.as_slice())
            .collect();

        for ops in lists {
            tracing::trace!(target: "combat::op", unit = %source, %hook, "module passive");
            let mut ctx = OpContext::for_units(source, vec![source], 0).with_position(Some(position));
            self.run_ops(ops, &mut ctx);
        }
    }

    /// Runs `ops` in order. Failures are logged and skipped.
    pub fn run_ops(&mut self, ops: &[Op], ctx: &mut OpContext) {
        for op in ops {
            if let Err(error) = self.run_op(op, ctx) {
                self.op_failed(op.name(), ctx, error);
            }
        }
    }

    fn op_failed(&mut self, op: &'static str, ctx: &OpContext, error: OpError) {
        tracing::warn!(target: "combat::op", op, unit = %ctx.source, %error, "op failed");
        self.state.record(
            LogEntry::new(LogKind::OpFailed, format!("{op}: {error}"))
                .source(ctx.source)
                .skill(ctx.skill.as_deref()),
        );
        self.out.failures.push(OpFailure { op, error });
    }

    fn run_op(&mut self, op: &Op, ctx: &mut OpContext) -> Result<(), OpError> {
        match op {
            Op::Move => self.op_move(ctx),
            Op::Dash { distance } => self.op_dash(ctx, *distance),
            Op::Teleport => self.op_teleport(ctx),
            Op::Leap {
                power,
                damage_type,
                radius,
            } => self.op_leap(ctx, Hit::new(power, *damage_type), *radius),
            Op::Damage {
                power,
                damage_type,
                modifiers,
                force_crit,
                raw,
                target_self,
            } => {
                let hit = Hit {
                    power,
                    damage_type: *damage_type,
                    modifiers,
                    force_crit: *force_crit,
                    raw: *raw,
                };
                self.op_damage(ctx, hit, *target_self)
            }
            Op::Aoe { radius, filter } => self.op_aoe(ctx, *radius, *filter),
            Op::Line { length, width } => self.op_line(ctx, *length, *width),
            Op::Cone { length, angle } => self.op_cone(ctx, *length, *angle),
            Op::Chain { max_targets, jump } => self.op_chain(ctx, *max_targets, *jump),
            Op::ApplyStatus {
                status,
                duration,
                value,
                stacks,
                target_self,
                chance,
            } => self.op_apply_status(ctx, status, *duration, value, *stacks, *target_self, *chance),
            Op::Cleanse {
                category,
                status,
                count,
                target_self,
            } => self.op_cleanse(ctx, *category, status.as_deref(), *count, *target_self),
            Op::Transfer {
                category,
                count,
                direction,
            } => self.op_transfer(ctx, *category, *count, *direction),
            Op::Convert {
                from,
                into,
                duration,
                count,
            } => self.op_convert(ctx, *from, into, *duration, *count),
            Op::Heal {
                amount,
                target_self,
            } => self.op_heal(ctx, amount, *target_self),
            Op::Shield {
                amount,
                pool,
                target_self,
            } => self.op_shield(ctx, amount, *pool, *target_self),
            Op::Revive { hp_ratio } => self.op_revive(ctx, *hp_ratio),
            Op::Push { distance } => self.op_push(ctx, *distance),
            Op::Pull { distance } => self.op_pull(ctx, *distance),
            Op::Swap => self.op_swap(ctx),
            Op::Summon {
                template,
                level,
                duration,
            } => self.op_summon(ctx, template, *level, *duration),
            Op::Transform { template, duration } => self.op_transform(ctx, template, *duration),
            Op::Trigger { skill, target } => self.op_trigger(ctx, skill, *target),
            Op::Delayed { turns, ops } => self.op_delayed(ctx, *turns, ops),
            Op::Conditional {
                condition,
                then,
                otherwise,
            } => self.op_conditional(ctx, condition, then, otherwise),
        }
    }

    // ------------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------------

    /// Evaluates `magnitude` with the op user and an optional target.
    fn magnitude(&self, ctx: &OpContext, magnitude: &Magnitude, target: Option<UnitId>) -> f64 {
        let Some(source) = self.state.find(ctx.source) else {
            return 0.0;
        };
        let inputs = FormulaInputs {
            source,
            target: target.and_then(|id| self.state.find(id)),
            status: ctx.status.as_ref(),
            damage_dealt: ctx.damage_dealt,
        };
        evaluate(magnitude, &inputs)
    }

    fn is_alive(&self, id: UnitId) -> bool {
        self.state.unit(id).is_some_and(|u| u.is_alive())
    }

    pub(crate) fn mark(&mut self, id: UnitId) {
        self.out.affected.insert(id);
    }

    /// Recomputes every unit so auras and fresh modifiers are visible.
    pub fn refresh(&mut self) {
        recompute_all(&mut self.state.units, self.env.statuses(), self.env.modules());
    }

    pub(crate) fn apply_status_to(&mut self, target: UnitId, app: StatusApplication, depth: u32) {
        let statuses = self.env.statuses();
        let Some(unit) = self.state.unit_mut(target) else {
            return;
        };
        let events = status::apply(unit, statuses, app);
        self.mark(target);
        self.run_status_events(events, depth, None);
    }

    /// Fires `event` on every status of `unit`.
    pub fn fire(&mut self, unit: UnitId, event: TriggerEvent, depth: u32, attacker: Option<UnitId>) {
        let Some(holder) = self.state.unit(unit) else {
            return;
        };
        let events = status::fire(holder, self.env.statuses(), event);
        if !events.is_empty() {
            self.run_status_events(events, depth, attacker);
        }
    }

    /// Logs status events and runs the triggers among them.
    ///
    /// `attacker` is the unit that caused an `OnHit` batch; hit triggers
    /// target it instead of the holder.
    pub fn run_status_events(&mut self, events: Vec<StatusEvent>, depth: u32, attacker: Option<UnitId>) {
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                StatusEvent::Applied { holder, instance } => {
                    self.mark(holder);
                    self.state.record(
                        LogEntry::new(
                            LogKind::StatusApply,
                            format!("{holder} gains {}", instance.status_id),
                        )
                        .source(instance.source)
                        .target(holder)
                        .value(f64::from(instance.stacks))
                        .status(instance.status_id),
                    );
                }
                StatusEvent::Merged {
                    holder,
                    status_id,
                    stacks,
                    duration,
                } => {
                    self.mark(holder);
                    self.state.record(
                        LogEntry::new(
                            LogKind::StatusApply,
                            format!("{holder} refreshes {status_id} ({duration} turns)"),
                        )
                        .target(holder)
                        .value(f64::from(stacks))
                        .status(status_id),
                    );
                }
                StatusEvent::Removed {
                    holder,
                    instance,
                    reason,
                } => {
                    self.mark(holder);
                    self.state.record(
                        LogEntry::new(
                            LogKind::StatusRemove,
                            format!("{holder} loses {} ({reason})", instance.status_id),
                        )
                        .target(holder)
                        .status(instance.status_id),
                    );
                }
                StatusEvent::Triggered(fired) => {
                    self.refresh();
                    self.run_trigger(fired, depth, attacker);
                }
            }
        }
        self.refresh();
    }

    fn run_trigger(&mut self, fired: FiredTrigger, depth: u32, attacker: Option<UnitId>) {
        let max = self.env.config.max_trigger_depth;
        if depth >= max {
            let error = OpError::TriggerDepthExceeded { depth };
            tracing::warn!(
                target: "combat::status",
                unit = %fired.holder,
                status = %fired.status_id,
                depth,
                "status trigger nesting limit reached"
            );
            self.state.record(
                LogEntry::new(LogKind::OpFailed, error.to_string())
                    .target(fired.holder)
                    .status(fired.status_id),
            );
            self.out.failures.push(OpFailure {
                op: "trigger",
                error,
            });
            return;
        }

        let Some(ops) = self
            .env
            .statuses()
            .get(&fired.status_id)
            .and_then(|def| def.trigger(fired.event))
        else {
            return;
        };
        let Some(position) = self.state.unit(fired.holder).map(|u| u.position) else {
            return;
        };

        let (source, targets) = match (fired.event, attacker) {
            (TriggerEvent::OnHit, Some(attacker)) => (fired.holder, vec![attacker]),
            _ => {
                let source = if self.state.unit(fired.source).is_some() {
                    fired.source
                } else {
                    fired.holder
                };
                (source, vec![fired.holder])
            }
        };

        if fired.event == TriggerEvent::OnTick {
            self.state.record(
                LogEntry::new(
                    LogKind::StatusTick,
                    format!("{} ticks on {}", fired.status_id, fired.holder),
                )
                .source(source)
                .target(fired.holder)
                .value(f64::from(fired.stacks))
                .status(fired.status_id.clone()),
            );
        }
        tracing::debug!(
            target: "combat::status",
            unit = %fired.holder,
            status = %fired.status_id,
            event = %fired.event,
            depth,
            "status trigger"
        );

        let payload = StatusPayload {
            status_id: fired.status_id,
            value: fired.value,
            stacks: fired.stacks,
        };
        let mut ctx = OpContext::for_units(source, targets, depth + 1)
            .with_status(payload)
            .with_position(Some(position));
        self.run_ops(ops, &mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::targeting::TargetSpec;
    use crate::config::CombatConfig;
    use crate::state::{PERMANENT, Position, Side};
    use crate::status::StatusDefinition;
    use crate::testing::{TestWorld, sample_skills};

    fn duel() -> TestWorld {
        let mut world = TestWorld::new(6, 6);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(1, 0));
        world
    }

    #[test]
    fn execute_skill_pays_and_starts_cooldown() {
        let mut world = duel();
        let skills = sample_skills();
        let skill = skills.get("strike").unwrap().clone().with_cooldown(2);
        let (state, env) = world.split();
        let resolved = validate_skill_execution(
            state,
            &env,
            UnitId(1),
            &skill,
            TargetSpec::Unit(UnitId(2)),
            ValidationMode::Normal,
        )
        .unwrap();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        runner.execute_skill(&skill, resolved, ValidationMode::Normal);
        let out = runner.finish();

        let user = world.state.unit(UnitId(1)).unwrap();
        assert_eq!(user.runtime.action_points, 0);
        assert_eq!(user.cooldown("strike"), Some(2));
        assert_eq!(out.skill.as_deref(), Some("strike"));
        assert_eq!(out.hit_units(), vec![UnitId(2)]);
        assert_eq!(out.damage_dealt_by(UnitId(1)), 10.0);
        assert_eq!(world.state.log.events()[0].kind, LogKind::SkillUse);
    }

    #[test]
    fn reactions_are_free() {
        let mut world = duel();
        let skills = sample_skills();
        let skill = skills.get("strike").unwrap().clone().with_cooldown(2);
        let (state, env) = world.split();
        let resolved = ResolvedTarget {
            primary: Some(UnitId(2)),
            position: Position::new(1, 0),
        };
        let mut runner = OpRunner::new(state, env, UnitId(1));
        runner.execute_skill(&skill, resolved, ValidationMode::Reaction);
        let user = world.state.unit(UnitId(1)).unwrap();
        assert_eq!(user.runtime.action_points, CombatConfig::DEFAULT_ACTION_POINTS);
        assert_eq!(user.cooldown("strike"), None);
    }

    #[test]
    fn burn_tick_damages_the_holder() {
        let mut world = duel();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        runner.apply_status_to(
            UnitId(2),
            StatusApplication::new("burn", 3, UnitId(1)).value(4.0).stacks(3),
            0,
        );
        let events = status::tick(runner.state.unit_mut(UnitId(2)).unwrap(), env.statuses());
        runner.run_status_events(events, 0, None);
        let out = runner.finish();

        assert_eq!(out.damage[0].source, UnitId(1));
        assert_eq!(out.damage[0].amount, 12.0);
        assert_eq!(world.state.unit(UnitId(2)).unwrap().stats.hp, 88.0);
        assert!(world.state.log.events().iter().any(|e| e.kind == LogKind::StatusTick));
    }

    #[test]
    fn hit_triggers_target_the_attacker() {
        let mut world = duel();
        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        runner.apply_status_to(UnitId(2), StatusApplication::new("thorns", PERMANENT, UnitId(2)), 0);
        runner.fire(UnitId(2), TriggerEvent::OnHit, 0, Some(UnitId(1)));
        let out = runner.finish();

        assert_eq!(out.damage.len(), 1);
        assert_eq!(out.damage[0].source, UnitId(2));
        assert_eq!(out.damage[0].target, UnitId(1));
    }

    #[test]
    fn self_feeding_triggers_stop_at_the_depth_limit() {
        let mut world = duel();
        // re-applies itself on removal, forever
        let echo = StatusDefinition::new("echo", status::StatusCategory::Buff).with_trigger(
            TriggerEvent::OnApply,
            vec![Op::Cleanse {
                category: None,
                status: Some("echo".into()),
                count: None,
                target_self: true,
            }],
        );
        let echo = echo.with_trigger(TriggerEvent::OnRemove, vec![Op::apply_status("echo", 2)]);
        world.registries.statuses.insert(echo);
        world.config.max_trigger_depth = 4;

        let (state, env) = world.split();
        let mut runner = OpRunner::new(state, env, UnitId(1));
        let mut ctx = OpContext::for_units(UnitId(1), vec![UnitId(1)], 0);
        runner.run_ops(&[Op::apply_status("echo", 2)], &mut ctx);
        let out = runner.finish();

        assert!(out.failures.iter().any(|f| matches!(
            f.error,
            OpError::TriggerDepthExceeded { depth: 4 }
        )));
    }
}
