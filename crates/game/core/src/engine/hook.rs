//! Chain-reaction rules evaluated after an action resolves.
//!
//! Each rule inspects the finished [`SkillExecution`] and proposes follow-up
//! actions. The orchestrator runs the proposals one level deeper, so every
//! rule is bounded by the same chain-depth cap.
//!
//! Rules are executed in priority order (lower priority values execute first).

use std::sync::Arc;

use crate::action::{ChainRequest, ChainTrigger, Skill, SkillExecution, TargetSpec, resolve_reaction_target};
use crate::env::StatusRegistry;
use crate::state::{CombatState, UnitId};

/// What a rule may look at when deciding on follow-ups.
pub struct ChainContext<'a> {
    pub source: UnitId,
    pub skill: &'a Skill,
    pub execution: &'a SkillExecution,
    pub state: &'a CombatState,
    pub statuses: &'a StatusRegistry,
}

/// A source of chain reactions.
pub trait ChainRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower values execute first. Default priority is 0.
    fn priority(&self) -> i32 {
        0
    }

    fn should_trigger(&self, ctx: &ChainContext<'_>) -> bool;

    fn follow_ups(&self, ctx: &ChainContext<'_>) -> Vec<ChainRequest>;
}

/// Skill-declared reactions: on kill, on crit, or at a combo threshold.
#[derive(Debug)]
pub struct SkillReactionRule;

impl SkillReactionRule {
    fn fires(trigger: ChainTrigger, ctx: &ChainContext<'_>) -> bool {
        match trigger {
            ChainTrigger::OnKill => !ctx.execution.kills.is_empty(),
            ChainTrigger::OnCrit => ctx.execution.crits > 0,
            ChainTrigger::OnComboAtLeast(threshold) => ctx
                .state
                .unit(ctx.source)
                .is_some_and(|u| u.runtime.combo >= threshold),
        }
    }
}

impl ChainRule for SkillReactionRule {
    fn name(&self) -> &'static str {
        "skill_reaction"
    }

    fn should_trigger(&self, ctx: &ChainContext<'_>) -> bool {
        !ctx.skill.reactions.is_empty()
    }

    fn follow_ups(&self, ctx: &ChainContext<'_>) -> Vec<ChainRequest> {
        ctx.skill
            .reactions
            .iter()
            .filter(|reaction| Self::fires(reaction.trigger, ctx))
            .filter_map(|reaction| {
                let target =
                    resolve_reaction_target(ctx.state, ctx.source, ctx.execution.primary, reaction.target)?;
                Some(ChainRequest {
                    source: ctx.source,
                    skill: reaction.skill.clone(),
                    target,
                })
            })
            .collect()
    }
}

/// Units holding a counter status answer offensive hits.
///
/// Each surviving, able unit counters once per action, aimed back at the
/// attacker while it still stands.
#[derive(Debug)]
pub struct CounterRule;

impl ChainRule for CounterRule {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn should_trigger(&self, ctx: &ChainContext<'_>) -> bool {
        ctx.skill.is_offensive()
            && !ctx.execution.damage.is_empty()
            && ctx.state.unit(ctx.source).is_some_and(|u| u.is_alive())
    }

    fn follow_ups(&self, ctx: &ChainContext<'_>) -> Vec<ChainRequest> {
        ctx.execution
            .hit_units()
            .into_iter()
            .filter(|id| *id != ctx.source)
            .filter_map(|id| ctx.state.unit(id))
            .filter(|unit| unit.is_alive() && unit.can_act())
            .filter_map(|unit| {
                let skill = unit
                    .statuses
                    .iter()
                    .filter_map(|s| ctx.statuses.get(&s.status_id))
                    .find_map(|def| def.counter_skill.clone())?;
                Some(ChainRequest {
                    source: unit.id,
                    skill,
                    target: TargetSpec::Unit(ctx.source),
                })
            })
            .collect()
    }
}

/// Follow-ups queued explicitly by `Trigger` ops.
#[derive(Debug)]
pub struct TriggerOpRule;

impl ChainRule for TriggerOpRule {
    fn name(&self) -> &'static str {
        "trigger_op"
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn should_trigger(&self, ctx: &ChainContext<'_>) -> bool {
        !ctx.execution.chain_requests.is_empty()
    }

    fn follow_ups(&self, ctx: &ChainContext<'_>) -> Vec<ChainRequest> {
        ctx.execution.chain_requests.clone()
    }
}

/// Returns the default chain rules, sorted by priority.
/// Rules are returned in an Arc for efficient sharing without cloning.
pub fn default_rules() -> Arc<[Arc<dyn ChainRule>]> {
    let mut rules: Vec<Arc<dyn ChainRule>> = vec![
        Arc::new(TriggerOpRule),
        Arc::new(SkillReactionRule),
        Arc::new(CounterRule),
    ];

    rules.sort_by_key(|r| r.priority());

    rules.into()
}

/// Collects the follow-ups of every triggered rule, in rule order.
pub fn collect_follow_ups(rules: &[Arc<dyn ChainRule>], ctx: &ChainContext<'_>) -> Vec<ChainRequest> {
    let mut requests = Vec::new();
    for rule in rules.iter().filter(|r| r.should_trigger(ctx)) {
        let proposed = rule.follow_ups(ctx);
        if !proposed.is_empty() {
            tracing::debug!(
                target: "combat::chain",
                rule = rule.name(),
                unit = %ctx.source,
                count = proposed.len(),
                "chain rule fired"
            );
        }
        requests.extend(proposed);
    }
    requests
}
