//! Seven-phase action orchestration.
//!
//! [`run_action`] wraps the interpreter with everything that happens around a
//! skill: cancellation rolls, passives, on-hit triggers, lifesteal, combo,
//! chain reactions, recompute and initiative. Chain reactions re-enter
//! `run_action` one level deeper, so the whole cascade of one request runs
//! on a single call stack.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::action::{
    ActionError, ChainRequest, OpFailure, OpRunner, SkillExecution, TargetSpec, ValidationMode, validate_move,
    validate_skill_execution,
};
use crate::env::{CombatEnv, PassiveHook, RollContext};
use crate::state::{CombatLogEvent, CombatState, LogEntry, LogKind, Position, UnitId};
use crate::stats::recompute_all;
use crate::status::TriggerEvent;

use super::hook::{ChainContext, ChainRule, collect_follow_ups};
use super::turns::reset_initiative;

// ============================================================================
// Requests and Reports
// ============================================================================

/// Identifies which stage of the orchestrator is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionPhase {
    PreAction,
    Execute,
    OnHit,
    PostAction,
    Chain,
    Recompute,
    Initiative,
}

impl ActionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPhase::PreAction => "pre_action",
            ActionPhase::Execute => "execute",
            ActionPhase::OnHit => "on_hit",
            ActionPhase::PostAction => "post_action",
            ActionPhase::Chain => "chain",
            ActionPhase::Recompute => "recompute",
            ActionPhase::Initiative => "initiative",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionRequest {
    Skill { skill_id: String, target: TargetSpec },
    Move { destination: Position },
}

/// One orchestrator invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionPipelineContext {
    pub source: UnitId,
    pub request: ActionRequest,
    /// 0 for a chosen action, +1 per chain reaction level.
    pub chain_depth: u32,
}

impl ActionPipelineContext {
    pub fn skill(source: UnitId, skill_id: impl Into<String>, target: TargetSpec) -> Self {
        Self {
            source,
            request: ActionRequest::Skill {
                skill_id: skill_id.into(),
                target,
            },
            chain_depth: 0,
        }
    }

    pub fn movement(source: UnitId, destination: Position) -> Self {
        Self {
            source,
            request: ActionRequest::Move { destination },
            chain_depth: 0,
        }
    }

    fn chained(request: &ChainRequest, depth: u32) -> Self {
        Self {
            source: request.source,
            request: ActionRequest::Skill {
                skill_id: request.skill.clone(),
                target: request.target,
            },
            chain_depth: depth,
        }
    }
}

/// A chain reaction and how it went.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainOutcome {
    pub request: ChainRequest,
    pub depth: u32,
    pub result: Result<ActionReport, ActionError>,
}

/// Everything a successful invocation did, including nested chains.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionReport {
    pub source: UnitId,
    pub skill: Option<String>,
    pub depth: u32,
    /// Paralysis stopped the action after validation.
    pub cancelled: bool,
    /// Log events recorded by this invocation and its chains.
    pub events: Vec<CombatLogEvent>,
    pub affected: BTreeSet<UnitId>,
    pub targets: Vec<UnitId>,
    pub damage: f64,
    pub kills: Vec<UnitId>,
    pub crits: u32,
    pub healing: f64,
    pub lifesteal: f64,
    pub failures: Vec<OpFailure>,
    pub chains: Vec<ChainOutcome>,
}

impl ActionReport {
    /// Chain outcomes at every depth, depth-first.
    pub fn all_chains(&self) -> Vec<&ChainOutcome> {
        let mut out = Vec::new();
        for chain in &self.chains {
            out.push(chain);
            if let Ok(report) = &chain.result {
                out.extend(report.all_chains());
            }
        }
        out
    }

    fn absorb(&mut self, execution: SkillExecution) {
        self.affected.extend(execution.affected.iter().copied());
        self.targets = execution.targets.clone();
        self.damage += execution.total_damage();
        self.kills.extend(execution.kills.iter().copied());
        self.crits += execution.crits;
        self.healing += execution.healing;
        self.failures.extend(execution.failures);
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs one action request and, recursively, every chain reaction it causes.
///
/// Rejections return `Err` before any mutation. Depth beyond
/// `max_chain_depth` is rejected the same way and executes nothing.
pub fn run_action(
    state: &mut CombatState,
    env: &CombatEnv<'_>,
    rules: &[Arc<dyn ChainRule>],
    ctx: ActionPipelineContext,
) -> Result<ActionReport, ActionError> {
    let max = env.config.max_chain_depth;
    if ctx.chain_depth > max {
        return Err(ActionError::ChainDepthExceeded {
            depth: ctx.chain_depth,
            max,
        });
    }

    let report = match &ctx.request {
        ActionRequest::Skill { skill_id, target } => {
            run_skill(state, env, rules, ctx.source, skill_id, *target, ctx.chain_depth)?
        }
        ActionRequest::Move { destination } => run_move(state, env, ctx.source, *destination)?,
    };

    if ctx.chain_depth == 0 {
        for id in state.sweep_dead() {
            tracing::debug!(target: "combat::pipeline", unit = %id, "swept after action");
        }
    }
    Ok(report)
}

fn run_skill(
    state: &mut CombatState,
    env: &CombatEnv<'_>,
    rules: &[Arc<dyn ChainRule>],
    source: UnitId,
    skill_id: &str,
    target: TargetSpec,
    depth: u32,
) -> Result<ActionReport, ActionError> {
    let skill = env
        .skills()
        .get(skill_id)
        .ok_or_else(|| ActionError::SkillNotKnown(skill_id.to_owned()))?;
    let mode = if depth == 0 {
        ValidationMode::Normal
    } else {
        ValidationMode::Reaction
    };
    let resolved = validate_skill_execution(state, env, source, skill, target, mode)?;
    let start_seq = state.log.next_seq();

    let mut report = ActionReport {
        source,
        skill: Some(skill.id.clone()),
        depth,
        ..ActionReport::default()
    };

    // --- Phase 1: pre-action ---------------------------------------------
    trace_phase(ActionPhase::PreAction, source, depth);
    let fail_chance = state
        .unit(source)
        .map(|unit| {
            unit.statuses
                .iter()
                .filter_map(|s| env.statuses().get(&s.status_id))
                .map(|def| def.action_fail_chance)
                .fold(0.0, f64::max)
        })
        .unwrap_or(0.0);
    if fail_chance > 0.0 && state.roll(env.rng, source, RollContext::Paralysis) < fail_chance {
        tracing::debug!(target: "combat::pipeline", unit = %source, skill = %skill.id, "action cancelled");
        state.record(
            LogEntry::new(LogKind::ActionCancelled, format!("{source} is paralysed and fails to act"))
                .source(source)
                .skill(Some(&skill.id)),
        );
        if let Some(user) = state.unit_mut(source)
            && mode == ValidationMode::Normal
        {
            user.runtime.action_points = user.runtime.action_points.saturating_sub(skill.cost);
        }
        report.cancelled = true;
        report.affected.insert(source);
        if depth == 0 && !skill.quickcast {
            update_initiative(state, env, source, skill.initiative_delay);
        }
        report.events = state.log.since(start_seq).to_vec();
        return Ok(report);
    }

    let mut runner = OpRunner::new(state, *env, source);
    runner.run_passives(source, PassiveHook::PreAction);

    // --- Phase 2: execute --------------------------------------------------
    trace_phase(ActionPhase::Execute, source, depth);
    runner.execute_skill(skill, resolved, mode);

    // --- Phase 3: on-hit ---------------------------------------------------
    if skill.is_offensive() {
        trace_phase(ActionPhase::OnHit, source, depth);
        for hit in runner.execution().hit_units() {
            if hit != source {
                runner.fire(hit, TriggerEvent::OnHit, 0, Some(source));
            }
        }
    }

    // --- Phase 4: post-action ----------------------------------------------
    trace_phase(ActionPhase::PostAction, source, depth);
    let dealt = runner.execution().damage_dealt_by(source);
    let ratio = runner.state.unit(source).map_or(0.0, |u| u.stats.lifesteal);
    let drain = (dealt * ratio).floor();
    if drain > 0.0 {
        report.lifesteal = runner.restore_hp(source, source, drain, Some(&skill.id));
    }
    update_combo(runner.state, source, skill.is_offensive(), &skill.id);
    runner.run_passives(source, PassiveHook::PostAction);

    let execution = runner.finish();

    // --- Phase 5: chain reactions ------------------------------------------
    trace_phase(ActionPhase::Chain, source, depth);
    let requests = {
        let chain_ctx = ChainContext {
            source,
            skill,
            execution: &execution,
            state,
            statuses: env.statuses(),
        };
        collect_follow_ups(rules, &chain_ctx)
    };
    report.absorb(execution);

    for request in requests {
        if !state.unit(request.source).is_some_and(|u| u.is_alive()) {
            continue;
        }
        let next_depth = depth + 1;
        state.record(
            LogEntry::new(
                LogKind::ChainTriggered,
                format!("{} chains into {} (depth {next_depth})", request.source, request.skill),
            )
            .source(request.source)
            .value(f64::from(next_depth))
            .skill(Some(&request.skill)),
        );
        let result = run_action(state, env, rules, ActionPipelineContext::chained(&request, next_depth));
        if let Err(error) = &result {
            tracing::debug!(
                target: "combat::chain",
                unit = %request.source,
                skill = %request.skill,
                depth = next_depth,
                %error,
                "chain rejected"
            );
            state.record(
                LogEntry::new(LogKind::ChainRejected, format!("{}: {error}", request.skill))
                    .source(request.source)
                    .value(f64::from(next_depth))
                    .skill(Some(&request.skill)),
            );
        }
        if let Ok(nested) = &result {
            report.affected.extend(nested.affected.iter().copied());
        }
        report.chains.push(ChainOutcome {
            request,
            depth: next_depth,
            result,
        });
    }

    // --- Phase 6: recompute ------------------------------------------------
    trace_phase(ActionPhase::Recompute, source, depth);
    recompute_all(&mut state.units, env.statuses(), env.modules());

    // --- Phase 7: initiative -----------------------------------------------
    if depth == 0 && !skill.quickcast {
        trace_phase(ActionPhase::Initiative, source, depth);
        update_initiative(state, env, source, skill.initiative_delay);
    }

    report.events = state.log.since(start_seq).to_vec();
    Ok(report)
}

fn run_move(
    state: &mut CombatState,
    env: &CombatEnv<'_>,
    source: UnitId,
    destination: Position,
) -> Result<ActionReport, ActionError> {
    validate_move(state, env, source, destination)?;
    let start_seq = state.log.next_seq();

    let mut runner = OpRunner::new(state, *env, source);
    if let Err(error) = runner.relocate(source, destination, 0) {
        // validation already checked the tile, so this is a content bug
        tracing::warn!(target: "combat::pipeline", unit = %source, %destination, %error, "validated move failed");
    }
    let execution = runner.finish();

    if let Some(user) = state.unit_mut(source) {
        user.runtime.turn_moved = true;
    }
    recompute_all(&mut state.units, env.statuses(), env.modules());

    let mut report = ActionReport {
        source,
        ..ActionReport::default()
    };
    report.absorb(execution);
    report.affected.insert(source);
    report.events = state.log.since(start_seq).to_vec();
    Ok(report)
}

fn trace_phase(phase: ActionPhase, unit: UnitId, depth: u32) {
    tracing::trace!(target: "combat::pipeline", phase = phase.as_str(), %unit, depth, "phase");
}

/// Offensive skills extend the combo, anything else breaks it.
fn update_combo(state: &mut CombatState, source: UnitId, offensive: bool, skill: &str) {
    let Some(user) = state.unit_mut(source) else {
        return;
    };
    if !offensive {
        user.runtime.combo = 0;
        return;
    }
    user.runtime.combo += 1;
    let combo = user.runtime.combo;
    if combo >= 2 {
        state.record(
            LogEntry::new(LogKind::Combo, format!("{source} combo x{combo}"))
                .source(source)
                .value(f64::from(combo))
                .skill(Some(skill)),
        );
    }
}

/// The first action of a turn resets the countdown; later ones only add
/// their delay.
fn update_initiative(state: &mut CombatState, env: &CombatEnv<'_>, source: UnitId, delay: f64) {
    let Some(user) = state.unit_mut(source) else {
        return;
    };
    if user.runtime.turn_acted {
        user.runtime.initiative += delay;
    } else {
        reset_initiative(user, env.config.base_threshold, delay);
        user.runtime.turn_acted = true;
    }
}
