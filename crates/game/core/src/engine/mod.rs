//! Turn scheduling, action orchestration and the session that owns them.
//!
//! [`CombatSession`] is the authoritative owner of a [`CombatState`]. Every
//! mutation goes through [`run_action`] or the turn lifecycle, so the log
//! records everything that changed and a snapshot taken between two calls
//! is always a consistent state.

mod hook;
mod lifecycle;
mod pipeline;
pub(crate) mod roster;
mod turns;

pub use hook::{
    ChainContext, ChainRule, CounterRule, SkillReactionRule, TriggerOpRule, collect_follow_ups, default_rules,
};
pub use lifecycle::{end_turn, expire_controls, skip_turn, start_turn};
pub use pipeline::{
    ActionPhase, ActionPipelineContext, ActionReport, ActionRequest, ChainOutcome, run_action,
};
pub use roster::{UnitSpec, instantiate};
pub use turns::{Ready, effective_speed, initial_initiative, reset_initiative, select_next, turn_order};

use std::sync::Arc;

use crate::action::{ActionError, TargetSpec};
use crate::config::CombatConfig;
use crate::env::{CombatEnv, MovementOracle, PcgRng, RangeMovement, Registries, RngOracle};
use crate::error::{ErrorSeverity, GameError};
use crate::replay::CombatSnapshot;
use crate::state::{CombatLogEvent, CombatState, Grid, GridError, Position, Side, Unit, UnitId};

/// Errors raised while assembling a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unknown unit template {0}")]
    UnknownTemplate(String),

    #[error("cannot place {template}: {source}")]
    Placement {
        template: String,
        #[source]
        source: GridError,
    },
}

impl GameError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::UnknownTemplate(_) => ErrorSeverity::Internal,
            SessionError::Placement { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::UnknownTemplate(_) => "SESSION_UNKNOWN_TEMPLATE",
            SessionError::Placement { .. } => "SESSION_PLACEMENT",
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct CombatSessionBuilder {
    registries: Arc<Registries>,
    grid: Grid,
    seed: u64,
    config: CombatConfig,
    movement: Arc<dyn MovementOracle>,
    rng: Arc<dyn RngOracle>,
    rules: Arc<[Arc<dyn ChainRule>]>,
    units: Vec<UnitSpec>,
}

impl CombatSessionBuilder {
    pub const DEFAULT_GRID_SIZE: u32 = 8;

    pub fn new(registries: Arc<Registries>) -> Self {
        Self {
            registries,
            grid: Grid::new(Self::DEFAULT_GRID_SIZE, Self::DEFAULT_GRID_SIZE),
            seed: 0,
            config: CombatConfig::default(),
            movement: Arc::new(RangeMovement),
            rng: Arc::new(PcgRng),
            rules: default_rules(),
            units: Vec::new(),
        }
    }

    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = grid;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(mut self, config: CombatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn movement(mut self, movement: Arc<dyn MovementOracle>) -> Self {
        self.movement = movement;
        self
    }

    pub fn rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = rng;
        self
    }

    pub fn rules(mut self, rules: Arc<[Arc<dyn ChainRule>]>) -> Self {
        self.rules = rules;
        self
    }

    pub fn unit(mut self, spec: UnitSpec) -> Self {
        self.units.push(spec);
        self
    }

    /// Instantiates every unit in declaration order, so ids follow the
    /// order of [`Self::unit`] calls starting at 1.
    pub fn build(self) -> Result<CombatSession, SessionError> {
        let mut session = CombatSession {
            state: CombatState::new(self.grid, self.seed),
            registries: self.registries,
            config: self.config,
            movement: self.movement,
            rng: self.rng,
            rules: self.rules,
        };

        for spec in &self.units {
            let (state, env, _) = session.split();
            let template = env
                .templates()
                .get(&spec.template)
                .ok_or_else(|| SessionError::UnknownTemplate(spec.template.clone()))?;
            let id = instantiate(state, &env, template, spec.side, spec.level, spec.position).map_err(|source| {
                SessionError::Placement {
                    template: spec.template.clone(),
                    source,
                }
            })?;
            let initiative = initial_initiative(state, env.rng, env.config, id);
            if let Some(unit) = state.unit_mut(id) {
                unit.runtime.initiative = initiative;
            }
        }

        tracing::debug!(
            target: "combat::session",
            units = session.state.units.len(),
            seed = session.state.seed,
            "session ready"
        );
        Ok(session)
    }
}

// ============================================================================
// Session
// ============================================================================

/// One combat from setup to victory.
pub struct CombatSession {
    state: CombatState,
    registries: Arc<Registries>,
    config: CombatConfig,
    movement: Arc<dyn MovementOracle>,
    rng: Arc<dyn RngOracle>,
    rules: Arc<[Arc<dyn ChainRule>]>,
}

impl CombatSession {
    pub fn builder(registries: Arc<Registries>) -> CombatSessionBuilder {
        CombatSessionBuilder::new(registries)
    }

    fn split(&mut self) -> (&mut CombatState, CombatEnv<'_>, &[Arc<dyn ChainRule>]) {
        let env = CombatEnv::new(&self.registries, &self.config, &*self.movement, &*self.rng);
        (&mut self.state, env, &*self.rules)
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    pub fn logs(&self) -> &[CombatLogEvent] {
        self.state.log.events()
    }

    pub fn active_unit(&self) -> Option<UnitId> {
        self.state.active_unit
    }

    /// Ends the active turn, if any, then starts the next one.
    ///
    /// Slots that come due for a stunned, frozen or sleeping unit are lost
    /// along the way. Returns `None` once a side has won or nobody can ever
    /// act again.
    pub fn next_turn(&mut self) -> Option<UnitId> {
        self.end_turn();
        loop {
            if self.winner().is_some() {
                return None;
            }
            let (state, env, _) = self.split();
            let Some(ready) = select_next(&mut state.units, env.statuses(), env.config) else {
                if expire_controls(state, &env) {
                    continue;
                }
                tracing::debug!(target: "combat::session", "no unit can act");
                return None;
            };
            if ready.held {
                skip_turn(state, &env, ready.unit);
                continue;
            }

            start_turn(state, &env, ready.unit);
            if state.unit(ready.unit).is_some_and(Unit::is_alive) {
                tracing::debug!(
                    target: "combat::session",
                    unit = %ready.unit,
                    turn = state.turn,
                    ticks = ready.ticks,
                    "turn started"
                );
                return Some(ready.unit);
            }
            // turn-start damage killed the unit
            state.active_unit = None;
        }
    }

    /// Closes the active turn. No-op between turns.
    pub fn end_turn(&mut self) {
        let Some(unit) = self.state.active_unit else {
            return;
        };
        let (state, env, _) = self.split();
        end_turn(state, &env, unit);
    }

    pub fn perform_action(
        &mut self,
        source: UnitId,
        skill_id: &str,
        target: TargetSpec,
    ) -> Result<ActionReport, ActionError> {
        self.admit(source, Some(skill_id))?;
        let (state, env, rules) = self.split();
        run_action(state, &env, rules, ActionPipelineContext::skill(source, skill_id, target))
    }

    pub fn perform_skill_at_location(
        &mut self,
        source: UnitId,
        skill_id: &str,
        x: i32,
        y: i32,
    ) -> Result<ActionReport, ActionError> {
        self.perform_action(source, skill_id, TargetSpec::Position(Position::new(x, y)))
    }

    pub fn perform_move(&mut self, source: UnitId, x: i32, y: i32) -> Result<ActionReport, ActionError> {
        self.admit(source, None)?;
        let (state, env, rules) = self.split();
        run_action(state, &env, rules, ActionPipelineContext::movement(source, Position::new(x, y)))
    }

    /// Panics on ids that were never part of this combat; rejects acting out
    /// of turn when turn order is enforced.
    fn admit(&self, source: UnitId, skill_id: Option<&str>) -> Result<(), ActionError> {
        if !self.state.is_known(source) {
            panic!("unknown unit {source}");
        }
        if let Some(skill_id) = skill_id
            && !self.registries.skills.contains(skill_id)
        {
            panic!("unknown skill {skill_id}");
        }
        if self.config.enforce_turn_order && self.state.active_unit != Some(source) {
            return Err(ActionError::NotActorsTurn(source));
        }
        Ok(())
    }

    /// Predicted next `n` actors, assuming each acts once with no delay.
    pub fn turn_order(&self, n: usize) -> Vec<UnitId> {
        turn_order(&self.state.units, &self.registries.statuses, &self.config, n)
    }

    /// The only non-neutral side with living units.
    ///
    /// Uses each unit's own side; a charmed unit still counts for its team.
    pub fn winner(&self) -> Option<Side> {
        let mut sides = self
            .state
            .living()
            .map(|u| u.side)
            .filter(|side| *side != Side::Neutral);
        let first = sides.next()?;
        sides.all(|side| side == first).then_some(first)
    }

    /// Deep copy of the current state. The id is the next log sequence
    /// number, so snapshots of one session are ordered.
    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot::capture(self.state.log.next_seq(), &self.state)
    }

    /// Replaces the live state, including the RNG position.
    pub fn restore(&mut self, snapshot: &CombatSnapshot) {
        self.state = snapshot.to_state();
        tracing::debug!(
            target: "combat::session",
            id = snapshot.id,
            turn = snapshot.turn,
            "state restored from snapshot"
        );
    }
}

impl core::fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatSession")
            .field("turn", &self.state.turn)
            .field("active_unit", &self.state.active_unit)
            .field("units", &self.state.units.len())
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::UnitTemplate;
    use crate::state::LogKind;
    use crate::testing::sample_registries;

    fn duel() -> CombatSession {
        CombatSession::builder(Arc::new(sample_registries()))
            .seed(11)
            .unit(UnitSpec::new("soldier", Side::Player, Position::new(0, 0)))
            .unit(UnitSpec::new("soldier", Side::Opponent, Position::new(1, 0)))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_places_units_in_declaration_order() {
        let session = duel();
        assert_eq!(session.state().unit_ids(), vec![UnitId(1), UnitId(2)]);
        assert_eq!(session.state().unit(UnitId(2)).unwrap().side, Side::Opponent);
        assert_eq!(session.state().unit(UnitId(1)).unwrap().runtime.initiative, 100.0);
        assert!(session.active_unit().is_none());
    }

    #[test]
    fn builder_rejects_bad_templates_and_placements() {
        let registries = Arc::new(sample_registries());
        let unknown = CombatSession::builder(registries.clone())
            .unit(UnitSpec::new("dragon", Side::Opponent, Position::new(0, 0)))
            .build();
        assert!(matches!(unknown, Err(SessionError::UnknownTemplate(ref t)) if t == "dragon"));

        let stacked = CombatSession::builder(registries)
            .unit(UnitSpec::new("soldier", Side::Player, Position::new(0, 0)))
            .unit(UnitSpec::new("golem", Side::Opponent, Position::new(0, 0)))
            .build();
        match stacked {
            Err(err @ SessionError::Placement { .. }) => assert_eq!(err.error_code(), "SESSION_PLACEMENT"),
            other => panic!("expected a placement error, got {other:?}"),
        }
    }

    #[test]
    fn turns_alternate_and_out_of_turn_actions_are_rejected() {
        let mut session = duel();
        assert_eq!(session.next_turn(), Some(UnitId(1)));

        let err = session
            .perform_action(UnitId(2), "strike", TargetSpec::Unit(UnitId(1)))
            .unwrap_err();
        assert_eq!(err, ActionError::NotActorsTurn(UnitId(2)));

        let report = session
            .perform_action(UnitId(1), "strike", TargetSpec::Unit(UnitId(2)))
            .unwrap();
        assert_eq!(report.damage, 10.0);
        assert_eq!(session.state().unit(UnitId(2)).unwrap().stats.hp, 90.0);

        assert_eq!(session.turn_order(3), vec![UnitId(2), UnitId(1), UnitId(2)]);
        assert_eq!(session.next_turn(), Some(UnitId(2)));
        assert_eq!(session.state().turn, 2);
        assert!(session.logs().iter().any(|e| e.kind == LogKind::TurnEnd));
    }

    #[test]
    fn victory_stops_the_schedule() {
        let mut session = duel();
        session.next_turn();
        session.state.unit_mut(UnitId(2)).unwrap().stats.hp = 5.0;

        let report = session
            .perform_action(UnitId(1), "strike", TargetSpec::Unit(UnitId(2)))
            .unwrap();
        assert_eq!(report.kills, vec![UnitId(2)]);
        assert_eq!(session.winner(), Some(Side::Player));
        assert_eq!(session.next_turn(), None);
        assert_eq!(session.state().graveyard.len(), 1);
        assert!(session.active_unit().is_none());
    }

    #[test]
    fn moves_and_location_skills_go_through_the_pipeline() {
        let mut registries = sample_registries();
        registries
            .templates
            .insert(UnitTemplate::builder("conjurer").skill("call_wisp").build());
        let mut session = CombatSession::builder(Arc::new(registries))
            .unit(UnitSpec::new("conjurer", Side::Player, Position::new(0, 0)))
            .unit(UnitSpec::new("soldier", Side::Opponent, Position::new(5, 5)))
            .build()
            .unwrap();

        assert_eq!(session.next_turn(), Some(UnitId(1)));
        session.perform_move(UnitId(1), 1, 0).unwrap();
        assert_eq!(session.state().unit(UnitId(1)).unwrap().position, Position::new(1, 0));
        assert_eq!(session.perform_move(UnitId(1), 2, 0).unwrap_err(), ActionError::AlreadyMoved(UnitId(1)));

        session.perform_skill_at_location(UnitId(1), "call_wisp", 1, 2).unwrap();
        assert_eq!(session.state().units.len(), 3);
        assert!(session.logs().iter().any(|e| e.kind == LogKind::Summon));
    }

    #[test]
    fn turn_order_can_be_relaxed() {
        let mut session = CombatSession::builder(Arc::new(sample_registries()))
            .config(CombatConfig::default().with_turn_order(false))
            .unit(UnitSpec::new("soldier", Side::Player, Position::new(0, 0)))
            .unit(UnitSpec::new("soldier", Side::Opponent, Position::new(1, 0)))
            .build()
            .unwrap();
        assert!(
            session
                .perform_action(UnitId(2), "strike", TargetSpec::Unit(UnitId(1)))
                .is_ok()
        );
    }

    #[test]
    #[should_panic(expected = "unknown unit")]
    fn unknown_units_panic() {
        let mut session = duel();
        session.next_turn();
        let _ = session.perform_action(UnitId(42), "strike", TargetSpec::Unit(UnitId(1)));
    }

    #[test]
    #[should_panic(expected = "unknown skill")]
    fn unknown_skills_panic() {
        let mut session = duel();
        session.next_turn();
        let _ = session.perform_action(UnitId(1), "meteor", TargetSpec::Unit(UnitId(2)));
    }

    #[test]
    fn restore_rewinds_state_and_rng() {
        let mut session = duel();
        session.next_turn();
        let checkpoint = session.snapshot();

        session
            .perform_action(UnitId(1), "strike", TargetSpec::Unit(UnitId(2)))
            .unwrap();
        let after_first = session.snapshot();

        session.restore(&checkpoint);
        assert_eq!(session.state().unit(UnitId(2)).unwrap().stats.hp, 100.0);
        assert_eq!(session.state(), &checkpoint.to_state());

        session
            .perform_action(UnitId(1), "strike", TargetSpec::Unit(UnitId(2)))
            .unwrap();
        assert_eq!(session.state(), &after_first.to_state());
    }
}
