//! Action validation.
//!
//! Validation is the only gate in front of execution: nothing here mutates
//! state, and no op runs for a request that fails it.
//!
//! ## Skill checks, in order
//!
//! 1. User exists and is alive
//! 2. User is not stunned, frozen or asleep
//! 3. Silence blocks offensive skills
//! 4. Root blocks movement skills
//! 5. Skill is known, off cooldown and affordable (normal mode only)
//! 6. Target is legal: bounds, range, self-targeting, filter

use crate::action::error::ActionError;
use crate::action::skill::{Skill, SkillTag};
use crate::action::targeting::{ResolvedTarget, TargetFilter, TargetSpec};
use crate::env::CombatEnv;
use crate::state::{CombatState, DisableFlags, Position, Unit, UnitId};

/// Which resource checks apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// A chosen action: the skill must be known, ready and affordable.
    #[default]
    Normal,
    /// A chain reaction or counter: free, and ignores cooldowns.
    Reaction,
}

fn living_user(state: &CombatState, source: UnitId) -> Result<&Unit, ActionError> {
    let user = state.unit(source).ok_or(ActionError::ActorNotFound(source))?;
    if !user.is_alive() {
        return Err(ActionError::ActorDead(source));
    }
    if user.runtime.disabled.is_incapacitated() {
        return Err(ActionError::Disabled(source));
    }
    Ok(user)
}

/// Checks whether `source` may use `skill` on `target` right now.
pub fn validate_skill_execution(
    state: &CombatState,
    _env: &CombatEnv<'_>,
    source: UnitId,
    skill: &Skill,
    target: TargetSpec,
    mode: ValidationMode,
) -> Result<ResolvedTarget, ActionError> {
    let user = living_user(state, source)?;
    let disabled = user.runtime.disabled;

    if skill.is_offensive() && disabled.contains(DisableFlags::SILENCED) {
        return Err(ActionError::Silenced(source));
    }
    if skill.has_tag(SkillTag::Movement) && disabled.contains(DisableFlags::ROOTED) {
        return Err(ActionError::Rooted(source));
    }

    if mode == ValidationMode::Normal {
        if !user.knows_skill(&skill.id) {
            return Err(ActionError::SkillNotKnown(skill.id.clone()));
        }
        if let Some(remaining) = user.cooldown(&skill.id) {
            return Err(ActionError::OnCooldown {
                skill: skill.id.clone(),
                remaining,
            });
        }
        if user.runtime.action_points < skill.cost {
            return Err(ActionError::InsufficientResources {
                required: skill.cost,
                available: user.runtime.action_points,
            });
        }
    }

    resolve_target(state, user, skill, target)
}

fn resolve_target(
    state: &CombatState,
    user: &Unit,
    skill: &Skill,
    target: TargetSpec,
) -> Result<ResolvedTarget, ActionError> {
    let targeting = &skill.targeting;
    let own = ResolvedTarget {
        primary: Some(user.id),
        position: user.position,
    };

    if targeting.is_self_only() {
        return Ok(own);
    }

    match target {
        TargetSpec::SelfCast => {
            if targeting.self_targetable {
                Ok(own)
            } else {
                Err(ActionError::NotSelfTargetable)
            }
        }
        TargetSpec::Unit(id) if id == user.id => {
            if targeting.self_targetable {
                Ok(own)
            } else {
                Err(ActionError::NotSelfTargetable)
            }
        }
        TargetSpec::Unit(id) => {
            let unit = state
                .unit(id)
                .filter(|u| u.is_alive())
                .ok_or(ActionError::InvalidTarget)?;
            check_range(user.position, unit.position, targeting.range)?;
            if targeting.filter == TargetFilter::Empty || !targeting.filter.accepts(user, Some(unit)) {
                return Err(ActionError::FilterMismatch);
            }
            Ok(ResolvedTarget {
                primary: Some(id),
                position: unit.position,
            })
        }
        TargetSpec::Position(pos) => {
            if !state.grid.in_bounds(pos) {
                return Err(ActionError::OutOfBounds(pos));
            }
            check_range(user.position, pos, targeting.range)?;
            if pos == user.position {
                return if targeting.self_targetable {
                    Ok(own)
                } else {
                    Err(ActionError::NotSelfTargetable)
                };
            }
            let occupant = state.unit_at(pos).filter(|u| u.is_alive());
            if !targeting.filter.accepts(user, occupant) {
                return Err(match (targeting.filter, occupant) {
                    (TargetFilter::Empty, Some(_)) => ActionError::Occupied(pos),
                    _ => ActionError::FilterMismatch,
                });
            }
            if targeting.filter == TargetFilter::Empty && state.grid.is_obstacle(pos) {
                return Err(ActionError::Blocked(pos));
            }
            Ok(ResolvedTarget {
                primary: occupant.map(|u| u.id),
                position: pos,
            })
        }
    }
}

fn check_range(from: Position, to: Position, range: u32) -> Result<(), ActionError> {
    let distance = from.distance(to);
    if distance > range {
        return Err(ActionError::OutOfRange { distance, range });
    }
    Ok(())
}

/// Checks whether `source` may walk to `destination` this turn.
pub fn validate_move(
    state: &CombatState,
    env: &CombatEnv<'_>,
    source: UnitId,
    destination: Position,
) -> Result<(), ActionError> {
    let user = living_user(state, source)?;
    if user.runtime.disabled.contains(DisableFlags::ROOTED) {
        return Err(ActionError::Rooted(source));
    }
    if user.runtime.turn_moved {
        return Err(ActionError::AlreadyMoved(source));
    }
    state.grid.check_free(destination)?;
    if !env.movement.can_reach(user, &state.grid, destination) {
        return Err(ActionError::Unreachable(destination));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TargetingInfo;
    use crate::state::{PERMANENT, Side};
    use crate::status::{StatusApplication, apply};
    use crate::stats::recompute;
    use crate::testing::{TestWorld, sample_skills};

    fn world() -> TestWorld {
        let mut world = TestWorld::new(8, 8);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(1, 0));
        world.add(UnitId(3), Side::Player, Position::new(0, 1));
        world
    }

    #[test]
    fn valid_strike_resolves_the_enemy() {
        let world = world();
        let skills = sample_skills();
        let strike = skills.get("strike").unwrap();
        let env = world.env();
        let resolved = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            strike,
            TargetSpec::Unit(UnitId(2)),
            ValidationMode::Normal,
        )
        .unwrap();
        assert_eq!(resolved.primary, Some(UnitId(2)));
    }

    #[test]
    fn filter_rejects_allies_for_offensive_skills() {
        let world = world();
        let skills = sample_skills();
        let env = world.env();
        let err = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            skills.get("strike").unwrap(),
            TargetSpec::Unit(UnitId(3)),
            ValidationMode::Normal,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::FilterMismatch);
    }

    #[test]
    fn range_uses_manhattan_distance() {
        let mut world = TestWorld::new(8, 8);
        world.add(UnitId(1), Side::Player, Position::new(0, 0));
        world.add(UnitId(2), Side::Opponent, Position::new(1, 1));
        let skills = sample_skills();
        let env = world.env();
        let err = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            skills.get("strike").unwrap(),
            TargetSpec::Unit(UnitId(2)),
            ValidationMode::Normal,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::OutOfRange { distance: 2, range: 1 });
    }

    #[test]
    fn cooldown_and_action_points_are_checked_in_normal_mode_only() {
        let mut world = world();
        let skills = sample_skills();
        let strike = skills.get("strike").unwrap();
        world
            .state
            .unit_mut(UnitId(1))
            .unwrap()
            .runtime
            .cooldowns
            .insert("strike".into(), 2);
        let env = world.env();
        let err = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            strike,
            TargetSpec::Unit(UnitId(2)),
            ValidationMode::Normal,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ActionError::OnCooldown {
                skill: "strike".into(),
                remaining: 2
            }
        );
        assert!(
            validate_skill_execution(
                &world.state,
                &env,
                UnitId(1),
                strike,
                TargetSpec::Unit(UnitId(2)),
                ValidationMode::Reaction,
            )
            .is_ok()
        );
    }

    #[test]
    fn silence_blocks_offensive_skills_only() {
        let mut world = world();
        let statuses = world.registries.statuses.clone();
        let modules = world.registries.modules.clone();
        {
            let unit = world.state.unit_mut(UnitId(1)).unwrap();
            apply(unit, &statuses, StatusApplication::new("silence", PERMANENT, UnitId(2)));
            recompute(unit, &statuses, &modules, &[]);
        }
        let skills = sample_skills();
        let env = world.env();
        let err = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            skills.get("strike").unwrap(),
            TargetSpec::Unit(UnitId(2)),
            ValidationMode::Normal,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::Silenced(UnitId(1)));

        assert!(
            validate_skill_execution(
                &world.state,
                &env,
                UnitId(1),
                skills.get("mend").unwrap(),
                TargetSpec::Unit(UnitId(3)),
                ValidationMode::Normal,
            )
            .is_ok()
        );
    }

    #[test]
    fn self_target_requires_permission() {
        let world = world();
        let env = world.env();
        let jab = Skill::new("jab", TargetingInfo::single(1).with_filter(TargetFilter::Any));
        let err = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            &jab,
            TargetSpec::SelfCast,
            ValidationMode::Reaction,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::NotSelfTargetable);

        let guard = Skill::new("guard", TargetingInfo::single(1).allow_self());
        assert!(
            validate_skill_execution(
                &world.state,
                &env,
                UnitId(1),
                &guard,
                TargetSpec::SelfCast,
                ValidationMode::Reaction,
            )
            .is_ok()
        );
    }

    #[test]
    fn empty_filter_requires_a_free_tile() {
        let world = world();
        let skills = sample_skills();
        let env = world.env();
        let blink = skills.get("blink").unwrap();
        let err = validate_skill_execution(
            &world.state,
            &env,
            UnitId(1),
            blink,
            TargetSpec::Position(Position::new(1, 0)),
            ValidationMode::Normal,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::Occupied(Position::new(1, 0)));
        assert!(
            validate_skill_execution(
                &world.state,
                &env,
                UnitId(1),
                blink,
                TargetSpec::Position(Position::new(2, 2)),
                ValidationMode::Normal,
            )
            .is_ok()
        );
    }

    #[test]
    fn move_is_limited_by_the_oracle() {
        let world = world();
        let env = world.env();
        assert!(validate_move(&world.state, &env, UnitId(1), Position::new(1, 1)).is_ok());
        assert_eq!(
            validate_move(&world.state, &env, UnitId(1), Position::new(7, 7)),
            Err(ActionError::Unreachable(Position::new(7, 7)))
        );
        assert_eq!(
            validate_move(&world.state, &env, UnitId(1), Position::new(1, 0)),
            Err(ActionError::Occupied(Position::new(1, 0)))
        );
    }
}
