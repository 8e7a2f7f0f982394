//! Op execution context.
//!
//! One [`OpContext`] is shared by every op of a list, so shape ops can widen
//! the target set for the ops that follow and `PreviousDamage` can read what
//! earlier ops dealt.

use crate::action::formula::StatusPayload;
use crate::action::skill::Skill;
use crate::action::targeting::{ResolvedTarget, TargetFilter};
use crate::state::{Position, UnitId};

#[derive(Clone, Debug, PartialEq)]
pub struct OpContext {
    /// The unit performing the ops.
    pub source: UnitId,
    /// Skill being executed, if any (triggers and passives have none).
    pub skill: Option<String>,
    /// Unit named by the request.
    pub primary: Option<UnitId>,
    /// Tile named by the request.
    pub position: Option<Position>,
    /// Current target set.
    pub targets: Vec<UnitId>,
    /// Filter shape ops fall back to.
    pub filter: TargetFilter,
    /// Status whose trigger is running these ops.
    pub status: Option<StatusPayload>,
    /// Damage dealt so far by this list.
    pub damage_dealt: f64,
    /// Status-trigger nesting level.
    pub depth: u32,
}

impl OpContext {
    pub fn for_skill(source: UnitId, skill: &Skill, target: ResolvedTarget) -> Self {
        Self {
            source,
            skill: Some(skill.id.clone()),
            primary: target.primary,
            position: Some(target.position),
            targets: target.primary.into_iter().collect(),
            filter: skill.targeting.filter,
            status: None,
            damage_dealt: 0.0,
            depth: 0,
        }
    }

    /// Ops run by `source` against `targets`, outside of any skill.
    pub fn for_units(source: UnitId, targets: Vec<UnitId>, depth: u32) -> Self {
        Self {
            source,
            skill: None,
            primary: targets.first().copied(),
            position: None,
            targets,
            filter: TargetFilter::Any,
            status: None,
            damage_dealt: 0.0,
            depth,
        }
    }

    pub fn with_status(mut self, payload: StatusPayload) -> Self {
        self.status = Some(payload);
        self
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn with_skill(mut self, skill: Option<String>) -> Self {
        self.skill = skill;
        self
    }

    /// The units an op acts on: the user alone, or the current target set.
    pub fn target_set(&self, target_self: bool) -> Vec<UnitId> {
        if target_self {
            vec![self.source]
        } else {
            self.targets.clone()
        }
    }
}
