//! Conditions for `Conditional` ops.

use crate::state::Unit;

/// Predicate over the op user and the skill's primary target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// Target HP ratio strictly below the threshold.
    TargetHpBelow(f64),
    TargetHpAbove(f64),
    SourceHpBelow(f64),
    SourceHpAbove(f64),
    TargetHasStatus(String),
    SourceHasStatus(String),
    TargetIsEnemy,
    /// The user's combo counter is at least this value.
    ComboAtLeast(u32),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Target-side checks are false when there is no target.
    pub fn evaluate(&self, source: &Unit, target: Option<&Unit>) -> bool {
        match self {
            Condition::TargetHpBelow(ratio) => target.is_some_and(|t| t.hp_ratio() < *ratio),
            Condition::TargetHpAbove(ratio) => target.is_some_and(|t| t.hp_ratio() > *ratio),
            Condition::SourceHpBelow(ratio) => source.hp_ratio() < *ratio,
            Condition::SourceHpAbove(ratio) => source.hp_ratio() > *ratio,
            Condition::TargetHasStatus(id) => target.is_some_and(|t| t.has_status(id)),
            Condition::SourceHasStatus(id) => source.has_status(id),
            Condition::TargetIsEnemy => target.is_some_and(|t| source.is_enemy_of(t)),
            Condition::ComboAtLeast(n) => source.runtime.combo >= *n,
            Condition::All(all) => all.iter().all(|c| c.evaluate(source, target)),
            Condition::Any(any) => any.iter().any(|c| c.evaluate(source, target)),
            Condition::Not(inner) => !inner.evaluate(source, target),
        }
    }
}
