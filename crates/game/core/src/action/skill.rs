//! Skill definitions.
//!
//! A skill is static content: a cost, a cooldown, a targeting rule and an
//! ordered list of [`Op`]s. Skills never hold per-unit state; cooldowns and
//! action points live on the unit.

use super::op::Op;
use super::targeting::TargetingInfo;

/// Descriptive tags the engine reacts to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkillTag {
    /// Blocked by silence; drives combo, on-hit triggers and counters.
    Offensive,
    /// Enables distance scaling in the damage pipeline.
    Ranged,
    Melee,
    Support,
    /// Blocked by root.
    Movement,
}

/// Outcome that fires a skill reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainTrigger {
    OnKill,
    OnCrit,
    /// The user's combo counter reached the threshold after this action.
    OnComboAtLeast(u32),
}

/// Where a follow-up action is aimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionTarget {
    /// The original action's primary target, while it is alive.
    #[default]
    PrimaryTarget,
    SelfCast,
    /// The closest living enemy of the reacting unit.
    NearestEnemy,
}

/// Follow-up skill queued after an action with a matching outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainReaction {
    pub trigger: ChainTrigger,
    pub skill: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: ReactionTarget,
}

/// Static description of a skill, keyed by `id` in the skill registry.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Skill {
    pub id: String,
    /// Action points spent on use.
    pub cost: u32,
    /// Owner turn-ends before the skill is ready again.
    pub cooldown: u32,
    pub targeting: TargetingInfo,
    pub ops: Vec<Op>,
    /// Extra initiative added when the skill ends the user's action.
    pub initiative_delay: f64,
    /// Does not consume the user's turn initiative.
    pub quickcast: bool,
    pub tags: Vec<SkillTag>,
    pub reactions: Vec<ChainReaction>,
}

impl Skill {
    pub fn new(id: impl Into<String>, targeting: TargetingInfo) -> Self {
        Self {
            id: id.into(),
            cost: 1,
            targeting,
            ..Self::default()
        }
    }

    pub fn has_tag(&self, tag: SkillTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_offensive(&self) -> bool {
        self.has_tag(SkillTag::Offensive)
    }

    pub fn with_op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    pub fn with_tag(mut self, tag: SkillTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.initiative_delay = delay;
        self
    }

    pub fn quickcast(mut self) -> Self {
        self.quickcast = true;
        self
    }

    pub fn with_reaction(mut self, trigger: ChainTrigger, skill: impl Into<String>, target: ReactionTarget) -> Self {
        self.reactions.push(ChainReaction {
            trigger,
            skill: skill.into(),
            target,
        });
        self
    }
}
