//! The op language.
//!
//! Skills, status triggers, module passives and delayed effects are all lists
//! of [`Op`]s run by the same interpreter. Ops read the shared `OpContext`:
//! the user, the nominal target tile, and the current target set. Shape ops
//! (`Aoe`, `Line`, `Cone`, `Chain`) replace the target set; the ops after them
//! act on every unit in it.

use crate::combat::{DamageModifier, DamageType};
use crate::status::StatusCategory;

use super::condition::Condition;
use super::formula::Magnitude;
use super::skill::ReactionTarget;
use super::targeting::TargetFilter;

/// Which pool a `Shield` op fills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ShieldPool {
    /// Absorbs physical damage.
    #[default]
    Shield,
    /// Absorbs magical and elemental damage.
    Barrier,
}

/// Direction of a `Transfer` op, relative to the op user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransferDirection {
    /// User's statuses move onto each target.
    #[default]
    ToTarget,
    /// Each target's statuses move onto the user.
    FromTarget,
}

/// One declarative step of an effect list.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Op {
    // ---- movement -------------------------------------------------------
    /// Walk the user to the target tile; the movement oracle decides reach.
    Move,

    /// Slide the user toward the target tile, stopping at the first obstacle.
    Dash { distance: u32 },

    /// Place the user on the target tile, ignoring the path.
    Teleport,

    /// Teleport, then damage enemies around the landing tile.
    Leap {
        power: Magnitude,
        #[cfg_attr(feature = "serde", serde(default = "physical"))]
        damage_type: DamageType,
        #[cfg_attr(feature = "serde", serde(default))]
        radius: u32,
    },

    // ---- damage and shapes ----------------------------------------------
    /// Damage every target through the damage pipeline.
    Damage {
        power: Magnitude,
        #[cfg_attr(feature = "serde", serde(default = "physical"))]
        damage_type: DamageType,
        #[cfg_attr(feature = "serde", serde(default))]
        modifiers: Vec<DamageModifier>,
        #[cfg_attr(feature = "serde", serde(default))]
        force_crit: bool,
        /// Skip evasion, crit and the pipeline; only absorption applies.
        #[cfg_attr(feature = "serde", serde(default))]
        raw: bool,
        #[cfg_attr(feature = "serde", serde(default))]
        target_self: bool,
    },

    /// Targets become the living units within `radius` of the target tile.
    Aoe {
        radius: u32,
        /// Defaults to the skill's own filter.
        #[cfg_attr(feature = "serde", serde(default))]
        filter: Option<TargetFilter>,
    },

    /// Targets become the units on a straight line from the user.
    Line {
        length: u32,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        width: u32,
    },

    /// Targets become the units in a cone opening from the user.
    Cone {
        length: u32,
        #[cfg_attr(feature = "serde", serde(default = "right_angle"))]
        angle: u32,
    },

    /// Targets become a chain hopping from the primary target.
    Chain {
        max_targets: u32,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        jump: u32,
    },

    // ---- statuses -------------------------------------------------------
    ApplyStatus {
        status: String,
        duration: i32,
        #[cfg_attr(feature = "serde", serde(default))]
        value: Magnitude,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        stacks: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        target_self: bool,
        /// Application chance in `[0, 1]`; `None` always applies.
        #[cfg_attr(feature = "serde", serde(default))]
        chance: Option<f64>,
    },

    Cleanse {
        #[cfg_attr(feature = "serde", serde(default))]
        category: Option<StatusCategory>,
        #[cfg_attr(feature = "serde", serde(default))]
        status: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        count: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default))]
        target_self: bool,
    },

    Transfer {
        category: StatusCategory,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        count: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        direction: TransferDirection,
    },

    /// Replace statuses of one category with another status.
    Convert {
        from: StatusCategory,
        into: String,
        duration: i32,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        count: u32,
    },

    // ---- support --------------------------------------------------------
    Heal {
        amount: Magnitude,
        #[cfg_attr(feature = "serde", serde(default))]
        target_self: bool,
    },

    Shield {
        amount: Magnitude,
        #[cfg_attr(feature = "serde", serde(default))]
        pool: ShieldPool,
        #[cfg_attr(feature = "serde", serde(default))]
        target_self: bool,
    },

    /// Bring back the most recently fallen ally on the target tile.
    Revive { hp_ratio: f64 },

    // ---- displacement ---------------------------------------------------
    /// Knock targets away from the user.
    Push { distance: u32 },

    /// Drag targets toward the user.
    Pull { distance: u32 },

    /// Exchange tiles with the primary target.
    Swap,

    // ---- summon and transform -------------------------------------------
    Summon {
        template: String,
        /// Defaults to the user's level.
        #[cfg_attr(feature = "serde", serde(default))]
        level: Option<u32>,
        /// Turns the summon lasts; `None` lasts until killed.
        #[cfg_attr(feature = "serde", serde(default))]
        duration: Option<u32>,
    },

    /// Replace the targets' template-derived stats and skills for a while.
    Transform { template: String, duration: u32 },

    // ---- meta -----------------------------------------------------------
    /// Queue a follow-up action as a chain reaction.
    Trigger {
        skill: String,
        #[cfg_attr(feature = "serde", serde(default))]
        target: ReactionTarget,
    },

    /// Run `ops` at the user's turn start, `turns` turns from now.
    Delayed { turns: u32, ops: Vec<Op> },

    Conditional {
        condition: Condition,
        then: Vec<Op>,
        #[cfg_attr(feature = "serde", serde(default))]
        otherwise: Vec<Op>,
    },
}

#[cfg(feature = "serde")]
fn physical() -> DamageType {
    DamageType::Physical
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn right_angle() -> u32 {
    90
}

impl Op {
    /// Snake-case op name used in logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Pipeline damage against every target.
    pub fn damage(power: Magnitude, damage_type: DamageType) -> Self {
        Op::Damage {
            power,
            damage_type,
            modifiers: Vec::new(),
            force_crit: false,
            raw: false,
            target_self: false,
        }
    }

    /// Damage that bypasses the pipeline (status ticks).
    pub fn raw_damage(power: Magnitude, damage_type: DamageType) -> Self {
        Op::Damage {
            power,
            damage_type,
            modifiers: Vec::new(),
            force_crit: false,
            raw: true,
            target_self: false,
        }
    }

    pub fn apply_status(status: impl Into<String>, duration: i32) -> Self {
        Op::ApplyStatus {
            status: status.into(),
            duration,
            value: Magnitude::default(),
            stacks: 1,
            target_self: false,
            chance: None,
        }
    }

    /// Status carrying a payload, e.g. burn damage per stack.
    pub fn apply_status_with(status: impl Into<String>, duration: i32, value: Magnitude) -> Self {
        Op::ApplyStatus {
            status: status.into(),
            duration,
            value,
            stacks: 1,
            target_self: false,
            chance: None,
        }
    }

    pub fn heal(amount: Magnitude) -> Self {
        Op::Heal {
            amount,
            target_self: false,
        }
    }

    pub fn self_heal(amount: Magnitude) -> Self {
        Op::Heal {
            amount,
            target_self: true,
        }
    }
}
