//! Combatant state.

use std::collections::BTreeMap;

use crate::action::Op;
use crate::env::UnitTemplate;
use crate::stats::{Resistances, StatBlock};

use super::common::{Position, Side, UnitId};
use super::status::{DisableFlags, StatusInstance};

/// A combatant on the board.
///
/// `base` is the level-scaled template and only changes while a transform is
/// active. `stats` and `current_resistances` are derived by
/// [`crate::stats::recompute`] and must not be edited by hand, except for the
/// HP/shield/barrier pools.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    pub side: Side,
    pub type_tag: String,
    /// Template id the unit was created from.
    pub template: String,
    pub level: u32,
    pub base: StatBlock,
    pub stats: StatBlock,
    pub resistances: Resistances,
    pub current_resistances: Resistances,
    pub position: Position,
    pub statuses: Vec<StatusInstance>,
    pub skills: Vec<String>,
    pub modules: Vec<String>,
    pub runtime: UnitRuntime,
}

impl Unit {
    pub fn from_template(
        id: UnitId,
        template: &UnitTemplate,
        side: Side,
        level: u32,
        position: Position,
        level_growth: f64,
    ) -> Self {
        let base = template.base.scaled_for_level(level, level_growth);
        let resistances: Resistances = template.resistances.iter().map(|(k, v)| (*k, *v)).collect();
        Self {
            id,
            side,
            type_tag: template.type_tag.clone(),
            template: template.id.clone(),
            level: level.max(1),
            stats: base.clone(),
            base,
            current_resistances: resistances.clone(),
            resistances,
            position,
            statuses: Vec::new(),
            skills: template.skills.clone(),
            modules: template.modules.clone(),
            runtime: UnitRuntime::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.stats.hp > 0.0
    }

    /// The side this unit currently fights for; charm flips it.
    pub fn effective_side(&self) -> Side {
        if self.runtime.disabled.contains(DisableFlags::CHARMED) {
            self.side.opposing()
        } else {
            self.side
        }
    }

    /// Whether `other` is an ally from this unit's point of view.
    pub fn is_ally_of(&self, other: &Unit) -> bool {
        self.effective_side() == other.side
    }

    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.effective_side().is_hostile_to(other.side)
    }

    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.runtime.disabled.is_incapacitated()
    }

    pub fn knows_skill(&self, skill_id: &str) -> bool {
        self.skills.iter().any(|s| s == skill_id)
    }

    pub fn has_status(&self, status_id: &str) -> bool {
        self.statuses.iter().any(|s| s.status_id == status_id)
    }

    pub fn status(&self, status_id: &str) -> Option<&StatusInstance> {
        self.statuses.iter().find(|s| s.status_id == status_id)
    }

    pub fn status_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.statuses.iter().map(|s| s.status_id.as_str())
    }

    pub fn hp_ratio(&self) -> f64 {
        self.stats.hp_ratio()
    }

    pub fn cooldown(&self, skill_id: &str) -> Option<u32> {
        self.runtime.cooldowns.get(skill_id).copied()
    }
}

/// Per-turn bookkeeping carried by each unit.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitRuntime {
    /// Countdown to the unit's next turn; the unit is ready at `<= 0`.
    pub initiative: f64,
    /// Remaining cooldown per skill id. A ready skill has no entry.
    pub cooldowns: BTreeMap<String, u32>,
    pub action_points: u32,
    pub disabled: DisableFlags,
    pub combo: u32,
    pub turn_acted: bool,
    pub turn_moved: bool,
    pub delayed: Vec<DelayedEffect>,
    pub summon: Option<SummonState>,
    pub transform: Option<TransformState>,
    pub next_status_instance: u32,
}

impl UnitRuntime {
    pub fn allocate_status_instance(&mut self) -> u32 {
        let id = self.next_status_instance;
        self.next_status_instance += 1;
        id
    }
}

/// Ops scheduled by a `Delayed` op, fired at the owner's turn start.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelayedEffect {
    pub turns_left: u32,
    pub skill: Option<String>,
    pub targets: Vec<UnitId>,
    pub position: Option<Position>,
    pub ops: Vec<Op>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonState {
    pub owner: UnitId,
    /// Owner-independent lifetime, decremented at the summon's turn end.
    pub turns_left: Option<u32>,
}

/// What a transformed unit reverts to.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformState {
    pub into: String,
    pub turns_left: u32,
    pub original_type_tag: String,
    pub original_base: StatBlock,
    pub original_resistances: Resistances,
    pub original_skills: Vec<String>,
}
