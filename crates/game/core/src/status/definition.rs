//! Registry-owned status definitions.

use std::collections::BTreeMap;

use crate::action::{Op, TargetFilter};
use crate::combat::DamageType;
use crate::state::DisableFlags;
use crate::stats::StatModifier;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum StatusCategory {
    #[default]
    Buff,
    Debuff,
    Control,
    Aura,
}

/// What re-applying an active status does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackingPolicy {
    /// Duration becomes `max(old, new)`.
    #[default]
    None,
    /// Stacks add up to `max`; duration becomes `max(old, new)`.
    Stacks { max: u32 },
    /// Durations add.
    ExtendDuration,
}

impl StackingPolicy {
    pub fn max_stacks(self) -> u32 {
        match self {
            StackingPolicy::Stacks { max } => max.max(1),
            _ => 1,
        }
    }
}

/// Event keys of a status trigger table.
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
pub enum TriggerEvent {
    OnApply,
    OnTick,
    OnRemove,
    /// The holder was struck by an offensive skill; ops target the attacker.
    OnHit,
    OnMove,
    OnTurnStart,
    OnTurnEnd,
}

/// Radius-based influence an aura status projects on nearby units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraSpec {
    pub radius: u32,
    /// Relative to the holder: `Ally` includes the holder itself.
    pub filter: TargetFilter,
}

/// Static description of a status, keyed by `id` in the status registry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatusDefinition {
    pub id: String,
    pub category: StatusCategory,
    pub stacking: StackingPolicy,
    /// Statuses that cannot coexist with this one, checked in both directions.
    pub exclusive_with: Vec<String>,
    pub aura: Option<AuraSpec>,
    /// Never counts down and survives cleanse.
    pub persistent: bool,
    pub stat_modifiers: Vec<StatModifier>,
    pub resistance_modifiers: BTreeMap<DamageType, f64>,
    /// Multiplies effective speed once per instance.
    pub initiative_multiplier: f64,
    pub disables: DisableFlags,
    pub triggers: BTreeMap<TriggerEvent, Vec<Op>>,
    /// Skill the holder answers offensive hits with.
    pub counter_skill: Option<String>,
    /// Chance for the holder's actions to be cancelled.
    pub action_fail_chance: f64,
    /// Removed as soon as the holder takes damage.
    pub break_on_damage: bool,
}

impl Default for StatusDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            category: StatusCategory::default(),
            stacking: StackingPolicy::default(),
            exclusive_with: Vec::new(),
            aura: None,
            persistent: false,
            stat_modifiers: Vec::new(),
            resistance_modifiers: BTreeMap::new(),
            initiative_multiplier: 1.0,
            disables: DisableFlags::empty(),
            triggers: BTreeMap::new(),
            counter_skill: None,
            action_fail_chance: 0.0,
            break_on_damage: false,
        }
    }
}

impl StatusDefinition {
    pub fn new(id: impl Into<String>, category: StatusCategory) -> Self {
        Self {
            id: id.into(),
            category,
            ..Self::default()
        }
    }

    pub fn excludes(&self, other: &StatusDefinition) -> bool {
        self.exclusive_with.iter().any(|id| *id == other.id)
            || other.exclusive_with.iter().any(|id| *id == self.id)
    }

    pub fn trigger(&self, event: TriggerEvent) -> Option<&[Op]> {
        self.triggers
            .get(&event)
            .map(Vec::as_slice)
            .filter(|ops| !ops.is_empty())
    }

    pub fn is_aura(&self) -> bool {
        self.aura.is_some()
    }

    pub fn with_stacking(mut self, stacking: StackingPolicy) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn with_exclusive(mut self, other: impl Into<String>) -> Self {
        self.exclusive_with.push(other.into());
        self
    }

    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.stat_modifiers.push(modifier);
        self
    }

    pub fn with_resistance(mut self, damage_type: DamageType, delta: f64) -> Self {
        self.resistance_modifiers.insert(damage_type, delta);
        self
    }

    pub fn with_initiative_multiplier(mut self, multiplier: f64) -> Self {
        self.initiative_multiplier = multiplier;
        self
    }

    pub fn with_disables(mut self, flags: DisableFlags) -> Self {
        self.disables = flags;
        self
    }

    pub fn with_trigger(mut self, event: TriggerEvent, ops: Vec<Op>) -> Self {
        self.triggers.insert(event, ops);
        self
    }

    pub fn with_aura(mut self, radius: u32, filter: TargetFilter) -> Self {
        self.aura = Some(AuraSpec { radius, filter });
        self.persistent = true;
        self
    }

    pub fn with_counter(mut self, skill: impl Into<String>) -> Self {
        self.counter_skill = Some(skill.into());
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn breaks_on_damage(mut self) -> Self {
        self.break_on_damage = true;
        self
    }

    pub fn with_fail_chance(mut self, chance: f64) -> Self {
        self.action_fail_chance = chance;
        self
    }
}
