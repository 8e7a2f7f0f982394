//! Unit templates and equippable modules.
//!
//! Templates are the data-driven blueprint for every unit a session creates,
//! whether at session start or through a `Summon` op. Modules are equipment
//! pieces carrying stat deltas and optional passive op lists.

use std::collections::BTreeMap;

use crate::action::Op;
use crate::combat::DamageType;
use crate::stats::{StatBlock, StatModifier};

/// Blueprint for a unit, keyed by `id` in the template registry.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UnitTemplate {
    pub id: String,
    pub type_tag: String,
    /// Level-1 stats; scaled by level at creation.
    pub base: StatBlock,
    pub resistances: BTreeMap<DamageType, f64>,
    pub skills: Vec<String>,
    pub modules: Vec<String>,
    /// Statuses applied permanently on creation (auras, innate traits).
    pub statuses: Vec<String>,
}

impl UnitTemplate {
    pub fn builder(id: impl Into<String>) -> UnitTemplateBuilder {
        UnitTemplateBuilder::new(id)
    }
}

/// Fluent constructor for [`UnitTemplate`].
#[derive(Clone, Debug)]
pub struct UnitTemplateBuilder {
    template: UnitTemplate,
}

impl UnitTemplateBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            template: UnitTemplate {
                type_tag: id.clone(),
                id,
                ..UnitTemplate::default()
            },
        }
    }

    pub fn type_tag(mut self, type_tag: impl Into<String>) -> Self {
        self.template.type_tag = type_tag.into();
        self
    }

    pub fn stats(mut self, base: StatBlock) -> Self {
        self.template.base = base;
        self
    }

    pub fn resistance(mut self, damage_type: DamageType, value: f64) -> Self {
        self.template.resistances.insert(damage_type, value);
        self
    }

    pub fn skill(mut self, skill: impl Into<String>) -> Self {
        self.template.skills.push(skill.into());
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.template.modules.push(module.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.template.statuses.push(status.into());
        self
    }

    pub fn build(self) -> UnitTemplate {
        self.template
    }
}

/// When a module passive fires.
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PassiveHook {
    /// Before a skill executes; runs against the acting unit.
    PreAction,
    /// After a skill executed; runs against the acting unit.
    PostAction,
    TurnStart,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModulePassive {
    pub hook: PassiveHook,
    pub ops: Vec<Op>,
}

/// Equippable stat delta with optional passives.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModuleDefinition {
    pub id: String,
    pub stat_modifiers: Vec<StatModifier>,
    pub passives: Vec<ModulePassive>,
}

impl ModuleDefinition {
    pub fn passives_for(&self, hook: PassiveHook) -> impl Iterator<Item = &ModulePassive> + '_ {
        self.passives.iter().filter(move |p| p.hook == hook)
    }
}
