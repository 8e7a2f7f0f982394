//! Situational damage multipliers attached to damage ops.

use crate::state::{DisableFlags, Unit};
use crate::status::ids;

/// Defender or geometry condition a [`DamageModifier`] checks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageCondition {
    Stunned,
    Frozen,
    Burning,
    Poisoned,
    /// Defender HP ratio below the threshold (default 0.3).
    LowHp,
    /// Defender HP ratio above the threshold (default 0.7).
    HighHp,
    /// Distance at most the threshold (default 1 tile).
    CloseRange,
    /// Distance at least the threshold (default 4 tiles).
    LongRange,
}

impl DamageCondition {
    pub const fn default_threshold(self) -> f64 {
        match self {
            DamageCondition::LowHp => 0.3,
            DamageCondition::HighHp => 0.7,
            DamageCondition::CloseRange => 1.0,
            DamageCondition::LongRange => 4.0,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageModifier {
    pub condition: DamageCondition,
    pub multiplier: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub threshold: Option<f64>,
}

impl DamageModifier {
    pub const fn new(condition: DamageCondition, multiplier: f64) -> Self {
        Self {
            condition,
            multiplier,
            threshold: None,
        }
    }

    pub fn matches(&self, _attacker: &Unit, defender: &Unit, distance: u32) -> bool {
        let threshold = self
            .threshold
            .unwrap_or_else(|| self.condition.default_threshold());
        let distance = f64::from(distance);
        match self.condition {
            DamageCondition::Stunned => defender.runtime.disabled.contains(DisableFlags::STUNNED),
            DamageCondition::Frozen => defender.runtime.disabled.contains(DisableFlags::FROZEN),
            DamageCondition::Burning => defender.has_status(ids::BURN),
            DamageCondition::Poisoned => defender.has_status(ids::POISON),
            DamageCondition::LowHp => defender.hp_ratio() < threshold,
            DamageCondition::HighHp => defender.hp_ratio() > threshold,
            DamageCondition::CloseRange => distance <= threshold,
            DamageCondition::LongRange => distance >= threshold,
        }
    }
}

/// Product of the multipliers of every matching modifier.
pub fn conditional_multiplier(
    modifiers: &[DamageModifier],
    attacker: &Unit,
    defender: &Unit,
    distance: u32,
) -> f64 {
    modifiers
        .iter()
        .filter(|m| m.matches(attacker, defender, distance))
        .map(|m| m.multiplier)
        .product()
}
