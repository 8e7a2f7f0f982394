//! Damage calculation.
//!
//! # Pipeline
//!
//! ```text
//! 1. base          = is_flat ? power : atk * power
//! 2. eff_defense   = max(0, raw_defense * (1 - penetration))
//! 3. mitigation    = base - min(base * eff/(eff+100), base * cap)     (skipped for True)
//! 4. amplification = * (1 + |res|) when res < -0.2
//! 5. distance      = ranged skills only: 0.8 / 1.2 / decay to 0.6
//! 6. combo         = * (1 + combo * step)                              (skills only)
//! 7. conditional   = * product of matching DamageModifiers
//! 8. crit          = * crit_dmg on a successful or forced crit
//! 9. resistance    = elemental types only: * (1 - res)
//! 10. floor, >= 0
//! ```
//!
//! Steps 4 and 9 both react to a negative resistance, so elemental weaknesses
//! compound. Each step is a public function so it can be tested in isolation.

use crate::action::{Skill, SkillTag};
use crate::state::Unit;

use super::modifier::{DamageModifier, conditional_multiplier};

/// Kind of damage dealt; selects defense, absorption pool and resistance.
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
    strum::EnumIter,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageType {
    Physical,
    Magical,
    /// Skips mitigation, resistance and absorption.
    True,
    Fire,
    Ice,
    Lightning,
    Poison,
    Holy,
    Dark,
}

impl DamageType {
    pub const fn is_elemental(self) -> bool {
        !matches!(
            self,
            DamageType::Physical | DamageType::Magical | DamageType::True
        )
    }
}

/// How the crit step decides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CritRoll {
    Never,
    Forced,
    /// A uniform draw in `[0, 1)`; crits when below the attacker's chance.
    Roll(f64),
}

/// Everything one damage calculation reads.
#[derive(Clone, Copy, Debug)]
pub struct DamageInput<'a> {
    pub attacker: &'a Unit,
    pub defender: &'a Unit,
    pub power: f64,
    pub damage_type: DamageType,
    pub is_flat: bool,
    pub skill: Option<&'a Skill>,
    pub distance: u32,
    pub modifiers: &'a [DamageModifier],
    pub crit: CritRoll,
    pub combo_step: f64,
    pub mitigation_cap: f64,
}

/// Intermediate values of one calculation, in pipeline order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageBreakdown {
    pub base: f64,
    pub effective_defense: f64,
    pub mitigated: f64,
    pub amplification: f64,
    pub distance: f64,
    pub combo: f64,
    pub conditional: f64,
    pub is_crit: bool,
    pub resistance: f64,
    /// Floored, non-negative result.
    pub amount: f64,
}

pub fn base_damage(atk: f64, power: f64, is_flat: bool) -> f64 {
    if is_flat { power } else { atk * power }
}

pub fn effective_defense(raw_defense: f64, penetration: f64) -> f64 {
    (raw_defense * (1.0 - penetration)).max(0.0)
}

/// Returns `(reduced, mitigated)`; the mitigated share never exceeds `cap`.
pub fn mitigate(base: f64, effective_defense: f64, cap: f64) -> (f64, f64) {
    let reduction = effective_defense / (effective_defense + 100.0);
    let mitigated = (base * reduction).min(base * cap);
    (base - mitigated, mitigated)
}

pub fn elemental_amplification(resistance: f64) -> f64 {
    if resistance < -0.2 {
        1.0 + resistance.abs()
    } else {
        1.0
    }
}

/// Ranged falloff: 0.8 inside 3 tiles, 1.2 for 3..=5, then -0.1 per tile to 0.6.
pub fn distance_multiplier(skill: Option<&Skill>, distance: u32) -> f64 {
    let ranged = skill.is_some_and(|s| s.has_tag(SkillTag::Ranged));
    if !ranged {
        return 1.0;
    }
    match distance {
        0..=2 => 0.8,
        3..=5 => 1.2,
        far => (1.2 - 0.1 * f64::from(far - 5)).max(0.6),
    }
}

pub fn combo_multiplier(combo: u32, step: f64) -> f64 {
    1.0 + f64::from(combo) * step
}

/// Returns the multiplier and whether the hit was critical.
pub fn apply_crit(crit: CritRoll, chance: f64, crit_dmg: f64) -> (f64, bool) {
    let is_crit = match crit {
        CritRoll::Never => false,
        CritRoll::Forced => true,
        CritRoll::Roll(roll) => roll < chance,
    };
    if is_crit { (crit_dmg, true) } else { (1.0, false) }
}

pub fn resistance_multiplier(damage_type: DamageType, resistance: f64) -> f64 {
    if damage_type.is_elemental() {
        1.0 - resistance
    } else {
        1.0
    }
}

pub fn compute_damage(input: &DamageInput<'_>) -> DamageBreakdown {
    let attacker = &input.attacker.stats;
    let defender = &input.defender.stats;
    let resistance = input.defender.current_resistances.get(input.damage_type);

    let base = base_damage(attacker.atk, input.power, input.is_flat);

    let raw_defense = match input.damage_type {
        DamageType::Physical => defender.def,
        _ => defender.res,
    };
    let eff_defense = effective_defense(raw_defense, attacker.penetration);

    let (mut amount, mitigated) = if input.damage_type == DamageType::True {
        (base, 0.0)
    } else {
        mitigate(base, eff_defense, input.mitigation_cap)
    };

    let amplification = elemental_amplification(resistance);
    amount *= amplification;

    let distance = distance_multiplier(input.skill, input.distance);
    amount *= distance;

    let combo = if input.skill.is_some() {
        combo_multiplier(input.attacker.runtime.combo, input.combo_step)
    } else {
        1.0
    };
    amount *= combo;

    let conditional =
        conditional_multiplier(input.modifiers, input.attacker, input.defender, input.distance);
    amount *= conditional;

    let (crit_multiplier, is_crit) = apply_crit(input.crit, attacker.crit, attacker.crit_dmg);
    amount *= crit_multiplier;

    let resistance = resistance_multiplier(input.damage_type, resistance);
    amount *= resistance;

    DamageBreakdown {
        base,
        effective_defense: eff_defense,
        mitigated,
        amplification,
        distance,
        combo,
        conditional,
        is_crit,
        resistance,
        amount: amount.floor().max(0.0),
    }
}
