//! Damage resolution.
//!
//! Pure functions: [`compute_damage`] turns attacker, defender and skill data
//! into a floored amount, [`absorb`] routes that amount through shield or
//! barrier before HP. Evasion and randomness are decided by the caller and
//! passed in, so nothing here draws from an RNG.

pub mod absorb;
pub mod damage;
pub mod modifier;

pub use absorb::{Absorption, absorb};
pub use damage::{
    CritRoll, DamageBreakdown, DamageInput, DamageType, apply_crit, base_damage, combo_multiplier,
    compute_damage, distance_multiplier, effective_defense, elemental_amplification, mitigate,
    resistance_multiplier,
};
pub use modifier::{DamageCondition, DamageModifier, conditional_multiplier};
