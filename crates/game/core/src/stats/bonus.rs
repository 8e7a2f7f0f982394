//! Modifier stacking following a fixed application order.
//!
//! Flat → Increased → More → Less → Clamp
//!
//! Module deltas, status modifiers and aura influences all feed the same
//! stack, so the order in which they were collected never changes a result.

use super::block::StatKind;

/// A single bonus that can be applied to a stat value.
///
/// - **Flat**: additive, applied first (e.g. +5 ATK from a module)
/// - **Increased**: fractional increases, summed then multiplied (0.2 = +20%)
/// - **More**: sequential multipliers (0.5 = ×1.5)
/// - **Less**: sequential reductions (0.5 = ×0.5)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus {
    Flat(f64),
    Increased(f64),
    More(f64),
    Less(f64),
}

impl Bonus {
    /// Multiplies the magnitude by `stacks`, used for stackable statuses.
    ///
    /// `More`/`Less` compound per stack instead of scaling linearly.
    fn stacked(self, stacks: u32) -> impl Iterator<Item = Bonus> {
        let n = stacks.max(1);
        let (single, repeat) = match self {
            Bonus::Flat(v) => (Some(Bonus::Flat(v * n as f64)), 0),
            Bonus::Increased(v) => (Some(Bonus::Increased(v * n as f64)), 0),
            Bonus::More(_) | Bonus::Less(_) => (None, n),
        };
        single
            .into_iter()
            .chain(std::iter::repeat_n(self, repeat as usize))
    }
}

/// A collection of bonuses applied in the documented order.
///
/// ```
/// # use combat_core::stats::{Bonus, BonusStack, StatBounds};
/// let mut stack = BonusStack::new();
/// stack.add(Bonus::Flat(5.0));
/// stack.add(Bonus::Increased(0.2));
/// stack.add(Bonus::Increased(0.15));
/// stack.add(Bonus::More(0.5));
/// stack.add(Bonus::Less(0.1));
///
/// // (10 + 5) × 1.35 × 1.5 × 0.9
/// let result = stack.apply(10.0, StatBounds::UNCLAMPED);
/// assert!((result - 27.3375).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BonusStack {
    bonuses: Vec<Bonus>,
}

impl BonusStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bonus: Bonus) {
        self.bonuses.push(bonus);
    }

    pub fn add_stacked(&mut self, bonus: Bonus, stacks: u32) {
        self.bonuses.extend(bonus.stacked(stacks));
    }

    pub fn apply(&self, base: f64, bounds: StatBounds) -> f64 {
        let flat_sum: f64 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Flat(v) => Some(*v),
                _ => None,
            })
            .sum();

        let inc_sum: f64 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Increased(v) => Some(*v),
                _ => None,
            })
            .sum();

        let after_inc = (base + flat_sum) * (1.0 + inc_sum);

        let after_more = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::More(v) => Some(*v),
                _ => None,
            })
            .fold(after_inc, |acc, more| acc * (1.0 + more));

        let after_less = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Less(v) => Some(*v),
                _ => None,
            })
            .fold(after_more, |acc, less| acc * (1.0 - less));

        bounds.clamp(after_less)
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bonuses.len()
    }
}

/// A modifier targeting one stat, as authored in module and status data.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatModifier {
    pub stat: StatKind,
    pub bonus: Bonus,
}

impl StatModifier {
    pub const fn new(stat: StatKind, bonus: Bonus) -> Self {
        Self { stat, bonus }
    }
}

/// Inclusive clamp range for one stat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatBounds {
    pub min: f64,
    pub max: f64,
}

impl StatBounds {
    /// Probabilities and fractions (crit, evasion, penetration, lifesteal).
    pub const UNIT_INTERVAL: Self = Self { min: 0.0, max: 1.0 };
    /// Values that only have a floor of zero (atk, def, res, mov, pools).
    pub const NON_NEGATIVE: Self = Self {
        min: 0.0,
        max: f64::MAX,
    };
    pub const AT_LEAST_ONE: Self = Self {
        min: 1.0,
        max: f64::MAX,
    };
    pub const UNCLAMPED: Self = Self {
        min: f64::MIN,
        max: f64::MAX,
    };

    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Bounds enforced on the recomputed value of `stat`.
    ///
    /// HP is bounded by max HP separately, since that depends on another stat.
    pub const fn for_stat(stat: StatKind) -> Self {
        match stat {
            StatKind::MaxHp | StatKind::Spd | StatKind::CritDmg => Self::AT_LEAST_ONE,
            StatKind::Crit | StatKind::Eva | StatKind::Penetration | StatKind::Lifesteal => {
                Self::UNIT_INTERVAL
            }
            StatKind::Hp
            | StatKind::Atk
            | StatKind::Def
            | StatKind::Res
            | StatKind::Shield
            | StatKind::Barrier
            | StatKind::Mov => Self::NON_NEGATIVE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_applies_before_increased() {
        let mut stack = BonusStack::new();
        stack.add(Bonus::Increased(0.5));
        stack.add(Bonus::Flat(10.0));
        assert_eq!(stack.apply(10.0, StatBounds::UNCLAMPED), 30.0);
    }

    #[test]
    fn increased_is_summed_more_is_sequential() {
        let mut stack = BonusStack::new();
        stack.add(Bonus::Increased(0.5));
        stack.add(Bonus::Increased(0.5));
        assert_eq!(stack.apply(10.0, StatBounds::UNCLAMPED), 20.0);

        let mut stack = BonusStack::new();
        stack.add(Bonus::More(0.5));
        stack.add(Bonus::More(0.5));
        assert_eq!(stack.apply(10.0, StatBounds::UNCLAMPED), 22.5);
    }

    #[test]
    fn stacked_flat_scales_linearly_and_more_compounds() {
        let mut stack = BonusStack::new();
        stack.add_stacked(Bonus::Flat(2.0), 3);
        assert_eq!(stack.apply(0.0, StatBounds::UNCLAMPED), 6.0);
        assert_eq!(stack.len(), 1);

        let mut stack = BonusStack::new();
        stack.add_stacked(Bonus::Less(0.5), 2);
        assert_eq!(stack.apply(100.0, StatBounds::UNCLAMPED), 25.0);
    }

    #[test]
    fn bounds_clamp_result() {
        let mut stack = BonusStack::new();
        stack.add(Bonus::Flat(5.0));
        assert_eq!(stack.apply(0.5, StatBounds::for_stat(StatKind::Crit)), 1.0);
        let mut stack = BonusStack::new();
        stack.add(Bonus::Flat(-50.0));
        assert_eq!(stack.apply(10.0, StatBounds::for_stat(StatKind::Spd)), 1.0);
    }
}
