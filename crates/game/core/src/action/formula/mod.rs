//! Magnitudes for op amounts.
//!
//! Every amount an op deals, heals or grants is a [`Magnitude`], resolved
//! against the op's user, the current target and the values accumulated so
//! far in the same skill.
//!
//! ## Examples
//!
//! ```ignore
//! // 150% of attack, mitigated by defense
//! Magnitude::Scaled(1.5)
//!
//! // burn tick: payload × stacks
//! Magnitude::StatusValueTimesStacks
//!
//! // 30% of the damage dealt earlier in this skill
//! Magnitude::PreviousDamage(0.3)
//! ```

pub mod evaluate;

pub use evaluate::{FormulaInputs, StatusPayload, evaluate};

/// Amount expression used by damage, heal, shield and status ops.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Magnitude {
    /// A fixed amount.
    Flat(f64),

    /// Ratio of the user's attack. For damage this is the skill power and
    /// the pipeline multiplies it by attack itself.
    Scaled(f64),

    /// Ratio of the target's maximum HP.
    TargetMaxHp(f64),

    /// Ratio of the target's missing HP.
    TargetMissingHp(f64),

    /// Ratio of the user's maximum HP.
    SourceMaxHp(f64),

    /// The triggering status instance's payload.
    StatusValue,

    /// The triggering status instance's payload times its stacks.
    StatusValueTimesStacks,

    /// Ratio of the damage dealt earlier in the same skill.
    PreviousDamage(f64),
}

impl Default for Magnitude {
    fn default() -> Self {
        Magnitude::Flat(0.0)
    }
}

impl Magnitude {
    /// Splits a damage magnitude into the pipeline's `(power, is_flat)` pair.
    pub fn damage_power(&self, inputs: &FormulaInputs<'_>) -> (f64, bool) {
        match self {
            Magnitude::Scaled(ratio) => (*ratio, false),
            other => (evaluate(other, inputs), true),
        }
    }
}
