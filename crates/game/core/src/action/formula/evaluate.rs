//! Magnitude evaluation.

use crate::state::Unit;

use super::Magnitude;

/// Status instance whose trigger is running the current op list.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusPayload {
    pub status_id: String,
    pub value: f64,
    pub stacks: u32,
}

/// Everything a magnitude may read.
#[derive(Clone, Copy, Debug)]
pub struct FormulaInputs<'a> {
    pub source: &'a Unit,
    pub target: Option<&'a Unit>,
    pub status: Option<&'a StatusPayload>,
    pub damage_dealt: f64,
}

impl<'a> FormulaInputs<'a> {
    pub fn new(source: &'a Unit) -> Self {
        Self {
            source,
            target: None,
            status: None,
            damage_dealt: 0.0,
        }
    }

    pub fn target(mut self, target: &'a Unit) -> Self {
        self.target = Some(target);
        self
    }
}

/// Resolves `magnitude` to an amount, never negative.
///
/// Target-relative magnitudes read the user when there is no target.
pub fn evaluate(magnitude: &Magnitude, inputs: &FormulaInputs<'_>) -> f64 {
    let target = inputs.target.unwrap_or(inputs.source);
    let value = match magnitude {
        Magnitude::Flat(amount) => *amount,
        Magnitude::Scaled(ratio) => inputs.source.stats.atk * ratio,
        Magnitude::TargetMaxHp(ratio) => target.stats.max_hp * ratio,
        Magnitude::TargetMissingHp(ratio) => (target.stats.max_hp - target.stats.hp) * ratio,
        Magnitude::SourceMaxHp(ratio) => inputs.source.stats.max_hp * ratio,
        Magnitude::StatusValue => inputs.status.map_or(0.0, |s| s.value),
        Magnitude::StatusValueTimesStacks => {
            inputs.status.map_or(0.0, |s| s.value * f64::from(s.stacks))
        }
        Magnitude::PreviousDamage(ratio) => inputs.damage_dealt * ratio,
    };
    value.max(0.0)
}
