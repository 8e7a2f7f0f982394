use std::collections::BTreeMap;

use crate::combat::DamageType;

/// Per-damage-type resistance in `[-1, 1]`.
///
/// Negative values are weaknesses, `1.0` is immunity, absent entries are `0`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Resistances(BTreeMap<DamageType, f64>);

impl Resistances {
    pub const MIN: f64 = -1.0;
    pub const MAX: f64 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, damage_type: DamageType) -> f64 {
        self.0.get(&damage_type).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, damage_type: DamageType, value: f64) {
        let value = value.clamp(Self::MIN, Self::MAX);
        if value == 0.0 {
            self.0.remove(&damage_type);
        } else {
            self.0.insert(damage_type, value);
        }
    }

    /// Adds `delta` without clamping; call [`Resistances::clamp_all`] once done.
    pub fn add_raw(&mut self, damage_type: DamageType, delta: f64) {
        *self.0.entry(damage_type).or_insert(0.0) += delta;
    }

    pub fn clamp_all(&mut self) {
        self.0.retain(|_, value| {
            *value = value.clamp(Self::MIN, Self::MAX);
            *value != 0.0
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (DamageType, f64)> + '_ {
        self.0.iter().map(|(kind, value)| (*kind, *value))
    }
}

impl FromIterator<(DamageType, f64)> for Resistances {
    fn from_iter<T: IntoIterator<Item = (DamageType, f64)>>(iter: T) -> Self {
        let mut resistances = Self::new();
        for (kind, value) in iter {
            resistances.set(kind, value);
        }
        resistances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_reads_as_zero() {
        let resistances = Resistances::new();
        assert_eq!(resistances.get(DamageType::Fire), 0.0);
    }

    #[test]
    fn values_clamp_to_unit_range() {
        let mut resistances: Resistances =
            [(DamageType::Fire, 1.7), (DamageType::Ice, -3.0)].into_iter().collect();
        assert_eq!(resistances.get(DamageType::Fire), 1.0);
        assert_eq!(resistances.get(DamageType::Ice), -1.0);

        resistances.add_raw(DamageType::Fire, 0.5);
        resistances.clamp_all();
        assert_eq!(resistances.get(DamageType::Fire), 1.0);
    }
}
