//! Flat stat record shared by unit templates, base stats and current stats.

/// Every numeric stat a unit carries.
///
/// The same record is used for a unit's immutable `base` (template values
/// after level scaling) and its recomputed `stats`. `hp`, `shield` and
/// `barrier` are pools: they are mutated by combat and carried across
/// recomputes instead of being derived.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatBlock {
    pub max_hp: f64,
    pub hp: f64,
    pub atk: f64,
    pub def: f64,
    pub res: f64,
    pub spd: f64,
    /// Critical chance in `[0, 1]`.
    pub crit: f64,
    /// Critical damage multiplier, at least 1.
    pub crit_dmg: f64,
    /// Evasion chance in `[0, 1]`.
    pub eva: f64,
    /// Fraction of the defender's defense ignored, in `[0, 1]`.
    pub penetration: f64,
    /// Fraction of dealt damage returned as healing, in `[0, 1]`.
    pub lifesteal: f64,
    /// Absorbs physical damage before HP.
    pub shield: f64,
    /// Absorbs magical and elemental damage before HP.
    pub barrier: f64,
    /// Movement budget in tiles.
    pub mov: f64,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            hp: 100.0,
            atk: 10.0,
            def: 0.0,
            res: 0.0,
            spd: 10.0,
            crit: 0.0,
            crit_dmg: 1.5,
            eva: 0.0,
            penetration: 0.0,
            lifesteal: 0.0,
            shield: 0.0,
            barrier: 0.0,
            mov: 3.0,
        }
    }
}

impl StatBlock {
    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::MaxHp => self.max_hp,
            StatKind::Hp => self.hp,
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Res => self.res,
            StatKind::Spd => self.spd,
            StatKind::Crit => self.crit,
            StatKind::CritDmg => self.crit_dmg,
            StatKind::Eva => self.eva,
            StatKind::Penetration => self.penetration,
            StatKind::Lifesteal => self.lifesteal,
            StatKind::Shield => self.shield,
            StatKind::Barrier => self.barrier,
            StatKind::Mov => self.mov,
        }
    }

    pub fn set(&mut self, kind: StatKind, value: f64) {
        let slot = match kind {
            StatKind::MaxHp => &mut self.max_hp,
            StatKind::Hp => &mut self.hp,
            StatKind::Atk => &mut self.atk,
            StatKind::Def => &mut self.def,
            StatKind::Res => &mut self.res,
            StatKind::Spd => &mut self.spd,
            StatKind::Crit => &mut self.crit,
            StatKind::CritDmg => &mut self.crit_dmg,
            StatKind::Eva => &mut self.eva,
            StatKind::Penetration => &mut self.penetration,
            StatKind::Lifesteal => &mut self.lifesteal,
            StatKind::Shield => &mut self.shield,
            StatKind::Barrier => &mut self.barrier,
            StatKind::Mov => &mut self.mov,
        };
        *slot = value;
    }

    /// Scales the growth stats for a unit of `level`.
    ///
    /// `max_hp`, `atk`, `def` and `res` are multiplied by
    /// `1 + growth * (level - 1)`; HP starts full.
    pub fn scaled_for_level(&self, level: u32, growth: f64) -> Self {
        let factor = 1.0 + growth * (level.max(1) - 1) as f64;
        let mut scaled = self.clone();
        scaled.max_hp = (self.max_hp * factor).floor().max(1.0);
        scaled.atk = self.atk * factor;
        scaled.def = self.def * factor;
        scaled.res = self.res * factor;
        scaled.hp = scaled.max_hp;
        scaled
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            self.hp / self.max_hp
        }
    }
}

/// Names one field of a [`StatBlock`].
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
pub enum StatKind {
    MaxHp,
    Hp,
    Atk,
    Def,
    Res,
    Spd,
    Crit,
    CritDmg,
    Eva,
    Penetration,
    Lifesteal,
    Shield,
    Barrier,
    Mov,
}

impl StatKind {
    /// Pools are mutated directly by combat and never rebuilt from modifiers.
    pub const fn is_pool(self) -> bool {
        matches!(self, StatKind::Hp | StatKind::Shield | StatKind::Barrier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_is_identity() {
        let base = StatBlock::default();
        assert_eq!(base.scaled_for_level(1, 0.1), base);
    }

    #[test]
    fn level_scaling_grows_combat_stats() {
        let base = StatBlock {
            max_hp: 100.0,
            hp: 40.0,
            atk: 10.0,
            def: 5.0,
            ..StatBlock::default()
        };
        let scaled = base.scaled_for_level(3, 0.1);
        assert_eq!(scaled.max_hp, 120.0);
        assert_eq!(scaled.hp, 120.0);
        assert!((scaled.atk - 12.0).abs() < 1e-9);
        assert!((scaled.def - 6.0).abs() < 1e-9);
        assert_eq!(scaled.spd, base.spd);
    }

    #[test]
    fn get_and_set_agree() {
        let mut block = StatBlock::default();
        block.set(StatKind::Lifesteal, 0.25);
        assert_eq!(block.get(StatKind::Lifesteal), 0.25);
        assert_eq!("crit_dmg".parse::<StatKind>().unwrap(), StatKind::CritDmg);
    }
}
