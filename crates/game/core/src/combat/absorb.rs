//! Shield and barrier absorption, applied before HP loss.

use crate::stats::StatBlock;

use super::damage::DamageType;

/// How one hit was split between pools and HP.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Absorption {
    pub absorbed: f64,
    pub to_hp: f64,
    pub overkill: f64,
}

/// Routes `amount` through the matching pool, then HP.
///
/// Physical hits drain `shield`, magical and elemental hits drain `barrier`,
/// true damage goes straight to HP. HP never drops below zero.
pub fn absorb(stats: &mut StatBlock, amount: f64, damage_type: DamageType) -> Absorption {
    let amount = amount.max(0.0);
    let pool = match damage_type {
        DamageType::True => None,
        DamageType::Physical => Some(&mut stats.shield),
        _ => Some(&mut stats.barrier),
    };

    let absorbed = match pool {
        Some(pool) => {
            let taken = pool.min(amount).max(0.0);
            *pool -= taken;
            taken
        }
        None => 0.0,
    };

    let remainder = amount - absorbed;
    let to_hp = remainder.min(stats.hp.max(0.0));
    stats.hp = (stats.hp - remainder).max(0.0);

    Absorption {
        absorbed,
        to_hp,
        overkill: remainder - to_hp,
    }
}
