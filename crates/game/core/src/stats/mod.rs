//! Stat model.
//!
//! - [`StatBlock`]: flat record of every stat and pool
//! - [`BonusStack`]: Flat → Increased → More → Less → clamp
//! - [`Resistances`]: per-damage-type values in `[-1, 1]`
//! - [`recompute`]: the single derivation of current stats from base,
//!   modules, statuses and auras

pub mod block;
pub mod bonus;
pub mod recompute;
pub mod resistance;

pub use block::{StatBlock, StatKind};
pub use bonus::{Bonus, BonusStack, StatBounds, StatModifier};
pub use recompute::{recompute, recompute_all, recompute_units};
pub use resistance::Resistances;
