//! Per-unit status instances and the disable flags they derive.

use bitflags::bitflags;

use super::common::UnitId;

/// Duration value marking a status that never counts down.
pub const PERMANENT: i32 = -1;

/// One active status on a unit.
///
/// Instances reference their [`crate::status::StatusDefinition`] by id; the
/// definition is immutable registry data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusInstance {
    /// Unique within the holder, allocated from the holder's runtime counter.
    pub instance_id: u32,
    pub status_id: String,
    /// Remaining turn-ends, or [`PERMANENT`].
    pub duration: i32,
    pub stacks: u32,
    pub source: UnitId,
    /// Numeric payload (DOT magnitude, shield size, ...).
    pub value: f64,
}

impl StatusInstance {
    pub fn is_permanent(&self) -> bool {
        self.duration == PERMANENT
    }
}

bitflags! {
    /// Action restrictions currently in force on a unit.
    ///
    /// Rebuilt at every recompute as the union of the active statuses'
    /// `disables` sets.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DisableFlags: u8 {
        const STUNNED = 1 << 0;
        const FROZEN = 1 << 1;
        const SILENCED = 1 << 2;
        const ROOTED = 1 << 3;
        const SLEEPING = 1 << 4;
        const CHARMED = 1 << 5;
    }
}

impl DisableFlags {
    /// Flags that prevent a unit from taking turns at all.
    pub const INCAPACITATED: Self = Self::STUNNED.union(Self::FROZEN).union(Self::SLEEPING);

    pub fn is_incapacitated(self) -> bool {
        self.intersects(Self::INCAPACITATED)
    }
}
