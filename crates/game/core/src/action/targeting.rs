//! Targeting rules for skills.
//!
//! A skill names one nominal target (a unit, a tile, or its user). Range is
//! measured with Manhattan distance from the user, and the filter is judged
//! from the user's point of view, so a charmed user sees its own side as
//! enemies. Shape ops (`Aoe`, `Line`, `Cone`, `Chain`) widen the nominal
//! target into a target set at execution time.

use crate::state::{Position, Unit, UnitId};

// ============================================================================
// Targeting Kinds and Filters
// ============================================================================

/// Nominal shape of a skill's target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetKind {
    #[default]
    Single,
    Aoe,
    Line,
    Cone,
    Chain,
    /// Always resolves to the user; range and filter are ignored.
    SelfOnly,
}

/// Which units or tiles a target may be.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetFilter {
    Any,
    Ally,
    #[default]
    Enemy,
    /// An unoccupied tile.
    Empty,
    /// Any tile with a living unit on it.
    Occupied,
}

impl TargetFilter {
    /// Whether `target` (the occupant of the chosen tile, if any) passes.
    pub fn accepts(self, user: &Unit, target: Option<&Unit>) -> bool {
        match (self, target) {
            (TargetFilter::Any, _) => true,
            (TargetFilter::Empty, occupant) => occupant.is_none(),
            (TargetFilter::Occupied, occupant) => occupant.is_some(),
            (TargetFilter::Ally, Some(unit)) => user.is_ally_of(unit),
            (TargetFilter::Enemy, Some(unit)) => user.is_enemy_of(unit),
            (TargetFilter::Ally | TargetFilter::Enemy, None) => false,
        }
    }
}

// ============================================================================
// Targeting Info
// ============================================================================

/// How a skill selects its nominal target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetingInfo {
    pub kind: TargetKind,
    /// Maximum Manhattan distance from the user.
    pub range: u32,
    pub radius: u32,
    pub width: u32,
    /// Cone aperture in degrees.
    pub angle: u32,
    pub max_targets: u32,
    pub filter: TargetFilter,
    /// Whether the user may name itself as the target.
    pub self_targetable: bool,
}

impl Default for TargetingInfo {
    fn default() -> Self {
        Self {
            kind: TargetKind::Single,
            range: 1,
            radius: 0,
            width: 1,
            angle: 90,
            max_targets: 1,
            filter: TargetFilter::Enemy,
            self_targetable: false,
        }
    }
}

impl TargetingInfo {
    /// One enemy within `range`.
    pub fn single(range: u32) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    /// The user only.
    pub fn self_only() -> Self {
        Self {
            kind: TargetKind::SelfOnly,
            range: 0,
            filter: TargetFilter::Any,
            self_targetable: true,
            ..Self::default()
        }
    }

    /// A tile within `range`, any occupancy.
    pub fn area(range: u32, radius: u32) -> Self {
        Self {
            kind: TargetKind::Aoe,
            range,
            radius,
            filter: TargetFilter::Any,
            ..Self::default()
        }
    }

    /// An unoccupied tile within `range`.
    pub fn tile(range: u32) -> Self {
        Self {
            range,
            filter: TargetFilter::Empty,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: TargetFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_kind(mut self, kind: TargetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn allow_self(mut self) -> Self {
        self.self_targetable = true;
        self
    }

    pub fn is_self_only(&self) -> bool {
        self.kind == TargetKind::SelfOnly
    }
}

// ============================================================================
// Target Requests
// ============================================================================

/// The target named by a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetSpec {
    Unit(UnitId),
    Position(Position),
    SelfCast,
}

impl From<UnitId> for TargetSpec {
    fn from(id: UnitId) -> Self {
        TargetSpec::Unit(id)
    }
}

impl From<Position> for TargetSpec {
    fn from(pos: Position) -> Self {
        TargetSpec::Position(pos)
    }
}

/// A target that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The unit standing on the target tile, if any.
    pub primary: Option<UnitId>,
    pub position: Position,
}
