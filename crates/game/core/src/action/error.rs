//! Action errors.
//!
//! [`ActionError`] is a rule rejection returned before any mutation.
//! [`OpError`] is a fault inside a single op; the interpreter logs it and
//! moves on to the next op.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{GridError, Position, UnitId};

// ============================================================================
// Rule Rejections
// ============================================================================

/// Reasons an action request is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionError {
    /// Actor not found among living units.
    #[error("actor {0} not found")]
    ActorNotFound(UnitId),

    #[error("actor {0} is dead")]
    ActorDead(UnitId),

    #[error("it is not {0}'s turn")]
    NotActorsTurn(UnitId),

    /// Stunned, frozen or asleep.
    #[error("actor {0} is disabled")]
    Disabled(UnitId),

    #[error("actor {0} is silenced")]
    Silenced(UnitId),

    #[error("actor {0} is rooted")]
    Rooted(UnitId),

    #[error("skill {0} is not known by the actor")]
    SkillNotKnown(String),

    #[error("skill {skill} is on cooldown for {remaining} more turn(s)")]
    OnCooldown { skill: String, remaining: u32 },

    #[error("insufficient action points: need {required}, have {available}")]
    InsufficientResources { required: u32, available: u32 },

    #[error("target is {distance} tiles away, range is {range}")]
    OutOfRange { distance: u32, range: u32 },

    /// The target unit does not exist or is dead.
    #[error("invalid target")]
    InvalidTarget,

    /// The target does not match the skill's filter.
    #[error("target does not match the skill filter")]
    FilterMismatch,

    #[error("skill cannot target its user")]
    NotSelfTargetable,

    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    #[error("position {0} is occupied")]
    Occupied(Position),

    #[error("position {0} is blocked by terrain")]
    Blocked(Position),

    #[error("position {0} is not reachable")]
    Unreachable(Position),

    #[error("actor {0} already moved this turn")]
    AlreadyMoved(UnitId),

    /// A chain reaction would nest deeper than the configured cap.
    #[error("chain depth {depth} exceeds the limit of {max}")]
    ChainDepthExceeded { depth: u32, max: u32 },
}

impl From<GridError> for ActionError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::OutOfBounds(pos) => ActionError::OutOfBounds(pos),
            GridError::Blocked(pos) => ActionError::Blocked(pos),
            GridError::Occupied(pos, _) => ActionError::Occupied(pos),
        }
    }
}

impl GameError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        use ActionError::*;
        match self {
            ActorNotFound(_) => ErrorSeverity::Validation,
            ActorDead(_) | NotActorsTurn(_) | Disabled(_) | Silenced(_) | Rooted(_) => {
                ErrorSeverity::Recoverable
            }
            SkillNotKnown(_) => ErrorSeverity::Validation,
            OnCooldown { .. } | InsufficientResources { .. } | AlreadyMoved(_) => {
                ErrorSeverity::Recoverable
            }
            OutOfRange { .. } | InvalidTarget | FilterMismatch | NotSelfTargetable => {
                ErrorSeverity::Validation
            }
            OutOfBounds(_) => ErrorSeverity::Validation,
            Occupied(_) | Blocked(_) | Unreachable(_) => ErrorSeverity::Recoverable,
            ChainDepthExceeded { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionError::*;
        match self {
            ActorNotFound(_) => "ACTION_ACTOR_NOT_FOUND",
            ActorDead(_) => "ACTION_ACTOR_DEAD",
            NotActorsTurn(_) => "ACTION_NOT_ACTORS_TURN",
            Disabled(_) => "ACTION_DISABLED",
            Silenced(_) => "ACTION_SILENCED",
            Rooted(_) => "ACTION_ROOTED",
            SkillNotKnown(_) => "ACTION_SKILL_NOT_KNOWN",
            OnCooldown { .. } => "ACTION_ON_COOLDOWN",
            InsufficientResources { .. } => "ACTION_INSUFFICIENT_RESOURCES",
            OutOfRange { .. } => "ACTION_OUT_OF_RANGE",
            InvalidTarget => "ACTION_INVALID_TARGET",
            FilterMismatch => "ACTION_FILTER_MISMATCH",
            NotSelfTargetable => "ACTION_NOT_SELF_TARGETABLE",
            OutOfBounds(_) => "ACTION_OUT_OF_BOUNDS",
            Occupied(_) => "ACTION_OCCUPIED",
            Blocked(_) => "ACTION_BLOCKED",
            Unreachable(_) => "ACTION_UNREACHABLE",
            AlreadyMoved(_) => "ACTION_ALREADY_MOVED",
            ChainDepthExceeded { .. } => "ACTION_CHAIN_DEPTH_EXCEEDED",
        }
    }
}

// ============================================================================
// Per-Op Faults
// ============================================================================

/// Fault raised by one op. Sibling ops still run.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpError {
    #[error("unknown status {0}")]
    UnknownStatus(String),

    #[error("unknown skill {0}")]
    UnknownSkill(String),

    #[error("unknown unit template {0}")]
    UnknownTemplate(String),

    #[error("op has no target")]
    NoTarget,

    #[error("op has no target position")]
    NoPosition,

    #[error("position {0} is blocked")]
    Blocked(Position),

    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    #[error("position {0} is not reachable")]
    Unreachable(Position),

    #[error("no fallen ally to revive")]
    NoFallenAlly,

    #[error("status trigger nesting exceeded depth {depth}")]
    TriggerDepthExceeded { depth: u32 },

    #[error("malformed op: {0}")]
    Malformed(String),
}

impl From<GridError> for OpError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::OutOfBounds(pos) => OpError::OutOfBounds(pos),
            GridError::Blocked(pos) | GridError::Occupied(pos, _) => OpError::Blocked(pos),
        }
    }
}

impl GameError for OpError {
    fn severity(&self) -> ErrorSeverity {
        use OpError::*;
        match self {
            UnknownStatus(_) | UnknownSkill(_) | UnknownTemplate(_) | Malformed(_) => {
                ErrorSeverity::Internal
            }
            TriggerDepthExceeded { .. } => ErrorSeverity::Internal,
            NoTarget | NoPosition | NoFallenAlly => ErrorSeverity::Recoverable,
            Blocked(_) | OutOfBounds(_) | Unreachable(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use OpError::*;
        match self {
            UnknownStatus(_) => "OP_UNKNOWN_STATUS",
            UnknownSkill(_) => "OP_UNKNOWN_SKILL",
            UnknownTemplate(_) => "OP_UNKNOWN_TEMPLATE",
            NoTarget => "OP_NO_TARGET",
            NoPosition => "OP_NO_POSITION",
            Blocked(_) => "OP_BLOCKED",
            OutOfBounds(_) => "OP_OUT_OF_BOUNDS",
            Unreachable(_) => "OP_UNREACHABLE",
            NoFallenAlly => "OP_NO_FALLEN_ALLY",
            TriggerDepthExceeded { .. } => "OP_TRIGGER_DEPTH_EXCEEDED",
            Malformed(_) => "OP_MALFORMED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_errors_map_to_rejections() {
        let pos = Position::new(3, 4);
        assert_eq!(
            ActionError::from(GridError::Occupied(pos, UnitId(2))),
            ActionError::Occupied(pos)
        );
        assert_eq!(OpError::from(GridError::Blocked(pos)), OpError::Blocked(pos));
    }

    #[test]
    fn codes_and_severity_classify_rejections() {
        let err = ActionError::OnCooldown {
            skill: "fireball".into(),
            remaining: 2,
        };
        assert_eq!(err.error_code(), "ACTION_ON_COOLDOWN");
        assert!(err.severity().is_recoverable());
        assert!(
            ActionError::ChainDepthExceeded { depth: 6, max: 5 }
                .severity()
                .is_internal()
        );
    }
}
