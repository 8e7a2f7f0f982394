//! Skills and the op interpreter.
//!
//! Content describes what a skill does as a list of [`Op`]s. The interpreter
//! in [`execute`] resolves targets, evaluates [`Magnitude`]s and applies each
//! op to the live state. Request validation also lives here so the
//! orchestrator can reject a request before anything is mutated.
//!
//! # Module Structure
//!
//! - `skill`: skill definitions, tags and chain reactions
//! - `op`: the op vocabulary
//! - `formula`: amount expressions
//! - `condition`: predicates for `Conditional` ops
//! - `targeting`: target kinds, filters and resolution
//! - `execute`: validation and the [`OpRunner`]
//! - `error`: [`ActionError`] (request rejections) and [`OpError`] (per-op faults)

pub mod condition;
pub mod error;
pub mod execute;
pub mod formula;
pub mod op;
pub mod skill;
pub mod targeting;

pub use condition::Condition;
pub use error::{ActionError, OpError};
pub use execute::{
    ChainRequest, DamageRecord, OpContext, OpFailure, OpRunner, SkillExecution, ValidationMode,
    resolve_reaction_target, revert_transform, validate_move, validate_skill_execution,
};
pub use formula::{FormulaInputs, Magnitude, StatusPayload, evaluate};
pub use op::{Op, ShieldPool, TransferDirection};
pub use skill::{ChainReaction, ChainTrigger, ReactionTarget, Skill, SkillTag};
pub use targeting::{ResolvedTarget, TargetFilter, TargetKind, TargetSpec, TargetingInfo};
