//! Deterministic turn-based combat rules.
//!
//! `combat-core` resolves skills, statuses, damage and initiative for a
//! grid-based tactical combat. Everything is synchronous and in-memory: a
//! [`CombatSession`] owns the [`CombatState`], content comes in through
//! [`Registries`], and randomness only through an injected [`env::RngOracle`]
//! seeded per roll, so identical inputs replay identically.
//!
//! All state mutation flows through [`engine::run_action`] and the turn
//! lifecycle in [`engine`]; presentation layers consume the
//! [`CombatLogEvent`] stream and [`CombatSession::state`].
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod replay;
pub mod state;
pub mod stats;
pub mod status;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use action::{ActionError, Magnitude, Op, OpError, Skill, SkillTag, TargetSpec, TargetingInfo};
pub use combat::DamageType;
pub use config::CombatConfig;
pub use engine::{ActionReport, CombatSession, CombatSessionBuilder, SessionError, UnitSpec};
pub use env::{CombatEnv, ModuleDefinition, Registries, UnitTemplate};
pub use error::{ErrorSeverity, GameError};
pub use replay::{CombatSnapshot, SnapshotError, SnapshotManager, SnapshotQuery};
pub use state::{CombatLogEvent, CombatState, Grid, LogKind, Position, Side, Unit, UnitId};
pub use stats::StatBlock;
pub use status::{StatusDefinition, TriggerEvent};
