//! Deep-copied combat state and its persisted envelope.

use crate::state::{CombatLog, CombatLogEvent, CombatState, Grid, Unit, UnitId};
use crate::error::{ErrorSeverity, GameError};

/// Envelope version written to and required from persisted snapshots.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "3.0";

/// Errors raised while persisting or loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("encoding error: {0}")]
    Encode(String),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: String, expected: String },
}

impl GameError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SnapshotError::Io(_) => ErrorSeverity::Recoverable,
            SnapshotError::Json(_) | SnapshotError::UnsupportedVersion { .. } => ErrorSeverity::Validation,
            SnapshotError::Encode(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SnapshotError::Io(_) => "SNAPSHOT_IO",
            SnapshotError::Json(_) => "SNAPSHOT_JSON",
            SnapshotError::Encode(_) => "SNAPSHOT_ENCODE",
            SnapshotError::UnsupportedVersion { .. } => "SNAPSHOT_UNSUPPORTED_VERSION",
        }
    }
}

/// Independent copy of everything needed to resume a combat.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatSnapshot {
    pub id: u64,
    pub version: String,
    pub turn: u32,
    pub active_unit: Option<UnitId>,
    pub units: Vec<Unit>,
    pub graveyard: Vec<Unit>,
    pub grid: Grid,
    pub logs: Vec<CombatLogEvent>,
    pub seed: u64,
    pub rng_cursor: u64,
}

impl CombatSnapshot {
    /// Copies the given parts. RNG position starts at zero; see [`Self::with_rng`].
    pub fn new(
        id: u64,
        units: &[Unit],
        graveyard: &[Unit],
        grid: &Grid,
        logs: &[CombatLogEvent],
        active_unit: Option<UnitId>,
        turn: u32,
    ) -> Self {
        Self {
            id,
            version: SNAPSHOT_SCHEMA_VERSION.to_owned(),
            turn,
            active_unit,
            units: units.to_vec(),
            graveyard: graveyard.to_vec(),
            grid: grid.clone(),
            logs: logs.to_vec(),
            seed: 0,
            rng_cursor: 0,
        }
    }

    pub fn with_rng(mut self, seed: u64, rng_cursor: u64) -> Self {
        self.seed = seed;
        self.rng_cursor = rng_cursor;
        self
    }

    pub fn capture(id: u64, state: &CombatState) -> Self {
        Self::new(
            id,
            &state.units,
            &state.graveyard,
            &state.grid,
            state.log.events(),
            state.active_unit,
            state.turn,
        )
        .with_rng(state.seed, state.rng_cursor)
    }

    /// Rebuilds a live state. The snapshot itself is left untouched.
    pub fn to_state(&self) -> CombatState {
        CombatState::from_parts(
            self.units.clone(),
            self.graveyard.clone(),
            self.grid.clone(),
            CombatLog::from_events(self.logs.clone()),
            self.turn,
            self.active_unit,
            self.seed,
            self.rng_cursor,
        )
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[cfg(feature = "serde")]
mod persist {
    use std::fs;
    use std::path::Path;

    use sha2::{Digest, Sha256};

    use super::{CombatSnapshot, SNAPSHOT_SCHEMA_VERSION, SnapshotError};

    impl CombatSnapshot {
        pub fn to_json(&self) -> Result<String, SnapshotError> {
            serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Json(e.to_string()))
        }

        /// Parses an envelope, rejecting any version but the current one
        /// before the payload is interpreted.
        pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
            let value: serde_json::Value =
                serde_json::from_str(json).map_err(|e| SnapshotError::Json(e.to_string()))?;
            let found = value
                .get("version")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            if found != SNAPSHOT_SCHEMA_VERSION {
                return Err(SnapshotError::UnsupportedVersion {
                    found: found.to_owned(),
                    expected: SNAPSHOT_SCHEMA_VERSION.to_owned(),
                });
            }
            serde_json::from_value(value).map_err(|e| SnapshotError::Json(e.to_string()))
        }

        /// Writes the envelope through a temporary file and an atomic rename.
        pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
            let path = path.as_ref();
            let temp_path = path.with_extension("json.tmp");
            fs::write(&temp_path, self.to_json()?)?;
            fs::rename(&temp_path, path)?;
            tracing::debug!(target: "combat::replay", id = self.id, path = %path.display(), "snapshot saved");
            Ok(())
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
            let path = path.as_ref();
            let json = fs::read_to_string(path)?;
            let snapshot = Self::from_json(&json)?;
            tracing::debug!(target: "combat::replay", id = snapshot.id, path = %path.display(), "snapshot loaded");
            Ok(snapshot)
        }

        /// SHA-256 of the bincode encoding.
        ///
        /// Two runs with the same seed and action sequence produce the same
        /// digest; the snapshot id is excluded so captures taken at
        /// different points of a manager's history still compare.
        pub fn digest(&self) -> Result<[u8; 32], SnapshotError> {
            let mut unkeyed = self.clone();
            unkeyed.id = 0;
            let bytes = bincode::serialize(&unkeyed).map_err(|e| SnapshotError::Encode(e.to_string()))?;
            Ok(Sha256::digest(&bytes).into())
        }
    }
}
