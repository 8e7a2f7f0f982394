/// Combat rule constants and tunable parameters.
///
/// Every field has a default, so a partial TOML table deserializes into a
/// complete configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Initiative a unit must count down from before it can act.
    pub base_threshold: f64,
    /// Tolerance used when deciding that a unit's initiative reached zero.
    pub initiative_epsilon: f64,
    /// Maximum nesting of chain-reaction actions below a top-level action.
    pub max_chain_depth: u32,
    /// Maximum nesting of status triggers that cause further status triggers.
    pub max_trigger_depth: u32,
    /// Number of snapshots retained by a [`crate::replay::SnapshotManager`].
    pub snapshot_capacity: usize,
    /// Damage bonus per point of combo (`1 + combo * combo_step`).
    pub combo_step: f64,
    /// Upper bound on the fraction of base damage removed by mitigation.
    pub mitigation_cap: f64,
    /// Action points restored at the start of each of a unit's turns.
    pub action_points: u32,
    /// Per-level growth applied to max HP, attack, defense and resistance.
    pub level_growth: f64,
    /// Maximum random initiative offset drawn at session start.
    pub initiative_jitter: f64,
    /// Reject top-level actions from units other than the active one.
    pub enforce_turn_order: bool,
}

impl CombatConfig {
    pub const DEFAULT_BASE_THRESHOLD: f64 = 100.0;
    pub const DEFAULT_INITIATIVE_EPSILON: f64 = 0.001;
    pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 5;
    pub const DEFAULT_MAX_TRIGGER_DEPTH: u32 = 8;
    pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 100;
    pub const DEFAULT_COMBO_STEP: f64 = 0.15;
    pub const DEFAULT_MITIGATION_CAP: f64 = 0.75;
    pub const DEFAULT_ACTION_POINTS: u32 = 1;
    pub const DEFAULT_LEVEL_GROWTH: f64 = 0.1;

    pub fn new() -> Self {
        Self {
            base_threshold: Self::DEFAULT_BASE_THRESHOLD,
            initiative_epsilon: Self::DEFAULT_INITIATIVE_EPSILON,
            max_chain_depth: Self::DEFAULT_MAX_CHAIN_DEPTH,
            max_trigger_depth: Self::DEFAULT_MAX_TRIGGER_DEPTH,
            snapshot_capacity: Self::DEFAULT_SNAPSHOT_CAPACITY,
            combo_step: Self::DEFAULT_COMBO_STEP,
            mitigation_cap: Self::DEFAULT_MITIGATION_CAP,
            action_points: Self::DEFAULT_ACTION_POINTS,
            level_growth: Self::DEFAULT_LEVEL_GROWTH,
            initiative_jitter: 0.0,
            enforce_turn_order: true,
        }
    }

    pub fn with_chain_depth(mut self, max_chain_depth: u32) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    pub fn with_turn_order(mut self, enforce: bool) -> Self {
        self.enforce_turn_order = enforce;
        self
    }

    pub fn with_initiative_jitter(mut self, jitter: f64) -> Self {
        self.initiative_jitter = jitter;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
