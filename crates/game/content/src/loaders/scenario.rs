//! Scenario loader: which map to fight on and who stands where.
//!
//! Scenarios keep placement apart from terrain, so one map can serve several
//! encounters. Unit ids are allocated when the session is built, in the order
//! placements are listed.

use std::path::Path;
use std::sync::Arc;

use combat_core::config::CombatConfig;
use combat_core::engine::{CombatSession, UnitSpec};
use combat_core::env::Registries;
use combat_core::state::Grid;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Map file name under `maps/`, without extension.
    pub map: String,
    #[serde(default)]
    pub seed: u64,
    pub units: Vec<UnitSpec>,
}

impl Scenario {
    /// Builds a ready session. Initiative is rolled, no turn has started.
    pub fn build_session(
        &self,
        registries: Arc<Registries>,
        grid: Grid,
        config: CombatConfig,
    ) -> LoadResult<CombatSession> {
        tracing::info!(
            target: "combat::content",
            map = %self.map,
            seed = self.seed,
            units = self.units.len(),
            "building session from scenario"
        );

        let builder = self
            .units
            .iter()
            .cloned()
            .fold(CombatSession::builder(registries).grid(grid).seed(self.seed).config(config), |b, spec| {
                b.unit(spec)
            });
        builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build scenario on map {}: {}", self.map, e))
    }
}

pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Scenario> {
        let scenario: Scenario = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;
        if scenario.units.is_empty() {
            anyhow::bail!("Scenario on map {} places no units", scenario.map);
        }
        Ok(scenario)
    }
}
