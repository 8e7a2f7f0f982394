//! Content factory for building sessions from a data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use combat_core::config::CombatConfig;
use combat_core::engine::CombatSession;
use combat_core::env::{ModuleRegistry, Registries, SkillRegistry, StatusRegistry, TemplateRegistry};
use combat_core::state::Grid;

use crate::loaders::{
    ConfigLoader, LoadResult, MapLoader, ModuleLoader, Scenario, ScenarioLoader, SkillLoader, StatusLoader,
    TemplateLoader, validate_references,
};

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── skills.ron
/// ├── statuses.ron
/// ├── modules.ron
/// ├── templates.ron
/// ├── maps/
/// │   └── arena.ron
/// └── scenarios/
///     └── skirmish.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`. A missing file yields the defaults.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(target: "combat::content", "no config.toml, using defaults");
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    pub fn load_skills(&self) -> LoadResult<SkillRegistry> {
        SkillLoader::load(&self.data_dir.join("skills.ron"))
    }

    pub fn load_statuses(&self) -> LoadResult<StatusRegistry> {
        StatusLoader::load(&self.data_dir.join("statuses.ron"))
    }

    /// Load modules from `modules.ron`. The file is optional.
    pub fn load_modules(&self) -> LoadResult<ModuleRegistry> {
        let path = self.data_dir.join("modules.ron");
        if !path.exists() {
            return Ok(ModuleRegistry::new());
        }
        ModuleLoader::load(&path)
    }

    pub fn load_templates(&self) -> LoadResult<TemplateRegistry> {
        TemplateLoader::load(&self.data_dir.join("templates.ron"))
    }

    /// Load every registry and check references between them.
    pub fn load_registries(&self) -> LoadResult<Registries> {
        let registries = Registries {
            skills: self.load_skills()?,
            statuses: self.load_statuses()?,
            modules: self.load_modules()?,
            templates: self.load_templates()?,
        };
        validate_references(&registries)?;

        tracing::info!(
            target: "combat::content",
            skills = registries.skills.len(),
            statuses = registries.statuses.len(),
            modules = registries.modules.len(),
            templates = registries.templates.len(),
            "registries loaded"
        );
        Ok(registries)
    }

    /// Load a map from `maps/{map_name}.ron`.
    pub fn load_map(&self, map_name: &str) -> LoadResult<Grid> {
        let path = self.data_dir.join("maps").join(format!("{}.ron", map_name));
        MapLoader::load(&path)
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    pub fn load_scenario(&self, name: &str) -> LoadResult<Scenario> {
        let path = self.data_dir.join("scenarios").join(format!("{}.ron", name));
        ScenarioLoader::load(&path)
    }

    /// Load everything a scenario needs and build its session.
    pub fn build_session(&self, scenario_name: &str) -> LoadResult<CombatSession> {
        let scenario = self.load_scenario(scenario_name)?;
        let registries = Arc::new(self.load_registries()?);
        let grid = self.load_map(&scenario.map)?;
        let config = self.load_config()?;
        scenario.build_session(registries, grid, config)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
