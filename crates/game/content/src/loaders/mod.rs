//! Content loaders for reading combat data from files.
//!
//! Registries (skills, statuses, modules, unit templates) and maps are RON;
//! the engine configuration is TOML. Every loader returns [`LoadResult`] and
//! names the offending file in its error.

pub mod config;
pub mod factory;
pub mod map;
pub mod registry;
pub mod scenario;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use map::{MapData, MapLoader};
pub use registry::{ModuleLoader, SkillLoader, StatusLoader, TemplateLoader, validate_references};
pub use scenario::{Scenario, ScenarioLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
