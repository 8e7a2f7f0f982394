//! Data-driven combat content and its loaders.
//!
//! This crate reads the files a combat is built from:
//! - Skills, statuses, modules and unit templates (RON)
//! - Maps and scenarios (RON)
//! - Engine configuration (TOML)
//!
//! Content is loaded and validated once, then handed to `combat-core` as
//! immutable registries. Nothing here is consulted during resolution.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, LoadResult, MapData, MapLoader, ModuleLoader, Scenario, ScenarioLoader,
    SkillLoader, StatusLoader, TemplateLoader, validate_references,
};
