//! Engine configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`CombatConfig`] from TOML files.
///
/// Missing keys fall back to the engine defaults, so an empty file is a
/// valid configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(config: &CombatConfig) -> LoadResult<()> {
        if config.base_threshold.is_nan() || config.base_threshold <= 0.0 {
            anyhow::bail!("base_threshold must be positive, got {}", config.base_threshold);
        }
        if config.initiative_epsilon < 0.0 {
            anyhow::bail!("initiative_epsilon must not be negative");
        }
        if !(0.0..=1.0).contains(&config.mitigation_cap) {
            anyhow::bail!("mitigation_cap must lie in [0, 1], got {}", config.mitigation_cap);
        }
        if config.initiative_jitter < 0.0 || config.combo_step < 0.0 || config.level_growth < 0.0 {
            anyhow::bail!("initiative_jitter, combo_step and level_growth must not be negative");
        }
        if config.snapshot_capacity == 0 {
            anyhow::bail!("snapshot_capacity must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = ConfigLoader::parse("max_chain_depth = 3\nenforce_turn_order = false\n").unwrap();
        assert_eq!(config.max_chain_depth, 3);
        assert!(!config.enforce_turn_order);
        assert_eq!(config.base_threshold, CombatConfig::DEFAULT_BASE_THRESHOLD);
        assert_eq!(ConfigLoader::parse("").unwrap(), CombatConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(ConfigLoader::parse("base_threshold = 0.0").is_err());
        assert!(ConfigLoader::parse("mitigation_cap = 1.5").is_err());
        assert!(ConfigLoader::parse("snapshot_capacity = 0").is_err());
        assert!(ConfigLoader::parse("max_chain_depth = \"deep\"").is_err());
    }

    #[test]
    fn load_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mitigation_cap = -1.0").unwrap();
        let err = ConfigLoader::load(&path).unwrap_err().to_string();
        assert!(err.contains("config.toml"), "{err}");
    }
}
