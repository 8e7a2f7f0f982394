//! Map data loader.
//!
//! A map file only describes terrain. Unit placement lives in scenario files,
//! so the same board can host different encounters.

use std::path::Path;

use combat_core::state::{Grid, Position, Terrain};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Map data as written in RON. Tiles not listed are floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapData {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub tiles: Vec<(i32, i32, Terrain)>, // (x, y, terrain)
}

impl MapData {
    pub fn into_grid(self) -> LoadResult<Grid> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Map dimensions must be positive, got {}x{}", self.width, self.height);
        }
        let mut grid = Grid::new(self.width, self.height);
        for (x, y, terrain) in self.tiles {
            grid.set_terrain(Position::new(x, y), terrain)
                .map_err(|e| anyhow::anyhow!("Invalid map tile: {}", e))?;
        }
        Ok(grid)
    }
}

/// Loader for map data from RON files.
pub struct MapLoader;

impl MapLoader {
    pub fn load(path: &Path) -> LoadResult<Grid> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Grid> {
        let data: MapData =
            ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse map RON: {}", e))?;
        data.into_grid()
    }
}
