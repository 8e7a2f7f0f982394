//! Board geometry and occupancy.

use arrayvec::ArrayVec;

use crate::error::{ErrorSeverity, GameError};

use super::types::{Position, UnitId};

/// Static terrain of a tile.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Terrain {
    #[default]
    Floor,
    Wall,
    Water,
}

impl Terrain {
    pub const fn is_obstacle(self) -> bool {
        matches!(self, Terrain::Wall | Terrain::Water)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub terrain: Terrain,
    pub occupant: Option<UnitId>,
}

/// Errors raised when placing or moving a unit on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridError {
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    #[error("position {0} is blocked by terrain")]
    Blocked(Position),

    #[error("position {0} is occupied by {1}")]
    Occupied(Position, UnitId),
}

impl GameError for GridError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            GridError::OutOfBounds(_) => ErrorSeverity::Validation,
            GridError::Blocked(_) | GridError::Occupied(..) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            GridError::OutOfBounds(_) => "GRID_OUT_OF_BOUNDS",
            GridError::Blocked(_) => "GRID_BLOCKED",
            GridError::Occupied(..) => "GRID_OCCUPIED",
        }
    }
}

/// Row-major rectangular board.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    pub fn set_terrain(&mut self, pos: Position, terrain: Terrain) -> Result<(), GridError> {
        let cell = self.cell_mut(pos).ok_or(GridError::OutOfBounds(pos))?;
        cell.terrain = terrain;
        Ok(())
    }

    /// Out-of-bounds tiles count as obstacles.
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.cell(pos).is_none_or(|c| c.terrain.is_obstacle())
    }

    pub fn occupant(&self, pos: Position) -> Option<UnitId> {
        self.cell(pos).and_then(|c| c.occupant)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupant(pos).is_some()
    }

    /// In bounds, passable and empty.
    pub fn is_free(&self, pos: Position) -> bool {
        self.cell(pos)
            .is_some_and(|c| !c.terrain.is_obstacle() && c.occupant.is_none())
    }

    /// Checks that `pos` can receive a unit.
    pub fn check_free(&self, pos: Position) -> Result<(), GridError> {
        let cell = self.cell(pos).ok_or(GridError::OutOfBounds(pos))?;
        if cell.terrain.is_obstacle() {
            return Err(GridError::Blocked(pos));
        }
        if let Some(other) = cell.occupant {
            return Err(GridError::Occupied(pos, other));
        }
        Ok(())
    }

    pub fn place(&mut self, unit: UnitId, pos: Position) -> Result<(), GridError> {
        self.check_free(pos)?;
        if let Some(cell) = self.cell_mut(pos) {
            cell.occupant = Some(unit);
        }
        Ok(())
    }

    /// Clears `pos` if `unit` stands there.
    pub fn vacate(&mut self, unit: UnitId, pos: Position) {
        if let Some(cell) = self.cell_mut(pos)
            && cell.occupant == Some(unit)
        {
            cell.occupant = None;
        }
    }

    pub fn relocate(&mut self, unit: UnitId, from: Position, to: Position) -> Result<(), GridError> {
        if from == to {
            return Ok(());
        }
        self.check_free(to)?;
        self.vacate(unit, from);
        self.place(unit, to)
    }

    /// Exchanges the occupants of two tiles.
    pub fn swap(&mut self, a: Position, b: Position) -> Result<(), GridError> {
        let ia = self.index(a).ok_or(GridError::OutOfBounds(a))?;
        let ib = self.index(b).ok_or(GridError::OutOfBounds(b))?;
        let occupant_a = self.cells[ia].occupant;
        self.cells[ia].occupant = self.cells[ib].occupant;
        self.cells[ib].occupant = occupant_a;
        Ok(())
    }

    /// Orthogonal neighbours that are in bounds.
    pub fn neighbours(&self, pos: Position) -> ArrayVec<Position, 4> {
        pos.neighbours()
            .into_iter()
            .filter(|p| self.in_bounds(*p))
            .collect()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_respects_terrain_and_occupancy() {
        let mut grid = Grid::new(4, 4);
        grid.set_terrain(Position::new(1, 1), Terrain::Wall).unwrap();

        assert_eq!(
            grid.place(UnitId(1), Position::new(1, 1)),
            Err(GridError::Blocked(Position::new(1, 1)))
        );
        grid.place(UnitId(1), Position::new(0, 0)).unwrap();
        assert_eq!(
            grid.place(UnitId(2), Position::new(0, 0)),
            Err(GridError::Occupied(Position::new(0, 0), UnitId(1)))
        );
        assert_eq!(
            grid.place(UnitId(2), Position::new(4, 0)),
            Err(GridError::OutOfBounds(Position::new(4, 0)))
        );
    }

    #[test]
    fn relocate_moves_occupant() {
        let mut grid = Grid::new(3, 3);
        grid.place(UnitId(7), Position::new(0, 0)).unwrap();
        grid.relocate(UnitId(7), Position::new(0, 0), Position::new(2, 2))
            .unwrap();
        assert!(grid.is_free(Position::new(0, 0)));
        assert_eq!(grid.occupant(Position::new(2, 2)), Some(UnitId(7)));
    }

    #[test]
    fn corner_has_two_neighbours() {
        let grid = Grid::new(3, 3);
        assert_eq!(grid.neighbours(Position::ORIGIN).len(), 2);
        assert_eq!(grid.neighbours(Position::new(1, 1)).len(), 4);
    }
}
