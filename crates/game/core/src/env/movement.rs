//! Movement legality.
//!
//! The engine does not enumerate movement shapes itself. It asks a
//! [`MovementOracle`] which tiles a unit can reach and treats the answer as
//! authoritative for `Move` requests and ops.

use std::collections::{BTreeSet, VecDeque};

use crate::state::{Grid, Position, Unit};

pub trait MovementOracle: Send + Sync {
    /// Every tile `unit` may end a move on (its own tile excluded).
    fn reachable(&self, unit: &Unit, grid: &Grid) -> BTreeSet<Position>;

    fn can_reach(&self, unit: &Unit, grid: &Grid, to: Position) -> bool {
        self.reachable(unit, grid).contains(&to)
    }
}

/// Orthogonal walk over free tiles, up to `stats.mov` steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeMovement;

impl MovementOracle for RangeMovement {
    fn reachable(&self, unit: &Unit, grid: &Grid) -> BTreeSet<Position> {
        let budget = unit.stats.mov.floor().max(0.0) as u32;
        let mut seen = BTreeSet::from([unit.position]);
        let mut frontier = VecDeque::from([(unit.position, 0u32)]);

        while let Some((pos, steps)) = frontier.pop_front() {
            if steps == budget {
                continue;
            }
            for next in grid.neighbours(pos) {
                if grid.is_free(next) && seen.insert(next) {
                    frontier.push_back((next, steps + 1));
                }
            }
        }

        seen.remove(&unit.position);
        seen
    }
}
