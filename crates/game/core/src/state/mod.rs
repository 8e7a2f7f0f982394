//! Authoritative combat state.
//!
//! [`CombatState`] is owned by the session and mutated in place by the
//! orchestrator and interpreter. Previews and snapshots work on deep copies.
pub mod grid;
pub mod log;
pub mod types;

pub use grid::{Cell, Grid, GridError, Terrain};
pub use log::{CombatLog, CombatLogEvent, LogEntry, LogKind};
pub use types::{
    DelayedEffect, DisableFlags, PERMANENT, Position, Side, StatusInstance, SummonState,
    TransformState, Unit, UnitId, UnitRuntime,
};

use crate::env::{RngOracle, RollContext, compute_seed};

/// Live roster, board and history of one combat.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    /// Living units in creation order.
    pub units: Vec<Unit>,
    /// Fallen units, most recent last.
    pub graveyard: Vec<Unit>,
    pub grid: Grid,
    pub log: CombatLog,
    /// Number of turns started so far.
    pub turn: u32,
    pub active_unit: Option<UnitId>,
    /// Set once at session start and never modified.
    pub seed: u64,
    /// Number of random draws taken so far.
    pub rng_cursor: u64,
    next_unit_id: u32,
}

impl CombatState {
    pub fn new(grid: Grid, seed: u64) -> Self {
        Self {
            units: Vec::new(),
            graveyard: Vec::new(),
            grid,
            log: CombatLog::new(),
            turn: 0,
            active_unit: None,
            seed,
            rng_cursor: 0,
            next_unit_id: 1,
        }
    }

    /// Rebuilds a state from captured parts (used by snapshot restore).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        units: Vec<Unit>,
        graveyard: Vec<Unit>,
        grid: Grid,
        log: CombatLog,
        turn: u32,
        active_unit: Option<UnitId>,
        seed: u64,
        rng_cursor: u64,
    ) -> Self {
        let next_unit_id = units
            .iter()
            .chain(graveyard.iter())
            .map(|u| u.id.0 + 1)
            .max()
            .unwrap_or(1);
        Self {
            units,
            graveyard,
            grid,
            log,
            turn,
            active_unit,
            seed,
            rng_cursor,
            next_unit_id,
        }
    }

    pub fn allocate_unit_id(&mut self) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Looks `id` up among living units first, then the graveyard.
    pub fn find(&self, id: UnitId) -> Option<&Unit> {
        self.unit(id)
            .or_else(|| self.graveyard.iter().rev().find(|u| u.id == id))
    }

    /// Two distinct roster units, mutably.
    pub fn pair_mut(&mut self, a: UnitId, b: UnitId) -> Option<(&mut Unit, &mut Unit)> {
        if a == b {
            return None;
        }
        let ia = self.units.iter().position(|u| u.id == a)?;
        let ib = self.units.iter().position(|u| u.id == b)?;
        if ia < ib {
            let (left, right) = self.units.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.units.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Whether `id` was ever part of this combat (alive or fallen).
    pub fn is_known(&self, id: UnitId) -> bool {
        self.unit(id).is_some() || self.graveyard.iter().any(|u| u.id == id)
    }

    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.grid.occupant(pos).and_then(|id| self.unit(id))
    }

    pub fn living(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| u.is_alive())
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    /// Adds a unit to the roster and places it on the board.
    pub fn spawn(&mut self, unit: Unit) -> Result<UnitId, GridError> {
        self.grid.place(unit.id, unit.position)?;
        let id = unit.id;
        // externally numbered units must never collide with allocated ids
        self.next_unit_id = self.next_unit_id.max(id.0 + 1);
        self.units.push(unit);
        Ok(id)
    }

    /// Removes a unit from the roster and the board without burying it.
    pub fn despawn(&mut self, id: UnitId) -> Option<Unit> {
        let index = self.units.iter().position(|u| u.id == id)?;
        let unit = self.units.remove(index);
        self.grid.vacate(unit.id, unit.position);
        Some(unit)
    }

    /// Moves every unit at `hp <= 0` to the graveyard.
    pub fn sweep_dead(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id)
            .collect();
        for id in &dead {
            if let Some(mut unit) = self.despawn(*id) {
                unit.stats.hp = 0.0;
                tracing::debug!(target: "combat::state", unit = %unit.id, "unit moved to graveyard");
                self.graveyard.push(unit);
            }
        }
        if self.active_unit.is_some_and(|id| dead.contains(&id)) {
            tracing::debug!(target: "combat::state", "active unit fell during its turn");
        }
        dead
    }

    /// Draws a uniform value in `[0, 1)` and advances the cursor.
    pub fn roll(&mut self, rng: &dyn RngOracle, actor: UnitId, context: RollContext) -> f64 {
        let seed = compute_seed(self.seed, self.rng_cursor, actor.0, context.into());
        self.rng_cursor += 1;
        f64::from(rng.next_u32(seed)) / (f64::from(u32::MAX) + 1.0)
    }

    pub fn record(&mut self, entry: LogEntry) -> &CombatLogEvent {
        self.log.push(self.turn, entry)
    }
}
