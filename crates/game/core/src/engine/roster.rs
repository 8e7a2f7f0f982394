//! Unit creation from templates.
//!
//! Session setup and the `Summon` op both go through [`instantiate`], so a
//! summoned unit is indistinguishable from one placed at the start.

use crate::env::{CombatEnv, UnitTemplate};
use crate::state::{CombatState, GridError, PERMANENT, Position, Side, Unit, UnitId};
use crate::stats::recompute_all;
use crate::status::{self, StatusApplication};

/// Placement request for a unit created at session start.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSpec {
    pub template: String,
    pub side: Side,
    #[cfg_attr(feature = "serde", serde(default = "first_level"))]
    pub level: u32,
    pub position: Position,
}

#[cfg(feature = "serde")]
fn first_level() -> u32 {
    1
}

impl UnitSpec {
    pub fn new(template: impl Into<String>, side: Side, position: Position) -> Self {
        Self {
            template: template.into(),
            side,
            level: 1,
            position,
        }
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// Builds a unit from `template`, places it and recomputes the roster.
///
/// Template statuses are applied permanently with the new unit as source.
/// The unit starts with a full initiative countdown and a fresh action
/// point pool.
pub fn instantiate(
    state: &mut CombatState,
    env: &CombatEnv<'_>,
    template: &UnitTemplate,
    side: Side,
    level: u32,
    position: Position,
) -> Result<UnitId, GridError> {
    state.grid.check_free(position)?;

    let id = state.allocate_unit_id();
    let mut unit = Unit::from_template(id, template, side, level, position, env.config.level_growth);
    unit.runtime.initiative = env.config.base_threshold;
    unit.runtime.action_points = env.config.action_points;

    for status_id in &template.statuses {
        if env.statuses().get(status_id).is_none() {
            tracing::warn!(
                target: "combat::roster",
                template = %template.id,
                status = %status_id,
                "template references an unknown status"
            );
            continue;
        }
        // creation is not an event; the returned status events are not logged
        let _ = status::apply(
            &mut unit,
            env.statuses(),
            StatusApplication::new(status_id.clone(), PERMANENT, id),
        );
    }

    state.spawn(unit)?;
    recompute_all(&mut state.units, env.statuses(), env.modules());

    tracing::debug!(
        target: "combat::roster",
        unit = %id,
        template = %template.id,
        ?side,
        level,
        %position,
        "unit created"
    );
    Ok(id)
}
