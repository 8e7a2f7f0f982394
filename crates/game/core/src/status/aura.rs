//! Aura projection.
//!
//! Aura statuses live only on their holder. Units inside the radius are
//! influenced at recompute time, by distance and side, and nothing is stored
//! on them, so leaving the radius ends the effect without any bookkeeping.

use std::collections::BTreeMap;

use crate::action::TargetFilter;
use crate::env::StatusRegistry;
use crate::state::{Unit, UnitId};

/// One aura reaching one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct AuraInfluence {
    pub status_id: String,
    pub holder: UnitId,
    pub stacks: u32,
}

/// Maps each influenced unit to the auras reaching it.
pub fn aura_influences(units: &[Unit], registry: &StatusRegistry) -> BTreeMap<UnitId, Vec<AuraInfluence>> {
    let mut influences: BTreeMap<UnitId, Vec<AuraInfluence>> = BTreeMap::new();

    for holder in units.iter().filter(|u| u.is_alive()) {
        for instance in &holder.statuses {
            let Some(spec) = registry.get(&instance.status_id).and_then(|d| d.aura) else {
                continue;
            };
            for unit in units.iter().filter(|u| u.is_alive()) {
                if holder.position.distance(unit.position) > spec.radius {
                    continue;
                }
                let reached = match spec.filter {
                    TargetFilter::Ally => holder.side == unit.side,
                    TargetFilter::Enemy => holder.side.is_hostile_to(unit.side),
                    TargetFilter::Any | TargetFilter::Occupied | TargetFilter::Empty => true,
                };
                if reached {
                    influences.entry(unit.id).or_default().push(AuraInfluence {
                        status_id: instance.status_id.clone(),
                        holder: holder.id,
                        stacks: instance.stacks,
                    });
                }
            }
        }
    }

    influences
}
