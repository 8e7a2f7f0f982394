//! Read-only collaborators consumed by the engine.
//!
//! Content registries, rule configuration, movement legality and randomness
//! are injected rather than referenced globally. [`CombatEnv`] bundles them so
//! the orchestrator and interpreter receive everything through one borrow.
mod movement;
mod registry;
mod rng;
mod templates;

pub use movement::{MovementOracle, RangeMovement};
pub use registry::{
    ModuleRegistry, Registries, Registry, RegistryEntry, SkillRegistry, StatusRegistry,
    TemplateRegistry,
};
pub use rng::{FixedRng, PcgRng, RngOracle, RollContext, compute_seed};
pub use templates::{ModuleDefinition, ModulePassive, PassiveHook, UnitTemplate, UnitTemplateBuilder};

use crate::config::CombatConfig;

/// Aggregates read-only oracles required by the action pipeline.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub registries: &'a Registries,
    pub config: &'a CombatConfig,
    pub movement: &'a dyn MovementOracle,
    pub rng: &'a dyn RngOracle,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        registries: &'a Registries,
        config: &'a CombatConfig,
        movement: &'a dyn MovementOracle,
        rng: &'a dyn RngOracle,
    ) -> Self {
        Self {
            registries,
            config,
            movement,
            rng,
        }
    }

    pub fn statuses(&self) -> &'a StatusRegistry {
        &self.registries.statuses
    }

    pub fn skills(&self) -> &'a SkillRegistry {
        &self.registries.skills
    }

    pub fn modules(&self) -> &'a ModuleRegistry {
        &self.registries.modules
    }

    pub fn templates(&self) -> &'a TemplateRegistry {
        &self.registries.templates
    }
}

impl core::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("skills", &self.registries.skills.len())
            .field("statuses", &self.registries.statuses.len())
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
