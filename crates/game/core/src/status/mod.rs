//! Status definitions and the resolver that applies, stacks, ticks and
//! removes their instances.

pub mod aura;
pub mod definition;
pub mod engine;

pub use aura::{AuraInfluence, aura_influences};
pub use definition::{AuraSpec, StackingPolicy, StatusCategory, StatusDefinition, TriggerEvent};
pub use engine::{
    CleanseFilter, FiredTrigger, RemovalReason, StatusApplication, StatusEvent, apply,
    break_on_damage, cleanse, convert, fire, remove, remove_status, tick, tick_where, transfer,
};

/// Status ids the damage pipeline checks by name.
pub mod ids {
    pub const BURN: &str = "burn";
    pub const POISON: &str = "poison";
}
