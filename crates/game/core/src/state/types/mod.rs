pub mod common;
pub mod status;
pub mod unit;

pub use common::{Position, Side, UnitId};
pub use status::{DisableFlags, PERMANENT, StatusInstance};
pub use unit::{DelayedEffect, SummonState, TransformState, Unit, UnitRuntime};
