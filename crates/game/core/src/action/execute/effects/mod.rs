//! Op handlers, one file per concern.
//!
//! Every handler is an [`OpRunner`](super::OpRunner) method returning
//! `Result<(), OpError>`; the runner turns errors into `OpFailed` events.

mod damage;
mod displacement;
mod meta;
mod movement;
mod spawn;
mod status;
mod support;

pub(crate) use damage::Hit;
pub use spawn::revert_transform;
