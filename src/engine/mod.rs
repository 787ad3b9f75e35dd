//! Engine modules: the stage machine, typed workflow steps, and the
//! orchestration engine that turns a `Configuration` into an ordered
//! command sequence.

pub mod state;
pub mod step;
pub mod workflow;
