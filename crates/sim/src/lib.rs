//! Colony simulation.
//!
//! A small, deterministic stand-in for the game world. It owns a
//! [`WorldSnapshot`](colony_core::WorldSnapshot), carries out the intents the
//! scheduler emits and advances time, so the scheduler can be driven end to
//! end without a live server.

#![warn(missing_docs)]

mod scenario;
mod world;

pub use scenario::ScenarioBuilder;
pub use world::{census, ApplyReport, SimWorld};
