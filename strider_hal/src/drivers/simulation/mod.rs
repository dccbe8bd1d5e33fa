//! Simulation driver module.
//!
//! A software motor for development and testing without physical
//! hardware. Position comes from integrating the commanded rate over time
//! and clamping against target and limits.

mod controller;
mod projection;

pub use controller::{SimulatedMotorController, SimulationDiagnostics};
pub use projection::{Projection, ProjectionInput, ProjectionPhase, ProjectionStop, project};
