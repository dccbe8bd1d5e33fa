//! Motor controller implementations without hardware.
//!
//! - [`simulation`] - Software simulated motor for development and testing

pub mod simulation;
