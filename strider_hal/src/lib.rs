//! # STRIDER HAL Library
//!
//! Motor controllers implementing the `MotorController` contract from
//! `strider_common::motor`.
//!
//! # Module Structure
//!
//! - [`clock`] - Time sources (`SystemClock`, `ManualClock`)
//! - [`driver`] - Outbound `MotorDriver` trait for register-level drivers
//! - [`hardware`] - Controller backed by a `MotorDriver`
//! - [`drivers`] - Controllers without hardware (simulation)
//! - [`scenario`] - Scripted simulation runs (used by `strider_sim`)
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        strider_hal                             │
//! │   caller ──submit──►  MotorController (trait, strider_common)  │
//! │                          │                     │               │
//! │                          ▼                     ▼               │
//! │          HardwareMotorController   SimulatedMotorController    │
//! │                          │                     │               │
//! │                          ▼                     ▼               │
//! │                   MotorDriver (trait)     projection + Clock   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod driver;
pub mod drivers;
pub mod hardware;
pub mod scenario;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::driver::{ControlMode, DriverError, MotorDriver};
pub use crate::drivers::simulation::{SimulatedMotorController, SimulationDiagnostics};
pub use crate::hardware::HardwareMotorController;
