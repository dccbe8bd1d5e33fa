//! Prelude module for common re-exports.
//!
//! ```rust
//! use strider_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::motor::{MotorConfig, MotorSettings};

// ─── Units of Measure ───────────────────────────────────────────────
pub use crate::uom::{
    Dimension, Length, LengthUnit, Quantity, Rate, RateUnit, Time, TimeUnit, UnitRegistry,
    UomError,
};

// ─── Motor ──────────────────────────────────────────────────────────
pub use crate::motor::factory;
pub use crate::motor::{
    ClosedLoopProfile, ControllerCapabilities, Direction, LimitSwitchStatus, MotorCommand,
    MotorController, MotorError, MotorLimits, MotorOperation, MotorReader, MotorState, StateId,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::DEFAULT_PERIODIC_TICK;
