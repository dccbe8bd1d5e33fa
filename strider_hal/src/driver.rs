//! Outbound motor driver trait and error types.
//!
//! A [`MotorDriver`] is the register-level side of a motor controller (a CAN
//! motor controller, a PWM channel with an encoder). It speaks raw numbers
//! in the sensor's native units; [`HardwareMotorController`] does the unit
//! conversion, inversion and caching on top of it.
//!
//! | Raw value        | Unit                                  |
//! |------------------|---------------------------------------|
//! | position         | sensor unit (e.g. encoder pulses)     |
//! | rate             | sensor unit per second                |
//! | position setpoint| sensor unit                           |
//! | velocity setpoint| sensor unit per second                |
//!
//! [`HardwareMotorController`]: crate::hardware::HardwareMotorController

use strider_common::motor::{ClosedLoopProfile, Direction, MotorOperation};
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// Bus or device did not answer.
    #[error("Driver communication error: {0}")]
    Communication(String),

    /// Device answered but refused the command.
    #[error("Driver rejected command: {0}")]
    Rejected(String),
}

/// Low-level control mode of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlMode {
    /// Output off.
    Disabled = 0,
    /// Closed-loop position; the value is a position setpoint.
    Position = 1,
    /// Closed-loop velocity; the value is a signed velocity setpoint.
    Velocity = 2,
}

impl ControlMode {
    pub const fn for_operation(operation: MotorOperation) -> Self {
        match operation {
            MotorOperation::Disabled => Self::Disabled,
            MotorOperation::HoldingCurrentPosition
            | MotorOperation::MovingToAbsolutePosition
            | MotorOperation::MovingToRelativePosition => Self::Position,
            MotorOperation::MovingInDirectionAtRate
            | MotorOperation::CalibratingSensorInDirection => Self::Velocity,
        }
    }
}

/// Trait defining the interface for motor drivers.
///
/// Reads take `&self` so a controller can serve concurrent readers; writes
/// take `&mut self`.
pub trait MotorDriver: Send + Sync {
    /// Driver identifier (e.g. "can:12").
    fn name(&self) -> &str;

    /// Switch the device to `mode` with the given gain profile and setpoint.
    ///
    /// `profile` is `None` only for `ControlMode::Disabled`.
    fn execute_transition(
        &mut self,
        profile: Option<ClosedLoopProfile>,
        mode: ControlMode,
        value: f64,
    ) -> Result<(), DriverError>;

    fn read_raw_sensor_position(&self) -> Result<f64, DriverError>;

    fn read_raw_sensor_rate(&self) -> Result<f64, DriverError>;

    /// `true` while the limit switch in `direction` is closed.
    fn read_raw_limit_switch(&self, direction: Direction) -> Result<bool, DriverError>;

    /// Overwrite the sensor's position register.
    fn set_raw_sensor_position(&mut self, value: f64) -> Result<(), DriverError>;
}
