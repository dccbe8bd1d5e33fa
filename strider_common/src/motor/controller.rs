//! Motor controller contract.
//!
//! [`MotorReader`] is the read side (position and rate), used by target
//! states to compute live error. [`MotorController`] adds ownership of the
//! current target state and the write side.
//!
//! # Submission
//!
//! | Step | Action                                              | Failure                        |
//! |------|-----------------------------------------------------|--------------------------------|
//! | 1    | Check the operation against the capabilities        | `UnsupportedOperation`         |
//! | 2    | Re-express the state in the controller's units      | none (typed conversion)        |
//! | 3    | `execute_transition`                                | `TransitionRejected`           |
//! | 4    | Install the converted state as the current target   | none                           |
//!
//! A failure at any step leaves the previous target in effect.

use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, warn};

use super::{Direction, LimitSwitchStatus, MotorError, MotorLimits, MotorOperation, MotorState};
use crate::uom::{Length, LengthUnit, Rate, RateUnit};

/// Read access to a motor's live position and rate.
pub trait MotorReader {
    /// Current absolute position, in the controller's length unit.
    fn current_position(&self) -> Length;

    /// Current signed rate, in the controller's rate unit.
    fn current_rate(&self) -> Rate;
}

bitflags! {
    /// What a concrete controller is able to do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControllerCapabilities: u16 {
        /// Closed-loop absolute positioning (also required for holding).
        const ABSOLUTE_POSITION  = 0x0001;
        /// Closed-loop relative positioning.
        const RELATIVE_POSITION  = 0x0002;
        /// Open-ended rate control.
        const RATE               = 0x0004;
        /// Sensor calibration against a limit switch.
        const CALIBRATION        = 0x0008;
        const FORWARD_SOFT_LIMIT = 0x0010;
        const REVERSE_SOFT_LIMIT = 0x0020;
        const FORWARD_HARD_LIMIT = 0x0040;
        const REVERSE_HARD_LIMIT = 0x0080;
        /// Sensor is wired backwards and can be corrected.
        const SENSOR_INVERSION   = 0x0100;
        /// Motor phase is wired backwards and can be corrected.
        const MOTOR_INVERSION    = 0x0200;
    }
}

impl ControllerCapabilities {
    /// Whether a state with this operation may be submitted.
    ///
    /// `Disabled` is always supported.
    pub fn supports(&self, operation: MotorOperation) -> bool {
        match operation {
            MotorOperation::Disabled => true,
            MotorOperation::HoldingCurrentPosition | MotorOperation::MovingToAbsolutePosition => {
                self.contains(Self::ABSOLUTE_POSITION)
            }
            MotorOperation::MovingToRelativePosition => self.contains(Self::RELATIVE_POSITION),
            MotorOperation::MovingInDirectionAtRate => self.contains(Self::RATE),
            MotorOperation::CalibratingSensorInDirection => self.contains(Self::CALIBRATION),
        }
    }

    /// Parse capability names (`"rate"`, `"FORWARD_SOFT_LIMIT"`, ...),
    /// case-insensitively.
    ///
    /// Returns the first unknown name as the error.
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut caps = Self::empty();
        for name in names {
            let name = name.as_ref().trim();
            let flag = Self::all()
                .iter_names()
                .find(|(known, _)| known.eq_ignore_ascii_case(name))
                .map(|(_, flag)| flag)
                .ok_or_else(|| name.to_string())?;
            caps |= flag;
        }
        Ok(caps)
    }
}

impl Default for ControllerCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Closed-loop gain profile selected for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClosedLoopProfile {
    /// Stiff gains for holding position against load.
    Holding = 0,
    /// Gains for tracking a moving setpoint.
    Moving = 1,
}

impl ClosedLoopProfile {
    /// `None` for `Disabled`: the output is switched off.
    pub const fn for_operation(operation: MotorOperation) -> Option<Self> {
        match operation {
            MotorOperation::Disabled => None,
            MotorOperation::HoldingCurrentPosition => Some(Self::Holding),
            MotorOperation::MovingToAbsolutePosition
            | MotorOperation::MovingToRelativePosition
            | MotorOperation::MovingInDirectionAtRate
            | MotorOperation::CalibratingSensorInDirection => Some(Self::Moving),
        }
    }
}

/// A motor that accepts target states.
///
/// Writes (`submit`, `reset_encoder_position`, `periodic`) take `&mut self`:
/// one writer per motor. Reads take `&self` and may run on other threads.
pub trait MotorController: MotorReader + Send + Sync {
    /// Identifier used in logs and errors.
    fn name(&self) -> &str;

    fn capabilities(&self) -> ControllerCapabilities;

    /// Length unit in which this controller reports positions.
    fn length_unit(&self) -> &LengthUnit;

    /// Rate unit in which this controller reports rates.
    fn rate_unit(&self) -> &RateUnit;

    fn limits(&self) -> &MotorLimits;

    /// Current target state.
    fn current_state(&self) -> Arc<MotorState>;

    /// Issue the low-level command for `state`, already expressed in this
    /// controller's units. Returns whether it was accepted.
    fn execute_transition(&mut self, state: &MotorState) -> bool;

    /// Install `state` as the current target. Called by [`submit`] only
    /// after [`execute_transition`] accepted it.
    ///
    /// [`submit`]: MotorController::submit
    /// [`execute_transition`]: MotorController::execute_transition
    fn replace_state(&mut self, state: Arc<MotorState>);

    /// Declare the motor to be at `position` (sensor calibration).
    fn reset_encoder_position(&mut self, position: &Length) -> Result<(), MotorError>;

    /// Periodic housekeeping, called once per host tick.
    fn periodic(&mut self);

    /// Status of the hard limit switch in `direction`.
    fn current_hard_limit_switch_status(&self, direction: Direction) -> LimitSwitchStatus {
        self.limits()
            .hard_limit_status(direction, &self.current_position())
    }

    fn current_soft_limit_switch_status(&self, direction: Direction) -> LimitSwitchStatus {
        self.limits()
            .soft_limit_status(direction, &self.current_position())
    }

    /// Validate, convert, execute and install `state`.
    ///
    /// # Errors
    ///
    /// - `MotorError::UnsupportedOperation` if the operation needs a
    ///   capability this controller lacks; nothing is written.
    /// - `MotorError::TransitionRejected` if `execute_transition` returned
    ///   `false`; the previous target stays current.
    fn submit(&mut self, state: MotorState) -> Result<Arc<MotorState>, MotorError> {
        let operation = state.operation();
        if !self.capabilities().supports(operation) {
            return Err(MotorError::UnsupportedOperation {
                motor: self.name().to_string(),
                operation,
            });
        }

        let converted = Arc::new(state.convert_to(self.length_unit(), self.rate_unit(), false));

        if !self.execute_transition(&converted) {
            warn!(motor = self.name(), %operation, "Transition rejected");
            return Err(MotorError::TransitionRejected {
                motor: self.name().to_string(),
                operation,
            });
        }

        debug!(motor = self.name(), state = %converted, "Transition accepted");
        self.replace_state(Arc::clone(&converted));
        Ok(converted)
    }

    fn current_position_error(&self) -> Length {
        self.current_state().current_position_error(self)
    }

    fn current_position_error_within(&self, margin: &Length) -> bool {
        self.current_state()
            .current_position_error_within(self, margin)
    }

    fn current_rate_error(&self) -> Rate {
        self.current_state().current_rate_error(self)
    }

    fn current_rate_error_within(&self, margin: &Rate) -> bool {
        self.current_state().current_rate_error_within(self, margin)
    }
}
