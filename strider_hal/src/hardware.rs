//! Motor controller backed by a [`MotorDriver`].
//!
//! Converts between the controller's units and the sensor's native unit,
//! applies sensor and motor inversion, and keeps the last good reading so
//! a failed driver read never surfaces as a torn value.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strider_common::motor::{
    ClosedLoopProfile, ControllerCapabilities, Direction, LimitSwitchStatus, MotorCommand,
    MotorController, MotorError, MotorLimits, MotorOperation, MotorReader, MotorSettings,
    MotorState,
};
use strider_common::uom::{Length, LengthUnit, Rate, RateUnit, TimeUnit};
use tracing::{debug, info, warn};

use crate::driver::{ControlMode, MotorDriver};

/// Last good readings, served when the driver fails.
#[derive(Debug, Clone)]
struct Readings {
    position: Length,
    rate: Rate,
}

/// [`MotorController`] on top of a register-level driver.
pub struct HardwareMotorController<D: MotorDriver> {
    settings: MotorSettings,
    /// Sensor unit per second, the driver's native rate unit.
    sensor_rate_unit: RateUnit,
    driver: D,
    state: Arc<MotorState>,
    readings: Mutex<Readings>,
}

impl<D: MotorDriver> HardwareMotorController<D> {
    /// Wrap `driver`. The initial target is `Disabled`, starting from
    /// whatever the sensor reports (zero if it cannot be read).
    ///
    /// # Errors
    ///
    /// `MotorError::Uom` if the sensor unit cannot form a rate unit.
    pub fn new(settings: MotorSettings, driver: D) -> Result<Self, MotorError> {
        let sensor_rate_unit = RateUnit::per(&settings.sensor_unit, &TimeUnit::SECONDS)?;
        let readings = Readings {
            position: Length::zero(settings.length_unit.clone()),
            rate: Rate::zero(settings.rate_unit.clone()),
        };
        let initial = MotorState::new(MotorCommand::Disabled, readings.position.clone());
        let mut controller = Self {
            settings,
            sensor_rate_unit,
            driver,
            state: Arc::new(initial),
            readings: Mutex::new(readings),
        };
        let position = controller.current_position();
        controller.state = Arc::new(MotorState::new(MotorCommand::Disabled, position));
        info!(
            motor = %controller.settings.name,
            driver = controller.driver.name(),
            "Hardware motor ready"
        );
        Ok(controller)
    }

    pub fn settings(&self) -> &MotorSettings {
        &self.settings
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn readings(&self) -> MutexGuard<'_, Readings> {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sensor_sign(&self) -> f64 {
        if self.settings.sensor_inverted { -1.0 } else { 1.0 }
    }

    fn to_raw_position(&self, position: &Length) -> f64 {
        position.value_in(&self.settings.sensor_unit) * self.sensor_sign()
    }

    fn from_raw_position(&self, raw: f64) -> Length {
        Length::new(raw * self.sensor_sign(), self.settings.sensor_unit.clone())
            .convert_to(&self.settings.length_unit)
    }

    /// Raw setpoint for `state`, in the driver's frame.
    fn setpoint(&self, state: &MotorState) -> f64 {
        match state.command() {
            MotorCommand::Disabled => 0.0,
            MotorCommand::HoldingCurrentPosition => self.to_raw_position(&self.current_position()),
            MotorCommand::MovingToAbsolutePosition { target }
            | MotorCommand::MovingToRelativePosition { target, .. } => self.to_raw_position(target),
            MotorCommand::MovingInDirectionAtRate { .. }
            | MotorCommand::CalibratingSensorInDirection { .. } => {
                let Some(direction) = state.target_direction() else {
                    return 0.0;
                };
                let requested = state.target_rate().unwrap_or(&self.settings.default_rate);
                let magnitude = self.settings.rates.clamp(direction, requested);
                // Motor phase correction flips the commanded direction.
                let driven = if self.settings.motor_inverted {
                    direction.inverse()
                } else {
                    direction
                };
                magnitude.value_in(&self.sensor_rate_unit) * driven.sign() * self.sensor_sign()
            }
        }
    }

    /// Zero the sensor at the limit switch and hold there.
    fn finish_calibration(&mut self, direction: Direction) {
        let zero_at = match self.settings.limits.in_direction(direction).hard_position() {
            Some(limit) if !self.settings.limits.in_direction(direction).hard_resets_encoder() => {
                limit.clone()
            }
            _ => Length::zero(self.settings.length_unit.clone()),
        };
        if let Err(e) = self.reset_encoder_position(&zero_at) {
            warn!(motor = %self.settings.name, error = %e, "Calibration reset failed");
            return;
        }
        let command = if self.settings.capabilities.supports(MotorOperation::HoldingCurrentPosition) {
            MotorCommand::HoldingCurrentPosition
        } else {
            MotorCommand::Disabled
        };
        let hold = MotorState::new(command, zero_at.clone());
        if self.execute_transition(&hold) {
            self.replace_state(Arc::new(hold));
            info!(motor = %self.settings.name, %direction, position = %zero_at, "Sensor calibrated");
        }
    }
}

impl<D: MotorDriver> MotorReader for HardwareMotorController<D> {
    fn current_position(&self) -> Length {
        match self.driver.read_raw_sensor_position() {
            Ok(raw) if raw.is_finite() => {
                let position = self.from_raw_position(raw);
                self.readings().position = position.clone();
                position
            }
            Ok(raw) => {
                warn!(motor = %self.settings.name, raw, "Non-finite sensor position, using last good value");
                self.readings().position.clone()
            }
            Err(e) => {
                warn!(motor = %self.settings.name, error = %e, "Sensor position read failed, using last good value");
                self.readings().position.clone()
            }
        }
    }

    fn current_rate(&self) -> Rate {
        match self.driver.read_raw_sensor_rate() {
            Ok(raw) if raw.is_finite() => {
                let rate = Rate::new(raw * self.sensor_sign(), self.sensor_rate_unit.clone())
                    .convert_to(&self.settings.rate_unit);
                self.readings().rate = rate.clone();
                rate
            }
            Ok(_) | Err(_) => {
                warn!(motor = %self.settings.name, "Sensor rate read failed, using last good value");
                self.readings().rate.clone()
            }
        }
    }
}

impl<D: MotorDriver> MotorController for HardwareMotorController<D> {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capabilities(&self) -> ControllerCapabilities {
        self.settings.capabilities
    }

    fn length_unit(&self) -> &LengthUnit {
        &self.settings.length_unit
    }

    fn rate_unit(&self) -> &RateUnit {
        &self.settings.rate_unit
    }

    fn limits(&self) -> &MotorLimits {
        &self.settings.limits
    }

    fn current_state(&self) -> Arc<MotorState> {
        Arc::clone(&self.state)
    }

    fn execute_transition(&mut self, state: &MotorState) -> bool {
        let operation = state.operation();
        let profile = ClosedLoopProfile::for_operation(operation);
        let mode = ControlMode::for_operation(operation);
        let value = self.setpoint(state);
        if !value.is_finite() {
            warn!(motor = %self.settings.name, %operation, value, "Refusing non-finite setpoint");
            return false;
        }

        match self.driver.execute_transition(profile, mode, value) {
            Ok(()) => {
                debug!(motor = %self.settings.name, %operation, ?mode, value, "Driver transition issued");
                true
            }
            Err(e) => {
                warn!(motor = %self.settings.name, %operation, error = %e, "Driver refused transition");
                false
            }
        }
    }

    fn replace_state(&mut self, state: Arc<MotorState>) {
        self.state = state;
    }

    fn reset_encoder_position(&mut self, position: &Length) -> Result<(), MotorError> {
        let raw = self.to_raw_position(position);
        self.driver
            .set_raw_sensor_position(raw)
            .map_err(|e| MotorError::Driver(e.to_string()))?;
        self.readings().position = position.convert_to(&self.settings.length_unit);
        debug!(motor = %self.settings.name, %position, raw, "Encoder position reset");
        Ok(())
    }

    /// Refresh readings and finish a calibration once its switch closes.
    fn periodic(&mut self) {
        let _ = self.current_position();
        let _ = self.current_rate();
        if self.state.operation() != MotorOperation::CalibratingSensorInDirection {
            return;
        }
        let Some(direction) = self.state.target_direction() else {
            return;
        };
        if self.current_hard_limit_switch_status(direction).is_triggered() {
            self.finish_calibration(direction);
        }
    }

    /// Reads the physical switch; falls back to the position-derived status
    /// when the switch cannot be read.
    fn current_hard_limit_switch_status(&self, direction: Direction) -> LimitSwitchStatus {
        if self.settings.limits.in_direction(direction).hard.is_none() {
            return LimitSwitchStatus::NotConfigured;
        }
        match self.driver.read_raw_limit_switch(direction) {
            Ok(true) => LimitSwitchStatus::Reached,
            Ok(false) => LimitSwitchStatus::Clear,
            Err(e) => {
                warn!(motor = %self.settings.name, %direction, error = %e, "Limit switch read failed");
                self.settings
                    .limits
                    .hard_limit_status(direction, &self.current_position())
            }
        }
    }
}
