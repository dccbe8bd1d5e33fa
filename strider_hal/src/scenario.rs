//! Scripted simulation runs.
//!
//! A scenario is a TOML file naming one motor, a tick, a duration and a
//! list of timed commands. The runner drives a [`SimulatedMotorController`]
//! on a [`ManualClock`], so a run is deterministic and takes no wall-clock
//! time unless the caller paces it. Samples are taken on the tick grid;
//! steps apply at their own `at`, between ticks if need be.
//!
//! ```toml
//! tick = "20 ms"
//! duration = "6 s"
//!
//! [shared]
//! service_name = "elevator-sim"
//!
//! [motor]
//! name = "elevator"
//! default_rate = "10 in/s"
//!
//! [[steps]]
//! at = "0 s"
//! command = "absolute"
//! target = "50 in"
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strider_common::config::{ConfigError, SharedConfig};
use strider_common::consts::DEFAULT_PERIODIC_TICK;
use strider_common::motor::{
    Direction, MotorConfig, MotorController, MotorError, MotorReader, MotorState, factory,
};
use strider_common::uom::{Length, Rate, Time, UnitRegistry};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{Clock, ManualClock};
use crate::drivers::simulation::{SimulatedMotorController, SimulationDiagnostics};

/// Error type for scenario loading and execution.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Motor(#[from] MotorError),
}

fn default_tick() -> String {
    format!("{} ms", DEFAULT_PERIODIC_TICK.as_millis())
}

/// Scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub shared: SharedConfig,

    pub motor: MotorConfig,

    /// Simulated time between periodic ticks.
    #[serde(default = "default_tick")]
    pub tick: String,

    /// Total simulated time.
    pub duration: String,

    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

/// `[[steps]]` entry: what to do and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// Simulated time at which the command is submitted.
    pub at: String,

    #[serde(flatten)]
    pub command: StepCommand,
}

/// Command of a step, tagged by `command = "..."`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum StepCommand {
    Disable,
    Hold,
    Absolute {
        target: String,
    },
    Relative {
        direction: Direction,
        distance: String,
    },
    Rate {
        direction: Direction,
        #[serde(default)]
        rate: Option<String>,
    },
    Calibrate {
        direction: Direction,
    },
    /// Declare the current position (encoder reset).
    Reset {
        position: String,
    },
}

/// A step with its quantities resolved.
#[derive(Debug, Clone)]
enum Action {
    Disable,
    Hold,
    Absolute(Length),
    Relative(Direction, Length),
    Rate(Direction, Option<Rate>),
    Calibrate(Direction),
    Reset(Length),
}

#[derive(Debug, Clone)]
struct TimedAction {
    at: Duration,
    action: Action,
}

/// State of the motor after one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickSample {
    pub at_s: f64,
    pub position: f64,
    pub rate: f64,
    pub state: String,
    pub complete: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub service_name: String,
    pub motor: String,
    pub elapsed_s: f64,
    pub final_position: f64,
    pub length_unit: String,
    pub final_rate: f64,
    pub rate_unit: String,
    pub final_state: String,
    pub completed: bool,
    pub steps_applied: usize,
    pub steps_rejected: usize,
    /// Stopped before `duration` by the tick callback.
    pub interrupted: bool,
    pub diagnostics: SimulationDiagnostics,
}

impl ScenarioReport {
    /// A run is healthy if the motor never hit a physical limit.
    pub fn is_healthy(&self) -> bool {
        self.diagnostics.physical_limit_hits == 0
    }
}

fn time_field(registry: &UnitRegistry, key: &str, text: &str) -> Result<Duration, ConfigError> {
    let time: Time = registry
        .parse_time(text)
        .map_err(|e| ConfigError::ValidationError(format!("{key}: {e}")))?;
    time.as_duration()
        .ok_or_else(|| ConfigError::ValidationError(format!("{key}: {text} is not a valid duration")))
}

fn length_field(registry: &UnitRegistry, key: &str, text: &str) -> Result<Length, ConfigError> {
    registry
        .parse_length(text)
        .map_err(|e| ConfigError::ValidationError(format!("{key}: {e}")))
}

impl ScenarioConfig {
    /// Check the shared table, the motor and every step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.motor.resolve()?;
        self.timeline()?;
        Ok(())
    }

    /// Tick, duration and steps resolved and sorted by time.
    fn timeline(&self) -> Result<(Duration, Duration, Vec<TimedAction>), ConfigError> {
        let registry = self.motor.registry()?;
        let tick = time_field(&registry, "tick", &self.tick)?;
        if tick.is_zero() {
            return Err(ConfigError::ValidationError("tick must be positive".to_string()));
        }
        let duration = time_field(&registry, "duration", &self.duration)?;

        let mut actions = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let key = format!("steps[{i}]");
                let at = time_field(&registry, &format!("{key}.at"), &step.at)?;
                let action = match &step.command {
                    StepCommand::Disable => Action::Disable,
                    StepCommand::Hold => Action::Hold,
                    StepCommand::Absolute { target } => {
                        Action::Absolute(length_field(&registry, &format!("{key}.target"), target)?)
                    }
                    StepCommand::Relative {
                        direction,
                        distance,
                    } => Action::Relative(
                        *direction,
                        length_field(&registry, &format!("{key}.distance"), distance)?,
                    ),
                    StepCommand::Rate { direction, rate } => {
                        let rate = rate
                            .as_deref()
                            .map(|text| registry.parse_rate(text))
                            .transpose()
                            .map_err(|e| ConfigError::ValidationError(format!("{key}.rate: {e}")))?;
                        Action::Rate(*direction, rate)
                    }
                    StepCommand::Calibrate { direction } => Action::Calibrate(*direction),
                    StepCommand::Reset { position } => {
                        Action::Reset(length_field(&registry, &format!("{key}.position"), position)?)
                    }
                };
                Ok(TimedAction { at, action })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        actions.sort_by_key(|a| a.at);
        Ok((tick, duration, actions))
    }
}

/// Progress through the sorted step list.
#[derive(Debug, Default)]
struct StepTally {
    next: usize,
    applied: usize,
    rejected: usize,
}

/// Drives one simulated motor through a scenario.
pub struct ScenarioRunner {
    service_name: String,
    controller: SimulatedMotorController,
    clock: ManualClock,
    tick: Duration,
    duration: Duration,
    actions: Vec<TimedAction>,
}

impl ScenarioRunner {
    /// Resolve the scenario and build its motor.
    ///
    /// # Errors
    ///
    /// `ScenarioError::Config` if the scenario or its motor is invalid.
    pub fn new(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
        config.shared.validate()?;
        let settings = config.motor.resolve()?;
        let (tick, duration, actions) = config.timeline()?;
        let clock = ManualClock::new();
        let controller = SimulatedMotorController::new(settings, Arc::new(clock.clone()));
        Ok(Self {
            service_name: config.shared.service_name.clone(),
            controller,
            clock,
            tick,
            duration,
            actions,
        })
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn controller(&self) -> &SimulatedMotorController {
        &self.controller
    }

    /// Run to the end of the scenario.
    pub fn run(&mut self) -> ScenarioReport {
        self.run_with(|_| true)
    }

    /// Run, calling `on_tick` after every tick; returning `false` from it
    /// stops the run early.
    pub fn run_with<F>(&mut self, mut on_tick: F) -> ScenarioReport
    where
        F: FnMut(&TickSample) -> bool,
    {
        info!(
            scenario = %self.service_name,
            motor = self.controller.name(),
            steps = self.actions.len(),
            "Scenario starting"
        );
        let mut tally = StepTally::default();
        let mut interrupted = false;

        loop {
            let now = self.clock.now();
            self.apply_due(&mut tally, now);

            self.controller.periodic();
            let sample = self.sample(now);
            debug!(
                at_s = sample.at_s,
                position = sample.position,
                rate = sample.rate,
                state = %sample.state,
                "Tick"
            );
            if !on_tick(&sample) {
                interrupted = true;
                break;
            }
            if now >= self.duration {
                break;
            }
            let next_tick = now + self.tick.min(self.duration - now);
            self.apply_due(&mut tally, next_tick);
            self.clock.set(next_tick);
        }

        let report = self.report(tally.applied, tally.rejected, interrupted);
        info!(
            scenario = %report.service_name,
            position = report.final_position,
            completed = report.completed,
            "Scenario finished"
        );
        report
    }

    /// Apply every step due at or before `until`, each with the clock set
    /// to its own time rather than the next tick.
    fn apply_due(&mut self, tally: &mut StepTally, until: Duration) {
        while let Some(step) = self.actions.get(tally.next).filter(|s| s.at <= until) {
            let (at, action) = (step.at, step.action.clone());
            tally.next += 1;
            self.clock.set(at);
            match self.apply(action) {
                Ok(()) => tally.applied += 1,
                Err(e) => {
                    tally.rejected += 1;
                    warn!(at_s = at.as_secs_f64(), error = %e, "Scenario step rejected");
                }
            }
        }
    }

    fn apply(&mut self, action: Action) -> Result<(), MotorError> {
        let motor = &self.controller;
        let state: MotorState = match action {
            Action::Disable => factory::disabled(motor),
            Action::Hold => factory::holding_current_position(motor),
            Action::Absolute(target) => factory::moving_to_absolute_position(motor, target),
            Action::Relative(direction, distance) => {
                factory::moving_to_relative_position(motor, direction, distance)
            }
            Action::Rate(direction, rate) => {
                factory::moving_in_direction_at_rate(motor, direction, rate)
            }
            Action::Calibrate(direction) => factory::calibrating_sensor_in_direction(motor, direction),
            Action::Reset(position) => {
                return self.controller.reset_encoder_position(&position);
            }
        };
        self.controller.submit(state).map(|_| ())
    }

    fn sample(&self, now: Duration) -> TickSample {
        TickSample {
            at_s: now.as_secs_f64(),
            position: self.controller.current_position().value(),
            rate: self.controller.current_rate().value(),
            state: self.controller.current_state().to_string(),
            complete: self.controller.is_complete(),
        }
    }

    fn report(&self, applied: usize, rejected: usize, interrupted: bool) -> ScenarioReport {
        let position = self.controller.current_position();
        let rate = self.controller.current_rate();
        ScenarioReport {
            service_name: self.service_name.clone(),
            motor: self.controller.name().to_string(),
            elapsed_s: self.clock.now().as_secs_f64(),
            final_position: position.value(),
            length_unit: position.unit().to_string(),
            final_rate: rate.value(),
            rate_unit: rate.unit().to_string(),
            final_state: self.controller.current_state().to_string(),
            completed: self.controller.is_complete(),
            steps_applied: applied,
            steps_rejected: rejected,
            interrupted,
            diagnostics: self.controller.diagnostics(),
        }
    }
}
