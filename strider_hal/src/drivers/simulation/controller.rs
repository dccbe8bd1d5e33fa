//! Simulated motor controller.
//!
//! Reference [`MotorController`] with no hardware: position is projected
//! from the commanded rate and elapsed time, lazily on every position read
//! and eagerly on every [`periodic`](MotorController::periodic) tick, until
//! the current target completes.
//!
//! Rate selection per operation:
//!
//! | Operation                  | Rate                                        |
//! |----------------------------|---------------------------------------------|
//! | Disabled, Holding          | zero                                        |
//! | Absolute / relative move   | maximum rate toward the target              |
//! | Rate                       | target or default, clamped to `[min, max]`  |
//! | Calibration                | default, clamped to `[min, max]`            |

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use strider_common::motor::{
    ControllerCapabilities, Direction, LimitKind, LimitSwitchStatus, MotorCommand,
    MotorController, MotorError, MotorLimits, MotorReader, MotorSettings, MotorState, StateId,
};
use strider_common::uom::{Length, LengthUnit, Rate, RateUnit, Time};
use tracing::{debug, error, info, trace, warn};

use super::projection::{ProjectionInput, ProjectionPhase, ProjectionStop, project};
use crate::clock::Clock;

/// Counters kept by the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationDiagnostics {
    /// Projection steps computed.
    pub projections: u64,
    /// Moving commands that reached their target or a limit.
    pub completed_commands: u64,
    pub soft_limit_hits: u64,
    pub hard_limit_hits: u64,
    /// Simulated mechanical failures; should stay zero.
    pub physical_limit_hits: u64,
    pub encoder_resets: u64,
}

/// Mutable projection state, behind the controller's mutex.
#[derive(Debug)]
struct SimulationState {
    phase: ProjectionPhase,
    encoder_position: Length,
    /// Signed rate in effect, zero once the target completes.
    current_rate: Rate,
    transition_at: Duration,
    last_update: Option<Duration>,
    last_completed: Option<StateId>,
    /// Direction of a hard limit switch currently held closed.
    hard_contact: Option<Direction>,
    diagnostics: SimulationDiagnostics,
}

/// Inputs copied out of the lock for one projection.
struct PendingProjection {
    state: Arc<MotorState>,
    from: Length,
    since: Duration,
}

/// Software motor that integrates rate over time.
pub struct SimulatedMotorController {
    settings: MotorSettings,
    clock: Arc<dyn Clock>,
    state: Arc<MotorState>,
    sim: Mutex<SimulationState>,
}

impl SimulatedMotorController {
    /// Motor at position zero, disabled.
    pub fn new(settings: MotorSettings, clock: Arc<dyn Clock>) -> Self {
        let position = Length::zero(settings.length_unit.clone());
        let now = clock.now();
        let state = Arc::new(MotorState::new(MotorCommand::Disabled, position.clone()));
        let sim = SimulationState {
            phase: ProjectionPhase::Idle,
            encoder_position: position,
            current_rate: Rate::zero(settings.rate_unit.clone()),
            transition_at: now,
            last_update: None,
            last_completed: None,
            hard_contact: None,
            diagnostics: SimulationDiagnostics::default(),
        };
        info!(motor = %settings.name, "Simulated motor ready");
        Self {
            settings,
            clock,
            state,
            sim: Mutex::new(sim),
        }
    }

    pub fn settings(&self) -> &MotorSettings {
        &self.settings
    }

    pub fn diagnostics(&self) -> SimulationDiagnostics {
        self.project();
        self.lock().diagnostics
    }

    /// Whether the current target has completed.
    pub fn is_complete(&self) -> bool {
        self.project();
        self.lock().last_completed == Some(self.state.id())
    }

    fn lock(&self) -> MutexGuard<'_, SimulationState> {
        self.sim.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Direction of travel for `state` starting at `from`.
    fn direction_of_travel(state: &MotorState, from: &Length) -> Option<Direction> {
        match state.command() {
            MotorCommand::Disabled | MotorCommand::HoldingCurrentPosition => None,
            MotorCommand::MovingToAbsolutePosition { target }
            | MotorCommand::MovingToRelativePosition { target, .. } => {
                Direction::of((target - from).value())
            }
            MotorCommand::MovingInDirectionAtRate { direction, .. }
            | MotorCommand::CalibratingSensorInDirection { direction } => Some(*direction),
        }
    }

    /// Rate magnitude commanded by `state` in `direction`, in the
    /// controller's rate unit.
    fn commanded_rate(&self, state: &MotorState, direction: Direction) -> Rate {
        let rates = &self.settings.rates;
        let rate = match state.command() {
            MotorCommand::Disabled | MotorCommand::HoldingCurrentPosition => {
                return Rate::zero(self.settings.rate_unit.clone());
            }
            MotorCommand::MovingToAbsolutePosition { .. }
            | MotorCommand::MovingToRelativePosition { .. } => rates.max(direction).clone(),
            MotorCommand::MovingInDirectionAtRate { rate, .. } => {
                rates.clamp(direction, rate.as_ref().unwrap_or(&self.settings.default_rate))
            }
            MotorCommand::CalibratingSensorInDirection { .. } => {
                rates.clamp(direction, &self.settings.default_rate)
            }
        };
        rate.convert_to(&self.settings.rate_unit)
    }

    fn signed_rate(&self, state: &MotorState, from: &Length) -> Rate {
        match Self::direction_of_travel(state, from) {
            Some(direction) => self.commanded_rate(state, direction) * direction.sign(),
            None => Rate::zero(self.settings.rate_unit.clone()),
        }
    }

    /// Bring the encoder position up to now for the current target.
    ///
    /// Runs at most once at a time: a read that arrives while a projection
    /// is computing sees the last committed position.
    fn project(&self) {
        let Some(pending) = self.begin_projection() else {
            return;
        };
        let now = self.clock.now();
        let elapsed = Time::from_duration(now.saturating_sub(pending.since));
        let state = &pending.state;

        let (projection, rate) = match Self::direction_of_travel(state, &pending.from) {
            Some(direction) => {
                let rate = self.commanded_rate(state, direction);
                let projection = project(ProjectionInput {
                    from: &pending.from,
                    rate: &rate,
                    direction,
                    elapsed: &elapsed,
                    target: state.target_absolute_position(),
                    limits: &self.settings.limits,
                });
                (Some((projection, direction)), rate * direction.sign())
            }
            None => (None, Rate::zero(self.settings.rate_unit.clone())),
        };

        let mut sim = self.lock();
        sim.diagnostics.projections += 1;
        sim.last_update = Some(now);
        sim.phase = ProjectionPhase::Idle;

        let Some((projection, direction)) = projection else {
            // Idle operations, and moves that start on their target.
            sim.current_rate = rate;
            sim.last_completed = Some(state.id());
            if state.operation().is_moving() {
                sim.diagnostics.completed_commands += 1;
                info!(motor = %self.settings.name, state = %state, "Target reached");
            }
            return;
        };

        trace!(
            motor = %self.settings.name,
            from = %pending.from,
            to = %projection.position,
            elapsed = %elapsed,
            "Projected position"
        );
        sim.encoder_position = projection.position;
        sim.current_rate = rate;

        let Some(stop) = projection.stop else {
            return;
        };
        sim.current_rate = Rate::zero(self.settings.rate_unit.clone());
        sim.last_completed = Some(state.id());
        sim.diagnostics.completed_commands += 1;
        match stop {
            ProjectionStop::Target => {
                info!(motor = %self.settings.name, state = %state, "Target reached");
            }
            ProjectionStop::Limit(LimitKind::Soft) => {
                sim.diagnostics.soft_limit_hits += 1;
                warn!(motor = %self.settings.name, %direction, position = %sim.encoder_position, "Soft limit reached");
            }
            ProjectionStop::Limit(LimitKind::Hard) => {
                sim.diagnostics.hard_limit_hits += 1;
                sim.hard_contact = Some(direction);
                if projection.zero_encoder {
                    sim.diagnostics.encoder_resets += 1;
                }
                warn!(
                    motor = %self.settings.name,
                    %direction,
                    zeroed = projection.zero_encoder,
                    "Hard limit switch reached"
                );
            }
            ProjectionStop::Limit(LimitKind::Physical) => {
                sim.diagnostics.physical_limit_hits += 1;
                error!(
                    motor = %self.settings.name,
                    %direction,
                    position = %sim.encoder_position,
                    "Simulated mechanical failure: physical limit reached"
                );
            }
        }
    }

    /// Enter `Projecting` and snapshot the inputs, or `None` when nothing
    /// needs projecting or a projection is already running.
    fn begin_projection(&self) -> Option<PendingProjection> {
        let mut sim = self.lock();
        if sim.phase == ProjectionPhase::Projecting
            || sim.last_completed == Some(self.state.id())
        {
            return None;
        }
        sim.phase = ProjectionPhase::Projecting;
        Some(PendingProjection {
            state: Arc::clone(&self.state),
            from: sim.encoder_position.clone(),
            since: sim.last_update.unwrap_or(sim.transition_at),
        })
    }
}

impl MotorReader for SimulatedMotorController {
    fn current_position(&self) -> Length {
        self.project();
        self.lock().encoder_position.clone()
    }

    fn current_rate(&self) -> Rate {
        self.project();
        self.lock().current_rate.clone()
    }
}

impl MotorController for SimulatedMotorController {
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

    /// Commit the motion of the outgoing target, then start timing the new
    /// one. Rejects states carrying non-finite quantities.
    fn execute_transition(&mut self, state: &MotorState) -> bool {
        let finite = state.target_absolute_position().is_none_or(Length::is_finite)
            && state.target_rate().is_none_or(Rate::is_finite);
        if !finite {
            warn!(motor = %self.settings.name, state = %state, "Refusing non-finite target");
            return false;
        }

        self.project();
        let now = self.clock.now();
        let mut sim = self.lock();
        let rate = self.signed_rate(state, &sim.encoder_position);
        sim.transition_at = now;
        sim.last_update = None;
        sim.current_rate = rate;
        if sim.hard_contact.is_some() && state.operation().is_moving() {
            sim.hard_contact = None;
        }
        true
    }

    fn replace_state(&mut self, state: Arc<MotorState>) {
        self.state = state;
    }

    fn reset_encoder_position(&mut self, position: &Length) -> Result<(), MotorError> {
        if !position.is_finite() {
            return Err(MotorError::Driver(format!(
                "cannot reset encoder to {position}"
            )));
        }
        self.project();
        let now = self.clock.now();
        let mut sim = self.lock();
        sim.encoder_position = position.convert_to(&self.settings.length_unit);
        sim.last_update = Some(now);
        sim.diagnostics.encoder_resets += 1;
        debug!(motor = %self.settings.name, %position, "Encoder position reset");
        Ok(())
    }

    fn periodic(&mut self) {
        self.project();
    }

    /// A switch the motor stopped on stays closed after the encoder is
    /// zeroed, until a new motion starts.
    fn current_hard_limit_switch_status(&self, direction: Direction) -> LimitSwitchStatus {
        let position = self.current_position();
        let status = self.settings.limits.hard_limit_status(direction, &position);
        if status != LimitSwitchStatus::NotConfigured
            && self.lock().hard_contact == Some(direction)
        {
            return LimitSwitchStatus::Reached;
        }
        status
    }
}

static_assertions::assert_impl_all!(SimulatedMotorController: Send, Sync, MotorController);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use strider_common::motor::factory;

    fn motor() -> (SimulatedMotorController, ManualClock) {
        let clock = ManualClock::new();
        let settings = MotorSettings::new(
            "test",
            LengthUnit::INCHES,
            RateUnit::INCHES_PER_SECOND,
            RateUnit::INCHES_PER_SECOND.create(10.0),
        );
        (
            SimulatedMotorController::new(settings, Arc::new(clock.clone())),
            clock,
        )
    }

    #[test]
    fn test_disabled_does_not_move() {
        let (motor, clock) = motor();
        clock.advance(Duration::from_secs(3));
        assert!(motor.current_position().is_zero());
        assert!(motor.current_rate().is_zero());
        assert!(motor.is_complete());
    }

    #[test]
    fn test_rate_move_integrates() {
        let (mut motor, clock) = motor();
        let state = factory::moving_in_direction_at_rate(
            &motor,
            Direction::Reverse,
            Some(RateUnit::INCHES_PER_SECOND.create(4.0)),
        );
        motor.submit(state).unwrap();
        clock.advance(Duration::from_millis(500));
        assert_eq!(motor.current_position(), LengthUnit::INCHES.create(-2.0));
        assert_eq!(motor.current_rate(), RateUnit::INCHES_PER_SECOND.create(-4.0));
        assert!(!motor.is_complete());
    }

    #[test]
    fn test_rate_is_clamped_to_maximum() {
        let (mut motor, clock) = motor();
        let state = factory::moving_in_direction_at_rate(
            &motor,
            Direction::Forward,
            Some(RateUnit::INCHES_PER_SECOND.create(100.0)),
        );
        motor.submit(state).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(motor.current_position(), LengthUnit::INCHES.create(10.0));
    }

    #[test]
    fn test_lazy_and_periodic_projection_agree() {
        let (mut lazy, lazy_clock) = motor();
        let (mut eager, eager_clock) = motor();
        for m in [&mut lazy, &mut eager] {
            let state = factory::moving_to_absolute_position(&*m, LengthUnit::INCHES.create(50.0));
            m.submit(state).unwrap();
        }
        for _ in 0..100 {
            eager_clock.advance(Duration::from_millis(20));
            eager.periodic();
        }
        lazy_clock.advance(Duration::from_secs(2));
        assert_eq!(lazy.current_position(), eager.current_position());
        assert_eq!(lazy.current_position(), LengthUnit::INCHES.create(20.0));
    }

    #[test]
    fn test_new_transition_commits_previous_motion() {
        let (mut motor, clock) = motor();
        let forward = factory::moving_in_direction_at_rate(&motor, Direction::Forward, None);
        motor.submit(forward).unwrap();
        clock.advance(Duration::from_secs(1));
        let hold = factory::holding_current_position(&motor);
        assert_eq!(hold.starting_position(), &LengthUnit::INCHES.create(10.0));
        motor.submit(hold).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(motor.current_position(), LengthUnit::INCHES.create(10.0));
        assert!(motor.current_rate().is_zero());
    }

    #[test]
    fn test_reset_encoder_position() {
        let (mut motor, _clock) = motor();
        motor
            .reset_encoder_position(&LengthUnit::FEET.create(1.0))
            .unwrap();
        let position = motor.current_position();
        assert_eq!(position.unit(), &LengthUnit::INCHES);
        assert_eq!(position, LengthUnit::INCHES.create(12.0));
        assert_eq!(motor.diagnostics().encoder_resets, 1);
        assert!(motor
            .reset_encoder_position(&LengthUnit::INCHES.create(f64::NAN))
            .is_err());
    }

    #[test]
    fn test_rejects_non_finite_target() {
        let (mut motor, _clock) = motor();
        let state = factory::moving_to_absolute_position(&motor, LengthUnit::INCHES.create(f64::INFINITY));
        let err = motor.submit(state).unwrap_err();
        assert!(matches!(err, MotorError::TransitionRejected { .. }));
        assert_eq!(
            motor.current_state().operation(),
            strider_common::motor::MotorOperation::Disabled
        );
    }

    #[test]
    fn test_projecting_phase_blocks_recursion() {
        let (motor, _clock) = motor();
        motor.lock().phase = ProjectionPhase::Projecting;
        assert!(motor.begin_projection().is_none());
        motor.lock().phase = ProjectionPhase::Idle;
    }
}
