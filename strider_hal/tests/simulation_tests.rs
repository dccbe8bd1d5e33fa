//! Simulated motor tests.
//!
//! Limit priority, hard-limit encoder zeroing, and end-to-end position
//! moves driven by a periodic tick on a manual clock.

use std::sync::Arc;
use std::time::Duration;

use strider_common::config::ConfigLoader;
use strider_common::motor::{
    ControllerCapabilities, Direction, DirectionalLimits, HardLimit, LimitSwitchStatus,
    MotorController, MotorError, MotorLimits, MotorOperation, MotorReader, MotorSettings,
    RateLimits, factory,
};
use strider_common::uom::{Length, LengthUnit, RateUnit};
use strider_hal::scenario::{ScenarioConfig, ScenarioRunner};
use strider_hal::{ManualClock, SimulatedMotorController};

fn inches(v: f64) -> Length {
    LengthUnit::INCHES.create(v)
}

fn settings() -> MotorSettings {
    MotorSettings::new(
        "elevator",
        LengthUnit::INCHES,
        RateUnit::INCHES_PER_SECOND,
        RateUnit::INCHES_PER_SECOND.create(10.0),
    )
}

fn forward_limits(soft: Option<f64>, hard: Option<(f64, bool)>, physical: f64) -> MotorLimits {
    MotorLimits::new(
        DirectionalLimits {
            soft: soft.map(inches),
            hard: hard.map(|(position, resets_encoder)| HardLimit {
                position: inches(position),
                resets_encoder,
            }),
            physical: inches(physical),
        },
        DirectionalLimits::unbounded(Direction::Reverse, LengthUnit::INCHES),
    )
}

fn motor(settings: MotorSettings) -> (SimulatedMotorController, ManualClock) {
    let clock = ManualClock::new();
    let motor = SimulatedMotorController::new(settings, Arc::new(clock.clone()));
    (motor, clock)
}

/// Call `periodic` every `tick` for `total`.
fn run_for(
    motor: &mut SimulatedMotorController,
    clock: &ManualClock,
    tick: Duration,
    total: Duration,
) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        clock.advance(tick);
        elapsed += tick;
        motor.periodic();
    }
}

#[test]
fn test_soft_limit_stops_before_hard_and_physical() {
    let (mut motor, clock) = motor(settings().with_limits(forward_limits(
        Some(50.0),
        Some((60.0, false)),
        70.0,
    )));
    let state = factory::moving_to_absolute_position(&motor, inches(100.0));
    motor.submit(state).unwrap();

    clock.advance(Duration::from_secs(20));
    assert_eq!(motor.current_position(), inches(50.0));
    assert!(motor.is_complete());
    assert_eq!(
        motor.current_soft_limit_switch_status(Direction::Forward),
        LimitSwitchStatus::Reached
    );
    assert_eq!(
        motor.current_hard_limit_switch_status(Direction::Forward),
        LimitSwitchStatus::Clear
    );
    let diagnostics = motor.diagnostics();
    assert_eq!(diagnostics.soft_limit_hits, 1);
    assert_eq!(diagnostics.physical_limit_hits, 0);
}

#[test]
fn test_hard_limit_zeroes_encoder_and_switch_stays_closed() {
    let limits = forward_limits(None, Some((60.0, true)), 70.0);
    let (mut motor, clock) = motor(settings().with_limits(limits));
    let state = factory::moving_in_direction_at_rate(&motor, Direction::Forward, None);
    motor.submit(state).unwrap();

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_secs(10));
    assert!(motor.current_position().is_zero());
    assert!(motor.current_rate().is_zero());
    assert_eq!(
        motor.current_hard_limit_switch_status(Direction::Forward),
        LimitSwitchStatus::Reached
    );
    let diagnostics = motor.diagnostics();
    assert_eq!(diagnostics.hard_limit_hits, 1);
    assert_eq!(diagnostics.encoder_resets, 1);

    // Backing off opens the switch.
    let state = factory::moving_in_direction_at_rate(&motor, Direction::Reverse, None);
    motor.submit(state).unwrap();
    clock.advance(Duration::from_secs(1));
    assert_eq!(motor.current_position(), inches(-10.0));
    assert_eq!(
        motor.current_hard_limit_switch_status(Direction::Forward),
        LimitSwitchStatus::Clear
    );
}

#[test]
fn test_hard_limit_without_reset_keeps_position() {
    let limits = forward_limits(None, Some((60.0, false)), 70.0);
    let (mut motor, clock) = motor(settings().with_limits(limits));
    let state = factory::moving_to_absolute_position(&motor, inches(65.0));
    motor.submit(state).unwrap();

    clock.advance(Duration::from_secs(10));
    assert_eq!(motor.current_position(), inches(60.0));
    assert_eq!(motor.diagnostics().encoder_resets, 0);
}

#[test]
fn test_start_beyond_soft_limit_never_moves_backwards() {
    let (mut motor, clock) = motor(settings().with_limits(forward_limits(
        Some(50.0),
        Some((60.0, false)),
        70.0,
    )));
    motor.reset_encoder_position(&inches(55.0)).unwrap();
    let state = factory::moving_to_absolute_position(&motor, inches(58.0));
    motor.submit(state).unwrap();

    assert_eq!(motor.current_position(), inches(55.0));
    assert!(motor.is_complete());
    clock.advance(Duration::from_millis(100));
    assert_eq!(motor.current_position(), inches(55.0));
    assert_eq!(motor.diagnostics().soft_limit_hits, 1);

    // Reverse travel out of the band is still allowed.
    let state = factory::moving_to_absolute_position(&motor, inches(40.0));
    motor.submit(state).unwrap();
    clock.advance(Duration::from_secs(1));
    assert_eq!(motor.current_position(), inches(45.0));
}

#[test]
fn test_calibration_runs_at_clamped_default_rate_into_hard_limit() {
    let limits = MotorLimits::new(
        DirectionalLimits::unbounded(Direction::Forward, LengthUnit::INCHES),
        DirectionalLimits {
            soft: None,
            hard: Some(HardLimit {
                position: inches(-20.0),
                resets_encoder: true,
            }),
            physical: inches(-25.0),
        },
    );
    let rates = RateLimits {
        max_reverse: RateUnit::INCHES_PER_SECOND.create(4.0),
        ..RateLimits::symmetric(RateUnit::INCHES_PER_SECOND.create(10.0))
    };
    let (mut motor, clock) = motor(settings().with_limits(limits).with_rates(rates));
    let state = factory::calibrating_sensor_in_direction(&motor, Direction::Reverse);
    motor.submit(state).unwrap();

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_secs(2));
    assert!((motor.current_position().value() + 8.0).abs() < 1e-6);
    assert!((motor.current_rate().value() + 4.0).abs() < 1e-9);
    assert!(!motor.is_complete());

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_secs(4));
    assert!(motor.current_position().is_zero());
    assert!(motor.current_rate().is_zero());
    assert!(motor.is_complete());
    assert_eq!(
        motor.current_hard_limit_switch_status(Direction::Reverse),
        LimitSwitchStatus::Reached
    );
    let diagnostics = motor.diagnostics();
    assert_eq!(diagnostics.hard_limit_hits, 1);
    assert_eq!(diagnostics.encoder_resets, 1);
    assert_eq!(diagnostics.completed_commands, 1);
    assert_eq!(diagnostics.physical_limit_hits, 0);
}

#[test]
fn test_physical_limit_hit_is_counted() {
    let (mut motor, clock) = motor(settings().with_limits(forward_limits(None, None, 70.0)));
    let state = factory::moving_in_direction_at_rate(&motor, Direction::Forward, None);
    motor.submit(state).unwrap();

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_secs(10));
    assert_eq!(motor.current_position(), inches(70.0));
    assert!(motor.current_rate().is_zero());
    assert!(motor.is_complete());
    assert_eq!(
        motor
            .limits()
            .physical_limit_status(Direction::Forward, &motor.current_position()),
        LimitSwitchStatus::Reached
    );
    assert_eq!(motor.diagnostics().physical_limit_hits, 1);
}

#[test]
fn test_physical_limit_hit_makes_scenario_unhealthy() {
    let toml = r#"
tick = "20 ms"
duration = "10 s"

[shared]
service_name = "winch-sim"

[motor]
name = "winch"
default_rate = "10 in/s"

[motor.limits.forward]
physical = "70 in"

[[steps]]
at = "0 s"
command = "rate"
direction = "forward"
"#;
    let config = ScenarioConfig::from_toml_str(toml).unwrap();
    let report = ScenarioRunner::new(&config).unwrap().run();
    assert!((report.final_position - 70.0).abs() < 1e-9);
    assert_eq!(report.diagnostics.physical_limit_hits, 1);
    assert!(!report.is_healthy());
}

#[test]
fn test_absolute_move_end_to_end() {
    let (mut motor, clock) = motor(settings());
    let state = factory::moving_to_absolute_position(&motor, inches(50.0));
    motor.submit(state).unwrap();

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_millis(2500));
    let halfway = motor.current_position().value();
    assert!((halfway - 25.0).abs() < 1e-6, "halfway at {halfway}");
    assert!(!motor.is_complete());

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_millis(2500));
    assert!((motor.current_position().value() - 50.0).abs() < 1e-6);
    assert!(motor.is_complete());
    assert!(motor.current_position_error_within(&inches(0.01)));
    assert!(motor.current_rate().is_zero());

    // Completed targets stop projecting.
    clock.advance(Duration::from_secs(5));
    assert!((motor.current_position().value() - 50.0).abs() < 1e-6);
    assert_eq!(motor.diagnostics().physical_limit_hits, 0);
}

#[test]
fn test_steady_state_at_soft_limit_short_of_target() {
    let limits = forward_limits(Some(30.0), None, 1000.0);
    let (mut motor, clock) = motor(settings().with_limits(limits));
    let state = factory::moving_to_absolute_position(&motor, inches(50.0));
    motor.submit(state).unwrap();

    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_secs(10));
    assert_eq!(motor.current_position(), inches(30.0));
    run_for(&mut motor, &clock, Duration::from_millis(20), Duration::from_secs(1));
    assert_eq!(motor.current_position(), inches(30.0));
    assert_eq!(motor.diagnostics().soft_limit_hits, 1);
}

#[test]
fn test_relative_move_in_other_units() {
    let (mut motor, clock) = motor(settings());
    let state = factory::moving_to_relative_position(
        &motor,
        Direction::Reverse,
        LengthUnit::CENTIMETERS.create(25.4),
    );
    let accepted = motor.submit(state).unwrap();
    assert_eq!(accepted.target_absolute_position(), Some(&inches(-10.0)));

    clock.advance(Duration::from_secs(2));
    assert!((motor.current_position().value() + 10.0).abs() < 1e-9);
    assert!(motor.is_complete());
}

#[test]
fn test_retarget_mid_move_starts_from_current_position() {
    let (mut motor, clock) = motor(settings());
    let state = factory::moving_to_absolute_position(&motor, inches(100.0));
    motor.submit(state).unwrap();
    clock.advance(Duration::from_secs(1));

    let state = factory::moving_to_absolute_position(&motor, inches(0.0));
    assert_eq!(state.starting_position(), &inches(10.0));
    motor.submit(state).unwrap();
    clock.advance(Duration::from_millis(500));
    assert_eq!(motor.current_position(), inches(5.0));
}

#[test]
fn test_unsupported_operation_keeps_current_state() {
    let (mut motor, _clock) =
        motor(settings().with_capabilities(ControllerCapabilities::ABSOLUTE_POSITION));
    let before = motor.current_state();
    let state = factory::moving_in_direction_at_rate(&motor, Direction::Forward, None);

    let err = motor.submit(state).unwrap_err();
    assert!(matches!(err, MotorError::UnsupportedOperation { .. }));
    assert_eq!(motor.current_state().id(), before.id());
    assert_eq!(motor.current_state().operation(), MotorOperation::Disabled);
}

#[test]
fn test_encoder_reset_shifts_position() {
    let (mut motor, clock) = motor(settings());
    let state = factory::moving_in_direction_at_rate(&motor, Direction::Forward, None);
    motor.submit(state).unwrap();
    clock.advance(Duration::from_secs(1));

    motor.reset_encoder_position(&inches(100.0)).unwrap();
    assert_eq!(motor.current_position(), inches(100.0));
    clock.advance(Duration::from_secs(1));
    assert_eq!(motor.current_position(), inches(110.0));

    let err = motor
        .reset_encoder_position(&inches(f64::NAN))
        .unwrap_err();
    assert!(matches!(err, MotorError::Driver(_)));
}

#[test]
fn test_concurrent_readers_see_consistent_positions() {
    let (mut motor, clock) = motor(settings());
    let state = factory::moving_in_direction_at_rate(&motor, Direction::Forward, None);
    motor.submit(state).unwrap();
    let motor = Arc::new(motor);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let motor = Arc::clone(&motor);
            std::thread::spawn(move || {
                let mut last = f64::NEG_INFINITY;
                for _ in 0..200 {
                    let position = motor.current_position().value();
                    assert!(position.is_finite());
                    assert!(position >= last, "{position} went backwards from {last}");
                    last = position;
                }
            })
        })
        .collect();
    for _ in 0..100 {
        clock.advance(Duration::from_millis(10));
    }
    for reader in readers {
        reader.join().unwrap();
    }
    assert!(motor.current_position().value() <= 10.0 + 1e-9);
}
