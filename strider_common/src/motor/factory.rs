//! Target state construction.
//!
//! One function per operation. Each reads the motor's current position
//! exactly once and records it as the state's starting position.

use super::controller::MotorReader;
use super::{Direction, MotorCommand, MotorState};
use crate::uom::{Length, Rate};

pub fn disabled<R: MotorReader + ?Sized>(motor: &R) -> MotorState {
    MotorState::new(MotorCommand::Disabled, motor.current_position())
}

pub fn holding_current_position<R: MotorReader + ?Sized>(motor: &R) -> MotorState {
    MotorState::new(MotorCommand::HoldingCurrentPosition, motor.current_position())
}

pub fn moving_to_absolute_position<R: MotorReader + ?Sized>(
    motor: &R,
    target: Length,
) -> MotorState {
    MotorState::new(
        MotorCommand::MovingToAbsolutePosition { target },
        motor.current_position(),
    )
}

/// Move `distance` from the current position in `direction`.
///
/// The absolute target is derived here, in the unit of `distance`.
pub fn moving_to_relative_position<R: MotorReader + ?Sized>(
    motor: &R,
    direction: Direction,
    distance: Length,
) -> MotorState {
    let starting = motor.current_position();
    let target = &starting.convert_to(distance.unit()) + &(distance.clone() * direction.sign());
    MotorState::new(
        MotorCommand::MovingToRelativePosition {
            direction,
            distance,
            target,
        },
        starting,
    )
}

/// Move in `direction` at `rate`, or at the controller's default rate when
/// `rate` is `None`.
pub fn moving_in_direction_at_rate<R: MotorReader + ?Sized>(
    motor: &R,
    direction: Direction,
    rate: Option<Rate>,
) -> MotorState {
    MotorState::new(
        MotorCommand::MovingInDirectionAtRate { direction, rate },
        motor.current_position(),
    )
}

pub fn calibrating_sensor_in_direction<R: MotorReader + ?Sized>(
    motor: &R,
    direction: Direction,
) -> MotorState {
    MotorState::new(
        MotorCommand::CalibratingSensorInDirection { direction },
        motor.current_position(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::MotorOperation;
    use crate::uom::{LengthUnit, RateUnit};
    use std::cell::Cell;

    struct CountingMotor {
        reads: Cell<u32>,
    }

    impl MotorReader for CountingMotor {
        fn current_position(&self) -> Length {
            self.reads.set(self.reads.get() + 1);
            LengthUnit::INCHES.create(10.0)
        }

        fn current_rate(&self) -> Rate {
            RateUnit::INCHES_PER_SECOND.create(0.0)
        }
    }

    fn motor() -> CountingMotor {
        CountingMotor {
            reads: Cell::new(0),
        }
    }

    #[test]
    fn captures_starting_position_once() {
        let m = motor();
        let state = moving_to_absolute_position(&m, LengthUnit::INCHES.create(50.0));
        assert_eq!(m.reads.get(), 1);
        assert_eq!(state.starting_position(), &LengthUnit::INCHES.create(10.0));
        assert_eq!(state.operation(), MotorOperation::MovingToAbsolutePosition);
    }

    #[test]
    fn relative_target_is_derived() {
        let m = motor();
        let fwd = moving_to_relative_position(&m, Direction::Forward, LengthUnit::INCHES.create(5.0));
        assert_eq!(fwd.target_absolute_position(), Some(&LengthUnit::INCHES.create(15.0)));
        assert_eq!(fwd.target_relative_distance(), Some(&LengthUnit::INCHES.create(5.0)));

        let rev = moving_to_relative_position(&m, Direction::Reverse, LengthUnit::CENTIMETERS.create(2.54));
        let target = rev.target_absolute_position().unwrap();
        assert_eq!(target.unit(), &LengthUnit::CENTIMETERS);
        assert_eq!(target, &LengthUnit::INCHES.create(9.0));
        assert_eq!(m.reads.get(), 2);
    }

    #[test]
    fn rate_defaults_to_none() {
        let m = motor();
        let state = moving_in_direction_at_rate(&m, Direction::Reverse, None);
        assert!(state.target_rate().is_none());
        assert_eq!(state.target_direction(), Some(Direction::Reverse));
        assert!(state.target_absolute_position().is_none());
    }

    #[test]
    fn idle_states_have_no_targets() {
        let m = motor();
        for state in [disabled(&m), holding_current_position(&m)] {
            assert!(state.operation().is_idle());
            assert!(state.target_direction().is_none());
            assert!(state.target_rate().is_none());
        }
        let calibrate = calibrating_sensor_in_direction(&m, Direction::Reverse);
        assert_eq!(calibrate.target_direction(), Some(Direction::Reverse));
    }
}
