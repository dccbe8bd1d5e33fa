//! Motor target states.
//!
//! A [`MotorState`] is an immutable snapshot of one commanded operation:
//! the [`MotorCommand`] payload plus the position the motor was at when the
//! command was created. Controllers hold their current target as
//! `Arc<MotorState>` and replace it wholesale on every transition; a state
//! is never mutated in place.
//!
//! Each state gets a [`StateId`] from a process-wide monotonic counter, so
//! "has this exact command completed" is an id comparison rather than a
//! reference-identity check.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::controller::MotorReader;
use super::{Direction, MotorOperation};
use crate::uom::{Length, LengthUnit, Rate, RateUnit};

static NEXT_STATE_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonically increasing identifier assigned at state construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u64);

impl StateId {
    fn next() -> Self {
        Self(NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operation payload: one variant per [`MotorOperation`].
#[derive(Debug, Clone, PartialEq)]
pub enum MotorCommand {
    Disabled,
    HoldingCurrentPosition,
    MovingToAbsolutePosition {
        target: Length,
    },
    MovingToRelativePosition {
        direction: Direction,
        distance: Length,
        /// `starting + distance * direction.sign`, derived at construction.
        target: Length,
    },
    MovingInDirectionAtRate {
        direction: Direction,
        /// `None` runs at the controller's configured default rate.
        rate: Option<Rate>,
    },
    CalibratingSensorInDirection {
        direction: Direction,
    },
}

impl MotorCommand {
    pub const fn operation(&self) -> MotorOperation {
        match self {
            Self::Disabled => MotorOperation::Disabled,
            Self::HoldingCurrentPosition => MotorOperation::HoldingCurrentPosition,
            Self::MovingToAbsolutePosition { .. } => MotorOperation::MovingToAbsolutePosition,
            Self::MovingToRelativePosition { .. } => MotorOperation::MovingToRelativePosition,
            Self::MovingInDirectionAtRate { .. } => MotorOperation::MovingInDirectionAtRate,
            Self::CalibratingSensorInDirection { .. } => {
                MotorOperation::CalibratingSensorInDirection
            }
        }
    }
}

/// Immutable description of one commanded motor operation.
#[derive(Debug, Clone)]
pub struct MotorState {
    id: StateId,
    command: MotorCommand,
    starting_position: Length,
}

impl MotorState {
    /// Build a state from a payload and the position recorded at creation.
    ///
    /// Prefer the functions in [`factory`](super::factory), which read the
    /// starting position from the motor.
    pub fn new(command: MotorCommand, starting_position: Length) -> Self {
        Self {
            id: StateId::next(),
            command,
            starting_position,
        }
    }

    #[inline]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[inline]
    pub fn command(&self) -> &MotorCommand {
        &self.command
    }

    #[inline]
    pub fn operation(&self) -> MotorOperation {
        self.command.operation()
    }

    /// Position recorded when this state was created.
    #[inline]
    pub fn starting_position(&self) -> &Length {
        &self.starting_position
    }

    pub fn target_direction(&self) -> Option<Direction> {
        match &self.command {
            MotorCommand::MovingToRelativePosition { direction, .. }
            | MotorCommand::MovingInDirectionAtRate { direction, .. }
            | MotorCommand::CalibratingSensorInDirection { direction } => Some(*direction),
            MotorCommand::Disabled
            | MotorCommand::HoldingCurrentPosition
            | MotorCommand::MovingToAbsolutePosition { .. } => None,
        }
    }

    pub fn target_rate(&self) -> Option<&Rate> {
        match &self.command {
            MotorCommand::MovingInDirectionAtRate { rate, .. } => rate.as_ref(),
            _ => None,
        }
    }

    pub fn target_absolute_position(&self) -> Option<&Length> {
        match &self.command {
            MotorCommand::MovingToAbsolutePosition { target }
            | MotorCommand::MovingToRelativePosition { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn target_relative_distance(&self) -> Option<&Length> {
        match &self.command {
            MotorCommand::MovingToRelativePosition { distance, .. } => Some(distance),
            _ => None,
        }
    }

    /// Target rate signed by the target direction.
    pub fn signed_target_rate(&self) -> Option<Rate> {
        let rate = self.target_rate()?;
        let sign = self.target_direction().map_or(1.0, |d| d.sign());
        Some(rate.clone() * sign)
    }

    /// `current - target`, in the target's unit. Positive means the motor
    /// is ahead of the target. Zero (in the unit of the current position)
    /// when the operation carries no target position.
    pub fn current_position_error<R: MotorReader + ?Sized>(&self, motor: &R) -> Length {
        let current = motor.current_position();
        match self.target_absolute_position() {
            Some(target) => &current.convert_to(target.unit()) - target,
            None => Length::zero(current.unit().clone()),
        }
    }

    /// `current - target` rate, in the target's unit; zero when the
    /// operation carries no explicit target rate.
    pub fn current_rate_error<R: MotorReader + ?Sized>(&self, motor: &R) -> Rate {
        let current = motor.current_rate();
        match self.signed_target_rate() {
            Some(target) => &current.convert_to(target.unit()) - &target,
            None => Rate::zero(current.unit().clone()),
        }
    }

    /// `|position error| <= |margin|`.
    ///
    /// Always true when there is no target position: an absent constraint
    /// is trivially satisfied. Idle and rate commands rely on this.
    pub fn current_position_error_within<R: MotorReader + ?Sized>(
        &self,
        motor: &R,
        margin: &Length,
    ) -> bool {
        if self.target_absolute_position().is_none() {
            return true;
        }
        self.current_position_error(motor).abs() <= margin.abs()
    }

    /// `|rate error| <= |margin|`; true when there is no target rate.
    pub fn current_rate_error_within<R: MotorReader + ?Sized>(
        &self,
        motor: &R,
        margin: &Rate,
    ) -> bool {
        if self.target_rate().is_none() {
            return true;
        }
        self.current_rate_error(motor).abs() <= margin.abs()
    }

    /// Equivalent state with every length in `length_unit` and every rate
    /// in `rate_unit`, optionally direction-inverted (sensor or motor phase
    /// wired backwards). The original is untouched; the copy gets a fresh
    /// id.
    ///
    /// Inverting a relative move re-derives its absolute target so that
    /// `target = starting + distance * direction.sign` keeps holding.
    pub fn convert_to(
        &self,
        length_unit: &LengthUnit,
        rate_unit: &RateUnit,
        invert_direction: bool,
    ) -> MotorState {
        let flip = |d: &Direction| if invert_direction { d.inverse() } else { *d };
        let starting = self.starting_position.convert_to(length_unit);

        let command = match &self.command {
            MotorCommand::Disabled => MotorCommand::Disabled,
            MotorCommand::HoldingCurrentPosition => MotorCommand::HoldingCurrentPosition,
            MotorCommand::MovingToAbsolutePosition { target } => {
                MotorCommand::MovingToAbsolutePosition {
                    target: target.convert_to(length_unit),
                }
            }
            MotorCommand::MovingToRelativePosition {
                direction,
                distance,
                target,
            } => {
                let direction = flip(direction);
                let distance = distance.convert_to(length_unit);
                let target = if invert_direction {
                    &starting + &(distance.clone() * direction.sign())
                } else {
                    target.convert_to(length_unit)
                };
                MotorCommand::MovingToRelativePosition {
                    direction,
                    distance,
                    target,
                }
            }
            MotorCommand::MovingInDirectionAtRate { direction, rate } => {
                MotorCommand::MovingInDirectionAtRate {
                    direction: flip(direction),
                    rate: rate.as_ref().map(|r| r.convert_to(rate_unit)),
                }
            }
            MotorCommand::CalibratingSensorInDirection { direction } => {
                MotorCommand::CalibratingSensorInDirection {
                    direction: flip(direction),
                }
            }
        };

        MotorState::new(command, starting)
    }
}

/// Equal iff operation, direction, absolute target, relative distance and
/// rate all match after unit normalization. Id and starting position do
/// not participate.
impl PartialEq for MotorState {
    fn eq(&self, other: &Self) -> bool {
        self.operation() == other.operation()
            && self.target_direction() == other.target_direction()
            && self.target_absolute_position() == other.target_absolute_position()
            && self.target_relative_distance() == other.target_relative_distance()
            && self.target_rate() == other.target_rate()
    }
}

impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.operation())?;
        match &self.command {
            MotorCommand::Disabled | MotorCommand::HoldingCurrentPosition => Ok(()),
            MotorCommand::MovingToAbsolutePosition { target } => write!(f, " to {target:.3}"),
            MotorCommand::MovingToRelativePosition {
                direction,
                distance,
                target,
            } => write!(f, " {direction} by {distance:.3} to {target:.3}"),
            MotorCommand::MovingInDirectionAtRate { direction, rate } => match rate {
                Some(rate) => write!(f, " {direction} at {rate:.3}"),
                None => write!(f, " {direction} at default rate"),
            },
            MotorCommand::CalibratingSensorInDirection { direction } => write!(f, " {direction}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMotor {
        position: Length,
        rate: Rate,
    }

    impl MotorReader for FixedMotor {
        fn current_position(&self) -> Length {
            self.position.clone()
        }

        fn current_rate(&self) -> Rate {
            self.rate.clone()
        }
    }

    fn motor_at(inches: f64) -> FixedMotor {
        FixedMotor {
            position: LengthUnit::INCHES.create(inches),
            rate: RateUnit::INCHES_PER_SECOND.create(0.0),
        }
    }

    fn absolute(target: Length) -> MotorState {
        MotorState::new(
            MotorCommand::MovingToAbsolutePosition { target },
            LengthUnit::INCHES.create(0.0),
        )
    }

    #[test]
    fn ids_are_monotonic() {
        let a = MotorState::new(MotorCommand::Disabled, LengthUnit::INCHES.create(0.0));
        let b = MotorState::new(MotorCommand::Disabled, LengthUnit::INCHES.create(0.0));
        assert!(b.id() > a.id());
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_unit_independent() {
        assert_eq!(
            absolute(LengthUnit::INCHES.create(10.0)),
            absolute(LengthUnit::METERS.create(0.254))
        );
        assert_ne!(
            absolute(LengthUnit::INCHES.create(10.0)),
            absolute(LengthUnit::INCHES.create(10.5))
        );
    }

    #[test]
    fn equality_compares_operation() {
        let rate = MotorState::new(
            MotorCommand::MovingInDirectionAtRate {
                direction: Direction::Forward,
                rate: None,
            },
            LengthUnit::INCHES.create(0.0),
        );
        let calibrate = MotorState::new(
            MotorCommand::CalibratingSensorInDirection {
                direction: Direction::Forward,
            },
            LengthUnit::INCHES.create(0.0),
        );
        assert_ne!(rate, calibrate);
    }

    #[test]
    fn position_error_sign_and_unit() {
        let state = absolute(LengthUnit::FEET.create(1.0));
        let error = state.current_position_error(&motor_at(15.0));
        assert_eq!(error.unit(), &LengthUnit::FEET);
        assert!((error.value() - 0.25).abs() < 1e-12);
        assert!(state.current_position_error_within(&motor_at(12.5), &LengthUnit::INCHES.create(0.5)));
        assert!(!state.current_position_error_within(&motor_at(13.0), &LengthUnit::INCHES.create(0.5)));
    }

    #[test]
    fn no_target_is_within_any_margin() {
        let state = MotorState::new(MotorCommand::Disabled, LengthUnit::INCHES.create(0.0));
        let motor = motor_at(1_000.0);
        assert!(state.current_position_error(&motor).is_zero());
        assert_eq!(state.current_position_error(&motor).unit(), &LengthUnit::INCHES);
        assert!(state.current_position_error_within(&motor, &LengthUnit::INCHES.create(0.0)));
        assert!(state.current_rate_error_within(&motor, &RateUnit::INCHES_PER_SECOND.create(0.0)));
    }

    #[test]
    fn rate_error_uses_direction() {
        let state = MotorState::new(
            MotorCommand::MovingInDirectionAtRate {
                direction: Direction::Reverse,
                rate: Some(RateUnit::INCHES_PER_SECOND.create(4.0)),
            },
            LengthUnit::INCHES.create(0.0),
        );
        let motor = FixedMotor {
            position: LengthUnit::INCHES.create(0.0),
            rate: RateUnit::INCHES_PER_SECOND.create(-3.0),
        };
        let error = state.current_rate_error(&motor);
        assert!((error.value() - 1.0).abs() < 1e-12);
        assert!(state.current_rate_error_within(&motor, &RateUnit::INCHES_PER_SECOND.create(1.0)));
        assert!(!state.current_rate_error_within(&motor, &RateUnit::INCHES_PER_SECOND.create(0.5)));
    }

    #[test]
    fn convert_keeps_original_and_changes_units() {
        let original = MotorState::new(
            MotorCommand::MovingInDirectionAtRate {
                direction: Direction::Forward,
                rate: Some(RateUnit::INCHES_PER_SECOND.create(1.0)),
            },
            LengthUnit::INCHES.create(2.0),
        );
        let metric = original.convert_to(
            &LengthUnit::CENTIMETERS,
            &RateUnit::CENTIMETERS_PER_SECOND,
            false,
        );
        assert_eq!(metric, original);
        assert_ne!(metric.id(), original.id());
        assert_eq!(metric.starting_position().unit(), &LengthUnit::CENTIMETERS);
        assert_eq!(metric.target_rate().unwrap().unit(), &RateUnit::CENTIMETERS_PER_SECOND);
        assert_eq!(original.target_rate().unwrap().unit(), &RateUnit::INCHES_PER_SECOND);
    }

    #[test]
    fn convert_with_inversion_flips_direction() {
        let relative = MotorState::new(
            MotorCommand::MovingToRelativePosition {
                direction: Direction::Forward,
                distance: LengthUnit::INCHES.create(5.0),
                target: LengthUnit::INCHES.create(15.0),
            },
            LengthUnit::INCHES.create(10.0),
        );
        let inverted = relative.convert_to(&LengthUnit::INCHES, &RateUnit::INCHES_PER_SECOND, true);
        assert_eq!(inverted.target_direction(), Some(Direction::Reverse));
        assert_eq!(
            inverted.target_absolute_position(),
            Some(&LengthUnit::INCHES.create(5.0))
        );
        assert_eq!(relative.target_direction(), Some(Direction::Forward));
    }

    #[test]
    fn display_describes_command() {
        let state = absolute(LengthUnit::INCHES.create(50.0));
        assert!(state.to_string().ends_with("MovingToAbsolutePosition to 50.000 in"));
    }
}
