//! Motor operation kinds and their classification predicates.
//!
//! The set is closed: every dispatch over it is an exhaustive `match`, so
//! adding a kind is a compile error at each call site that must handle it.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::fmt;

/// What a motor has been told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotorOperation {
    /// Output off; the mechanism may coast or back-drive.
    Disabled = 0,
    /// Closed-loop hold at the position recorded when commanded.
    HoldingCurrentPosition = 1,
    /// Closed-loop move to an absolute position.
    MovingToAbsolutePosition = 2,
    /// Closed-loop move by a distance from the starting position.
    MovingToRelativePosition = 3,
    /// Open-ended move at a rate until superseded or a limit is reached.
    MovingInDirectionAtRate = 4,
    /// Drive toward a limit switch to establish the sensor's zero.
    CalibratingSensorInDirection = 5,
}

const_assert_eq!(core::mem::size_of::<MotorOperation>(), 1);

impl MotorOperation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Disabled,
        Self::HoldingCurrentPosition,
        Self::MovingToAbsolutePosition,
        Self::MovingToRelativePosition,
        Self::MovingInDirectionAtRate,
        Self::CalibratingSensorInDirection,
    ];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::HoldingCurrentPosition),
            2 => Some(Self::MovingToAbsolutePosition),
            3 => Some(Self::MovingToRelativePosition),
            4 => Some(Self::MovingInDirectionAtRate),
            5 => Some(Self::CalibratingSensorInDirection),
            _ => None,
        }
    }

    /// `Disabled` or `HoldingCurrentPosition`.
    #[inline]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Disabled | Self::HoldingCurrentPosition)
    }

    /// Any of the `Moving*` operations or calibration.
    #[inline]
    pub const fn is_moving(&self) -> bool {
        matches!(
            self,
            Self::MovingToAbsolutePosition
                | Self::MovingToRelativePosition
                | Self::MovingInDirectionAtRate
                | Self::CalibratingSensorInDirection
        )
    }

    /// Absolute or relative position move.
    #[inline]
    pub const fn is_moving_to_position(&self) -> bool {
        matches!(
            self,
            Self::MovingToAbsolutePosition | Self::MovingToRelativePosition
        )
    }

    /// The operation carries a target absolute position.
    #[inline]
    pub const fn has_target_position(&self) -> bool {
        self.is_moving_to_position()
    }

    /// The operation may carry an explicit target rate.
    #[inline]
    pub const fn has_target_rate(&self) -> bool {
        matches!(self, Self::MovingInDirectionAtRate)
    }

    /// The operation carries a direction.
    #[inline]
    pub const fn has_direction(&self) -> bool {
        matches!(
            self,
            Self::MovingToRelativePosition
                | Self::MovingInDirectionAtRate
                | Self::CalibratingSensorInDirection
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::HoldingCurrentPosition => "HoldingCurrentPosition",
            Self::MovingToAbsolutePosition => "MovingToAbsolutePosition",
            Self::MovingToRelativePosition => "MovingToRelativePosition",
            Self::MovingInDirectionAtRate => "MovingInDirectionAtRate",
            Self::CalibratingSensorInDirection => "CalibratingSensorInDirection",
        }
    }
}

impl Default for MotorOperation {
    fn default() -> Self {
        Self::Disabled
    }
}

impl fmt::Display for MotorOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
