//! Direction of travel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of travel along the mechanism's axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    /// Increasing position.
    Forward = 0,
    /// Decreasing position.
    Reverse = 1,
}

impl Direction {
    pub const BOTH: [Self; 2] = [Self::Forward, Self::Reverse];

    /// Sign multiplier: +1 forward, -1 reverse.
    #[inline]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }

    #[inline]
    pub const fn inverse(&self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Direction of a signed delta; `None` for zero or NaN.
    #[inline]
    pub fn of(delta: f64) -> Option<Self> {
        if delta > 0.0 {
            Some(Self::Forward)
        } else if delta < 0.0 {
            Some(Self::Reverse)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_inverse() {
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Reverse.sign(), -1.0);
        assert_eq!(Direction::Forward.inverse(), Direction::Reverse);
        assert_eq!(Direction::Reverse.inverse().inverse(), Direction::Reverse);
    }

    #[test]
    fn direction_of_delta() {
        assert_eq!(Direction::of(3.0), Some(Direction::Forward));
        assert_eq!(Direction::of(-0.1), Some(Direction::Reverse));
        assert_eq!(Direction::of(0.0), None);
        assert_eq!(Direction::of(f64::NAN), None);
    }
}
