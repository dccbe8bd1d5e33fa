//! Per-direction travel limits and limit classification.
//!
//! Each direction has up to three limits, usually reached in this order:
//!
//! | Limit    | Backed by                 | On contact                          |
//! |----------|---------------------------|-------------------------------------|
//! | Soft     | software threshold        | stop, command complete              |
//! | Hard     | physical limit switch     | stop, optionally zero the encoder   |
//! | Physical | end of mechanism travel   | mechanical damage                   |
//!
//! Reached/exceeded status is always computed from a position, never
//! stored.

use serde::{Deserialize, Serialize};

use super::Direction;
use crate::uom::{Length, LengthUnit, Rate, RateUnit};

/// Which limit stopped a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Soft,
    Hard,
    Physical,
}

/// Status of a limit in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSwitchStatus {
    /// No such limit in this direction.
    NotConfigured,
    /// Position is short of the limit.
    Clear,
    /// Position is at the limit (or the switch is closed).
    Reached,
    /// Position is beyond the limit.
    Exceeded,
}

impl LimitSwitchStatus {
    /// `Reached` or `Exceeded`.
    #[inline]
    pub const fn is_triggered(&self) -> bool {
        matches!(self, Self::Reached | Self::Exceeded)
    }
}

/// Sign-aware `position >= limit` in the given direction of travel.
///
/// A position equal to the limit within the quantity tolerance counts as
/// reached, so accumulated floating-point drift cannot leave a motion
/// stopped just short of it.
pub fn is_limit_reached(direction: Direction, limit: &Length, position: &Length) -> bool {
    let sign = direction.sign();
    position == limit || sign * position.value_in(limit.unit()) >= sign * limit.value()
}

/// Sign-aware `position > limit`, excluding positions equal to the limit
/// within tolerance.
pub fn is_limit_exceeded(direction: Direction, limit: &Length, position: &Length) -> bool {
    let sign = direction.sign();
    position != limit && sign * position.value_in(limit.unit()) > sign * limit.value()
}

/// Classify `position` against an optional limit.
pub fn limit_status(
    direction: Direction,
    limit: Option<&Length>,
    position: &Length,
) -> LimitSwitchStatus {
    match limit {
        None => LimitSwitchStatus::NotConfigured,
        Some(limit) if is_limit_exceeded(direction, limit, position) => {
            LimitSwitchStatus::Exceeded
        }
        Some(limit) if is_limit_reached(direction, limit, position) => LimitSwitchStatus::Reached,
        Some(_) => LimitSwitchStatus::Clear,
    }
}

/// A limit backed by a physical switch.
#[derive(Debug, Clone, PartialEq)]
pub struct HardLimit {
    /// Position at which the switch closes.
    pub position: Length,
    /// Switch is wired to the sensor's zero pin: contact resets the
    /// encoder to zero.
    pub resets_encoder: bool,
}

/// Limits for one direction of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLimits {
    pub soft: Option<Length>,
    pub hard: Option<HardLimit>,
    /// End of mechanism travel; infinite when the mechanism is unbounded
    /// (e.g. a drive wheel).
    pub physical: Length,
}

impl DirectionalLimits {
    /// No soft or hard limit, physical limit at infinity.
    pub fn unbounded(direction: Direction, unit: LengthUnit) -> Self {
        Self {
            soft: None,
            hard: None,
            physical: Length::new(direction.sign() * f64::INFINITY, unit),
        }
    }

    pub fn hard_position(&self) -> Option<&Length> {
        self.hard.as_ref().map(|h| &h.position)
    }

    pub fn hard_resets_encoder(&self) -> bool {
        self.hard.as_ref().is_some_and(|h| h.resets_encoder)
    }

    pub fn convert_to(&self, unit: &LengthUnit) -> Self {
        Self {
            soft: self.soft.as_ref().map(|l| l.convert_to(unit)),
            hard: self.hard.as_ref().map(|h| HardLimit {
                position: h.position.convert_to(unit),
                resets_encoder: h.resets_encoder,
            }),
            physical: self.physical.convert_to(unit),
        }
    }

    /// Soft and hard limits must be finite and the physical limit a number.
    /// Soft must be reached no later than hard, hard no later than physical.
    fn validate(&self, direction: Direction) -> Result<(), String> {
        if let Some(soft) = self.soft.as_ref().filter(|l| !l.is_finite()) {
            return Err(format!("{direction} soft limit {soft} must be finite"));
        }
        if let Some(hard) = self.hard_position().filter(|l| !l.is_finite()) {
            return Err(format!("{direction} hard limit {hard} must be finite"));
        }
        if self.physical.value().is_nan() {
            return Err(format!("{direction} physical limit cannot be NaN"));
        }
        if let (Some(soft), Some(hard)) = (&self.soft, self.hard_position()) {
            if is_limit_exceeded(direction, hard, soft) {
                return Err(format!(
                    "{direction} soft limit {soft} lies beyond hard limit {hard}"
                ));
            }
        }
        if let Some(soft) = &self.soft {
            if is_limit_exceeded(direction, &self.physical, soft) {
                return Err(format!(
                    "{direction} soft limit {soft} lies beyond physical limit {}",
                    self.physical
                ));
            }
        }
        if let Some(hard) = self.hard_position() {
            if is_limit_exceeded(direction, &self.physical, hard) {
                return Err(format!(
                    "{direction} hard limit {hard} lies beyond physical limit {}",
                    self.physical
                ));
            }
        }
        Ok(())
    }
}

/// Limits in both directions of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorLimits {
    forward: DirectionalLimits,
    reverse: DirectionalLimits,
}

impl MotorLimits {
    pub fn new(forward: DirectionalLimits, reverse: DirectionalLimits) -> Self {
        Self { forward, reverse }
    }

    /// No limits in either direction.
    pub fn unbounded(unit: LengthUnit) -> Self {
        Self {
            forward: DirectionalLimits::unbounded(Direction::Forward, unit.clone()),
            reverse: DirectionalLimits::unbounded(Direction::Reverse, unit),
        }
    }

    #[inline]
    pub fn in_direction(&self, direction: Direction) -> &DirectionalLimits {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Reverse => &self.reverse,
        }
    }

    #[inline]
    pub fn in_direction_mut(&mut self, direction: Direction) -> &mut DirectionalLimits {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Reverse => &mut self.reverse,
        }
    }

    pub fn soft_limit_status(&self, direction: Direction, position: &Length) -> LimitSwitchStatus {
        limit_status(direction, self.in_direction(direction).soft.as_ref(), position)
    }

    pub fn hard_limit_status(&self, direction: Direction, position: &Length) -> LimitSwitchStatus {
        limit_status(direction, self.in_direction(direction).hard_position(), position)
    }

    pub fn physical_limit_status(
        &self,
        direction: Direction,
        position: &Length,
    ) -> LimitSwitchStatus {
        limit_status(direction, Some(&self.in_direction(direction).physical), position)
    }

    pub fn convert_to(&self, unit: &LengthUnit) -> Self {
        Self {
            forward: self.forward.convert_to(unit),
            reverse: self.reverse.convert_to(unit),
        }
    }

    /// Check per-direction ordering and that forward travel ends beyond
    /// reverse travel.
    pub fn validate(&self) -> Result<(), String> {
        self.forward.validate(Direction::Forward)?;
        self.reverse.validate(Direction::Reverse)?;
        if self.forward.physical <= self.reverse.physical {
            return Err(format!(
                "forward physical limit {} must lie beyond reverse physical limit {}",
                self.forward.physical, self.reverse.physical
            ));
        }
        Ok(())
    }
}

/// Rate magnitude bounds per direction. Values are non-negative; the
/// direction supplies the sign.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimits {
    pub min_forward: Rate,
    pub max_forward: Rate,
    pub min_reverse: Rate,
    pub max_reverse: Rate,
}

impl RateLimits {
    /// `[0, max]` in both directions.
    pub fn symmetric(max: Rate) -> Self {
        let zero = Rate::zero(max.unit().clone());
        Self {
            min_forward: zero.clone(),
            max_forward: max.clone(),
            min_reverse: zero,
            max_reverse: max,
        }
    }

    pub fn min(&self, direction: Direction) -> &Rate {
        match direction {
            Direction::Forward => &self.min_forward,
            Direction::Reverse => &self.min_reverse,
        }
    }

    pub fn max(&self, direction: Direction) -> &Rate {
        match direction {
            Direction::Forward => &self.max_forward,
            Direction::Reverse => &self.max_reverse,
        }
    }

    /// Magnitude of `rate` clamped into `[min, max]` for `direction`, in
    /// the unit of `rate`.
    pub fn clamp(&self, direction: Direction, rate: &Rate) -> Rate {
        rate.abs().max(self.min(direction)).min(self.max(direction))
    }

    pub fn convert_to(&self, unit: &RateUnit) -> Self {
        Self {
            min_forward: self.min_forward.convert_to(unit),
            max_forward: self.max_forward.convert_to(unit),
            min_reverse: self.min_reverse.convert_to(unit),
            max_reverse: self.max_reverse.convert_to(unit),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for direction in Direction::BOTH {
            let (min, max) = (self.min(direction), self.max(direction));
            if !min.is_finite() || !max.is_finite() || min.value() < 0.0 {
                return Err(format!(
                    "{direction} rates must be finite and non-negative (min {min}, max {max})"
                ));
            }
            if min > max {
                return Err(format!("{direction} minimum rate {min} exceeds maximum {max}"));
            }
        }
        Ok(())
    }
}
