//! Units of measure and their dimensions.
//!
//! Each unit records how many canonical units one of it is worth. The
//! canonical unit of a dimension has quantity 1; every other unit is
//! strictly bigger, so converting between two units costs one multiply and
//! one divide through the canonical form, and adding a unit never touches
//! the existing ones.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use super::{Length, Quantity, Rate, Time, UomError};
use crate::consts::{
    LENGTH_CANONICAL_QUANTITY, MICROMETERS_PER_INCH, MICROMETERS_PER_MILLIMETER,
    MICROSECONDS_PER_MINUTE, MICROSECONDS_PER_SECOND, TIME_CANONICAL_QUANTITY,
};

/// Physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Travel along the mechanism's axis (linear or angular).
    Length,
    /// Length per time.
    Rate,
    /// Elapsed time.
    Time,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Length => "length",
            Self::Rate => "rate",
            Self::Time => "time",
        };
        f.write_str(s)
    }
}

/// A dimension-tagged unit of measure.
#[derive(Debug, Clone)]
pub struct Unit {
    dimension: Dimension,
    name: Cow<'static, str>,
    abbreviation: Cow<'static, str>,
    canonical_quantity: f64,
}

impl Unit {
    const fn builtin(
        dimension: Dimension,
        name: &'static str,
        abbreviation: &'static str,
        canonical_quantity: f64,
    ) -> Self {
        Self {
            dimension,
            name: Cow::Borrowed(name),
            abbreviation: Cow::Borrowed(abbreviation),
            canonical_quantity,
        }
    }

    /// Define a non-canonical unit.
    ///
    /// # Errors
    ///
    /// `UomError::InvalidUnit` unless `canonical_quantity` is finite and
    /// strictly greater than 1 (only the built-in canonical unit has 1).
    pub fn new(
        dimension: Dimension,
        name: impl Into<Cow<'static, str>>,
        abbreviation: impl Into<Cow<'static, str>>,
        canonical_quantity: f64,
    ) -> Result<Self, UomError> {
        let name = name.into();
        if !canonical_quantity.is_finite() || canonical_quantity <= 1.0 {
            return Err(UomError::InvalidUnit(format!(
                "{name}: canonical quantity {canonical_quantity} must be finite and greater than 1"
            )));
        }
        let abbreviation = abbreviation.into();
        if name.trim().is_empty() || abbreviation.trim().is_empty() {
            return Err(UomError::InvalidUnit(
                "unit name and abbreviation cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            name,
            abbreviation,
            canonical_quantity,
        })
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    /// Number of canonical units equal to one of this unit.
    #[inline]
    pub fn canonical_quantity(&self) -> f64 {
        self.canonical_quantity
    }

    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.canonical_quantity == 1.0
    }

    /// Two units are compatible iff they share a dimension.
    #[inline]
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    pub(crate) fn check_compatible(&self, other: &Unit) -> Result<(), UomError> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(UomError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            })
        }
    }

    /// Bind a value to this unit.
    pub fn create(&self, value: f64) -> Quantity {
        Quantity::new(value, self.clone())
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && self.abbreviation == other.abbreviation
            && self.canonical_quantity == other.canonical_quantity
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.abbreviation)
    }
}

/// A unit of the `Length` dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthUnit(Unit);

impl LengthUnit {
    /// Canonical length unit.
    pub const MICROMETERS: Self = Self::builtin("micrometers", "um", LENGTH_CANONICAL_QUANTITY);
    pub const MILLIMETERS: Self = Self::builtin("millimeters", "mm", MICROMETERS_PER_MILLIMETER);
    pub const CENTIMETERS: Self =
        Self::builtin("centimeters", "cm", 10.0 * MICROMETERS_PER_MILLIMETER);
    pub const INCHES: Self = Self::builtin("inches", "in", MICROMETERS_PER_INCH);
    pub const FEET: Self = Self::builtin("feet", "ft", 12.0 * MICROMETERS_PER_INCH);
    pub const METERS: Self = Self::builtin("meters", "m", 1_000.0 * MICROMETERS_PER_MILLIMETER);

    /// All built-in length units, canonical first.
    pub const BUILTIN: [Self; 6] = [
        Self::MICROMETERS,
        Self::MILLIMETERS,
        Self::CENTIMETERS,
        Self::INCHES,
        Self::FEET,
        Self::METERS,
    ];

    const fn builtin(name: &'static str, abbreviation: &'static str, quantity: f64) -> Self {
        Self(Unit::builtin(Dimension::Length, name, abbreviation, quantity))
    }

    /// Define a custom length unit as a multiple of an existing length,
    /// e.g. one encoder pulse or one revolution of a given spool.
    pub fn custom(
        name: impl Into<Cow<'static, str>>,
        abbreviation: impl Into<Cow<'static, str>>,
        equals: &Length,
    ) -> Result<Self, UomError> {
        Unit::new(
            Dimension::Length,
            name,
            abbreviation,
            equals.canonical_value(),
        )
        .map(Self)
    }

    pub(crate) fn from_unit(unit: Unit) -> Result<Self, UomError> {
        match unit.dimension {
            Dimension::Length => Ok(Self(unit)),
            actual => Err(UomError::DimensionMismatch {
                expected: Dimension::Length,
                actual,
            }),
        }
    }

    pub fn create(&self, value: f64) -> Length {
        Length::new(value, self.clone())
    }

    pub fn as_unit(&self) -> &Unit {
        &self.0
    }
}

impl Deref for LengthUnit {
    type Target = Unit;

    fn deref(&self) -> &Unit {
        &self.0
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A unit of the `Time` dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnit(Unit);

impl TimeUnit {
    /// Canonical time unit.
    pub const MICROSECONDS: Self = Self::builtin("microseconds", "us", TIME_CANONICAL_QUANTITY);
    pub const MILLISECONDS: Self = Self::builtin("milliseconds", "ms", 1_000.0);
    pub const SECONDS: Self = Self::builtin("seconds", "s", MICROSECONDS_PER_SECOND);
    pub const MINUTES: Self = Self::builtin("minutes", "min", MICROSECONDS_PER_MINUTE);

    /// All built-in time units, canonical first.
    pub const BUILTIN: [Self; 4] = [
        Self::MICROSECONDS,
        Self::MILLISECONDS,
        Self::SECONDS,
        Self::MINUTES,
    ];

    const fn builtin(name: &'static str, abbreviation: &'static str, quantity: f64) -> Self {
        Self(Unit::builtin(Dimension::Time, name, abbreviation, quantity))
    }

    pub(crate) fn from_unit(unit: Unit) -> Result<Self, UomError> {
        match unit.dimension {
            Dimension::Time => Ok(Self(unit)),
            actual => Err(UomError::DimensionMismatch {
                expected: Dimension::Time,
                actual,
            }),
        }
    }

    pub fn create(&self, value: f64) -> Time {
        Time::new(value, self.clone())
    }

    pub fn as_unit(&self) -> &Unit {
        &self.0
    }
}

impl Deref for TimeUnit {
    type Target = Unit;

    fn deref(&self) -> &Unit {
        &self.0
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A unit of the `Rate` dimension: one length unit per one time unit.
///
/// Canonical rate is micrometers per minute, so
/// `canonical_quantity = length.canonical_quantity * 60e6 / time.canonical_quantity`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateUnit {
    unit: Unit,
    length: LengthUnit,
    time: TimeUnit,
}

impl RateUnit {
    /// Canonical rate unit.
    pub const MICROMETERS_PER_MINUTE: Self = Self::builtin(
        "micrometers per minute",
        "um/min",
        LengthUnit::MICROMETERS,
        TimeUnit::MINUTES,
    );
    pub const MILLIMETERS_PER_SECOND: Self = Self::builtin(
        "millimeters per second",
        "mm/s",
        LengthUnit::MILLIMETERS,
        TimeUnit::SECONDS,
    );
    pub const CENTIMETERS_PER_SECOND: Self = Self::builtin(
        "centimeters per second",
        "cm/s",
        LengthUnit::CENTIMETERS,
        TimeUnit::SECONDS,
    );
    pub const INCHES_PER_SECOND: Self =
        Self::builtin("inches per second", "in/s", LengthUnit::INCHES, TimeUnit::SECONDS);
    pub const INCHES_PER_MINUTE: Self =
        Self::builtin("inches per minute", "in/min", LengthUnit::INCHES, TimeUnit::MINUTES);
    pub const FEET_PER_SECOND: Self =
        Self::builtin("feet per second", "ft/s", LengthUnit::FEET, TimeUnit::SECONDS);
    pub const METERS_PER_SECOND: Self =
        Self::builtin("meters per second", "m/s", LengthUnit::METERS, TimeUnit::SECONDS);

    const fn builtin(
        name: &'static str,
        abbreviation: &'static str,
        length: LengthUnit,
        time: TimeUnit,
    ) -> Self {
        let quantity =
            length.0.canonical_quantity * MICROSECONDS_PER_MINUTE / time.0.canonical_quantity;
        Self {
            unit: Unit::builtin(Dimension::Rate, name, abbreviation, quantity),
            length,
            time,
        }
    }

    /// Compose a rate unit from any length and time unit.
    ///
    /// # Errors
    ///
    /// `UomError::InvalidUnit` if the composition is smaller than the
    /// canonical rate (a time unit longer than a minute over micrometers).
    pub fn per(length: &LengthUnit, time: &TimeUnit) -> Result<Self, UomError> {
        let quantity =
            length.canonical_quantity() * MICROSECONDS_PER_MINUTE / time.canonical_quantity();
        if !quantity.is_finite() || quantity < 1.0 {
            return Err(UomError::InvalidUnit(format!(
                "{}/{} is finer than the canonical rate unit",
                length.abbreviation(),
                time.abbreviation()
            )));
        }
        let unit = Unit {
            dimension: Dimension::Rate,
            name: Cow::Owned(format!("{} per {}", length.name(), time.name())),
            abbreviation: Cow::Owned(format!(
                "{}/{}",
                length.abbreviation(),
                time.abbreviation()
            )),
            canonical_quantity: quantity,
        };
        Ok(Self {
            unit,
            length: length.clone(),
            time: time.clone(),
        })
    }

    /// Length component of this rate.
    #[inline]
    pub fn length(&self) -> &LengthUnit {
        &self.length
    }

    /// Time component of this rate.
    #[inline]
    pub fn time(&self) -> &TimeUnit {
        &self.time
    }

    pub fn create(&self, value: f64) -> Rate {
        Rate::new(value, self.clone())
    }

    pub fn as_unit(&self) -> &Unit {
        &self.unit
    }
}

impl Deref for RateUnit {
    type Target = Unit;

    fn deref(&self) -> &Unit {
        &self.unit
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.unit.fmt(f)
    }
}
