//! Dimension-checked quantities.
//!
//! [`Quantity`] is the untyped form: any unit, checked at runtime. The
//! typed wrappers ([`Length`](super::Length), [`Rate`](super::Rate),
//! [`Time`](super::Time)) fix the dimension in the type, so their
//! conversions cannot fail.

use std::fmt;

use super::{Dimension, Unit, UomError};
use crate::consts::EQUALITY_TOLERANCE;

/// Compare two canonical values within the workspace relative tolerance.
#[inline]
pub(crate) fn canonical_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= EQUALITY_TOLERANCE * scale
}

/// A value bound to a unit of any dimension.
#[derive(Debug, Clone)]
pub struct Quantity {
    unit: Unit,
    value: f64,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { unit, value }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    /// Value expressed in the canonical unit of this dimension.
    #[inline]
    pub fn canonical_value(&self) -> f64 {
        self.value * self.unit.canonical_quantity()
    }

    /// Re-express this quantity in `unit`.
    ///
    /// # Errors
    ///
    /// `UomError::DimensionMismatch` if `unit` measures another dimension.
    pub fn convert_to(&self, unit: &Unit) -> Result<Quantity, UomError> {
        self.unit.check_compatible(unit)?;
        if &self.unit == unit {
            return Ok(self.clone());
        }
        Ok(Quantity::new(
            self.value * self.unit.canonical_quantity() / unit.canonical_quantity(),
            unit.clone(),
        ))
    }

    /// `self + other`, in `self`'s unit.
    pub fn try_add(&self, other: &Quantity) -> Result<Quantity, UomError> {
        let rhs = other.convert_to(&self.unit).map_err(|_| self.mismatch(other))?;
        Ok(Quantity::new(self.value + rhs.value, self.unit.clone()))
    }

    /// `self - other`, in `self`'s unit.
    pub fn try_sub(&self, other: &Quantity) -> Result<Quantity, UomError> {
        let rhs = other.convert_to(&self.unit).map_err(|_| self.mismatch(other))?;
        Ok(Quantity::new(self.value - rhs.value, self.unit.clone()))
    }

    /// `self * other`, in `self`'s unit.
    pub fn try_mul(&self, other: &Quantity) -> Result<Quantity, UomError> {
        let rhs = other.convert_to(&self.unit).map_err(|_| self.mismatch(other))?;
        Ok(Quantity::new(self.value * rhs.value, self.unit.clone()))
    }

    /// `self / other`, in `self`'s unit.
    pub fn try_div(&self, other: &Quantity) -> Result<Quantity, UomError> {
        let rhs = other.convert_to(&self.unit).map_err(|_| self.mismatch(other))?;
        Ok(Quantity::new(self.value / rhs.value, self.unit.clone()))
    }

    fn mismatch(&self, other: &Quantity) -> UomError {
        UomError::DimensionMismatch {
            expected: self.dimension(),
            actual: other.dimension(),
        }
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.dimension() == other.dimension()
            && canonical_eq(self.canonical_value(), other.canonical_value())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*} {}", p, self.value, self.unit),
            None => write!(f, "{} {}", self.value, self.unit),
        }
    }
}

/// Generates a typed quantity bound to one dimension's unit type.
macro_rules! typed_quantity {
    ($(#[$meta:meta])* $name:ident, $unit:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            unit: $unit,
            value: f64,
        }

        impl $name {
            pub fn new(value: f64, unit: $unit) -> Self {
                Self { unit, value }
            }

            pub fn zero(unit: $unit) -> Self {
                Self::new(0.0, unit)
            }

            #[inline]
            pub fn value(&self) -> f64 {
                self.value
            }

            #[inline]
            pub fn unit(&self) -> &$unit {
                &self.unit
            }

            /// Value expressed in the canonical unit of this dimension.
            #[inline]
            pub fn canonical_value(&self) -> f64 {
                self.value * self.unit.canonical_quantity()
            }

            /// Re-express in `unit`; exact when `unit` is already ours.
            pub fn convert_to(&self, unit: &$unit) -> Self {
                if &self.unit == unit {
                    return self.clone();
                }
                Self::new(self.value_in(unit), unit.clone())
            }

            /// Raw value this quantity would have in `unit`.
            #[inline]
            pub fn value_in(&self, unit: &$unit) -> f64 {
                if &self.unit == unit {
                    return self.value;
                }
                self.value * self.unit.canonical_quantity() / unit.canonical_quantity()
            }

            /// `self * other`, with `other` first converted into our unit.
            pub fn multiply(&self, other: &Self) -> Self {
                Self::new(self.value * other.value_in(&self.unit), self.unit.clone())
            }

            /// `self / other`, with `other` first converted into our unit.
            pub fn divide(&self, other: &Self) -> Self {
                Self::new(self.value / other.value_in(&self.unit), self.unit.clone())
            }

            pub fn abs(&self) -> Self {
                Self::new(self.value.abs(), self.unit.clone())
            }

            #[inline]
            pub fn is_zero(&self) -> bool {
                self.value == 0.0
            }

            #[inline]
            pub fn is_finite(&self) -> bool {
                self.value.is_finite()
            }

            /// The smaller of two quantities, in `self`'s unit.
            pub fn min(&self, other: &Self) -> Self {
                if other < self {
                    other.convert_to(&self.unit)
                } else {
                    self.clone()
                }
            }

            /// The larger of two quantities, in `self`'s unit.
            pub fn max(&self, other: &Self) -> Self {
                if other > self {
                    other.convert_to(&self.unit)
                } else {
                    self.clone()
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                $crate::uom::quantity::canonical_eq(self.canonical_value(), other.canonical_value())
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                if self == other {
                    return Some(std::cmp::Ordering::Equal);
                }
                self.canonical_value().partial_cmp(&other.canonical_value())
            }
        }

        impl std::ops::Add for $name {
            type Output = $name;

            fn add(self, rhs: $name) -> $name {
                let rhs = rhs.value_in(&self.unit);
                $name::new(self.value + rhs, self.unit)
            }
        }

        impl std::ops::Add<&$name> for &$name {
            type Output = $name;

            fn add(self, rhs: &$name) -> $name {
                $name::new(self.value + rhs.value_in(&self.unit), self.unit.clone())
            }
        }

        impl std::ops::Sub for $name {
            type Output = $name;

            fn sub(self, rhs: $name) -> $name {
                let rhs = rhs.value_in(&self.unit);
                $name::new(self.value - rhs, self.unit)
            }
        }

        impl std::ops::Sub<&$name> for &$name {
            type Output = $name;

            fn sub(self, rhs: &$name) -> $name {
                $name::new(self.value - rhs.value_in(&self.unit), self.unit.clone())
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;

            fn neg(self) -> $name {
                $name::new(-self.value, self.unit)
            }
        }

        impl std::ops::Mul<f64> for $name {
            type Output = $name;

            fn mul(self, rhs: f64) -> $name {
                $name::new(self.value * rhs, self.unit)
            }
        }

        impl std::ops::Div<f64> for $name {
            type Output = $name;

            fn div(self, rhs: f64) -> $name {
                $name::new(self.value / rhs, self.unit)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match f.precision() {
                    Some(p) => write!(f, "{:.*} {}", p, self.value, self.unit),
                    None => write!(f, "{} {}", self.value, self.unit),
                }
            }
        }

        impl From<$name> for $crate::uom::Quantity {
            fn from(q: $name) -> Self {
                $crate::uom::Quantity::new(q.value, q.unit.as_unit().clone())
            }
        }
    };
}

pub(crate) use typed_quantity;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uom::{LengthUnit, RateUnit, TimeUnit};

    #[test]
    fn convert_within_dimension() {
        let q = LengthUnit::INCHES.as_unit().create(10.0);
        let m = q.convert_to(LengthUnit::METERS.as_unit()).unwrap();
        assert!((m.value() - 0.254).abs() < 1e-12);
        assert_eq!(m.unit(), LengthUnit::METERS.as_unit());
    }

    #[test]
    fn convert_across_dimension_fails() {
        let q = LengthUnit::INCHES.as_unit().create(10.0);
        let err = q.convert_to(TimeUnit::SECONDS.as_unit()).unwrap_err();
        assert_eq!(
            err,
            UomError::DimensionMismatch {
                expected: Dimension::Length,
                actual: Dimension::Time,
            }
        );
    }

    #[test]
    fn arithmetic_keeps_left_unit() {
        let a = LengthUnit::INCHES.as_unit().create(1.0);
        let b = LengthUnit::CENTIMETERS.as_unit().create(2.54);
        let sum = a.try_add(&b).unwrap();
        assert_eq!(sum.unit(), LengthUnit::INCHES.as_unit());
        assert!((sum.value() - 2.0).abs() < 1e-12);

        let diff = b.try_sub(&a).unwrap();
        assert_eq!(diff.unit(), LengthUnit::CENTIMETERS.as_unit());
        assert!(diff.value().abs() < 1e-12);
    }

    #[test]
    fn arithmetic_across_dimension_fails() {
        let a = LengthUnit::INCHES.as_unit().create(1.0);
        let r = RateUnit::INCHES_PER_SECOND.as_unit().create(1.0);
        assert!(a.try_add(&r).is_err());
        assert!(a.try_sub(&r).is_err());
        assert!(a.try_mul(&r).is_err());
        assert!(a.try_div(&r).is_err());
    }

    #[test]
    fn mul_and_div_convert_right_operand() {
        let a = LengthUnit::FEET.as_unit().create(3.0);
        let b = LengthUnit::INCHES.as_unit().create(24.0);
        assert!((a.try_mul(&b).unwrap().value() - 6.0).abs() < 1e-12);
        assert!((a.try_div(&b).unwrap().value() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn equality_is_unit_independent() {
        let a = LengthUnit::INCHES.as_unit().create(10.0);
        let b = LengthUnit::METERS.as_unit().create(0.254);
        assert_eq!(a, b);
        let t = TimeUnit::SECONDS.as_unit().create(10.0);
        assert_ne!(a, t);
    }

    #[test]
    fn display_honours_precision() {
        let a = LengthUnit::INCHES.as_unit().create(30.0);
        assert_eq!(format!("{a:.3}"), "30.000 in");
        assert_eq!(format!("{a}"), "30 in");
    }

    #[test]
    fn canonical_eq_handles_infinities() {
        assert!(canonical_eq(f64::INFINITY, f64::INFINITY));
        assert!(!canonical_eq(f64::INFINITY, f64::NEG_INFINITY));
        assert!(canonical_eq(254_000.0, 254_000.000_000_1));
    }
}
