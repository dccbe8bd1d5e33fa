//! Rate quantities and the two cross-dimension operations.

use super::quantity::typed_quantity;
use super::{Length, RateUnit, Time};

typed_quantity!(
    /// Length per time, in any rate unit.
    Rate,
    RateUnit
);

impl Rate {
    /// Distance covered at this rate over `time`: `rate x time = length`.
    ///
    /// `time` is first converted into this rate's time unit; the result is
    /// in this rate's length unit.
    pub fn to_length(&self, time: &Time) -> Length {
        let elapsed = time.value_in(self.unit().time());
        Length::new(self.value() * elapsed, self.unit().length().clone())
    }

    /// Time needed to cover `length` at this rate: `length / rate = time`.
    ///
    /// Exact inverse of [`Rate::to_length`]. A zero rate yields an infinite
    /// (or NaN for zero length) time rather than panicking.
    pub fn to_time(&self, length: &Length) -> Time {
        let distance = length.value_in(self.unit().length());
        Time::new(distance / self.value(), self.unit().time().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uom::{LengthUnit, TimeUnit};

    #[test]
    fn rate_times_time_is_length() {
        let rate = RateUnit::INCHES_PER_SECOND.create(10.0);
        let length = rate.to_length(&TimeUnit::MILLISECONDS.create(500.0));
        assert_eq!(length.unit(), &LengthUnit::INCHES);
        assert!((length.value() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn length_over_rate_is_time() {
        let rate = RateUnit::FEET_PER_SECOND.create(2.0);
        let time = rate.to_time(&LengthUnit::INCHES.create(48.0));
        assert_eq!(time.unit(), &TimeUnit::SECONDS);
        assert!((time.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn to_length_and_to_time_are_inverses() {
        let rate = RateUnit::METERS_PER_SECOND.create(1.7);
        let t = TimeUnit::MINUTES.create(0.25);
        let back = rate.to_time(&rate.to_length(&t));
        assert_eq!(back, t);
    }

    #[test]
    fn zero_rate_takes_forever() {
        let rate = RateUnit::INCHES_PER_SECOND.create(0.0);
        let t = rate.to_time(&LengthUnit::INCHES.create(1.0));
        assert!(t.value().is_infinite());
    }

    #[test]
    fn rate_conversion() {
        let r = RateUnit::INCHES_PER_SECOND.create(1.0);
        let per_min = r.convert_to(&RateUnit::INCHES_PER_MINUTE);
        assert!((per_min.value() - 60.0).abs() < 1e-9);
    }
}
