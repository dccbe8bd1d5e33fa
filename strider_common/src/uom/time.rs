//! Time quantities.

use std::time::Duration;

use super::quantity::typed_quantity;
use super::{Quantity, TimeUnit, UomError};

typed_quantity!(
    /// Elapsed time, in any time unit.
    Time,
    TimeUnit
);

impl Time {
    /// Express a `Duration` in seconds.
    pub fn from_duration(duration: Duration) -> Self {
        Time::new(duration.as_secs_f64(), TimeUnit::SECONDS)
    }

    /// Convert to a `Duration`; `None` for negative or non-finite times.
    pub fn as_duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.value_in(&TimeUnit::SECONDS)).ok()
    }
}

impl TryFrom<Quantity> for Time {
    type Error = UomError;

    fn try_from(q: Quantity) -> Result<Self, UomError> {
        let value = q.value();
        let unit = TimeUnit::from_unit(q.unit().clone())?;
        Ok(Time::new(value, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_round_trip() {
        let t = Time::from_duration(Duration::from_millis(1500));
        assert_eq!(t.unit(), &TimeUnit::SECONDS);
        assert_eq!(t.value(), 1.5);
        assert_eq!(t.as_duration(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn negative_time_has_no_duration() {
        assert_eq!(TimeUnit::SECONDS.create(-1.0).as_duration(), None);
        assert_eq!(TimeUnit::SECONDS.create(f64::INFINITY).as_duration(), None);
    }

    #[test]
    fn minutes_to_milliseconds() {
        let t = TimeUnit::MINUTES.create(0.5).convert_to(&TimeUnit::MILLISECONDS);
        assert!((t.value() - 30_000.0).abs() < 1e-9);
    }
}
