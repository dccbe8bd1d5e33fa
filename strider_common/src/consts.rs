//! System-wide constants for the STRIDER workspace.
//!
//! Single source of truth for canonical unit ratios and default timings.
//! Imported by all crates; no duplication permitted.

use std::time::Duration;

/// Canonical length unit: one micrometer.
pub const LENGTH_CANONICAL_QUANTITY: f64 = 1.0;

/// Canonical time unit: one microsecond.
pub const TIME_CANONICAL_QUANTITY: f64 = 1.0;

/// Micrometers per millimeter.
pub const MICROMETERS_PER_MILLIMETER: f64 = 1_000.0;

/// Micrometers per inch (exact, 25.4 mm).
pub const MICROMETERS_PER_INCH: f64 = 25_400.0;

/// Microseconds per second.
pub const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Microseconds per minute. Canonical rate is one micrometer per minute,
/// so a rate unit's canonical quantity is scaled by this value.
pub const MICROSECONDS_PER_MINUTE: f64 = 60.0 * MICROSECONDS_PER_SECOND;

/// Relative tolerance used when comparing canonical values for equality.
pub const EQUALITY_TOLERANCE: f64 = 1e-9;

/// Default periodic tick for controllers driven by a host loop (50 Hz).
pub const DEFAULT_PERIODIC_TICK: Duration = Duration::from_millis(20);

/// Default scenario file for the simulator binary.
pub const DEFAULT_SCENARIO_CONFIG: &str = "config/scenario.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert_eq!(LENGTH_CANONICAL_QUANTITY, 1.0);
        assert_eq!(TIME_CANONICAL_QUANTITY, 1.0);
        assert!(MICROMETERS_PER_INCH > MICROMETERS_PER_MILLIMETER);
        assert_eq!(MICROSECONDS_PER_MINUTE, 60_000_000.0);
        assert!(EQUALITY_TOLERANCE > 0.0 && EQUALITY_TOLERANCE < 1e-6);
    }

    #[test]
    fn default_tick_is_nonzero() {
        assert!(!DEFAULT_PERIODIC_TICK.is_zero());
    }
}
