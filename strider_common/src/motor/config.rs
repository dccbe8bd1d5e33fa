//! Per-motor configuration.
//!
//! [`MotorConfig`] is the TOML shape: units and quantities are strings
//! resolved through a [`UnitRegistry`]. [`MotorConfig::resolve`] validates
//! it and produces [`MotorSettings`], the typed form controllers are built
//! from.
//!
//! ```toml
//! name = "elevator"
//! default_rate = "10 in/s"
//! sensor_unit = "pulse"
//!
//! [units]
//! length = "in"
//! rate = "in/s"
//!
//! [[units.custom]]
//! name = "pulses"
//! abbreviation = "pulse"
//! equals = "0.01 in"
//!
//! [rates]
//! max_forward = "20 in/s"
//! max_reverse = "12 in/s"
//!
//! [limits.forward]
//! soft = "50 in"
//! hard = "60 in"
//! physical = "70 in"
//!
//! [limits.reverse]
//! hard = "0 in"
//! hard_resets_encoder = true
//! physical = "-2 in"
//! ```

use serde::{Deserialize, Serialize};

use super::{ControllerCapabilities, Direction, DirectionalLimits, HardLimit, MotorLimits, RateLimits};
use crate::config::ConfigError;
use crate::uom::{Length, LengthUnit, Rate, RateUnit, UnitRegistry, UomError};

/// Motor configuration as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorConfig {
    /// Motor identifier used in logs and errors.
    pub name: String,

    #[serde(default)]
    pub units: UnitsConfig,

    /// Native unit of the position sensor; defaults to the length unit.
    #[serde(default)]
    pub sensor_unit: Option<String>,

    /// Rate used when a rate or calibration command carries none.
    pub default_rate: String,

    #[serde(default)]
    pub rates: RatesConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub inversion: InversionConfig,

    /// Capability names; all capabilities when absent.
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
}

/// `[units]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitsConfig {
    #[serde(default = "default_length_unit")]
    pub length: String,

    #[serde(default = "default_rate_unit")]
    pub rate: String,

    #[serde(default)]
    pub custom: Vec<CustomUnitConfig>,
}

fn default_length_unit() -> String {
    "in".to_string()
}

fn default_rate_unit() -> String {
    "in/s".to_string()
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            length: default_length_unit(),
            rate: default_rate_unit(),
            custom: Vec::new(),
        }
    }
}

/// `[[units.custom]]` entry: a length unit defined by what one of it equals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomUnitConfig {
    pub name: String,
    pub abbreviation: String,
    /// Quantity string, e.g. `"0.01 in"`.
    pub equals: String,
}

/// `[rates]` table. Missing minimums are zero; missing maximums are the
/// default rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesConfig {
    pub min_forward: Option<String>,
    pub max_forward: Option<String>,
    pub min_reverse: Option<String>,
    pub max_reverse: Option<String>,
}

/// `[limits]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub forward: DirectionalLimitConfig,
    #[serde(default)]
    pub reverse: DirectionalLimitConfig,
}

/// `[limits.forward]` / `[limits.reverse]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionalLimitConfig {
    pub soft: Option<String>,
    pub hard: Option<String>,
    #[serde(default)]
    pub hard_resets_encoder: bool,
    /// Unbounded when absent.
    pub physical: Option<String>,
}

/// `[inversion]` table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InversionConfig {
    #[serde(default)]
    pub sensor: bool,
    #[serde(default)]
    pub motor: bool,
}

/// Resolved, validated motor settings.
#[derive(Debug, Clone)]
pub struct MotorSettings {
    pub name: String,
    pub length_unit: LengthUnit,
    pub rate_unit: RateUnit,
    pub sensor_unit: LengthUnit,
    pub default_rate: Rate,
    pub rates: RateLimits,
    pub limits: MotorLimits,
    pub sensor_inverted: bool,
    pub motor_inverted: bool,
    pub capabilities: ControllerCapabilities,
}

impl MotorSettings {
    /// Unbounded motor with rates `[0, default_rate]`, no inversion and
    /// every capability.
    pub fn new(
        name: impl Into<String>,
        length_unit: LengthUnit,
        rate_unit: RateUnit,
        default_rate: Rate,
    ) -> Self {
        let default_rate = default_rate.convert_to(&rate_unit);
        Self {
            name: name.into(),
            sensor_unit: length_unit.clone(),
            limits: MotorLimits::unbounded(length_unit.clone()),
            rates: RateLimits::symmetric(default_rate.clone()),
            length_unit,
            rate_unit,
            default_rate,
            sensor_inverted: false,
            motor_inverted: false,
            capabilities: ControllerCapabilities::all(),
        }
    }

    pub fn with_limits(mut self, limits: MotorLimits) -> Self {
        self.limits = limits.convert_to(&self.length_unit);
        self
    }

    pub fn with_rates(mut self, rates: RateLimits) -> Self {
        self.rates = rates.convert_to(&self.rate_unit);
        self
    }

    pub fn with_capabilities(mut self, capabilities: ControllerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_sensor_unit(mut self, unit: LengthUnit) -> Self {
        self.sensor_unit = unit;
        self
    }

    pub fn with_inversion(mut self, sensor: bool, motor: bool) -> Self {
        self.sensor_inverted = sensor;
        self.motor_inverted = motor;
        self
    }

    /// Capabilities the configured limits and inversion flags depend on.
    pub fn required_capabilities(&self) -> ControllerCapabilities {
        let mut required = ControllerCapabilities::empty();
        for (direction, soft, hard) in [
            (
                Direction::Forward,
                ControllerCapabilities::FORWARD_SOFT_LIMIT,
                ControllerCapabilities::FORWARD_HARD_LIMIT,
            ),
            (
                Direction::Reverse,
                ControllerCapabilities::REVERSE_SOFT_LIMIT,
                ControllerCapabilities::REVERSE_HARD_LIMIT,
            ),
        ] {
            let limits = self.limits.in_direction(direction);
            required.set(soft, limits.soft.is_some());
            required.set(hard, limits.hard.is_some());
        }
        required.set(ControllerCapabilities::SENSOR_INVERSION, self.sensor_inverted);
        required.set(ControllerCapabilities::MOTOR_INVERSION, self.motor_inverted);
        required
    }

    /// Check rates, limits and that every configured limit or inversion
    /// is backed by a capability.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` naming the motor and the first
    /// violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("motor name cannot be empty"));
        }
        if !self.default_rate.is_finite() || self.default_rate.value() <= 0.0 {
            return Err(ConfigError::invalid(format!(
                "{}: default rate {} must be positive",
                self.name, self.default_rate
            )));
        }
        self.rates
            .validate()
            .map_err(|e| ConfigError::invalid(format!("{}: {e}", self.name)))?;
        self.limits
            .validate()
            .map_err(|e| ConfigError::invalid(format!("{}: {e}", self.name)))?;
        let missing = self.required_capabilities().difference(self.capabilities);
        if !missing.is_empty() {
            let names: Vec<String> = missing
                .iter_names()
                .map(|(name, _)| name.to_ascii_lowercase())
                .collect();
            return Err(ConfigError::invalid(format!(
                "{}: configured without capabilities: {}",
                self.name,
                names.join(", ")
            )));
        }
        Ok(())
    }
}

impl MotorConfig {
    /// Resolve every unit and quantity, then validate.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` on unknown units, malformed
    /// quantities, unknown capability names or inconsistent limits.
    pub fn resolve(&self) -> Result<MotorSettings, ConfigError> {
        let registry = self.registry()?;

        let length_unit = self.field("units.length", registry.length_unit(&self.units.length))?;
        let rate_unit = self.field("units.rate", registry.rate_unit(&self.units.rate))?;
        let sensor_unit = match &self.sensor_unit {
            Some(unit) => self.field("sensor_unit", registry.length_unit(unit))?,
            None => length_unit.clone(),
        };
        let default_rate = self
            .field("default_rate", registry.parse_rate(&self.default_rate))?
            .convert_to(&rate_unit);

        let rate = |key: &str, text: &Option<String>, fallback: &Rate| -> Result<Rate, ConfigError> {
            match text {
                Some(text) => Ok(self
                    .field(key, registry.parse_rate(text))?
                    .convert_to(&rate_unit)),
                None => Ok(fallback.clone()),
            }
        };
        let zero = Rate::zero(rate_unit.clone());
        let rates = RateLimits {
            min_forward: rate("rates.min_forward", &self.rates.min_forward, &zero)?,
            max_forward: rate("rates.max_forward", &self.rates.max_forward, &default_rate)?,
            min_reverse: rate("rates.min_reverse", &self.rates.min_reverse, &zero)?,
            max_reverse: rate("rates.max_reverse", &self.rates.max_reverse, &default_rate)?,
        };

        let limits = MotorLimits::new(
            self.directional_limits(&registry, Direction::Forward, &length_unit)?,
            self.directional_limits(&registry, Direction::Reverse, &length_unit)?,
        );

        let capabilities = match &self.capabilities {
            Some(names) => ControllerCapabilities::from_names(names).map_err(|name| {
                ConfigError::invalid(format!("{}: unknown capability '{name}'", self.name))
            })?,
            None => ControllerCapabilities::all(),
        };

        let settings = MotorSettings {
            name: self.name.clone(),
            length_unit,
            rate_unit,
            sensor_unit,
            default_rate,
            rates,
            limits,
            sensor_inverted: self.inversion.sensor,
            motor_inverted: self.inversion.motor,
            capabilities,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Built-in units plus this motor's `[[units.custom]]` definitions.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` on a malformed or duplicate custom
    /// unit.
    pub fn registry(&self) -> Result<UnitRegistry, ConfigError> {
        let mut registry = UnitRegistry::new();
        for custom in &self.units.custom {
            let equals = self.field("units.custom.equals", registry.parse_length(&custom.equals))?;
            self.field(
                "units.custom",
                registry.define_length(&custom.name, &custom.abbreviation, &equals),
            )?;
        }
        Ok(registry)
    }

    fn directional_limits(
        &self,
        registry: &UnitRegistry,
        direction: Direction,
        unit: &LengthUnit,
    ) -> Result<DirectionalLimits, ConfigError> {
        let config = match direction {
            Direction::Forward => &self.limits.forward,
            Direction::Reverse => &self.limits.reverse,
        };
        let length = |key: &str, text: &str| -> Result<Length, ConfigError> {
            Ok(self
                .field(&format!("limits.{direction}.{key}"), registry.parse_length(text))?
                .convert_to(unit))
        };

        let mut limits = DirectionalLimits::unbounded(direction, unit.clone());
        if let Some(soft) = &config.soft {
            limits.soft = Some(length("soft", soft)?);
        }
        if let Some(hard) = &config.hard {
            limits.hard = Some(HardLimit {
                position: length("hard", hard)?,
                resets_encoder: config.hard_resets_encoder,
            });
        } else if config.hard_resets_encoder {
            return Err(ConfigError::invalid(format!(
                "{}: limits.{direction}.hard_resets_encoder set without a hard limit",
                self.name
            )));
        }
        if let Some(physical) = &config.physical {
            limits.physical = length("physical", physical)?;
        }
        Ok(limits)
    }

    fn field<T>(&self, key: &str, result: Result<T, UomError>) -> Result<T, ConfigError> {
        result.map_err(|e| ConfigError::invalid(format!("{}: {key}: {e}", self.name)))
    }
}
