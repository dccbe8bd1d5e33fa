//! Unit lookup and quantity parsing.
//!
//! Configuration files name units as text (`"in"`, `"inches"`, `"in/s"`)
//! and write quantities as `"<value> <unit>"`. The registry resolves both
//! against the built-in units plus any custom length units defined at
//! runtime (encoder pulses, spool revolutions).

use super::{Length, LengthUnit, Quantity, Rate, RateUnit, Time, TimeUnit, UomError};

/// Known units, built-ins first.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    lengths: Vec<LengthUnit>,
    times: Vec<TimeUnit>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Registry holding the built-in length and time units.
    pub fn new() -> Self {
        Self {
            lengths: LengthUnit::BUILTIN.to_vec(),
            times: TimeUnit::BUILTIN.to_vec(),
        }
    }

    /// Define a custom length unit equal to `equals`.
    ///
    /// # Errors
    ///
    /// `UomError::InvalidUnit` if the name or abbreviation is already taken
    /// or the unit would not be bigger than the canonical unit.
    pub fn define_length(
        &mut self,
        name: &str,
        abbreviation: &str,
        equals: &Length,
    ) -> Result<LengthUnit, UomError> {
        if self.find_length(name).is_some() || self.find_length(abbreviation).is_some() {
            return Err(UomError::InvalidUnit(format!(
                "length unit {name} ({abbreviation}) is already defined"
            )));
        }
        let unit = LengthUnit::custom(name.to_string(), abbreviation.to_string(), equals)?;
        self.lengths.push(unit.clone());
        Ok(unit)
    }

    /// All length units, built-in and custom.
    pub fn length_units(&self) -> &[LengthUnit] {
        &self.lengths
    }

    /// Resolve a length unit by name (case-insensitive) or abbreviation.
    pub fn length_unit(&self, key: &str) -> Result<LengthUnit, UomError> {
        self.find_length(key)
            .cloned()
            .ok_or_else(|| UomError::UnknownUnit(key.to_string()))
    }

    /// Resolve a time unit by name (case-insensitive) or abbreviation.
    pub fn time_unit(&self, key: &str) -> Result<TimeUnit, UomError> {
        let key = key.trim();
        self.times
            .iter()
            .find(|u| u.abbreviation() == key || u.name().eq_ignore_ascii_case(key))
            .cloned()
            .ok_or_else(|| UomError::UnknownUnit(key.to_string()))
    }

    /// Resolve a rate unit written as `<length>/<time>` or
    /// `<length> per <time>`.
    pub fn rate_unit(&self, key: &str) -> Result<RateUnit, UomError> {
        let key = key.trim();
        let (length, time) = key
            .split_once('/')
            .or_else(|| key.split_once(" per "))
            .ok_or_else(|| UomError::UnknownUnit(key.to_string()))?;
        let length = self.length_unit(length)?;
        let time = self.time_unit(time)?;
        RateUnit::per(&length, &time)
    }

    /// Parse `"<value> <length unit>"`, e.g. `"30 in"`.
    pub fn parse_length(&self, text: &str) -> Result<Length, UomError> {
        let (value, unit) = split_quantity(text)?;
        Ok(self.length_unit(unit)?.create(value))
    }

    /// Parse `"<value> <time unit>"`, e.g. `"250 ms"`.
    pub fn parse_time(&self, text: &str) -> Result<Time, UomError> {
        let (value, unit) = split_quantity(text)?;
        Ok(self.time_unit(unit)?.create(value))
    }

    /// Parse `"<value> <rate unit>"`, e.g. `"12.5 in/s"`.
    pub fn parse_rate(&self, text: &str) -> Result<Rate, UomError> {
        let (value, unit) = split_quantity(text)?;
        Ok(self.rate_unit(unit)?.create(value))
    }

    /// Parse a quantity of whichever dimension its unit names.
    pub fn parse_quantity(&self, text: &str) -> Result<Quantity, UomError> {
        let (value, unit) = split_quantity(text)?;
        if let Ok(u) = self.length_unit(unit) {
            return Ok(u.as_unit().create(value));
        }
        if let Ok(u) = self.time_unit(unit) {
            return Ok(u.as_unit().create(value));
        }
        Ok(self.rate_unit(unit)?.as_unit().create(value))
    }

    fn find_length(&self, key: &str) -> Option<&LengthUnit> {
        let key = key.trim();
        self.lengths
            .iter()
            .find(|u| u.abbreviation() == key || u.name().eq_ignore_ascii_case(key))
    }
}

fn split_quantity(text: &str) -> Result<(f64, &str), UomError> {
    let text = text.trim();
    let (value, unit) = text
        .split_once(char::is_whitespace)
        .ok_or_else(|| UomError::Parse(format!("'{text}' is not '<value> <unit>'")))?;
    let value: f64 = value
        .parse()
        .map_err(|_| UomError::Parse(format!("'{value}' is not a number")))?;
    Ok((value, unit.trim()))
}
