//! Unit-of-measure error type.

use thiserror::Error;

use super::Dimension;

/// Errors raised by unit definitions, conversions and parsing.
///
/// `DimensionMismatch` is a programmer error: it is raised immediately and
/// never coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UomError {
    /// Conversion or arithmetic between incompatible dimensions.
    #[error("Dimension mismatch: expected {expected}, found {actual}")]
    DimensionMismatch {
        /// Dimension of the left operand / source quantity.
        expected: Dimension,
        /// Dimension that was supplied.
        actual: Dimension,
    },

    /// Unit definition violates the canonical-unit invariant.
    #[error("Invalid unit definition: {0}")]
    InvalidUnit(String),

    /// Unit name or abbreviation not known to the registry.
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Quantity string could not be parsed.
    #[error("Cannot parse quantity: {0}")]
    Parse(String),
}
