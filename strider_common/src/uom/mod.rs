//! Units of measure and typed quantities.
//!
//! Every physical quantity a motor deals with (position, rate, elapsed
//! time) carries its unit. Conversion always goes through the one
//! canonical unit of the dimension:
//!
//! ```text
//! result = value * from.canonical_quantity / to.canonical_quantity
//! ```
//!
//! | Dimension | Canonical unit        |
//! |-----------|-----------------------|
//! | Length    | micrometer            |
//! | Time      | microsecond           |
//! | Rate      | micrometer per minute |
//!
//! Arithmetic between two quantities converts the right operand into the
//! left operand's unit and returns the left operand's unit.

mod error;
pub(crate) mod quantity;
mod length;
mod rate;
mod registry;
mod time;
mod unit;

pub use error::UomError;
pub use length::Length;
pub use quantity::Quantity;
pub use rate::Rate;
pub use registry::UnitRegistry;
pub use time::Time;
pub use unit::{Dimension, LengthUnit, RateUnit, TimeUnit, Unit};
