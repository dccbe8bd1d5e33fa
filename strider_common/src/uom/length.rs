//! Length quantities.

use super::quantity::typed_quantity;
use super::{LengthUnit, Quantity, UomError};

typed_quantity!(
    /// Travel along a mechanism's axis, in any length unit.
    Length,
    LengthUnit
);

impl TryFrom<Quantity> for Length {
    type Error = UomError;

    fn try_from(q: Quantity) -> Result<Self, UomError> {
        let value = q.value();
        let unit = LengthUnit::from_unit(q.unit().clone())?;
        Ok(Length::new(value, unit))
    }
}
