//! Motor controller error type.

use thiserror::Error;

use super::MotorOperation;
use crate::uom::UomError;

/// Errors surfaced when submitting a state to a motor controller.
#[derive(Debug, Clone, Error)]
pub enum MotorError {
    /// The controller lacks the capability this operation needs. Raised
    /// before any hardware write.
    #[error("Motor '{motor}' does not support {operation}")]
    UnsupportedOperation {
        motor: String,
        operation: MotorOperation,
    },

    /// The low-level transition was not accepted; the previous target is
    /// still in effect.
    #[error("Motor '{motor}' rejected transition to {operation}")]
    TransitionRejected {
        motor: String,
        operation: MotorOperation,
    },

    /// Unit conversion failed.
    #[error(transparent)]
    Uom(#[from] UomError),

    /// Outbound driver failure.
    #[error("Driver error: {0}")]
    Driver(String),
}
