//! Motor target states and the controller contract.
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | `operation`  | [`MotorOperation`] and its classification predicates       |
//! | `direction`  | [`Direction`] of travel                                    |
//! | `state`      | [`MotorState`], [`MotorCommand`], [`StateId`]              |
//! | `factory`    | One constructor per operation, capturing start position    |
//! | `controller` | [`MotorReader`], [`MotorController`], capabilities         |
//! | `limits`     | Soft/hard/physical limits and rate bounds                  |
//! | `config`     | [`MotorConfig`] (TOML) and resolved [`MotorSettings`]      |

mod config;
mod controller;
mod direction;
mod error;
pub mod factory;
mod limits;
mod operation;
mod state;

pub use config::{
    CustomUnitConfig, DirectionalLimitConfig, InversionConfig, LimitsConfig, MotorConfig,
    MotorSettings, RatesConfig, UnitsConfig,
};
pub use controller::{ClosedLoopProfile, ControllerCapabilities, MotorController, MotorReader};
pub use direction::Direction;
pub use error::MotorError;
pub use limits::{
    DirectionalLimits, HardLimit, LimitKind, LimitSwitchStatus, MotorLimits, RateLimits,
    is_limit_exceeded, is_limit_reached, limit_status,
};
pub use operation::MotorOperation;
pub use state::{MotorCommand, MotorState, StateId};
