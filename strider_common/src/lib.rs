//! STRIDER Common Library
//!
//! Units of measure, motor target states and the motor controller
//! contract shared by every STRIDER crate.
//!
//! # Module Structure
//!
//! - [`uom`] - Units of measure and typed quantities
//! - [`motor`] - Operations, target states, limits and the controller traits
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Canonical unit ratios and default timings
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! strider = { package = "strider_common", path = "../strider_common" }
//! ```
//!
//! ```rust
//! use strider_common::prelude::*;
//!
//! let target = LengthUnit::INCHES.create(10.0);
//! assert_eq!(target, LengthUnit::METERS.create(0.254));
//! ```

pub mod config;
pub mod consts;
pub mod motor;
pub mod prelude;
pub mod uom;

static_assertions::assert_impl_all!(motor::MotorState: Send, Sync);
static_assertions::assert_impl_all!(uom::Length: Send, Sync, Clone);
static_assertions::assert_impl_all!(uom::Rate: Send, Sync, Clone);
static_assertions::assert_obj_safe!(motor::MotorReader);
