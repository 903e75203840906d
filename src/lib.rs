//! A validator-submitted price oracle for a deterministic replicated state
//! machine.
//!
//! The [`oracle`] module holds the domain logic. Everything else is the
//! supporting state layer it is built on: an ordered key/value [`store`],
//! order-preserving [`encoding`], typed [`collections`], checked fixed-point
//! [`decimal`] arithmetic and the narrow [`staking`] capabilities the oracle
//! consumes from other modules.

#![feature(trivial_bounds)]

pub mod address;
pub mod collections;
pub mod context;
pub mod decimal;
pub mod encoding;
mod error;
pub mod mock;
pub mod oracle;
pub mod staking;
pub mod store;

pub use error::*;
