//! # curio-core
//!
//! Primitives for the Curio marketplace engine.
//!
//! This crate provides:
//!
//! - [`Amount`]: Overflow-checked monetary amount in smallest currency units
//! - [`Counter`]: Monotonically-incrementing counter primitive
//! - [`Address`] / [`Wallet`]: Ed25519-derived account identity

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod counter;
pub mod error;
pub mod wallet;

pub use amount::Amount;
pub use counter::Counter;
pub use error::CoreError;
pub use wallet::{Address, Wallet};
