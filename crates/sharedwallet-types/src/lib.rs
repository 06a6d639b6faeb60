//! SharedWallet Types - Canonical domain types for the shared wallet
//!
//! This crate has no dependencies on other sharedwallet crates. It defines:
//!
//! - [`Identity`]: opaque fixed-size account identifier
//! - [`Amount`] and [`PositiveAmount`]: quantities of the custodied unit
//! - [`WalletError`]: the error taxonomy shared by every layer

pub mod identity;
pub mod amount;
pub mod error;

pub use identity::*;
pub use amount::*;
pub use error::*;
