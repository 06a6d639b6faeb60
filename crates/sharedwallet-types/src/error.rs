//! Error types for SharedWallet
//!
//! Every failure is terminal for the call that raised it and leaves the
//! wallet exactly as it was before the call.

use thiserror::Error;

use crate::{Amount, Identity};

/// Result type for SharedWallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// SharedWallet error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    // ========================================================================
    // Authorization Errors
    // ========================================================================

    /// A privileged operation was invoked by someone other than the owner
    #[error("Caller {caller} is not the owner")]
    NotOwner { caller: Identity },

    /// No allowance, or an allowance smaller than the requested amount.
    /// Deliberately carries no amounts.
    #[error("You are not allowed")]
    NotAllowed,

    // ========================================================================
    // Ledger Errors
    // ========================================================================

    /// The pool cannot cover an otherwise-authorized withdrawal
    #[error("Wallet doesn't own enough money: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    /// A running total would exceed the representable range
    #[error("Amount overflow during arithmetic operation")]
    BalanceOverflow,

    // ========================================================================
    // Input Errors
    // ========================================================================

    /// A transfer amount of zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Identity could not be parsed
    #[error("Invalid identity: {input}")]
    InvalidIdentity { input: String },
}

impl WalletError {
    /// Short machine-readable code, used in journals and CLI scripts
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOwner { .. } => "not_owner",
            Self::NotAllowed => "not_allowed",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::BalanceOverflow => "balance_overflow",
            Self::ZeroAmount => "zero_amount",
            Self::InvalidIdentity { .. } => "invalid_identity",
        }
    }
}
