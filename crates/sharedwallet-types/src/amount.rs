//! Amount types
//!
//! Amounts are unsigned integers in the smallest indivisible unit of the
//! custodied value. There is exactly one asset, so no currency or decimals
//! are carried alongside the value.

use crate::{Result, WalletError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative quantity of the custodied unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Checked addition that reports overflow as a [`WalletError`]
    pub fn try_add(self, other: Self) -> Result<Self> {
        self.checked_add(other).ok_or(WalletError::BalanceOverflow)
    }

    /// Addition clamped at `u64::MAX`, for statistics that must never fail
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<PositiveAmount> for Amount {
    fn from(value: PositiveAmount) -> Self {
        value.0
    }
}

/// An [`Amount`] that is known to be greater than zero
///
/// Withdrawals and debits take this type, so a zero-value transfer is
/// rejected where the amount enters the system rather than deep inside the
/// ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Amount", into = "Amount")]
pub struct PositiveAmount(Amount);

impl PositiveAmount {
    /// Create from a raw value, failing on zero
    pub fn new(value: u64) -> Result<Self> {
        Self::try_from(Amount(value))
    }

    pub fn amount(&self) -> Amount {
        self.0
    }

    pub fn value(&self) -> u64 {
        self.0 .0
    }
}

impl TryFrom<Amount> for PositiveAmount {
    type Error = WalletError;

    fn try_from(amount: Amount) -> Result<Self> {
        if amount.is_zero() {
            return Err(WalletError::ZeroAmount);
        }
        Ok(Self(amount))
    }
}

impl fmt::Display for PositiveAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
