//! SharedWallet Ledger - Custody ledger for the shared pool
//!
//! The ledger is:
//! - Single-pool (one balance, one asset)
//! - Identity-agnostic (it never asks *who* withdraws, only *whether* the
//!   pool can cover it)
//! - Append-only (every movement leaves a [`LedgerEntry`])
//! - Payout-tracking (each destination's received total is kept)
//!
//! # Invariants
//!
//! 1. No negative balance
//! 2. `balance == total_deposited - total_withdrawn`
//! 3. Only the balance itself can reject a deposit
//! 4. A failed operation changes nothing
//!
//! Lifetime totals are `u128` and per-destination received totals saturate,
//! so volume that has passed through the pool never blocks new movements.
//!
//! The ledger has no interior locking. It is owned by exactly one wallet
//! aggregate, which serializes access to it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharedwallet_types::{Amount, Identity, PositiveAmount, Result, WalletError};
use uuid::Uuid;

/// Unique identifier for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Credit (increase) to the pool
    Credit,
    /// Debit (decrease) from the pool
    Debit,
}

/// Reason for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// Inbound value from anyone
    Deposit { from: Identity },
    /// Outbound value credited to a destination
    Payout { destination: Identity },
    /// Outbound value with no tracked destination
    Debit,
}

/// A single movement of the pool balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub entry_type: EntryType,
    pub amount: Amount,
    pub balance_after: Amount,
    pub reason: EntryReason,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub entry_id: EntryId,
    pub destination: Identity,
    pub amount: Amount,
    /// Pool balance after the debit
    pub balance_after: Amount,
    /// Destination's running received total after the credit
    pub destination_received: Amount,
}

/// The custody ledger
///
/// Holds the pool balance and the per-destination payout totals.
#[derive(Debug, Clone, Default)]
pub struct CustodyLedger {
    balance: Amount,
    total_deposited: u128,
    total_withdrawn: u128,
    /// destination -> total received from the pool, saturating at `u64::MAX`
    payouts: HashMap<Identity, Amount>,
    /// All entries (append-only)
    entries: Vec<LedgerEntry>,
}

impl CustodyLedger {
    /// Create an empty ledger (balance zero)
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pool balance
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Sum of all deposits ever accepted
    pub fn total_deposited(&self) -> u128 {
        self.total_deposited
    }

    /// Sum of all successful debits
    pub fn total_withdrawn(&self) -> u128 {
        self.total_withdrawn
    }

    /// Total value a destination has received from the pool
    pub fn received(&self, destination: &Identity) -> Amount {
        self.payouts.get(destination).copied().unwrap_or(Amount::zero())
    }

    /// All payout totals
    pub fn payouts(&self) -> &HashMap<Identity, Amount> {
        &self.payouts
    }

    /// Whether the pool can cover `amount`
    pub fn can_cover(&self, amount: PositiveAmount) -> bool {
        amount.amount() <= self.balance
    }

    /// Accept inbound value
    ///
    /// Zero is a no-op and records no entry. Returns the new balance.
    pub fn deposit(&mut self, from: Identity, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Ok(self.balance);
        }

        let new_balance = self.balance.try_add(amount)?;

        self.balance = new_balance;
        self.total_deposited += u128::from(amount.value());
        self.push_entry(EntryType::Credit, amount, EntryReason::Deposit { from });

        Ok(new_balance)
    }

    /// Decrease the pool balance
    ///
    /// Fails with `InsufficientFunds` if `amount > balance`. The caller is
    /// responsible for having authorized the withdrawal.
    pub fn debit(&mut self, amount: PositiveAmount) -> Result<Amount> {
        let new_balance = self.plan_debit(amount)?;

        self.apply_debit(new_balance, amount);
        self.push_entry(EntryType::Debit, amount.amount(), EntryReason::Debit);

        Ok(new_balance)
    }

    /// Debit the pool and credit `destination` as one step
    ///
    /// Only the pool balance can make this fail.
    pub fn pay_out(&mut self, destination: Identity, amount: PositiveAmount) -> Result<Payout> {
        let new_balance = self.plan_debit(amount)?;
        let new_received = self.received(&destination).saturating_add(amount.amount());

        self.apply_debit(new_balance, amount);
        self.payouts.insert(destination, new_received);
        let entry_id =
            self.push_entry(EntryType::Debit, amount.amount(), EntryReason::Payout { destination });

        Ok(Payout {
            entry_id,
            destination,
            amount: amount.amount(),
            balance_after: new_balance,
            destination_received: new_received,
        })
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Get the total number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Get recent entries (newest first)
    pub fn recent_entries(&self, limit: usize) -> Vec<LedgerEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    fn plan_debit(&self, amount: PositiveAmount) -> Result<Amount> {
        let requested = amount.amount();
        self.balance
            .checked_sub(requested)
            .ok_or(WalletError::InsufficientFunds {
                requested,
                available: self.balance,
            })
    }

    fn apply_debit(&mut self, new_balance: Amount, amount: PositiveAmount) {
        self.balance = new_balance;
        self.total_withdrawn += u128::from(amount.value());
    }

    fn push_entry(&mut self, entry_type: EntryType, amount: Amount, reason: EntryReason) -> EntryId {
        let entry = LedgerEntry {
            entry_id: EntryId::new(),
            entry_type,
            amount,
            balance_after: self.balance,
            reason,
            created_at: Utc::now(),
        };
        let entry_id = entry.entry_id.clone();
        self.entries.push(entry);
        entry_id
    }
}
