//! Wallet event journal
//!
//! Every committed state change appends exactly one event. Rejected calls
//! append nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharedwallet_types::{Amount, Identity};
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEventKind {
    /// Inbound value accepted into the pool
    MoneyReceived { from: Identity, amount: Amount },
    /// Outbound value paid to a destination
    MoneySent {
        by: Identity,
        to: Identity,
        amount: Amount,
    },
    /// An allowance was granted, replaced or revoked
    AllowanceChanged {
        spender: Identity,
        by: Identity,
        old: Amount,
        new: Amount,
    },
}

/// A journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEvent {
    pub event_id: String,
    /// Position in the journal, starting at zero
    pub sequence: u64,
    #[serde(flatten)]
    pub kind: WalletEventKind,
    pub recorded_at: DateTime<Utc>,
}

impl WalletEvent {
    pub(crate) fn new(sequence: u64, kind: WalletEventKind) -> Self {
        Self {
            event_id: format!("event_{}", Uuid::new_v4()),
            sequence,
            kind,
            recorded_at: Utc::now(),
        }
    }
}
