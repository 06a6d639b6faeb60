//! The shared wallet service
//!
//! Composes the custody ledger and the authorization policy into the three
//! operations the outside world sees: receive a deposit, withdraw, and set an
//! allowance.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharedwallet_ledger::{CustodyLedger, EntryId, LedgerEntry};
use sharedwallet_policy::{Authorization, AuthorizationPolicy};
use sharedwallet_types::{Amount, Identity, PositiveAmount, Result, WalletError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WalletConfig;
use crate::event::{WalletEvent, WalletEventKind};

/// Check a withdrawal failed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStage {
    /// Owner bypass or allowance lookup
    AllowanceCheck,
    /// Pool balance sufficiency
    FundsCheck,
}

/// Proof of a committed withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub receipt_id: String,
    pub destination: Identity,
    pub authorization: Authorization,
    pub ledger_entry: EntryId,
    pub balance_after: Amount,
    pub destination_received: Amount,
    pub committed_at: DateTime<Utc>,
}

impl WithdrawalReceipt {
    pub fn caller(&self) -> Identity {
        self.authorization.caller()
    }

    pub fn amount(&self) -> Amount {
        self.authorization.amount()
    }
}

/// Externally visible state surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub owner: Identity,
    pub balance: Amount,
    pub allowances: BTreeMap<Identity, Amount>,
}

/// Everything a wallet mutates, kept behind one lock
#[derive(Debug)]
struct WalletState {
    ledger: CustodyLedger,
    policy: AuthorizationPolicy,
    events: Vec<WalletEvent>,
}

impl WalletState {
    fn record(&mut self, kind: WalletEventKind) {
        let sequence = self.events.len() as u64;
        self.events.push(WalletEvent::new(sequence, kind));
    }
}

/// A single owner-controlled pool of funds
///
/// Anyone can top it up. Only the owner, or a spender holding a sufficient
/// allowance, can take value out. Cloning yields another handle to the same
/// wallet.
#[derive(Clone)]
pub struct SharedWallet {
    name: Arc<str>,
    owner: Identity,
    state: Arc<RwLock<WalletState>>,
}

impl SharedWallet {
    /// Create an empty wallet owned by `owner`
    pub fn new(owner: Identity) -> Self {
        Self::from_config(&WalletConfig::new(owner))
    }

    /// Create an empty wallet from configuration
    pub fn from_config(config: &WalletConfig) -> Self {
        info!(wallet = %config.name, owner = %config.owner, "Shared wallet initialized");
        Self {
            name: Arc::from(config.name.as_str()),
            owner: config.owner,
            state: Arc::new(RwLock::new(WalletState {
                ledger: CustodyLedger::new(),
                policy: AuthorizationPolicy::new(config.owner),
                events: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owner never changes after initialization
    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn is_owner(&self, identity: &Identity) -> bool {
        *identity == self.owner
    }

    /// Accept inbound value from anyone
    ///
    /// Zero is accepted and changes nothing. Returns the new balance.
    pub async fn receive_deposit(&self, from: Identity, amount: Amount) -> Result<Amount> {
        let mut state = self.state.write().await;
        let balance = state.ledger.deposit(from, amount)?;

        if !amount.is_zero() {
            state.record(WalletEventKind::MoneyReceived { from, amount });
        }

        debug!(wallet = %self.name, from = %from.short(), %amount, %balance, "Deposit received");
        Ok(balance)
    }

    /// Grant, replace or revoke `spender`'s allowance
    ///
    /// Only the owner may do this. The new amount replaces the old one.
    pub async fn set_allowance(
        &self,
        caller: Identity,
        spender: Identity,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        let old = match state.policy.set_allowance(&caller, spender, amount) {
            Ok(old) => old,
            Err(err) => {
                warn!(wallet = %self.name, caller = %caller.short(), "Allowance change refused: {}", err);
                return Err(err);
            }
        };

        state.record(WalletEventKind::AllowanceChanged {
            spender,
            by: caller,
            old,
            new: amount,
        });

        info!(
            wallet = %self.name,
            spender = %spender.short(),
            %old,
            new = %amount,
            "Allowance changed"
        );
        Ok(())
    }

    /// Move `amount` from the pool to `destination` on behalf of `caller`
    ///
    /// Checks run in order: authorization, then funds. Either failure
    /// leaves the balance, the allowances and the journal untouched. On
    /// success the balance is debited, the destination credited and, for a
    /// non-owner, the allowance decremented, all under one write lock.
    pub async fn withdraw(
        &self,
        caller: Identity,
        destination: Identity,
        amount: PositiveAmount,
    ) -> Result<WithdrawalReceipt> {
        let mut state = self.state.write().await;

        let authorization = match state.policy.check(&caller, amount) {
            Ok(authorization) => authorization,
            Err(err) => {
                self.log_rejection(&caller, amount, WithdrawalStage::AllowanceCheck, &err);
                return Err(err);
            }
        };

        let payout = match state.ledger.pay_out(destination, amount) {
            Ok(payout) => payout,
            Err(err) => {
                // The allowance was only checked, never decremented
                self.log_rejection(&caller, amount, WithdrawalStage::FundsCheck, &err);
                return Err(err);
            }
        };

        state.policy.commit(&authorization);
        state.record(WalletEventKind::MoneySent {
            by: caller,
            to: destination,
            amount: amount.amount(),
        });

        info!(
            wallet = %self.name,
            caller = %caller.short(),
            destination = %destination.short(),
            %amount,
            balance = %payout.balance_after,
            owner = authorization.is_owner(),
            "Withdrawal committed"
        );

        Ok(WithdrawalReceipt {
            receipt_id: format!("receipt_{}", Uuid::new_v4()),
            destination,
            authorization,
            ledger_entry: payout.entry_id,
            balance_after: payout.balance_after,
            destination_received: payout.destination_received,
            committed_at: Utc::now(),
        })
    }

    /// Current pool balance
    pub async fn balance(&self) -> Amount {
        self.state.read().await.ledger.balance()
    }

    /// Remaining allowance for `spender`
    pub async fn allowance(&self, spender: &Identity) -> Amount {
        self.state.read().await.policy.allowance(spender)
    }

    /// Total `destination` has received from the pool
    pub async fn received(&self, destination: &Identity) -> Amount {
        self.state.read().await.ledger.received(destination)
    }

    /// All journal events, oldest first
    pub async fn events(&self) -> Vec<WalletEvent> {
        self.state.read().await.events.clone()
    }

    /// All ledger entries, oldest first
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.state.read().await.ledger.entries().to_vec()
    }

    /// Consistent view of owner, balance and allowances
    pub async fn snapshot(&self) -> WalletSnapshot {
        let state = self.state.read().await;
        WalletSnapshot {
            owner: self.owner,
            balance: state.ledger.balance(),
            allowances: state
                .policy
                .allowances()
                .iter()
                .map(|(spender, amount)| (*spender, *amount))
                .collect(),
        }
    }

    fn log_rejection(
        &self,
        caller: &Identity,
        amount: PositiveAmount,
        stage: WithdrawalStage,
        err: &WalletError,
    ) {
        warn!(
            wallet = %self.name,
            caller = %caller.short(),
            %amount,
            ?stage,
            code = err.code(),
            "Withdrawal rejected"
        );
    }
}

impl std::fmt::Debug for SharedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWallet")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive(value: u64) -> PositiveAmount {
        PositiveAmount::new(value).unwrap()
    }

    async fn funded_wallet(amount: u64) -> (SharedWallet, Identity) {
        let owner = Identity::generate();
        let wallet = SharedWallet::new(owner);
        wallet
            .receive_deposit(owner, Amount::new(amount))
            .await
            .unwrap();
        (wallet, owner)
    }

    #[tokio::test]
    async fn test_new_wallet_is_empty() {
        let owner = Identity::generate();
        let wallet = SharedWallet::new(owner);

        assert_eq!(wallet.owner(), owner);
        assert_eq!(wallet.balance().await, Amount::zero());
        assert!(wallet.snapshot().await.allowances.is_empty());
        assert!(wallet.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_anyone_can_deposit() {
        let wallet = SharedWallet::new(Identity::generate());

        wallet
            .receive_deposit(Identity::generate(), Amount::new(7))
            .await
            .unwrap();
        let balance = wallet
            .receive_deposit(Identity::generate(), Amount::new(3))
            .await
            .unwrap();

        assert_eq!(balance, Amount::new(10));
        assert_eq!(wallet.events().await.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_deposit_records_nothing() {
        let (wallet, owner) = funded_wallet(10).await;

        wallet.receive_deposit(owner, Amount::zero()).await.unwrap();
        assert_eq!(wallet.balance().await, Amount::new(10));
        assert_eq!(wallet.events().await.len(), 1);
        assert_eq!(wallet.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_owner_withdraw() {
        let (wallet, owner) = funded_wallet(10).await;
        let destination = Identity::generate();

        let receipt = wallet
            .withdraw(owner, destination, positive(5))
            .await
            .unwrap();

        assert!(receipt.authorization.is_owner());
        assert_eq!(receipt.caller(), owner);
        assert_eq!(receipt.amount(), Amount::new(5));
        assert_eq!(receipt.balance_after, Amount::new(5));
        assert_eq!(wallet.balance().await, Amount::new(5));
        assert_eq!(wallet.received(&destination).await, Amount::new(5));
    }

    #[tokio::test]
    async fn test_owner_cannot_overdraw() {
        let (wallet, owner) = funded_wallet(10).await;

        let result = wallet
            .withdraw(owner, Identity::generate(), positive(11))
            .await;
        assert_eq!(
            result.unwrap_err(),
            WalletError::InsufficientFunds {
                requested: Amount::new(11),
                available: Amount::new(10),
            }
        );
        assert_eq!(wallet.balance().await, Amount::new(10));
    }

    #[tokio::test]
    async fn test_spender_withdraw_consumes_allowance() {
        let (wallet, owner) = funded_wallet(10).await;
        let spender = Identity::generate();
        let destination = Identity::generate();

        wallet
            .set_allowance(owner, spender, Amount::new(5))
            .await
            .unwrap();
        let receipt = wallet
            .withdraw(spender, destination, positive(5))
            .await
            .unwrap();

        assert!(!receipt.authorization.is_owner());
        assert_eq!(wallet.balance().await, Amount::new(5));
        assert_eq!(wallet.allowance(&spender).await, Amount::zero());
        assert_eq!(receipt.destination_received, Amount::new(5));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_set_allowance() {
        let (wallet, _) = funded_wallet(10).await;
        let intruder = Identity::generate();

        let result = wallet
            .set_allowance(intruder, intruder, Amount::new(100))
            .await;
        assert_eq!(result, Err(WalletError::NotOwner { caller: intruder }));
        assert_eq!(wallet.allowance(&intruder).await, Amount::zero());
    }

    #[tokio::test]
    async fn test_insufficient_funds_keeps_allowance() {
        let (wallet, owner) = funded_wallet(10).await;
        let spender = Identity::generate();
        let destination = Identity::generate();
        wallet
            .set_allowance(owner, spender, Amount::new(15))
            .await
            .unwrap();
        let events_before = wallet.events().await.len();

        let result = wallet.withdraw(spender, destination, positive(15)).await;

        assert!(matches!(result, Err(WalletError::InsufficientFunds { .. })));
        assert_eq!(wallet.allowance(&spender).await, Amount::new(15));
        assert_eq!(wallet.balance().await, Amount::new(10));
        assert_eq!(wallet.received(&destination).await, Amount::zero());
        assert_eq!(wallet.events().await.len(), events_before);
    }

    #[tokio::test]
    async fn test_events_are_sequenced() {
        let (wallet, owner) = funded_wallet(10).await;
        let spender = Identity::generate();
        let destination = Identity::generate();

        wallet
            .set_allowance(owner, spender, Amount::new(4))
            .await
            .unwrap();
        wallet
            .withdraw(spender, destination, positive(4))
            .await
            .unwrap();

        let events = wallet.events().await;
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(
            events[1].kind,
            WalletEventKind::AllowanceChanged {
                spender,
                by: owner,
                old: Amount::zero(),
                new: Amount::new(4),
            }
        );
        assert_eq!(
            events[2].kind,
            WalletEventKind::MoneySent {
                by: spender,
                to: destination,
                amount: Amount::new(4),
            }
        );
    }

    #[tokio::test]
    async fn test_snapshot_serializes() {
        let (wallet, owner) = funded_wallet(10).await;
        let spender = Identity::from_bytes([1u8; 20]);
        wallet
            .set_allowance(owner, spender, Amount::new(3))
            .await
            .unwrap();

        let snapshot = wallet.snapshot().await;
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["balance"], serde_json::json!(10));
        assert_eq!(json["allowances"][spender.to_hex()], serde_json::json!(3));

        let back: WalletSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_spenders_cannot_overspend_allowance() {
        let (wallet, owner) = funded_wallet(1_000).await;
        let spender = Identity::generate();
        wallet
            .set_allowance(owner, spender, Amount::new(10))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let wallet = wallet.clone();
            handles.push(tokio::spawn(async move {
                wallet
                    .withdraw(spender, Identity::generate(), positive(1))
                    .await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(err) => assert_eq!(err, WalletError::NotAllowed),
            }
        }

        assert_eq!(committed, 10);
        assert_eq!(wallet.allowance(&spender).await, Amount::zero());
        assert_eq!(wallet.balance().await, Amount::new(990));
    }
}
