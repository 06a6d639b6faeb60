//! SharedWallet - An owner-controlled pool with spending allowances
//!
//! A single pool of funds that anyone can top up but only the owner, or a
//! spender the owner has granted an allowance, can withdraw from.
//!
//! # Rules
//!
//! 1. The owner is fixed at creation and never subject to an allowance check
//! 2. Only the owner grants allowances; a grant replaces the previous one
//! 3. A non-owner withdrawal needs `allowance >= amount` and consumes it
//! 4. Every withdrawal needs `balance >= amount`, owner or not
//! 5. A rejected call changes nothing
//!
//! # Usage
//!
//! ```
//! # use sharedwallet::{SharedWallet, Amount, Identity, PositiveAmount};
//! # tokio_test_block_on(async {
//! let owner = Identity::generate();
//! let spender = Identity::generate();
//! let wallet = SharedWallet::new(owner);
//!
//! wallet.receive_deposit(owner, Amount::new(10)).await?;
//! wallet.set_allowance(owner, spender, Amount::new(5)).await?;
//! wallet.withdraw(spender, Identity::generate(), PositiveAmount::new(5)?).await?;
//!
//! assert_eq!(wallet.balance().await, Amount::new(5));
//! assert_eq!(wallet.allowance(&spender).await, Amount::zero());
//! # Ok::<(), sharedwallet::WalletError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod event;
pub mod wallet;

pub use config::*;
pub use event::*;
pub use wallet::*;

pub use sharedwallet_ledger::{CustodyLedger, EntryReason, EntryType, LedgerEntry, Payout};
pub use sharedwallet_policy::{Authorization, AuthorizationPolicy};
pub use sharedwallet_types::{Amount, Identity, PositiveAmount, Result, WalletError};
