//! SharedWallet Policy - Withdrawal authorization and allowances
//!
//! Decides, for a caller and an amount, whether a withdrawal from the pool is
//! permitted and how the allowance table changes as a result.
//!
//! - The owner is always approved and never touches the allowance table.
//! - Anyone else needs a standing allowance at least as large as the amount;
//!   an approved withdrawal consumes that much of it.
//! - Only the owner may grant allowances. A grant replaces, never adds to,
//!   the previous one. Granting zero revokes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sharedwallet_types::{Amount, Identity, PositiveAmount, Result, WalletError};

/// Outcome of an approved authorization decision
///
/// Produced by [`AuthorizationPolicy::check`] and only meaningful against the
/// table it was checked against, until that table is next mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Authorization {
    /// Owner bypass: no allowance involved
    Owner { caller: Identity, amount: Amount },
    /// Spend against a standing allowance
    Allowance {
        spender: Identity,
        consumed: Amount,
        previous: Amount,
        remaining: Amount,
    },
}

impl Authorization {
    /// The identity that was authorized
    pub fn caller(&self) -> Identity {
        match self {
            Self::Owner { caller, .. } => *caller,
            Self::Allowance { spender, .. } => *spender,
        }
    }

    /// The authorized amount
    pub fn amount(&self) -> Amount {
        match self {
            Self::Owner { amount, .. } => *amount,
            Self::Allowance { consumed, .. } => *consumed,
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner { .. })
    }
}

/// Owner identity plus the per-spender allowance table
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    owner: Identity,
    /// spender -> remaining authorized amount (absent means zero)
    allowances: HashMap<Identity, Amount>,
}

impl AuthorizationPolicy {
    /// Create a policy owned by `owner` with no allowances
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            allowances: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn is_owner(&self, caller: &Identity) -> bool {
        *caller == self.owner
    }

    /// Remaining allowance for `spender`
    pub fn allowance(&self, spender: &Identity) -> Amount {
        self.allowances.get(spender).copied().unwrap_or(Amount::zero())
    }

    /// All non-zero allowances
    pub fn allowances(&self) -> &HashMap<Identity, Amount> {
        &self.allowances
    }

    /// Grant, replace or revoke `spender`'s allowance
    ///
    /// Only the owner may call this. Returns the allowance it replaced.
    pub fn set_allowance(
        &mut self,
        caller: &Identity,
        spender: Identity,
        amount: Amount,
    ) -> Result<Amount> {
        if !self.is_owner(caller) {
            return Err(WalletError::NotOwner { caller: *caller });
        }

        let previous = self.allowance(&spender);
        self.write(spender, amount);
        Ok(previous)
    }

    /// Decide whether `caller` may withdraw `amount`, without committing
    pub fn check(&self, caller: &Identity, amount: PositiveAmount) -> Result<Authorization> {
        if self.is_owner(caller) {
            return Ok(Authorization::Owner {
                caller: *caller,
                amount: amount.amount(),
            });
        }

        // Absent and too-small allowances are indistinguishable to the caller
        let previous = self.allowance(caller);
        let remaining = previous
            .checked_sub(amount.amount())
            .ok_or(WalletError::NotAllowed)?;

        Ok(Authorization::Allowance {
            spender: *caller,
            consumed: amount.amount(),
            previous,
            remaining,
        })
    }

    /// Apply a decision returned by [`check`](Self::check)
    pub fn commit(&mut self, authorization: &Authorization) {
        if let Authorization::Allowance {
            spender, remaining, ..
        } = authorization
        {
            self.write(*spender, *remaining);
        }
    }

    /// Undo a committed decision, restoring the consumed allowance
    pub fn revert(&mut self, authorization: &Authorization) {
        if let Authorization::Allowance {
            spender, previous, ..
        } = authorization
        {
            self.write(*spender, *previous);
        }
    }

    /// Decide and commit in one step
    ///
    /// For a non-owner the allowance decrement is applied before returning.
    pub fn authorize(&mut self, caller: &Identity, amount: PositiveAmount) -> Result<Authorization> {
        let authorization = self.check(caller, amount)?;
        self.commit(&authorization);
        Ok(authorization)
    }

    fn write(&mut self, spender: Identity, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&spender);
        } else {
            self.allowances.insert(spender, amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive(value: u64) -> PositiveAmount {
        PositiveAmount::new(value).unwrap()
    }

    #[test]
    fn test_owner_always_authorized() {
        let owner = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);

        let auth = policy.authorize(&owner, positive(1_000_000)).unwrap();
        assert!(auth.is_owner());
        assert_eq!(auth.amount(), Amount::new(1_000_000));
        assert!(policy.allowances().is_empty());
    }

    #[test]
    fn test_owner_spend_ignores_own_allowance() {
        let owner = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);
        policy.set_allowance(&owner, owner, Amount::new(3)).unwrap();

        policy.authorize(&owner, positive(10)).unwrap();
        assert_eq!(policy.allowance(&owner), Amount::new(3));
    }

    #[test]
    fn test_set_allowance_requires_owner() {
        let owner = Identity::generate();
        let stranger = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);

        let result = policy.set_allowance(&stranger, stranger, Amount::new(5));
        assert_eq!(result, Err(WalletError::NotOwner { caller: stranger }));
        assert_eq!(policy.allowance(&stranger), Amount::zero());
    }

    #[test]
    fn test_set_allowance_overwrites() {
        let owner = Identity::generate();
        let spender = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);

        assert_eq!(policy.set_allowance(&owner, spender, Amount::new(5)).unwrap(), Amount::zero());
        assert_eq!(policy.set_allowance(&owner, spender, Amount::new(3)).unwrap(), Amount::new(5));
        assert_eq!(policy.allowance(&spender), Amount::new(3));
    }

    #[test]
    fn test_zero_grant_revokes() {
        let owner = Identity::generate();
        let spender = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);

        policy.set_allowance(&owner, spender, Amount::new(5)).unwrap();
        policy.set_allowance(&owner, spender, Amount::zero()).unwrap();
        assert!(!policy.allowances().contains_key(&spender));
        assert_eq!(policy.check(&spender, positive(1)), Err(WalletError::NotAllowed));
    }

    #[test]
    fn test_no_allowance_and_small_allowance_look_the_same() {
        let owner = Identity::generate();
        let granted = Identity::generate();
        let stranger = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);
        policy.set_allowance(&owner, granted, Amount::new(5)).unwrap();

        let too_much = policy.authorize(&granted, positive(6)).unwrap_err();
        let never_granted = policy.authorize(&stranger, positive(6)).unwrap_err();
        assert_eq!(too_much, never_granted);
        assert_eq!(policy.allowance(&granted), Amount::new(5));
    }

    #[test]
    fn test_authorize_consumes_allowance() {
        let owner = Identity::generate();
        let spender = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);
        policy.set_allowance(&owner, spender, Amount::new(5)).unwrap();

        let auth = policy.authorize(&spender, positive(2)).unwrap();
        assert_eq!(
            auth,
            Authorization::Allowance {
                spender,
                consumed: Amount::new(2),
                previous: Amount::new(5),
                remaining: Amount::new(3),
            }
        );
        assert_eq!(policy.allowance(&spender), Amount::new(3));

        policy.authorize(&spender, positive(3)).unwrap();
        assert_eq!(policy.allowance(&spender), Amount::zero());
    }

    #[test]
    fn test_check_does_not_commit() {
        let owner = Identity::generate();
        let spender = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);
        policy.set_allowance(&owner, spender, Amount::new(5)).unwrap();

        policy.check(&spender, positive(5)).unwrap();
        assert_eq!(policy.allowance(&spender), Amount::new(5));
    }

    #[test]
    fn test_revert_restores_allowance() {
        let owner = Identity::generate();
        let spender = Identity::generate();
        let mut policy = AuthorizationPolicy::new(owner);
        policy.set_allowance(&owner, spender, Amount::new(15)).unwrap();

        let auth = policy.authorize(&spender, positive(15)).unwrap();
        assert_eq!(policy.allowance(&spender), Amount::zero());

        policy.revert(&auth);
        assert_eq!(policy.allowance(&spender), Amount::new(15));
    }
}
