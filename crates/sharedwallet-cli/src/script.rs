//! Scripted wallet sessions
//!
//! A script names a set of accounts and lists the calls to make against a
//! fresh wallet, interleaved with expectations about its state.
//!
//! ```json
//! {
//!   "name": "allowance",
//!   "accounts": { "alice": "0x…", "bob": "0x…" },
//!   "steps": [
//!     { "op": "deposit", "from": "owner", "amount": 10 },
//!     { "op": "set_allowance", "caller": "owner", "spender": "alice", "amount": 5 },
//!     { "op": "withdraw", "caller": "alice", "to": "bob", "amount": 6, "expect_error": "not_allowed" },
//!     { "op": "expect_balance", "amount": 10 }
//!   ]
//! }
//! ```
//!
//! Account references are either a name from `accounts`, the reserved name
//! `owner`, or a hex identity.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use sharedwallet::{
    Amount, Identity, PositiveAmount, SharedWallet, WalletConfig, WalletError, WalletSnapshot,
};

/// Reserved account name for the wallet owner
pub const OWNER_ALIAS: &str = "owner";

/// A complete session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default = "default_script_name")]
    pub name: String,
    /// Owner identity; taken from the environment when absent
    #[serde(default)]
    pub owner: Option<Identity>,
    #[serde(default)]
    pub accounts: BTreeMap<String, Identity>,
    pub steps: Vec<Step>,
}

fn default_script_name() -> String {
    "script".to_string()
}

/// One call or expectation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Deposit {
        from: String,
        amount: u64,
    },
    Withdraw {
        caller: String,
        to: String,
        amount: u64,
        #[serde(default)]
        expect_error: Option<String>,
    },
    SetAllowance {
        caller: String,
        spender: String,
        amount: u64,
        #[serde(default)]
        expect_error: Option<String>,
    },
    ExpectBalance {
        amount: u64,
    },
    ExpectAllowance {
        spender: String,
        amount: u64,
    },
    ExpectReceived {
        destination: String,
        amount: u64,
    },
}

/// What one step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub index: usize,
    pub description: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Result of running a script
#[derive(Debug, Clone)]
pub struct ScriptReport {
    pub name: String,
    pub outcomes: Vec<StepOutcome>,
    pub snapshot: WalletSnapshot,
}

impl ScriptReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }
}

impl Script {
    /// Read a script from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing script {}", path.display()))
    }

    fn resolve(&self, owner: Identity, reference: &str) -> anyhow::Result<Identity> {
        if reference == OWNER_ALIAS {
            return Ok(owner);
        }
        if let Some(identity) = self.accounts.get(reference) {
            return Ok(*identity);
        }
        Identity::parse(reference).map_err(|_| anyhow!("unknown account '{}'", reference))
    }

    /// Run against a fresh wallet
    ///
    /// Expectation mismatches are reported as failed steps. Malformed steps
    /// (unknown accounts, zero withdrawals) abort the run with an error.
    pub async fn run(&self) -> anyhow::Result<ScriptReport> {
        let config = match self.owner {
            Some(owner) => WalletConfig::new(owner),
            None => WalletConfig::from_env()?,
        }
        .with_name(self.name.clone());
        let wallet = SharedWallet::from_config(&config);
        let owner = wallet.owner();

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = self
                .run_step(&wallet, owner, step)
                .await
                .with_context(|| format!("step {}", index + 1))?;
            let (description, passed, detail) = outcome;
            outcomes.push(StepOutcome {
                index,
                description,
                passed,
                detail,
            });
        }

        Ok(ScriptReport {
            name: self.name.clone(),
            outcomes,
            snapshot: wallet.snapshot().await,
        })
    }

    async fn run_step(
        &self,
        wallet: &SharedWallet,
        owner: Identity,
        step: &Step,
    ) -> anyhow::Result<(String, bool, Option<String>)> {
        match step {
            Step::Deposit { from, amount } => {
                let sender = self.resolve(owner, from)?;
                let balance = wallet.receive_deposit(sender, Amount::new(*amount)).await?;
                Ok((
                    format!("{} deposits {}", from, amount),
                    true,
                    Some(format!("balance {}", balance)),
                ))
            }
            Step::Withdraw {
                caller,
                to,
                amount,
                expect_error,
            } => {
                let caller_id = self.resolve(owner, caller)?;
                let destination = self.resolve(owner, to)?;
                let positive = PositiveAmount::new(*amount)?;
                let result = wallet
                    .withdraw(caller_id, destination, positive)
                    .await
                    .map(|receipt| format!("balance {}", receipt.balance_after));
                let (passed, detail) = judge(result, expect_error.as_deref());
                Ok((
                    format!("{} withdraws {} to {}", caller, amount, to),
                    passed,
                    Some(detail),
                ))
            }
            Step::SetAllowance {
                caller,
                spender,
                amount,
                expect_error,
            } => {
                let caller_id = self.resolve(owner, caller)?;
                let spender_id = self.resolve(owner, spender)?;
                let result = wallet
                    .set_allowance(caller_id, spender_id, Amount::new(*amount))
                    .await
                    .map(|()| format!("allowance[{}] = {}", spender, amount));
                let (passed, detail) = judge(result, expect_error.as_deref());
                Ok((
                    format!("{} grants {} to {}", caller, amount, spender),
                    passed,
                    Some(detail),
                ))
            }
            Step::ExpectBalance { amount } => {
                let actual = wallet.balance().await;
                Ok(expectation(format!("balance is {}", amount), *amount, actual))
            }
            Step::ExpectAllowance { spender, amount } => {
                let actual = wallet.allowance(&self.resolve(owner, spender)?).await;
                Ok(expectation(
                    format!("allowance[{}] is {}", spender, amount),
                    *amount,
                    actual,
                ))
            }
            Step::ExpectReceived {
                destination,
                amount,
            } => {
                let actual = wallet.received(&self.resolve(owner, destination)?).await;
                Ok(expectation(
                    format!("{} received {}", destination, amount),
                    *amount,
                    actual,
                ))
            }
        }
    }
}

fn judge(result: Result<String, WalletError>, expected_error: Option<&str>) -> (bool, String) {
    match (result, expected_error) {
        (Ok(detail), None) => (true, detail),
        (Ok(_), Some(code)) => (false, format!("succeeded, expected {}", code)),
        (Err(err), Some(code)) if err.code() == code => (true, format!("rejected: {}", err)),
        (Err(err), _) => (false, format!("rejected: {}", err)),
    }
}

fn expectation(description: String, expected: u64, actual: Amount) -> (String, bool, Option<String>) {
    if actual == Amount::new(expected) {
        (description, true, None)
    } else {
        (description, false, Some(format!("actual {}", actual)))
    }
}

/// Parse and run, failing if any step failed
pub async fn run_file(path: &Path) -> anyhow::Result<ScriptReport> {
    let script = Script::load(path)?;
    let report = script.run().await?;
    if !report.passed() {
        crate::display::report(&report);
        bail!("{} of {} steps failed", report.failures(), report.outcomes.len());
    }
    Ok(report)
}
