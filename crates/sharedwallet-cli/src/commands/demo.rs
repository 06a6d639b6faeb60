//! Demo command - the reference withdrawal scenarios

use std::collections::BTreeMap;

use anyhow::bail;
use sharedwallet::Identity;

use crate::display;
use crate::script::{Script, Step};

fn accounts() -> BTreeMap<String, Identity> {
    ["alice", "bob", "x"]
        .into_iter()
        .map(|name| (name.to_string(), Identity::generate()))
        .collect()
}

fn deposit_ten() -> Step {
    Step::Deposit {
        from: "owner".to_string(),
        amount: 10,
    }
}

fn grant(spender: &str, amount: u64) -> Step {
    Step::SetAllowance {
        caller: "owner".to_string(),
        spender: spender.to_string(),
        amount,
        expect_error: None,
    }
}

fn withdraw(caller: &str, to: &str, amount: u64, expect_error: Option<&str>) -> Step {
    Step::Withdraw {
        caller: caller.to_string(),
        to: to.to_string(),
        amount,
        expect_error: expect_error.map(str::to_string),
    }
}

fn expect_balance(amount: u64) -> Step {
    Step::ExpectBalance { amount }
}

fn expect_allowance(spender: &str, amount: u64) -> Step {
    Step::ExpectAllowance {
        spender: spender.to_string(),
        amount,
    }
}

/// The five canonical sessions
pub fn scenarios() -> Vec<Script> {
    let script = |name: &str, steps: Vec<Step>| Script {
        name: name.to_string(),
        owner: Some(Identity::generate()),
        accounts: accounts(),
        steps,
    };

    vec![
        script(
            "owner withdraws to any address",
            vec![
                deposit_ten(),
                withdraw("owner", "x", 5, None),
                expect_balance(5),
                Step::ExpectReceived {
                    destination: "x".to_string(),
                    amount: 5,
                },
            ],
        ),
        script(
            "spender withdraws within allowance",
            vec![
                deposit_ten(),
                grant("alice", 5),
                withdraw("alice", "bob", 5, None),
                expect_balance(5),
                expect_allowance("alice", 0),
                Step::ExpectReceived {
                    destination: "bob".to_string(),
                    amount: 5,
                },
            ],
        ),
        script(
            "withdraw without allowance",
            vec![
                deposit_ten(),
                withdraw("alice", "bob", 5, Some("not_allowed")),
                expect_balance(10),
            ],
        ),
        script(
            "withdraw beyond allowance",
            vec![
                deposit_ten(),
                grant("alice", 5),
                withdraw("alice", "bob", 6, Some("not_allowed")),
                expect_allowance("alice", 5),
            ],
        ),
        script(
            "withdraw beyond pool balance",
            vec![
                deposit_ten(),
                grant("alice", 15),
                withdraw("alice", "bob", 15, Some("insufficient_funds")),
                expect_allowance("alice", 15),
                expect_balance(10),
            ],
        ),
    ]
}

/// Run every scenario and print the results
pub async fn run_demo() -> anyhow::Result<()> {
    let mut failed = 0;
    for scenario in scenarios() {
        let report = scenario.run().await?;
        display::report(&report);
        if !report.passed() {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} scenario(s) failed", failed);
    }
    Ok(())
}
