//! Display utilities for the CLI

use colored::*;
use sharedwallet::WalletSnapshot;

use crate::script::{ScriptReport, StepOutcome};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

fn step(outcome: &StepOutcome) {
    let marker = if outcome.passed {
        "✓".bright_green()
    } else {
        "✗".bright_red()
    };
    let description = if outcome.passed {
        outcome.description.normal()
    } else {
        outcome.description.bright_red()
    };

    match &outcome.detail {
        Some(detail) => println!(
            "  {} {:>2}. {} {}",
            marker,
            outcome.index + 1,
            description,
            format!("({})", detail).bright_black()
        ),
        None => println!("  {} {:>2}. {}", marker, outcome.index + 1, description),
    }
}

/// Print the owner, balance and allowance table
pub fn snapshot(snapshot: &WalletSnapshot) {
    println!();
    kv("owner", &snapshot.owner.to_hex());
    kv("balance", &snapshot.balance.to_string());
    if snapshot.allowances.is_empty() {
        kv("allowances", "none");
    } else {
        for (spender, amount) in &snapshot.allowances {
            kv(&format!("allowance {}", spender.short()), &amount.to_string());
        }
    }
}

/// Print every step of a run followed by the final state
pub fn report(report: &ScriptReport) {
    section(&format!("Script: {}", report.name));
    for outcome in &report.outcomes {
        step(outcome);
    }
    snapshot(&report.snapshot);

    println!();
    if report.passed() {
        println!("  {} all {} steps passed", "●".bright_green(), report.outcomes.len());
    } else {
        println!(
            "  {} {} of {} steps failed",
            "●".bright_red(),
            report.failures(),
            report.outcomes.len()
        );
    }
}
