//! End-to-end test for the `vestx` binary.
//!
//! Drives a fresh data directory through genesis, schedule creation, a cap
//! rejection and a claim, checking the printed state after each step.
//!
//! Run with:
//!   cargo test -p vestx-node --test cli

use std::path::PathBuf;
use std::process::{Command, Output};

use rand::Rng;

const GENESIS: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

// ── Data dir lifecycle ────────────────────────────────────────────────────────

struct Ledger {
    data_dir: PathBuf,
}

impl Drop for Ledger {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

impl Ledger {
    fn fresh() -> Self {
        let id: u64 = rand::thread_rng().gen();
        let data_dir = std::env::temp_dir().join(format!("vestx-cli-{id:016x}"));
        let _ = std::fs::remove_dir_all(&data_dir);
        Self { data_dir }
    }

    fn run(&self, now: i64, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_vestx"))
            .arg("--data-dir")
            .arg(&self.data_dir)
            .arg("--now")
            .arg(now.to_string())
            .args(args)
            .env("RUST_LOG", "warn")
            .output()
            .expect("spawning vestx")
    }

    fn ok(&self, now: i64, args: &[&str]) -> String {
        let out = self.run(now, args);
        assert!(
            out.status.success(),
            "vestx {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8_lossy(&out.stdout).into_owned()
    }

    fn fails(&self, now: i64, args: &[&str]) -> String {
        let out = self.run(now, args);
        assert!(!out.status.success(), "vestx {:?} unexpectedly succeeded", args);
        String::from_utf8_lossy(&out.stderr).into_owned()
    }
}

fn address(ledger: &Ledger, label: &str) -> String {
    ledger.ok(GENESIS, &["address", "--label", label]).trim().to_string()
}

#[test]
fn genesis_schedule_cap_and_claim() {
    let ledger = Ledger::fresh();
    let admin = address(&ledger, "admin");
    let alice = address(&ledger, "alice");
    let bob = address(&ledger, "bob");

    let out = ledger.ok(GENESIS, &["init", "--admin", &admin]);
    assert!(out.contains("Genesis applied."));
    assert!(out.contains("1000000 tokens"));

    let err = ledger.fails(GENESIS, &["init", "--admin", &admin]);
    assert!(err.contains("genesis has already been applied"), "{err}");

    // Angel investors: cap 400,000.
    ledger.ok(
        GENESIS,
        &["add-schedule", "--from", &admin, "--category", "0", "--beneficiary", &alice, "--amount", "100000"],
    );
    let err = ledger.fails(
        GENESIS,
        &["add-schedule", "--from", &admin, "--category", "0", "--beneficiary", &bob, "--amount", "300001"],
    );
    assert!(err.contains("limit reached"), "{err}");

    let err = ledger.fails(
        GENESIS,
        &["add-schedule", "--from", &alice, "--category", "2", "--beneficiary", &bob, "--amount", "1"],
    );
    assert!(err.contains("caller lacks the required role"), "{err}");

    let err = ledger.fails(
        GENESIS,
        &["add-schedule", "--from", &admin, "--category", "3", "--beneficiary", &bob, "--amount", "1"],
    );
    assert!(err.contains("unknown category: 3"), "{err}");

    // Before the 180-day cliff nothing is claimable.
    let err = ledger.fails(GENESIS + 10 * DAY, &["claim", "--from", &alice, "--category", "angel-investor"]);
    assert!(err.contains("nothing to claim"), "{err}");

    // Halfway through the 720-day schedule.
    let claimable = ledger.ok(
        GENESIS + 360 * DAY,
        &["claimable", "--beneficiary", &alice, "--category", "0"],
    );
    assert_eq!(claimable.trim(), "50000");
    ledger.ok(GENESIS + 360 * DAY, &["claim", "--from", &alice, "--category", "0"]);

    let balance = ledger.ok(GENESIS + 360 * DAY, &["balance", "--account", &alice]);
    assert!(balance.contains("50000 tokens"), "{balance}");

    ledger.ok(
        GENESIS + 361 * DAY,
        &["transfer", "--from", &alice, "--to", &bob, "--amount", "0.5"],
    );
    let balance = ledger.ok(GENESIS + 361 * DAY, &["balance", "--account", &bob]);
    assert!(balance.contains("0.5 tokens"), "{balance}");

    let info = ledger.ok(GENESIS + 361 * DAY, &["info"]);
    assert!(info.contains("Total supply:    1000000 tokens"), "{info}");
}

#[test]
fn roles_and_schedule_view() {
    let ledger = Ledger::fresh();
    let admin = address(&ledger, "admin");
    let ops = address(&ledger, "ops");
    let carol = address(&ledger, "carol");

    ledger.ok(GENESIS, &["init", "--admin", &admin]);
    assert_eq!(ledger.ok(GENESIS, &["has-role", "--account", &ops]).trim(), "false");

    ledger.ok(GENESIS, &["grant-role", "--from", &admin, "--account", &ops]);
    assert_eq!(ledger.ok(GENESIS, &["has-role", "--account", &ops]).trim(), "true");

    ledger.ok(GENESIS, &["renounce-role", "--from", &admin]);
    let err = ledger.fails(GENESIS, &["renounce-role", "--from", &ops]);
    assert!(err.contains("last holder of the admin role"), "{err}");

    ledger.ok(
        GENESIS,
        &["add-schedule", "--from", &ops, "--category", "public-sale", "--beneficiary", &carol, "--amount", "180"],
    );
    ledger.ok(
        GENESIS,
        &["top-up", "--from", &ops, "--category", "public-sale", "--beneficiary", &carol, "--amount", "180"],
    );

    let view = ledger.ok(
        GENESIS + 90 * DAY,
        &["schedule", "--beneficiary", &carol, "--category", "2", "--points", "4"],
    );
    assert!(view.contains("total 360"), "{view}");
    assert!(view.contains("vesting, 180 claimable"), "{view}");
}
