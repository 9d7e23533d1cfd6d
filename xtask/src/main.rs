//! Custom cargo commands for the covenant crate.
//!
//! Usage:
//!   cargo xtask verify    - Run full verification suite
//!   cargo xtask test      - Run all tests, with contracts on and off
//!   cargo xtask check     - Quick check (build + tests + clippy)
//!   cargo xtask bench     - Run benchmarks
//!   cargo xtask fuzz      - Run every fuzz target briefly

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::Command;

/// Environment variable the library reads for its process-wide switch.
const SWITCH: &str = "COVENANT_CONTRACTS";

/// Fuzz targets declared in fuzz/Cargo.toml.
const FUZZ_TARGETS: &[&str] = &["call_binding", "record_rewrite"];

fn main() -> Result<()> {
    let task = env::args().nth(1);
    match task.as_deref() {
        Some("verify") => verify()?,
        Some("test") => test()?,
        Some("check") => check()?,
        Some("bench") => bench()?,
        Some("fuzz") => fuzz()?,
        _ => print_help(),
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        r#"
cargo xtask <COMMAND>

Commands:
  verify    Run full verification suite (tests + switch + clippy + docs)
  test      Run all Rust tests, then the switch suite with contracts off
  check     Quick check (cargo check + test + clippy)
  bench     Run benchmarks
  fuzz      Run each fuzz target for 30 seconds (needs cargo-fuzz, nightly)
"#
    );
}

/// Full verification suite
fn verify() -> Result<()> {
    println!("==========================================");
    println!("Covenant Verification Suite");
    println!("==========================================\n");

    println!("[1/4] Running Rust tests (contracts on)...");
    run_cargo(&["test", "--quiet"], None)?;
    println!("✓ All Rust tests passed\n");

    println!("[2/4] Running switch suite (contracts off)...");
    run_cargo(&["test", "--quiet", "--test", "switch"], Some("off"))?;
    println!("✓ Disabled contracts are no-ops\n");

    println!("[3/4] Running clippy...");
    run_cargo(&["clippy", "--quiet", "--all-targets", "--", "-D", "warnings"], None)?;
    println!("✓ Clippy passed\n");

    println!("[4/4] Building docs...");
    run_cargo(&["doc", "--quiet", "--no-deps"], None)?;
    println!("✓ Docs build\n");

    println!("==========================================");
    println!("✓ ALL VERIFICATION CHECKS PASSED");
    println!("==========================================");
    println!("\nSafe to commit changes.");

    Ok(())
}

/// Run all tests. Only the switch suite runs with contracts off: every other
/// suite asserts that contracts fire.
fn test() -> Result<()> {
    run_cargo(&["test"], None)?;
    run_cargo(&["test", "--test", "switch"], Some("off"))
}

/// Quick check
fn check() -> Result<()> {
    println!("Running quick checks...\n");

    println!("[1/3] cargo check...");
    run_cargo(&["check", "--all-targets"], None)?;

    println!("[2/3] cargo test...");
    run_cargo(&["test", "--quiet"], None)?;

    println!("[3/3] cargo clippy...");
    run_cargo(&["clippy", "--quiet", "--", "-D", "warnings"], None)?;

    println!("\n✓ Quick checks passed");
    Ok(())
}

/// Run benchmarks
fn bench() -> Result<()> {
    run_cargo(&["bench"], None)
}

/// Run every fuzz target for a short, fixed time.
fn fuzz() -> Result<()> {
    let fuzz_dir = project_root()?.join("fuzz");
    for target in FUZZ_TARGETS {
        println!("Fuzzing {target}...");
        let status = Command::new("cargo")
            .args(["+nightly", "fuzz", "run", target, "--", "-max_total_time=30"])
            .current_dir(&fuzz_dir)
            .status()
            .with_context(|| format!("Failed to run cargo fuzz for {target}"))?;
        if !status.success() {
            bail!("fuzz target {target} failed");
        }
    }
    Ok(())
}

// ============================================================================
// Helper functions
// ============================================================================

fn project_root() -> Result<PathBuf> {
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir().context("Failed to read current directory")?,
    };

    // xtask is in project_root/xtask, so go up one level
    let root = manifest_dir.parent().unwrap_or(&manifest_dir);
    Ok(root.to_path_buf())
}

/// Run cargo from the project root. `switch` sets the contracts switch for
/// the child; `None` clears it so the library default applies.
fn run_cargo(args: &[&str], switch: Option<&str>) -> Result<()> {
    let root = project_root()?;

    let mut command = Command::new("cargo");
    command.args(args).current_dir(&root);
    match switch {
        Some(value) => command.env(SWITCH, value),
        None => command.env_remove(SWITCH),
    };

    let status = command
        .status()
        .with_context(|| format!("Failed to run cargo {:?}", args))?;

    if !status.success() {
        bail!("cargo {:?} failed", args);
    }

    Ok(())
}
