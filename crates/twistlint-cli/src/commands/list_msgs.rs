//! List messages command implementation.

use anyhow::{Context, Result};
use twistlint_core::build_catalog;
use twistlint_rules::{all_checkers, Preset};

/// Runs the list-msgs command.
pub fn run() -> Result<()> {
    let catalog = build_catalog(&all_checkers()).context("Invalid message catalog")?;

    println!("Available messages:\n");
    println!("{:<7} {:<38} {:<14} Summary", "Code", "Symbol", "Checker");
    println!("{}", "-".repeat(100));

    for entry in catalog.entries() {
        let marker = if entry.def.default_enabled { "" } else { " (off)" };
        println!(
            "{:<7} {:<38} {:<14} {}{}",
            entry.def.code, entry.def.symbol, entry.checker, entry.def.summary, marker
        );
    }

    println!("\nPresets:");
    for (name, preset) in [
        ("standard", Preset::Standard),
        ("pep8", Preset::Pep8),
        ("minimal", Preset::Minimal),
    ] {
        let mut line = preset.checker_names().join(", ");
        if !preset.enabled_messages().is_empty() {
            line.push_str(" + ");
            line.push_str(&preset.enabled_messages().join(", "));
        }
        println!("  {name:<10} {line}");
    }

    println!("\nMessages marked (off) need `[messages] enable` or the pep8 preset.");
    println!("Use --rules to run specific checkers, e.g.:");
    println!("  twistlint check --rules docstring,names");
    Ok(())
}
