//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r##"# twistlint configuration

# Checker preset: "standard", "pep8" (adds whitespace and end-of-file
# messages) or "minimal"
preset = "standard"

# Exit with status 1 when a violation of this severity or above is found
fail_on = "warning"

[analyzer]
# Glob patterns to exclude from analysis
exclude = [
    "**/build/**",
    "**/.tox/**",
]

# Respect .gitignore files
respect_gitignore = true

# Extra import roots searched when resolving interfaces
# python_path = ["../vendor"]

[messages]
# Codes or symbols; "all" matches every message
enable = []
disable = []

# Checker configurations, keyed by checker name.
# Each checker can be disabled or have its severity overridden.

[rules.docstring]
enabled = true
# severity = "warning"
strict_epydoc = true
options_prefix = "opt_"
test_prefix = "test"
no_docstring_rgx = "^__.*__$"

[rules.header]
copyright = [
    "# Copyright (c) Twisted Matrix Laboratories.",
    "# See LICENSE for details.",
]

[rules.spacing]
max_blank_lines = 1
"##;

const CONFIG_NAME: &str = "twistlint.toml";

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new(CONFIG_NAME), force)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure checkers");
    println!("  2. Run: twistlint check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use twistlint_core::Config;

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.preset.as_deref(), Some("standard"));
        assert_eq!(config.rule("spacing").get_int("max_blank_lines", 0), 1);
        assert_eq!(
            config.rule("header").get_str_array("copyright")[0],
            "# Copyright (c) Twisted Matrix Laboratories."
        );
        assert!(twistlint_rules::checkers_from_config(&config).is_ok());
    }

    #[test]
    fn existing_file_needs_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_NAME);
        write_config(&path, false).unwrap();
        assert!(write_config(&path, false).is_err());
        assert!(write_config(&path, true).is_ok());
    }
}
