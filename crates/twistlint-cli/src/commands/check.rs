//! Check command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use twistlint_core::{Analyzer, Config};
use twistlint_rules::{checkers_by_name, checkers_from_config, preset_of};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Command-line options of `check`.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Report format.
    pub format: OutputFormat,
    /// Comma-separated checker names replacing the preset selection.
    pub rules: Option<String>,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
    /// Preset overriding the configured one.
    pub preset: Option<String>,
    /// Render violations with source snippets.
    pub rich: bool,
}

/// Runs the check command.
///
/// Returns `true` when a violation reaches the `fail_on` threshold.
pub fn run(path: &Path, options: CheckOptions, source: &ConfigSource) -> Result<bool> {
    let mut config = source.load()?;
    if options.preset.is_some() {
        config.preset = options.preset;
    }
    apply_preset_messages(&mut config)?;
    let fail_on = config.fail_on_severity().context("Invalid fail_on")?;

    let checkers = match &options.rules {
        Some(filter) => checkers_by_name(filter.split(',').map(str::trim), &config),
        None => checkers_from_config(&config),
    }
    .context("Invalid checker configuration")?;

    let mut builder = Analyzer::builder()
        .root(path)
        .config(config)
        .excludes(options.exclude);
    for checker in checkers {
        builder = builder.checker_box(checker);
    }
    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Checking {} with {} checkers",
        path.display(),
        analyzer.checker_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    let base = if analyzer.root().is_file() {
        analyzer.root().parent().unwrap_or(analyzer.root())
    } else {
        analyzer.root()
    };
    super::output::print(&result, options.format, options.rich.then_some(base))?;

    Ok(result.has_violations_at(fail_on))
}

/// Adds the preset's default-off messages ahead of the user's own lists.
fn apply_preset_messages(config: &mut Config) -> Result<()> {
    let preset = preset_of(config).context("Invalid preset")?;
    let mut enable: Vec<String> = preset
        .enabled_messages()
        .iter()
        .map(ToString::to_string)
        .collect();
    enable.append(&mut config.messages.enable);
    config.messages.enable = enable;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(config: &str, module: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("twistlint.toml"), config).unwrap();
        fs::write(dir.path().join("mod.py"), module).unwrap();
        dir
    }

    fn check(dir: &TempDir, options: CheckOptions) -> bool {
        let source = ConfigSource::Project(dir.path().join("twistlint.toml"));
        run(dir.path(), options, &source).unwrap()
    }

    #[test]
    fn pep8_preset_enables_line_hygiene() {
        let mut config = Config::parse("preset = \"pep8\"\n[messages]\nenable = [\"W9001\"]\n").unwrap();
        apply_preset_messages(&mut config).unwrap();
        assert_eq!(
            config.messages.enable,
            vec!["W9010", "W9011", "W9017", "W9018", "W9001"]
        );
    }

    #[test]
    fn fail_on_threshold_decides_exit_status() {
        let module = "x = \"%s\" % value\n";
        let dir = project("fail_on = \"warning\"\n", module);
        let options = CheckOptions {
            rules: Some("formatting".to_string()),
            format: OutputFormat::Compact,
            ..CheckOptions::default()
        };
        assert!(check(&dir, options));

        let dir = project("fail_on = \"error\"\n", module);
        let options = CheckOptions {
            rules: Some("formatting".to_string()),
            format: OutputFormat::Compact,
            ..CheckOptions::default()
        };
        assert!(!check(&dir, options));
    }

    #[test]
    fn unknown_checker_is_an_error() {
        let dir = project("", "x = 1\n");
        let source = ConfigSource::Default;
        let options = CheckOptions {
            rules: Some("pylint".to_string()),
            ..CheckOptions::default()
        };
        assert!(run(dir.path(), options, &source).is_err());
    }
}
