//! Configuration types for twistlint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::Severity;

/// Top-level configuration for twistlint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use ("standard", "pep8", "minimal").
    #[serde(default)]
    pub preset: Option<String>,

    /// Severity threshold for a failing run (default: "warning").
    #[serde(default)]
    pub fail_on: Option<String>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Message enable/disable lists.
    #[serde(default)]
    pub messages: MessagesConfig,

    /// Per-checker configurations keyed by checker name.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a checker is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a checker.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }

    /// Configuration section of a checker, or an empty one.
    #[must_use]
    pub fn rule(&self, rule_name: &str) -> RuleConfig {
        self.rules.get(rule_name).cloned().unwrap_or_default()
    }

    /// Parsed `fail_on` threshold, defaulting to warnings.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown severity name.
    pub fn fail_on_severity(&self) -> Result<Severity, ConfigError> {
        self.fail_on
            .as_deref()
            .map_or(Ok(Severity::Warning), |s| {
                s.parse().map_err(|message| ConfigError::Parse { message })
            })
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Extra import roots for cross-module interface resolution.
    #[serde(default)]
    pub python_path: Vec<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: vec!["**/build/**".to_string(), "**/.tox/**".to_string()],
            respect_gitignore: true,
            python_path: Vec::new(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Message filters, each entry a code or a symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Messages to turn on, including default-off ones.
    #[serde(default)]
    pub enable: Vec<String>,

    /// Messages to turn off.
    #[serde(default)]
    pub disable: Vec<String>,
}

/// Per-checker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this checker is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for every message of this checker.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Checker-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets an option value as a specific type.
    #[must_use]
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| v.clone().try_into().ok())
    }

    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets an integer option with a default value.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.options
            .get(key)
            .and_then(toml::Value::as_integer)
            .unwrap_or(default)
    }

    /// Gets a string option with a default value.
    #[must_use]
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }

    /// Gets a string array option.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A regular expression option does not compile.
    #[error("Invalid pattern for {key}: {message}")]
    InvalidPattern {
        /// Option key.
        key: String,
        /// Compiler message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analyzer.respect_gitignore);
        assert!(config.rules.is_empty());
        assert_eq!(config.fail_on_severity().unwrap(), Severity::Warning);
    }

    #[test]
    fn test_parse_config() {
        let toml = r##"
preset = "pep8"
fail_on = "info"

[analyzer]
root = "./twisted"
exclude = ["**/_version.py"]
python_path = ["../zope"]

[messages]
enable = ["W9010"]
disable = ["comments-capitalized"]

[rules.docstring]
enabled = true
severity = "info"
strict_epydoc = false
options_prefix = "cmd_"

[rules.header]
copyright = ["# Copyright (c) Example.", "# See LICENSE."]
"##;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.analyzer.root, PathBuf::from("./twisted"));
        assert_eq!(config.analyzer.python_path, vec![PathBuf::from("../zope")]);
        assert_eq!(config.messages.enable, vec!["W9010"]);
        assert_eq!(config.fail_on_severity().unwrap(), Severity::Info);
        assert!(config.is_rule_enabled("docstring"));
        assert_eq!(config.rule_severity("docstring"), Some(Severity::Info));

        let docstring = config.rule("docstring");
        assert!(!docstring.get_bool("strict_epydoc", true));
        assert_eq!(docstring.get_str("options_prefix", "opt_"), "cmd_");
        assert_eq!(
            config.rule("header").get_str_array("copyright"),
            vec!["# Copyright (c) Example.", "# See LICENSE."]
        );
        assert_eq!(config.rule("spacing").get_int("max_blank_lines", 1), 1);
    }

    #[test]
    fn test_disabled_rule() {
        let config = Config::parse("[rules.python3]\nenabled = false\n").unwrap();
        assert!(!config.is_rule_enabled("python3"));
        assert!(config.is_rule_enabled("names"));
    }

    #[test]
    fn test_invalid_fail_on() {
        let config = Config::parse("fail_on = \"loud\"\n").unwrap();
        assert!(config.fail_on_severity().is_err());
    }
}
