//! Core types for diagnostics and lint results.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::NodeId;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Convention or refactoring hint.
    Info,
    /// Coding-standard violation that should be addressed.
    Warning,
    /// Fatal problem, the file could not be fully checked.
    Error,
}

impl Severity {
    /// Derives the default severity from a message code prefix.
    ///
    /// `F`/`E` map to errors, `W` to warnings, and `C`/`R` to info.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.chars().next() {
            Some('F' | 'E') => Self::Error,
            Some('C' | 'R') => Self::Info,
            _ => Self::Warning,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the analyzed root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed), 0 when the diagnostic has no column.
    pub column: usize,
    /// Byte offset in file (for miette integration).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A single reported rule violation.
///
/// Created once per violation instance by the [`MessageSink`](crate::MessageSink)
/// and never mutated afterwards, except for severity overrides applied by the
/// analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Message code (e.g., "W9208").
    pub code: String,
    /// Symbolic message name (e.g., "missing-docstring").
    pub symbol: String,
    /// Name of the checker that produced this violation.
    pub checker: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Primary location of the violation.
    pub location: Location,
    /// Rendered human-readable message.
    pub message: String,
    /// Format arguments used to render the message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Originating node in the module model, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        symbol: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            checker: String::new(),
            severity,
            location,
            message: message.into(),
            args: Vec::new(),
            node: None,
        }
    }

    /// Records the checker that emitted this violation.
    #[must_use]
    pub fn with_checker(mut self, checker: impl Into<String>) -> Self {
        self.checker = checker.into();
        self
    }

    /// Records the format arguments of this violation.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Records the originating node.
    #[must_use]
    pub fn with_node(mut self, node: Option<NodeId>) -> Self {
        self.node = node;
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Converts a Violation to a miette Diagnostic for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Violation> for ViolationDiagnostic {
    fn from(v: &Violation) -> Self {
        Self {
            message: format!("[{}] {}", v.code, v.message),
            span: SourceSpan::from((v.location.offset, v.location.length)),
            label_message: v.symbol.clone(),
        }
    }
}

/// Result of running lint analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All violations found.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Number of files whose checking was aborted by a fatal checker error.
    #[serde(default)]
    pub files_failed: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| self.by_severity(severity).len();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Sorts violations by file, line and code, the display order of reports.
    pub fn sort(&mut self) {
        self.violations.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.code.cmp(&b.code))
                .then(a.location.column.cmp(&b.location.column))
        });
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Adds violations from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.files_checked += other.files_checked;
        self.files_failed += other.files_failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(code: &str, line: usize) -> Violation {
        Violation::new(
            code,
            "missing-docstring",
            Severity::from_code(code),
            Location::new(PathBuf::from("twisted/web/http.py"), line, 1),
            "Missing docstring",
        )
    }

    #[test]
    fn severity_follows_code_prefix() {
        assert_eq!(Severity::from_code("W9208"), Severity::Warning);
        assert_eq!(Severity::from_code("C9302"), Severity::Info);
        assert_eq!(Severity::from_code("F9001"), Severity::Error);
        assert_eq!(Severity::from_code("E1101"), Severity::Error);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn display_is_compact_single_line() {
        let v = make_violation("W9208", 12);
        assert_eq!(
            v.to_string(),
            "twisted/web/http.py:12:1: warning [W9208] Missing docstring"
        );
    }

    #[test]
    fn sort_orders_by_line_then_code() {
        let mut result = LintResult::new();
        result.violations.push(make_violation("W9208", 5));
        result.violations.push(make_violation("C9302", 5));
        result.violations.push(make_violation("W9001", 1));
        result.sort();

        let order: Vec<(&str, usize)> = result
            .violations
            .iter()
            .map(|v| (v.code.as_str(), v.location.line))
            .collect();
        assert_eq!(order, vec![("W9001", 1), ("C9302", 5), ("W9208", 5)]);
    }

    #[test]
    fn has_violations_at_threshold() {
        let mut result = LintResult::new();
        result.violations.push(make_violation("C9302", 3));
        assert!(!result.has_violations_at(Severity::Warning));
        assert!(result.has_violations_at(Severity::Info));
    }

    #[test]
    fn extend_accumulates_counters() {
        let mut a = LintResult::new();
        a.files_checked = 1;
        let mut b = LintResult::new();
        b.files_checked = 2;
        b.files_failed = 1;
        b.violations.push(make_violation("W9208", 1));
        a.extend(b);
        assert_eq!(a.files_checked, 3);
        assert_eq!(a.files_failed, 1);
        assert_eq!(a.violations.len(), 1);
    }
}
