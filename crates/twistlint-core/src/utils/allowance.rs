//! Comment-based suppression directives.
//!
//! Supports directives like:
//! ```text
//! # twistlint: disable=missing-docstring,W9202 reason="generated code"
//! ```
//!
//! A directive applies to its own line and to the line that follows it.

use std::collections::{HashMap, HashSet};

use crate::scanner::LineScan;

const DIRECTIVE_PREFIX: &str = "twistlint:";

/// Result of checking a diagnostic against the directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// The message is reported.
    Denied,
    /// The message is suppressed, with an optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if suppressed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if suppressed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed `disable=` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DisableDirective {
    /// Codes or symbols, `all` matches everything.
    messages: HashSet<String>,
    reason: Option<String>,
}

/// Directives of one file, keyed by line.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    by_line: HashMap<usize, DisableDirective>,
}

impl Suppressions {
    /// Collects directives from the comments of a scanned file.
    #[must_use]
    pub fn from_scan(scan: &LineScan) -> Self {
        let by_line = scan
            .physical
            .iter()
            .filter_map(|line| {
                let comment = line.comment.as_ref()?;
                parse_directive(&comment.text).map(|d| (line.number, d))
            })
            .collect();
        Self { by_line }
    }

    /// Checks whether a message on a line is suppressed.
    #[must_use]
    pub fn check(&self, line: usize, code: &str, symbol: &str) -> AllowCheck {
        for candidate in [line.saturating_sub(1), line] {
            let Some(directive) = self.by_line.get(&candidate) else {
                continue;
            };
            if ["all", code, symbol]
                .iter()
                .any(|name| directive.messages.contains(*name))
            {
                return AllowCheck::Allowed {
                    reason: directive.reason.clone(),
                };
            }
        }
        AllowCheck::Denied
    }

    /// Number of lines carrying a directive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_line.len()
    }

    /// Returns true if the file has no directive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }
}

/// Whether a comment is a `twistlint:` directive.
#[must_use]
pub fn is_directive_comment(comment: &str) -> bool {
    comment
        .trim_start_matches('#')
        .trim_start()
        .starts_with(DIRECTIVE_PREFIX)
}

fn parse_directive(comment: &str) -> Option<DisableDirective> {
    let body = comment.strip_prefix('#')?.trim();
    let directive = body.strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let list = directive.strip_prefix("disable")?.trim_start();
    let list = list.strip_prefix('=')?.trim_start();

    let (names, rest) = list
        .split_once(char::is_whitespace)
        .unwrap_or((list, ""));
    let messages: HashSet<String> = names
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if messages.is_empty() {
        return None;
    }

    let reason = rest
        .trim()
        .strip_prefix("reason=")
        .and_then(|r| r.strip_prefix('"'))
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()));

    Some(DisableDirective { messages, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    #[test]
    fn parses_codes_and_symbols() {
        let directive = parse_directive("# twistlint: disable=W9208,invalid-method-name").unwrap();
        assert!(directive.messages.contains("W9208"));
        assert!(directive.messages.contains("invalid-method-name"));
        assert!(directive.reason.is_none());
    }

    #[test]
    fn parses_reason() {
        let directive =
            parse_directive("# twistlint: disable=all reason=\"vendored module\"").unwrap();
        assert_eq!(directive.reason.as_deref(), Some("vendored module"));
    }

    #[test]
    fn rejects_other_comments() {
        assert!(parse_directive("# pylint: disable=W0401").is_none());
        assert!(parse_directive("# twistlint: disable=").is_none());
        assert!(parse_directive("# twistlint: enable=W9208").is_none());
    }

    #[test]
    fn applies_to_own_and_next_line() {
        let source = "# twistlint: disable=W9208\ndef f():\n    pass\nx = 1  # twistlint: disable=all\n";
        let suppressions = Suppressions::from_scan(&scan(source));
        assert!(suppressions.check(2, "W9208", "missing-docstring").is_allowed());
        assert!(!suppressions.check(2, "W9202", "missing-param-markup").is_allowed());
        assert!(!suppressions.check(3, "W9208", "missing-docstring").is_allowed());
        assert!(suppressions.check(4, "W9501", "formatting-operation-not-tuple").is_allowed());
    }

    #[test]
    fn directive_inside_string_is_ignored() {
        let source = "x = '# twistlint: disable=all'\ny = 1\n";
        let suppressions = Suppressions::from_scan(&scan(source));
        assert!(suppressions.is_empty());
    }

    #[test]
    fn detects_directive_comments() {
        assert!(is_directive_comment("# twistlint: disable=W9401"));
        assert!(is_directive_comment("#twistlint: disable=W9401"));
        assert!(!is_directive_comment("# Regular comment"));
    }
}
