//! Checker for the copyright header and the test-module reference.
//!
//! Every module carries the project copyright notice followed by the
//! license line. Modules that are neither tests nor private also name
//! their test module in an Emacs-style variable line:
//!
//! ```text
//! # -*- test-case-name: twisted.web.test.test_http -*-
//! # Copyright (c) Twisted Matrix Laboratories.
//! # See LICENSE for details.
//! ```
//!
//! # Configuration
//!
//! - `copyright`: the required header lines, in order

use regex::Regex;
use twistlint_core::{
    CheckContext, CheckError, Checker, ConfigError, MessageDef, NodeKindTag, NodeRef, RuleConfig,
};

use crate::literal_regex;

/// Checker name for header.
pub const NAME: &str = "header";

/// Missing copyright header.
pub const MISSING_COPYRIGHT: &str = "W9001";
/// Missing test module reference.
pub const MISSING_TEST_REFERENCE: &str = "W9002";

/// Default copyright header lines.
pub const DEFAULT_COPYRIGHT: [&str; 2] = [
    "# Copyright (c) Twisted Matrix Laboratories.",
    "# See LICENSE for details.",
];

const MESSAGES: &[MessageDef] = &[
    MessageDef {
        code: MISSING_COPYRIGHT,
        symbol: "missing-copyright-header",
        summary: "Missing copyright header",
        detail: "Used when a module has no copyright header.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_TEST_REFERENCE,
        symbol: "missing-test-header",
        summary: "Missing a reference to test module in header",
        detail: "Used when a module does not contain a reference to test module.",
        default_enabled: true,
    },
];

/// Searches module text for the required header lines.
#[derive(Debug, Clone)]
pub struct Header {
    copyright: Regex,
    test_reference: Regex,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    /// Creates the checker with the default copyright lines.
    #[must_use]
    pub fn new() -> Self {
        Self {
            copyright: literal_regex(&copyright_pattern(&DEFAULT_COPYRIGHT)),
            test_reference: literal_regex(
                r"# -\*- test-case-name: (([a-z_][a-z0-9_]*)\.)*[a-z_][a-z0-9_]* -\*-",
            ),
        }
    }

    /// Creates the checker from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the copyright lines do not form a valid pattern.
    pub fn from_config(config: &RuleConfig) -> Result<Self, ConfigError> {
        let lines = config.get_str_array("copyright");
        if lines.is_empty() {
            return Ok(Self::new());
        }
        let pattern = copyright_pattern(&lines);
        let copyright = Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
            key: "copyright".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            copyright,
            ..Self::new()
        })
    }
}

/// Consecutive lines, each matched literally.
fn copyright_pattern<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|line| regex::escape(line.as_ref()))
        .collect::<Vec<_>>()
        .join(r"\s*\n\s*")
}

impl Checker for Header {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Checks the copyright header and the test module reference"
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Module]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
        let text = ctx.module.source.as_str();
        if !self.copyright.is_match(text) {
            ctx.emit(MISSING_COPYRIGHT, 1, &[], Some(node));
        }
        if ctx.file.requires_test_reference && !self.test_reference.is_match(text) {
            ctx.emit(MISSING_TEST_REFERENCE, 1, &[], Some(node));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_source, codes};
    use twistlint_core::Config;

    const HEADER: &str = "# -*- test-case-name: twisted.web.test.test_http -*-\n# Copyright (c) Twisted Matrix Laboratories.\n# See LICENSE for details.\n";

    #[test]
    fn test_complete_header() {
        assert!(check_source(Header::new(), "twisted.web.http", HEADER).is_empty());
    }

    #[test]
    fn test_missing_elements() {
        let violations = check_source(Header::new(), "twisted.web.http", "x = 1\n");
        assert_eq!(
            codes(&violations),
            vec![(MISSING_COPYRIGHT, 1), (MISSING_TEST_REFERENCE, 1)]
        );

        let split = "# Copyright (c) Twisted Matrix Laboratories.\nx = 1\n# See LICENSE for details.\n";
        let violations = check_source(Header::new(), "twisted.test.test_http", split);
        assert_eq!(codes(&violations), vec![(MISSING_COPYRIGHT, 1)]);
    }

    #[test]
    fn test_reference_not_required() {
        let copyright = "# Copyright (c) Twisted Matrix Laboratories.\n# See LICENSE for details.\n";
        for name in ["twisted.test.test_http", "twisted.web.test.util", "twisted._version"] {
            assert!(check_source(Header::new(), name, copyright).is_empty(), "{name}");
        }
    }

    #[test]
    fn test_custom_copyright() {
        let config = Config::parse("[rules.header]\ncopyright = [\"# (c) Example Corp.\"]\n").unwrap();
        let header = Header::from_config(&config.rule(NAME)).unwrap();
        let violations = check_source(header, "pkg._private", "# (c) Example Corp.\n");
        assert!(violations.is_empty());
    }
}
