//! Checker for blank-line conventions and physical-line hygiene.
//!
//! Top-level definitions are separated by three blank lines, methods by
//! two. Decorators are never followed by blank lines, and a docstring-only
//! body is followed by at most one blank line before the next definition.
//! Inside blocks, at most `max_blank_lines` blank lines separate statements.
//!
//! The checker runs on the logical lines of the file rather than on the
//! syntax tree. The trailing-whitespace and end-of-file messages are off
//! by default.
//!
//! # Configuration
//!
//! - `max_blank_lines`: blank lines tolerated inside blocks (default: 1)

use twistlint_core::scanner::{LineScan, LogicalLine};
use twistlint_core::{CheckContext, CheckError, Checker, MessageDef, NodeKindTag, NodeRef, RuleConfig};

/// Checker name for spacing.
pub const NAME: &str = "spacing";

/// Trailing whitespace.
pub const TRAILING_WHITESPACE: &str = "W9010";
/// Whitespace on a blank line.
pub const BLANK_LINE_WHITESPACE: &str = "W9011";
/// Method not preceded by two blank lines.
pub const EXPECTED_2: &str = "W9012";
/// Top-level definition not preceded by three blank lines.
pub const EXPECTED_3: &str = "W9013";
/// Too many blank lines inside a block.
pub const TOO_MANY: &str = "W9015";
/// Too many blank lines after a docstring-only body.
pub const TOO_MANY_AFTER_DOCSTRING: &str = "W9016";
/// Blank lines at end of file.
pub const BLANK_AT_EOF: &str = "W9017";
/// Missing newline at end of file.
pub const NO_NEWLINE_AT_EOF: &str = "W9018";
/// Blank lines between a decorator and its definition.
pub const AFTER_DECORATOR: &str = "W9027";

const MESSAGES: &[MessageDef] = &[
    MessageDef {
        code: TRAILING_WHITESPACE,
        symbol: "trailing-whitespace",
        summary: "Trailing whitespace found in the end of line",
        detail: "Used when a line contains a trailing space.",
        default_enabled: false,
    },
    MessageDef {
        code: BLANK_LINE_WHITESPACE,
        symbol: "blank-line-whitespace",
        summary: "Blank line contains whitespace",
        detail: "Used when found a line contains whitespace.",
        default_enabled: false,
    },
    MessageDef {
        code: EXPECTED_2,
        symbol: "expected-2-blank-lines",
        summary: "Expected 2 blank lines, found {}",
        detail: "Class-level functions should be separated with 2 blank lines.",
        default_enabled: true,
    },
    MessageDef {
        code: EXPECTED_3,
        symbol: "expected-3-blank-lines",
        summary: "Expected 3 blank lines, found {}",
        detail: "Top-level functions should be separated with 3 blank lines.",
        default_enabled: true,
    },
    MessageDef {
        code: TOO_MANY,
        symbol: "too-many-blank-lines",
        summary: "Too many blank lines, found {}",
        detail: "Used when too many blank lines are found.",
        default_enabled: true,
    },
    MessageDef {
        code: TOO_MANY_AFTER_DOCSTRING,
        symbol: "too-many-blank-lines-after-docstring",
        summary: "Too many blank lines after docstring, found {}",
        detail: "Used when too many blank lines after docstring are found.",
        default_enabled: true,
    },
    MessageDef {
        code: BLANK_AT_EOF,
        symbol: "blank-line-at-eof",
        summary: "Blank line at end of file",
        detail: "More than one blank line found at EOF.",
        default_enabled: false,
    },
    MessageDef {
        code: NO_NEWLINE_AT_EOF,
        symbol: "no-newline-at-eof",
        summary: "No newline at end of file",
        detail: "No newline is found at end of file.",
        default_enabled: false,
    },
    MessageDef {
        code: AFTER_DECORATOR,
        symbol: "blank-lines-after-decorator",
        summary: "Blank lines found after a function decorator",
        detail: "Function decorators should be directly followed by the definition.",
        default_enabled: true,
    },
];

/// One spacing problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Message code.
    pub code: &'static str,
    /// Line (1-based).
    pub line: usize,
    /// Column (1-based).
    pub column: usize,
    /// Message argument, if the message takes one.
    pub arg: Option<String>,
}

impl Finding {
    fn new(code: &'static str, line: usize, column: usize) -> Self {
        Self {
            code,
            line,
            column,
            arg: None,
        }
    }

    fn count(code: &'static str, logical: &LogicalLine) -> Self {
        Self {
            code,
            line: logical.start_line,
            column: logical.indent + 1,
            arg: Some(logical.blank_before.to_string()),
        }
    }
}

/// Enforces blank-line conventions.
#[derive(Debug, Clone)]
pub struct Spacing {
    /// Blank lines tolerated between statements inside blocks.
    pub max_blank_lines: usize,
}

impl Default for Spacing {
    fn default() -> Self {
        Self::new()
    }
}

impl Spacing {
    /// Creates the checker with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { max_blank_lines: 1 }
    }

    /// Creates the checker from its configuration section.
    #[must_use]
    pub fn from_config(config: &RuleConfig) -> Self {
        let max = config.get_int("max_blank_lines", 1);
        Self::new().max_blank_lines(usize::try_from(max).unwrap_or(1))
    }

    /// Sets the blank lines tolerated inside blocks.
    #[must_use]
    pub fn max_blank_lines(mut self, max: usize) -> Self {
        self.max_blank_lines = max;
        self
    }

    /// Runs the blank-line state machine over the logical lines.
    #[must_use]
    pub fn blank_line_findings(&self, scan: &LineScan) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut previous: Option<&LogicalLine> = None;

        for current in &scan.logical {
            let Some(prev) = previous.replace(current) else {
                continue;
            };
            let blanks = current.blank_before;

            if prev.text.starts_with('@') {
                if blanks > 0 {
                    findings.push(Finding::new(AFTER_DECORATOR, current.start_line, current.indent + 1));
                }
                continue;
            }

            if opens_definition(&current.text) {
                if current.indent > 0 {
                    if is_docstring(&prev.text) {
                        let empty_documented_method = prev.indent == current.indent + 4
                            && current.text.starts_with("def ")
                            && blanks == 2;
                        if !empty_documented_method && blanks > 1 {
                            findings.push(Finding::count(TOO_MANY_AFTER_DOCSTRING, current));
                        }
                    } else if !(blanks == 2 || current.indent > 4 || prev.indent < current.indent) {
                        findings.push(Finding::count(EXPECTED_2, current));
                    }
                } else if blanks != 3 {
                    findings.push(Finding::count(EXPECTED_3, current));
                }
            } else if blanks > self.max_blank_lines && current.indent > 0 {
                findings.push(Finding::count(TOO_MANY, current));
            }
        }
        findings
    }

    /// Trailing whitespace and end-of-file checks on physical lines.
    #[must_use]
    pub fn physical_findings(scan: &LineScan) -> Vec<Finding> {
        let mut findings = Vec::new();
        for line in &scan.physical {
            let trimmed = line.text.trim_end_matches([' ', '\t', '\x0c']);
            if trimmed.len() == line.text.len() {
                continue;
            }
            if trimmed.is_empty() {
                findings.push(Finding::new(BLANK_LINE_WHITESPACE, line.number, 1));
            } else {
                findings.push(Finding::new(TRAILING_WHITESPACE, line.number, trimmed.len() + 1));
            }
        }

        if let Some(last) = scan.physical.last() {
            if !scan.ends_with_newline {
                findings.push(Finding::new(NO_NEWLINE_AT_EOF, last.number, last.text.len() + 1));
            } else if last.text.trim().is_empty() {
                findings.push(Finding::new(BLANK_AT_EOF, last.number, 1));
            }
        }
        findings
    }
}

impl Checker for Spacing {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Checks blank lines around definitions and whitespace at line ends"
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Module]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, _node: NodeRef<'_>) -> Result<(), CheckError> {
        let mut findings = self.blank_line_findings(&ctx.lines);
        findings.extend(Self::physical_findings(&ctx.lines));
        for finding in findings {
            let args: Vec<&str> = finding.arg.as_deref().into_iter().collect();
            ctx.emit_at(finding.code, finding.line, finding.column, &args);
        }
        Ok(())
    }
}

fn opens_definition(text: &str) -> bool {
    text.starts_with("def ")
        || text.starts_with("async def ")
        || text.starts_with("class ")
        || text.starts_with('@')
}

/// A logical line that is a bare string literal.
fn is_docstring(text: &str) -> bool {
    let body = text.trim_start_matches(['u', 'U', 'r', 'R', 'b', 'B']);
    body.len() + 2 >= text.len() && (body.starts_with('"') || body.starts_with('\''))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_source, check_source_all_messages, codes};
    use twistlint_core::scanner::scan;

    fn findings(source: &str) -> Vec<(&'static str, usize, Option<String>)> {
        Spacing::new()
            .blank_line_findings(&scan(source))
            .into_iter()
            .map(|f| (f.code, f.line, f.arg))
            .collect()
    }

    #[test]
    fn test_conforming_layout() {
        let source = "import os\n\n\n\nclass A:\n    x = 1\n\n\n    def f(self):\n        pass\n\n\n    def g(self):\n        pass\n\n\n\ndef h():\n    pass\n";
        assert!(findings(source).is_empty());
    }

    #[test]
    fn test_reduced_blank_lines_report_count() {
        let source = "class A:\n    def f(self):\n        pass\n\n    def g(self):\n        pass\n\ndef h():\n    pass\n";
        assert_eq!(
            findings(source),
            vec![
                (EXPECTED_2, 5, Some("1".to_string())),
                (EXPECTED_3, 8, Some("1".to_string())),
            ]
        );
    }

    #[test]
    fn test_top_level_definition_after_statement() {
        let source = "import os\n\ndef f():\n    pass\n\n\n\nx = f()\n\n\n\n\nclass A:\n    pass\n";
        assert_eq!(
            findings(source),
            vec![
                (EXPECTED_3, 3, Some("1".to_string())),
                (EXPECTED_3, 13, Some("4".to_string())),
            ]
        );
    }

    #[test]
    fn test_first_definition_in_block_is_free() {
        let source = "class A:\n    def f(self):\n        def inner():\n            pass\n        return inner\n";
        assert!(findings(source).is_empty());
    }

    #[test]
    fn test_decorator_followed_by_blank_line() {
        let source = "import os\n\n\n\n@decorate\n\ndef f():\n    pass\n";
        assert_eq!(findings(source), vec![(AFTER_DECORATOR, 7, None)]);
    }

    #[test]
    fn test_blank_lines_after_docstring() {
        let source = "class IFoo:\n    def a():\n        \"\"\"\n        A.\n        \"\"\"\n\n\n    def b():\n        \"\"\"\n        B.\n        \"\"\"\n\n\n\n    def c():\n        pass\n";
        assert_eq!(
            findings(source),
            vec![(TOO_MANY_AFTER_DOCSTRING, 15, Some("3".to_string()))]
        );
    }

    #[test]
    fn test_too_many_blank_lines_in_block() {
        let source = "def f():\n    x = 1\n\n\n    return x\n";
        assert_eq!(findings(source), vec![(TOO_MANY, 5, Some("2".to_string()))]);
        let relaxed = Spacing::new().max_blank_lines(2).blank_line_findings(&scan(source));
        assert!(relaxed.is_empty());
    }

    #[test]
    fn test_comments_do_not_break_runs() {
        let source = "def a():\n    pass\n\n\n# Section.\n\n\n\ndef b():\n    pass\n";
        assert!(findings(source).is_empty());
    }

    #[test]
    fn test_physical_lines() {
        let found: Vec<(&str, usize)> = Spacing::physical_findings(&scan("x = 1 \n  \ny = 2\n\n"))
            .into_iter()
            .map(|f| (f.code, f.line))
            .collect();
        assert_eq!(
            found,
            vec![(TRAILING_WHITESPACE, 1), (BLANK_LINE_WHITESPACE, 2), (BLANK_AT_EOF, 4)]
        );
        let missing = Spacing::physical_findings(&scan("x = 1"));
        assert_eq!(missing[0].code, NO_NEWLINE_AT_EOF);
    }

    #[test]
    fn test_hygiene_messages_are_off_by_default() {
        let source = "x = 1 \n\n\n\ndef f():\n    pass";
        let violations = check_source(Spacing::new(), "pkg.mod", source);
        assert_eq!(codes(&violations), vec![]);

        let violations = check_source_all_messages(Spacing::new(), "pkg.mod", source);
        assert_eq!(
            codes(&violations),
            vec![(TRAILING_WHITESPACE, 1), (NO_NEWLINE_AT_EOF, 6)]
        );
    }

    #[test]
    fn test_docstring_detection() {
        assert!(is_docstring("\"\"\" doc \"\"\""));
        assert!(is_docstring("r'''raw'''"));
        assert!(!is_docstring("return 'x'"));
        assert!(!is_docstring("x = 1"));
    }
}
