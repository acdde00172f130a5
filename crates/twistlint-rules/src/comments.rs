//! Checker for `#` comment formatting.
//!
//! The first line of a comment block starts with `# ` followed by a
//! capitalized word. Continuation lines of a block are free-form.

use twistlint_core::scanner::LineScan;
use twistlint_core::utils::is_directive_comment;
use twistlint_core::{CheckContext, CheckError, Checker, MessageDef, NodeKindTag, NodeRef};

/// Checker name for comments.
pub const NAME: &str = "comments";

/// Comment does not start with exactly one space.
pub const ONE_WHITESPACE: &str = "W9401";
/// Comment does not start with a capital letter.
pub const CAPITALIZED: &str = "W9402";

const MESSAGES: &[MessageDef] = &[
    MessageDef {
        code: ONE_WHITESPACE,
        symbol: "comments-one-whitespace",
        summary: "Comments should begin with one whitespace",
        detail: "Used for checking comment format issues.",
        default_enabled: true,
    },
    MessageDef {
        code: CAPITALIZED,
        symbol: "comments-capitalized",
        summary: "The first letter of comment should be capitalized",
        detail: "Used for checking comment format issues.",
        default_enabled: true,
    },
];

/// Validates the first line of every comment block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comments;

impl Comments {
    /// Creates the checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `(code, line, column)` for every badly formatted comment.
    #[must_use]
    pub fn findings(scan: &LineScan) -> Vec<(&'static str, usize, usize)> {
        let mut findings = Vec::new();
        let mut first_of_block = true;

        for line in &scan.physical {
            if line.in_string {
                continue;
            }
            let Some(comment) = &line.comment else {
                first_of_block = true;
                continue;
            };
            if !first_of_block {
                continue;
            }
            first_of_block = false;

            let text = comment.text.as_str();
            if is_directive_comment(text) {
                continue;
            }
            let column = comment.column + 1;
            if text.starts_with("#  ") || !text.starts_with("# ") {
                findings.push((ONE_WHITESPACE, line.number, column));
            }
            let stripped = text.trim_start_matches('#').trim_start();
            if stripped
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() && c.is_lowercase())
            {
                findings.push((CAPITALIZED, line.number, column));
            }
        }
        findings
    }
}

impl Checker for Comments {
    fn name(&self) -> &'static str {
        NAME
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Module]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, _node: NodeRef<'_>) -> Result<(), CheckError> {
        for (code, line, column) in Self::findings(&ctx.lines) {
            ctx.emit_at(code, line, column, &[]);
        }
        Ok(())
    }
}
