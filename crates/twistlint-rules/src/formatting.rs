//! Checker for `%` string formatting operands.
//!
//! `"%s" % value` breaks when `value` happens to be a tuple, so non-mapping
//! operands are always written as a tuple: `"%s" % (value,)`.

use twistlint_core::model::{ExprKind, NodeKind};
use twistlint_core::{CheckContext, CheckError, Checker, MessageDef, NodeKindTag, NodeRef};

/// Checker name for formatting.
pub const NAME: &str = "formatting";

/// Formatting operand is not a tuple.
pub const NOT_TUPLE: &str = "W9501";

const MESSAGES: &[MessageDef] = &[MessageDef {
    code: NOT_TUPLE,
    symbol: "formatting-operation-not-tuple",
    summary: "String formatting operations should always use a tuple for non-mapping values",
    detail: "Checking string formatting operations.",
    default_enabled: true,
}];

/// Flags `%` formatting with a bare operand.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingOperation;

impl FormattingOperation {
    /// Creates the checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Checker for FormattingOperation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::BinOp]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
        let NodeKind::BinOp(op) = node.kind() else {
            return Ok(());
        };
        if op.op != "%" {
            return Ok(());
        }
        // Only literal patterns tell a tuple from a mapping.
        let ExprKind::Str { value } = &op.left.kind else {
            return Ok(());
        };
        if value.contains("%(") || value.split('%').any(is_number) {
            return Ok(());
        }
        if !matches!(op.right.kind, ExprKind::Tuple(_)) {
            ctx.emit(NOT_TUPLE, node.line(), &[], Some(node));
        }
        Ok(())
    }
}

fn is_number(segment: &str) -> bool {
    let segment = segment.trim();
    segment.chars().any(|c| c.is_ascii_digit())
        && segment.chars().all(|c| c.is_ascii_digit() || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_source, codes};

    fn check(source: &str) -> Vec<(&'static str, usize)> {
        codes(&check_source(FormattingOperation::new(), "pkg.mod", source))
    }

    #[test]
    fn test_bare_operand_is_flagged() {
        assert_eq!(check("formattedString = \"%d\" % num\n"), vec![(NOT_TUPLE, 1)]);
        assert_eq!(check("s = '%s' % (num)\n"), vec![(NOT_TUPLE, 1)]);
    }

    #[test]
    fn test_tuples_and_mappings_pass() {
        assert!(check("formattedString = \"%d\" % (num,)\n").is_empty());
        assert!(check("s = '%s, %s' % (a, b)\n").is_empty());
        assert!(check("s = \"%(num)d\" % {\"num\": 3}\n").is_empty());
    }

    #[test]
    fn test_non_literal_and_arithmetic_are_skipped() {
        assert!(check("s = pattern % value\n").is_empty());
        assert!(check("x = 10 % 3\n").is_empty());
        assert!(check("s = '100%' % value\n").is_empty());
        assert!(check("s = '%d' + value\n").is_empty());
    }
}
