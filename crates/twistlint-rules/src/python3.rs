//! Checker for constructs removed in Python 3.
//!
//! | Code | Construct |
//! |------|-----------|
//! | W9601 | `print` statement (reported once per module) |
//! | W9602 | `.has_key()` on a value known to be a dict |
//! | W9603 | call to the built-in `apply` |
//! | W9604 | `except Type, name:` |
//!
//! Inference is shallow: when the receiver of `has_key` or the target of
//! `apply` cannot be determined, nothing is reported.

use twistlint_core::model::{Call, ExprKind, NodeKind};
use twistlint_core::{
    CheckContext, CheckError, Checker, MessageDef, Module, NodeId, NodeKindTag, NodeRef,
};

/// Checker name for python3.
pub const NAME: &str = "python3";

/// `print` statement.
pub const PRINT_STATEMENT: &str = "W9601";
/// `dict.has_key()`.
pub const HAS_KEY: &str = "W9602";
/// Built-in `apply`.
pub const BUILTIN_APPLY: &str = "W9603";
/// Legacy except clause.
pub const OLD_EXCEPT: &str = "W9604";

const MESSAGES: &[MessageDef] = &[
    MessageDef {
        code: PRINT_STATEMENT,
        symbol: "print-statement",
        summary: "For compatibility with python 3, you should import print_function from __future__",
        detail: "Checking print statement for python 3.",
        default_enabled: true,
    },
    MessageDef {
        code: HAS_KEY,
        symbol: "dict-has-key",
        summary: "dict.has_key() has been removed in python 3, use the in operator instead",
        detail: "Checking has_key issue for python 3.",
        default_enabled: true,
    },
    MessageDef {
        code: BUILTIN_APPLY,
        symbol: "builtin-apply",
        summary: "The built-in function apply is removed in python 3",
        detail: "Checking apply issue for python 3.",
        default_enabled: true,
    },
    MessageDef {
        code: OLD_EXCEPT,
        symbol: "old-except-syntax",
        summary: "Please use 'except Exception as e:', rather than 'except Exception, e:'",
        detail: "Checking exception issue for python 3.",
        default_enabled: true,
    },
];

/// Flags Python 2 only syntax and built-ins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Python3;

impl Python3 {
    /// Creates the checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Checker for Python3 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Checks for constructs removed in Python 3"
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Print, NodeKindTag::Call, NodeKindTag::ExceptHandler]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
        match node.kind() {
            NodeKind::Print => {
                if !ctx.already_emitted(PRINT_STATEMENT) {
                    ctx.emit(PRINT_STATEMENT, node.line(), &[], Some(node));
                }
            }
            NodeKind::Call(call) => {
                if calls_dict_has_key(ctx.module, node.id, call) {
                    ctx.emit(HAS_KEY, node.line(), &[], Some(node));
                }
                if calls_builtin_apply(ctx.module, node, call) {
                    ctx.emit(BUILTIN_APPLY, node.line(), &[], Some(node));
                }
            }
            NodeKind::ExceptHandler { old_syntax: true } => {
                ctx.emit(OLD_EXCEPT, node.line(), &[], Some(node));
            }
            _ => {}
        }
        Ok(())
    }
}

fn calls_dict_has_key(module: &Module, id: NodeId, call: &Call) -> bool {
    let ExprKind::Attribute { object, attr } = &call.func.kind else {
        return false;
    };
    if attr != "has_key" {
        return false;
    }
    match &object.kind {
        ExprKind::Dict => true,
        ExprKind::Name => matches!(
            module.preceding_assignment(id, &object.text),
            Some(ExprKind::Dict)
        ),
        _ => false,
    }
}

/// `apply(...)` that resolves to the built-in.
///
/// Code inside a function looks names up when it runs, so any binding in
/// its scope chain shadows the built-in. Code run at import time only sees
/// bindings made before it.
fn calls_builtin_apply(module: &Module, node: NodeRef<'_>, call: &Call) -> bool {
    if call.func.kind != ExprKind::Name || call.func.text != "apply" {
        return false;
    }
    let Some(binding) = module.lookup(node.id, "apply") else {
        return true;
    };
    let runs_at_import = !node.ancestors().any(|a| a.as_function().is_some());
    runs_at_import && binding.line > node.line()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_source, codes};

    fn check(source: &str) -> Vec<(&'static str, usize)> {
        codes(&check_source(Python3::new(), "pkg.mod", source))
    }

    #[test]
    fn test_print_reported_once() {
        let source = "print 'a'\nx = 1\nprint 'b'\n";
        assert_eq!(check(source), vec![(PRINT_STATEMENT, 1)]);
    }

    #[test]
    fn test_has_key_on_dicts() {
        let source = "if {}.has_key('bar'):\n    pass\n\nfoo = {}\n\nif foo.has_key('bar'):\n    pass\n";
        assert_eq!(check(source), vec![(HAS_KEY, 1), (HAS_KEY, 6)]);
    }

    #[test]
    fn test_has_key_on_unknown_receiver() {
        assert!(check("def f(d):\n    return d.has_key('x')\n").is_empty());
        assert!(check("foo = []\nfoo.has_key('x')\n").is_empty());
    }

    #[test]
    fn test_builtin_apply() {
        let source = "def foo(x, y):\n    pass\n\napply(foo, (1, 2))\n";
        assert_eq!(check(source), vec![(BUILTIN_APPLY, 4)]);
    }

    #[test]
    fn test_shadowed_apply() {
        let source = "baz.apply(1, 2)\n\nfrom os.path import exists as apply\n\napply('foo')\n";
        assert!(check(source).is_empty());

        let source = "import os.path\n\napply = os.path.exists\n\napply('foo')\n";
        assert!(check(source).is_empty());

        let source = "def f():\n    apply('x')\n    apply = len\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_apply_defined_after_calling_function() {
        let source = "def f():\n    return apply(g, ())\n\n\n\ndef apply(*a):\n    pass\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_apply_before_later_import() {
        let source = "apply(f, ())\n\nfrom os.path import exists as apply\n";
        assert_eq!(check(source), vec![(BUILTIN_APPLY, 1)]);
    }

    #[test]
    fn test_except_syntax() {
        let modern = "try:\n    pass\nexcept Exception as e:\n    pass\n";
        assert!(check(modern).is_empty());

        let legacy = "try:\n    pass\nexcept Exception, e:\n    pass\n\ntry:\n    pass\nexcept (TypeError, NameError), e:\n    pass\nfinally:\n    pass\n";
        assert_eq!(check(legacy), vec![(OLD_EXCEPT, 3), (OLD_EXCEPT, 8)]);
    }
}
