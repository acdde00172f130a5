//! Checker for method and test-module naming conventions.
//!
//! # Rationale
//!
//! Methods are `camelCase`. Underscores are only tolerated for reserved
//! dunder names, a single private prefix, and dispatch families such as
//! `ftp_USER`/`ftp_PASS` where sibling methods share the prefix. Test
//! methods in test modules are `test_something`.
//!
//! # Messages
//!
//! - `W9301` test module containing a `TestCase` whose basename lacks `test_`
//! - `C9302` invalid method name
//! - `C9303` invalid test method name

use regex::Regex;

use crate::literal_regex;
use twistlint_core::{CheckContext, CheckError, Checker, MessageDef, NodeKindTag, NodeRef};

/// Checker name for names.
pub const NAME: &str = "names";

/// Test module whose basename does not start with `test_`.
pub const TEST_MODULE_NAME: &str = "W9301";
/// Method name breaks the convention.
pub const INVALID_METHOD_NAME: &str = "C9302";
/// Test method name breaks the convention.
pub const INVALID_TEST_METHOD_NAME: &str = "C9303";

const MESSAGES: &[MessageDef] = &[
    MessageDef {
        code: TEST_MODULE_NAME,
        symbol: "testmodule-not-beginning-with-test",
        summary: "Test modules should begin with test_",
        detail: "Used when a test module containing a TestCase does not begin with test_.",
        default_enabled: true,
    },
    MessageDef {
        code: INVALID_METHOD_NAME,
        symbol: "invalid-method-name",
        summary: "Method name is invalid",
        detail: "Used when a method has invalid name.",
        default_enabled: true,
    },
    MessageDef {
        code: INVALID_TEST_METHOD_NAME,
        symbol: "invalid-test-method-name",
        summary: "Test method name is invalid",
        detail: "Used when a test method has invalid name.",
        default_enabled: true,
    },
];

/// Validates method names and test module names.
#[derive(Debug, Clone)]
pub struct Names {
    test_case: Regex,
}

impl Default for Names {
    fn default() -> Self {
        Self::new()
    }
}

impl Names {
    /// Creates the checker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            test_case: literal_regex(r"class\s+[a-zA-Z0-9]+\s*\(.*TestCase\)"),
        }
    }

    fn check_module(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) {
        if !ctx.file.is_test || !self.test_case.is_match(&ctx.module.source) {
            return;
        }
        if !ctx.module.basename().starts_with("test_") {
            ctx.emit(TEST_MODULE_NAME, 1, &[], Some(node));
        }
    }
}

impl Checker for Names {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Checks method names and test module names"
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Module, NodeKindTag::Function]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
        if node.as_function().is_none() {
            self.check_module(ctx, node);
            return Ok(());
        }
        if !node.is_method() {
            return Ok(());
        }
        let Some(name) = node.name() else {
            return Ok(());
        };

        if ctx.file.is_test && name.starts_with("test") {
            if !name.starts_with("test_") {
                ctx.emit(INVALID_TEST_METHOD_NAME, node.line(), &[], Some(node));
            }
            return Ok(());
        }

        let methods = node.scope().methods();
        let siblings = || {
            methods
                .iter()
                .filter(|sibling| sibling.id != node.id)
                .filter_map(NodeRef::name)
        };
        if !is_valid_method_name(name, siblings) {
            ctx.emit(INVALID_METHOD_NAME, node.line(), &[], Some(node));
        }
        Ok(())
    }
}

/// Applies the general method-name rules.
///
/// `siblings` yields the names of the other methods of the class and is
/// only consulted for names with an inner underscore.
pub fn is_valid_method_name<'s, F, I>(name: &str, siblings: F) -> bool
where
    F: FnOnce() -> I,
    I: Iterator<Item = &'s str>,
{
    if name.starts_with(|c: char| c.is_uppercase()) {
        return false;
    }
    if name.starts_with("___") || name.ends_with("___") {
        return false;
    }

    let mut core = name;
    if let Some(rest) = core.strip_prefix("__") {
        if rest.ends_with("__") {
            return true;
        }
        if rest.ends_with('_') {
            return false;
        }
        core = rest.strip_suffix("__").unwrap_or(rest);
    }
    if let Some(rest) = core.strip_prefix('_') {
        core = rest;
    }
    if core.ends_with('_') {
        return false;
    }
    if core.contains('_') {
        // Dispatch family: some sibling shares a real prefix.
        return siblings().any(|sibling| !common_prefix(name, sibling).trim_end_matches('_').is_empty());
    }
    true
}

fn common_prefix<'a>(left: &'a str, right: &str) -> &'a str {
    let len = left
        .char_indices()
        .zip(right.chars())
        .take_while(|((_, a), b)| a == b)
        .last()
        .map_or(0, |((idx, c), _)| idx + c.len_utf8());
    &left[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_source, codes};

    fn valid(name: &str, siblings: &[&str]) -> bool {
        is_valid_method_name(name, || siblings.iter().copied())
    }

    #[test]
    fn test_general_rules() {
        assert!(valid("doSomething", &[]));
        assert!(valid("_private", &[]));
        assert!(valid("__init__", &[]));
        assert!(valid("__privateThing", &[]));
        assert!(!valid("DoSomething", &[]));
        assert!(!valid("___tooMany", &[]));
        assert!(!valid("tooMany___", &[]));
        assert!(!valid("__asymmetric_", &[]));
        assert!(!valid("trailing_", &[]));
        assert!(!valid("_trailing_", &[]));
        assert!(!valid("do_something", &[]));
    }

    #[test]
    fn test_dispatch_prefix_is_contextual() {
        assert!(valid("ftp_USER", &["ftp_PASS"]));
        assert!(!valid("ftp_USER", &[]));
        assert!(!valid("ftp_USER", &["_other"]));
        assert!(valid("render_GET", &["render_POST", "other"]));
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix("ftp_USER", "ftp_PASS"), "ftp_");
        assert_eq!(common_prefix("abc", "xyz"), "");
        assert_eq!(common_prefix("ab", "abc"), "ab");
    }

    #[test]
    fn test_methods_only() {
        let source = "def Free_function():\n    pass\n\nclass A:\n    def Bad(self):\n        pass\n\n    def good(self):\n        def Inner_():\n            pass\n";
        let violations = check_source(Names::new(), "pkg.mod", source);
        assert_eq!(codes(&violations), vec![(INVALID_METHOD_NAME, 5)]);
    }

    #[test]
    fn test_methods_in_compound_blocks() {
        let source = "class A:\n    if True:\n        def Bad_name_(self):\n            pass\n\n    try:\n        def ftp_USER(self):\n            pass\n    except ImportError:\n        pass\n\n    def ftp_PASS(self):\n        pass\n";
        let violations = check_source(Names::new(), "pkg.mod", source);
        assert_eq!(codes(&violations), vec![(INVALID_METHOD_NAME, 3)]);
    }

    #[test]
    fn test_test_method_names() {
        let source = "from twisted.trial.unittest import TestCase\n\nclass FooTests(TestCase):\n    def testOld(self):\n        pass\n\n    def test_render_POSTSomething(self):\n        pass\n\n    def Helper(self):\n        pass\n";
        let violations = check_source(Names::new(), "pkg.test.test_foo", source);
        assert_eq!(
            codes(&violations),
            vec![(INVALID_TEST_METHOD_NAME, 4), (INVALID_METHOD_NAME, 10)]
        );
    }

    #[test]
    fn test_test_module_name() {
        let source = "class FooTests(unittest.TestCase):\n    pass\n";
        let violations = check_source(Names::new(), "pkg.test.testfoo", source);
        assert_eq!(codes(&violations), vec![(TEST_MODULE_NAME, 1)]);

        let violations = check_source(Names::new(), "pkg.test.test_foo", source);
        assert!(violations.is_empty());

        let plain = "class Helper(object):\n    pass\n";
        assert!(check_source(Names::new(), "pkg.test.testfoo", plain).is_empty());
    }
}
