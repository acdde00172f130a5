//! Checker for test class names.
//!
//! In a test module, a class that derives from `TestCase` (directly or
//! through classes of the same module) and defines at least one `test*`
//! method is named `FooTests`.

use std::collections::HashSet;

use twistlint_core::model::ClassDef;
use twistlint_core::{CheckContext, CheckError, Checker, MessageDef, Module, NodeKindTag, NodeRef};

/// Checker name for test class names.
pub const NAME: &str = "testclassname";

/// Test class name does not end with `Tests`.
pub const NOT_ENDING_WITH_TESTS: &str = "W9701";

const MESSAGES: &[MessageDef] = &[MessageDef {
    code: NOT_ENDING_WITH_TESTS,
    symbol: "test-class-name-not-ending-with-tests",
    summary: "Test class names should end with Tests",
    detail: "Used for checking test class names.",
    default_enabled: true,
}];

/// Checks the names of test case classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestClassName;

impl TestClassName {
    /// Creates the checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Checker for TestClassName {
    fn name(&self) -> &'static str {
        NAME
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Module]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
        if !ctx.file.is_test {
            return Ok(());
        }
        for child in node.children() {
            let Some(class) = child.as_class() else {
                continue;
            };
            if class.name.ends_with("Tests") {
                continue;
            }
            if has_test_methods(child) && derives_from_test_case(ctx.module, class, &mut HashSet::new())
            {
                ctx.emit(NOT_ENDING_WITH_TESTS, child.line(), &[], Some(child));
            }
        }
        Ok(())
    }
}

fn has_test_methods(class: NodeRef<'_>) -> bool {
    class
        .children()
        .filter_map(|c| c.as_function())
        .any(|method| method.name.starts_with("test"))
}

fn derives_from_test_case<'m>(
    module: &'m Module,
    class: &'m ClassDef,
    seen: &mut HashSet<&'m str>,
) -> bool {
    if !seen.insert(class.name.as_str()) {
        return false;
    }
    class.bases.iter().any(|base| {
        let name = base.dotted_name().unwrap_or_else(|| base.text.clone());
        let last = name.rsplit('.').next().unwrap_or(&name);
        if last == "TestCase" {
            return true;
        }
        module
            .top_level_class(&name)
            .and_then(|parent| parent.as_class())
            .is_some_and(|parent| derives_from_test_case(module, parent, seen))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_source, codes};

    const SOURCE: &str = "\
from twisted.trial import unittest


class Base(unittest.TestCase):
    pass


class FooTest(unittest.TestCase):
    def test_a(self):
        pass


class BarTests(unittest.TestCase):
    def test_a(self):
        pass


class Indirect(Base):
    def testB(self):
        pass


class Helper(unittest.TestCase):
    def setUp(self):
        pass


class Plain(object):
    def test_c(self):
        pass
";

    #[test]
    fn test_badly_named_test_classes() {
        let violations = check_source(TestClassName::new(), "pkg.test.test_foo", SOURCE);
        assert_eq!(
            codes(&violations),
            vec![(NOT_ENDING_WITH_TESTS, 8), (NOT_ENDING_WITH_TESTS, 18)]
        );
    }

    #[test]
    fn test_non_test_module_is_skipped() {
        assert!(check_source(TestClassName::new(), "pkg.foo", SOURCE).is_empty());
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let source = "class A(B):\n    def test_x(self):\n        pass\n\nclass B(A):\n    pass\n";
        assert!(check_source(TestClassName::new(), "pkg.test.test_cycle", source).is_empty());
    }
}
