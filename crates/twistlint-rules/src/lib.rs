//! # twistlint-rules
//!
//! Built-in checkers for the Twisted coding standard.
//!
//! ## Available Checkers
//!
//! | Checker | Codes | Description |
//! |---------|-------|-------------|
//! | `header` | W9001-W9002 | Copyright header and test module reference |
//! | `spacing` | W9010-W9027 | Blank lines between definitions, line hygiene |
//! | `docstring` | W9201-W9209 | Docstring presence, layout and epytext markup |
//! | `names` | W9301-C9303 | Method names and test module names |
//! | `comments` | W9401-W9402 | Comment formatting |
//! | `formatting` | W9501 | Tuple operands for `%` formatting |
//! | `python3` | W9601-W9604 | Constructs removed in Python 3 |
//! | `testclassname` | W9701 | Test classes named `FooTests` |
//!
//! ## Usage
//!
//! ```ignore
//! use twistlint_core::Analyzer;
//! use twistlint_rules::{DocstringChecker, Names};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./twisted")
//!     .checker(DocstringChecker::new())
//!     .checker(Names::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod comments;
pub mod docstring;
pub mod formatting;
pub mod header;
pub mod names;
mod presets;
pub mod python3;
pub mod spacing;
pub mod test_class_name;

use regex::Regex;

pub use comments::Comments;
pub use docstring::DocstringChecker;
pub use formatting::FormattingOperation;
pub use header::Header;
pub use names::{is_valid_method_name, Names};
pub use presets::{all_checkers, checkers_by_name, checkers_from_config, preset_of, Preset};
pub use python3::Python3;
pub use spacing::Spacing;
pub use test_class_name::TestClassName;

/// Re-export core types for convenience.
pub use twistlint_core::{Checker, Severity, Violation};

/// Compiles a pattern written in this crate.
#[allow(clippy::expect_used)]
pub(crate) fn literal_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex")
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    use twistlint_core::model::parse_module;
    use twistlint_core::{
        CheckError, Checker, FileContext, Linter, ModuleResolver, StaticModuleResolver, Violation,
    };

    /// Runs one checker over a snippet with no sibling modules.
    pub fn check_source(
        checker: impl Checker + 'static,
        module_name: &str,
        source: &str,
    ) -> Vec<Violation> {
        let (violations, error) =
            check_with_resolver(checker, module_name, source, &StaticModuleResolver::new());
        assert!(error.is_none(), "unexpected checker error: {error:?}");
        violations
    }

    /// Like [`check_source`], with default-off messages switched on.
    pub fn check_source_all_messages(
        checker: impl Checker + 'static,
        module_name: &str,
        source: &str,
    ) -> Vec<Violation> {
        let linter = Linter::with_all_messages(vec![Box::new(checker)]).unwrap();
        let (violations, error) = run(&linter, module_name, source, &StaticModuleResolver::new());
        assert!(error.is_none(), "unexpected checker error: {error:?}");
        violations
    }

    /// Runs one checker over a snippet, resolving imports through `resolver`.
    pub fn check_with_resolver(
        checker: impl Checker + 'static,
        module_name: &str,
        source: &str,
        resolver: &dyn ModuleResolver,
    ) -> (Vec<Violation>, Option<CheckError>) {
        let linter = Linter::new(vec![Box::new(checker)]).unwrap();
        run(&linter, module_name, source, resolver)
    }

    fn run(
        linter: &Linter,
        module_name: &str,
        source: &str,
        resolver: &dyn ModuleResolver,
    ) -> (Vec<Violation>, Option<CheckError>) {
        let path = PathBuf::from(format!("{}.py", module_name.replace('.', "/")));
        let module = parse_module(module_name, path.clone(), source.to_string()).unwrap();
        let file = FileContext::with_module_name(
            &path,
            source,
            Path::new(""),
            module_name.to_string(),
            PathBuf::new(),
        );
        let report = linter.check_module(&file, &module, resolver);
        (report.violations, report.error)
    }

    /// `(code, line)` pairs of violations.
    pub fn codes(violations: &[Violation]) -> Vec<(&'static str, usize)> {
        let checkers = crate::all_checkers();
        violations
            .iter()
            .map(|v| {
                let code = checkers
                    .iter()
                    .flat_map(|c| c.messages())
                    .map(|def| def.code)
                    .find(|code| *code == v.code)
                    .unwrap_or_else(|| panic!("unknown code {}", v.code));
                (code, v.location.line)
            })
            .collect()
    }
}
