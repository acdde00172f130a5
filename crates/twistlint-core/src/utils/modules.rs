//! Predicates on dotted module names.
//!
//! [`is_test_module`] is the only definition of "test module" used
//! anywhere; every checker goes through it.

fn basename(module_name: &str) -> &str {
    module_name.rsplit('.').next().unwrap_or(module_name)
}

/// Whether one of the enclosing packages is named `test` or `tests`.
fn in_test_package(module_name: &str) -> bool {
    module_name
        .rsplit_once('.')
        .is_some_and(|(package, _)| package.split('.').any(|s| s == "test" || s == "tests"))
}

/// Whether a module is a test module.
///
/// The module must live in a `test` or `tests` package and its basename
/// must start with `test`.
///
/// ```
/// use twistlint_core::utils::is_test_module;
///
/// assert!(is_test_module("twisted.web.test.test_http"));
/// assert!(!is_test_module("twisted.web.http"));
/// assert!(!is_test_module("twisted.web.test.helpers"));
/// ```
#[must_use]
pub fn is_test_module(module_name: &str) -> bool {
    in_test_package(module_name) && basename(module_name).starts_with("test")
}

/// Whether a module must carry a `test-case-name` reference.
///
/// Everything in a test package (test modules included), private modules
/// and `test_` modules are exempt.
#[must_use]
pub fn requires_test_reference(module_name: &str) -> bool {
    let base = basename(module_name);
    !in_test_package(module_name)
        && !base.starts_with("test_")
        && !base.starts_with('_')
}
