//! Utility functions shared by the host and the checkers.

pub mod allowance;
pub mod modules;
pub mod paths;

#[doc(inline)]
pub use allowance::{is_directive_comment, AllowCheck, Suppressions};
#[doc(inline)]
pub use modules::{is_test_module, requires_test_reference};
#[doc(inline)]
pub use paths::{module_name_for, ModulePath};
