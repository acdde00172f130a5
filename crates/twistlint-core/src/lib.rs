//! # twistlint-core
//!
//! Core framework for checking Python sources against the Twisted coding
//! standard, built on a `tree-sitter` parse tree.
//!
//! This crate provides the foundational traits and types for building
//! checkers. It includes:
//!
//! - [`model`] for the owned, read-only view of a parsed module
//! - [`scanner`] for the physical and logical line view of a file
//! - [`Checker`] trait for node-driven checkers and the [`Linter`] that runs them
//! - [`Catalog`] and [`MessageDef`] for the message registry
//! - [`Analyzer`] for orchestrating a run over a directory tree
//! - [`Violation`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use twistlint_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./twisted")
//!     .checker(MyChecker::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! println!("{} violations", result.violations.len());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod catalog;
mod checker;
mod config;
mod context;
mod resolver;
mod sink;
mod types;

/// Owned view of a parsed Python module.
pub mod model;

/// Physical and logical line scanning.
pub mod scanner;

/// Utility modules for checker implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use catalog::{Catalog, CatalogEntry, CatalogError, MessageDef, FATAL_CHECK_ERROR};
pub use checker::{build_catalog, CheckContext, CheckError, Checker, CheckerBox, FileReport, Linter};
pub use config::{AnalyzerConfig, Config, ConfigError, MessagesConfig, RuleConfig};
pub use context::FileContext;
pub use model::{Module, NodeId, NodeKind, NodeKindTag, NodeRef};
pub use resolver::{
    absolute_import_source, lookup_class, FsModuleResolver, ModuleResolver, ResolveError,
    ResolvedClass, StaticModuleResolver,
};
pub use sink::{MessagePolicy, MessageSink};
pub use types::{LintResult, Location, Severity, Violation, ViolationDiagnostic};
pub use utils::allowance::AllowCheck;
