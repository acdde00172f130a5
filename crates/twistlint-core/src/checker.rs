//! Checker trait and the per-file dispatch engine.

use tracing::debug;

use crate::catalog::{Catalog, CatalogError, MessageDef};
use crate::context::FileContext;
use crate::model::{Module, NodeKindTag, NodeRef};
use crate::resolver::{ModuleResolver, ResolveError};
use crate::scanner::{scan, LineScan};
use crate::sink::{MessagePolicy, MessageSink};
use crate::types::Violation;
use crate::utils::Suppressions;

/// Fatal errors raised by checker handlers.
///
/// Any of these aborts checking of the current file only.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// A name could not be found where it was expected.
    #[error("lookup failed: {0}")]
    Lookup(String),
    /// A construct did not have the shape a checker relies on.
    #[error("unexpected structure: {0}")]
    Structural(String),
    /// Loading another module failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A node-driven checker.
///
/// The engine calls [`Checker::enter_node`] once for every node whose kind
/// is listed in [`Checker::hooks`], in depth-first pre-order. Checkers keep
/// no per-file state on `self`; everything file-scoped lives in the
/// [`CheckContext`].
///
/// # Example
///
/// ```ignore
/// use twistlint_core::{Checker, CheckContext, CheckError, MessageDef, NodeKindTag, NodeRef};
///
/// pub struct NoPrint;
///
/// impl Checker for NoPrint {
///     fn name(&self) -> &'static str { "no-print" }
///     fn messages(&self) -> &'static [MessageDef] { MSGS }
///     fn hooks(&self) -> &'static [NodeKindTag] { &[NodeKindTag::Print] }
///
///     fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
///         ctx.emit("W9601", node.line(), &[], Some(node));
///         Ok(())
///     }
/// }
/// ```
pub trait Checker: Send + Sync {
    /// Returns the checker name used in configuration (e.g., "docstring").
    fn name(&self) -> &'static str;

    /// Returns a brief description of what this checker verifies.
    fn description(&self) -> &'static str {
        ""
    }

    /// Messages this checker may emit.
    fn messages(&self) -> &'static [MessageDef];

    /// Node kinds this checker wants to see.
    fn hooks(&self) -> &'static [NodeKindTag];

    /// Handles one node.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] for conditions that make the rest of the
    /// file uncheckable.
    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError>;
}

/// Type alias for boxed Checker trait objects.
pub type CheckerBox = Box<dyn Checker>;

/// State scoped to one file, passed to every handler call.
pub struct CheckContext<'a> {
    /// File metadata.
    pub file: &'a FileContext<'a>,
    /// Parsed module.
    pub module: &'a Module,
    /// Resolver for sibling modules.
    pub resolver: &'a dyn ModuleResolver,
    /// Line-level view of the source.
    pub lines: LineScan,
    sink: MessageSink<'a>,
}

impl<'a> CheckContext<'a> {
    /// Emits a message at a line, taking the column from the node.
    pub fn emit(&mut self, code: &str, line: usize, args: &[&str], node: Option<NodeRef<'_>>) {
        self.sink.emit(code, line, args, node);
    }

    /// Emits a message at an explicit 1-based column.
    pub fn emit_at(&mut self, code: &str, line: usize, column: usize, args: &[&str]) {
        self.sink.emit_at(code, line, column, args);
    }

    /// Whether a message was already emitted for this file.
    #[must_use]
    pub fn already_emitted(&self, code: &str) -> bool {
        self.sink.already_emitted(code)
    }
}

/// Outcome of checking one file.
#[derive(Debug)]
pub struct FileReport {
    /// Violations emitted before completion or failure.
    pub violations: Vec<Violation>,
    /// The error that aborted the file, if any.
    pub error: Option<CheckError>,
}

/// Runs a set of checkers over modules.
///
/// The kind-to-checker dispatch table is built once at construction.
pub struct Linter {
    checkers: Vec<CheckerBox>,
    catalog: Catalog,
    policy: MessagePolicy,
    dispatch: [Vec<usize>; NodeKindTag::COUNT],
}

impl Linter {
    /// Registers checkers with every message in its default state.
    ///
    /// # Errors
    ///
    /// Returns an error if two checkers declare the same code or symbol.
    pub fn new(checkers: Vec<CheckerBox>) -> Result<Self, CatalogError> {
        let catalog = build_catalog(&checkers)?;
        let policy = MessagePolicy::defaults(&catalog);
        Ok(Self::from_parts(checkers, catalog, policy))
    }

    /// Registers checkers with default-off messages switched on as well.
    ///
    /// # Errors
    ///
    /// Returns an error if two checkers declare the same code or symbol.
    pub fn with_all_messages(checkers: Vec<CheckerBox>) -> Result<Self, CatalogError> {
        let catalog = build_catalog(&checkers)?;
        let policy = MessagePolicy::all_enabled(&catalog);
        Ok(Self::from_parts(checkers, catalog, policy))
    }

    /// Registers checkers with an explicit catalog and policy.
    #[must_use]
    pub fn from_parts(checkers: Vec<CheckerBox>, catalog: Catalog, policy: MessagePolicy) -> Self {
        let mut dispatch: [Vec<usize>; NodeKindTag::COUNT] = Default::default();
        for (idx, checker) in checkers.iter().enumerate() {
            for tag in checker.hooks() {
                dispatch[tag.index()].push(idx);
            }
        }
        Self {
            checkers,
            catalog,
            policy,
            dispatch,
        }
    }

    /// The merged message catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Active message policy.
    #[must_use]
    pub fn policy(&self) -> &MessagePolicy {
        &self.policy
    }

    /// Registered checkers.
    #[must_use]
    pub fn checkers(&self) -> &[CheckerBox] {
        &self.checkers
    }

    /// Checks one module.
    ///
    /// A handler error stops the walk; violations emitted before it are kept.
    #[must_use]
    pub fn check_module(
        &self,
        file: &FileContext<'_>,
        module: &Module,
        resolver: &dyn ModuleResolver,
    ) -> FileReport {
        let lines = scan(&module.source);
        let suppressions = Suppressions::from_scan(&lines);
        let sink = MessageSink::new(&self.catalog, &self.policy, file, suppressions);
        let mut ctx = CheckContext {
            file,
            module,
            resolver,
            lines,
            sink,
        };

        let error = self.walk(&mut ctx, module).err();
        FileReport {
            violations: ctx.sink.into_violations(),
            error,
        }
    }

    fn walk(&self, ctx: &mut CheckContext<'_>, module: &Module) -> Result<(), CheckError> {
        let mut stack = vec![module.root()];
        while let Some(node) = stack.pop() {
            for &idx in &self.dispatch[node.kind().tag().index()] {
                let checker = &self.checkers[idx];
                ctx.sink.set_checker(checker.name());
                if let Err(e) = checker.enter_node(ctx, node) {
                    debug!(checker = checker.name(), line = node.line(), error = %e, "Checker aborted file");
                    return Err(e);
                }
            }
            let children: Vec<NodeRef<'_>> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        Ok(())
    }
}

/// Merges the message declarations of a set of checkers.
///
/// # Errors
///
/// Returns an error if two checkers declare the same code or symbol.
pub fn build_catalog(checkers: &[CheckerBox]) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();
    for checker in checkers {
        catalog.register(checker.name(), checker.messages())?;
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_module, NodeKind};
    use crate::resolver::StaticModuleResolver;
    use std::path::{Path, PathBuf};

    const MSGS: &[MessageDef] = &[
        MessageDef {
            code: "W9990",
            symbol: "saw-node",
            summary: "Saw {}",
            detail: "",
            default_enabled: true,
        },
        MessageDef {
            code: "W9991",
            symbol: "saw-quietly",
            summary: "Saw {} quietly",
            detail: "",
            default_enabled: false,
        },
    ];

    struct Recorder;

    impl Checker for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn messages(&self) -> &'static [MessageDef] {
            MSGS
        }

        fn hooks(&self) -> &'static [NodeKindTag] {
            &[NodeKindTag::Class, NodeKindTag::Function]
        }

        fn enter_node(
            &self,
            ctx: &mut CheckContext<'_>,
            node: NodeRef<'_>,
        ) -> Result<(), CheckError> {
            let name = node.name().unwrap_or_default();
            if name == "boom" {
                return Err(CheckError::Structural("boom".into()));
            }
            ctx.emit("W9990", node.line(), &[name], Some(node));
            Ok(())
        }
    }

    const DUP: &[MessageDef] = &[MessageDef {
        code: "W9990",
        symbol: "other",
        summary: "",
        detail: "",
        default_enabled: true,
    }];

    struct Duplicate;

    impl Checker for Duplicate {
        fn name(&self) -> &'static str {
            "duplicate"
        }

        fn messages(&self) -> &'static [MessageDef] {
            DUP
        }

        fn hooks(&self) -> &'static [NodeKindTag] {
            &[]
        }

        fn enter_node(&self, _: &mut CheckContext<'_>, _: NodeRef<'_>) -> Result<(), CheckError> {
            Ok(())
        }
    }

    fn run(source: &str) -> FileReport {
        let linter = Linter::new(vec![Box::new(Recorder)]).unwrap();
        let module = parse_module("m", PathBuf::from("/p/m.py"), source.to_string()).unwrap();
        let ctx = FileContext::with_module_name(
            Path::new("/p/m.py"),
            source,
            Path::new("/p"),
            "m".into(),
            "/p".into(),
        );
        linter.check_module(&ctx, &module, &StaticModuleResolver::new())
    }

    #[test]
    fn visits_in_preorder() {
        let report = run("class A:\n    def f(self):\n        pass\n\ndef g():\n    pass\n");
        let seen: Vec<&str> = report.violations.iter().map(|v| v.args[0].as_str()).collect();
        assert_eq!(seen, vec!["A", "f", "g"]);
        assert!(report.error.is_none());
    }

    #[test]
    fn error_stops_file_but_keeps_earlier_messages() {
        let report = run("def a():\n    pass\n\ndef boom():\n    pass\n\ndef c():\n    pass\n");
        assert_eq!(report.violations.len(), 1);
        assert!(matches!(report.error, Some(CheckError::Structural(_))));
    }

    #[test]
    fn default_off_messages_need_opt_in() {
        let linter = Linter::new(vec![Box::new(Recorder)]).unwrap();
        assert!(linter.policy().is_enabled("W9990"));
        assert!(!linter.policy().is_enabled("W9991"));

        let linter = Linter::with_all_messages(vec![Box::new(Recorder)]).unwrap();
        assert!(linter.policy().is_enabled("W9991"));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        assert!(Linter::new(vec![Box::new(Recorder), Box::new(Duplicate)]).is_err());
    }

    #[test]
    fn dispatch_only_hits_hooked_kinds() {
        let report = run("import os\nx = os.path.join('a', 'b')\n");
        assert!(report.violations.is_empty());
        let module = parse_module("m", PathBuf::from("m.py"), "f()\n".into()).unwrap();
        assert!(module
            .iter()
            .any(|n| matches!(n.kind(), NodeKind::Call(_))));
    }
}
