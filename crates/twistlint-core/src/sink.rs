//! Message sink and message filtering.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::config::MessagesConfig;
use crate::context::FileContext;
use crate::model::{NodeId, NodeRef};
use crate::types::{Location, Severity, Violation};
use crate::utils::Suppressions;

/// Which messages are active and at what severity.
///
/// Computed once per run from the catalog and the configuration.
#[derive(Debug, Clone, Default)]
pub struct MessagePolicy {
    enabled: HashSet<&'static str>,
    severity: HashMap<&'static str, Severity>,
}

impl MessagePolicy {
    /// Builds the policy.
    ///
    /// Messages start from their default state, `enable` then turns messages
    /// on and `disable` turns them off. Entries are codes or symbols; `all`
    /// matches every message. Checker severity overrides apply to every
    /// message owned by that checker.
    #[must_use]
    pub fn new(
        catalog: &Catalog,
        messages: &MessagesConfig,
        checker_severity: &HashMap<String, Severity>,
    ) -> Self {
        let mut enabled: HashSet<&'static str> = catalog
            .entries()
            .filter(|e| e.def.default_enabled)
            .map(|e| e.def.code)
            .collect();

        let mut apply = |names: &[String], on: bool| {
            for name in names {
                let codes: Vec<&'static str> = if name == "all" {
                    catalog.entries().map(|e| e.def.code).collect()
                } else if let Some(entry) = catalog.get(name) {
                    vec![entry.def.code]
                } else {
                    warn!(message = %name, "Unknown message in configuration");
                    continue;
                };
                for code in codes {
                    if on {
                        enabled.insert(code);
                    } else {
                        enabled.remove(code);
                    }
                }
            }
        };
        apply(&messages.enable, true);
        apply(&messages.disable, false);

        let severity = catalog
            .entries()
            .map(|e| {
                let level = checker_severity
                    .get(e.checker)
                    .copied()
                    .unwrap_or_else(|| e.def.severity());
                (e.def.code, level)
            })
            .collect();

        Self { enabled, severity }
    }

    /// Policy with every message in its default state.
    #[must_use]
    pub fn defaults(catalog: &Catalog) -> Self {
        Self::new(catalog, &MessagesConfig::default(), &HashMap::new())
    }

    /// Policy enabling every message at its default severity.
    #[must_use]
    pub fn all_enabled(catalog: &Catalog) -> Self {
        Self {
            enabled: catalog.entries().map(|e| e.def.code).collect(),
            severity: catalog
                .entries()
                .map(|e| (e.def.code, e.def.severity()))
                .collect(),
        }
    }

    /// Whether a message is reported.
    #[must_use]
    pub fn is_enabled(&self, code: &str) -> bool {
        self.enabled.contains(code)
    }

    /// Effective severity of a message.
    #[must_use]
    pub fn severity(&self, code: &str) -> Severity {
        self.severity
            .get(code)
            .copied()
            .unwrap_or_else(|| Severity::from_code(code))
    }
}

/// Collects the diagnostics of one file.
///
/// `emit` is fire-and-forget: unknown, disabled and suppressed messages are
/// dropped without an error.
#[derive(Debug)]
pub struct MessageSink<'a> {
    catalog: &'a Catalog,
    policy: &'a MessagePolicy,
    file: &'a FileContext<'a>,
    line_count: usize,
    suppressions: Suppressions,
    checker: &'static str,
    attempted: HashSet<&'static str>,
    violations: Vec<Violation>,
}

impl<'a> MessageSink<'a> {
    /// Creates a sink for one file.
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        policy: &'a MessagePolicy,
        file: &'a FileContext<'a>,
        suppressions: Suppressions,
    ) -> Self {
        Self {
            catalog,
            policy,
            file,
            line_count: file.content.lines().count().max(1),
            suppressions,
            checker: "",
            attempted: HashSet::new(),
            violations: Vec::new(),
        }
    }

    /// Sets the checker credited for subsequent messages.
    pub fn set_checker(&mut self, checker: &'static str) {
        self.checker = checker;
    }

    /// Emits a message at a line, taking the column from the node.
    pub fn emit(&mut self, code: &str, line: usize, args: &[&str], node: Option<NodeRef<'_>>) {
        let column = node.map_or(0, |n| n.column() + 1);
        self.record(code, line, column, args, node.map(|n| n.id));
    }

    /// Emits a message at an explicit 1-based column.
    pub fn emit_at(&mut self, code: &str, line: usize, column: usize, args: &[&str]) {
        self.record(code, line, column, args, None);
    }

    fn record(
        &mut self,
        code: &str,
        line: usize,
        column: usize,
        args: &[&str],
        node: Option<NodeId>,
    ) {
        let Some(entry) = self.catalog.get(code) else {
            warn!(code, checker = self.checker, "Emitted message is not in the catalog");
            return;
        };
        let def = entry.def;
        self.attempted.insert(def.code);

        if !self.policy.is_enabled(def.code) {
            return;
        }
        let line = line.clamp(1, self.line_count);
        if self
            .suppressions
            .check(line, def.code, def.symbol)
            .is_allowed()
        {
            debug!(code = def.code, line, "Suppressed by directive");
            return;
        }

        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        let offset = self.file.offset_for(line, column.max(1));
        let length = if column == 0 {
            self.file.line_len(line)
        } else {
            0
        };
        let location = Location::new(self.file.relative_path.clone(), line, column)
            .with_span(offset, length);
        let violation = Violation::new(
            def.code,
            def.symbol,
            self.policy.severity(def.code),
            location,
            def.render(&args),
        )
        .with_checker(entry.checker)
        .with_args(args)
        .with_node(node);
        self.violations.push(violation);
    }

    /// Whether a message was emitted earlier in this file, whatever its filtering.
    #[must_use]
    pub fn already_emitted(&self, code: &str) -> bool {
        self.attempted.contains(code)
    }

    /// Path of the file being checked, relative to the root.
    #[must_use]
    pub fn file(&self) -> PathBuf {
        self.file.relative_path.clone()
    }

    /// Violations collected so far.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the sink, returning its violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MessageDef;
    use crate::scanner::scan;
    use std::path::Path;

    const MSGS: &[MessageDef] = &[
        MessageDef {
            code: "W9208",
            symbol: "missing-docstring",
            summary: "Missing docstring",
            detail: "",
            default_enabled: true,
        },
        MessageDef {
            code: "W9010",
            symbol: "trailing-whitespace",
            summary: "Trailing whitespace",
            detail: "",
            default_enabled: false,
        },
    ];

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.register("test", MSGS).unwrap();
        catalog
    }

    #[test]
    fn policy_applies_defaults_then_enable_then_disable() {
        let catalog = catalog();
        let messages = MessagesConfig {
            enable: vec!["trailing-whitespace".into()],
            disable: vec!["W9208".into()],
        };
        let policy = MessagePolicy::new(&catalog, &messages, &HashMap::new());
        assert!(policy.is_enabled("W9010"));
        assert!(!policy.is_enabled("W9208"));
        assert!(policy.is_enabled("F9001"));
    }

    #[test]
    fn policy_applies_checker_severity() {
        let catalog = catalog();
        let overrides = HashMap::from([("test".to_string(), Severity::Error)]);
        let policy = MessagePolicy::new(&catalog, &MessagesConfig::default(), &overrides);
        assert_eq!(policy.severity("W9208"), Severity::Error);
        assert_eq!(policy.severity("F9001"), Severity::Error);
    }

    #[test]
    fn sink_filters_and_records() {
        let catalog = catalog();
        let policy = MessagePolicy::defaults(&catalog);
        let content = "x = 1\ny = 2  # twistlint: disable=W9208\n";
        let ctx = FileContext::with_module_name(
            Path::new("/p/m.py"),
            content,
            Path::new("/p"),
            "m".into(),
            "/p".into(),
        );
        let mut sink = MessageSink::new(&catalog, &policy, &ctx, Suppressions::from_scan(&scan(content)));
        sink.set_checker("test");
        sink.emit("W9208", 1, &[], None);
        sink.emit("W9208", 2, &[], None);
        sink.emit("W9010", 1, &[], None);
        sink.emit("W0000", 1, &[], None);
        sink.emit("W9208", 0, &[], None);

        assert!(sink.already_emitted("W9010"));
        let lines: Vec<usize> = sink.violations().iter().map(|v| v.location.line).collect();
        assert_eq!(lines, vec![1, 1]);
        assert_eq!(sink.violations()[0].checker, "test");
    }
}
