//! Checker for docstring presence, layout and epytext markup.
//!
//! # Rationale
//!
//! Every module, class, function and method carries a docstring whose
//! delimiters sit on their own lines, whose body is indented one level
//! deeper than the definition, and which documents parameters and return
//! values with epytext fields separated from the prose by a blank line.
//!
//! # Exemptions
//!
//! - Definitions nested in a function body at any depth need no docstring.
//! - Property setters are documented by their getter.
//! - A method of a class decorated with `@implementer(IFoo)` needs no
//!   docstring when `IFoo` defines a method of the same name. Interfaces
//!   are resolved in the current module or, through its imports, in other
//!   modules.
//! - Names matching `no_docstring_rgx` are skipped entirely.
//!
//! # Configuration
//!
//! - `strict_epydoc`: require `@type`/`@rtype` fields (default: true)
//! - `options_prefix`: method prefix whose docs are user facing (default: `opt_`)
//! - `test_prefix`: method prefix exempt from return markup (default: `test`)
//! - `no_docstring_rgx`: names skipped by every check (default: `^__.*__$`)

use std::collections::HashSet;

use regex::Regex;
use tracing::warn;
use twistlint_core::model::{
    BindingKind, Decorator, Docstring, FunctionDef, NodeKind, ParamKind,
};
use twistlint_core::{
    absolute_import_source, lookup_class, CheckContext, CheckError, Checker, ConfigError,
    MessageDef, NodeKindTag, NodeRef, ResolveError, RuleConfig,
};

use crate::literal_regex;

/// Checker name for docstring.
pub const NAME: &str = "docstring";

/// Opening or closing delimiter shares a line with text.
pub const DELIMITERS_NOT_ISOLATED: &str = "W9201";
/// Parameter without `@param`.
pub const MISSING_PARAM: &str = "W9202";
/// Parameter without `@type`.
pub const MISSING_TYPE: &str = "W9203";
/// Returned value without `@return`.
pub const MISSING_RETURN: &str = "W9204";
/// Returned value without `@rtype`.
pub const MISSING_RTYPE: &str = "W9205";
/// Docstring line at the wrong indentation.
pub const INCONSISTENT_INDENTATION: &str = "W9206";
/// Epytext fields not separated from prose by a blank line.
pub const MISSING_BLANK_LINE: &str = "W9207";
/// No docstring.
pub const MISSING_DOCSTRING: &str = "W9208";
/// Whitespace-only docstring.
pub const EMPTY_DOCSTRING: &str = "W9209";

const MESSAGES: &[MessageDef] = &[
    MessageDef {
        code: DELIMITERS_NOT_ISOLATED,
        symbol: "docstring-delimiters-not-isolated",
        summary: "The opening/closing of docstring should be on a line by themselves",
        detail: "Check the opening/closing of a docstring.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_PARAM,
        symbol: "missing-param-markup",
        summary: "Missing epytext markup @param for argument \"{}\"",
        detail: "Check the epytext markup @param.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_TYPE,
        symbol: "missing-type-markup",
        summary: "Missing epytext markup @type for argument \"{}\"",
        detail: "Check the epytext markup @type.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_RETURN,
        symbol: "missing-return-markup",
        summary: "Missing epytext markup @return for return value",
        detail: "Check the epytext markup @return.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_RTYPE,
        symbol: "missing-rtype-markup",
        summary: "Missing epytext markup @rtype for return value",
        detail: "Check the epytext markup @rtype.",
        default_enabled: true,
    },
    MessageDef {
        code: INCONSISTENT_INDENTATION,
        symbol: "inconsistent-docstring-indentation",
        summary: "Docstring should have consistent indentations",
        detail: "Check indentations of docstring.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_BLANK_LINE,
        symbol: "missing-blank-line-before-markup",
        summary: "Missing a blank line before epytext markups",
        detail: "Check the blank line before epytext markups.",
        default_enabled: true,
    },
    MessageDef {
        code: MISSING_DOCSTRING,
        symbol: "missing-docstring",
        summary: "Missing docstring",
        detail: "Used when a module, function, class or method has no docstring.",
        default_enabled: true,
    },
    MessageDef {
        code: EMPTY_DOCSTRING,
        symbol: "empty-docstring",
        summary: "Empty docstring",
        detail: "Used when a module, function, class or method has an empty docstring.",
        default_enabled: true,
    },
];

/// Validates docstrings of modules, classes and functions.
#[derive(Debug, Clone)]
pub struct DocstringChecker {
    /// Require `@type` and `@rtype` fields.
    pub strict_epydoc: bool,
    /// Prefix of option handlers whose docs are user facing.
    pub options_prefix: String,
    /// Prefix of test methods.
    pub test_prefix: String,
    no_docstring: Regex,
    field: Regex,
    returns: Regex,
    rtype: Regex,
    first_markup: Regex,
    blank_before: Regex,
}

impl Default for DocstringChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl DocstringChecker {
    /// Creates a checker with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strict_epydoc: true,
            options_prefix: "opt_".to_string(),
            test_prefix: "test".to_string(),
            no_docstring: literal_regex("^__.*__$"),
            field: literal_regex(r"@(param|type)\s+([A-Za-z0-9_]+)\s*:"),
            returns: literal_regex(r"@returns?\s*:"),
            rtype: literal_regex(r"@rtype\s*:"),
            first_markup: literal_regex(
                r"\n *@(param|type|return|returns|rtype|ivar|cvar|raise|raises)\s*[a-zA-Z0-9_]*\s*:",
            ),
            blank_before: literal_regex(r"\n\s*\n\s*$"),
        }
    }

    /// Creates a checker from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if `no_docstring_rgx` is not a valid regex.
    pub fn from_config(config: &RuleConfig) -> Result<Self, ConfigError> {
        let mut checker = Self::new()
            .strict_epydoc(config.get_bool("strict_epydoc", true))
            .options_prefix(config.get_str("options_prefix", "opt_"))
            .test_prefix(config.get_str("test_prefix", "test"));
        if let Some(pattern) = config.get_option::<String>("no_docstring_rgx") {
            checker.no_docstring =
                Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
                    key: "no_docstring_rgx".to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(checker)
    }

    /// Sets whether `@type`/`@rtype` are required.
    #[must_use]
    pub fn strict_epydoc(mut self, strict: bool) -> Self {
        self.strict_epydoc = strict;
        self
    }

    /// Sets the option handler prefix.
    #[must_use]
    pub fn options_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options_prefix = prefix.into();
        self
    }

    /// Sets the test method prefix.
    #[must_use]
    pub fn test_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.test_prefix = prefix.into();
        self
    }

    fn check_missing(
        &self,
        ctx: &mut CheckContext<'_>,
        node: NodeRef<'_>,
    ) -> Result<(), CheckError> {
        if node.is_nested_in_function() {
            return Ok(());
        }
        if node
            .as_function()
            .is_some_and(|f| f.has_decorator_suffix(".setter"))
        {
            return Ok(());
        }
        if documented_by_interface(ctx, node)? {
            return Ok(());
        }
        let line = if node.as_function().is_some() || node.as_class().is_some() {
            node.line()
        } else {
            1
        };
        ctx.emit(MISSING_DOCSTRING, line, &[], Some(node));
        Ok(())
    }

    fn check_delimiters(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>, doc: &Docstring) {
        let trimmed = doc.value.trim_matches(' ');
        if !trimmed.starts_with('\n') || !trimmed.ends_with('\n') {
            ctx.emit(DELIMITERS_NOT_ISOLATED, doc.line, &[], Some(node));
            return;
        }

        let expected = match node.kind() {
            NodeKind::Module { .. } => 0,
            _ => node.column() + 4,
        };
        let body = doc.value.trim_start_matches('\n');
        let skipped = doc.value.len() - body.len();
        let lines: Vec<&str> = body.split('\n').collect();
        let last = lines.len() - 1;
        for (idx, text) in lines.iter().enumerate() {
            if idx < last && text.trim().is_empty() {
                continue;
            }
            let indent = text.len() - text.trim_start_matches(' ').len();
            if indent != expected {
                ctx.emit(
                    INCONSISTENT_INDENTATION,
                    doc.line + skipped + idx,
                    &[],
                    Some(node),
                );
            }
        }
    }

    fn check_markup(
        &self,
        ctx: &mut CheckContext<'_>,
        node: NodeRef<'_>,
        function: &FunctionDef,
        doc: &Docstring,
    ) {
        if function.name.starts_with(&self.options_prefix) {
            return;
        }

        let mut documented: HashSet<(&str, &str)> = HashSet::new();
        for caps in self.field.captures_iter(&doc.value) {
            if let (Some(tag), Some(name)) = (caps.get(1), caps.get(2)) {
                documented.insert((tag.as_str(), name.as_str()));
            }
        }

        let is_setter = function.has_decorator_suffix(".setter");
        let skip_first = node.is_method() && !function.has_decorator("staticmethod");
        let params = function.params.iter().skip(usize::from(skip_first));
        for param in params {
            if is_setter && param.kind == ParamKind::Regular && param.name == "value" {
                continue;
            }
            let name = param.name.as_str();
            if !documented.contains(&("param", name)) {
                ctx.emit(MISSING_PARAM, doc.line, &[name], Some(node));
            }
            if self.strict_epydoc && !documented.contains(&("type", name)) {
                ctx.emit(MISSING_TYPE, doc.line, &[name], Some(node));
            }
        }

        if !returns_value(node)
            || function.name.starts_with(&self.test_prefix)
            || function.has_decorator("property")
        {
            return;
        }
        if !self.returns.is_match(&doc.value) {
            ctx.emit(MISSING_RETURN, doc.line, &[], Some(node));
        }
        if self.strict_epydoc && !self.rtype.is_match(&doc.value) {
            ctx.emit(MISSING_RTYPE, doc.line, &[], Some(node));
        }
    }

    fn check_blank_line_before_markup(
        &self,
        ctx: &mut CheckContext<'_>,
        node: NodeRef<'_>,
        doc: &Docstring,
    ) {
        let Some(markup) = self.first_markup.find(&doc.value) else {
            return;
        };
        let prose = &doc.value[..=markup.start()];
        if !self.blank_before.is_match(prose) {
            ctx.emit(MISSING_BLANK_LINE, doc.line, &[], Some(node));
        }
    }
}

impl Checker for DocstringChecker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Checks docstring presence, layout and epytext markup"
    }

    fn messages(&self) -> &'static [MessageDef] {
        MESSAGES
    }

    fn hooks(&self) -> &'static [NodeKindTag] {
        &[NodeKindTag::Module, NodeKindTag::Class, NodeKindTag::Function]
    }

    fn enter_node(&self, ctx: &mut CheckContext<'_>, node: NodeRef<'_>) -> Result<(), CheckError> {
        if node.name().is_some_and(|name| self.no_docstring.is_match(name)) {
            return Ok(());
        }

        let Some(doc) = node.doc() else {
            return self.check_missing(ctx, node);
        };
        if doc.value.trim().is_empty() {
            ctx.emit(EMPTY_DOCSTRING, node.line(), &[], Some(node));
            return Ok(());
        }

        self.check_delimiters(ctx, node, doc);
        if let Some(function) = node.as_function() {
            self.check_markup(ctx, node, function, doc);
        }
        self.check_blank_line_before_markup(ctx, node, doc);
        Ok(())
    }
}

/// Whether a direct body statement returns a value.
fn returns_value(node: NodeRef<'_>) -> bool {
    node.children()
        .any(|child| matches!(child.kind(), NodeKind::Return { value: Some(_) }))
}

fn is_implementer(decorator: &Decorator) -> bool {
    decorator.is_call
        && (decorator.name == "implementer" || decorator.name.ends_with(".implementer"))
}

/// Whether an interface named by the class's `@implementer` defines the method.
fn documented_by_interface(ctx: &CheckContext<'_>, node: NodeRef<'_>) -> Result<bool, CheckError> {
    if !node.is_method() {
        return Ok(false);
    }
    let (Some(method), Some(class)) = (node.name(), node.enclosing_class()) else {
        return Ok(false);
    };
    let Some(class_def) = class.as_class() else {
        return Ok(false);
    };

    for decorator in class_def.decorators.iter().filter(|d| is_implementer(d)) {
        for arg in &decorator.args {
            let name = arg.dotted_name().unwrap_or_else(|| arg.text.clone());
            match interface_defines(ctx, &name, method) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(CheckError::Resolve(ResolveError::Cycle { module, name })) => {
                    warn!(%module, %name, "Import cycle while resolving interface");
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(false)
}

fn interface_defines(ctx: &CheckContext<'_>, interface: &str, method: &str) -> Result<bool, CheckError> {
    let module = ctx.module;
    let segments: Vec<&str> = interface.split('.').collect();
    let head = segments[0];
    let binding = module
        .top_level_binding(head)
        .ok_or_else(|| CheckError::Lookup(format!("{head} in {}", module.name)))?;

    let target = module.node(binding.node);
    let absolute: Vec<String> = match (binding.kind, target.kind()) {
        (BindingKind::Class, _) if segments.len() == 1 => {
            return Ok(target
                .children()
                .any(|child| child.as_function().is_some_and(|f| f.name == method)));
        }
        (BindingKind::Import, NodeKind::Import(import)) => {
            let Some((_, imported)) = import.bound_names().find(|(bound, _)| *bound == head) else {
                return Err(CheckError::Lookup(format!("{head} in {}", module.name)));
            };
            let mut path: Vec<String> = Vec::new();
            if import.is_from {
                let source = absolute_import_source(module, import).ok_or_else(|| {
                    CheckError::Lookup(format!("source module of {head} in {}", module.name))
                })?;
                path.push(source);
                path.push(imported.name.clone());
            } else if imported.alias.is_some() {
                path.push(imported.name.clone());
            } else {
                path.push(head.to_string());
            }
            path.extend(segments[1..].iter().map(|s| (*s).to_string()));
            path
        }
        _ => {
            return Err(CheckError::Structural(format!(
                "{interface} is neither a class nor an import in {}",
                module.name
            )))
        }
    };

    let dotted = absolute.join(".");
    let Some((module_name, class_name)) = dotted.rsplit_once('.') else {
        return Err(CheckError::Structural(format!(
            "{interface} does not name a class in a module"
        )));
    };
    match lookup_class(ctx.resolver, module_name, class_name) {
        Ok(Some(class)) => Ok(class.defines_method(method)),
        Ok(None) => Err(CheckError::Structural(format!(
            "interface {class_name} is not a class in {module_name}"
        ))),
        Err(ResolveError::NotFound { module }) => {
            Err(CheckError::Lookup(format!("module {module} for {interface}")))
        }
        Err(e) => Err(CheckError::Resolve(e)),
    }
}
