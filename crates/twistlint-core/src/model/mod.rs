//! Arena-based model of a parsed Python module.
//!
//! The tree-sitter concrete syntax tree is lowered once into a flat
//! `Vec<Node>` indexed by [`NodeId`]. Parents are stored as plain indices,
//! so the model is immutable, cheap to share and free of reference cycles.
//! Only the constructs the checkers inspect get their own [`NodeKind`];
//! everything else is transparent and its interesting descendants are
//! attached to the nearest modelled ancestor.

mod bindings;
mod parse;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use bindings::{Binding, BindingKind};
pub use parse::{parse_module, ParseError};

/// Index of a node in its module's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The module node is always the first node of the arena.
    pub const ROOT: Self = Self(0);
}

/// A parsed Python module.
#[derive(Debug)]
pub struct Module {
    /// Dotted module name (e.g., `twisted.web.test.test_http`).
    pub name: String,
    /// Path of the source file.
    pub path: PathBuf,
    /// Raw source text.
    pub source: String,
    /// Source split into physical lines, without terminators.
    pub lines: Vec<String>,
    /// Whether tree-sitter had to recover from syntax errors.
    pub syntax_errors: bool,
    nodes: Vec<Node>,
}

impl Module {
    /// Returns the root (module) node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// Returns a handle on a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { module: self, id }
    }

    /// Raw access to a node's data.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Iterates all nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(|i| self.node(NodeId(i)))
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Last segment of the dotted module name.
    #[must_use]
    pub fn basename(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The module docstring, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&Docstring> {
        self.root().doc()
    }

    /// Returns a physical line by 1-based number.
    #[must_use]
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Finds a class defined directly in the module body.
    #[must_use]
    pub fn top_level_class(&self, name: &str) -> Option<NodeRef<'_>> {
        self.root()
            .children()
            .find(|child| child.as_class().is_some_and(|c| c.name == name))
    }
}

/// A modelled syntax element.
#[derive(Debug, Clone)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// Start line (1-based).
    pub line: usize,
    /// Start column (0-based, in bytes).
    pub column: usize,
    /// End line (1-based).
    pub end_line: usize,
    /// Byte offset of the node start.
    pub start_byte: usize,
    /// Byte offset past the node end.
    pub end_byte: usize,
    /// Enclosing modelled node.
    pub parent: Option<NodeId>,
    /// Modelled children in source order.
    pub children: Vec<NodeId>,
}

/// Tagged union of the modelled node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The module itself.
    Module {
        /// Module docstring.
        doc: Option<Docstring>,
    },
    /// A class definition.
    Class(ClassDef),
    /// A function or method definition.
    Function(FunctionDef),
    /// A `return` statement.
    Return {
        /// Returned expression, if any.
        value: Option<Expr>,
    },
    /// An `import` or `from ... import` statement.
    Import(Import),
    /// An assignment statement.
    Assign(Assign),
    /// A compound statement (`if`, `for`, `while`, `with`, `try`, `match`).
    Compound {
        /// The introducing keyword.
        keyword: String,
    },
    /// An `except` clause.
    ExceptHandler {
        /// Uses the legacy `except Type, name:` form.
        old_syntax: bool,
    },
    /// A Python 2 `print` statement.
    Print,
    /// A binary operation.
    BinOp(BinOp),
    /// A call expression.
    Call(Call),
}

/// Field-less discriminant of [`NodeKind`], used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKindTag {
    /// [`NodeKind::Module`]
    Module,
    /// [`NodeKind::Class`]
    Class,
    /// [`NodeKind::Function`]
    Function,
    /// [`NodeKind::Return`]
    Return,
    /// [`NodeKind::Import`]
    Import,
    /// [`NodeKind::Assign`]
    Assign,
    /// [`NodeKind::Compound`]
    Compound,
    /// [`NodeKind::ExceptHandler`]
    ExceptHandler,
    /// [`NodeKind::Print`]
    Print,
    /// [`NodeKind::BinOp`]
    BinOp,
    /// [`NodeKind::Call`]
    Call,
}

impl NodeKindTag {
    /// Number of tags.
    pub const COUNT: usize = 11;

    /// Dense index for table lookups.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl NodeKind {
    /// Returns the discriminant of this kind.
    #[must_use]
    pub fn tag(&self) -> NodeKindTag {
        match self {
            Self::Module { .. } => NodeKindTag::Module,
            Self::Class(_) => NodeKindTag::Class,
            Self::Function(_) => NodeKindTag::Function,
            Self::Return { .. } => NodeKindTag::Return,
            Self::Import(_) => NodeKindTag::Import,
            Self::Assign(_) => NodeKindTag::Assign,
            Self::Compound { .. } => NodeKindTag::Compound,
            Self::ExceptHandler { .. } => NodeKindTag::ExceptHandler,
            Self::Print => NodeKindTag::Print,
            Self::BinOp(_) => NodeKindTag::BinOp,
            Self::Call(_) => NodeKindTag::Call,
        }
    }
}

/// A docstring literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docstring {
    /// Literal text including prefix and quotes.
    pub raw: String,
    /// Text between the quotes, with line endings normalized to `\n`.
    pub value: String,
    /// Line of the opening quote.
    pub line: usize,
    /// Column of the opening quote.
    pub column: usize,
}

/// A decorator applied to a class or function.
#[derive(Debug, Clone)]
pub struct Decorator {
    /// The full decorator expression.
    pub expr: Expr,
    /// Dotted name of the decorator (callee name for calls).
    pub name: String,
    /// Call arguments, empty for bare decorators.
    pub args: Vec<Expr>,
    /// Whether the decorator is a call (`@implementer(IFoo)`).
    pub is_call: bool,
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Base class expressions.
    pub bases: Vec<Expr>,
    /// Decorators in source order.
    pub decorators: Vec<Decorator>,
    /// Class docstring.
    pub doc: Option<Docstring>,
}

/// A function or method definition.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// Declared parameters in order.
    pub params: Vec<Param>,
    /// Decorators in source order.
    pub decorators: Vec<Decorator>,
    /// Function docstring.
    pub doc: Option<Docstring>,
    /// Declared with `async def`.
    pub is_async: bool,
}

impl FunctionDef {
    /// Returns true if a decorator has exactly this name.
    #[must_use]
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| d.name == name)
    }

    /// Returns true if a decorator name ends with this suffix.
    #[must_use]
    pub fn has_decorator_suffix(&self, suffix: &str) -> bool {
        self.decorators.iter().any(|d| d.name.ends_with(suffix))
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name without stars.
    pub name: String,
    /// Parameter flavour.
    pub kind: ParamKind,
}

/// Parameter flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Ordinary or keyword parameter.
    Regular,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
}

/// An import statement.
#[derive(Debug, Clone)]
pub struct Import {
    /// Source module of a `from` import, without leading dots.
    pub module: Option<String>,
    /// Number of leading dots of a relative `from` import.
    pub level: usize,
    /// Whether this is a `from ... import` statement.
    pub is_from: bool,
    /// Imported names.
    pub names: Vec<ImportName>,
    /// `from x import *`
    pub wildcard: bool,
}

/// One imported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportName {
    /// Imported (possibly dotted) name.
    pub name: String,
    /// `as` alias.
    pub alias: Option<String>,
}

impl Import {
    /// Names this statement binds in its scope, with the import they come from.
    pub fn bound_names(&self) -> impl Iterator<Item = (&str, &ImportName)> {
        let is_from = self.is_from;
        self.names.iter().map(move |imported| {
            let bound = match &imported.alias {
                Some(alias) => alias.as_str(),
                None if is_from => imported.name.as_str(),
                None => imported.name.split('.').next().unwrap_or(&imported.name),
            };
            (bound, imported)
        })
    }
}

/// An assignment statement.
#[derive(Debug, Clone)]
pub struct Assign {
    /// Assignment targets.
    pub targets: Vec<Expr>,
    /// Assigned value; `None` for bare annotations.
    pub value: Option<Expr>,
}

impl Assign {
    /// Plain names bound by this assignment, unpacking tuples.
    #[must_use]
    pub fn target_names(&self) -> Vec<&str> {
        fn collect<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
            match &expr.kind {
                ExprKind::Name => out.push(&expr.text),
                ExprKind::Tuple(items) | ExprKind::List(items) => {
                    items.iter().for_each(|item| collect(item, out));
                }
                ExprKind::Parenthesized(inner) => collect(inner, out),
                _ => {}
            }
        }
        let mut out = Vec::new();
        self.targets.iter().for_each(|t| collect(t, &mut out));
        out
    }
}

/// A binary operation.
#[derive(Debug, Clone)]
pub struct BinOp {
    /// Left operand.
    pub left: Expr,
    /// Operator token (e.g., `%`).
    pub op: String,
    /// Right operand.
    pub right: Expr,
}

/// A call expression.
#[derive(Debug, Clone)]
pub struct Call {
    /// Callee expression.
    pub func: Expr,
    /// Argument expressions.
    pub args: Vec<Expr>,
}

/// A shallow expression view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    /// Expression shape.
    pub kind: ExprKind,
    /// Source text of the expression.
    pub text: String,
    /// Start line (1-based).
    pub line: usize,
    /// Start column (0-based).
    pub column: usize,
}

/// Shapes of expressions the checkers care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Identifier; the name is the expression text.
    Name,
    /// `object.attr`
    Attribute {
        /// Receiver expression.
        object: Box<Expr>,
        /// Attribute name.
        attr: String,
    },
    /// A nested call.
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// String literal (or implicit concatenation of literals).
    Str {
        /// Text between the quotes.
        value: String,
    },
    /// Numeric literal.
    Number,
    /// Tuple display.
    Tuple(Vec<Expr>),
    /// List display.
    List(Vec<Expr>),
    /// `( expr )` without a trailing comma.
    Parenthesized(Box<Expr>),
    /// Dict display.
    Dict,
    /// Anything else.
    Other,
}

impl Expr {
    /// Dotted name of a `Name` or `Attribute` chain, if it is one.
    #[must_use]
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name => Some(self.text.clone()),
            ExprKind::Attribute { object, attr } => {
                object.dotted_name().map(|base| format!("{base}.{attr}"))
            }
            _ => None,
        }
    }
}

/// Borrowed handle on a node together with its module.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// Owning module.
    pub module: &'a Module,
    /// Node index.
    pub id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// The node data.
    #[must_use]
    pub fn node(&self) -> &'a Node {
        self.module.get(self.id)
    }

    /// The node kind.
    #[must_use]
    pub fn kind(&self) -> &'a NodeKind {
        &self.node().kind
    }

    /// Start line (1-based).
    #[must_use]
    pub fn line(&self) -> usize {
        self.node().line
    }

    /// Start column (0-based).
    #[must_use]
    pub fn column(&self) -> usize {
        self.node().column
    }

    /// Enclosing modelled node.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.module.node(id))
    }

    /// Modelled children in source order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let module = self.module;
        self.node().children.iter().map(move |&id| module.node(id))
    }

    /// Ancestors from the parent up to the module.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), NodeRef::parent)
    }

    /// Class data, if this is a class.
    #[must_use]
    pub fn as_class(&self) -> Option<&'a ClassDef> {
        match self.kind() {
            NodeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Function data, if this is a function.
    #[must_use]
    pub fn as_function(&self) -> Option<&'a FunctionDef> {
        match self.kind() {
            NodeKind::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Declared name of a class or function.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Class(class) => Some(&class.name),
            NodeKind::Function(function) => Some(&function.name),
            _ => None,
        }
    }

    /// Docstring of a module, class or function.
    #[must_use]
    pub fn doc(&self) -> Option<&'a Docstring> {
        match self.kind() {
            NodeKind::Module { doc } => doc.as_ref(),
            NodeKind::Class(class) => class.doc.as_ref(),
            NodeKind::Function(function) => function.doc.as_ref(),
            _ => None,
        }
    }

    /// Whether this is a function whose nearest scope is a class body.
    ///
    /// Compound statements in the class body (`if`, `try`, `with`) are
    /// looked through.
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.as_function().is_some() && self.scope().as_class().is_some()
    }

    /// Functions defined in this class body, including those nested in
    /// compound statements, in source order.
    #[must_use]
    pub fn methods(&self) -> Vec<NodeRef<'a>> {
        fn collect<'a>(node: NodeRef<'a>, out: &mut Vec<NodeRef<'a>>) {
            for child in node.children() {
                match child.kind() {
                    NodeKind::Function(_) => out.push(child),
                    NodeKind::Class(_) => {}
                    _ => collect(child, out),
                }
            }
        }
        let mut out = Vec::new();
        if self.as_class().is_some() {
            collect(*self, &mut out);
        }
        out
    }

    /// Nearest enclosing class.
    #[must_use]
    pub fn enclosing_class(&self) -> Option<NodeRef<'a>> {
        self.ancestors().find(|a| a.as_class().is_some())
    }

    /// Whether some enclosing node at any depth is a function.
    #[must_use]
    pub fn is_nested_in_function(&self) -> bool {
        self.ancestors().any(|a| a.as_function().is_some())
    }

    /// Nearest enclosing scope (module, class or function).
    #[must_use]
    pub fn scope(&self) -> NodeRef<'a> {
        self.ancestors()
            .find(|a| {
                matches!(
                    a.kind(),
                    NodeKind::Module { .. } | NodeKind::Class(_) | NodeKind::Function(_)
                )
            })
            .unwrap_or_else(|| self.module.root())
    }
}
