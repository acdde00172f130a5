//! Lowering of the tree-sitter-python syntax tree into the module arena.

use std::path::PathBuf;
use tree_sitter::{Language, Node as TsNode, Parser};

use super::{
    Assign, BinOp, Call, ClassDef, Decorator, Docstring, Expr, ExprKind, FunctionDef, Import,
    ImportName, Module, Node, NodeId, NodeKind, Param, ParamKind,
};

/// Errors raised while parsing a source file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The Python grammar could not be loaded into the parser.
    #[error("failed to load the Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    /// The parser returned no tree.
    #[error("parser produced no syntax tree")]
    NoTree,
}

/// Parses Python source into a [`Module`].
///
/// Syntax errors are recovered by tree-sitter; the module is still built and
/// [`Module::syntax_errors`] is set.
///
/// # Errors
///
/// Returns an error if the grammar cannot be loaded or no tree is produced.
pub fn parse_module(
    name: impl Into<String>,
    path: PathBuf,
    source: String,
) -> Result<Module, ParseError> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language)?;

    let tree = parser.parse(source.as_bytes(), None).ok_or(ParseError::NoTree)?;
    let root = tree.root_node();

    let mut lowering = Lowering {
        src: source.as_bytes(),
        nodes: Vec::new(),
    };
    let module_id = lowering.push(
        NodeKind::Module {
            doc: docstring_of(&root, source.as_bytes()),
        },
        &root,
        None,
    );
    // Module nodes always start at line 1 even when the file opens with blanks.
    lowering.nodes[module_id.0].line = 1;
    lowering.nodes[module_id.0].column = 0;
    lowering.visit_children(&root, module_id);

    let nodes = lowering.nodes;
    let lines = source.lines().map(str::to_owned).collect();
    Ok(Module {
        name: name.into(),
        path,
        syntax_errors: root.has_error(),
        lines,
        source,
        nodes,
    })
}

fn text<'a>(node: &TsNode<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn named_children<'t>(node: &TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Splits a string literal into its contents, dropping prefix and quotes.
fn string_value(literal: &str) -> String {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return body[quote.len()..body.len() - quote.len()].to_owned();
        }
    }
    body.to_owned()
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Docstring of a module root or a definition body block.
fn docstring_of(body: &TsNode<'_>, src: &[u8]) -> Option<Docstring> {
    let first = named_children(body).into_iter().next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let children = named_children(&first);
    let [literal] = children.as_slice() else {
        return None;
    };
    if literal.kind() != "string" {
        return None;
    }
    let raw = text(literal, src);
    Some(Docstring {
        raw: raw.to_owned(),
        value: normalize_newlines(&string_value(raw)),
        line: literal.start_position().row + 1,
        column: literal.start_position().column,
    })
}

fn expr(node: &TsNode<'_>, src: &[u8]) -> Expr {
    let kind = match node.kind() {
        "identifier" => ExprKind::Name,
        "attribute" => match (node.child_by_field_name("object"), node.child_by_field_name("attribute")) {
            (Some(object), Some(attr)) => ExprKind::Attribute {
                object: Box::new(expr(&object, src)),
                attr: text(&attr, src).to_owned(),
            },
            _ => ExprKind::Other,
        },
        "call" => match node.child_by_field_name("function") {
            Some(function) => ExprKind::Call {
                func: Box::new(expr(&function, src)),
                args: call_args(node, src),
            },
            None => ExprKind::Other,
        },
        "string" => ExprKind::Str {
            value: string_value(text(node, src)),
        },
        "concatenated_string" => ExprKind::Str {
            value: named_children(node)
                .iter()
                .map(|part| string_value(text(part, src)))
                .collect(),
        },
        "integer" | "float" => ExprKind::Number,
        "tuple" | "expression_list" | "pattern_list" | "tuple_pattern" => {
            ExprKind::Tuple(named_children(node).iter().map(|c| expr(c, src)).collect())
        }
        "list" | "list_pattern" => ExprKind::List(named_children(node).iter().map(|c| expr(c, src)).collect()),
        "parenthesized_expression" => match named_children(node).first() {
            Some(inner) => ExprKind::Parenthesized(Box::new(expr(inner, src))),
            None => ExprKind::Other,
        },
        "dictionary" => ExprKind::Dict,
        _ => ExprKind::Other,
    };
    Expr {
        kind,
        text: text(node, src).to_owned(),
        line: node.start_position().row + 1,
        column: node.start_position().column,
    }
}

fn call_args(call: &TsNode<'_>, src: &[u8]) -> Vec<Expr> {
    call.child_by_field_name("arguments")
        .map(|args| named_children(&args).iter().map(|a| expr(a, src)).collect())
        .unwrap_or_default()
}

fn decorator(node: &TsNode<'_>, src: &[u8]) -> Option<Decorator> {
    let inner = named_children(node).into_iter().next()?;
    let expression = expr(&inner, src);
    let (name, args, is_call) = match &expression.kind {
        ExprKind::Call { func, args } => (
            func.dotted_name().unwrap_or_else(|| func.text.clone()),
            args.clone(),
            true,
        ),
        _ => (
            expression
                .dotted_name()
                .unwrap_or_else(|| expression.text.clone()),
            Vec::new(),
            false,
        ),
    };
    Some(Decorator {
        expr: expression,
        name,
        args,
        is_call,
    })
}

fn params(node: &TsNode<'_>, src: &[u8]) -> Vec<Param> {
    let Some(list) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(&list)
        .iter()
        .filter_map(|param| param_of(param, src))
        .collect()
}

fn param_of(param: &TsNode<'_>, src: &[u8]) -> Option<Param> {
    let regular = |name: &str| Param {
        name: name.to_owned(),
        kind: ParamKind::Regular,
    };
    match param.kind() {
        "identifier" => Some(regular(text(param, src))),
        "default_parameter" | "typed_default_parameter" => param
            .child_by_field_name("name")
            .map(|name| regular(text(&name, src))),
        // `typed_parameter` wraps an identifier or a splat pattern.
        "typed_parameter" => named_children(param)
            .first()
            .and_then(|inner| param_of(inner, src)),
        "list_splat_pattern" => named_children(param).first().map(|name| Param {
            name: text(name, src).to_owned(),
            kind: ParamKind::VarArgs,
        }),
        "dictionary_splat_pattern" => named_children(param).first().map(|name| Param {
            name: text(name, src).to_owned(),
            kind: ParamKind::KwArgs,
        }),
        _ => None,
    }
}

fn import_name(node: &TsNode<'_>, src: &[u8]) -> Option<ImportName> {
    match node.kind() {
        "dotted_name" | "identifier" => Some(ImportName {
            name: text(node, src).to_owned(),
            alias: None,
        }),
        "aliased_import" => Some(ImportName {
            name: node
                .child_by_field_name("name")
                .map(|n| text(&n, src).to_owned())?,
            alias: node
                .child_by_field_name("alias")
                .map(|a| text(&a, src).to_owned()),
        }),
        _ => None,
    }
}

fn import(node: &TsNode<'_>, src: &[u8]) -> Import {
    if node.kind() == "import_statement" {
        return Import {
            module: None,
            level: 0,
            is_from: false,
            names: named_children(node)
                .iter()
                .filter_map(|n| import_name(n, src))
                .collect(),
            wildcard: false,
        };
    }

    let (module, level) = match node.kind() {
        "future_import_statement" => (Some("__future__".to_owned()), 0),
        _ => match node.child_by_field_name("module_name") {
            Some(m) if m.kind() == "relative_import" => {
                let raw = text(&m, src);
                let dots = raw.chars().take_while(|&c| c == '.').count();
                let rest = raw[dots..].trim();
                ((!rest.is_empty()).then(|| rest.to_owned()), dots)
            }
            Some(m) => (Some(text(&m, src).to_owned()), 0),
            None => (None, 0),
        },
    };

    let mut cursor = node.walk();
    let names = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|n| import_name(&n, src))
        .collect();
    let wildcard = named_children(node)
        .iter()
        .any(|c| c.kind() == "wildcard_import");

    Import {
        module,
        level,
        is_from: true,
        names,
        wildcard,
    }
}

struct Lowering<'s> {
    src: &'s [u8],
    nodes: Vec<Node>,
}

impl Lowering<'_> {
    fn push(&mut self, kind: NodeKind, ts: &TsNode<'_>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            line: ts.start_position().row + 1,
            column: ts.start_position().column,
            end_line: ts.end_position().row + 1,
            start_byte: ts.start_byte(),
            end_byte: ts.end_byte(),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn visit_children(&mut self, ts: &TsNode<'_>, parent: NodeId) {
        let mut cursor = ts.walk();
        let children: Vec<TsNode<'_>> = ts.named_children(&mut cursor).collect();
        for child in &children {
            self.visit(child, parent);
        }
    }

    fn visit_field(&mut self, ts: &TsNode<'_>, field: &str, parent: NodeId) {
        if let Some(child) = ts.child_by_field_name(field) {
            self.visit(&child, parent);
        }
    }

    fn visit(&mut self, ts: &TsNode<'_>, parent: NodeId) {
        let src = self.src;
        match ts.kind() {
            "decorated_definition" => {
                let mut decorators = Vec::new();
                for child in named_children(ts) {
                    if child.kind() == "decorator" {
                        self.visit_children(&child, parent);
                        decorators.extend(decorator(&child, src));
                    }
                }
                if let Some(definition) = ts.child_by_field_name("definition") {
                    self.definition(&definition, decorators, parent);
                }
            }
            "class_definition" | "function_definition" => {
                self.definition(ts, Vec::new(), parent);
            }
            "return_statement" => {
                let value = named_children(ts).first().map(|v| expr(v, src));
                let id = self.push(NodeKind::Return { value }, ts, Some(parent));
                self.visit_children(ts, id);
            }
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                self.push(NodeKind::Import(import(ts, src)), ts, Some(parent));
            }
            "assignment" => {
                let targets = ts
                    .child_by_field_name("left")
                    .map(|left| vec![expr(&left, src)])
                    .unwrap_or_default();
                // `a = b = {}` nests assignments on the right.
                let mut right = ts.child_by_field_name("right");
                while let Some(r) = right.filter(|r| r.kind() == "assignment") {
                    right = r.child_by_field_name("right");
                }
                let value = right.map(|r| expr(&r, src));
                let id = self.push(NodeKind::Assign(Assign { targets, value }), ts, Some(parent));
                self.visit_children(ts, id);
            }
            "if_statement" | "for_statement" | "while_statement" | "with_statement"
            | "try_statement" | "match_statement" => {
                let keyword = ts.kind().trim_end_matches("_statement").to_owned();
                let id = self.push(NodeKind::Compound { keyword }, ts, Some(parent));
                self.visit_children(ts, id);
            }
            "except_clause" => {
                let mut cursor = ts.walk();
                let old_syntax = ts
                    .children(&mut cursor)
                    .any(|child| !child.is_named() && child.kind() == ",");
                let id = self.push(NodeKind::ExceptHandler { old_syntax }, ts, Some(parent));
                self.visit_children(ts, id);
            }
            "print_statement" => {
                let id = self.push(NodeKind::Print, ts, Some(parent));
                self.visit_children(ts, id);
            }
            "binary_operator" => {
                let op = ts
                    .child_by_field_name("operator")
                    .map(|o| text(&o, src).to_owned())
                    .unwrap_or_default();
                let (Some(left), Some(right)) = (
                    ts.child_by_field_name("left"),
                    ts.child_by_field_name("right"),
                ) else {
                    self.visit_children(ts, parent);
                    return;
                };
                let binop = BinOp {
                    left: expr(&left, src),
                    op,
                    right: expr(&right, src),
                };
                let id = self.push(NodeKind::BinOp(binop), ts, Some(parent));
                self.visit_children(ts, id);
            }
            "call" => {
                let Some(function) = ts.child_by_field_name("function") else {
                    self.visit_children(ts, parent);
                    return;
                };
                let call = Call {
                    func: expr(&function, src),
                    args: call_args(ts, src),
                };
                let id = self.push(NodeKind::Call(call), ts, Some(parent));
                self.visit_children(ts, id);
            }
            "comment" => {}
            _ => self.visit_children(ts, parent),
        }
    }

    fn definition(&mut self, ts: &TsNode<'_>, decorators: Vec<Decorator>, parent: NodeId) {
        let src = self.src;
        let name = ts
            .child_by_field_name("name")
            .map(|n| text(&n, src).to_owned())
            .unwrap_or_default();
        let body = ts.child_by_field_name("body");
        let doc = body.as_ref().and_then(|b| docstring_of(b, src));

        let kind = if ts.kind() == "class_definition" {
            // Base expressions are evaluated in the enclosing scope.
            self.visit_field(ts, "superclasses", parent);
            let bases = ts
                .child_by_field_name("superclasses")
                .map(|list| named_children(&list).iter().map(|b| expr(b, src)).collect())
                .unwrap_or_default();
            NodeKind::Class(ClassDef {
                name,
                bases,
                decorators,
                doc,
            })
        } else {
            self.visit_field(ts, "parameters", parent);
            let mut cursor = ts.walk();
            let is_async = ts
                .children(&mut cursor)
                .any(|child| !child.is_named() && child.kind() == "async");
            NodeKind::Function(FunctionDef {
                name,
                params: params(ts, src),
                decorators,
                doc,
                is_async,
            })
        };

        let id = self.push(kind, ts, Some(parent));
        if let Some(body) = body {
            self.visit_children(&body, id);
        }
    }
}
