//! Name bindings and lexical scope lookup.

use super::{ExprKind, Module, NodeId, NodeKind, NodeRef};

/// What introduced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `class Name`
    Class,
    /// `def name`
    Function,
    /// `import` or `from ... import`
    Import,
    /// Assignment target.
    Assign,
    /// Function parameter.
    Param,
}

/// A name bound in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Bound name.
    pub name: String,
    /// Binding statement kind.
    pub kind: BindingKind,
    /// Node that introduced the binding.
    pub node: NodeId,
    /// Line of the binding.
    pub line: usize,
}

impl Module {
    /// Bindings introduced directly in a scope, in source order.
    ///
    /// Nested classes and functions contribute their own name but not their
    /// bodies.
    #[must_use]
    pub fn bindings(&self, scope: NodeId) -> Vec<Binding> {
        let mut out = Vec::new();
        let scope_ref = self.node(scope);
        if let Some(function) = scope_ref.as_function() {
            out.extend(function.params.iter().map(|param| Binding {
                name: param.name.clone(),
                kind: BindingKind::Param,
                node: scope,
                line: scope_ref.line(),
            }));
        }
        for child in scope_ref.children() {
            self.collect_bindings(child, &mut out);
        }
        out
    }

    fn collect_bindings(&self, node: NodeRef<'_>, out: &mut Vec<Binding>) {
        let mut bind = |name: &str, kind| {
            out.push(Binding {
                name: name.to_owned(),
                kind,
                node: node.id,
                line: node.line(),
            });
        };
        match node.kind() {
            NodeKind::Class(class) => {
                bind(&class.name, BindingKind::Class);
                return;
            }
            NodeKind::Function(function) => {
                bind(&function.name, BindingKind::Function);
                return;
            }
            NodeKind::Import(import) => {
                for (name, _) in import.bound_names() {
                    bind(name, BindingKind::Import);
                }
            }
            NodeKind::Assign(assign) => {
                for name in assign.target_names() {
                    bind(name, BindingKind::Assign);
                }
            }
            _ => {}
        }
        for child in node.children() {
            self.collect_bindings(child, out);
        }
    }

    /// Scopes visible from a node, innermost first.
    ///
    /// The nearest scope is always included; enclosing class scopes beyond
    /// it are skipped, matching Python name resolution.
    #[must_use]
    pub fn scope_chain(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        let nearest = node.scope();
        let mut chain = vec![nearest.id];
        chain.extend(
            nearest
                .ancestors()
                .filter(|a| matches!(a.kind(), NodeKind::Module { .. } | NodeKind::Function(_)))
                .map(|a| a.id),
        );
        chain
    }

    /// First top-level binding of a name, in source order.
    #[must_use]
    pub fn top_level_binding(&self, name: &str) -> Option<Binding> {
        self.bindings(NodeId::ROOT)
            .into_iter()
            .find(|binding| binding.name == name)
    }

    /// Binding of `name` visible from `id`, innermost scope first.
    ///
    /// Within the scope that binds the name, the last binding at or before
    /// the node's line wins; a binding that only appears later still
    /// shadows outer scopes.
    #[must_use]
    pub fn lookup(&self, id: NodeId, name: &str) -> Option<Binding> {
        let line = self.node(id).line();
        self.scope_chain(id).into_iter().find_map(|scope| {
            let candidates: Vec<Binding> = self
                .bindings(scope)
                .into_iter()
                .filter(|b| b.name == name)
                .collect();
            let preceding = candidates.iter().rposition(|b| b.line <= line);
            match preceding {
                Some(idx) => candidates.into_iter().nth(idx),
                None => candidates.into_iter().next(),
            }
        })
    }

    /// Latest assignment to `name` visible from `id` that precedes it.
    ///
    /// Searches the scope chain innermost first and returns the assigned
    /// expression's kind of the closest preceding assignment.
    #[must_use]
    pub fn preceding_assignment(&self, id: NodeId, name: &str) -> Option<&ExprKind> {
        let line = self.node(id).line();
        for scope in self.scope_chain(id) {
            let found = self
                .bindings(scope)
                .into_iter()
                .filter(|b| b.name == name && b.line <= line)
                .last();
            if let Some(binding) = found {
                return match self.node(binding.node).kind() {
                    NodeKind::Assign(assign) => assign.value.as_ref().map(|v| &v.kind),
                    _ => None,
                };
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::model::parse_module;
    use std::path::PathBuf;

    use super::*;

    fn parse(source: &str) -> Module {
        parse_module("pkg.mod", PathBuf::from("pkg/mod.py"), source.to_string()).unwrap()
    }

    #[test]
    fn module_bindings_skip_nested_bodies() {
        let module = parse(
            "import os\nfrom a import b as c\nx, y = 1, 2\nif os:\n    z = 3\ndef f(p):\n    inner = 1\nclass K:\n    attr = 2\n",
        );
        let names: Vec<String> = module
            .bindings(NodeId::ROOT)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["os", "c", "x", "y", "z", "f", "K"]);
    }

    #[test]
    fn function_scope_includes_params() {
        let module = parse("def f(a, *rest):\n    b = a\n");
        let function = module.iter().find(|n| n.name() == Some("f")).unwrap();
        let names: Vec<String> = module
            .bindings(function.id)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["a", "rest", "b"]);
    }

    #[test]
    fn scope_chain_skips_outer_classes() {
        let module = parse("class A:\n    def f(self):\n        g()\n");
        let call = module
            .iter()
            .find(|n| matches!(n.kind(), NodeKind::Call(_)))
            .unwrap();
        let chain: Vec<Option<&str>> = module
            .scope_chain(call.id)
            .into_iter()
            .map(|id| module.node(id).name())
            .collect();
        assert_eq!(chain, vec![Some("f"), None]);
    }

    #[test]
    fn preceding_assignment_picks_latest() {
        let module = parse("d = {}\nd = [1]\nd.has_key(1)\n");
        let call = module
            .iter()
            .find(|n| matches!(n.kind(), NodeKind::Call(_)))
            .unwrap();
        assert!(matches!(
            module.preceding_assignment(call.id, "d"),
            Some(ExprKind::List(_))
        ));
    }

    #[test]
    fn lookup_sees_later_module_bindings_from_functions() {
        let module = parse("def f():
    apply(g, ())

def apply(*a):
    pass

apply(h, ())
");
        let calls: Vec<NodeRef<'_>> = module
            .iter()
            .filter(|n| matches!(n.kind(), NodeKind::Call(_)))
            .collect();
        let first = module.lookup(calls[0].id, "apply").unwrap();
        assert_eq!(first.kind, BindingKind::Function);
        assert!(module.lookup(calls[0].id, "missing").is_none());
        assert_eq!(module.lookup(calls[1].id, "apply").unwrap().line, 4);
    }
}
