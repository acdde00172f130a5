//! Module resolution for cross-module lookups.
//!
//! Checkers never import anything themselves. They receive a
//! [`ModuleResolver`] and ask it for sibling modules by dotted name.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use crate::model::{parse_module, BindingKind, Import, Module, NodeId, NodeKind, NodeRef, ParseError};
use crate::utils::paths::module_candidates;

/// Errors returned by module resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No file provides the module.
    #[error("module not found: {module}")]
    NotFound {
        /// Dotted module name.
        module: String,
    },
    /// Resolution re-entered a lookup already in progress.
    #[error("import cycle while resolving {name} in {module}")]
    Cycle {
        /// Dotted module name.
        module: String,
        /// Name being looked up.
        name: String,
    },
    /// The module file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The module file could not be parsed.
    #[error("failed to parse {module}: {source}")]
    Parse {
        /// Dotted module name.
        module: String,
        /// Underlying error.
        #[source]
        source: ParseError,
    },
}

/// Capability to load a module by dotted name.
pub trait ModuleResolver {
    /// Returns the parsed module.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when no source provides the module,
    /// or an I/O or parse error when it cannot be loaded.
    fn resolve(&self, name: &str) -> Result<Rc<Module>, ResolveError>;
}

/// Resolves modules from the file system, caching parsed modules by name.
#[derive(Debug, Default)]
pub struct FsModuleResolver {
    roots: Vec<PathBuf>,
    cache: RefCell<HashMap<String, Rc<Module>>>,
}

impl FsModuleResolver {
    /// Creates a resolver searching the given import roots in order.
    #[must_use]
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut resolver = Self::default();
        for root in roots {
            resolver.add_root(root);
        }
        resolver
    }

    /// Appends an import root unless already present.
    pub fn add_root(&mut self, root: PathBuf) {
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    /// Import roots in search order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl ModuleResolver for FsModuleResolver {
    fn resolve(&self, name: &str) -> Result<Rc<Module>, ResolveError> {
        if let Some(module) = self.cache.borrow().get(name) {
            return Ok(Rc::clone(module));
        }

        for root in &self.roots {
            for candidate in module_candidates(root, name) {
                if !candidate.is_file() {
                    continue;
                }
                debug!(module = name, path = %candidate.display(), "Resolving module");
                let source = std::fs::read_to_string(&candidate).map_err(|source| {
                    ResolveError::Io {
                        path: candidate.clone(),
                        source,
                    }
                })?;
                let module = parse_module(name, candidate, source).map_err(|source| {
                    ResolveError::Parse {
                        module: name.to_owned(),
                        source,
                    }
                })?;
                let module = Rc::new(module);
                self.cache
                    .borrow_mut()
                    .insert(name.to_owned(), Rc::clone(&module));
                return Ok(module);
            }
        }

        Err(ResolveError::NotFound {
            module: name.to_owned(),
        })
    }
}

/// In-memory resolver over a fixed set of sources.
#[derive(Debug, Default)]
pub struct StaticModuleResolver {
    modules: HashMap<String, Rc<Module>>,
}

impl StaticModuleResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and registers a module source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed.
    pub fn add_source(&mut self, name: &str, source: &str) -> Result<(), ParseError> {
        let path = PathBuf::from(format!("{}.py", name.replace('.', "/")));
        let module = parse_module(name, path, source.to_owned())?;
        self.modules.insert(name.to_owned(), Rc::new(module));
        Ok(())
    }
}

impl ModuleResolver for StaticModuleResolver {
    fn resolve(&self, name: &str) -> Result<Rc<Module>, ResolveError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                module: name.to_owned(),
            })
    }
}

/// A class found in a resolved module.
#[derive(Debug, Clone)]
pub struct ResolvedClass {
    /// Module defining the class.
    pub module: Rc<Module>,
    /// Class node.
    pub id: NodeId,
}

impl ResolvedClass {
    /// The class node.
    #[must_use]
    pub fn node(&self) -> NodeRef<'_> {
        self.module.node(self.id)
    }

    /// Whether the class body defines a method with this name.
    #[must_use]
    pub fn defines_method(&self, name: &str) -> bool {
        self.node()
            .children()
            .any(|child| child.as_function().is_some_and(|f| f.name == name))
    }
}

/// Absolute dotted source module of a `from` import.
///
/// Relative imports are resolved against the package of `module`.
#[must_use]
pub fn absolute_import_source(module: &Module, import: &Import) -> Option<String> {
    if import.level == 0 {
        return import.module.clone();
    }
    let is_package = module
        .path
        .file_name()
        .is_some_and(|name| name == "__init__.py");
    let mut package: Vec<&str> = module.name.split('.').collect();
    if !is_package {
        package.pop();
    }
    for _ in 1..import.level {
        package.pop()?;
    }
    if let Some(rest) = &import.module {
        package.extend(rest.split('.'));
    }
    (!package.is_empty()).then(|| package.join("."))
}

/// Finds a top-level class by name, following `from` re-exports.
///
/// Returns `Ok(None)` when the module binds the name to something that is
/// not a class.
///
/// # Errors
///
/// Propagates resolution failures and reports [`ResolveError::Cycle`] when
/// re-exports loop back to a lookup in progress.
pub fn lookup_class(
    resolver: &dyn ModuleResolver,
    module_name: &str,
    class_name: &str,
) -> Result<Option<ResolvedClass>, ResolveError> {
    let mut visiting = HashSet::new();
    lookup_class_inner(resolver, module_name, class_name, &mut visiting)
}

fn lookup_class_inner(
    resolver: &dyn ModuleResolver,
    module_name: &str,
    class_name: &str,
    visiting: &mut HashSet<(String, String)>,
) -> Result<Option<ResolvedClass>, ResolveError> {
    if !visiting.insert((module_name.to_owned(), class_name.to_owned())) {
        return Err(ResolveError::Cycle {
            module: module_name.to_owned(),
            name: class_name.to_owned(),
        });
    }

    let module = resolver.resolve(module_name)?;
    let Some(binding) = module.top_level_binding(class_name) else {
        return Ok(None);
    };

    match binding.kind {
        BindingKind::Class => Ok(Some(ResolvedClass {
            module: Rc::clone(&module),
            id: binding.node,
        })),
        BindingKind::Import => {
            let NodeKind::Import(import) = module.node(binding.node).kind() else {
                return Ok(None);
            };
            if !import.is_from {
                return Ok(None);
            }
            let Some(source) = absolute_import_source(&module, import) else {
                return Ok(None);
            };
            let Some((_, imported)) = import
                .bound_names()
                .find(|(bound, _)| *bound == class_name)
            else {
                return Ok(None);
            };
            debug!(
                module = module_name,
                name = class_name,
                source = %source,
                "Following re-export"
            );
            lookup_class_inner(resolver, &source, &imported.name, visiting)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(sources: &[(&str, &str)]) -> StaticModuleResolver {
        let mut resolver = StaticModuleResolver::new();
        for (name, source) in sources {
            resolver.add_source(name, source).unwrap();
        }
        resolver
    }

    #[test]
    fn finds_local_class() {
        let r = resolver(&[("pkg.iface", "class IFoo:\n    def bar(self):\n        pass\n")]);
        let class = lookup_class(&r, "pkg.iface", "IFoo").unwrap().unwrap();
        assert!(class.defines_method("bar"));
        assert!(!class.defines_method("baz"));
    }

    #[test]
    fn follows_reexports() {
        let r = resolver(&[
            ("pkg.api", "from pkg._impl import IFoo\n"),
            ("pkg._impl", "class IFoo:\n    def bar(self):\n        pass\n"),
        ]);
        let class = lookup_class(&r, "pkg.api", "IFoo").unwrap().unwrap();
        assert_eq!(class.module.name, "pkg._impl");
    }

    #[test]
    fn detects_reexport_cycles() {
        let r = resolver(&[
            ("pkg.a", "from pkg.b import IFoo\n"),
            ("pkg.b", "from pkg.a import IFoo\n"),
        ]);
        let err = lookup_class(&r, "pkg.a", "IFoo").unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { .. }));
    }

    #[test]
    fn non_class_binding_is_none() {
        let r = resolver(&[("pkg.a", "IFoo = 3\n")]);
        assert!(lookup_class(&r, "pkg.a", "IFoo").unwrap().is_none());
        assert!(lookup_class(&r, "pkg.a", "Missing").unwrap().is_none());
    }

    #[test]
    fn missing_module_is_not_found() {
        let r = resolver(&[]);
        let err = lookup_class(&r, "nowhere", "IFoo").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn relative_import_source() {
        let module = parse_module(
            "pkg.sub.mod",
            PathBuf::from("pkg/sub/mod.py"),
            "from . import a\nfrom ..other import b\n".to_string(),
        )
        .unwrap();
        let sources: Vec<Option<String>> = module
            .iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Import(import) => Some(absolute_import_source(&module, import)),
                _ => None,
            })
            .collect();
        assert_eq!(
            sources,
            vec![Some("pkg.sub".to_string()), Some("pkg.other".to_string())]
        );
    }

    #[test]
    fn fs_resolver_loads_and_caches() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("pkg")).unwrap();
        fs::write(temp.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(
            temp.path().join("pkg/iface.py"),
            "class IFoo:\n    pass\n",
        )
        .unwrap();

        let r = FsModuleResolver::new([temp.path().to_path_buf()]);
        let first = r.resolve("pkg.iface").unwrap();
        let second = r.resolve("pkg.iface").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(r.resolve("pkg").is_ok());
        assert!(matches!(
            r.resolve("pkg.missing"),
            Err(ResolveError::NotFound { .. })
        ));
    }
}
