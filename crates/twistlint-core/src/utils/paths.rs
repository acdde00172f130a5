//! Mapping between file paths and dotted module names.

use std::path::{Path, PathBuf};

/// Dotted module name of a file plus the directory its top package lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
    /// Dotted name (e.g., `twisted.web.http`).
    pub name: String,
    /// Directory containing the top-level package, used as an import root.
    pub package_root: PathBuf,
}

/// Computes the dotted module name of a Python file.
///
/// Parent directories are prepended while they contain an `__init__.py`.
/// A package's `__init__.py` is named after the package itself.
#[must_use]
pub fn module_name_for(path: &Path) -> ModulePath {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut segments = Vec::new();
    if stem != "__init__" {
        segments.push(stem.clone());
    }

    let mut dir = path.parent();
    while let Some(current) = dir {
        if current.as_os_str().is_empty() || !current.join("__init__.py").is_file() {
            break;
        }
        match current.file_name() {
            Some(name) => segments.push(name.to_string_lossy().into_owned()),
            None => break,
        }
        dir = current.parent();
    }
    segments.reverse();

    let name = if segments.is_empty() {
        stem
    } else {
        segments.join(".")
    };
    let package_root = dir
        .filter(|d| !d.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    ModulePath { name, package_root }
}

/// Candidate files for a dotted module name under an import root.
#[must_use]
pub fn module_candidates(root: &Path, dotted: &str) -> [PathBuf; 2] {
    let mut base = root.to_path_buf();
    for segment in dotted.split('.') {
        base.push(segment);
    }
    [base.with_extension("py"), base.join("__init__.py")]
}
