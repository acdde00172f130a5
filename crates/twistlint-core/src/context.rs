//! Per-file metadata handed to checkers.

use std::path::{Path, PathBuf};

use crate::utils::{is_test_module, module_name_for, requires_test_reference};

/// Context provided for every analyzed file.
///
/// Contains metadata about the file that checkers use to make
/// context-aware decisions (e.g., test-module conventions).
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Absolute path to the file.
    pub path: &'a Path,
    /// File contents as a string.
    pub content: &'a str,
    /// Dotted module name.
    pub module_name: String,
    /// Whether the module is a test module.
    pub is_test: bool,
    /// Whether the module must reference its test module.
    pub requires_test_reference: bool,
    /// Path relative to the project root.
    pub relative_path: PathBuf,
    /// Import root containing the module's top-level package.
    pub package_root: PathBuf,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context, deriving the module name from the path.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, root: &Path) -> Self {
        let module = module_name_for(path);
        Self::with_module_name(path, content, root, module.name, module.package_root)
    }

    /// Creates a context with an explicit module name.
    #[must_use]
    pub fn with_module_name(
        path: &'a Path,
        content: &'a str,
        root: &Path,
        module_name: String,
        package_root: PathBuf,
    ) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);
        Self {
            path,
            content,
            is_test: is_test_module(&module_name),
            requires_test_reference: requires_test_reference(&module_name),
            module_name,
            relative_path,
            package_root,
        }
    }

    /// Calculates byte offset for a given line and column.
    ///
    /// # Arguments
    ///
    /// * `line` - 1-indexed line number
    /// * `column` - 1-indexed column number
    ///
    /// # Returns
    ///
    /// Byte offset from the start of the file, or 0 if out of bounds.
    #[must_use]
    pub fn offset_for(&self, line: usize, column: usize) -> usize {
        if line == 0 {
            return 0;
        }

        let mut offset = 0;
        for (i, line_content) in self.content.split_inclusive('\n').enumerate() {
            if i + 1 == line {
                return offset + column.saturating_sub(1);
            }
            offset += line_content.len();
        }
        0
    }

    /// Byte length of a line without its terminator.
    #[must_use]
    pub fn line_len(&self, line: usize) -> usize {
        line.checked_sub(1)
            .and_then(|idx| self.content.lines().nth(idx))
            .map_or(0, str::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_module_name_drives_test_flags() {
        let path = Path::new("/project/twisted/web/test/test_http.py");
        let ctx = FileContext::with_module_name(
            path,
            "",
            Path::new("/project"),
            "twisted.web.test.test_http".to_string(),
            PathBuf::from("/project"),
        );
        assert!(ctx.is_test);
        assert!(!ctx.requires_test_reference);
        assert_eq!(ctx.relative_path, PathBuf::from("twisted/web/test/test_http.py"));
    }

    #[test]
    fn offset_for_counts_crlf() {
        let path = Path::new("/p/m.py");
        let content = "a = 1\r\nb = 2\n";
        let ctx = FileContext::with_module_name(
            path,
            content,
            Path::new("/p"),
            "m".to_string(),
            PathBuf::from("/p"),
        );
        assert_eq!(ctx.offset_for(1, 1), 0);
        assert_eq!(ctx.offset_for(2, 1), 7);
        assert_eq!(ctx.offset_for(9, 1), 0);
        assert_eq!(ctx.line_len(2), 5);
    }
}
